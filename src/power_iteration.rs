// src/power_iteration.rs

//! Power iteration with deflation over an explicit covariance matrix.
//!
//! This is the self-contained decomposition used when the LAPACK-backed SVD is
//! unavailable or returns something unusable.

use log::trace;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::Rng;
use rand_distr::StandardNormal;

/// Minimum number of power iterations per component.
pub const MIN_POWER_ITERATIONS: usize = 50;

/// Tuning knobs for the power-iteration fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerIterationConfig {
    /// Upper bound on multiply-deflate-normalize rounds per component.
    /// Values below `MIN_POWER_ITERATIONS` are raised to it.
    pub iterations: usize,
    /// A deflated vector whose norm drops below this is treated as collapsed:
    /// the remaining subspace carries negligible variance.
    pub collapse_threshold: f64,
    /// Stop early once successive iterates differ by less than this (2-norm).
    pub convergence_tolerance: f64,
}

impl Default for PowerIterationConfig {
    fn default() -> Self {
        PowerIterationConfig {
            iterations: 100,
            collapse_threshold: 1e-10,
            convergence_tolerance: 1e-12,
        }
    }
}

/// Eigenvectors and their Rayleigh-quotient eigenvalues, sorted descending.
#[derive(Debug, Clone)]
pub struct EigenPairs {
    /// One unit vector per extracted component.
    pub vectors: Vec<Array1<f64>>,
    /// Absolute Rayleigh quotient `v' C v` for each vector.
    pub values: Vec<f64>,
}

impl EigenPairs {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// Sample covariance `X' X / (n - 1)` of an already centered matrix.
pub fn covariance_matrix(standardized: ArrayView2<f64>) -> Array2<f64> {
    let n_samples = standardized.nrows();
    let denom = (n_samples as f64 - 1.0).max(1.0);
    standardized.t().dot(&standardized) / denom
}

/// Sum of the diagonal.
pub fn trace(matrix: ArrayView2<f64>) -> f64 {
    matrix.diag().sum()
}

/// Extracts the top `k` eigenpairs of a symmetric positive semi-definite matrix.
///
/// Each component starts from a random Gaussian vector drawn from `rng`, then
/// repeatedly multiplies by `cov`, projects out every previously found component,
/// and renormalizes. Returned vectors are mutually orthonormal. `k` is capped at
/// the matrix dimension.
pub fn power_iteration_top_k<R: Rng + ?Sized>(
    cov: ArrayView2<f64>,
    k: usize,
    config: &PowerIterationConfig,
    rng: &mut R,
) -> EigenPairs {
    let dim = cov.nrows();
    let k = k.min(dim);
    let iterations = config.iterations.max(MIN_POWER_ITERATIONS);
    let mut vectors: Vec<Array1<f64>> = Vec::with_capacity(k);
    let mut values: Vec<f64> = Vec::with_capacity(k);

    for comp in 0..k {
        let mut v = initial_vector(dim, &vectors, config.collapse_threshold, rng);

        let mut rounds = 0;
        for _ in 0..iterations {
            rounds += 1;
            let mut w = cov.dot(&v);
            deflate(&mut w, &vectors);
            let norm = w.dot(&w).sqrt();
            if norm < config.collapse_threshold {
                // Nothing left in this subspace; keep the current orthogonal unit vector.
                break;
            }
            w.mapv_inplace(|x| x / norm);
            let delta = (&w - &v).mapv(|x| x * x).sum().sqrt();
            v = w;
            if delta < config.convergence_tolerance {
                break;
            }
        }

        let eigenvalue = rayleigh_quotient(cov, v.view()).abs();
        trace!(
            "Power iteration component {}: eigenvalue {:.6e} after {} rounds.",
            comp,
            eigenvalue,
            rounds
        );
        vectors.push(v);
        values.push(eigenvalue);
    }

    sort_descending(vectors, values)
}

/// `v' C v`
pub fn rayleigh_quotient(cov: ArrayView2<f64>, v: ArrayView1<f64>) -> f64 {
    v.dot(&cov.dot(&v))
}

/// Gram-Schmidt: removes the projection of `w` onto each (unit) basis vector.
///
/// Two passes, so small residuals stay orthogonal after cancellation.
fn deflate(w: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for _ in 0..2 {
        for prev in basis {
            let dot = w.dot(prev);
            w.scaled_add(-dot, prev);
        }
    }
}

fn initial_vector<R: Rng + ?Sized>(
    dim: usize,
    found: &[Array1<f64>],
    collapse_threshold: f64,
    rng: &mut R,
) -> Array1<f64> {
    let mut v: Array1<f64> = Array1::from_shape_fn(dim, |_| rng.sample(StandardNormal));
    deflate(&mut v, found);
    let norm = v.dot(&v).sqrt();
    if norm.is_finite() && norm > collapse_threshold {
        return v / norm;
    }

    // Random start fell inside the span of earlier components; pick the standard
    // basis vector with the largest residual instead.
    let mut best = Array1::<f64>::zeros(dim);
    let mut best_norm = 0.0;
    for i in 0..dim {
        let mut e = Array1::<f64>::zeros(dim);
        e[i] = 1.0;
        deflate(&mut e, found);
        let n = e.dot(&e).sqrt();
        if n > best_norm {
            best_norm = n;
            best = e;
        }
    }
    if best_norm > 0.0 {
        best / best_norm
    } else {
        best
    }
}

fn sort_descending(vectors: Vec<Array1<f64>>, values: Vec<f64>) -> EigenPairs {
    let mut pairs: Vec<(f64, Array1<f64>)> = values.into_iter().zip(vectors).collect();
    pairs.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let (values, vectors): (Vec<f64>, Vec<Array1<f64>>) = pairs.into_iter().unzip();
    EigenPairs { vectors, values }
}
