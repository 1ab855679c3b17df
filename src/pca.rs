// src/pca.rs

use crate::error::{PcaError, ThreadSafeStdError};
use crate::linalg_backends::{BackendSVD, NdarrayLinAlgBackend};
use crate::power_iteration::{covariance_matrix, power_iteration_top_k, trace, PowerIterationConfig};
use crate::projection::project;
use crate::standardize::{observations_from_rows, standardize};
use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Which decomposition the engine tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompositionStrategy {
    /// SVD through the configured backend; power iteration if that fails.
    #[default]
    ExactWithFallback,
    /// Go straight to power iteration on the covariance matrix.
    PowerIteration,
}

/// The decomposition that actually produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecompositionPath {
    ExactSvd,
    PowerIteration,
}

/// Configuration for `PcaEngine`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcaConfig {
    pub strategy: DecompositionStrategy,
    /// Settings for the power-iteration fallback.
    pub power_iteration: PowerIterationConfig,
    /// Seed for the fallback's random start vectors. `None` seeds from the
    /// thread-local generator, so repeated runs may differ in component signs.
    pub random_seed: Option<u64>,
}

impl Default for PcaConfig {
    fn default() -> Self {
        PcaConfig {
            strategy: DecompositionStrategy::ExactWithFallback,
            power_iteration: PowerIterationConfig::default(),
            random_seed: None,
        }
    }
}

/// Reduced representation of an observation matrix.
///
/// The sign of each component is not canonical: `v` and `-v` are equally valid,
/// and the matching column of `transformed` flips with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcaResult {
    /// Principal axes, one unit vector per row, ordered by descending variance.
    /// Shape: (k_components, n_features)
    pub components: Array2<f64>,
    /// Standardized observations projected onto `components`.
    /// Shape: (n_samples, k_components)
    pub transformed: Array2<f64>,
    /// Fraction of total variance captured by each component, each in [0, 1].
    /// Shape: (k_components)
    pub explained_variance: Array1<f64>,
    /// Variance of each component's scores (covariance eigenvalues).
    /// Shape: (k_components)
    pub eigenvalues: Array1<f64>,
    /// Denominator used for `explained_variance`.
    pub total_variance: f64,
    pub path: DecompositionPath,
}

/// `PcaResult` as plain nested vectors, matching the field names UI consumers read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReducedRows {
    pub transformed: Vec<Vec<f64>>,
    pub components: Vec<Vec<f64>>,
    pub explained_variance: Vec<f64>,
}

impl PcaResult {
    pub fn n_components(&self) -> usize {
        self.components.nrows()
    }

    /// Running total of `explained_variance`.
    pub fn cumulative_explained_variance(&self) -> Array1<f64> {
        let mut acc = 0.0;
        self.explained_variance.mapv(|v| {
            acc += v;
            acc
        })
    }

    /// Explained variance as percentages rounded to one decimal place.
    pub fn explained_variance_percent(&self) -> Vec<f64> {
        self.explained_variance
            .iter()
            .map(|v| (v * 1000.0).round() / 10.0)
            .collect()
    }

    pub fn to_rows(&self) -> ReducedRows {
        let rows = |m: &Array2<f64>| -> Vec<Vec<f64>> {
            m.axis_iter(Axis(0)).map(|row| row.to_vec()).collect()
        };
        ReducedRows {
            transformed: rows(&self.transformed),
            components: rows(&self.components),
            explained_variance: self.explained_variance.to_vec(),
        }
    }
}

/// Eigen-structure produced by one decomposition path.
#[derive(Debug)]
struct Spectrum {
    /// Always exactly k rows.
    components: Array2<f64>,
    /// Variances for the leading components that could be extracted; may be
    /// shorter than k.
    eigenvalues: Vec<f64>,
    total_variance: f64,
    path: DecompositionPath,
}

/// Stateless PCA runner.
///
/// Holds only configuration and an SVD backend; every call standardizes and
/// decomposes from scratch, so one engine can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct PcaEngine<B = NdarrayLinAlgBackend> {
    config: PcaConfig,
    backend: B,
}

impl PcaEngine<NdarrayLinAlgBackend> {
    /// Creates an engine using the LAPACK-backed SVD.
    pub fn new(config: PcaConfig) -> Self {
        Self {
            config,
            backend: NdarrayLinAlgBackend,
        }
    }
}

impl<B: BackendSVD> PcaEngine<B> {
    /// Creates an engine with a custom SVD backend for the exact path.
    pub fn with_backend(config: PcaConfig, backend: B) -> Self {
        Self { config, backend }
    }

    /// Standardizes raw observations and reduces them to `target_rank` components.
    ///
    /// The fallback's random start vectors come from a `ChaCha8Rng` seeded with
    /// `config.random_seed`.
    ///
    /// # Errors
    /// `PcaError::InvalidInput` for empty, non-finite, or single-row input, or a
    /// `target_rank` outside `1..=n_features`. `PcaError::DecompositionFailure`
    /// only if the fallback cannot produce a well-shaped result.
    pub fn reduce(
        &self,
        observations: ArrayView2<f64>,
        target_rank: usize,
    ) -> Result<PcaResult, PcaError> {
        let mut rng = match self.config.random_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(rand::thread_rng()).map_err(|e| {
                PcaError::DecompositionFailure(format!("Failed to initialize RNG: {}", e))
            })?,
        };
        self.reduce_with_rng(observations, target_rank, &mut rng)
    }

    /// Like `reduce`, drawing the fallback's start vectors from `rng`.
    pub fn reduce_with_rng<R: Rng + ?Sized>(
        &self,
        observations: ArrayView2<f64>,
        target_rank: usize,
        rng: &mut R,
    ) -> Result<PcaResult, PcaError> {
        let standardized = standardize(observations)?;
        let n_samples = standardized.n_samples();
        let n_features = standardized.n_features();
        if target_rank == 0 || target_rank > n_features {
            return Err(PcaError::invalid(format!(
                "target rank {} is outside 1..={}",
                target_rank, n_features
            )));
        }
        debug!(
            "Reducing {} samples x {} features to {} components.",
            n_samples, n_features, target_rank
        );

        let spectrum = self.decompose(standardized.data.view(), target_rank, rng)?;
        let transformed = project(standardized.data.view(), spectrum.components.view());
        let explained_variance = Array1::from(explained_variance_ratios(
            &spectrum.eigenvalues,
            spectrum.total_variance,
            target_rank,
        ));
        let mut eigenvalues = spectrum.eigenvalues;
        eigenvalues.resize(target_rank, 0.0);

        if transformed.dim() != (n_samples, target_rank)
            || spectrum.components.dim() != (target_rank, n_features)
            || explained_variance.len() != target_rank
        {
            return Err(PcaError::DecompositionFailure(format!(
                "result shape mismatch: components {:?}, transformed {:?}, explained {}",
                spectrum.components.dim(),
                transformed.dim(),
                explained_variance.len()
            )));
        }

        info!(
            "PCA via {:?}: explained variance {:?}",
            spectrum.path,
            explained_variance.to_vec()
        );
        Ok(PcaResult {
            components: spectrum.components,
            transformed,
            explained_variance,
            eigenvalues: Array1::from(eigenvalues),
            total_variance: spectrum.total_variance,
            path: spectrum.path,
        })
    }

    /// Single control point choosing between the exact and fallback paths.
    fn decompose<R: Rng + ?Sized>(
        &self,
        standardized: ArrayView2<f64>,
        k: usize,
        rng: &mut R,
    ) -> Result<Spectrum, PcaError> {
        match self.config.strategy {
            DecompositionStrategy::ExactWithFallback => {
                match exact_spectrum(&self.backend, standardized, k) {
                    Ok(spectrum) => return Ok(spectrum),
                    Err(e) => warn!("SVD failed, using covariance power iteration: {}", e),
                }
            }
            DecompositionStrategy::PowerIteration => {
                debug!("Exact path disabled; using covariance power iteration.");
            }
        }
        fallback_spectrum(standardized, k, &self.config.power_iteration, rng)
    }
}

/// Exact path: right singular vectors of the standardized matrix.
///
/// Any unusable output (missing vectors, wrong shape, non-finite values, zero
/// total variance) is reported as an error so the caller can fall back.
fn exact_spectrum<B: BackendSVD>(
    backend: &B,
    standardized: ArrayView2<f64>,
    k: usize,
) -> Result<Spectrum, ThreadSafeStdError> {
    let (n_samples, n_features) = standardized.dim();
    let svd = backend.svd_into(standardized.to_owned(), false, true)?;
    let vt = svd
        .vt
        .ok_or("SVD did not return right singular vectors.")?;
    let singular_values = svd.s;

    if singular_values.is_empty() {
        return Err("SVD returned no singular values.".into());
    }
    if vt.ncols() != n_features || vt.nrows() < k || vt.nrows() < singular_values.len() {
        return Err(format!(
            "SVD returned V^T of shape {:?} for {} features, {} singular values and rank {}.",
            vt.dim(),
            n_features,
            singular_values.len(),
            k
        )
        .into());
    }
    if singular_values.iter().chain(vt.iter()).any(|v| !v.is_finite()) {
        return Err("SVD produced non-finite values.".into());
    }

    let all_eigenvalues: Vec<f64> = singular_values
        .iter()
        .map(|s| s * s / (n_samples as f64 - 1.0))
        .collect();
    let total_variance: f64 = all_eigenvalues.iter().sum();
    if !(total_variance.is_finite() && total_variance > 0.0) {
        return Err(format!("SVD total variance is degenerate ({}).", total_variance).into());
    }

    // Rows paired with singular values first, by descending value, then the
    // remaining null-space rows in backend order.
    let mut order: Vec<usize> = (0..singular_values.len()).collect();
    order.sort_by(|&a, &b| {
        singular_values[b]
            .partial_cmp(&singular_values[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order.extend(singular_values.len()..vt.nrows());

    let mut components = Array2::<f64>::zeros((k, n_features));
    let mut eigenvalues = Vec::with_capacity(k);
    for (row_idx, &src) in order.iter().take(k).enumerate() {
        let mut component = vt.row(src).to_owned();
        let norm = component.dot(&component).sqrt();
        if norm <= 1e-9 {
            return Err(format!("Right singular vector {} has zero norm.", src).into());
        }
        component.mapv_inplace(|x| x / norm);
        components.row_mut(row_idx).assign(&component);
        if let Some(&lambda) = all_eigenvalues.get(src) {
            eigenvalues.push(lambda);
        }
    }

    Ok(Spectrum {
        components,
        eigenvalues,
        total_variance,
        path: DecompositionPath::ExactSvd,
    })
}

/// Fallback path: power iteration with deflation on the explicit covariance.
fn fallback_spectrum<R: Rng + ?Sized>(
    standardized: ArrayView2<f64>,
    k: usize,
    config: &PowerIterationConfig,
    rng: &mut R,
) -> Result<Spectrum, PcaError> {
    let n_features = standardized.ncols();
    let cov = covariance_matrix(standardized);
    let pairs = power_iteration_top_k(cov.view(), k, config, rng);
    if pairs.len() != k {
        return Err(PcaError::DecompositionFailure(format!(
            "power iteration extracted {} of {} components",
            pairs.len(),
            k
        )));
    }

    let components = Array2::from_shape_fn((k, n_features), |(i, j)| pairs.vectors[i][j]);
    if components.iter().chain(pairs.values.iter()).any(|v| !v.is_finite()) {
        return Err(PcaError::DecompositionFailure(
            "power iteration produced non-finite values".to_string(),
        ));
    }

    let mut total_variance = trace(cov.view());
    if !(total_variance.is_finite() && total_variance > 0.0) {
        total_variance = n_features as f64;
    }

    Ok(Spectrum {
        components,
        eigenvalues: pairs.values,
        total_variance,
        path: DecompositionPath::PowerIteration,
    })
}

/// Ratios `max(lambda, 0) / total`, clamped to [0, 1] and padded to length `k`.
fn explained_variance_ratios(eigenvalues: &[f64], total_variance: f64, k: usize) -> Vec<f64> {
    let ratios = eigenvalues
        .iter()
        .take(k)
        .map(|&lambda| (lambda.max(0.0) / total_variance).clamp(0.0, 1.0))
        .collect();
    pad_explained_variance(ratios, k)
}

/// Brings an explained-variance sequence to exactly `k` entries.
///
/// Missing trailing entries become `0.0`; if nothing was extracted at all, the
/// variance is spread evenly as `1 / k`.
pub fn pad_explained_variance(mut ratios: Vec<f64>, k: usize) -> Vec<f64> {
    if k == 0 {
        return Vec::new();
    }
    if ratios.is_empty() {
        return vec![1.0 / k as f64; k];
    }
    ratios.resize(k, 0.0);
    ratios
}

/// Reduces raw observations with the default configuration.
///
/// # Examples
///
/// ```
/// use finance_pca::reduce;
/// use ndarray::array;
///
/// let x = array![[1.0, 1.0], [1.0, 3.0], [3.0, 1.0], [3.0, 3.0]];
/// let result = reduce(x.view(), 2).unwrap();
/// assert_eq!(result.transformed.dim(), (4, 2));
/// ```
pub fn reduce(observations: ArrayView2<f64>, target_rank: usize) -> Result<PcaResult, PcaError> {
    PcaEngine::new(PcaConfig::default()).reduce(observations, target_rank)
}

/// Reduces row-major observations, rejecting ragged rows.
pub fn reduce_rows(rows: &[Vec<f64>], target_rank: usize) -> Result<PcaResult, PcaError> {
    let observations = observations_from_rows(rows)?;
    reduce(observations.view(), target_rank)
}
