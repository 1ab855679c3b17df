// src/linalg_backends.rs

use crate::error::ThreadSafeStdError;
use ndarray::{Array1, Array2};
use ndarray_linalg::SVDInto as NdLinalgSVDInto;

/// Output of a Singular Value Decomposition.
#[derive(Debug)]
pub struct SVDOutput {
    /// Left singular vectors as columns, if requested.
    pub u: Option<Array2<f64>>,
    /// Singular values in descending order.
    pub s: Array1<f64>,
    /// Right singular vectors as rows, if requested.
    /// vt.row(i) corresponds to s[i] for i < s.len().
    pub vt: Option<Array2<f64>>,
}

/// Trait for Singular Value Decomposition.
///
/// This is the one capability the exact reduction path needs from a dense
/// linear-algebra library. Implementations may fail; the engine recovers
/// through its iterative fallback.
pub trait BackendSVD {
    fn svd_into(
        &self,
        matrix: Array2<f64>,
        compute_u: bool,
        compute_v: bool,
    ) -> Result<SVDOutput, ThreadSafeStdError>;
}

/// LAPACK-backed SVD through `ndarray-linalg`.
#[derive(Debug, Default, Copy, Clone)]
pub struct NdarrayLinAlgBackend;

// Helper to convert ndarray-linalg's error to Box<dyn Error + Send + Sync>
fn to_dyn_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> ThreadSafeStdError {
    Box::new(e)
}

impl BackendSVD for NdarrayLinAlgBackend {
    fn svd_into(
        &self,
        matrix: Array2<f64>,
        compute_u: bool,
        compute_v: bool,
    ) -> Result<SVDOutput, ThreadSafeStdError> {
        if matrix.is_empty() {
            return Err("SVD input matrix is empty.".into());
        }
        let (u, s, vt) = matrix
            .svd_into(compute_u, compute_v)
            .map_err(to_dyn_error)?;
        Ok(SVDOutput { u, s, vt })
    }
}
