// Principal component analysis (PCA) core for the finance teaching tool

#![doc = include_str!("../README.md")]

pub mod dataset;
pub mod error;
pub mod linalg_backends;
pub mod pca;
pub mod power_iteration;
pub mod projection;
pub mod standardize;


pub use error::{PcaError, ThreadSafeStdError};
pub use linalg_backends::{BackendSVD, NdarrayLinAlgBackend, SVDOutput};
pub use pca::{
    pad_explained_variance, reduce, reduce_rows, DecompositionPath, DecompositionStrategy,
    PcaConfig, PcaEngine, PcaResult, ReducedRows,
};
pub use power_iteration::PowerIterationConfig;
pub use standardize::{observations_from_rows, standardize, Standardized};
