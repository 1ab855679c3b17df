// src/standardize.rs

use crate::error::PcaError;
use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// A column-wise standardized observation matrix together with the statistics
/// used to produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardized {
    /// Standardized values, same shape as the raw observations.
    pub data: Array2<f64>,
    /// Column means of the raw observations.
    /// Shape: (n_features)
    pub means: Array1<f64>,
    /// Divisors actually applied to each column: the sample standard deviation
    /// (Bessel-corrected), or `1.0` for constant columns.
    /// Shape: (n_features)
    pub std_devs: Array1<f64>,
}

impl Standardized {
    pub fn n_samples(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.data.ncols()
    }
}

/// Checks that an observation matrix is usable: at least 2 rows, at least 1 column,
/// and only finite values.
pub fn validate_observations(observations: ArrayView2<f64>) -> Result<(), PcaError> {
    let (n_samples, n_features) = observations.dim();
    if n_samples == 0 || n_features == 0 {
        return Err(PcaError::invalid(format!(
            "observation matrix is empty ({} rows, {} columns)",
            n_samples, n_features
        )));
    }
    if n_samples < 2 {
        return Err(PcaError::invalid(
            "at least 2 observations are required to compute a sample standard deviation",
        ));
    }
    if let Some(((row, col), value)) = observations
        .indexed_iter()
        .find(|(_, value)| !value.is_finite())
    {
        return Err(PcaError::invalid(format!(
            "non-finite value {} at row {}, column {}",
            value, row, col
        )));
    }
    Ok(())
}

/// Builds an observation matrix from nested rows, rejecting empty and ragged input.
///
/// # Errors
/// Returns `PcaError::InvalidInput` if there are no rows, the first row is empty,
/// or any row's length differs from the first row's.
pub fn observations_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>, PcaError> {
    let first = rows
        .first()
        .ok_or_else(|| PcaError::invalid("observation matrix has no rows"))?;
    let n_features = first.len();
    if n_features == 0 {
        return Err(PcaError::invalid("observation rows have no columns"));
    }
    if let Some((idx, row)) = rows
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != n_features)
    {
        return Err(PcaError::invalid(format!(
            "ragged observations: row {} has {} values, expected {}",
            idx,
            row.len(),
            n_features
        )));
    }
    let flat: Vec<f64> = rows.iter().flat_map(|row| row.iter().copied()).collect();
    Array2::from_shape_vec((rows.len(), n_features), flat)
        .map_err(|e| PcaError::invalid(format!("failed to shape observations: {}", e)))
}

/// Standardizes each column to zero mean and unit sample standard deviation.
///
/// The standard deviation uses the `n - 1` divisor. A constant column keeps a
/// divisor of `1.0` and becomes all zeros, since it carries no variance.
///
/// # Errors
/// Returns `PcaError::InvalidInput` for empty input, fewer than 2 rows,
/// non-finite values, or a column whose mean overflows `f64`.
pub fn standardize(observations: ArrayView2<f64>) -> Result<Standardized, PcaError> {
    validate_observations(observations)?;
    let (n_samples, n_features) = observations.dim();
    debug!(
        "Standardizing observation matrix ({} samples, {} features).",
        n_samples, n_features
    );

    let means = observations
        .mean_axis(Axis(0))
        .ok_or_else(|| PcaError::invalid("failed to compute column means"))?;
    let mut data = &observations - &means;

    let raw_std_devs = data.map_axis(Axis(0), sample_std_dev);

    let mut std_devs = Array1::<f64>::ones(n_features);
    for (j, mut column) in data.axis_iter_mut(Axis(1)).enumerate() {
        let sd = raw_std_devs[j];
        if !sd.is_finite() {
            return Err(PcaError::invalid(format!(
                "column {} overflows f64 while centering (mean = {})",
                j, means[j]
            )));
        }
        if is_degenerate_scale(sd, means[j], n_samples) {
            trace!("Column {} is constant (sd = {:e}); filling with zeros.", j, sd);
            column.fill(0.0);
        } else {
            std_devs[j] = sd;
            column.mapv_inplace(|x| x / sd);
        }
    }

    Ok(Standardized {
        data,
        means,
        std_devs,
    })
}

/// Bessel-corrected standard deviation of an already centered column.
///
/// Deviations are scaled by their largest magnitude before squaring so that
/// large finite inputs do not overflow. Non-finite deviations give a
/// non-finite result.
fn sample_std_dev(centered: ArrayView1<f64>) -> f64 {
    let scale = centered.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    let sum_sq: f64 = centered.iter().map(|x| (x / scale).powi(2)).sum();
    scale * (sum_sq / (centered.len() as f64 - 1.0)).sqrt()
}

/// A column is constant when its spread is zero or within the rounding error
/// of summing `n_samples` copies of its mean.
fn is_degenerate_scale(std_dev: f64, mean: f64, n_samples: usize) -> bool {
    std_dev == 0.0 || std_dev <= n_samples as f64 * f64::EPSILON * mean.abs()
}
