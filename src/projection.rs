// src/projection.rs

use crate::error::PcaError;
use ndarray::{array, Array1, Array2, ArrayView1, ArrayView2};

/// Projects standardized observations onto a set of components.
///
/// * `standardized` - shape (n_samples, n_features)
/// * `components` - one component per row, shape (k_components, n_features)
///
/// Returns the scores, shape (n_samples, k_components): entry (i, j) is the dot
/// product of observation i with component j.
pub fn project(standardized: ArrayView2<f64>, components: ArrayView2<f64>) -> Array2<f64> {
    standardized.dot(&components.t())
}

/// Unit direction (cos θ, sin θ) in a 2-D feature plane.
pub fn direction_from_angle(angle_radians: f64) -> Array1<f64> {
    array![angle_radians.cos(), angle_radians.sin()]
}

/// Angle of a 2-D direction measured from the first feature axis, in radians.
///
/// Returns `None` if `component` is not 2-D or has zero length.
pub fn component_angle(component: ArrayView1<f64>) -> Option<f64> {
    if component.len() != 2 {
        return None;
    }
    let (x, y) = (component[0], component[1]);
    if x.hypot(y) == 0.0 {
        return None;
    }
    Some(y.atan2(x))
}

/// Projects 2-D standardized points onto the axis at `angle_radians`.
///
/// Used to let a viewer rotate a candidate axis and compare its spread with the
/// first principal component's.
///
/// # Errors
/// Returns `PcaError::InvalidInput` if the points do not have exactly 2 columns.
pub fn project_onto_angle(
    standardized: ArrayView2<f64>,
    angle_radians: f64,
) -> Result<Array1<f64>, PcaError> {
    if standardized.ncols() != 2 {
        return Err(PcaError::invalid(format!(
            "angle projection needs 2 feature columns, got {}",
            standardized.ncols()
        )));
    }
    Ok(standardized.dot(&direction_from_angle(angle_radians)))
}

/// Sample variance (`n - 1` divisor) of projected scores.
pub fn projected_variance(scores: ArrayView1<f64>) -> f64 {
    let n = scores.len();
    if n < 2 {
        return 0.0;
    }
    let mean = scores.sum() / n as f64;
    scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0)
}
