//! Compositional backend: one joint simplex-constrained regression.
//!
//! The selected feature vector of each reference sample is closed to a
//! composition (non-negative, summing to one) over the selected subset, mapped
//! through the additive log-ratio transform, and regressed jointly on the
//! embedding dimensions in a single multi-response least-squares solve.
//! Predictions come back through the inverse transform, so every predicted
//! column lies on the simplex by construction. No per-feature diagnostics
//! exist for a joint fit of this kind.

use crate::data::{EmbeddingTable, FeatureMatrix};
use crate::model::{Diagnostics, EnhanceError};
use ndarray::{Array2, ArrayView2, Axis};
use ndarray_linalg::LeastSquaresSvd;

/// Floor applied to composition components before the log-ratio transform.
/// Zero (or negative) measurements would otherwise make the transform
/// undefined.
const COMPOSITION_FLOOR: f64 = 1e-9;

pub(crate) fn fit_and_predict(
    x_ref: &EmbeddingTable,
    x_enh: &EmbeddingTable,
    y_ref: &FeatureMatrix,
) -> Result<(Array2<f64>, Diagnostics), EnhanceError> {
    let p = y_ref.n_features();
    let n_ref = x_ref.data.nrows();
    let n_enh = x_enh.data.nrows();

    // Restricting to a subset of the features renormalizes the simplex
    // implicitly: closure runs over the selected rows only.
    let comp = close_to_simplex(y_ref.values.view());

    if p == 1 {
        // Degenerate simplex: the single component is the whole composition.
        return Ok((Array2::ones((1, n_enh)), Diagnostics::new()));
    }

    // Additive log-ratio with the last selected feature as the denominator,
    // giving p-1 response columns for one shared design.
    let z = Array2::from_shape_fn((n_ref, p - 1), |(s, j)| {
        (comp[(j, s)] / comp[(p - 1, s)]).ln()
    });

    let design_ref = x_ref.design_matrix();
    let design_enh = x_enh.design_matrix();
    let fit = design_ref.least_squares(&z)?;
    let z_hat = design_enh.dot(&fit.solution);

    // Inverse transform, stabilized against overflow: the implicit reference
    // coordinate is exp(0).
    let mut values = Array2::zeros((p, n_enh));
    for (s, z_row) in z_hat.axis_iter(Axis(0)).enumerate() {
        let peak = z_row.iter().fold(0.0f64, |m, &v| m.max(v));
        let denom: f64 =
            (-peak).exp() + z_row.iter().map(|&v| (v - peak).exp()).sum::<f64>();
        for j in 0..p - 1 {
            values[(j, s)] = (z_row[j] - peak).exp() / denom;
        }
        values[(p - 1, s)] = (-peak).exp() / denom;
    }
    Ok((values, Diagnostics::new()))
}

/// Closes each sample column to the simplex: components are floored at
/// `COMPOSITION_FLOOR` and divided by the column sum.
fn close_to_simplex(y: ArrayView2<'_, f64>) -> Array2<f64> {
    let mut comp = y.mapv(|v| v.max(COMPOSITION_FLOOR));
    for mut column in comp.axis_iter_mut(Axis(1)) {
        let total = column.sum();
        column.mapv_inplace(|v| v / total);
    }
    comp
}
