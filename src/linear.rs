//! Linear backend: one ordinary least-squares fit per selected feature.
//!
//! Each feature's reference values are regressed on all embedding dimensions
//! (intercept included) and the fitted model is evaluated on every enhanced
//! sample. Fits are fully independent, so the per-feature loop is a rayon
//! map producing `(row index, predicted row, R-squared)` triples; assembly
//! into the output matrix happens afterwards on one thread.

use crate::data::{EmbeddingTable, FeatureMatrix};
use crate::model::{Diagnostics, EnhanceError};
use ndarray::{Array1, Array2};
use ndarray_linalg::LeastSquaresSvd;
use ndarray_linalg::error::LinalgError;
use rayon::prelude::*;

pub(crate) fn fit_and_predict(
    x_ref: &EmbeddingTable,
    x_enh: &EmbeddingTable,
    y_ref: &FeatureMatrix,
) -> Result<(Array2<f64>, Diagnostics), EnhanceError> {
    let design_ref = x_ref.design_matrix();
    let design_enh = x_enh.design_matrix();
    let p = y_ref.n_features();
    let n_enh = x_enh.data.nrows();

    let fits: Vec<(usize, Array1<f64>, f64)> = (0..p)
        .into_par_iter()
        .map(|i| -> Result<(usize, Array1<f64>, f64), LinalgError> {
            let y = y_ref.values.row(i).to_owned();
            let fit = design_ref.least_squares(&y)?;
            let fitted = design_ref.dot(&fit.solution);
            let predicted = design_enh.dot(&fit.solution);
            Ok((i, predicted, r_squared(&y, &fitted)))
        })
        .collect::<Result<_, _>>()?;

    let mut values = Array2::zeros((p, n_enh));
    let mut diagnostics = Diagnostics::with_capacity(p);
    for (i, row, r2) in fits {
        values.row_mut(i).assign(&row);
        diagnostics.insert(y_ref.feature_names[i].clone(), r2);
    }
    Ok((values, diagnostics))
}

/// Coefficient of determination. Deliberately unclamped: a pathological fit
/// may fall outside [0, 1] and must be surfaced as-is.
fn r_squared(observed: &Array1<f64>, fitted: &Array1<f64>) -> f64 {
    let mean = observed.mean().unwrap_or(0.0);
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = observed
        .iter()
        .zip(fitted.iter())
        .map(|(y, f)| (y - f).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}
