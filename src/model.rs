//! # Model Dispatch
//!
//! One closed enum names the three regression strategies; the dispatcher
//! validates the shape and alignment invariants once, converts the embeddings
//! into the representation each backend requires (labeled table for the
//! formula-building backends, raw matrix for the tree backend), and delegates.
//! Backends never see the wrong representation and never re-validate shapes.

use crate::compositional;
use crate::data::{DataError, EmbeddingMatrix, FeatureMatrix, realign_dimensions};
use crate::linear;
use crate::tree;
use ndarray_linalg::error::LinalgError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Per-feature scalar quality metric, keyed by feature name. R-squared for
/// the linear backend, final-round training RMSE for the tree backend, empty
/// for the compositional backend.
pub type Diagnostics = HashMap<String, f64>;

/// The closed set of regression strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnhanceModel {
    /// Ordinary multiple regression, one independent fit per feature.
    Linear,
    /// One joint simplex-constrained regression across all selected features.
    Compositional,
    /// Gradient-boosted regression trees, one independent fit per feature.
    Tree,
}

impl FromStr for EnhanceModel {
    type Err = EnhanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(EnhanceModel::Linear),
            "compositional" => Ok(EnhanceModel::Compositional),
            "tree" => Ok(EnhanceModel::Tree),
            other => Err(EnhanceError::UnknownModel(other.to_string())),
        }
    }
}

impl fmt::Display for EnhanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EnhanceModel::Linear => "linear",
            EnhanceModel::Compositional => "compositional",
            EnhanceModel::Tree => "tree",
        };
        f.write_str(name)
    }
}

/// A comprehensive error type for the enhancement call path.
#[derive(Error, Debug)]
pub enum EnhanceError {
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(
        "embedding dimensionality differs between resolutions: reference has {reference} dimensions, enhanced has {enhanced}; both must come from the same embedding"
    )]
    DimensionMismatch { reference: usize, enhanced: usize },
    #[error(
        "the feature matrix covers {features} samples but the reference embedding has {embedding}; the two must describe the same sample set"
    )]
    SampleCountMismatch { features: usize, embedding: usize },
    #[error("unknown model '{0}'; expected one of: linear, compositional, tree")]
    UnknownModel(String),
    #[error("no embedding named '{0}' exists on the data object")]
    EmbeddingNotFound(String),
    #[error("no measurement set named '{0}' exists on the reference data object")]
    MeasurementNotFound(String),
    #[error("linear algebra backend failed: {0}")]
    Linalg(#[from] LinalgError),
}

/// Fits the chosen model on `(x_ref, y_ref)` and evaluates it on `x_enh`.
///
/// `y_ref` must already be restricted to the selected features. The returned
/// matrix has one row per feature of `y_ref` (same names, same order) and one
/// column per `x_enh` sample.
pub fn fit_and_predict(
    model: EnhanceModel,
    x_ref: &EmbeddingMatrix,
    x_enh: &EmbeddingMatrix,
    y_ref: &FeatureMatrix,
) -> Result<(FeatureMatrix, Diagnostics), EnhanceError> {
    if x_enh.n_dims() != x_ref.n_dims() {
        return Err(EnhanceError::DimensionMismatch {
            reference: x_ref.n_dims(),
            enhanced: x_enh.n_dims(),
        });
    }
    if y_ref.n_samples() != x_ref.n_samples() {
        return Err(EnhanceError::SampleCountMismatch {
            features: y_ref.n_samples(),
            embedding: x_ref.n_samples(),
        });
    }

    // Recoverable: mismatched dimension labels are realigned, not fatal.
    let x_enh: Cow<'_, EmbeddingMatrix> = if x_enh.dim_names != x_ref.dim_names {
        Cow::Owned(realign_dimensions(x_enh, x_ref))
    } else {
        Cow::Borrowed(x_enh)
    };

    let (values, diagnostics) = match model {
        EnhanceModel::Linear => {
            linear::fit_and_predict(&x_ref.to_table(), &x_enh.to_table(), y_ref)?
        }
        EnhanceModel::Compositional => {
            compositional::fit_and_predict(&x_ref.to_table(), &x_enh.to_table(), y_ref)?
        }
        EnhanceModel::Tree => {
            tree::fit_and_predict(x_ref.values.view(), x_enh.values.view(), y_ref)
        }
    };

    let predicted = FeatureMatrix {
        values,
        feature_names: y_ref.feature_names.clone(),
        sample_ids: x_enh.sample_ids.clone(),
    };
    Ok((predicted, diagnostics))
}
