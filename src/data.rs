//! # Labeled Matrix Containers
//!
//! This module defines the validated `ndarray` containers shared by every
//! enhancement stage: embeddings (samples x dimensions) and feature matrices
//! (features x samples), both carrying their axis labels. Construction is the
//! single validation point: shapes must agree with their labels and all
//! values must be finite, so downstream code can assume well-formed input.

use ndarray::Array2;
use thiserror::Error;

/// A shared low-dimensional embedding at one resolution.
/// Shape: [n_samples, n_dims], with one label per axis entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    pub values: Array2<f64>,
    pub sample_ids: Vec<String>,
    pub dim_names: Vec<String>,
}

impl EmbeddingMatrix {
    pub fn new(
        values: Array2<f64>,
        sample_ids: Vec<String>,
        dim_names: Vec<String>,
    ) -> Result<Self, DataError> {
        if sample_ids.len() != values.nrows() {
            return Err(DataError::LabelShapeMismatch {
                axis: "sample",
                labels: sample_ids.len(),
                size: values.nrows(),
            });
        }
        if dim_names.len() != values.ncols() {
            return Err(DataError::LabelShapeMismatch {
                axis: "dimension",
                labels: dim_names.len(),
                size: values.ncols(),
            });
        }
        if !values.iter().all(|v| v.is_finite()) {
            return Err(DataError::NonFiniteValues("embedding matrix"));
        }
        Ok(Self {
            values,
            sample_ids,
            dim_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_dims(&self) -> usize {
        self.values.ncols()
    }

    /// The labeled tabular form consumed by the formula-building backends.
    pub fn to_table(&self) -> EmbeddingTable {
        EmbeddingTable {
            columns: self.dim_names.clone(),
            data: self.values.clone(),
        }
    }
}

/// Tabular embedding representation: one named column per dimension.
/// The linear and compositional backends build per-dimension model terms from
/// the column names; the tree backend never sees this form.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    pub columns: Vec<String>,
    pub data: Array2<f64>,
}

impl EmbeddingTable {
    /// Design matrix for a regression on all dimensions: intercept column
    /// followed by one column per named dimension, in table order.
    pub fn design_matrix(&self) -> Array2<f64> {
        use itertools::Itertools;
        let n = self.data.nrows();
        let mut design = Array2::ones((n, self.columns.len() + 1));
        for j in 0..self.columns.len() {
            design.column_mut(j + 1).assign(&self.data.column(j));
        }
        log::debug!(
            "design: ~ 1 + {}",
            self.columns.iter().join(" + ")
        );
        design
    }
}

/// A measured (or predicted) feature set at one resolution.
/// Shape: [n_features, n_samples]. `feature_names` may be empty for a matrix
/// that genuinely has no row labels; the input resolver rejects such a matrix
/// before it reaches any model.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub values: Array2<f64>,
    pub feature_names: Vec<String>,
    pub sample_ids: Vec<String>,
}

impl FeatureMatrix {
    pub fn new(
        values: Array2<f64>,
        feature_names: Vec<String>,
        sample_ids: Vec<String>,
    ) -> Result<Self, DataError> {
        if !feature_names.is_empty() && feature_names.len() != values.nrows() {
            return Err(DataError::LabelShapeMismatch {
                axis: "feature",
                labels: feature_names.len(),
                size: values.nrows(),
            });
        }
        if sample_ids.len() != values.ncols() {
            return Err(DataError::LabelShapeMismatch {
                axis: "sample",
                labels: sample_ids.len(),
                size: values.ncols(),
            });
        }
        if !values.iter().all(|v| v.is_finite()) {
            return Err(DataError::NonFiniteValues("feature matrix"));
        }
        Ok(Self {
            values,
            feature_names,
            sample_ids,
        })
    }

    pub fn n_features(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.values.ncols()
    }

    /// A copy restricted to the given row indices, preserving their order.
    pub fn restrict_rows(&self, indices: &[usize]) -> FeatureMatrix {
        use ndarray::Axis;
        FeatureMatrix {
            values: self.values.select(Axis(0), indices),
            feature_names: indices
                .iter()
                .map(|&i| self.feature_names[i].clone())
                .collect(),
            sample_ids: self.sample_ids.clone(),
        }
    }
}

/// Pure realignment step for a recoverable label inconsistency: the enhanced
/// embedding's dimension labels are overwritten with the reference's, trusting
/// positional alignment over the labels. The input is left untouched.
pub fn realign_dimensions(x_enh: &EmbeddingMatrix, x_ref: &EmbeddingMatrix) -> EmbeddingMatrix {
    log::warn!(
        "dimension labels of the enhanced embedding do not match the reference; \
         overwriting with the reference labels (positional alignment is trusted)"
    );
    EmbeddingMatrix {
        values: x_enh.values.clone(),
        sample_ids: x_enh.sample_ids.clone(),
        dim_names: x_ref.dim_names.clone(),
    }
}

/// Errors raised while constructing or resolving labeled matrices.
/// These are user-input errors; messages state what to fix.
#[derive(Error, Debug)]
pub enum DataError {
    #[error(
        "the {axis} axis carries {labels} labels but has {size} entries; labels must match the matrix shape"
    )]
    LabelShapeMismatch {
        axis: &'static str,
        labels: usize,
        size: usize,
    },
    #[error(
        "the resolved feature matrix has no row labels; feature names are required to address predictions"
    )]
    MissingFeatureNames,
    #[error("non-finite values (NaN or infinity) found in the {0}; all inputs must be finite")]
    NonFiniteValues(&'static str),
    #[error("no requested feature is present in the resolved feature matrix; nothing to predict")]
    EmptySelection,
}
