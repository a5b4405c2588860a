//! Input resolution and feature selection.
//!
//! The resolver picks the source feature matrix under a fixed precedence
//! (explicit matrix > alternate feature set > primary measurement set); the
//! selector intersects the requested names with what that matrix offers,
//! keeping the matrix's native row order. Genuinely absent names are dropped
//! with an informational count, never an error.

use crate::data::{DataError, FeatureMatrix};
use crate::model::EnhanceError;
use crate::object::ResolutionData;
use itertools::Itertools;
use std::collections::HashSet;

/// Picks the feature matrix to train on. Precedence: an explicitly supplied
/// matrix wins over an alternate set identifier, which wins over the primary
/// measurement set. A matrix without row labels is rejected here, before any
/// model sees it.
pub fn resolve_feature_matrix<'a>(
    reference: &'a ResolutionData,
    explicit: Option<&'a FeatureMatrix>,
    alternate_id: Option<&str>,
    measurement_id: &str,
) -> Result<&'a FeatureMatrix, EnhanceError> {
    let resolved = if let Some(matrix) = explicit {
        matrix
    } else if let Some(id) = alternate_id {
        reference
            .get_alternate(id)
            .ok_or_else(|| EnhanceError::MeasurementNotFound(id.to_string()))?
    } else {
        reference
            .get_measurement(measurement_id)
            .ok_or_else(|| EnhanceError::MeasurementNotFound(measurement_id.to_string()))?
    };
    if resolved.feature_names.is_empty() {
        return Err(DataError::MissingFeatureNames.into());
    }
    Ok(resolved)
}

/// The effective feature subset: names and row indices in the resolved
/// matrix's native order, plus the count of requested names that were absent.
#[derive(Debug, Clone)]
pub struct FeatureSelection {
    pub names: Vec<String>,
    pub indices: Vec<usize>,
    pub skipped: usize,
}

/// Computes the effective selection. An empty request means "all features".
/// Otherwise the selection is the intersection of the request with the
/// resolved row names, ordered as the matrix orders them; the set difference
/// is reported, not raised.
pub fn select_features(
    requested: &[String],
    resolved: &FeatureMatrix,
) -> Result<FeatureSelection, EnhanceError> {
    if requested.is_empty() {
        return Ok(FeatureSelection {
            names: resolved.feature_names.clone(),
            indices: (0..resolved.n_features()).collect(),
            skipped: 0,
        });
    }

    let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let (indices, names): (Vec<usize>, Vec<String>) = resolved
        .feature_names
        .iter()
        .enumerate()
        .filter(|(_, name)| wanted.contains(name.as_str()))
        .map(|(i, name)| (i, name.clone()))
        .unzip();

    let skipped = wanted.len() - names.len();
    if skipped > 0 {
        let available: HashSet<&str> = resolved.feature_names.iter().map(String::as_str).collect();
        let missing = wanted.difference(&available).sorted().join(", ");
        log::info!("skipping {skipped} requested feature(s) absent from the feature matrix: {missing}");
    }
    if names.is_empty() {
        return Err(DataError::EmptySelection.into());
    }
    Ok(FeatureSelection {
        names,
        indices,
        skipped,
    })
}
