//! # Feature Enhancement Orchestration
//!
//! The public entry point wires the stages together: resolve the source
//! feature matrix, compute the effective selection, dispatch to the chosen
//! regression backend, and materialize the result. Materialization either
//! returns the raw predicted matrix (with diagnostics) or a copy of the
//! enhanced-resolution data object with the predictions attached; the
//! caller's objects are never mutated.

use crate::data::FeatureMatrix;
use crate::model::{self, Diagnostics, EnhanceError, EnhanceModel};
use crate::object::ResolutionData;
use crate::resolve::{resolve_feature_matrix, select_features};

/// Invocation options for one enhancement call.
#[derive(Debug, Clone)]
pub struct EnhanceOptions {
    pub model: EnhanceModel,
    /// Name of the shared embedding, present on both data objects.
    pub embedding: String,
    /// Primary measurement set identifier on the reference object; also the
    /// destination set when predictions are written back.
    pub measurement: String,
    /// Alternate feature set identifier; when set it takes precedence over
    /// the primary set for resolution and for write-back.
    pub alternate: Option<String>,
    /// Requested feature names; empty means all features.
    pub features: Vec<String>,
    /// Explicitly supplied feature matrix; wins over both stored sets.
    pub explicit_matrix: Option<FeatureMatrix>,
}

impl EnhanceOptions {
    pub fn new(model: EnhanceModel, embedding: &str, measurement: &str) -> Self {
        Self {
            model,
            embedding: embedding.to_string(),
            measurement: measurement.to_string(),
            alternate: None,
            features: Vec::new(),
            explicit_matrix: None,
        }
    }
}

/// The two return shapes of an enhancement call.
#[derive(Debug, Clone)]
pub enum Enhanced {
    /// Raw predicted matrix with per-feature diagnostics. Produced whenever
    /// an explicit matrix was supplied or the selection was partial; such
    /// predictions have no well-defined home in a measurement set.
    Matrix {
        values: FeatureMatrix,
        diagnostics: Diagnostics,
    },
    /// A copy of the enhanced-resolution object with the predictions
    /// attached as a measurement set.
    Object(ResolutionData),
}

/// Predicts fine-resolution values for the selected features.
///
/// Fits the chosen model per feature on the reference embedding and the
/// resolved reference measurements, evaluates it on the enhanced embedding,
/// and materializes the predictions according to the invocation mode.
pub fn enhance_features(
    reference: &ResolutionData,
    enhanced: &ResolutionData,
    opts: &EnhanceOptions,
) -> Result<Enhanced, EnhanceError> {
    let x_ref = reference
        .get_embedding(&opts.embedding)
        .ok_or_else(|| EnhanceError::EmbeddingNotFound(opts.embedding.clone()))?;
    let x_enh = enhanced
        .get_embedding(&opts.embedding)
        .ok_or_else(|| EnhanceError::EmbeddingNotFound(opts.embedding.clone()))?;

    let resolved = resolve_feature_matrix(
        reference,
        opts.explicit_matrix.as_ref(),
        opts.alternate.as_deref(),
        &opts.measurement,
    )?;
    let selection = select_features(&opts.features, resolved)?;
    let y_ref = resolved.restrict_rows(&selection.indices);

    log::info!(
        "enhancing {} feature(s) with the {} model: {} reference samples -> {} enhanced samples",
        selection.names.len(),
        opts.model,
        x_ref.n_samples(),
        x_enh.n_samples(),
    );

    let (predicted, diagnostics) = model::fit_and_predict(opts.model, x_ref, x_enh, &y_ref)?;

    // Materialization order: a partial or externally-supplied feature set is
    // always returned raw, even when an alternate identifier was given.
    let partial = selection.names.len() < resolved.n_features();
    if opts.explicit_matrix.is_some() || partial {
        return Ok(Enhanced::Matrix {
            values: predicted,
            diagnostics,
        });
    }
    log::debug!(
        "attaching {} predicted feature(s) to the enhanced object ({} diagnostic entries)",
        predicted.n_features(),
        diagnostics.len(),
    );
    let updated = match &opts.alternate {
        Some(id) => enhanced.clone().with_alternate(id, predicted),
        None => enhanced.clone().with_measurement(&opts.measurement, predicted),
    };
    Ok(Enhanced::Object(updated))
}
