//! The concrete data object at the collaborator boundary: named embeddings
//! plus primary and alternate measurement sets for one resolution. Updates
//! are non-destructive; `with_*` methods return a new object and never touch
//! the caller's instance.

use crate::data::{EmbeddingMatrix, FeatureMatrix};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct ResolutionData {
    embeddings: HashMap<String, EmbeddingMatrix>,
    measurements: HashMap<String, FeatureMatrix>,
    alternates: HashMap<String, FeatureMatrix>,
}

impl ResolutionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_embedding(mut self, name: &str, embedding: EmbeddingMatrix) -> Self {
        self.embeddings.insert(name.to_string(), embedding);
        self
    }

    /// Returns a copy with `matrix` attached as the primary measurement set
    /// `set_id`, replacing any existing set under that identifier.
    pub fn with_measurement(mut self, set_id: &str, matrix: FeatureMatrix) -> Self {
        self.measurements.insert(set_id.to_string(), matrix);
        self
    }

    /// Returns a copy with `matrix` attached as the alternate feature set
    /// `set_id`.
    pub fn with_alternate(mut self, set_id: &str, matrix: FeatureMatrix) -> Self {
        self.alternates.insert(set_id.to_string(), matrix);
        self
    }

    pub fn get_embedding(&self, name: &str) -> Option<&EmbeddingMatrix> {
        self.embeddings.get(name)
    }

    pub fn get_measurement(&self, set_id: &str) -> Option<&FeatureMatrix> {
        self.measurements.get(set_id)
    }

    pub fn get_alternate(&self, set_id: &str) -> Option<&FeatureMatrix> {
        self.alternates.get(set_id)
    }
}
