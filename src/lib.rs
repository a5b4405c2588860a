//! Fine-resolution prediction of per-unit features from a shared
//! low-dimensional embedding.
//!
//! A supervised model is fit per feature using the coarse-resolution
//! embedding as predictors and the coarse measurements as responses, then
//! evaluated on the fine-resolution embedding to produce enhanced values.
//! Three regression strategies sit behind one dispatch contract: ordinary
//! per-feature linear regression, a joint simplex-constrained compositional
//! fit, and gradient-boosted regression trees.

#![deny(dead_code)]
#![deny(unused_imports)]

pub mod compositional;
pub mod data;
pub mod enhance;
pub mod linear;
pub mod model;
pub mod object;
pub mod resolve;
pub mod tree;

pub use data::{DataError, EmbeddingMatrix, EmbeddingTable, FeatureMatrix, realign_dimensions};
pub use enhance::{Enhanced, EnhanceOptions, enhance_features};
pub use model::{Diagnostics, EnhanceError, EnhanceModel};
pub use object::ResolutionData;
pub use resolve::{FeatureSelection, resolve_feature_matrix, select_features};
