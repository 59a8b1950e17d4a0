//! Artifact Module - Versioned Explainer Artifact
//!
//! The fitted explainer is persisted as one JSON document: classifier
//! structure, background sample, feature layout, scaler and configuration.
//!
//! # Architecture
//! - `types.rs`: `ExplainerArtifact`, on-disk envelope, versions
//! - `validate.rs`: checksum, schema and layout validation
//! - `storage.rs`: save / load with validation
//!
//! # Failure Strategy
//! Any checksum, schema or layout mismatch on load is fatal: an explainer
//! is never rebuilt from an artifact that disagrees with its own layout.

pub mod storage;
pub mod types;
pub mod validate;


use std::sync::Arc;

use crate::logic::error::CreditResult;
use crate::logic::explain::CreditExplainer;
use crate::logic::model::Classifier;

pub use storage::{get_default_artifact_path, load_artifact, save_artifact};
pub use types::{ArtifactEnvelope, ExplainerArtifact, ARTIFACT_FORMAT_VERSION, ARTIFACT_SCHEMA_VERSION};
pub use validate::{payload_checksum, validate_artifact};

impl ExplainerArtifact {
    /// Rebuild and fit the explainer described by this artifact.
    pub fn into_explainer(self) -> CreditResult<CreditExplainer> {
        validate_artifact(&self)?;
        let background = self.background_matrix()?;
        let model: Arc<dyn Classifier> = Arc::new(self.model);

        let mut explainer = CreditExplainer::new(model, self.layout, background, self.config)?;
        if let Some(scaler) = self.scaler {
            explainer = explainer.with_scaler(scaler)?;
        }
        explainer.fit()?;
        Ok(explainer)
    }
}
