use std::fs;
use std::path::{Path, PathBuf};

use serde_json::value::RawValue;

use super::types::{ArtifactEnvelope, ExplainerArtifact, ARTIFACT_FORMAT_VERSION};
use super::validate::{payload_checksum, validate_artifact, validate_envelope};
use crate::constants::{self, APP_NAME};
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::model::Classifier;

/// `CREDIT_ARTIFACT_PATH`, or the default location under the local data dir
pub fn get_default_artifact_path() -> PathBuf {
    constants::get_artifact_path().unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join("explainer_v1.json")
    })
}

/// Save artifact to disk
pub fn save_artifact(artifact: &ExplainerArtifact, path: &Path) -> CreditResult<()> {
    // Ensure directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let payload = serde_json::to_string(artifact)?;
    let envelope = ArtifactEnvelope {
        format_version: ARTIFACT_FORMAT_VERSION,
        checksum: payload_checksum(payload.as_bytes()),
        payload: RawValue::from_string(payload)?,
    };

    fs::write(path, serde_json::to_vec_pretty(&envelope)?)?;
    log::info!(
        "Saved explainer artifact {} ({} features, {} background rows) to {}",
        artifact.id,
        artifact.feature_count(),
        artifact.background.len(),
        path.display()
    );
    Ok(())
}

/// Load artifact from disk with integrity and compatibility checks
pub fn load_artifact(path: &Path) -> CreditResult<ExplainerArtifact> {
    if !path.exists() {
        return Err(CreditError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("artifact not found: {}", path.display()),
        )));
    }

    let data = fs::read(path)?;
    let envelope: ArtifactEnvelope = serde_json::from_slice(&data)?;
    validate_envelope(&envelope)?;

    let artifact: ExplainerArtifact = serde_json::from_str(envelope.payload.get())?;
    validate_artifact(&artifact)?;

    log::info!(
        "Loaded explainer artifact {} (schema v{}, layout {:08x}, model {})",
        artifact.id,
        artifact.schema_version,
        artifact.layout_hash,
        artifact.model.name()
    );
    Ok(artifact)
}
