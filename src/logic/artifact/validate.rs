use sha2::{Digest, Sha256};

use super::types::{ArtifactEnvelope, ExplainerArtifact, ARTIFACT_FORMAT_VERSION, ARTIFACT_SCHEMA_VERSION};
use crate::logic::error::{CreditError, CreditResult};

/// Hex SHA-256 of a payload
pub fn payload_checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Envelope-level checks: format version and payload integrity
pub fn validate_envelope(envelope: &ArtifactEnvelope) -> CreditResult<()> {
    if envelope.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(CreditError::Artifact(format!(
            "unsupported artifact format v{} (expected v{})",
            envelope.format_version, ARTIFACT_FORMAT_VERSION
        )));
    }

    let actual = payload_checksum(envelope.payload.get().as_bytes());
    if !actual.eq_ignore_ascii_case(&envelope.checksum) {
        return Err(CreditError::ChecksumMismatch {
            expected: envelope.checksum.clone(),
            actual,
        });
    }
    Ok(())
}

/// Validate artifact compatibility with the current engine
pub fn validate_artifact(artifact: &ExplainerArtifact) -> CreditResult<()> {
    if artifact.schema_version != ARTIFACT_SCHEMA_VERSION {
        return Err(CreditError::Artifact(format!(
            "unsupported artifact schema v{} (expected v{})",
            artifact.schema_version, ARTIFACT_SCHEMA_VERSION
        )));
    }

    // Stored hash must match the stored layout
    artifact
        .layout
        .validate(artifact.layout.version(), artifact.layout_hash)?;

    artifact.model.validate()?;
    if artifact.model_width() != artifact.feature_count() {
        return Err(CreditError::ShapeMismatch {
            expected: artifact.feature_count(),
            actual: artifact.model_width(),
            detail: "artifact model width".to_string(),
        });
    }

    if let Some(scaler) = &artifact.scaler {
        artifact.layout.check_width(scaler.width())?;
    }

    if artifact.background.is_empty() {
        return Err(CreditError::InvalidBackground(
            "artifact carries no background rows".to_string(),
        ));
    }
    artifact.background_matrix()?;

    artifact.config.validate()
}
