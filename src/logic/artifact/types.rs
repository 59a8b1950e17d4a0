use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::logic::config::ExplainConfig;
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::features::{FeatureLayout, FeatureScaler};
use crate::logic::model::{Classifier, ModelSpec};

// ============================================================================
// VERSIONS
// ============================================================================

/// Envelope format (checksum scheme). MUST change when the envelope changes.
pub const ARTIFACT_FORMAT_VERSION: u8 = 1;

/// Payload schema. MUST change when a payload field changes meaning.
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

// ============================================================================
// EXPLAINER ARTIFACT
// ============================================================================

/// Everything needed to rebuild a fitted explainer: classifier structure,
/// background sample, feature ordering, encoding scaler and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainerArtifact {
    pub schema_version: u32,
    pub id: String,
    pub created_at: DateTime<Utc>,

    // Feature contract
    pub layout: FeatureLayout,
    pub layout_hash: u32,

    pub model: ModelSpec,
    #[serde(default)]
    pub scaler: Option<FeatureScaler>,

    /// Background rows in layout order
    pub background: Vec<Vec<f64>>,

    #[serde(default)]
    pub config: ExplainConfig,
}

impl ExplainerArtifact {
    pub fn new(
        layout: FeatureLayout,
        model: ModelSpec,
        background: &Array2<f64>,
        config: ExplainConfig,
    ) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            layout_hash: layout.hash(),
            layout,
            model,
            scaler: None,
            background: background.outer_iter().map(|row| row.to_vec()).collect(),
            config,
        }
    }

    pub fn with_scaler(mut self, scaler: FeatureScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn feature_count(&self) -> usize {
        self.layout.len()
    }

    pub fn model_width(&self) -> usize {
        self.model.n_features()
    }

    /// Background rows as a matrix (rows must share the layout width)
    pub fn background_matrix(&self) -> CreditResult<Array2<f64>> {
        let width = self.layout.len();
        let mut data = Vec::with_capacity(self.background.len() * width);
        for (i, row) in self.background.iter().enumerate() {
            if row.len() != width {
                return Err(CreditError::ShapeMismatch {
                    expected: width,
                    actual: row.len(),
                    detail: format!("artifact background row {}", i),
                });
            }
            data.extend_from_slice(row);
        }
        Array2::from_shape_vec((self.background.len(), width), data)
            .map_err(|e| CreditError::Numerical(e.to_string()))
    }
}

// ============================================================================
// ON-DISK ENVELOPE
// ============================================================================

/// File layout: the payload is kept as raw JSON so the checksum covers the
/// exact persisted bytes.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    pub format_version: u8,
    /// SHA-256 (hex) of the payload bytes
    pub checksum: String,
    pub payload: Box<RawValue>,
}
