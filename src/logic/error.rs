//! Error taxonomy for the explanation & fairness core.

use thiserror::Error;

pub type CreditResult<T> = Result<T, CreditError>;

#[derive(Debug, Error)]
pub enum CreditError {
    /// Feature vector does not match the fitted schema.
    /// The caller must re-run feature engineering.
    #[error("shape mismatch: expected {expected} features, got {actual} ({detail})")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        detail: String,
    },

    /// Attribution requested before the one-time fit step.
    #[error("explainer not initialized: call fit() before requesting explanations")]
    ExplainerUninitialized,

    /// A protected-attribute group has no members in the evaluation set.
    #[error("protected attribute '{attribute}' has no members for group '{group}'")]
    EmptyPartition { attribute: String, group: String },

    #[error("feature layout mismatch: expected v{expected_version} ({expected_hash:08x}), got v{actual_version} ({actual_hash:08x})")]
    LayoutMismatch {
        expected_version: u8,
        expected_hash: u32,
        actual_version: u8,
        actual_hash: u32,
    },

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid background data: {0}")]
    InvalidBackground(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("artifact checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("numerical failure: {0}")]
    Numerical(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CreditError {
    /// Every error of the core is fatal for the request that raised it.
    /// Data-quality problems (`EmptyPartition`, `ShapeMismatch`) are still
    /// reported, but never retried.
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            CreditError::ShapeMismatch { .. }
                | CreditError::EmptyPartition { .. }
                | CreditError::LayoutMismatch { .. }
        )
    }

    /// Generic message for the API boundary (details stay in the logs).
    pub fn user_message(&self) -> &'static str {
        match self {
            CreditError::ShapeMismatch { .. } | CreditError::LayoutMismatch { .. } => {
                "Application could not be encoded for the current model"
            }
            CreditError::EmptyPartition { .. } => "Evaluation data is incomplete",
            _ => "Internal error while assessing the application",
        }
    }
}
