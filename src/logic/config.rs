//! Explainer Configuration
//!
//! Every tunable of the explanation pipeline in one serializable struct.
//! The artifact stores it verbatim so a replayed explainer behaves exactly
//! like the one that was fitted.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::fairness::FairnessThresholds;
use crate::logic::model::DecisionThreshold;

// ============================================================================
// ATTRIBUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMode {
    /// Exact tree attribution when the model exposes its trees, sampling otherwise
    Auto,
    /// Always use the sampling estimator
    Sampling,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionConfig {
    pub mode: AttributionMode,

    /// Background rows kept by the sampling estimator
    pub max_background: usize,

    /// Coalition budget; `None` → 2M + 2048
    pub n_samples: Option<usize>,

    pub seed: u64,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            mode: AttributionMode::Auto,
            max_background: constants::DEFAULT_BACKGROUND_SUMMARY,
            n_samples: None,
            seed: constants::DEFAULT_RANDOM_SEED,
        }
    }
}

// ============================================================================
// SURROGATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurrogateConfig {
    pub num_samples: usize,

    /// `None` → 0.75 * sqrt(feature count)
    pub kernel_width: Option<f64>,

    pub ridge_alpha: f64,
    pub seed: u64,
    pub default_top_k: usize,

    /// Top-k overlap below which agreement is flagged as low
    pub min_agreement: f64,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            num_samples: constants::DEFAULT_SURROGATE_SAMPLES,
            kernel_width: None,
            ridge_alpha: constants::DEFAULT_SURROGATE_ALPHA,
            seed: constants::DEFAULT_RANDOM_SEED,
            default_top_k: constants::DEFAULT_TOP_FACTORS,
            min_agreement: constants::DEFAULT_MIN_AGREEMENT,
        }
    }
}

// ============================================================================
// COUNTERFACTUAL
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualConfig {
    /// Features tried (after the dominant driver when enabled)
    pub candidates: Vec<String>,

    /// Multipliers applied in order; first flip wins
    pub shrink_factors: Vec<f64>,

    /// Try the largest risk-increasing feature first
    pub prefer_dominant_feature: bool,
}

impl Default for CounterfactualConfig {
    fn default() -> Self {
        Self {
            candidates: constants::DEFAULT_COUNTERFACTUAL_CANDIDATES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            shrink_factors: constants::DEFAULT_SHRINK_FACTORS.to_vec(),
            prefer_dominant_feature: true,
        }
    }
}

// ============================================================================
// NOTICE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoticeConfig {
    /// Factors listed in notices and recommendations
    pub top_n: usize,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            top_n: constants::DEFAULT_TOP_FACTORS,
        }
    }
}

// ============================================================================
// EXPLAIN CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExplainConfig {
    pub attribution: AttributionConfig,
    pub surrogate: SurrogateConfig,
    pub counterfactual: CounterfactualConfig,
    pub decision: DecisionThreshold,
    pub fairness: FairnessThresholds,
    pub notice: NoticeConfig,
}

impl ExplainConfig {
    /// Defaults overridden by `CREDIT_*` environment variables
    pub fn from_env() -> Self {
        let seed = constants::get_random_seed();
        Self {
            attribution: AttributionConfig {
                max_background: constants::get_background_summary(),
                seed,
                ..Default::default()
            },
            surrogate: SurrogateConfig {
                num_samples: constants::get_surrogate_samples(),
                seed,
                ..Default::default()
            },
            decision: DecisionThreshold::from_env(),
            fairness: FairnessThresholds::from_env(),
            ..Default::default()
        }
    }

    /// Fast preset for tests and interactive use
    pub fn quick() -> Self {
        Self {
            surrogate: SurrogateConfig {
                num_samples: 500,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> CreditResult<()> {
        if self.attribution.max_background == 0 {
            return Err(CreditError::InvalidConfig(
                "attribution.max_background must be positive".to_string(),
            ));
        }
        if self.attribution.n_samples == Some(0) {
            return Err(CreditError::InvalidConfig(
                "attribution.n_samples must be positive".to_string(),
            ));
        }
        if self.surrogate.num_samples < 2 {
            return Err(CreditError::InvalidConfig(
                "surrogate.num_samples must be at least 2".to_string(),
            ));
        }
        if let Some(width) = self.surrogate.kernel_width {
            if !(width > 0.0 && width.is_finite()) {
                return Err(CreditError::InvalidConfig(
                    "surrogate.kernel_width must be positive".to_string(),
                ));
            }
        }
        if !(self.surrogate.ridge_alpha >= 0.0 && self.surrogate.ridge_alpha.is_finite()) {
            return Err(CreditError::InvalidConfig(
                "surrogate.ridge_alpha must be non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.surrogate.min_agreement) {
            return Err(CreditError::InvalidConfig(
                "surrogate.min_agreement must be in [0, 1]".to_string(),
            ));
        }
        if self
            .counterfactual
            .shrink_factors
            .iter()
            .any(|f| !(*f > 0.0 && *f < 1.0))
        {
            return Err(CreditError::InvalidConfig(
                "counterfactual.shrink_factors must be in (0, 1)".to_string(),
            ));
        }
        self.decision.validate()?;
        self.fairness.validate()?;
        Ok(())
    }
}
