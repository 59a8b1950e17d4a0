//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every policy constant used by the explanation and fairness engines is
//! defined here and can be overridden from the environment.

/// App name
pub const APP_NAME: &str = "credit-risk-core";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================
// Decision
// ============================================

/// Probability of default above which an application is declined
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Class index of "default / declined" in the classifier output
pub const DEFAULT_POSITIVE_CLASS: usize = 1;

// ============================================
// Attribution & surrogate
// ============================================

/// Rows kept from the background set in sampling mode
pub const DEFAULT_BACKGROUND_SUMMARY: usize = 50;

/// Seed shared by every sampling-based component
pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Neighbourhood size of the local surrogate
pub const DEFAULT_SURROGATE_SAMPLES: usize = 5000;

/// Ridge penalty of the local surrogate
pub const DEFAULT_SURROGATE_ALPHA: f64 = 1.0;

/// Minimum top-k overlap before an explanation pair counts as "low agreement"
pub const DEFAULT_MIN_AGREEMENT: f64 = 0.4;

/// Factors listed in notices and recommendations
pub const DEFAULT_TOP_FACTORS: usize = 5;

/// Factors returned in a full credit assessment
pub const ASSESSMENT_TOP_FACTORS: usize = 10;

// ============================================
// Counterfactual
// ============================================

/// Shrink factors tried in order (10%, 20%, 30% reduction)
pub const DEFAULT_SHRINK_FACTORS: [f64; 3] = [0.9, 0.8, 0.7];

/// Features tried after the dominant risk driver
pub const DEFAULT_COUNTERFACTUAL_CANDIDATES: [&str; 1] = ["credit_amount"];

// ============================================
// Fairness policy
// ============================================

/// |metric| below this → PASS
pub const DEFAULT_FAIRNESS_PASS: f64 = 0.10;

/// |metric| below this → REVIEW, otherwise FAIL
pub const DEFAULT_FAIRNESS_REVIEW: f64 = 0.20;

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Get random seed from environment or use default
pub fn get_random_seed() -> u64 {
    env_parse("CREDIT_RANDOM_SEED").unwrap_or(DEFAULT_RANDOM_SEED)
}

/// Get decision threshold from environment or use default
pub fn get_decision_threshold() -> f64 {
    env_parse("CREDIT_DECISION_THRESHOLD").unwrap_or(DEFAULT_DECISION_THRESHOLD)
}

/// Get fairness PASS threshold from environment or use default
pub fn get_fairness_pass_threshold() -> f64 {
    env_parse("CREDIT_FAIRNESS_PASS").unwrap_or(DEFAULT_FAIRNESS_PASS)
}

/// Get fairness REVIEW threshold from environment or use default
pub fn get_fairness_review_threshold() -> f64 {
    env_parse("CREDIT_FAIRNESS_REVIEW").unwrap_or(DEFAULT_FAIRNESS_REVIEW)
}

/// Get background summary size from environment or use default
pub fn get_background_summary() -> usize {
    env_parse("CREDIT_BACKGROUND_SUMMARY").unwrap_or(DEFAULT_BACKGROUND_SUMMARY)
}

/// Get surrogate neighbourhood size from environment or use default
pub fn get_surrogate_samples() -> usize {
    env_parse("CREDIT_SURROGATE_SAMPLES").unwrap_or(DEFAULT_SURROGATE_SAMPLES)
}

/// Get artifact path from environment, if set
pub fn get_artifact_path() -> Option<std::path::PathBuf> {
    std::env::var("CREDIT_ARTIFACT_PATH").ok().map(std::path::PathBuf::from)
}
