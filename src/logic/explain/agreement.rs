//! Agreement between the attribution engine and the local surrogate.
//!
//! A statistical sanity check, never an error: the caller decides whether a
//! low score lowers the confidence it reports.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::types::{AttributionResult, LocalExplanation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementReport {
    pub top_k: usize,

    /// Jaccard overlap of the two top-k feature sets
    pub overlap: f64,

    /// Fraction of shared features whose signs agree (1.0 when none are shared)
    pub sign_agreement: f64,

    pub shared_features: Vec<String>,
}

impl AgreementReport {
    pub fn is_low(&self, min_agreement: f64) -> bool {
        self.overlap < min_agreement
    }
}

pub fn agreement(
    attribution: &AttributionResult,
    surrogate: &LocalExplanation,
    k: usize,
) -> AgreementReport {
    let primary: BTreeSet<&str> = attribution
        .top(k)
        .iter()
        .map(|c| c.feature.as_str())
        .collect();
    let secondary: BTreeSet<&str> = surrogate
        .terms
        .iter()
        .take(k)
        .map(|t| t.feature.as_str())
        .collect();

    let shared: Vec<&str> = primary.intersection(&secondary).copied().collect();
    let union = primary.union(&secondary).count();
    let overlap = if union == 0 {
        1.0
    } else {
        shared.len() as f64 / union as f64
    };

    let same_sign = shared
        .iter()
        .filter(|name| {
            let a = attribution.get(name).map(|c| c.contribution).unwrap_or(0.0);
            let b = surrogate
                .terms
                .iter()
                .find(|t| t.feature == **name)
                .map(|t| t.weight)
                .unwrap_or(0.0);
            (a > 0.0) == (b > 0.0)
        })
        .count();
    let sign_agreement = if shared.is_empty() {
        1.0
    } else {
        same_sign as f64 / shared.len() as f64
    };

    AgreementReport {
        top_k: k,
        overlap,
        sign_agreement,
        shared_features: shared.iter().map(|s| s.to_string()).collect(),
    }
}
