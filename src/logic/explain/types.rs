//! Explanation result types
//!
//! Sign convention: a positive contribution pushes toward the default /
//! decline class, a negative one toward approval. Notices, recommendations
//! and the counterfactual search all rely on this polarity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMethod {
    /// Closed-form tree attribution (additive to machine precision)
    ExactTree,
    /// Weighted coalition sampling over a background summary
    Sampling,
}

impl AttributionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionMethod::ExactTree => "exact_tree",
            AttributionMethod::Sampling => "sampling",
        }
    }
}

// ============================================================================
// ATTRIBUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,

    /// Instance value (encoded space)
    pub value: f64,

    /// Signed contribution to the positive-class probability
    pub contribution: f64,

    /// Mean reference value of this feature over the background set
    pub baseline_value: f64,
}

impl FeatureContribution {
    pub fn is_risk_increasing(&self) -> bool {
        self.contribution > 0.0
    }

    /// Fixed polarity vocabulary used by notices
    pub fn polarity(&self) -> &'static str {
        if self.is_risk_increasing() {
            "NEGATIVE (Risk Increasing)"
        } else {
            "POSITIVE (Supportive)"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionResult {
    /// Sorted by descending |contribution|; ties keep layout order
    pub contributions: Vec<FeatureContribution>,

    /// Expected positive-class probability over the background set
    pub baseline: f64,

    /// Positive-class probability for this instance
    pub model_output: f64,

    pub method: AttributionMethod,
    pub positive_class: usize,
}

impl AttributionResult {
    /// Assemble from per-feature arrays in layout order.
    #[allow(clippy::too_many_arguments)]
    pub fn from_layout_order(
        names: &[String],
        values: &[f64],
        phi: &[f64],
        background_means: &[f64],
        baseline: f64,
        model_output: f64,
        method: AttributionMethod,
        positive_class: usize,
    ) -> Self {
        let mut contributions: Vec<FeatureContribution> = names
            .iter()
            .zip(values)
            .zip(phi)
            .zip(background_means)
            .map(|(((name, &value), &contribution), &baseline_value)| FeatureContribution {
                feature: name.clone(),
                value,
                contribution,
                baseline_value,
            })
            .collect();

        // Stable sort: equal magnitudes stay in layout order
        contributions.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            contributions,
            baseline,
            model_output,
            method,
            positive_class,
        }
    }

    pub fn sum(&self) -> f64 {
        self.contributions.iter().map(|c| c.contribution).sum()
    }

    /// |baseline + Σ contributions − model_output|
    pub fn additivity_gap(&self) -> f64 {
        (self.baseline + self.sum() - self.model_output).abs()
    }

    pub fn top(&self, n: usize) -> &[FeatureContribution] {
        &self.contributions[..n.min(self.contributions.len())]
    }

    /// Risk-increasing entries, largest first
    pub fn risk_increasing(&self) -> impl Iterator<Item = &FeatureContribution> {
        self.contributions.iter().filter(|c| c.is_risk_increasing())
    }

    /// Largest risk-increasing contribution
    pub fn dominant_risk_feature(&self) -> Option<&FeatureContribution> {
        self.risk_increasing().next()
    }

    pub fn get(&self, feature: &str) -> Option<&FeatureContribution> {
        self.contributions.iter().find(|c| c.feature == feature)
    }

    /// (Σ positive, Σ |negative|)
    pub fn split_mass(&self) -> (f64, f64) {
        self.contributions
            .iter()
            .fold((0.0, 0.0), |(pos, neg), c| {
                if c.contribution > 0.0 {
                    (pos + c.contribution, neg)
                } else {
                    (pos, neg - c.contribution)
                }
            })
    }
}

// ============================================================================
// LOCAL SURROGATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurrogateTerm {
    pub feature: String,

    /// Human-readable bin condition, e.g. `"credit_amount > 3972.25"`
    pub condition: String,

    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalExplanation {
    /// Sorted by descending |weight|
    pub terms: Vec<SurrogateTerm>,
    pub intercept: f64,

    /// Surrogate prediction at the instance
    pub local_prediction: f64,

    /// Classifier positive-class probability at the instance
    pub model_prediction: f64,

    /// Weighted R² of the surrogate on its neighbourhood
    pub score: f64,

    pub positive_class: usize,
}

impl LocalExplanation {
    /// `(condition, weight)` pairs
    pub fn as_pairs(&self) -> Vec<(String, f64)> {
        self.terms
            .iter()
            .map(|t| (t.condition.clone(), t.weight))
            .collect()
    }
}
