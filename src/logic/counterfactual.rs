//! Counterfactual Search - single-factor "what would flip this decision"
//!
//! Greedy and deterministic: candidates in a fixed order (dominant risk
//! driver first, then configured features), shrink factors in the configured
//! descending order, first flip wins. With a scaler attached the shrink is
//! applied in original units; without one it is applied to the encoded value
//! and reported as [`PerturbationSpace::Encoded`].

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::logic::error::CreditResult;
use crate::logic::explain::{AttributionResult, CreditExplainer};
use crate::logic::features::FeatureVector;
use crate::logic::model::Outcome;

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationSpace {
    /// Shrink applied to the original-unit value, then re-encoded
    Original,
    /// Shrink applied directly to the encoded value (approximation)
    Encoded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualScenario {
    pub feature: String,

    /// Relative reduction, e.g. 0.2 for "reduce by 20%"
    pub perturbation_fraction: f64,

    /// Encoded value before and after the change
    pub original_value: f64,
    pub perturbed_value: f64,

    pub space: PerturbationSpace,
    pub resulting_probability: f64,
    pub resulting_decision: Outcome,
}

impl CounterfactualScenario {
    /// Reduction as a whole percentage
    pub fn percent(&self) -> u32 {
        (self.perturbation_fraction * 100.0).round() as u32
    }

    /// Re-apply the reported change to the original instance
    pub fn apply(&self, instance: &FeatureVector) -> FeatureVector {
        let mut changed = instance.clone();
        changed.set(&self.feature, self.perturbed_value);
        changed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CounterfactualOutcome {
    NoChangeNeeded,
    Found(CounterfactualScenario),
    NoSimpleChangeFound { tried: Vec<String> },
}

impl CounterfactualOutcome {
    pub fn scenario(&self) -> Option<&CounterfactualScenario> {
        match self {
            CounterfactualOutcome::Found(s) => Some(s),
            _ => None,
        }
    }
}

// ============================================================================
// SEARCH
// ============================================================================

pub struct CounterfactualSearch<'a> {
    explainer: &'a CreditExplainer,
}

impl<'a> CounterfactualSearch<'a> {
    pub fn new(explainer: &'a CreditExplainer) -> Self {
        Self { explainer }
    }

    /// Attribute the instance, then search.
    pub fn search(&self, instance: &FeatureVector) -> CreditResult<CounterfactualOutcome> {
        let attribution = self.explainer.attribute(instance)?;
        self.search_with(instance, &attribution)
    }

    /// Search using an attribution already computed for this instance.
    pub fn search_with(
        &self,
        instance: &FeatureVector,
        attribution: &AttributionResult,
    ) -> CreditResult<CounterfactualOutcome> {
        let layout = self.explainer.layout();
        let threshold = &self.explainer.config().decision;
        let row = instance.to_model_input(layout)?;

        let probability = self.explainer.predict_row(&row)?;
        if !threshold.is_declined(probability) {
            return Ok(CounterfactualOutcome::NoChangeNeeded);
        }

        let space = if self.explainer.scaler().is_some() {
            PerturbationSpace::Original
        } else {
            log::warn!("No scaler attached; counterfactual shrink applied to encoded values");
            PerturbationSpace::Encoded
        };

        let candidates = self.candidates(attribution);
        for feature in &candidates {
            let Some(index) = layout.index_of(feature) else {
                continue;
            };
            for &factor in &self.explainer.config().counterfactual.shrink_factors {
                let perturbed = self.shrink(index, row[index], factor);
                let mut trial: Array1<f64> = row.clone();
                trial[index] = perturbed;

                let p = self.explainer.predict_row(&trial)?;
                if !threshold.is_declined(p) {
                    log::debug!(
                        "Counterfactual found: {} x{:.2} -> p={:.4}",
                        feature,
                        factor,
                        p
                    );
                    return Ok(CounterfactualOutcome::Found(CounterfactualScenario {
                        feature: feature.clone(),
                        perturbation_fraction: 1.0 - factor,
                        original_value: row[index],
                        perturbed_value: perturbed,
                        space,
                        resulting_probability: p,
                        resulting_decision: threshold.outcome(p),
                    }));
                }
            }
        }

        Ok(CounterfactualOutcome::NoSimpleChangeFound { tried: candidates })
    }

    /// Dominant risk driver (when enabled) followed by configured candidates
    fn candidates(&self, attribution: &AttributionResult) -> Vec<String> {
        let config = &self.explainer.config().counterfactual;
        let layout = self.explainer.layout();
        let mut out: Vec<String> = Vec::new();

        if config.prefer_dominant_feature {
            if let Some(dominant) = attribution.dominant_risk_feature() {
                out.push(dominant.feature.clone());
            }
        }
        for name in &config.candidates {
            if !out.contains(name) && layout.index_of(name).is_some() {
                out.push(name.clone());
            }
        }
        out
    }

    fn shrink(&self, index: usize, encoded: f64, factor: f64) -> f64 {
        match self.explainer.scaler() {
            Some(scaler) => {
                let original = scaler.inverse_value(index, encoded);
                scaler.transform_value(index, original * factor)
            }
            None => encoded * factor,
        }
    }
}
