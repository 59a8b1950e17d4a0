//! Credit Assessment - the full per-request bundle
//!
//! Decision, ranked factors, explanation text and, for declined
//! applications only, the adverse action notice, recommendations and the
//! counterfactual path. Nothing is counted or cached between requests.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::ASSESSMENT_TOP_FACTORS;
use crate::logic::counterfactual::{CounterfactualOutcome, CounterfactualSearch};
use crate::logic::error::CreditResult;
use crate::logic::explain::{AgreementReport, AttributionMethod, AttributionResult, CreditExplainer, LocalExplanation};
use crate::logic::features::FeatureVector;
use crate::logic::model::Decision;
use crate::logic::notice::{NoticeGenerator, TopFactor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explainability {
    pub method: AttributionMethod,
    pub base_value: f64,
    pub model_output: f64,
    pub explanation_text: String,

    /// Local surrogate cross-check (absent when the surrogate could not be fitted)
    pub surrogate: Option<LocalExplanation>,
    pub agreement: Option<AgreementReport>,
    pub low_agreement: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAssessment {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub decision: Decision,
    pub top_factors: Vec<TopFactor>,
    pub explainability: Explainability,
    pub attribution: AttributionResult,

    // Declined applications only
    pub recommendations: Option<String>,
    pub adverse_notice: Option<String>,
    pub counterfactual: Option<CounterfactualOutcome>,
    pub counterfactual_insight: Option<String>,

    pub processing_time_ms: u64,
}

impl CreditAssessment {
    pub fn is_declined(&self) -> bool {
        self.decision.is_declined()
    }
}

#[derive(Default)]
struct DeclinedExtras {
    recommendations: Option<String>,
    adverse_notice: Option<String>,
    counterfactual: Option<CounterfactualOutcome>,
    counterfactual_insight: Option<String>,
}

/// Assess one application with a fitted explainer.
pub fn assess(explainer: &CreditExplainer, instance: &FeatureVector) -> CreditResult<CreditAssessment> {
    let started = Instant::now();
    let config = explainer.config();
    let notices = NoticeGenerator::new(config.notice.top_n);

    let attribution = explainer.attribute(instance)?;
    let decision = Decision::from_probability(attribution.model_output, &config.decision);

    let surrogate = match explainer.explain_local(instance, config.surrogate.default_top_k) {
        Ok(local) => Some(local),
        Err(e) => {
            log::warn!("Surrogate cross-check skipped: {}", e);
            None
        }
    };
    let agreement = surrogate
        .as_ref()
        .map(|local| explainer.agreement(&attribution, local));
    let low_agreement = agreement
        .as_ref()
        .is_some_and(|a| a.is_low(config.surrogate.min_agreement));
    if low_agreement {
        log::warn!("Low agreement between attribution and surrogate explanations");
    }

    let declined = if decision.is_declined() {
        let outcome = CounterfactualSearch::new(explainer).search_with(instance, &attribution)?;
        DeclinedExtras {
            recommendations: Some(notices.recommendations(&attribution)),
            adverse_notice: Some(notices.adverse_action_notice(
                &attribution,
                decision.outcome,
                decision.probability,
            )),
            counterfactual_insight: Some(notices.counterfactual_insight(&outcome)),
            counterfactual: Some(outcome),
        }
    } else {
        DeclinedExtras::default()
    };

    let explainability = Explainability {
        method: attribution.method,
        base_value: attribution.baseline,
        model_output: attribution.model_output,
        explanation_text: notices.decision_explanation(&attribution, &decision),
        surrogate,
        agreement,
        low_agreement,
    };

    let assessment = CreditAssessment {
        request_id: Uuid::new_v4(),
        timestamp: Utc::now(),
        top_factors: attribution
            .top(ASSESSMENT_TOP_FACTORS)
            .iter()
            .map(TopFactor::from)
            .collect(),
        decision,
        explainability,
        attribution,
        recommendations: declined.recommendations,
        adverse_notice: declined.adverse_notice,
        counterfactual: declined.counterfactual,
        counterfactual_insight: declined.counterfactual_insight,
        processing_time_ms: started.elapsed().as_millis() as u64,
    };

    log::info!(
        "Assessment {}: {} (p={:.4}, grade {})",
        assessment.request_id,
        assessment.decision.outcome,
        assessment.decision.probability,
        assessment.decision.risk_grade
    );
    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::error::CreditError;
    use crate::logic::model::{Outcome, RiskGrade};
    use crate::logic::notice::FactorDirection;
    use crate::logic::test_support;

    #[test]
    fn test_declined_assessment_bundle() {
        let explainer = test_support::scenario_explainer();
        let assessment = explainer.assess(&test_support::scenario_instance()).unwrap();

        assert!(assessment.is_declined());
        assert_eq!(assessment.decision.outcome, Outcome::Declined);
        assert_eq!(assessment.decision.risk_grade, RiskGrade::from_probability(0.82));
        assert_eq!(assessment.top_factors.len(), 5);
        assert_eq!(assessment.top_factors[0].feature, "credit_amount");
        assert_eq!(assessment.top_factors[0].direction, FactorDirection::RiskIncreasing);

        let notice = assessment.adverse_notice.as_deref().unwrap();
        assert!(notice.contains("Default Risk Probability: 82.00%"));
        assert!(assessment.recommendations.is_some());
        assert!(matches!(
            assessment.counterfactual,
            Some(CounterfactualOutcome::NoSimpleChangeFound { .. })
        ));
        assert!(assessment
            .counterfactual_insight
            .as_deref()
            .unwrap()
            .starts_with("No simple single-factor change"));

        assert!((assessment.explainability.base_value - 0.30).abs() < 1e-12);
        assert!(assessment.explainability.explanation_text.contains("Fair Credit Reporting Act"));
        assert!(assessment.explainability.agreement.is_some());
    }

    #[test]
    fn test_approved_assessment_has_no_notice() {
        let explainer = test_support::scenario_explainer();
        let mut instance = test_support::scenario_instance();
        instance.set("credit_amount", 4000.0);
        let assessment = explainer.assess(&instance).unwrap();

        assert_eq!(assessment.decision.outcome, Outcome::Approved);
        assert!(assessment.adverse_notice.is_none());
        assert!(assessment.recommendations.is_none());
        assert!(assessment.counterfactual.is_none());
        assert!(!assessment.explainability.explanation_text.contains("Fair Credit Reporting Act"));
    }

    #[test]
    fn test_assessment_serializes() {
        let explainer = test_support::scenario_explainer();
        let assessment = explainer.assess(&test_support::scenario_instance()).unwrap();
        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["decision"]["outcome"], "DECLINED");
        assert_eq!(json["top_factors"][0]["direction"], "RISK_INCREASING");
        assert_eq!(json["explainability"]["method"], "exact_tree");
    }

    #[test]
    fn test_assessment_requires_fit() {
        let explainer = test_support::unfitted_explainer();
        assert!(matches!(
            explainer.assess(&test_support::scenario_instance()),
            Err(CreditError::ExplainerUninitialized)
        ));
    }
}
