//! Notice Generator - consumer-facing decision texts
//!
//! Pure templating over an attribution: no I/O, no randomness, so identical
//! inputs always render byte-identical text.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::counterfactual::CounterfactualOutcome;
use crate::logic::explain::{AttributionMethod, AttributionResult, FeatureContribution};
use crate::logic::model::{Decision, Outcome};

const RIGHTS_BLOCK: &str = "\
------------------------------------------------------
Your Rights:
• You have the right to request a free copy of your credit report within 60 days.
• You have the right to dispute incomplete or inaccurate information.
• You have the right to request a specific reason for this decision.
------------------------------------------------------
";

const FCRA_BLOCK: &str = "\
\nYour rights under the Fair Credit Reporting Act (FCRA):
• You may request a free credit report within 60 days
• You may dispute any inaccurate information
• You may request the specific reasons for this decision
";

// ============================================================================
// TOP FACTORS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorDirection {
    RiskIncreasing,
    RiskDecreasing,
}

/// One attribution entry phrased for a consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopFactor {
    pub feature: String,
    pub impact: f64,
    pub direction: FactorDirection,
    pub human_readable: String,
}

impl From<&FeatureContribution> for TopFactor {
    fn from(c: &FeatureContribution) -> Self {
        Self {
            feature: c.feature.clone(),
            impact: c.contribution.abs(),
            direction: if c.is_risk_increasing() {
                FactorDirection::RiskIncreasing
            } else {
                FactorDirection::RiskDecreasing
            },
            human_readable: describe_feature(&c.feature),
        }
    }
}

/// Plain-language description chosen by feature-name keyword
pub fn describe_feature(feature: &str) -> String {
    let name = feature.to_lowercase();
    let text = if name.contains("amount") || name.contains("credit") {
        "Loan amount impacts your risk profile"
    } else if name.contains("duration") {
        "Loan term length affects repayment risk"
    } else if name.contains("age") {
        "Age-related credit experience factor"
    } else if name.contains("checking") {
        "Checking account status indicates financial stability"
    } else if name.contains("saving") {
        "Savings buffer provides repayment safety net"
    } else if name.contains("employment") {
        "Employment stability affects repayment ability"
    } else if name.contains("housing") {
        "Housing situation indicates financial stability"
    } else if name.contains("installment") {
        "Monthly payment burden relative to income"
    } else if name.contains("history") {
        "Past credit behavior predicts future performance"
    } else {
        return format!("Factor: {}", title_case(feature));
    };
    text.to_string()
}

/// `credit_amount` → `Credit Amount`
pub fn title_case(feature: &str) -> String {
    feature
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// GENERATOR
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoticeGenerator {
    top_n: usize,
}

impl Default for NoticeGenerator {
    fn default() -> Self {
        Self::new(constants::DEFAULT_TOP_FACTORS)
    }
}

impl NoticeGenerator {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Adverse action notice: decision, probability, top factors, consumer rights.
    pub fn adverse_action_notice(
        &self,
        attribution: &AttributionResult,
        decision: Outcome,
        probability: f64,
    ) -> String {
        let mut notice = String::from("\nADVERSE ACTION NOTICE\n====================\n\n");
        notice.push_str(&format!("Decision: {}\n", decision));
        notice.push_str(&format!(
            "Default Risk Probability: {:.2}%\n\n",
            probability * 100.0
        ));
        notice.push_str("Primary Factors Influencing Decision:\n");

        for (i, c) in attribution.top(self.top_n).iter().enumerate() {
            notice.push_str(&format!(
                "\n{}. {} ({}) | Impact Score: {:.3}",
                i + 1,
                c.feature,
                c.polarity(),
                c.contribution.abs()
            ));
        }

        notice.push('\n');
        notice.push_str(RIGHTS_BLOCK);
        notice
    }

    /// Suggestions for the top risk-increasing features.
    pub fn recommendations(&self, attribution: &AttributionResult) -> String {
        let mut text = String::from("RECOMMENDATIONS TO IMPROVE APPROVAL ODDS\n");
        text.push_str("======================================\n\n");

        let drivers: Vec<&FeatureContribution> =
            attribution.risk_increasing().take(self.top_n).collect();
        if drivers.is_empty() {
            text.push_str("Your profile is strong. Maintain current financial habits.");
            return text;
        }

        for c in drivers {
            text.push_str(&recommendation_line(&c.feature));
            text.push('\n');
        }
        text
    }

    /// Decision summary with plain-language factors (rights block when declined).
    pub fn decision_explanation(&self, attribution: &AttributionResult, decision: &Decision) -> String {
        let factors: Vec<TopFactor> = attribution
            .top(self.top_n)
            .iter()
            .map(TopFactor::from)
            .collect();

        let mut text = format!("CREDIT DECISION EXPLANATION\n{}\n\n", "=".repeat(40));
        text.push_str(&format!("Decision: {}\n", decision.outcome));
        text.push_str(&format!("Risk Grade: {}\n", decision.risk_grade));
        text.push_str(&format!(
            "Default Probability: {:.1}%\n\n",
            decision.probability * 100.0
        ));

        text.push_str("TOP INFLUENCING FACTORS:\n");
        for (i, f) in factors.iter().enumerate() {
            let icon = match f.direction {
                FactorDirection::RiskIncreasing => "⚠️",
                FactorDirection::RiskDecreasing => "✅",
            };
            text.push_str(&format!(
                "  {}. {} {} (Impact: {:.3})\n",
                i + 1,
                icon,
                f.human_readable,
                f.impact
            ));
        }

        let basis = match attribution.method {
            AttributionMethod::ExactTree => {
                "which provides mathematically guaranteed fair attribution of each factor's contribution"
            }
            AttributionMethod::Sampling => {
                "which estimates each factor's contribution from sampled feature coalitions"
            }
        };
        text.push_str(&format!(
            "\nThis assessment uses {} key factors analyzed by our \
             SHAP (SHapley Additive exPlanations) framework, {}.\n",
            factors.len(),
            basis
        ));

        if decision.is_declined() {
            text.push_str(FCRA_BLOCK);
        }
        text
    }

    /// One-line summary of a counterfactual search
    pub fn counterfactual_insight(&self, outcome: &CounterfactualOutcome) -> String {
        match outcome {
            CounterfactualOutcome::NoChangeNeeded => "Application is already Approved.".to_string(),
            CounterfactualOutcome::Found(s) => format!(
                "Possible Path to Approval: Reducing {} by ~{}%",
                title_case(&s.feature),
                s.percent()
            ),
            CounterfactualOutcome::NoSimpleChangeFound { .. } => {
                "No simple single-factor change found to flip decision. \
                 Requires multi-factor improvement."
                    .to_string()
            }
        }
    }
}

fn recommendation_line(feature: &str) -> String {
    let name = feature.to_lowercase();
    if name.contains("amount") || name.contains("credit") {
        format!("• Consider requesting a lower credit amount (Driver: {})", feature)
    } else if name.contains("duration") {
        format!("• Adjust loan duration to lower monthly burden (Driver: {})", feature)
    } else if name.contains("income") || name.contains("debt") {
        format!("• Reduce existing debt obligations (Driver: {})", feature)
    } else if name.contains("age") {
        format!("• Build longer credit history over time (Driver: {})", feature)
    } else {
        format!("• Improve metric: {}", feature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::counterfactual::{CounterfactualScenario, PerturbationSpace};
    use crate::logic::model::DecisionThreshold;

    fn attribution(pairs: &[(&str, f64)]) -> AttributionResult {
        let names: Vec<String> = pairs.iter().map(|(n, _)| n.to_string()).collect();
        let phi: Vec<f64> = pairs.iter().map(|(_, v)| *v).collect();
        let output = 0.3 + phi.iter().sum::<f64>();
        AttributionResult::from_layout_order(
            &names,
            &vec![0.0; names.len()],
            &phi,
            &vec![0.0; names.len()],
            0.3,
            output,
            AttributionMethod::ExactTree,
            1,
        )
    }

    fn scenario_attribution() -> AttributionResult {
        attribution(&[
            ("checking_status", 0.0),
            ("duration", 0.072),
            ("credit_amount", 0.448),
            ("installment_commitment", 0.0),
            ("age", 0.0),
        ])
    }

    #[test]
    fn test_adverse_notice_content() {
        let notice = NoticeGenerator::default().adverse_action_notice(
            &scenario_attribution(),
            Outcome::Declined,
            0.82,
        );
        assert!(notice.contains("ADVERSE ACTION NOTICE"));
        assert!(notice.contains("Decision: DECLINED"));
        assert!(notice.contains("Default Risk Probability: 82.00%"));
        assert!(notice.contains(
            "1. credit_amount (NEGATIVE (Risk Increasing)) | Impact Score: 0.448"
        ));
        assert!(notice.contains("2. duration (NEGATIVE (Risk Increasing)) | Impact Score: 0.072"));
        assert!(notice.contains("free copy of your credit report within 60 days"));
        assert!(notice.contains("dispute incomplete or inaccurate information"));
        assert!(notice.contains("request a specific reason"));
    }

    #[test]
    fn test_adverse_notice_is_deterministic() {
        let generator = NoticeGenerator::default();
        let a = generator.adverse_action_notice(&scenario_attribution(), Outcome::Declined, 0.82);
        let b = generator.adverse_action_notice(&scenario_attribution(), Outcome::Declined, 0.82);
        assert_eq!(a, b);
    }

    #[test]
    fn test_notice_lists_at_most_top_n() {
        let many: Vec<(String, f64)> = (0..8).map(|i| (format!("f{}", i), 0.01 * (i + 1) as f64)).collect();
        let pairs: Vec<(&str, f64)> = many.iter().map(|(n, v)| (n.as_str(), *v)).collect();
        let notice = NoticeGenerator::default().adverse_action_notice(
            &attribution(&pairs),
            Outcome::Declined,
            0.66,
        );
        assert!(notice.contains("\n5. "));
        assert!(!notice.contains("\n6. "));
    }

    #[test]
    fn test_recommendations_keywords() {
        let text = NoticeGenerator::default().recommendations(&attribution(&[
            ("credit_amount", 0.3),
            ("duration", 0.2),
            ("debt_ratio", 0.1),
            ("age", 0.05),
            ("housing_own", 0.04),
            ("savings_status", -0.2),
        ]));
        assert!(text.starts_with("RECOMMENDATIONS TO IMPROVE APPROVAL ODDS"));
        assert!(text.contains("• Consider requesting a lower credit amount (Driver: credit_amount)"));
        assert!(text.contains("• Adjust loan duration to lower monthly burden (Driver: duration)"));
        assert!(text.contains("• Reduce existing debt obligations (Driver: debt_ratio)"));
        assert!(text.contains("• Build longer credit history over time (Driver: age)"));
        assert!(text.contains("• Improve metric: housing_own"));
        assert!(!text.contains("savings_status"));
    }

    #[test]
    fn test_recommendations_strong_profile() {
        let text = NoticeGenerator::default()
            .recommendations(&attribution(&[("credit_amount", -0.2), ("duration", -0.1)]));
        assert!(text.ends_with("Your profile is strong. Maintain current financial habits."));
    }

    #[test]
    fn test_decision_explanation() {
        let decision = Decision::from_probability(0.82, &DecisionThreshold::default());
        let text = NoticeGenerator::default().decision_explanation(&scenario_attribution(), &decision);
        assert!(text.contains("Decision: DECLINED"));
        assert!(text.contains("Risk Grade: D"));
        assert!(text.contains("Default Probability: 82.0%"));
        assert!(text.contains("1. ⚠️ Loan amount impacts your risk profile (Impact: 0.448)"));
        assert!(text.contains("Fair Credit Reporting Act"));
        assert!(text.contains("mathematically guaranteed"));

        let approved = Decision::from_probability(0.2, &DecisionThreshold::default());
        let text = NoticeGenerator::default().decision_explanation(&scenario_attribution(), &approved);
        assert!(!text.contains("Fair Credit Reporting Act"));
    }

    #[test]
    fn test_sampled_attribution_is_described_as_estimate() {
        let mut sampled = scenario_attribution();
        sampled.method = AttributionMethod::Sampling;
        let decision = Decision::from_probability(0.82, &DecisionThreshold::default());
        let text = NoticeGenerator::default().decision_explanation(&sampled, &decision);
        assert!(text.contains("estimates each factor's contribution"));
        assert!(!text.contains("guaranteed"));
    }

    #[test]
    fn test_describe_feature_fallback() {
        assert_eq!(describe_feature("purpose_new_car"), "Factor: Purpose New Car");
        assert_eq!(
            describe_feature("checking_status"),
            "Checking account status indicates financial stability"
        );
    }

    #[test]
    fn test_counterfactual_insight() {
        let generator = NoticeGenerator::default();
        assert_eq!(
            generator.counterfactual_insight(&CounterfactualOutcome::NoChangeNeeded),
            "Application is already Approved."
        );
        let found = CounterfactualOutcome::Found(CounterfactualScenario {
            feature: "credit_amount".to_string(),
            perturbation_fraction: 1.0 - 0.9,
            original_value: 10000.0,
            perturbed_value: 9000.0,
            space: PerturbationSpace::Encoded,
            resulting_probability: 0.48,
            resulting_decision: Outcome::Approved,
        });
        assert_eq!(
            generator.counterfactual_insight(&found),
            "Possible Path to Approval: Reducing Credit Amount by ~10%"
        );
        let none = CounterfactualOutcome::NoSimpleChangeFound { tried: vec![] };
        assert!(generator.counterfactual_insight(&none).starts_with("No simple single-factor change"));
    }
}
