//! Decision Threshold - approve / decline policy
//!
//! The classifier's positive class is "default risk". An application is
//! declined when the default probability is strictly above the threshold,
//! which at 0.5 matches the classifier's own argmax on a binary model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::{CreditError, CreditResult};

// ============================================================================
// THRESHOLD CONFIG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThreshold {
    /// Decline when p(positive) > threshold
    pub threshold: f64,

    /// Index of the "default risk" class in the classifier output
    pub positive_class: usize,
}

impl Default for DecisionThreshold {
    fn default() -> Self {
        Self {
            threshold: constants::DEFAULT_DECISION_THRESHOLD,
            positive_class: constants::DEFAULT_POSITIVE_CLASS,
        }
    }
}

impl DecisionThreshold {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Threshold from `CREDIT_DECISION_THRESHOLD`, falling back to the default
    pub fn from_env() -> Self {
        Self::new(constants::get_decision_threshold())
    }

    pub fn validate(&self) -> CreditResult<()> {
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(CreditError::InvalidConfig(format!(
                "decision threshold must be in (0, 1), got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    pub fn outcome(&self, probability: f64) -> Outcome {
        if probability > self.threshold {
            Outcome::Declined
        } else {
            Outcome::Approved
        }
    }

    pub fn is_declined(&self, probability: f64) -> bool {
        self.outcome(probability) == Outcome::Declined
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Approved,
    Declined,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Approved => "APPROVED",
            Outcome::Declined => "DECLINED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RISK GRADE
// ============================================================================

/// Letter grade banded on default probability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskGrade {
    AAA,
    AA,
    A,
    BBB,
    BB,
    B,
    CCC,
    CC,
    D,
}

impl RiskGrade {
    // (upper bound exclusive, grade, score equivalent)
    const BANDS: [(f64, RiskGrade, u16); 8] = [
        (0.05, RiskGrade::AAA, 820),
        (0.10, RiskGrade::AA, 780),
        (0.15, RiskGrade::A, 740),
        (0.25, RiskGrade::BBB, 700),
        (0.35, RiskGrade::BB, 660),
        (0.50, RiskGrade::B, 620),
        (0.65, RiskGrade::CCC, 580),
        (0.80, RiskGrade::CC, 540),
    ];

    pub fn from_probability(probability: f64) -> Self {
        Self::BANDS
            .iter()
            .find(|(upper, _, _)| probability < *upper)
            .map(|(_, grade, _)| *grade)
            .unwrap_or(RiskGrade::D)
    }

    /// Credit-score style number for the grade
    pub fn score_equivalent(&self) -> u16 {
        Self::BANDS
            .iter()
            .find(|(_, grade, _)| grade == self)
            .map(|(_, _, score)| *score)
            .unwrap_or(500)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskGrade::AAA => "AAA",
            RiskGrade::AA => "AA",
            RiskGrade::A => "A",
            RiskGrade::BBB => "BBB",
            RiskGrade::BB => "BB",
            RiskGrade::B => "B",
            RiskGrade::CCC => "CCC",
            RiskGrade::CC => "CC",
            RiskGrade::D => "D",
        }
    }
}

impl fmt::Display for RiskGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RISK LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            RiskLevel::Low
        } else if probability < 0.7 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

// ============================================================================
// DECISION
// ============================================================================

/// Everything derived from one default probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub outcome: Outcome,
    pub probability: f64,
    pub risk_grade: RiskGrade,
    pub risk_level: RiskLevel,
    pub credit_score_equivalent: u16,
}

impl Decision {
    pub fn from_probability(probability: f64, threshold: &DecisionThreshold) -> Self {
        let risk_grade = RiskGrade::from_probability(probability);
        Self {
            outcome: threshold.outcome(probability),
            probability,
            risk_grade,
            risk_level: RiskLevel::from_probability(probability),
            credit_score_equivalent: risk_grade.score_equivalent(),
        }
    }

    pub fn is_declined(&self) -> bool {
        self.outcome == Outcome::Declined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_default() {
        let t = DecisionThreshold::default();
        assert_eq!(t.threshold, 0.5);
        assert_eq!(t.positive_class, 1);
        assert!(t.validate().is_ok());
        assert!(DecisionThreshold::new(1.0).validate().is_err());
    }

    #[test]
    fn test_outcome_strictly_above() {
        let t = DecisionThreshold::default();
        assert_eq!(t.outcome(0.5), Outcome::Approved);
        assert_eq!(t.outcome(0.5000001), Outcome::Declined);
        assert_eq!(t.outcome(0.82), Outcome::Declined);
        assert!(DecisionThreshold::new(0.35).is_declined(0.4));
    }

    #[test]
    fn test_risk_grade_bands() {
        assert_eq!(RiskGrade::from_probability(0.0), RiskGrade::AAA);
        assert_eq!(RiskGrade::from_probability(0.05), RiskGrade::AA);
        assert_eq!(RiskGrade::from_probability(0.30), RiskGrade::BB);
        assert_eq!(RiskGrade::from_probability(0.49), RiskGrade::B);
        assert_eq!(RiskGrade::from_probability(0.82), RiskGrade::D);
        assert_eq!(RiskGrade::D.score_equivalent(), 500);
        assert_eq!(RiskGrade::BBB.score_equivalent(), 700);
    }

    #[test]
    fn test_decision_bundle() {
        let d = Decision::from_probability(0.82, &DecisionThreshold::default());
        assert!(d.is_declined());
        assert_eq!(d.risk_level, RiskLevel::High);
        assert_eq!(d.credit_score_equivalent, 500);
        assert_eq!(d.outcome.to_string(), "DECLINED");
    }
}
