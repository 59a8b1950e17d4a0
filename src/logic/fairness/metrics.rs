//! Group metrics and policy thresholds

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::{CreditError, CreditResult};

// ============================================================================
// VERDICT POLICY
// ============================================================================

/// Ordered from best to worst so the worst verdict is the `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Review,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Review => "REVIEW",
            Verdict::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// |metric| < pass → PASS, |metric| < review → REVIEW, otherwise FAIL
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FairnessThresholds {
    pub pass: f64,
    pub review: f64,
}

impl Default for FairnessThresholds {
    fn default() -> Self {
        Self {
            pass: constants::DEFAULT_FAIRNESS_PASS,
            review: constants::DEFAULT_FAIRNESS_REVIEW,
        }
    }
}

impl FairnessThresholds {
    pub fn new(pass: f64, review: f64) -> Self {
        Self { pass, review }
    }

    pub fn from_env() -> Self {
        Self::new(
            constants::get_fairness_pass_threshold(),
            constants::get_fairness_review_threshold(),
        )
    }

    pub fn validate(&self) -> CreditResult<()> {
        if !(self.pass > 0.0 && self.pass <= self.review && self.review <= 1.0) {
            return Err(CreditError::InvalidConfig(format!(
                "fairness thresholds must satisfy 0 < pass <= review <= 1 (got {} / {})",
                self.pass, self.review
            )));
        }
        Ok(())
    }

    pub fn verdict(&self, metric: f64) -> Verdict {
        let value = metric.abs();
        if value < self.pass {
            Verdict::Pass
        } else if value < self.review {
            Verdict::Review
        } else {
            Verdict::Fail
        }
    }
}

// ============================================================================
// CONFUSION COUNTS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionCounts {
    pub fn record(&mut self, label: bool, predicted: bool) {
        match (label, predicted) {
            (true, true) => self.true_positive += 1,
            (false, true) => self.false_positive += 1,
            (false, false) => self.true_negative += 1,
            (true, false) => self.false_negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn actual_positive(&self) -> usize {
        self.true_positive + self.false_negative
    }

    pub fn actual_negative(&self) -> usize {
        self.false_positive + self.true_negative
    }

    pub fn predicted_positive(&self) -> usize {
        self.true_positive + self.false_positive
    }
}

/// Denominator floored at 1: an empty denominator yields rate 0
fn floored_rate(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator.max(1) as f64
}

// ============================================================================
// GROUP METRICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    FalsePositiveRate,
    TruePositiveRate,
}

impl RateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateKind::FalsePositiveRate => "false_positive_rate",
            RateKind::TruePositiveRate => "true_positive_rate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub count: usize,
    pub accuracy: f64,
    /// Fraction predicted positive (declined)
    pub selection_rate: f64,
    pub false_positive_rate: f64,
    pub true_positive_rate: f64,
    pub counts: ConfusionCounts,
}

impl GroupMetrics {
    pub fn from_counts(counts: ConfusionCounts) -> Self {
        Self {
            count: counts.total(),
            accuracy: floored_rate(counts.true_positive + counts.true_negative, counts.total()),
            selection_rate: floored_rate(counts.predicted_positive(), counts.total()),
            false_positive_rate: floored_rate(counts.false_positive, counts.actual_negative()),
            true_positive_rate: floored_rate(counts.true_positive, counts.actual_positive()),
            counts,
        }
    }

    /// Rates whose denominator was zero (reported as 0 by convention)
    pub fn degenerate_rates(&self) -> Vec<RateKind> {
        let mut out = Vec::new();
        if self.counts.actual_negative() == 0 {
            out.push(RateKind::FalsePositiveRate);
        }
        if self.counts.actual_positive() == 0 {
            out.push(RateKind::TruePositiveRate);
        }
        out
    }
}

/// max − min over a set of rates (0 for fewer than two)
pub fn spread<I: IntoIterator<Item = f64>>(rates: I) -> f64 {
    let (lo, hi) = rates
        .into_iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), r| (lo.min(r), hi.max(r)));
    if hi >= lo {
        hi - lo
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_bands() {
        let t = FairnessThresholds::default();
        assert_eq!(t.verdict(0.05), Verdict::Pass);
        assert_eq!(t.verdict(0.10), Verdict::Review);
        assert_eq!(t.verdict(-0.15), Verdict::Review);
        assert_eq!(t.verdict(0.20), Verdict::Fail);
        assert!(Verdict::Fail > Verdict::Review);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(FairnessThresholds::default().validate().is_ok());
        assert!(FairnessThresholds::new(0.05, 0.10).validate().is_ok());
        assert!(FairnessThresholds::new(0.3, 0.2).validate().is_err());
    }

    #[test]
    fn test_group_metrics_with_floor() {
        let mut counts = ConfusionCounts::default();
        counts.record(true, true);
        counts.record(true, false);
        counts.record(true, true);
        let m = GroupMetrics::from_counts(counts);
        assert_eq!(m.count, 3);
        assert!((m.true_positive_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.false_positive_rate, 0.0);
        assert_eq!(m.degenerate_rates(), vec![RateKind::FalsePositiveRate]);
    }

    #[test]
    fn test_spread() {
        assert!((spread([0.4, 0.55, 0.5]) - 0.15).abs() < 1e-12);
        assert_eq!(spread([0.3]), 0.0);
        assert_eq!(spread(Vec::<f64>::new()), 0.0);
    }
}
