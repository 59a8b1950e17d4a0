//! Fairness Auditor - group-disaggregated metrics over protected partitions
//!
//! Runs out-of-band over a labeled evaluation set. Protected attribute
//! values are supplied alongside the evaluation rows and are never model
//! inputs.

use std::collections::BTreeMap;

use chrono::Utc;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::{spread, ConfusionCounts, FairnessThresholds, GroupMetrics};
use super::report::{AttributeReport, FairnessReport, FairnessWarning};
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::model::{class_proba, Classifier, DecisionThreshold};

// ============================================================================
// PARTITIONS
// ============================================================================

/// Protected attribute values, one per evaluation row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedPartition {
    pub attribute: String,
    pub values: Vec<String>,

    /// Groups that must be present; an absent one is an `EmptyPartition`
    #[serde(default)]
    pub expected_groups: Vec<String>,
}

impl ProtectedPartition {
    pub fn new(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            attribute: attribute.into(),
            values,
            expected_groups: Vec::new(),
        }
    }

    pub fn with_expected_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Row indices per group, ordered by group name
    fn members(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, value) in self.values.iter().enumerate() {
            groups.entry(value.as_str()).or_default().push(i);
        }
        groups
    }
}

// ============================================================================
// AUDITOR
// ============================================================================

pub struct FairnessAuditor<'a> {
    model: &'a dyn Classifier,
    decision: DecisionThreshold,
    thresholds: FairnessThresholds,
}

impl<'a> FairnessAuditor<'a> {
    pub fn new(
        model: &'a dyn Classifier,
        decision: DecisionThreshold,
        thresholds: FairnessThresholds,
    ) -> CreditResult<Self> {
        decision.validate()?;
        thresholds.validate()?;
        Ok(Self {
            model,
            decision,
            thresholds,
        })
    }

    pub fn thresholds(&self) -> &FairnessThresholds {
        &self.thresholds
    }

    /// Predict the evaluation set, then audit every partition.
    pub fn audit(
        &self,
        eval_set: ArrayView2<f64>,
        labels: &[u8],
        partitions: &[ProtectedPartition],
    ) -> CreditResult<FairnessReport> {
        if labels.len() != eval_set.nrows() {
            return Err(CreditError::ShapeMismatch {
                expected: eval_set.nrows(),
                actual: labels.len(),
                detail: "label count".to_string(),
            });
        }
        if eval_set.nrows() == 0 {
            return Err(CreditError::EmptyPartition {
                attribute: "<evaluation set>".to_string(),
                group: "<all>".to_string(),
            });
        }

        let proba = class_proba(self.model, eval_set, self.decision.positive_class)?;
        let predictions: Vec<bool> = proba.iter().map(|&p| self.decision.is_declined(p)).collect();

        audit_predictions(&predictions, labels, partitions, &self.thresholds)
    }
}

/// Audit precomputed binary predictions (true = predicted positive).
pub fn audit_predictions(
    predictions: &[bool],
    labels: &[u8],
    partitions: &[ProtectedPartition],
    thresholds: &FairnessThresholds,
) -> CreditResult<FairnessReport> {
    let n = predictions.len();
    if labels.len() != n {
        return Err(CreditError::ShapeMismatch {
            expected: n,
            actual: labels.len(),
            detail: "label count".to_string(),
        });
    }
    if n == 0 {
        return Err(CreditError::EmptyPartition {
            attribute: "<evaluation set>".to_string(),
            group: "<all>".to_string(),
        });
    }
    if let Some(bad) = labels.iter().find(|&&l| l > 1) {
        return Err(CreditError::InvalidConfig(format!(
            "labels must be 0 or 1 (found {})",
            bad
        )));
    }

    let truth: Vec<bool> = labels.iter().map(|&l| l == 1).collect();

    let mut overall_counts = ConfusionCounts::default();
    for (&label, &predicted) in truth.iter().zip(predictions) {
        overall_counts.record(label, predicted);
    }
    let overall = GroupMetrics::from_counts(overall_counts);

    let mut attributes = BTreeMap::new();
    let mut warnings = Vec::new();

    for partition in partitions {
        if partition.values.len() != n {
            return Err(CreditError::ShapeMismatch {
                expected: n,
                actual: partition.values.len(),
                detail: format!("protected attribute '{}'", partition.attribute),
            });
        }

        let report = audit_partition(partition, &truth, predictions, thresholds, &mut warnings)?;
        log::info!(
            "Fairness [{}]: DP {:.4} [{}], EO {:.4} [{}]",
            partition.attribute,
            report.demographic_parity_difference,
            report.demographic_parity_verdict,
            report.equalized_odds_difference,
            report.equalized_odds_verdict
        );
        attributes.insert(partition.attribute.clone(), report);
    }

    Ok(FairnessReport {
        id: Uuid::new_v4(),
        generated_at: Utc::now(),
        thresholds: *thresholds,
        evaluated: n,
        overall,
        attributes,
        warnings,
    })
}

fn audit_partition(
    partition: &ProtectedPartition,
    truth: &[bool],
    predictions: &[bool],
    thresholds: &FairnessThresholds,
    warnings: &mut Vec<FairnessWarning>,
) -> CreditResult<AttributeReport> {
    let members = partition.members();

    if let Some(missing) = partition
        .expected_groups
        .iter()
        .find(|g| !members.contains_key(g.as_str()))
    {
        return Err(CreditError::EmptyPartition {
            attribute: partition.attribute.clone(),
            group: missing.clone(),
        });
    }

    let mut groups = BTreeMap::new();
    for (group, rows) in members {
        let mut counts = ConfusionCounts::default();
        for &i in &rows {
            counts.record(truth[i], predictions[i]);
        }
        let metrics = GroupMetrics::from_counts(counts);

        for rate in metrics.degenerate_rates() {
            log::warn!(
                "Degenerate {} for {}={} (zero denominator, reported as 0)",
                rate.as_str(),
                partition.attribute,
                group
            );
            warnings.push(FairnessWarning::DegenerateRate {
                attribute: partition.attribute.clone(),
                group: group.to_string(),
                rate,
            });
        }
        groups.insert(group.to_string(), metrics);
    }

    let demographic_parity_difference = spread(groups.values().map(|m| m.selection_rate));
    let equalized_odds_difference = spread(groups.values().map(|m| m.true_positive_rate))
        .max(spread(groups.values().map(|m| m.false_positive_rate)));

    Ok(AttributeReport {
        groups,
        demographic_parity_difference,
        equalized_odds_difference,
        demographic_parity_verdict: thresholds.verdict(demographic_parity_difference),
        equalized_odds_verdict: thresholds.verdict(equalized_odds_difference),
    })
}
