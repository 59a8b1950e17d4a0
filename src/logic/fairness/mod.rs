//! Fairness Module - group metrics, parity differences, audit report
//!
//! Policy: |difference| < 0.10 → PASS, < 0.20 → REVIEW, otherwise FAIL.
//! Both bounds are configurable through [`FairnessThresholds`].
//!
//! Zero-denominator rates (e.g. FPR for a group with no actual negatives)
//! are reported as 0 with the denominator floored at 1, and every such case
//! is recorded as a [`FairnessWarning::DegenerateRate`].

mod auditor;
mod metrics;
mod report;

pub use auditor::{audit_predictions, FairnessAuditor, ProtectedPartition};
pub use metrics::{
    spread, ConfusionCounts, FairnessThresholds, GroupMetrics, RateKind, Verdict,
};
pub use report::{AttributeReport, FairnessReport, FairnessWarning};

#[cfg(test)]
mod tests;
