//! Fairness audit scenarios

use ndarray::Array2;

use super::*;
use crate::logic::error::CreditError;
use crate::logic::model::DecisionThreshold;
use crate::logic::test_support::LinearProbe;

/// `n` rows for `group`, the first `positives` of them predicted positive
fn group_rows(group: &str, n: usize, positives: usize) -> (Vec<bool>, Vec<u8>, Vec<String>) {
    let predictions = (0..n).map(|i| i < positives).collect();
    let labels = (0..n).map(|i| (i % 2) as u8).collect();
    let values = vec![group.to_string(); n];
    (predictions, labels, values)
}

fn two_groups(first: (&str, usize, usize), second: (&str, usize, usize)) -> (Vec<bool>, Vec<u8>, ProtectedPartition) {
    let (mut p, mut l, mut v) = group_rows(first.0, first.1, first.2);
    let (p2, l2, v2) = group_rows(second.0, second.1, second.2);
    p.extend(p2);
    l.extend(l2);
    v.extend(v2);
    (p, l, ProtectedPartition::new("personal_status", v))
}

#[test]
fn test_demographic_parity_review_band() {
    // 8/20 = 0.40 vs 11/20 = 0.55
    let (predictions, labels, partition) = two_groups(("A", 20, 8), ("B", 20, 11));
    let report =
        audit_predictions(&predictions, &labels, &[partition], &FairnessThresholds::default()).unwrap();

    let attr = report.get("personal_status").unwrap();
    assert!((attr.groups["A"].selection_rate - 0.40).abs() < 1e-12);
    assert!((attr.groups["B"].selection_rate - 0.55).abs() < 1e-12);
    assert!((attr.demographic_parity_difference - 0.15).abs() < 1e-12);
    assert_eq!(attr.demographic_parity_verdict, Verdict::Review);
    assert_eq!(report.evaluated, 40);
}

#[test]
fn test_parity_is_symmetric_in_group_order() {
    let (p1, l1, part1) = two_groups(("A", 20, 8), ("B", 20, 11));
    let (p2, l2, part2) = two_groups(("B", 20, 11), ("A", 20, 8));
    let t = FairnessThresholds::default();

    let r1 = audit_predictions(&p1, &l1, &[part1], &t).unwrap();
    let r2 = audit_predictions(&p2, &l2, &[part2], &t).unwrap();
    let a1 = r1.get("personal_status").unwrap();
    let a2 = r2.get("personal_status").unwrap();
    assert_eq!(a1.demographic_parity_difference, a2.demographic_parity_difference);
    assert_eq!(a1.equalized_odds_difference, a2.equalized_odds_difference);
    assert_eq!(a1.groups, a2.groups);
}

#[test]
fn test_equalized_odds_takes_worst_rate() {
    // A: every actual positive caught, no false positives
    // B: half the positives caught, every negative flagged
    let predictions = vec![true, false, true, false, true, true, false, true];
    let labels = vec![1, 0, 1, 0, 1, 0, 1, 0];
    let values: Vec<String> = ["A", "A", "A", "A", "B", "B", "B", "B"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let report = audit_predictions(
        &predictions,
        &labels,
        &[ProtectedPartition::new("age_band", values)],
        &FairnessThresholds::default(),
    )
    .unwrap();

    let attr = report.get("age_band").unwrap();
    assert_eq!(attr.groups["A"].true_positive_rate, 1.0);
    assert_eq!(attr.groups["A"].false_positive_rate, 0.0);
    assert_eq!(attr.groups["B"].true_positive_rate, 0.5);
    assert_eq!(attr.groups["B"].false_positive_rate, 1.0);
    assert!((attr.equalized_odds_difference - 1.0).abs() < 1e-12);
    assert_eq!(attr.equalized_odds_verdict, Verdict::Fail);
    assert_eq!(attr.verdict(), Verdict::Fail);
    assert_eq!(report.verdict(), Verdict::Fail);
}

#[test]
fn test_degenerate_rate_is_warning_not_error() {
    // Group B has no actual negatives
    let predictions = vec![true, false, true, true];
    let labels = vec![1, 0, 1, 1];
    let values: Vec<String> = ["A", "A", "B", "B"].iter().map(|s| s.to_string()).collect();
    let report = audit_predictions(
        &predictions,
        &labels,
        &[ProtectedPartition::new("foreign_worker", values)],
        &FairnessThresholds::default(),
    )
    .unwrap();

    assert_eq!(report.get("foreign_worker").unwrap().groups["B"].false_positive_rate, 0.0);
    assert_eq!(
        report.warnings,
        vec![FairnessWarning::DegenerateRate {
            attribute: "foreign_worker".to_string(),
            group: "B".to_string(),
            rate: RateKind::FalsePositiveRate,
        }]
    );
    assert!(report.summary().contains("false_positive_rate undefined"));
}

#[test]
fn test_missing_expected_group_is_empty_partition() {
    let (predictions, labels, partition) = two_groups(("A", 5, 2), ("B", 5, 3));
    let partition = partition.with_expected_groups(["A", "B", "C"]);
    let err = audit_predictions(&predictions, &labels, &[partition], &FairnessThresholds::default())
        .unwrap_err();
    match err {
        CreditError::EmptyPartition { attribute, group } => {
            assert_eq!(attribute, "personal_status");
            assert_eq!(group, "C");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_empty_evaluation_set() {
    let err = audit_predictions(&[], &[], &[], &FairnessThresholds::default()).unwrap_err();
    assert!(matches!(err, CreditError::EmptyPartition { .. }));
    assert!(err.is_data_quality());
}

#[test]
fn test_partition_length_mismatch() {
    let (predictions, labels, _) = two_groups(("A", 5, 2), ("B", 5, 3));
    let short = ProtectedPartition::new("sex", vec!["M".to_string(); 4]);
    let err = audit_predictions(&predictions, &labels, &[short], &FairnessThresholds::default())
        .unwrap_err();
    assert!(matches!(err, CreditError::ShapeMismatch { expected: 10, actual: 4, .. }));
}

#[test]
fn test_rejects_non_binary_labels() {
    let err = audit_predictions(&[true], &[2], &[], &FairnessThresholds::default()).unwrap_err();
    assert!(matches!(err, CreditError::InvalidConfig(_)));
}

#[test]
fn test_auditor_uses_model_and_threshold() {
    // p = x, so rows at 0.9 are declined and rows at 0.1 approved
    let model = LinearProbe::new(vec![1.0], 0.0);
    let column: Vec<f64> = vec![0.9, 0.9, 0.1, 0.1, 0.9, 0.1, 0.1, 0.1];
    let eval_set = Array2::from_shape_vec((8, 1), column).unwrap();
    let labels = vec![1, 0, 0, 0, 1, 0, 1, 0];
    let values: Vec<String> = ["A", "A", "A", "A", "B", "B", "B", "B"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let auditor =
        FairnessAuditor::new(&model, DecisionThreshold::default(), FairnessThresholds::default())
            .unwrap();
    let report = auditor
        .audit(eval_set.view(), &labels, &[ProtectedPartition::new("sex", values)])
        .unwrap();

    let attr = report.get("sex").unwrap();
    assert_eq!(attr.groups["A"].selection_rate, 0.5);
    assert_eq!(attr.groups["B"].selection_rate, 0.25);
    assert!((attr.demographic_parity_difference - 0.25).abs() < 1e-12);
    assert_eq!(attr.demographic_parity_verdict, Verdict::Fail);
    assert_eq!(report.overall.count, 8);
}

#[test]
fn test_auditor_label_count_mismatch() {
    let model = LinearProbe::new(vec![1.0], 0.0);
    let eval_set = Array2::from_elem((3, 1), 0.4);
    let auditor =
        FairnessAuditor::new(&model, DecisionThreshold::default(), FairnessThresholds::default())
            .unwrap();
    assert!(matches!(
        auditor.audit(eval_set.view(), &[0, 1], &[]),
        Err(CreditError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_summary_layout() {
    let (predictions, labels, partition) = two_groups(("A", 20, 8), ("B", 20, 11));
    let report =
        audit_predictions(&predictions, &labels, &[partition], &FairnessThresholds::default()).unwrap();
    let summary = report.summary();

    assert!(summary.starts_with("\nFAIRNESS AUDIT REPORT\n===================="));
    assert!(summary.contains("• |metric| < 0.10 → PASS"));
    assert!(summary.contains("• |metric| ≥ 0.20 → FAIL"));
    assert!(summary.contains("Protected Attribute: personal_status"));
    assert!(summary.contains("Demographic Parity Difference: 0.1500 [REVIEW]"));
    assert!(summary.contains("• Escalate to compliance if FAIL"));
}

#[test]
fn test_report_json_round_trip() {
    let (predictions, labels, partition) = two_groups(("A", 4, 1), ("B", 4, 2));
    let report =
        audit_predictions(&predictions, &labels, &[partition], &FairnessThresholds::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("fairness.json");
    report.save_json(&path).unwrap();
    let loaded: FairnessReport = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(loaded, report);
}
