//! Fairness Report - structured result and text summary

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::{FairnessThresholds, GroupMetrics, RateKind, Verdict};
use crate::logic::error::CreditResult;

const RULE: &str = "--------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FairnessWarning {
    /// A rate denominator was zero; the rate is reported as 0.
    DegenerateRate {
        attribute: String,
        group: String,
        rate: RateKind,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeReport {
    pub groups: BTreeMap<String, GroupMetrics>,
    pub demographic_parity_difference: f64,
    pub equalized_odds_difference: f64,
    pub demographic_parity_verdict: Verdict,
    pub equalized_odds_verdict: Verdict,
}

impl AttributeReport {
    pub fn verdict(&self) -> Verdict {
        self.demographic_parity_verdict.max(self.equalized_odds_verdict)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub thresholds: FairnessThresholds,
    pub evaluated: usize,
    pub overall: GroupMetrics,
    pub attributes: BTreeMap<String, AttributeReport>,
    pub warnings: Vec<FairnessWarning>,
}

impl FairnessReport {
    pub fn get(&self, attribute: &str) -> Option<&AttributeReport> {
        self.attributes.get(attribute)
    }

    /// Worst verdict over all attributes (PASS when none were audited)
    pub fn verdict(&self) -> Verdict {
        self.attributes
            .values()
            .map(AttributeReport::verdict)
            .max()
            .unwrap_or(Verdict::Pass)
    }

    pub fn save_json(&self, path: &Path) -> CreditResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Human-readable audit report
    pub fn summary(&self) -> String {
        let t = &self.thresholds;
        let mut out = String::new();

        out.push_str("\nFAIRNESS AUDIT REPORT\n====================\n\n");
        out.push_str("This report evaluates model bias across protected attributes.\n");
        out.push_str("Thresholds:\n");
        let _ = writeln!(out, "• |metric| < {:.2} → PASS", t.pass);
        let _ = writeln!(out, "• |metric| < {:.2} → REVIEW", t.review);
        let _ = writeln!(out, "• |metric| ≥ {:.2} → FAIL", t.review);
        let _ = writeln!(
            out,
            "Evaluated: {} applications (accuracy {:.4}, selection rate {:.4})",
            self.evaluated, self.overall.accuracy, self.overall.selection_rate
        );

        for (attribute, report) in &self.attributes {
            let _ = write!(out, "\n{RULE}\nProtected Attribute: {attribute}\n{RULE}\n");
            let _ = writeln!(
                out,
                "Demographic Parity Difference: {:.4} [{}]",
                report.demographic_parity_difference, report.demographic_parity_verdict
            );
            let _ = writeln!(
                out,
                "Equalized Odds Difference:     {:.4} [{}]",
                report.equalized_odds_difference, report.equalized_odds_verdict
            );
            out.push_str("\nMetrics by Group:\n");
            for (group, m) in &report.groups {
                let _ = writeln!(
                    out,
                    "  {:<12} n={:<6} accuracy={:.4} selection_rate={:.4} fpr={:.4} tpr={:.4}",
                    group,
                    m.count,
                    m.accuracy,
                    m.selection_rate,
                    m.false_positive_rate,
                    m.true_positive_rate
                );
            }
        }

        if !self.warnings.is_empty() {
            let _ = write!(out, "\n{RULE}\nWarnings:\n");
            for warning in &self.warnings {
                match warning {
                    FairnessWarning::DegenerateRate {
                        attribute,
                        group,
                        rate,
                    } => {
                        let _ = writeln!(
                            out,
                            "• {}={}: {} undefined (zero denominator, reported as 0)",
                            attribute,
                            group,
                            rate.as_str()
                        );
                    }
                }
            }
        }

        let _ = write!(out, "\n{RULE}\nRecommendations:\n");
        out.push_str("• Review biased features\n");
        out.push_str("• Consider fairness-aware training\n");
        out.push_str("• Apply post-processing mitigation\n");
        out.push_str("• Escalate to compliance if FAIL\n");
        let _ = writeln!(out, "{RULE}");
        out
    }
}
