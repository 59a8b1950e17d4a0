//! Dataset Module - Labeled Evaluation Sets
//!
//! The batch audit job reads held-out applications as JSONL: one
//! [`EvalRecord`] per line carrying the encoded features, the ground-truth
//! label and the protected attributes. Every record is checked against the
//! artifact's feature layout before it is used.

pub mod record;
pub mod writer;


use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ndarray::Array2;

use crate::logic::error::{CreditError, CreditResult};
use crate::logic::fairness::ProtectedPartition;
use crate::logic::features::FeatureLayout;

pub use record::EvalRecord;
pub use writer::EvalWriter;

/// Evaluation rows, labels and protected-attribute columns, aligned by row.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalSet {
    pub features: Array2<f64>,
    pub labels: Vec<u8>,
    pub protected: BTreeMap<String, Vec<String>>,
}

impl EvalSet {
    /// Validate every record against `layout` and stack them.
    pub fn from_records(layout: &FeatureLayout, records: &[EvalRecord]) -> CreditResult<Self> {
        let attributes: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.protected.keys().map(String::as_str))
            .collect();

        let mut data = Vec::with_capacity(records.len() * layout.len());
        let mut labels = Vec::with_capacity(records.len());
        let mut protected: BTreeMap<String, Vec<String>> = attributes
            .iter()
            .map(|a| (a.to_string(), Vec::with_capacity(records.len())))
            .collect();

        for (row, record) in records.iter().enumerate() {
            record.validate(layout)?;
            if record.features.iter().any(|v| !v.is_finite()) {
                return Err(CreditError::InvalidConfig(format!(
                    "evaluation record {} contains non-finite features",
                    row
                )));
            }
            data.extend_from_slice(&record.features);
            labels.push(record.label);

            for (attribute, column) in protected.iter_mut() {
                let value = record.protected.get(attribute).ok_or_else(|| {
                    CreditError::ShapeMismatch {
                        expected: attributes.len(),
                        actual: record.protected.len(),
                        detail: format!(
                            "evaluation record {} lacks protected attribute '{}'",
                            row, attribute
                        ),
                    }
                })?;
                column.push(value.clone());
            }
        }

        let features = Array2::from_shape_vec((records.len(), layout.len()), data)
            .map_err(|e| CreditError::Numerical(e.to_string()))?;

        Ok(Self {
            features,
            labels,
            protected,
        })
    }

    /// Read a JSONL evaluation file (blank lines are skipped).
    pub fn load_jsonl(path: &Path, layout: &FeatureLayout) -> CreditResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str::<EvalRecord>(&line)?);
        }

        let set = Self::from_records(layout, &records)?;
        log::info!(
            "Loaded {} evaluation records ({} protected attributes) from {}",
            set.len(),
            set.protected.len(),
            path.display()
        );
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// One partition per protected attribute, ordered by attribute name
    pub fn partitions(&self) -> Vec<ProtectedPartition> {
        self.protected
            .iter()
            .map(|(attribute, values)| ProtectedPartition::new(attribute.clone(), values.clone()))
            .collect()
    }
}
