use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::logic::error::CreditResult;
use crate::logic::features::FeatureLayout;

/// One labeled application of a held-out evaluation set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EvalRecord {
    // Feature contract
    pub feature_version: u8,
    pub layout_hash: u32,
    pub features: Vec<f64>,

    /// Ground truth: 1 = defaulted, 0 = repaid
    pub label: u8,

    /// Protected attributes, supplied out-of-band and never model inputs
    #[serde(default)]
    pub protected: BTreeMap<String, String>,
}

impl EvalRecord {
    pub fn new(layout: &FeatureLayout, features: Vec<f64>, label: u8) -> CreditResult<Self> {
        layout.check_width(features.len())?;
        Ok(Self {
            feature_version: layout.version(),
            layout_hash: layout.hash(),
            features,
            label,
            protected: BTreeMap::new(),
        })
    }

    pub fn with_protected(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        self.protected.insert(attribute.into(), value.into());
        self
    }

    /// Check the record against the layout the artifact was fitted with
    pub fn validate(&self, layout: &FeatureLayout) -> CreditResult<()> {
        layout.validate(self.feature_version, self.layout_hash)?;
        layout.check_width(self.features.len())
    }
}
