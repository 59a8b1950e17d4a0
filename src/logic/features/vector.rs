//! Feature Vector - Core data structure for model input
//!
//! An ordered name → value mapping produced by the external feature-engineering
//! transform. Ordering is checked against the fitted [`FeatureLayout`] before
//! any model call; nothing is ever padded or truncated.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::layout::FeatureLayout;
use crate::logic::error::{CreditError, CreditResult};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from ordered (name, value) pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (names, values) = pairs.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self { names, values }
    }

    /// Build from raw values in layout order
    pub fn from_layout(layout: &FeatureLayout, values: Vec<f64>) -> CreditResult<Self> {
        layout.check_width(values.len())?;
        Ok(Self {
            names: layout.names().to_vec(),
            values,
        })
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.names.push(name.into());
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Set feature by name, returns false if the feature is unknown
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Validate against the fitted layout and return the model input row.
    pub fn to_model_input(&self, layout: &FeatureLayout) -> CreditResult<Array1<f64>> {
        layout.check_names(&self.names)?;
        if let Some(name) = self
            .iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(n, _)| n.to_string())
        {
            return Err(CreditError::ShapeMismatch {
                expected: layout.len(),
                actual: self.len(),
                detail: format!("feature '{}' is not finite", name),
            });
        }
        Ok(Array1::from_vec(self.values.clone()))
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_count": self.len(),
            "named_values": self
                .iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}

// ============================================================================
// BUILDER PATTERN
// ============================================================================

/// Builder for creating FeatureVector with named setters
#[derive(Default)]
pub struct FeatureVectorBuilder {
    vector: FeatureVector,
}

impl FeatureVectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a layout with every feature at zero
    pub fn for_layout(layout: &FeatureLayout) -> Self {
        Self {
            vector: FeatureVector::from_pairs(layout.names().iter().map(|n| (n.clone(), 0.0))),
        }
    }

    /// Set feature by name, appending it if the builder has no such slot
    pub fn set(mut self, name: &str, value: f64) -> Self {
        if !self.vector.set(name, value) {
            self.vector.push(name, value);
        }
        self
    }

    pub fn build(self) -> FeatureVector {
        self.vector
    }
}

// ============================================================================
// TESTS
// ============================================================================
