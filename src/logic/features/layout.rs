//! Feature Layout - Fitted Feature Schema
//!
//! **CRITICAL: the layout is the contract shared by the classifier, the
//! feature-engineering transform and the explainer artifact.**
//!
//! ## Rules (NEVER break these):
//! 1. The ordered name list is fixed at classifier-fit time
//! 2. Add / remove / reorder a feature → new layout hash
//! 3. Every instance is checked against the layout before it reaches the model
//!
//! ## Why versioning matters:
//! - Mismatched ordering silently corrupts attributions
//! - Artifacts and evaluation sets are replayed long after training

use std::collections::HashSet;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::logic::error::{CreditError, CreditResult};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current layout format version
/// MUST be incremented when the hashing scheme changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

/// Ordered feature-name list the classifier was fitted with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LayoutInfo", into = "LayoutInfo")]
pub struct FeatureLayout {
    version: u8,
    names: Vec<String>,
}

impl FeatureLayout {
    /// Build a layout from ordered names. Names must be unique and non-empty.
    pub fn new<I, S>(names: I) -> CreditResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        Self::from_parts(FEATURE_VERSION, names)
    }

    fn from_parts(version: u8, names: Vec<String>) -> CreditResult<Self> {
        if names.is_empty() {
            return Err(CreditError::InvalidConfig(
                "feature layout must contain at least one feature".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(CreditError::InvalidConfig(
                    "feature names must not be blank".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(CreditError::InvalidConfig(format!(
                    "duplicate feature name '{}'",
                    name
                )));
            }
        }

        Ok(Self { version, names })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Get feature index by name (O(n) but layouts are small)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Get feature name by index
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    // ========================================================================
    // LAYOUT HASH
    // ========================================================================

    /// CRC32 of version + ordered names.
    /// Used to detect layout mismatches between artifacts and data.
    pub fn hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        hasher.update(&[self.version]);
        for name in &self.names {
            hasher.update(name.as_bytes());
            hasher.update(&[0]); // Separator
        }
        hasher.finalize()
    }

    pub fn info(&self) -> LayoutInfo {
        LayoutInfo {
            version: self.version,
            hash: self.hash(),
            feature_count: self.len(),
            feature_names: self.names.clone(),
        }
    }

    // ========================================================================
    // VALIDATION
    // ========================================================================

    /// Validate that incoming data was produced for this layout
    pub fn validate(&self, incoming_version: u8, incoming_hash: u32) -> CreditResult<()> {
        let current_hash = self.hash();
        if incoming_version != self.version || incoming_hash != current_hash {
            return Err(CreditError::LayoutMismatch {
                expected_version: self.version,
                expected_hash: current_hash,
                actual_version: incoming_version,
                actual_hash: incoming_hash,
            });
        }
        Ok(())
    }

    /// Check a raw width (model inputs, background rows)
    pub fn check_width(&self, width: usize) -> CreditResult<()> {
        if width != self.len() {
            return Err(CreditError::ShapeMismatch {
                expected: self.len(),
                actual: width,
                detail: "feature count differs from fitted layout".to_string(),
            });
        }
        Ok(())
    }

    /// Check an ordered name list: same count, same names, same order.
    pub fn check_names(&self, names: &[String]) -> CreditResult<()> {
        if names.len() != self.len() {
            let missing: Vec<&str> = self
                .names
                .iter()
                .filter(|n| !names.contains(n))
                .map(String::as_str)
                .collect();
            let detail = if missing.is_empty() {
                "feature count differs from fitted layout".to_string()
            } else {
                format!("missing features: {}", missing.join(", "))
            };
            return Err(CreditError::ShapeMismatch {
                expected: self.len(),
                actual: names.len(),
                detail,
            });
        }

        if let Some((pos, (expected, actual))) = self
            .names
            .iter()
            .zip(names.iter())
            .enumerate()
            .find(|(_, (e, a))| e != a)
        {
            return Err(CreditError::ShapeMismatch {
                expected: self.len(),
                actual: names.len(),
                detail: format!(
                    "position {}: expected '{}', got '{}'",
                    pos, expected, actual
                ),
            });
        }

        Ok(())
    }
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Serialized form of a layout (also used for logging)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl From<FeatureLayout> for LayoutInfo {
    fn from(layout: FeatureLayout) -> Self {
        layout.info()
    }
}

impl TryFrom<LayoutInfo> for FeatureLayout {
    type Error = CreditError;

    fn try_from(info: LayoutInfo) -> Result<Self, Self::Error> {
        let layout = FeatureLayout::from_parts(info.version, info.feature_names)?;
        if info.feature_count != layout.len() {
            return Err(CreditError::ShapeMismatch {
                expected: info.feature_count,
                actual: layout.len(),
                detail: "declared feature_count disagrees with feature_names".to_string(),
            });
        }
        layout.validate(info.version, info.hash)?;
        Ok(layout)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> FeatureLayout {
        FeatureLayout::new(["checking_status", "duration", "credit_amount"]).unwrap()
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(layout().hash(), layout().hash());
        assert_ne!(layout().hash(), 0);
    }

    #[test]
    fn test_layout_hash_depends_on_order() {
        let swapped =
            FeatureLayout::new(["duration", "checking_status", "credit_amount"]).unwrap();
        assert_ne!(layout().hash(), swapped.hash());
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(FeatureLayout::new(["a", "a"]).is_err());
        assert!(FeatureLayout::new(Vec::<String>::new()).is_err());
        assert!(FeatureLayout::new(["a", " "]).is_err());
    }

    #[test]
    fn test_validate_layout() {
        let l = layout();
        assert!(l.validate(FEATURE_VERSION, l.hash()).is_ok());
        assert!(matches!(
            l.validate(FEATURE_VERSION + 1, l.hash()),
            Err(CreditError::LayoutMismatch { .. })
        ));
        assert!(l.validate(FEATURE_VERSION, l.hash().wrapping_add(1)).is_err());
    }

    #[test]
    fn test_check_names_reports_position() {
        let l = layout();
        let names: Vec<String> = ["checking_status", "credit_amount", "duration"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        match l.check_names(&names) {
            Err(CreditError::ShapeMismatch { detail, .. }) => {
                assert!(detail.contains("position 1"));
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_check_names_reports_missing() {
        let l = layout();
        let names = vec!["checking_status".to_string(), "duration".to_string()];
        match l.check_names(&names) {
            Err(CreditError::ShapeMismatch { expected, actual, detail }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
                assert!(detail.contains("credit_amount"));
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_feature_index() {
        let l = layout();
        assert_eq!(l.index_of("duration"), Some(1));
        assert_eq!(l.index_of("nonexistent"), None);
        assert_eq!(l.name(2), Some("credit_amount"));
        assert_eq!(l.name(100), None);
    }

    #[test]
    fn test_serde_roundtrip_validates_hash() {
        let l = layout();
        let json = serde_json::to_value(&l).unwrap();
        assert_eq!(json["hash"], l.hash());
        let back: FeatureLayout = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, l);

        let mut tampered = json;
        tampered["feature_names"][0] = serde_json::Value::from("renamed");
        assert!(serde_json::from_value::<FeatureLayout>(tampered).is_err());
    }
}
