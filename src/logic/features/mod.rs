//! Features Module - Fitted Feature Schema
//!
//! The explainer never encodes raw applications itself: the external
//! feature-engineering transform hands over ordered numeric vectors.
//! This module owns the contract those vectors must satisfy.

pub mod layout;
pub mod vector;
pub mod scaler;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{FeatureLayout, LayoutInfo, FEATURE_VERSION};
pub use vector::{FeatureVector, FeatureVectorBuilder};
pub use scaler::FeatureScaler;
