//! Logic Module - Explanation & Fairness Engines
//!
//! ## Architecture
//! - `features/` - Fitted feature schema (layout, vectors, scaler)
//! - `model/` - Classifier seam, tree ensemble, logistic model, decision policy
//! - `explain/` - Attribution engine, local surrogate, explainer façade
//! - `counterfactual` - Single-factor decision flips
//! - `notice` - Adverse action notice and consumer texts
//! - `fairness/` - Group metrics and parity audit
//! - `artifact/` - Versioned explainer artifact
//! - `dataset/` - Labeled evaluation sets for the batch audit

// Core modules
pub mod config;
pub mod error;

// Engines
pub mod features;
pub mod model;
pub mod explain;
pub mod counterfactual;
pub mod notice;
pub mod assessment;
pub mod fairness;

// Persistence
pub mod artifact;
pub mod dataset;

#[cfg(test)]
pub(crate) mod test_support;
