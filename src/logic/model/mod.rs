//! Model Module - classifier seam and decision policy
//!
//! The classifier is supplied by the caller. This module defines the trait
//! the explainers talk to, the two serializable model families the artifact
//! can carry, and the approve/decline policy on top of the probabilities.

pub mod classifier;
pub mod linear;
pub mod spec;
pub mod threshold;
pub mod tree;

// Re-export common types
pub use classifier::{check_input, class_proba, Classifier};
pub use linear::LogisticModel;
pub use spec::ModelSpec;
pub use threshold::{Decision, DecisionThreshold, Outcome, RiskGrade, RiskLevel};
pub use tree::{DecisionTree, TreeEnsemble, TreeNode};
