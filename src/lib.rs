//! Credit Risk Core - Explanation & Fairness Engines
//!
//! Per-decision attributions, local surrogate cross-checks, counterfactual
//! paths, consumer notices and batch fairness audits for a pre-trained
//! credit-risk classifier.

pub mod constants;
pub mod logic;

pub use logic::error::{CreditError, CreditResult};
