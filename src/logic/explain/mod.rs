//! Explain Module - attribution, local surrogate and agreement
//!
//! - `engine` picks exact tree attribution or coalition sampling once at fit time
//! - `surrogate` is the independent LIME-style cross-check
//! - `explainer` is the façade the request layer talks to

pub mod agreement;
pub mod diagnostics;
pub mod engine;
pub mod explainer;
pub mod kernel;
pub mod linalg;
pub mod surrogate;
pub mod tree_shap;
pub mod types;

pub use agreement::{agreement, AgreementReport};
pub use diagnostics::{DiagnosticSink, JsonForcePlotSink};
pub use engine::{AttributionEngine, Attributor};
pub use explainer::CreditExplainer;
pub use kernel::KernelAttributor;
pub use surrogate::{QuartileDiscretizer, SurrogateExplainer};
pub use tree_shap::TreeAttributor;
pub use types::{
    AttributionMethod, AttributionResult, FeatureContribution, LocalExplanation, SurrogateTerm,
};
