//! Diagnostic emission - optional force-plot documents
//!
//! A sink receives every attribution the explainer produces. Sink failures
//! are logged by the caller and never abort the attribution.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use super::types::AttributionResult;
use crate::constants::APP_NAME;
use crate::logic::features::FeatureVector;

pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, instance: &FeatureVector, attribution: &AttributionResult) -> Result<(), SinkError>;
}

/// Default diagnostics directory under the local data dir
pub fn get_default_diagnostics_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("diagnostics")
}

/// Writes one `force_plot_<uuid>.json` per attribution.
#[derive(Debug, Clone)]
pub struct JsonForcePlotSink {
    dir: PathBuf,
}

impl JsonForcePlotSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document(attribution: &AttributionResult) -> serde_json::Value {
        serde_json::json!({
            "generated_at": Utc::now().to_rfc3339(),
            "method": attribution.method.as_str(),
            "base_value": attribution.baseline,
            "output_value": attribution.model_output,
            "features": attribution
                .contributions
                .iter()
                .map(|c| serde_json::json!({
                    "name": c.feature,
                    "value": c.value,
                    "effect": c.contribution,
                }))
                .collect::<Vec<_>>(),
        })
    }
}

impl Default for JsonForcePlotSink {
    fn default() -> Self {
        Self::new(get_default_diagnostics_dir())
    }
}

impl DiagnosticSink for JsonForcePlotSink {
    fn emit(&self, _instance: &FeatureVector, attribution: &AttributionResult) -> Result<(), SinkError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("force_plot_{}.json", Uuid::new_v4()));
        fs::write(&path, serde_json::to_vec_pretty(&Self::document(attribution))?)?;
        log::debug!("Force plot written to {}", path.display());
        Ok(())
    }
}
