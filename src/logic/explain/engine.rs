//! Attribution Engine - exact or sampling, chosen once
//!
//! The capability check runs at fit time: a classifier exposing its trees
//! gets the closed-form attributor, anything else (or a forced sampling
//! mode) gets the coalition-sampling estimator. The choice is stored as a
//! two-variant enum and never re-probed per request.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use super::kernel::KernelAttributor;
use super::tree_shap::TreeAttributor;
use super::types::{AttributionMethod, AttributionResult};
use crate::logic::config::{AttributionConfig, AttributionMode};
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::features::FeatureLayout;
use crate::logic::model::Classifier;

/// Additivity tolerance for exact mode
pub const ADDITIVITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
pub enum Attributor {
    Exact(TreeAttributor),
    Sampling(KernelAttributor),
}

impl Attributor {
    pub fn method(&self) -> AttributionMethod {
        match self {
            Attributor::Exact(_) => AttributionMethod::ExactTree,
            Attributor::Sampling(_) => AttributionMethod::Sampling,
        }
    }

    fn expected_value(&self) -> &Array1<f64> {
        match self {
            Attributor::Exact(a) => a.expected_value(),
            Attributor::Sampling(a) => a.expected_value(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributionEngine {
    attributor: Attributor,
    names: Vec<String>,
    background_means: Vec<f64>,
    positive_class: usize,
}

impl AttributionEngine {
    pub fn fit(
        model: &dyn Classifier,
        layout: &FeatureLayout,
        background: ArrayView2<f64>,
        config: &AttributionConfig,
        positive_class: usize,
    ) -> CreditResult<Self> {
        layout.check_width(background.ncols())?;
        if positive_class >= model.n_classes() {
            return Err(CreditError::InvalidConfig(format!(
                "positive class {} out of range for a {}-class model",
                positive_class,
                model.n_classes()
            )));
        }

        let attributor = match (config.mode, model.tree_structure()) {
            (AttributionMode::Auto, Some(ensemble)) => {
                Attributor::Exact(TreeAttributor::fit(ensemble, background)?)
            }
            _ => Attributor::Sampling(KernelAttributor::fit(model, background, config)?),
        };

        let background_means = background
            .mean_axis(Axis(0))
            .ok_or_else(|| {
                CreditError::InvalidBackground("background set has no rows".to_string())
            })?
            .to_vec();

        log::info!(
            "Attribution engine ready: {} mode, model {}, {} features",
            attributor.method().as_str(),
            model.name(),
            layout.len()
        );

        Ok(Self {
            attributor,
            names: layout.names().to_vec(),
            background_means,
            positive_class,
        })
    }

    pub fn attributor(&self) -> &Attributor {
        &self.attributor
    }

    pub fn method(&self) -> AttributionMethod {
        self.attributor.method()
    }

    pub fn positive_class(&self) -> usize {
        self.positive_class
    }

    /// Expected positive-class probability over the reference set
    pub fn baseline(&self) -> f64 {
        self.attributor.expected_value()[self.positive_class]
    }

    /// Attribute one layout-checked encoded row.
    pub fn attribute_row(
        &self,
        model: &dyn Classifier,
        row: ArrayView1<f64>,
    ) -> CreditResult<AttributionResult> {
        if row.len() != self.names.len() {
            return Err(CreditError::ShapeMismatch {
                expected: self.names.len(),
                actual: row.len(),
                detail: "attribution input width".to_string(),
            });
        }

        let phi = match &self.attributor {
            Attributor::Exact(a) => a.shap_values(row),
            Attributor::Sampling(a) => a.shap_values(model, row)?,
        };
        let model_output = model.predict_proba(row.insert_axis(Axis(0)))?[[0, self.positive_class]];

        let result = AttributionResult::from_layout_order(
            &self.names,
            &row.to_vec(),
            &phi.column(self.positive_class).to_vec(),
            &self.background_means,
            self.baseline(),
            model_output,
            self.method(),
            self.positive_class,
        );

        let gap = result.additivity_gap();
        if self.method() == AttributionMethod::ExactTree && gap > ADDITIVITY_TOLERANCE {
            log::warn!("Exact attribution additivity gap {:.3e} exceeds tolerance", gap);
        } else {
            log::debug!(
                "Attribution ({}): output {:.4}, baseline {:.4}, gap {:.2e}",
                self.method().as_str(),
                model_output,
                result.baseline,
                gap
            );
        }

        Ok(result)
    }
}
