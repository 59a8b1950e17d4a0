//! Credit Explainer - request-facing façade
//!
//! Owns the shared, read-only pieces (classifier handle, fitted layout,
//! background set, optional scaler) and the engines prepared by `fit()`.
//! Nothing here is mutated after fitting, so one explainer can serve
//! concurrent requests behind an `Arc`.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};

use super::agreement::{agreement, AgreementReport};
use super::diagnostics::DiagnosticSink;
use super::engine::AttributionEngine;
use super::surrogate::SurrogateExplainer;
use super::types::{AttributionMethod, AttributionResult, LocalExplanation};
use crate::logic::assessment::{self, CreditAssessment};
use crate::logic::config::ExplainConfig;
use crate::logic::counterfactual::{CounterfactualOutcome, CounterfactualSearch};
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::features::{FeatureLayout, FeatureScaler, FeatureVector};
use crate::logic::model::{class_proba, Classifier, Decision};

pub struct CreditExplainer {
    model: Arc<dyn Classifier>,
    layout: FeatureLayout,
    background: Array2<f64>,
    scaler: Option<FeatureScaler>,
    config: ExplainConfig,
    engine: Option<AttributionEngine>,
    surrogate: Option<SurrogateExplainer>,
    sink: Option<Box<dyn DiagnosticSink>>,
}

impl fmt::Debug for CreditExplainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreditExplainer")
            .field("model", &self.model.name())
            .field("features", &self.layout.len())
            .field("background_rows", &self.background.nrows())
            .field("method", &self.method())
            .finish_non_exhaustive()
    }
}

impl CreditExplainer {
    pub fn new(
        model: Arc<dyn Classifier>,
        layout: FeatureLayout,
        background: Array2<f64>,
        config: ExplainConfig,
    ) -> CreditResult<Self> {
        config.validate()?;

        if model.n_features() != layout.len() {
            return Err(CreditError::ShapeMismatch {
                expected: layout.len(),
                actual: model.n_features(),
                detail: format!("{} was fitted on a different feature count", model.name()),
            });
        }
        layout.check_width(background.ncols())?;
        if background.nrows() == 0 {
            return Err(CreditError::InvalidBackground(
                "background set is empty".to_string(),
            ));
        }
        if background.iter().any(|v| !v.is_finite()) {
            return Err(CreditError::InvalidBackground(
                "background set contains non-finite values".to_string(),
            ));
        }

        Ok(Self {
            model,
            layout,
            background,
            scaler: None,
            config,
            engine: None,
            surrogate: None,
            sink: None,
        })
    }

    /// Attach the encoding scaler so perturbations can be expressed in original units
    pub fn with_scaler(mut self, scaler: FeatureScaler) -> CreditResult<Self> {
        self.layout.check_width(scaler.width())?;
        self.scaler = Some(scaler);
        Ok(self)
    }

    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// One-time setup: capability check and surrogate discretizer.
    pub fn fit(&mut self) -> CreditResult<AttributionMethod> {
        let engine = AttributionEngine::fit(
            self.model.as_ref(),
            &self.layout,
            self.background.view(),
            &self.config.attribution,
            self.config.decision.positive_class,
        )?;
        let surrogate =
            SurrogateExplainer::fit(&self.layout, self.background.view(), &self.config.surrogate)?;

        let method = engine.method();
        self.engine = Some(engine);
        self.surrogate = Some(surrogate);
        Ok(method)
    }

    /// Construct and fit in one step
    pub fn fitted(
        model: Arc<dyn Classifier>,
        layout: FeatureLayout,
        background: Array2<f64>,
        config: ExplainConfig,
    ) -> CreditResult<Self> {
        let mut explainer = Self::new(model, layout, background, config)?;
        explainer.fit()?;
        Ok(explainer)
    }

    pub fn is_fitted(&self) -> bool {
        self.engine.is_some()
    }

    pub fn method(&self) -> Option<AttributionMethod> {
        self.engine.as_ref().map(AttributionEngine::method)
    }

    pub fn model(&self) -> &Arc<dyn Classifier> {
        &self.model
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    pub fn background(&self) -> &Array2<f64> {
        &self.background
    }

    pub fn scaler(&self) -> Option<&FeatureScaler> {
        self.scaler.as_ref()
    }

    pub fn config(&self) -> &ExplainConfig {
        &self.config
    }

    fn engine(&self) -> CreditResult<&AttributionEngine> {
        self.engine.as_ref().ok_or(CreditError::ExplainerUninitialized)
    }

    fn surrogate(&self) -> CreditResult<&SurrogateExplainer> {
        self.surrogate.as_ref().ok_or(CreditError::ExplainerUninitialized)
    }

    // ========================================================================
    // PREDICTION
    // ========================================================================

    /// Positive-class probability of an encoded row (no layout check)
    pub(crate) fn predict_row(&self, row: &Array1<f64>) -> CreditResult<f64> {
        let proba = class_proba(
            self.model.as_ref(),
            row.view().insert_axis(Axis(0)),
            self.config.decision.positive_class,
        )?;
        Ok(proba[0])
    }

    /// Default-risk probability for one application
    pub fn predict(&self, instance: &FeatureVector) -> CreditResult<f64> {
        let row = instance.to_model_input(&self.layout)?;
        self.predict_row(&row)
    }

    pub fn decide(&self, instance: &FeatureVector) -> CreditResult<Decision> {
        let probability = self.predict(instance)?;
        Ok(Decision::from_probability(probability, &self.config.decision))
    }

    // ========================================================================
    // EXPLANATIONS
    // ========================================================================

    /// Per-feature signed contributions, largest magnitude first.
    pub fn attribute(&self, instance: &FeatureVector) -> CreditResult<AttributionResult> {
        let engine = self.engine()?;
        let row = instance.to_model_input(&self.layout)?;
        if log::log_enabled!(log::Level::Debug) {
            log::debug!("Attributing {}", instance.to_log_entry());
        }
        let result = engine.attribute_row(self.model.as_ref(), row.view())?;

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.emit(instance, &result) {
                log::warn!("Diagnostic emission failed (attribution unaffected): {}", e);
            }
        }
        Ok(result)
    }

    /// Local surrogate explanation with the top `k` conditions.
    pub fn explain_local(&self, instance: &FeatureVector, k: usize) -> CreditResult<LocalExplanation> {
        let surrogate = self.surrogate()?;
        let row = instance.to_model_input(&self.layout)?;
        surrogate.explain(
            self.model.as_ref(),
            row.view(),
            self.config.decision.positive_class,
            k,
        )
    }

    /// Top-k agreement between the two explanations
    pub fn agreement(&self, attribution: &AttributionResult, local: &LocalExplanation) -> AgreementReport {
        agreement(attribution, local, self.config.surrogate.default_top_k)
    }

    pub fn find_counterfactual(&self, instance: &FeatureVector) -> CreditResult<CounterfactualOutcome> {
        CounterfactualSearch::new(self).search(instance)
    }

    /// Full per-request bundle: decision, explanations, notices, counterfactual.
    pub fn assess(&self, instance: &FeatureVector) -> CreditResult<CreditAssessment> {
        assessment::assess(self, instance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::explain::diagnostics::SinkError;
    use crate::logic::features::FeatureVectorBuilder;
    use crate::logic::test_support;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSink(Arc<AtomicUsize>);

    impl DiagnosticSink for FailingSink {
        fn emit(&self, _: &FeatureVector, _: &AttributionResult) -> Result<(), SinkError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err("disk full".into())
        }
    }

    #[test]
    fn test_requires_fit() {
        let explainer = test_support::unfitted_explainer();
        let instance = test_support::scenario_instance();
        assert!(matches!(
            explainer.attribute(&instance),
            Err(CreditError::ExplainerUninitialized)
        ));
        assert!(matches!(
            explainer.explain_local(&instance, 5),
            Err(CreditError::ExplainerUninitialized)
        ));
        assert!(matches!(
            explainer.find_counterfactual(&instance),
            Err(CreditError::ExplainerUninitialized)
        ));
        // Plain prediction needs no fit
        assert!((explainer.predict(&instance).unwrap() - 0.82).abs() < 1e-12);
    }

    #[test]
    fn test_scenario_attribution() {
        let explainer = test_support::scenario_explainer();
        let result = explainer.attribute(&test_support::scenario_instance()).unwrap();

        assert_eq!(result.method, AttributionMethod::ExactTree);
        assert!((result.model_output - 0.82).abs() < 1e-12);
        assert!((result.baseline - 0.30).abs() < 1e-12);
        assert!(result.additivity_gap() < 1e-6);
        assert_eq!(result.contributions[0].feature, "credit_amount");
        assert!((result.contributions[0].contribution - 0.448).abs() < 1e-12);
        assert_eq!(result.contributions[1].feature, "duration");
    }

    #[test]
    fn test_sign_consistency_when_above_baseline() {
        let explainer = test_support::scenario_explainer();
        let result = explainer.attribute(&test_support::scenario_instance()).unwrap();
        assert!(result.model_output > result.baseline);
        let (pos, neg) = result.split_mass();
        assert!(pos > neg);
    }

    #[test]
    fn test_attribution_is_idempotent() {
        let explainer = test_support::scenario_explainer();
        let instance = test_support::scenario_instance();
        assert_eq!(
            explainer.attribute(&instance).unwrap(),
            explainer.attribute(&instance).unwrap()
        );
    }

    #[test]
    fn test_shape_mismatch_is_not_padded() {
        let explainer = test_support::scenario_explainer();
        let short = FeatureVector::from_pairs([("duration", 36.0), ("credit_amount", 25000.0)]);
        assert!(matches!(
            explainer.attribute(&short),
            Err(CreditError::ShapeMismatch { expected: 5, actual: 2, .. })
        ));

        let extra = FeatureVectorBuilder::new()
            .set("checking_status", 1.0)
            .set("duration", 36.0)
            .set("credit_amount", 25000.0)
            .set("installment_commitment", 4.0)
            .set("age", 30.0)
            .set("income", 1.0)
            .build();
        assert!(matches!(
            explainer.attribute(&extra),
            Err(CreditError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_sink_failure_is_isolated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let explainer = test_support::scenario_explainer()
            .with_diagnostics(Box::new(FailingSink(Arc::clone(&calls))));
        let result = explainer.attribute(&test_support::scenario_instance());
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejects_mismatched_background() {
        let err = CreditExplainer::new(
            Arc::new(test_support::scenario_tree()),
            test_support::credit_layout(),
            Array2::zeros((3, 4)),
            ExplainConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CreditError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_explain_local_and_agreement() {
        let explainer = test_support::scenario_explainer();
        let instance = test_support::scenario_instance();
        let attribution = explainer.attribute(&instance).unwrap();
        let local = explainer.explain_local(&instance, 5).unwrap();
        assert_eq!(local.terms[0].feature, "credit_amount");

        let report = explainer.agreement(&attribution, &local);
        assert!(report.shared_features.contains(&"credit_amount".to_string()));
        assert_eq!(report.top_k, 5);
    }
}
