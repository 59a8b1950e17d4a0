//! Logistic Model - opaque fallback classifier
//!
//! A plain logistic regression over the encoded vector. It exposes no tree
//! structure, so the explainer always attributes it with the sampling
//! estimator.

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::{check_input, Classifier};
use crate::logic::error::{CreditError, CreditResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    weights: Vec<f64>,
    intercept: f64,
}

impl LogisticModel {
    pub fn new(weights: Vec<f64>, intercept: f64) -> CreditResult<Self> {
        let model = Self { weights, intercept };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> CreditResult<()> {
        if self.weights.is_empty() {
            return Err(CreditError::InvalidModel(
                "logistic model has no weights".to_string(),
            ));
        }
        if self.weights.iter().any(|w| !w.is_finite()) || !self.intercept.is_finite() {
            return Err(CreditError::InvalidModel(
                "logistic coefficients must be finite".to_string(),
            ));
        }
        Ok(())
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Positive-class probability for one row
    pub fn positive_proba(&self, row: ArrayView1<f64>) -> f64 {
        let z: f64 = self
            .weights
            .iter()
            .zip(row.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-z).exp())
    }
}

impl Classifier for LogisticModel {
    fn name(&self) -> &str {
        "logistic"
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn n_classes(&self) -> usize {
        2
    }

    fn predict_proba(&self, rows: ArrayView2<f64>) -> CreditResult<Array2<f64>> {
        check_input(self, rows)?;
        let mut out = Array2::zeros((rows.nrows(), 2));
        for (i, row) in rows.rows().into_iter().enumerate() {
            let p = self.positive_proba(row);
            out[[i, 0]] = 1.0 - p;
            out[[i, 1]] = p;
        }
        Ok(out)
    }
}
