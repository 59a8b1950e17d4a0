//! Feature Scaler - Standard-scaler parameters from the encoding transform
//!
//! Stored alongside the explainer so that perturbations can be expressed in
//! original units ("reduce the credit amount by 10%") instead of z-scores.
//! Unscaled columns (one-hot indicators) carry mean 0 and scale 1.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::error::{CreditError, CreditResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FeatureScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> CreditResult<Self> {
        if mean.len() != scale.len() {
            return Err(CreditError::InvalidConfig(format!(
                "scaler has {} means but {} scales",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(CreditError::InvalidConfig(
                "scaler parameters must be finite".to_string(),
            ));
        }
        // Zero variance columns are left untouched
        let scale = scale
            .into_iter()
            .map(|s| if s.abs() < f64::EPSILON { 1.0 } else { s })
            .collect();
        Ok(Self { mean, scale })
    }

    /// Fit on rows of original-unit data (population std, like the training pipeline)
    pub fn fit(rows: ArrayView2<f64>) -> CreditResult<Self> {
        if rows.nrows() == 0 {
            return Err(CreditError::InvalidBackground(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        let mean = rows
            .mean_axis(Axis(0))
            .ok_or_else(|| CreditError::Numerical("empty mean".to_string()))?;
        let std = rows.std_axis(Axis(0), 0.0);
        Self::new(mean.to_vec(), std.to_vec())
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Original units → encoded (scaled) value
    pub fn transform_value(&self, index: usize, value: f64) -> f64 {
        (value - self.mean[index]) / self.scale[index]
    }

    /// Encoded (scaled) value → original units
    pub fn inverse_value(&self, index: usize, value: f64) -> f64 {
        value * self.scale[index] + self.mean[index]
    }

    pub fn transform(&self, row: ArrayView1<f64>) -> Array1<f64> {
        Array1::from_iter(row.iter().enumerate().map(|(i, &v)| self.transform_value(i, v)))
    }

    pub fn inverse(&self, row: ArrayView1<f64>) -> Array1<f64> {
        Array1::from_iter(row.iter().enumerate().map(|(i, &v)| self.inverse_value(i, v)))
    }
}
