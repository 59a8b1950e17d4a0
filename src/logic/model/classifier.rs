//! Classifier seam
//!
//! The trained model is an external collaborator: anything that can map rows
//! of encoded features to per-class probabilities. Exposing tree structure is
//! an optional capability checked once when the explainer is fitted.

use ndarray::{Array1, Array2, ArrayView2};

use super::tree::TreeEnsemble;
use crate::logic::error::{CreditError, CreditResult};

/// Binary (or multi-class) probabilistic classifier over a fixed-width vector.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Human-readable model family, used in logs and reports
    fn name(&self) -> &str;

    fn n_features(&self) -> usize;

    fn n_classes(&self) -> usize;

    /// rows: `(n_samples, n_features)` → `(n_samples, n_classes)`
    fn predict_proba(&self, rows: ArrayView2<f64>) -> CreditResult<Array2<f64>>;

    /// Class prediction (argmax, ties resolve to the lowest class index)
    fn predict(&self, rows: ArrayView2<f64>) -> CreditResult<Vec<usize>> {
        let proba = self.predict_proba(rows)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (i, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = i;
                    }
                }
                best
            })
            .collect())
    }

    /// Capability: internal tree structure for exact attribution.
    fn tree_structure(&self) -> Option<&TreeEnsemble> {
        None
    }
}

/// Check model input width before any prediction
pub fn check_input(model: &dyn Classifier, rows: ArrayView2<f64>) -> CreditResult<()> {
    if rows.ncols() != model.n_features() {
        return Err(CreditError::ShapeMismatch {
            expected: model.n_features(),
            actual: rows.ncols(),
            detail: format!("{} input width", model.name()),
        });
    }
    Ok(())
}

/// Probability of `class` for every row
pub fn class_proba(
    model: &dyn Classifier,
    rows: ArrayView2<f64>,
    class: usize,
) -> CreditResult<Array1<f64>> {
    if class >= model.n_classes() {
        return Err(CreditError::InvalidConfig(format!(
            "class {} out of range for a {}-class model",
            class,
            model.n_classes()
        )));
    }
    let proba = model.predict_proba(rows)?;
    Ok(proba.column(class).to_owned())
}
