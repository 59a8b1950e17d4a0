//! Model Spec - serializable model families
//!
//! The explainer artifact stores the classifier it was fitted against so a
//! batch job can replay it without the training pipeline.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::Classifier;
use super::linear::LogisticModel;
use super::tree::TreeEnsemble;
use crate::logic::error::CreditResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    TreeEnsemble(TreeEnsemble),
    Logistic(LogisticModel),
}

impl ModelSpec {
    pub fn validate(&self) -> CreditResult<()> {
        match self {
            ModelSpec::TreeEnsemble(m) => m.validate(),
            ModelSpec::Logistic(m) => m.validate(),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            ModelSpec::TreeEnsemble(m) => m,
            ModelSpec::Logistic(m) => m,
        }
    }
}

impl From<TreeEnsemble> for ModelSpec {
    fn from(model: TreeEnsemble) -> Self {
        ModelSpec::TreeEnsemble(model)
    }
}

impl From<LogisticModel> for ModelSpec {
    fn from(model: LogisticModel) -> Self {
        ModelSpec::Logistic(model)
    }
}

impl Classifier for ModelSpec {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn n_classes(&self) -> usize {
        self.inner().n_classes()
    }

    fn predict_proba(&self, rows: ArrayView2<f64>) -> CreditResult<Array2<f64>> {
        self.inner().predict_proba(rows)
    }

    fn tree_structure(&self) -> Option<&TreeEnsemble> {
        match self {
            ModelSpec::TreeEnsemble(m) => Some(m),
            ModelSpec::Logistic(_) => None,
        }
    }
}
