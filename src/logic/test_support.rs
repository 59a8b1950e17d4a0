//! Shared test fixtures
//!
//! A five-feature credit layout, a single tree reproducing the reference
//! scenario (baseline 0.30, output 0.82) and a linear probability probe for
//! model-agnostic paths.

use std::sync::Arc;

use ndarray::{array, Array1, Array2, ArrayView2};

use crate::logic::config::ExplainConfig;
use crate::logic::error::CreditResult;
use crate::logic::explain::CreditExplainer;
use crate::logic::features::{FeatureLayout, FeatureVector};
use crate::logic::model::{check_input, Classifier, DecisionTree, TreeEnsemble, TreeNode};

pub fn credit_layout() -> FeatureLayout {
    FeatureLayout::new([
        "checking_status",
        "duration",
        "credit_amount",
        "installment_commitment",
        "age",
    ])
    .unwrap()
}

pub fn feature_index(name: &str) -> usize {
    credit_layout().index_of(name).unwrap()
}

/// credit_amount <= 10000 → 0.2, else duration <= 24 → 0.58, else 0.82
pub fn scenario_tree() -> TreeEnsemble {
    let amount = feature_index("credit_amount");
    let duration = feature_index("duration");
    let tree = DecisionTree::new(vec![
        TreeNode::Split { feature: amount, threshold: 10000.0, left: 1, right: 2 },
        TreeNode::Leaf { value: vec![0.8, 0.2] },
        TreeNode::Split { feature: duration, threshold: 24.0, left: 3, right: 4 },
        TreeNode::Leaf { value: vec![0.42, 0.58] },
        TreeNode::Leaf { value: vec![0.18, 0.82] },
    ]);
    TreeEnsemble::new(5, 2, vec![tree]).unwrap()
}

/// Single stump on credit_amount
pub fn amount_tree(threshold: f64, low: f64, high: f64) -> TreeEnsemble {
    let tree = DecisionTree::new(vec![
        TreeNode::Split {
            feature: feature_index("credit_amount"),
            threshold,
            left: 1,
            right: 2,
        },
        TreeNode::Leaf { value: vec![1.0 - low, low] },
        TreeNode::Leaf { value: vec![1.0 - high, high] },
    ]);
    TreeEnsemble::new(5, 2, vec![tree]).unwrap()
}

/// Ten reference applications: eight small loans, one large short loan,
/// one large long loan. Mean scenario output is 0.30.
pub fn scenario_background() -> Array2<f64> {
    array![
        [0.0, 12.0, 2000.0, 2.0, 25.0],
        [1.0, 18.0, 3500.0, 3.0, 41.0],
        [2.0, 24.0, 5000.0, 1.0, 33.0],
        [3.0, 6.0, 2500.0, 4.0, 52.0],
        [0.0, 12.0, 7000.0, 2.0, 29.0],
        [1.0, 36.0, 9000.0, 3.0, 45.0],
        [2.0, 24.0, 4000.0, 4.0, 38.0],
        [3.0, 48.0, 6000.0, 1.0, 61.0],
        [1.0, 12.0, 15000.0, 2.0, 35.0],
        [0.0, 36.0, 20000.0, 3.0, 27.0],
    ]
}

pub fn scenario_instance_row() -> Array1<f64> {
    array![1.0, 36.0, 25000.0, 4.0, 30.0]
}

pub fn scenario_instance() -> FeatureVector {
    FeatureVector::from_layout(&credit_layout(), scenario_instance_row().to_vec()).unwrap()
}

/// Fitted explainer over the scenario background
pub fn explainer_for(model: TreeEnsemble, config: ExplainConfig) -> CreditExplainer {
    CreditExplainer::fitted(Arc::new(model), credit_layout(), scenario_background(), config)
        .unwrap()
}

pub fn scenario_explainer() -> CreditExplainer {
    explainer_for(scenario_tree(), ExplainConfig::quick())
}

pub fn unfitted_explainer() -> CreditExplainer {
    CreditExplainer::new(
        Arc::new(scenario_tree()),
        credit_layout(),
        scenario_background(),
        ExplainConfig::quick(),
    )
    .unwrap()
}

// ============================================================================
// LINEAR PROBE
// ============================================================================

/// p(default) = intercept + w·x, unclamped. Exposes no tree structure.
#[derive(Debug, Clone)]
pub struct LinearProbe {
    weights: Vec<f64>,
    intercept: f64,
}

impl LinearProbe {
    pub fn new(weights: Vec<f64>, intercept: f64) -> Self {
        Self { weights, intercept }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

impl Classifier for LinearProbe {
    fn name(&self) -> &str {
        "linear_probe"
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
        for (i, row) in rows.outer_iter().enumerate() {
            let p = self.intercept
                + row
                    .iter()
                    .zip(&self.weights)
                    .map(|(x, w)| x * w)
                    .sum::<f64>();
            out[[i, 0]] = 1.0 - p;
            out[[i, 1]] = p;
        }
        Ok(out)
    }
}
