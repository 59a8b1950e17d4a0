//! Tree Ensemble - averaged probability trees
//!
//! Each leaf stores a class-probability vector; the ensemble output is the
//! mean over trees. Because the output is an average of leaf values, exact
//! per-tree attributions add up to an exact ensemble attribution in
//! probability space.
//!
//! Routing rule: `x[feature] <= threshold` goes left.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::{check_input, Classifier};
use crate::logic::error::{CreditError, CreditResult};

// ============================================================================
// NODES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: Vec<f64>,
    },
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }
}

// ============================================================================
// DECISION TREE
// ============================================================================

/// Flat node array, root at index 0, children always after their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &TreeNode {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child index the row follows at a split node (`None` at a leaf)
    pub fn next_node(&self, index: usize, row: ArrayView1<f64>) -> Option<usize> {
        match &self.nodes[index] {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => Some(if row[*feature] <= *threshold { *left } else { *right }),
            TreeNode::Leaf { .. } => None,
        }
    }

    /// Index of the leaf reached by `row`
    pub fn leaf_index(&self, row: ArrayView1<f64>) -> usize {
        let mut node = 0;
        while let Some(next) = self.next_node(node, row) {
            node = next;
        }
        node
    }

    pub fn leaf_value(&self, row: ArrayView1<f64>) -> &[f64] {
        match &self.nodes[self.leaf_index(row)] {
            TreeNode::Leaf { value } => value,
            // leaf_index only stops on leaves
            TreeNode::Split { .. } => &[],
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(tree: &DecisionTree, node: usize) -> usize {
            match tree.node(node) {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + walk(tree, *left).max(walk(tree, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(self, 0)
        }
    }

    fn validate(&self, n_features: usize, n_classes: usize) -> CreditResult<()> {
        if self.nodes.is_empty() {
            return Err(CreditError::InvalidModel("tree has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(CreditError::InvalidModel(format!(
                            "node {} splits on feature {} but model has {} features",
                            i, feature, n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(CreditError::InvalidModel(format!(
                            "node {} has a non-finite threshold",
                            i
                        )));
                    }
                    if left == right {
                        return Err(CreditError::InvalidModel(format!(
                            "node {} routes both branches to node {}",
                            i, left
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(CreditError::InvalidModel(format!(
                                "node {} has invalid child index {}",
                                i, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.len() != n_classes {
                        return Err(CreditError::InvalidModel(format!(
                            "leaf {} has {} class values, expected {}",
                            i,
                            value.len(),
                            n_classes
                        )));
                    }
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(CreditError::InvalidModel(format!(
                            "leaf {} has invalid probabilities",
                            i
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// ENSEMBLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    n_features: usize,
    n_classes: usize,
    trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    pub fn new(n_features: usize, n_classes: usize, trees: Vec<DecisionTree>) -> CreditResult<Self> {
        let ensemble = Self {
            n_features,
            n_classes,
            trees,
        };
        ensemble.validate()?;
        Ok(ensemble)
    }

    pub fn validate(&self) -> CreditResult<()> {
        if self.trees.is_empty() {
            return Err(CreditError::InvalidModel("ensemble has no trees".to_string()));
        }
        if self.n_classes < 2 {
            return Err(CreditError::InvalidModel(
                "ensemble must have at least two classes".to_string(),
            ));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.n_classes)
                .map_err(|e| CreditError::InvalidModel(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn max_depth(&self) -> usize {
        self.trees.iter().map(DecisionTree::depth).max().unwrap_or(0)
    }

    /// Averaged class-probability vector for one row
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Array1<f64> {
        let mut out = Array1::zeros(self.n_classes);
        for tree in &self.trees {
            for (acc, v) in out.iter_mut().zip(tree.leaf_value(row)) {
                *acc += v;
            }
        }
        out / self.trees.len() as f64
    }
}

impl Classifier for TreeEnsemble {
    fn name(&self) -> &str {
        "tree_ensemble"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, rows: ArrayView2<f64>) -> CreditResult<Array2<f64>> {
        check_input(self, rows)?;
        let mut out = Array2::zeros((rows.nrows(), self.n_classes));
        for (mut target, row) in out.rows_mut().into_iter().zip(rows.rows()) {
            target.assign(&self.predict_row(row));
        }
        Ok(out)
    }

    fn tree_structure(&self) -> Option<&TreeEnsemble> {
        Some(self)
    }
}
