//! Exact Tree Attribution - path-dependent TreeSHAP
//!
//! Closed-form Shapley values for tree ensembles. Node covers come from
//! passing the background set through every tree, so the baseline equals
//! the mean background output. Runtime is O(trees × leaves × depth²).
//!
//! Attributions are additive per tree; averaging over trees keeps the
//! ensemble result additive to machine precision.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::logic::error::{CreditError, CreditResult};
use crate::logic::model::{Classifier, DecisionTree, TreeEnsemble, TreeNode};

// ============================================================================
// PATH BOOKKEEPING
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

fn extend_path(path: &mut Vec<PathElement>, zero: f64, one: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction: zero,
        one_fraction: one,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one);
            next_one_portion = tmp - path[i].weight * zero * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` removed
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    for i in (0..depth).rev() {
        if one != 0.0 {
            let tmp = next_one_portion * denom / ((i + 1) as f64 * one);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero * (depth - i) as f64 / denom;
        } else if zero != 0.0 {
            total += (path[i].weight / zero) / ((depth - i) as f64 / denom);
        }
    }
    total
}

// ============================================================================
// TREE ATTRIBUTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct TreeAttributor {
    ensemble: TreeEnsemble,
    /// Background rows reaching each node, per tree
    covers: Vec<Vec<f64>>,
    /// Expected class probabilities over the background set
    expected: Array1<f64>,
}

impl TreeAttributor {
    pub fn fit(ensemble: &TreeEnsemble, background: ArrayView2<f64>) -> CreditResult<Self> {
        if background.nrows() == 0 {
            return Err(CreditError::InvalidBackground(
                "exact attribution needs at least one background row".to_string(),
            ));
        }
        if background.ncols() != ensemble.n_features() {
            return Err(CreditError::ShapeMismatch {
                expected: ensemble.n_features(),
                actual: background.ncols(),
                detail: "background width".to_string(),
            });
        }

        let covers = ensemble
            .trees()
            .iter()
            .map(|tree| node_covers(tree, background))
            .collect();

        let expected = ensemble
            .predict_proba(background)?
            .mean_axis(Axis(0))
            .ok_or_else(|| CreditError::Numerical("empty background".to_string()))?;

        log::debug!(
            "TreeAttributor fitted: {} trees, max depth {}, {} background rows",
            ensemble.n_trees(),
            ensemble.max_depth(),
            background.nrows()
        );

        Ok(Self {
            ensemble: ensemble.clone(),
            covers,
            expected,
        })
    }

    pub fn expected_value(&self) -> &Array1<f64> {
        &self.expected
    }

    /// Attribution matrix `(n_features, n_classes)` for one encoded row.
    pub fn shap_values(&self, row: ArrayView1<f64>) -> Array2<f64> {
        let mut phi = Array2::zeros((self.ensemble.n_features(), self.ensemble.n_classes()));
        let max_depth = self.ensemble.max_depth();
        for (tree, covers) in self.ensemble.trees().iter().zip(&self.covers) {
            let walker = TreeWalker {
                tree,
                covers,
                row,
            };
            walker.recurse(&mut phi, 0, Vec::with_capacity(max_depth + 1), 1.0, 1.0, None);
        }
        phi / self.ensemble.n_trees() as f64
    }
}

fn node_covers(tree: &DecisionTree, background: ArrayView2<f64>) -> Vec<f64> {
    let mut covers = vec![0.0; tree.len()];
    for row in background.rows() {
        let mut node = 0;
        covers[node] += 1.0;
        while let Some(next) = tree.next_node(node, row) {
            node = next;
            covers[node] += 1.0;
        }
    }
    covers
}

struct TreeWalker<'a, 'r> {
    tree: &'a DecisionTree,
    covers: &'a [f64],
    row: ArrayView1<'r, f64>,
}

impl TreeWalker<'_, '_> {
    fn recurse(
        &self,
        phi: &mut Array2<f64>,
        node: usize,
        mut path: Vec<PathElement>,
        zero: f64,
        one: f64,
        feature: Option<usize>,
    ) {
        extend_path(&mut path, zero, one, feature);

        match self.tree.node(node) {
            TreeNode::Leaf { value } => {
                for i in 1..path.len() {
                    let element = path[i];
                    if let Some(f) = element.feature {
                        let w = unwound_path_sum(&path, i);
                        let scale = w * (element.one_fraction - element.zero_fraction);
                        for (c, v) in value.iter().enumerate() {
                            phi[[f, c]] += scale * v;
                        }
                    }
                }
            }
            TreeNode::Split {
                feature: split,
                left,
                right,
                ..
            } => {
                let hot = self.tree.next_node(node, self.row).unwrap_or(*left);
                let cold = if hot == *left { *right } else { *left };

                let cover = self.covers[node];
                let (hot_fraction, cold_fraction) = if cover > 0.0 {
                    (self.covers[hot] / cover, self.covers[cold] / cover)
                } else {
                    (0.5, 0.5)
                };

                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;
                if let Some(k) = (1..path.len()).find(|&k| path[k].feature == Some(*split)) {
                    incoming_zero = path[k].zero_fraction;
                    incoming_one = path[k].one_fraction;
                    unwind_path(&mut path, k);
                }

                let hot_zero = hot_fraction * incoming_zero;
                if hot_zero != 0.0 || incoming_one != 0.0 {
                    self.recurse(phi, hot, path.clone(), hot_zero, incoming_one, Some(*split));
                }

                let cold_zero = cold_fraction * incoming_zero;
                if cold_zero != 0.0 {
                    self.recurse(phi, cold, path, cold_zero, 0.0, Some(*split));
                }
            }
        }
    }
}
