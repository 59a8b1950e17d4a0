//! Sampling Attribution - Kernel SHAP for opaque classifiers
//!
//! Works on any `predict_proba`. Features absent from a coalition are
//! integrated out over a bounded background summary. Coalitions are fully
//! enumerated when they fit the sample budget and sampled in complementary
//! pairs otherwise. The efficiency constraint `Σφ = f(x) − E[f]` is imposed
//! by eliminating the last varying feature from the regression, so the
//! result is additive even when the coalition set is sampled.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::linalg::weighted_least_squares;
use crate::logic::config::AttributionConfig;
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::model::Classifier;

#[derive(Debug, Clone)]
pub struct KernelAttributor {
    background: Array2<f64>,
    expected: Array1<f64>,
    n_samples: Option<usize>,
    seed: u64,
}

/// Coalition mask over the varying features plus its regression weight
struct Coalition {
    mask: Vec<bool>,
    weight: f64,
}

impl KernelAttributor {
    pub fn fit(
        model: &dyn Classifier,
        background: ArrayView2<f64>,
        config: &AttributionConfig,
    ) -> CreditResult<Self> {
        if background.nrows() == 0 {
            return Err(CreditError::InvalidBackground(
                "sampling attribution needs at least one background row".to_string(),
            ));
        }
        let summary = summarize_background(background, config.max_background, config.seed);
        let expected = model
            .predict_proba(summary.view())?
            .mean_axis(Axis(0))
            .ok_or_else(|| CreditError::Numerical("empty background summary".to_string()))?;

        log::debug!(
            "KernelAttributor fitted: {} of {} background rows kept",
            summary.nrows(),
            background.nrows()
        );

        Ok(Self {
            background: summary,
            expected,
            n_samples: config.n_samples,
            seed: config.seed,
        })
    }

    pub fn expected_value(&self) -> &Array1<f64> {
        &self.expected
    }

    pub fn background(&self) -> &Array2<f64> {
        &self.background
    }

    /// Attribution matrix `(n_features, n_classes)` for one encoded row.
    pub fn shap_values(
        &self,
        model: &dyn Classifier,
        row: ArrayView1<f64>,
    ) -> CreditResult<Array2<f64>> {
        let fx = model
            .predict_proba(row.insert_axis(Axis(0)))?
            .row(0)
            .to_owned();
        let n_classes = fx.len();
        let mut phi = Array2::zeros((row.len(), n_classes));
        let delta = &fx - &self.expected;

        // Features equal to every background value cannot move the output
        let varying: Vec<usize> = (0..row.len())
            .filter(|&j| {
                self.background
                    .column(j)
                    .iter()
                    .any(|&b| !is_close(row[j], b))
            })
            .collect();

        match varying.len() {
            0 => return Ok(phi),
            1 => {
                phi.row_mut(varying[0]).assign(&delta);
                return Ok(phi);
            }
            _ => {}
        }

        let m = varying.len();
        let coalitions = self.coalitions(m)?;
        let ey = self.evaluate(model, row, &varying, &coalitions)?;

        // Eliminate the last varying feature: φ_last = Δ − Σ others
        let last = m - 1;
        let k = coalitions.len();
        let mut x = Array2::zeros((k, last));
        let mut w = Array1::zeros(k);
        let mut y = Array2::zeros((k, n_classes));
        for (r, coalition) in coalitions.iter().enumerate() {
            let z_last = if coalition.mask[last] { 1.0 } else { 0.0 };
            for j in 0..last {
                let z = if coalition.mask[j] { 1.0 } else { 0.0 };
                x[[r, j]] = z - z_last;
            }
            w[r] = coalition.weight;
            for c in 0..n_classes {
                y[[r, c]] = ey[[r, c]] - self.expected[c] - z_last * delta[c];
            }
        }

        let beta = weighted_least_squares(x.view(), w.view(), y.view())?;

        for c in 0..n_classes {
            let mut assigned = 0.0;
            for j in 0..last {
                phi[[varying[j], c]] = beta[[j, c]];
                assigned += beta[[j, c]];
            }
            phi[[varying[last], c]] = delta[c] - assigned;
        }
        Ok(phi)
    }

    fn coalitions(&self, m: usize) -> CreditResult<Vec<Coalition>> {
        let budget = self.n_samples.unwrap_or(2 * m + 2048);
        let total = if m < usize::BITS as usize - 1 {
            Some((1usize << m) - 2)
        } else {
            None
        };

        match total {
            Some(total) if total <= budget => Ok(enumerate_coalitions(m)),
            _ => sample_coalitions(m, budget, self.seed),
        }
    }

    /// Mean model output per coalition with absent features drawn from the background
    fn evaluate(
        &self,
        model: &dyn Classifier,
        row: ArrayView1<f64>,
        varying: &[usize],
        coalitions: &[Coalition],
    ) -> CreditResult<Array2<f64>> {
        let n_bg = self.background.nrows();
        let mut synthetic = Array2::zeros((coalitions.len() * n_bg, row.len()));
        for (ci, coalition) in coalitions.iter().enumerate() {
            for (bi, bg) in self.background.rows().into_iter().enumerate() {
                let mut target = synthetic.row_mut(ci * n_bg + bi);
                target.assign(&bg);
                for (pos, &feature) in varying.iter().enumerate() {
                    if coalition.mask[pos] {
                        target[feature] = row[feature];
                    }
                }
            }
        }

        let proba = model.predict_proba(synthetic.view())?;
        let mut ey = Array2::zeros((coalitions.len(), proba.ncols()));
        for ci in 0..coalitions.len() {
            let block = proba.slice(ndarray::s![ci * n_bg..(ci + 1) * n_bg, ..]);
            if let Some(mean) = block.mean_axis(Axis(0)) {
                ey.row_mut(ci).assign(&mean);
            }
        }
        Ok(ey)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Keep at most `max_rows` background rows, chosen with a fixed seed.
pub fn summarize_background(background: ArrayView2<f64>, max_rows: usize, seed: u64) -> Array2<f64> {
    if background.nrows() <= max_rows {
        return background.to_owned();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, background.nrows(), max_rows).into_vec();
    indices.sort_unstable();
    background.select(Axis(0), &indices)
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}

fn binomial(n: usize, k: usize) -> f64 {
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Shapley kernel weight of a coalition of size `s` out of `m`
fn kernel_weight(m: usize, s: usize) -> f64 {
    (m - 1) as f64 / (binomial(m, s) * s as f64 * (m - s) as f64)
}

fn enumerate_coalitions(m: usize) -> Vec<Coalition> {
    (1..(1usize << m) - 1)
        .map(|bits| {
            let mask: Vec<bool> = (0..m).map(|j| (bits >> j) & 1 == 1).collect();
            let size = mask.iter().filter(|&&b| b).count();
            Coalition {
                mask,
                weight: kernel_weight(m, size),
            }
        })
        .collect()
}

/// Complementary pairs with size drawn ∝ (m−1)/(s(m−s)); uniform regression weights.
fn sample_coalitions(m: usize, budget: usize, seed: u64) -> CreditResult<Vec<Coalition>> {
    let sizes: Vec<usize> = (1..m).collect();
    let size_weights: Vec<f64> = sizes
        .iter()
        .map(|&s| (m - 1) as f64 / (s * (m - s)) as f64)
        .collect();
    let size_dist = WeightedIndex::new(&size_weights)
        .map_err(|e| CreditError::Numerical(format!("coalition size distribution: {}", e)))?;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(budget);
    while out.len() < budget {
        let size = sizes[size_dist.sample(&mut rng)];
        let mut mask = vec![false; m];
        for j in rand::seq::index::sample(&mut rng, m, size) {
            mask[j] = true;
        }
        let complement: Vec<bool> = mask.iter().map(|b| !b).collect();
        out.push(Coalition { mask, weight: 1.0 });
        if out.len() < budget {
            out.push(Coalition {
                mask: complement,
                weight: 1.0,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::test_support::LinearProbe;
    use ndarray::array;

    fn config() -> AttributionConfig {
        AttributionConfig::default()
    }

    #[test]
    fn test_kernel_weights_symmetric() {
        assert!((kernel_weight(4, 1) - kernel_weight(4, 3)).abs() < 1e-15);
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(enumerate_coalitions(3).len(), 6);
    }

    #[test]
    fn test_exact_enumeration_matches_linear_closed_form() {
        let model = LinearProbe::new(vec![0.05, -0.1, 0.02], 0.3);
        let background = array![[1.0, 0.0, 2.0], [3.0, 1.0, 0.0], [2.0, 2.0, 1.0]];
        let attributor = KernelAttributor::fit(&model, background.view(), &config()).unwrap();

        let x = array![4.0, 0.5, 3.0];
        let phi = attributor.shap_values(&model, x.view()).unwrap();
        let means = background.mean_axis(Axis(0)).unwrap();
        for j in 0..3 {
            let expected = model.weights()[j] * (x[j] - means[j]);
            assert!((phi[[j, 1]] - expected).abs() < 1e-9, "feature {}", j);
            assert!((phi[[j, 0]] + expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sampled_coalitions_additive_and_deterministic() {
        let weights: Vec<f64> = (0..12).map(|i| 0.01 * (i as f64 - 5.5)).collect();
        let model = LinearProbe::new(weights, 0.4);
        let background = Array2::from_shape_fn((30, 12), |(r, c)| ((r * 7 + c * 3) % 11) as f64 / 10.0);
        let attributor = KernelAttributor::fit(&model, background.view(), &config()).unwrap();

        let x = Array1::from_shape_fn(12, |c| 1.5 + c as f64 * 0.1);
        let first = attributor.shap_values(&model, x.view()).unwrap();
        let second = attributor.shap_values(&model, x.view()).unwrap();
        assert_eq!(first, second);

        let fx = model.predict_proba(x.view().insert_axis(Axis(0))).unwrap()[[0, 1]];
        let gap = attributor.expected_value()[1] + first.column(1).sum() - fx;
        assert!(gap.abs() < 1e-9);
    }

    #[test]
    fn test_constant_feature_gets_zero() {
        let model = LinearProbe::new(vec![0.1, 0.2], 0.1);
        let background = array![[0.0, 1.0], [2.0, 1.0]];
        let attributor = KernelAttributor::fit(&model, background.view(), &config()).unwrap();
        let phi = attributor.shap_values(&model, array![1.5, 1.0].view()).unwrap();
        assert_eq!(phi[[1, 1]], 0.0);
        assert!((phi[[0, 1]] - 0.1 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_background_summary_is_bounded_and_seeded() {
        let background = Array2::from_shape_fn((200, 2), |(r, c)| (r + c) as f64);
        let a = summarize_background(background.view(), 50, 42);
        let b = summarize_background(background.view(), 50, 42);
        assert_eq!(a.nrows(), 50);
        assert_eq!(a, b);
    }
}
