//! Local Surrogate Explainer - LIME-style cross-check
//!
//! Independent of the attribution engine: quartile-discretize the background,
//! sample a neighbourhood by bin frequency, weight it with an exponential
//! kernel on the binary "same bin as the instance" representation, and fit a
//! sparse weighted ridge model. No additivity guarantee; determinism comes
//! from the fixed seed.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::linalg::weighted_ridge;
use super::types::{LocalExplanation, SurrogateTerm};
use crate::logic::config::SurrogateConfig;
use crate::logic::error::{CreditError, CreditResult};
use crate::logic::features::FeatureLayout;
use crate::logic::model::{class_proba, Classifier};

/// Ridge penalty used only to rank features before the final fit
const SELECTION_ALPHA: f64 = 0.01;

// ============================================================================
// DISCRETIZER
// ============================================================================

#[derive(Debug, Clone)]
struct FeatureBins {
    thresholds: Vec<f64>,
    labels: Vec<String>,
    frequencies: Vec<f64>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl FeatureBins {
    fn fit(name: &str, column: ArrayView1<f64>) -> Self {
        let mut sorted: Vec<f64> = column.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut thresholds: Vec<f64> = [25.0, 50.0, 75.0]
            .iter()
            .map(|&q| percentile(&sorted, q))
            .collect();
        thresholds.dedup();

        let mut labels = Vec::with_capacity(thresholds.len() + 1);
        labels.push(format!("{} <= {:.2}", name, thresholds[0]));
        for pair in thresholds.windows(2) {
            labels.push(format!("{:.2} < {} <= {:.2}", pair[0], name, pair[1]));
        }
        labels.push(format!("{} > {:.2}", name, thresholds[thresholds.len() - 1]));

        let n_bins = thresholds.len() + 1;
        let mut counts = vec![0usize; n_bins];
        let mut lower = vec![f64::INFINITY; n_bins];
        let mut upper = vec![f64::NEG_INFINITY; n_bins];
        for &v in &sorted {
            let bin = bin_index(&thresholds, v);
            counts[bin] += 1;
            lower[bin] = lower[bin].min(v);
            upper[bin] = upper[bin].max(v);
        }

        // Bins without training rows are never sampled; give them finite bounds anyway
        for bin in 0..n_bins {
            if counts[bin] == 0 {
                let lo = thresholds[bin.saturating_sub(1).min(thresholds.len() - 1)];
                let hi = thresholds[bin.min(thresholds.len() - 1)];
                lower[bin] = lo;
                upper[bin] = hi;
            }
        }

        let total = sorted.len().max(1) as f64;
        Self {
            thresholds,
            labels,
            frequencies: counts.iter().map(|&c| c as f64 / total).collect(),
            lower,
            upper,
        }
    }

    fn bin_of(&self, value: f64) -> usize {
        bin_index(&self.thresholds, value)
    }
}

/// Left-sided search: number of thresholds strictly below `value`
fn bin_index(thresholds: &[f64], value: f64) -> usize {
    thresholds.iter().filter(|&&t| t < value).count()
}

/// Linear-interpolated percentile of sorted data
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Quartile discretizer fitted on the background set.
#[derive(Debug, Clone)]
pub struct QuartileDiscretizer {
    names: Vec<String>,
    bins: Vec<FeatureBins>,
}

impl QuartileDiscretizer {
    pub fn fit(layout: &FeatureLayout, training: ArrayView2<f64>) -> CreditResult<Self> {
        layout.check_width(training.ncols())?;
        if training.nrows() == 0 {
            return Err(CreditError::InvalidBackground(
                "surrogate needs at least one training row".to_string(),
            ));
        }
        let bins = layout
            .names()
            .iter()
            .zip(training.axis_iter(Axis(1)))
            .map(|(name, column)| FeatureBins::fit(name, column))
            .collect();
        Ok(Self {
            names: layout.names().to_vec(),
            bins,
        })
    }

    /// Bin index per feature
    pub fn discretize(&self, row: ArrayView1<f64>) -> Vec<usize> {
        self.bins
            .iter()
            .zip(row.iter())
            .map(|(bins, &v)| bins.bin_of(v))
            .collect()
    }

    /// Condition string for the bin `value` falls in
    pub fn condition(&self, feature: usize, value: f64) -> &str {
        let bins = &self.bins[feature];
        &bins.labels[bins.bin_of(value)]
    }

    pub fn thresholds(&self, feature: usize) -> &[f64] {
        &self.bins[feature].thresholds
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

// ============================================================================
// SURROGATE EXPLAINER
// ============================================================================

#[derive(Debug, Clone)]
pub struct SurrogateExplainer {
    discretizer: QuartileDiscretizer,
    config: SurrogateConfig,
}

impl SurrogateExplainer {
    pub fn fit(
        layout: &FeatureLayout,
        training: ArrayView2<f64>,
        config: &SurrogateConfig,
    ) -> CreditResult<Self> {
        let discretizer = QuartileDiscretizer::fit(layout, training)?;
        log::debug!(
            "SurrogateExplainer fitted on {} rows, {} features",
            training.nrows(),
            layout.len()
        );
        Ok(Self {
            discretizer,
            config: config.clone(),
        })
    }

    pub fn discretizer(&self) -> &QuartileDiscretizer {
        &self.discretizer
    }

    pub fn kernel_width(&self) -> f64 {
        self.config
            .kernel_width
            .unwrap_or_else(|| 0.75 * (self.discretizer.names.len() as f64).sqrt())
    }

    /// Top-`k` local surrogate terms for one encoded row.
    pub fn explain(
        &self,
        model: &dyn Classifier,
        row: ArrayView1<f64>,
        positive_class: usize,
        k: usize,
    ) -> CreditResult<LocalExplanation> {
        let n_features = row.len();
        let n_samples = self.config.num_samples;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let instance_bins = self.discretizer.discretize(row);
        let mut samples = Array2::zeros((n_samples, n_features));
        let mut binary = Array2::zeros((n_samples, n_features));
        samples.row_mut(0).assign(&row);
        binary.row_mut(0).fill(1.0);

        for (j, bins) in self.discretizer.bins.iter().enumerate() {
            let dist = WeightedIndex::new(&bins.frequencies).map_err(|e| {
                CreditError::Numerical(format!("bin frequencies for feature {}: {}", j, e))
            })?;
            for r in 1..n_samples {
                let bin = dist.sample(&mut rng);
                let (lo, hi) = (bins.lower[bin], bins.upper[bin]);
                samples[[r, j]] = if hi > lo { rng.gen_range(lo..=hi) } else { lo };
                binary[[r, j]] = if bin == instance_bins[j] { 1.0 } else { 0.0 };
            }
        }

        let labels = class_proba(model, samples.view(), positive_class)?;
        let width = self.kernel_width();
        let weights: Array1<f64> = binary
            .rows()
            .into_iter()
            .map(|z| {
                let mismatches = z.iter().filter(|&&v| v == 0.0).count() as f64;
                (-mismatches / (width * width)).exp().sqrt()
            })
            .collect();

        if k == 0 {
            // Intercept-only surrogate: the weighted mean prediction
            let intercept = labels.dot(&weights) / weights.sum();
            return Ok(LocalExplanation {
                terms: Vec::new(),
                intercept,
                local_prediction: intercept,
                model_prediction: labels[0],
                score: 0.0,
                positive_class,
            });
        }

        // Rank on all features, then refit on the selected ones
        let k = k.min(n_features);
        let ranking = weighted_ridge(binary.view(), labels.view(), weights.view(), SELECTION_ALPHA)?;
        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| {
            ranking.coef[b]
                .abs()
                .partial_cmp(&ranking.coef[a].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(k);

        let selected = binary.select(Axis(1), &order);
        let fit = weighted_ridge(
            selected.view(),
            labels.view(),
            weights.view(),
            self.config.ridge_alpha,
        )?;

        let mut terms: Vec<SurrogateTerm> = order
            .iter()
            .zip(fit.coef.iter())
            .map(|(&j, &weight)| SurrogateTerm {
                feature: self.discretizer.names[j].clone(),
                condition: self.discretizer.bins[j].labels[instance_bins[j]].clone(),
                weight,
            })
            .collect();
        terms.sort_by(|a, b| {
            b.weight
                .abs()
                .partial_cmp(&a.weight.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(LocalExplanation {
            terms,
            intercept: fit.intercept,
            local_prediction: fit.intercept + fit.coef.sum(),
            model_prediction: labels[0],
            score: fit.score,
            positive_class,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::test_support;
    use ndarray::array;

    #[test]
    fn test_percentile_matches_linear_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 50.0), 2.5);
        assert_eq!(percentile(&sorted, 25.0), 1.75);
        assert_eq!(percentile(&[7.0], 75.0), 7.0);
    }

    #[test]
    fn test_condition_labels() {
        let layout = FeatureLayout::new(["x"]).unwrap();
        let training = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let disc = QuartileDiscretizer::fit(&layout, training.view()).unwrap();
        assert_eq!(disc.thresholds(0), &[2.0, 3.0, 4.0]);
        assert_eq!(disc.condition(0, 1.0), "x <= 2.00");
        assert_eq!(disc.condition(0, 2.0), "x <= 2.00");
        assert_eq!(disc.condition(0, 2.5), "2.00 < x <= 3.00");
        assert_eq!(disc.condition(0, 9.0), "x > 4.00");
    }

    #[test]
    fn test_constant_column_collapses_bins() {
        let layout = FeatureLayout::new(["flag"]).unwrap();
        let training = array![[1.0], [1.0], [1.0]];
        let disc = QuartileDiscretizer::fit(&layout, training.view()).unwrap();
        assert_eq!(disc.thresholds(0), &[1.0]);
        assert_eq!(disc.discretize(array![1.0].view()), vec![0]);
    }

    #[test]
    fn test_surrogate_finds_dominant_driver() {
        let layout = test_support::credit_layout();
        let model = test_support::scenario_tree();
        let background = test_support::scenario_background();
        let config = SurrogateConfig {
            num_samples: 1000,
            ..Default::default()
        };
        let surrogate = SurrogateExplainer::fit(&layout, background.view(), &config).unwrap();

        let row = test_support::scenario_instance_row();
        let local = surrogate.explain(&model, row.view(), 1, 3).unwrap();
        assert_eq!(local.terms.len(), 3);
        assert_eq!(local.terms[0].feature, "credit_amount");
        assert!(local.terms[0].weight > 0.0);
        assert!(local.terms[0].condition.starts_with("credit_amount >"));
        assert!((local.model_prediction - 0.82).abs() < 1e-12);

        let again = surrogate.explain(&model, row.view(), 1, 3).unwrap();
        assert_eq!(local, again);
    }

    #[test]
    fn test_top_k_zero_and_oversized() {
        let layout = test_support::credit_layout();
        let model = test_support::scenario_tree();
        let background = test_support::scenario_background();
        let config = SurrogateConfig {
            num_samples: 200,
            ..Default::default()
        };
        let surrogate = SurrogateExplainer::fit(&layout, background.view(), &config).unwrap();
        let row = test_support::scenario_instance_row();

        let none = surrogate.explain(&model, row.view(), 1, 0).unwrap();
        assert!(none.terms.is_empty());
        assert_eq!(none.local_prediction, none.intercept);
        assert!((none.model_prediction - 0.82).abs() < 1e-12);

        let all = surrogate.explain(&model, row.view(), 1, 50).unwrap();
        assert_eq!(all.terms.len(), layout.len());
    }
}
