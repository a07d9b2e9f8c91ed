//! Random forest regression.
//!
//! Bagged CART regression trees with variance-reduction splits over every
//! feature. Each tree is fit on a bootstrap resample drawn from a seeded
//! generator, so a fixed seed and identical input reproduce the same forest.
//! The fitted forest is plain data and serializes with serde.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::stats::r2_score;
use super::{check_matrix, MathError};

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// Maximum tree depth; `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct Split {
    feature: usize,
    threshold: f64,
    cost: f64,
}

impl RegressionTree {
    fn fit(x: &[Vec<f64>], y: &[f64], indices: Vec<usize>, config: &ForestConfig) -> Self {
        let mut tree = RegressionTree { nodes: Vec::new() };
        tree.grow(x, y, indices, 0, config);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
        depth: usize,
        config: &ForestConfig,
    ) -> usize {
        let id = self.nodes.len();
        let n = indices.len() as f64;
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let sum_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
        self.nodes.push(TreeNode::Leaf { value: sum / n });

        let parent_cost = sum_sq - sum * sum / n;
        let depth_reached = config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || indices.len() < config.min_samples_split.max(2)
            || parent_cost <= 1e-12 * n
        {
            return id;
        }

        let Some(split) = best_split(x, y, &indices, config.min_samples_leaf.max(1)) else {
            return id;
        };
        if split.cost >= parent_cost {
            return id;
        }

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_idx, depth + 1, config);
        let right = self.grow(x, y, right_idx, depth + 1, config);
        self.nodes[id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => return *value,
            }
        }
    }
}

/// Lowest summed squared error split across all features.
fn best_split(x: &[Vec<f64>], y: &[f64], indices: &[usize], min_leaf: usize) -> Option<Split> {
    let n = indices.len();
    let width = x[indices[0]].len();
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();
    let mut best: Option<Split> = None;

    let mut order = indices.to_vec();
    for feature in 0..width {
        order.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 0..n - 1 {
            let yi = y[order[k]];
            left_sum += yi;
            left_sq += yi * yi;

            let left_n = k + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }
            let here = x[order[k]][feature];
            let next = x[order[k + 1]][feature];
            if next <= here {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let cost = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if best.as_ref().map_or(true, |b| cost < b.cost) {
                let mut threshold = here + (next - here) / 2.0;
                // Midpoint can round up to `next` for adjacent floats.
                if threshold >= next {
                    threshold = here;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    cost,
                });
            }
        }
    }
    best
}

/// Fitted random forest regressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    config: ForestConfig,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// Fit `config.n_estimators` trees on `x` against `y`.
    pub fn fit(x: &[Vec<f64>], y: &[f64], config: &ForestConfig) -> Result<Self, MathError> {
        if config.n_estimators == 0 {
            return Err(MathError::InvalidParameter {
                name: "n_estimators",
                message: "must be at least 1".to_string(),
            });
        }
        if config.max_depth == Some(0) {
            return Err(MathError::InvalidParameter {
                name: "max_depth",
                message: "must be at least 1".to_string(),
            });
        }
        let n_features = check_matrix(x)?;
        if x.len() != y.len() {
            return Err(MathError::TargetLengthMismatch {
                rows: x.len(),
                targets: y.len(),
            });
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(MathError::NonFinite {
                row,
                column: n_features,
            });
        }

        let n = x.len();
        let mut rng = StdRng::seed_from_u64(config.seed);
        let trees = (0..config.n_estimators)
            .map(|_| {
                let indices: Vec<usize> = if config.bootstrap {
                    (0..n).map(|_| rng.random_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(x, y, indices, config)
            })
            .collect();

        Ok(Self {
            config: config.clone(),
            n_features,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Mean prediction across trees.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, MathError> {
        if row.len() != self.n_features {
            return Err(MathError::DimensionMismatch {
                row: 0,
                expected: self.n_features,
                actual: row.len(),
            });
        }
        Ok(self.trees.iter().map(|t| t.predict(row)).sum::<f64>() / self.trees.len() as f64)
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, MathError> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    /// In-sample or held-out R².
    pub fn score(&self, x: &[Vec<f64>], y: &[f64]) -> Result<f64, MathError> {
        let predicted = self.predict(x)?;
        Ok(r2_score(y, &predicted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 0.0 } else { 1.0 }).collect();
        (x, y)
    }

    #[test]
    fn learns_a_step_function() {
        let (x, y) = step_data();
        let forest = RandomForestRegressor::fit(&x, &y, &ForestConfig::default()).unwrap();
        assert!(forest.predict_row(&[2.0, 2.0]).unwrap() < 0.2);
        assert!(forest.predict_row(&[37.0, 1.0]).unwrap() > 0.8);
        assert!(forest.score(&x, &y).unwrap() > 0.8);
    }

    #[test]
    fn constant_target_predicts_constant() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let y = vec![0.25; 10];
        let forest = RandomForestRegressor::fit(&x, &y, &ForestConfig::default()).unwrap();
        assert!((forest.predict_row(&[3.0]).unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(forest.score(&x, &y).unwrap(), 1.0);
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = step_data();
        let config = ForestConfig {
            n_estimators: 10,
            ..Default::default()
        };
        let a = RandomForestRegressor::fit(&x, &y, &config).unwrap();
        let b = RandomForestRegressor::fit(&x, &y, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn serde_preserves_predictions() {
        let (x, y) = step_data();
        let config = ForestConfig {
            n_estimators: 5,
            ..Default::default()
        };
        let forest = RandomForestRegressor::fit(&x, &y, &config).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let back: RandomForestRegressor = serde_json::from_str(&json).unwrap();
        let before = forest.predict_row(&[25.0, 1.0]).unwrap();
        let after = back.predict_row(&[25.0, 1.0]).unwrap();
        assert!((before - after).abs() < 1e-12);
    }

    #[test]
    fn rejects_mismatched_target() {
        let x = vec![vec![1.0], vec![2.0]];
        assert!(matches!(
            RandomForestRegressor::fit(&x, &[1.0], &ForestConfig::default()),
            Err(MathError::TargetLengthMismatch { .. })
        ));
    }

    #[test]
    fn predict_checks_width() {
        let x = vec![vec![1.0, 2.0], vec![2.0, 3.0]];
        let forest = RandomForestRegressor::fit(&x, &[0.0, 1.0], &ForestConfig::default()).unwrap();
        assert!(forest.predict_row(&[1.0]).is_err());
    }
}
