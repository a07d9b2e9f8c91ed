//! Isolation forest outlier scoring.
//!
//! Each tree isolates points by recursive random axis-aligned splits on a
//! subsample drawn without replacement. Short average path lengths mean a
//! point is easy to isolate, i.e. unusual.
//!
//! Scores follow the usual convention: `score = -2^(-E[h(x)] / c(psi))`,
//! so values lie in [-1, 0) and more negative means more anomalous. The
//! decision offset is the `contamination` percentile of the training scores;
//! a point is an outlier when its score falls strictly below it.
//!
//! # Reference
//! Liu, Ting & Zhou (2008), "Isolation Forest", ICDM.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use super::stats::percentile;
use super::{check_matrix, MathError};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation forest hyperparameters.
#[derive(Debug, Clone)]
pub struct IsolationForestConfig {
    /// Number of isolation trees.
    pub n_estimators: usize,
    /// Subsample size per tree (capped at the batch size).
    pub max_samples: usize,
    /// Expected outlier fraction in (0, 0.5].
    pub contamination: f64,
    /// Seed for reproducible scores.
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(data: &[Vec<f64>], indices: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = IsolationTree { nodes: Vec::new() };
        tree.grow(data, indices, 0, max_depth, rng);
        tree
    }

    fn grow(
        &mut self,
        data: &[Vec<f64>],
        indices: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });
        if depth >= max_depth || indices.len() <= 1 {
            return id;
        }

        // Draw features until one is non-constant on this node.
        let width = data[indices[0]].len();
        let mut candidates: Vec<usize> = (0..width).collect();
        let mut chosen = None;
        while !candidates.is_empty() {
            let pick = rng.random_range(0..candidates.len());
            let feature = candidates.swap_remove(pick);
            let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, &i| {
                let v = data[i][feature];
                (acc.0.min(v), acc.1.max(v))
            });
            if hi > lo {
                chosen = Some((feature, lo, hi));
                break;
            }
        }
        let Some((feature, lo, hi)) = chosen else {
            return id;
        };

        let threshold = lo + rng.random::<f64>() * (hi - lo);
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| data[i][feature] <= threshold);

        let left = self.grow(data, left_idx, depth + 1, max_depth, rng);
        let right = self.grow(data, right_idx, depth + 1, max_depth, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Split {
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
                    depth += 1.0;
                }
                Node::Leaf { size } => return depth + average_path_length(*size),
            }
        }
    }
}

/// Average unsuccessful-search path length in a binary search tree of `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Fitted isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
    offset: f64,
}

impl IsolationForest {
    /// Fit the forest on `data` and derive the contamination offset from
    /// the training scores.
    pub fn fit(data: &[Vec<f64>], config: &IsolationForestConfig) -> Result<Self, MathError> {
        if config.n_estimators == 0 {
            return Err(MathError::InvalidParameter {
                name: "n_estimators",
                message: "must be at least 1".to_string(),
            });
        }
        if !(config.contamination > 0.0 && config.contamination <= 0.5) {
            return Err(MathError::InvalidParameter {
                name: "contamination",
                message: format!("must be in (0, 0.5], got {}", config.contamination),
            });
        }
        let n_features = check_matrix(data)?;
        let n = data.len();
        let sample_size = config.max_samples.clamp(1, n);
        let max_depth = (sample_size as f64).log2().ceil().max(0.0) as usize;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let trees = (0..config.n_estimators)
            .map(|_| {
                let indices = sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::build(data, indices, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            n_features,
            offset: 0.0,
        };
        let scores: Vec<f64> = data.iter().map(|row| forest.score_sample(row)).collect();
        forest.offset = percentile(&scores, 100.0 * config.contamination);
        Ok(forest)
    }

    /// Anomaly score of one row; more negative is more anomalous.
    pub fn score_sample(&self, row: &[f64]) -> f64 {
        let mean_depth = self.trees.iter().map(|t| t.path_length(row)).sum::<f64>()
            / self.trees.len() as f64;
        let normaliser = average_path_length(self.sample_size);
        let ratio = if normaliser > 0.0 {
            mean_depth / normaliser
        } else {
            1.0
        };
        -(2f64.powf(-ratio))
    }

    /// Score threshold below which rows are labelled outliers.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// True when the row's score falls strictly below the offset.
    pub fn is_outlier(&self, row: &[f64]) -> bool {
        self.score_sample(row) < self.offset
    }

    /// Fit on `data` and return `(is_outlier, score)` for every row.
    pub fn fit_score(
        data: &[Vec<f64>],
        config: &IsolationForestConfig,
    ) -> Result<Vec<(bool, f64)>, MathError> {
        let forest = Self::fit(data, config)?;
        Ok(data
            .iter()
            .map(|row| {
                let score = forest.score_sample(row);
                (score < forest.offset, score)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<Vec<f64>> {
        let mut rows: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let jitter = (i % 5) as f64 * 0.1;
                vec![1.0 + jitter, 2.0 - jitter]
            })
            .collect();
        rows.push(vec![12.0, -9.0]);
        rows
    }

    #[test]
    fn path_length_constants() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > 10.0);
    }

    #[test]
    fn isolated_point_scores_lowest() {
        let data = cluster_with_outlier();
        let results = IsolationForest::fit_score(&data, &IsolationForestConfig::default()).unwrap();
        let (outlier_flag, outlier_score) = results[40];
        assert!(outlier_flag);
        for (_, score) in &results[..40] {
            assert!(*score > outlier_score);
        }
    }

    #[test]
    fn scores_are_reproducible_for_a_seed() {
        let data = cluster_with_outlier();
        let config = IsolationForestConfig::default();
        let a = IsolationForest::fit_score(&data, &config).unwrap();
        let b = IsolationForest::fit_score(&data, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn scores_lie_in_unit_interval() {
        let data = cluster_with_outlier();
        let forest = IsolationForest::fit(&data, &IsolationForestConfig::default()).unwrap();
        for row in &data {
            let s = forest.score_sample(row);
            assert!((-1.0..0.0).contains(&s), "score {} out of range", s);
        }
    }

    #[test]
    fn single_row_scores_half() {
        let forest = IsolationForest::fit(&[vec![1.0, 2.0]], &IsolationForestConfig::default())
            .unwrap();
        assert_eq!(forest.score_sample(&[1.0, 2.0]), -0.5);
        assert!(!forest.is_outlier(&[1.0, 2.0]));
    }

    #[test]
    fn rejects_bad_contamination() {
        let config = IsolationForestConfig {
            contamination: 0.0,
            ..Default::default()
        };
        assert!(IsolationForest::fit(&[vec![1.0]], &config).is_err());
    }
}
