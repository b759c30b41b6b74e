//! Random-forest binary classifier.
//!
//! CART trees grown on bootstrap samples with Gini impurity and a random
//! subset of features considered at each split. Class probabilities are the
//! mean of the per-tree leaf positive rates.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Hyper-parameters for fitting a [`RandomForest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of trees in the ensemble
    pub n_estimators: usize,
    /// Maximum depth of each tree (root is depth 0)
    pub max_depth: usize,
    /// Minimum samples a node needs to be split
    pub min_samples_split: usize,
    /// Minimum samples on each side of a split
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` means floor(sqrt(n_features))
    pub max_features: Option<usize>,
    /// Seed for bootstrap and feature sampling
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Node of a fitted tree. Leaves have no split feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature_idx: Option<usize>,
    pub split_value: Option<f64>,
    pub left_child: Option<usize>,
    pub right_child: Option<usize>,
    /// Fraction of positive samples that reached this node
    pub positive_rate: f64,
    pub samples: usize,
}

impl TreeNode {
    fn leaf(positive_rate: f64, samples: usize) -> Self {
        Self {
            feature_idx: None,
            split_value: None,
            left_child: None,
            right_child: None,
            positive_rate,
            samples,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx.is_none()
    }
}

/// A single fitted decision tree stored as a flat node arena (root at 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Probability of the positive class for one row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            match (node.feature_idx, node.split_value, node.left_child, node.right_child) {
                (Some(feature), Some(split), Some(left), Some(right)) => {
                    idx = if row[feature] <= split { left } else { right };
                }
                _ => return node.positive_rate,
            }
        }
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<TreeNode> {
        &mut self.nodes
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match (nodes[idx].left_child, nodes[idx].right_child) {
                (Some(l), Some(r)) => 1 + walk(nodes, l).max(walk(nodes, r)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Check that the arena is traversable for rows of `n_features` values.
    ///
    /// Children must come after their parent, which rules out cycles.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if !(0.0..=1.0).contains(&node.positive_rate) {
                return Err(format!(
                    "node {} has positive rate {} outside [0, 1]",
                    idx, node.positive_rate
                ));
            }

            match (node.feature_idx, node.split_value, node.left_child, node.right_child) {
                (None, None, None, None) => {}
                (Some(feature), Some(_), Some(left), Some(right)) => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} but rows have {}",
                            idx, feature, n_features
                        ));
                    }
                    for child in [left, right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} has child index {} outside {}..{}",
                                idx,
                                child,
                                idx + 1,
                                self.nodes.len()
                            ));
                        }
                    }
                }
                _ => return Err(format!("node {} has a partially specified split", idx)),
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
struct SplitInfo {
    feature_idx: usize,
    split_value: f64,
    /// Weighted Gini impurity of the children (lower is better)
    impurity: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [u8],
    params: &'a ForestParams,
    max_features: usize,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn build(&mut self, indices: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let samples = indices.len();
        let positives = indices.iter().filter(|&&i| self.y[i] == 1).count();
        let positive_rate = positives as f64 / samples as f64;

        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode::leaf(positive_rate, samples));

        let pure = positives == 0 || positives == samples;
        if depth >= self.params.max_depth || samples < self.params.min_samples_split || pure {
            return node_idx;
        }

        let Some(split) = self.best_split(&indices, rng) else {
            return node_idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x[i][split.feature_idx] <= split.split_value);

        let left_idx = self.build(left, depth + 1, rng);
        let right_idx = self.build(right, depth + 1, rng);

        let node = &mut self.nodes[node_idx];
        node.feature_idx = Some(split.feature_idx);
        node.split_value = Some(split.split_value);
        node.left_child = Some(left_idx);
        node.right_child = Some(right_idx);

        node_idx
    }

    /// Scan features in random order until `max_features` non-constant
    /// ones have been evaluated.
    fn best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<SplitInfo> {
        let n_features = self.x[indices[0]].len();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(rng);

        let mut best: Option<SplitInfo> = None;
        let mut evaluated = 0;
        let mut column: Vec<(f64, u8)> = Vec::with_capacity(indices.len());

        for feature in features {
            if evaluated >= self.max_features {
                break;
            }

            column.clear();
            column.extend(indices.iter().map(|&i| (self.x[i][feature], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            if column[0].0 == column[column.len() - 1].0 {
                continue;
            }
            evaluated += 1;

            if let Some(candidate) = self.best_threshold(feature, &column) {
                if best
                    .as_ref()
                    .map_or(true, |b| candidate.impurity < b.impurity)
                {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    fn best_threshold(&self, feature: usize, column: &[(f64, u8)]) -> Option<SplitInfo> {
        let n = column.len();
        let total_pos = column.iter().filter(|(_, label)| *label == 1).count();
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<SplitInfo> = None;
        let mut left_pos = 0;

        for i in 0..n - 1 {
            if column[i].1 == 1 {
                left_pos += 1;
            }
            let n_left = i + 1;
            let n_right = n - n_left;

            if column[i].0 == column[i + 1].0 || n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let impurity = weighted_gini(left_pos, n_left) + weighted_gini(total_pos - left_pos, n_right);

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let (lo, hi) = (column[i].0, column[i + 1].0);
                let mut split_value = lo + (hi - lo) / 2.0;
                if split_value >= hi {
                    split_value = lo;
                }
                best = Some(SplitInfo {
                    feature_idx: feature,
                    split_value,
                    impurity,
                });
            }
        }

        best
    }
}

/// Gini impurity of a node multiplied by its sample count.
fn weighted_gini(positives: usize, count: usize) -> f64 {
    let p = positives as f64 / count as f64;
    count as f64 * 2.0 * p * (1.0 - p)
}

/// Fitted random-forest classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit a forest on row-major features `x` and binary labels `y`.
    ///
    /// Trees are grown in parallel; each tree draws from its own RNG seeded
    /// from the forest seed, so the result does not depend on scheduling.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: ForestParams) -> anyhow::Result<Self> {
        anyhow::ensure!(!x.is_empty(), "cannot fit a forest on an empty dataset");
        anyhow::ensure!(
            x.len() == y.len(),
            "feature rows ({}) and labels ({}) differ in length",
            x.len(),
            y.len()
        );
        anyhow::ensure!(params.n_estimators > 0, "n_estimators must be positive");

        let n_features = x[0].len();
        anyhow::ensure!(n_features > 0, "rows have no features");
        anyhow::ensure!(
            x.iter().all(|row| row.len() == n_features),
            "rows have inconsistent feature counts"
        );
        anyhow::ensure!(y.iter().all(|&label| label <= 1), "labels must be 0 or 1");

        let max_features = params
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize)
            .clamp(1, n_features);

        let mut seeder = StdRng::seed_from_u64(params.seed);
        let tree_seeds: Vec<u64> = (0..params.n_estimators).map(|_| seeder.gen()).collect();

        let n_samples = x.len();
        let trees: Vec<DecisionTree> = tree_seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

                let mut builder = TreeBuilder {
                    x,
                    y,
                    params: &params,
                    max_features,
                    nodes: Vec::new(),
                };
                builder.build(bootstrap, 0, &mut rng);
                DecisionTree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        Ok(Self {
            params,
            n_features,
            trees,
        })
    }

    /// Probability of the positive class for one row.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Hard 0/1 prediction at probability 0.5.
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural check for a forest read back from disk.
    pub fn validate(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn trees_mut(&mut self) -> &mut Vec<DecisionTree> {
        &mut self.trees
    }
}
