//! Binary decision-tree classifier for next-day movement.
//!
//! CART-style tree: Gini impurity, midpoint thresholds over sorted unique
//! feature values, majority-class leaves. Training uses a seeded shuffle
//! split so runs are reproducible.

use crate::domain::features::{build_feature_set, Dataset};
use crate::domain::ohlcv::PriceBar;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Fraction of samples held out for evaluation.
    pub test_fraction: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    feature_idx: Option<usize>,
    threshold: Option<f64>,
    /// Majority class at this node (0.0 or 1.0).
    value: f64,
    left: Option<Box<TreeNode>>,
    right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(labels: &[f64]) -> Self {
        let n = labels.len() as f64;
        let positive = labels.iter().filter(|&&l| l > 0.0).count() as f64;
        let value = if n > 0.0 && positive / n > 0.5 { 1.0 } else { 0.0 };
        Self {
            feature_idx: None,
            threshold: None,
            value,
            left: None,
            right: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// A fitted decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: ClassifierConfig,
    root: Option<TreeNode>,
    feature_names: Vec<String>,
}

impl DecisionTree {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            root: None,
            feature_names: Vec::new(),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn fit(&mut self, dataset: &Dataset) {
        self.feature_names = dataset.feature_names.clone();
        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        self.root = Some(self.build_node(dataset, &indices, 0));
    }

    fn build_node(&self, dataset: &Dataset, indices: &[usize], depth: usize) -> TreeNode {
        let labels: Vec<f64> = indices.iter().map(|&i| dataset.labels[i]).collect();
        let impurity = gini(&labels);

        if depth >= self.config.max_depth
            || indices.len() < self.config.min_samples_split
            || impurity < 1e-10
        {
            return TreeNode::leaf(&labels);
        }

        let Some((feature_idx, threshold, left_idx, right_idx)) =
            self.find_best_split(dataset, indices, impurity)
        else {
            return TreeNode::leaf(&labels);
        };

        if left_idx.len() < self.config.min_samples_leaf
            || right_idx.len() < self.config.min_samples_leaf
        {
            return TreeNode::leaf(&labels);
        }

        let left = self.build_node(dataset, &left_idx, depth + 1);
        let right = self.build_node(dataset, &right_idx, depth + 1);

        TreeNode {
            feature_idx: Some(feature_idx),
            threshold: Some(threshold),
            value: TreeNode::leaf(&labels).value,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    fn find_best_split(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        parent_impurity: f64,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>)> {
        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>)> = None;

        for feature_idx in 0..dataset.n_features() {
            let mut values: Vec<f64> = indices
                .iter()
                .map(|&i| dataset.features[i][feature_idx])
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| dataset.features[i][feature_idx] <= threshold);

                if left_idx.is_empty() || right_idx.is_empty() {
                    continue;
                }

                let left_labels: Vec<f64> = left_idx.iter().map(|&i| dataset.labels[i]).collect();
                let right_labels: Vec<f64> = right_idx.iter().map(|&i| dataset.labels[i]).collect();

                let n_left = left_idx.len() as f64;
                let n_right = right_idx.len() as f64;
                let weighted = (n_left * gini(&left_labels) + n_right * gini(&right_labels))
                    / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, threshold, left_idx, right_idx));
                }
            }
        }

        best
    }

    /// Predicted class (0.0 or 1.0) for one sample.
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(node) => node,
            None => return 0.0,
        };

        while !node.is_leaf() {
            let (Some(idx), Some(threshold)) = (node.feature_idx, node.threshold) else {
                break;
            };
            let child = if features[idx] <= threshold {
                &node.left
            } else {
                &node.right
            };
            match child {
                Some(next) => node = next,
                None => break,
            }
        }

        node.value
    }

    /// Fraction of correct predictions over a labelled dataset.
    pub fn accuracy(&self, dataset: &Dataset) -> f64 {
        if dataset.n_samples() == 0 {
            return 0.0;
        }
        let correct = dataset
            .features
            .iter()
            .zip(dataset.labels.iter())
            .filter(|&(f, &label)| {
                let predicted = self.predict_one(f);
                (predicted > 0.5) == (label > 0.0)
            })
            .count();
        correct as f64 / dataset.n_samples() as f64
    }
}

fn gini(labels: &[f64]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let n = labels.len() as f64;
    let p = labels.iter().filter(|&&l| l > 0.0).count() as f64 / n;
    2.0 * p * (1.0 - p)
}

/// Train a tree on one symbol's raw series and evaluate held-out accuracy.
///
/// Returns `None` when the series yields too few usable samples or either
/// partition would be empty: that is "skipped", not an error.
pub fn train_and_evaluate(
    series: &[PriceBar],
    config: &ClassifierConfig,
) -> Option<(DecisionTree, f64)> {
    let dataset = build_feature_set(series);
    if dataset.n_samples() < 2 {
        warn!(
            samples = dataset.n_samples(),
            "not enough samples for classifier training, skipping"
        );
        return None;
    }

    let (train, test) = split_dataset(&dataset, config.test_fraction, config.seed)?;

    let mut tree = DecisionTree::new(config.clone());
    tree.fit(&train);
    let accuracy = tree.accuracy(&test);

    info!(
        train_samples = train.n_samples(),
        test_samples = test.n_samples(),
        accuracy,
        "classifier trained"
    );

    Some((tree, accuracy))
}

/// Seeded shuffle split into (train, test). `None` when either side is empty.
fn split_dataset(dataset: &Dataset, test_fraction: f64, seed: u64) -> Option<(Dataset, Dataset)> {
    let n = dataset.n_samples();
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return None;
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test = Dataset::new(dataset.feature_names.clone());
    let mut train = Dataset::new(dataset.feature_names.clone());

    for (pos, &i) in indices.iter().enumerate() {
        let sample = dataset.features[i].clone();
        let label = dataset.labels[i];
        if pos < n_test {
            test.add_sample(sample, label);
        } else {
            train.add_sample(sample, label);
        }
    }

    Some((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_dataset(n: usize) -> Dataset {
        let mut dataset = Dataset::new(vec!["x".into(), "y".into()]);
        for i in 0..n {
            let x = i as f64 / 10.0;
            let label = if x > (n as f64 / 20.0) { 1.0 } else { 0.0 };
            dataset.add_sample(vec![x, 1.0], label);
        }
        dataset
    }

    #[test]
    fn tree_learns_a_separable_threshold() {
        let dataset = separable_dataset(100);
        let mut tree = DecisionTree::new(ClassifierConfig::default());
        tree.fit(&dataset);

        assert!(tree.accuracy(&dataset) > 0.95);
    }

    #[test]
    fn constant_labels_yield_pure_leaf() {
        let mut dataset = Dataset::new(vec!["x".into()]);
        for i in 0..20 {
            dataset.add_sample(vec![i as f64], 1.0);
        }
        let mut tree = DecisionTree::new(ClassifierConfig::default());
        tree.fit(&dataset);

        assert_eq!(tree.predict_one(&[3.0]), 1.0);
        assert_eq!(tree.accuracy(&dataset), 1.0);
    }

    #[test]
    fn unfitted_tree_predicts_zero() {
        let tree = DecisionTree::new(ClassifierConfig::default());
        assert_eq!(tree.predict_one(&[1.0, 2.0]), 0.0);
    }

    #[test]
    fn split_is_deterministic_for_a_seed() {
        let dataset = separable_dataset(50);
        let (train_a, test_a) = split_dataset(&dataset, 0.2, 42).unwrap();
        let (train_b, test_b) = split_dataset(&dataset, 0.2, 42).unwrap();

        assert_eq!(train_a.features, train_b.features);
        assert_eq!(test_a.labels, test_b.labels);
        assert_eq!(train_a.n_samples() + test_a.n_samples(), 50);
    }

    #[test]
    fn split_rejects_degenerate_fractions() {
        let dataset = separable_dataset(10);
        assert!(split_dataset(&dataset, 0.0, 42).is_none());
        assert!(split_dataset(&dataset, 1.0, 42).is_none());
    }

    #[test]
    fn gini_bounds() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[1.0, 1.0]), 0.0);
        assert_eq!(gini(&[0.0, 0.0]), 0.0);
        assert!((gini(&[0.0, 1.0]) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn two_sample_split_trains() {
        let mut dataset = Dataset::new(vec!["x".into()]);
        dataset.add_sample(vec![0.0], 0.0);
        dataset.add_sample(vec![1.0], 1.0);

        let split = split_dataset(&dataset, 0.2, 42);
        assert!(split.is_some());
        let (train, test) = split.unwrap();
        assert_eq!(train.n_samples(), 1);
        assert_eq!(test.n_samples(), 1);
    }
}
