//! Gradient-boosted regression trees.
//!
//! Regression boosts squared error from the target mean. Classification
//! boosts log-loss from the log prior, with one tree per stage for two
//! classes and one tree per class per stage otherwise; leaf values take a
//! single Newton step.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::activation::{sigmoid, softmax};
use crate::classical::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for BoostParams {
    fn default() -> Self {
        BoostParams { n_estimators: 100, learning_rate: 0.1, max_depth: 3, seed: 42 }
    }
}

impl BoostParams {
    fn tree_params(&self, stage: usize) -> TreeParams {
        TreeParams {
            max_depth: Some(self.max_depth.max(1)),
            seed: self.seed.wrapping_add(stage as u64),
            ..TreeParams::default()
        }
    }
}

/// Replaces every leaf value with `num / den` summed over the rows that
/// land in it.
fn newton_leaves(tree: &mut DecisionTree, x: &[Vec<f64>], num: &[f64], den: &[f64], scale: f64) {
    let mut sums: HashMap<usize, (f64, f64)> = HashMap::new();
    for (i, row) in x.iter().enumerate() {
        let entry = sums.entry(tree.leaf_index(row)).or_insert((0.0, 0.0));
        entry.0 += num[i];
        entry.1 += den[i];
    }
    for (leaf, (n, d)) in sums {
        let v = if d.abs() < 1e-12 { 0.0 } else { scale * n / d };
        tree.set_leaf_value(leaf, v);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    init: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
}

impl GradientBoostingRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: BoostParams) -> GradientBoostingRegressor {
        let init = y.iter().sum::<f64>() / y.len().max(1) as f64;
        let mut f = vec![init; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for stage in 0..params.n_estimators {
            let residual: Vec<f64> = y.iter().zip(&f).map(|(y, f)| y - f).collect();
            let tree = DecisionTree::fit_regressor(x, &residual, params.tree_params(stage));
            for (fi, row) in f.iter_mut().zip(x) {
                *fi += params.learning_rate * tree.predict_value(row);
            }
            trees.push(tree);
        }
        GradientBoostingRegressor { init, learning_rate: params.learning_rate, trees }
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter()
            .map(|row| {
                self.init + self.learning_rate * self.trees.iter().map(|t| t.predict_value(row)).sum::<f64>()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    /// One raw score per output (1 for two classes, K otherwise).
    init: Vec<f64>,
    learning_rate: f64,
    /// `stages[s][k]` is the tree for output `k` at stage `s`.
    stages: Vec<Vec<DecisionTree>>,
    n_classes: usize,
}

impl GradientBoostingClassifier {
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: BoostParams) -> GradientBoostingClassifier {
        let n_classes = n_classes.max(2);
        let n = y.len().max(1) as f64;
        let prior = |c: usize| (y.iter().filter(|&&l| l == c).count() as f64 / n).clamp(1e-12, 1.0 - 1e-12);

        let init: Vec<f64> = if n_classes == 2 {
            let p = prior(1);
            vec![(p / (1.0 - p)).ln()]
        } else {
            (0..n_classes).map(|c| prior(c).ln()).collect()
        };
        let outputs = init.len();
        let mut raw: Vec<Vec<f64>> = vec![init.clone(); y.len()];
        let mut stages = Vec::with_capacity(params.n_estimators);

        for stage in 0..params.n_estimators {
            let probs: Vec<Vec<f64>> = raw.iter().map(|r| raw_to_proba(r, n_classes)).collect();
            let mut trees = Vec::with_capacity(outputs);
            for k in 0..outputs {
                let class = if outputs == 1 { 1 } else { k };
                let p: Vec<f64> = probs.iter().map(|p| p[class]).collect();
                let residual: Vec<f64> =
                    y.iter().zip(&p).map(|(&l, p)| f64::from(u8::from(l == class)) - p).collect();
                let hessian: Vec<f64> = p.iter().map(|p| p * (1.0 - p)).collect();

                let mut tree = DecisionTree::fit_regressor(x, &residual, params.tree_params(stage * outputs + k));
                let scale = if outputs == 1 { 1.0 } else { (n_classes - 1) as f64 / n_classes as f64 };
                newton_leaves(&mut tree, x, &residual, &hessian, scale);

                for (r, row) in raw.iter_mut().zip(x) {
                    r[k] += params.learning_rate * tree.predict_value(row);
                }
                trees.push(tree);
            }
            stages.push(trees);
        }

        GradientBoostingClassifier { init, learning_rate: params.learning_rate, stages, n_classes }
    }

    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        x.iter()
            .map(|row| {
                let mut raw = self.init.clone();
                for trees in &self.stages {
                    for (r, tree) in raw.iter_mut().zip(trees) {
                        *r += self.learning_rate * tree.predict_value(row);
                    }
                }
                raw_to_proba(&raw, self.n_classes)
            })
            .collect()
    }
}

fn raw_to_proba(raw: &[f64], n_classes: usize) -> Vec<f64> {
    if n_classes == 2 {
        let p = sigmoid(raw[0]);
        vec![1.0 - p, p]
    } else {
        softmax(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regressor_fits_a_nonlinear_target() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64 / 4.0]).collect();
        let y: Vec<f64> = x.iter().map(|r| (r[0]).sin()).collect();
        let gb = GradientBoostingRegressor::fit(&x, &y, BoostParams::default());
        let p = gb.predict(&x);
        let mse = p.iter().zip(&y).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / y.len() as f64;
        assert!(mse < 0.01, "mse = {mse}");
    }

    #[test]
    fn binary_classifier_separates_classes() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..30).map(|i| usize::from(i >= 15)).collect();
        let gb = GradientBoostingClassifier::fit(&x, &y, 2, BoostParams::default());
        let p = gb.predict_proba(&[vec![3.0], vec![25.0]]);
        assert!(p[0][0] > 0.9 && p[1][1] > 0.9);
    }

    #[test]
    fn multiclass_classifier_uses_one_tree_per_class() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let y: Vec<usize> = (0..30).map(|i| i / 10).collect();
        let params = BoostParams { n_estimators: 20, ..BoostParams::default() };
        let gb = GradientBoostingClassifier::fit(&x, &y, 3, params);
        assert!(gb.stages.iter().all(|s| s.len() == 3));
        let p = gb.predict_proba(&[vec![15.0]]);
        assert!((p[0].iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p[0][1] > p[0][0] && p[0][1] > p[0][2]);
    }
}
