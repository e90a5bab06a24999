//! Bagged ensembles of CART trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::classical::tree::{DecisionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams { n_estimators: 200, max_depth: None, seed: 42 }
    }
}

fn bootstrap(n: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForestClassifier {
    /// Each tree sees a bootstrap sample and √D features per split.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: ForestParams) -> RandomForestClassifier {
        let d = x.first().map_or(0, Vec::len);
        let max_features = ((d as f64).sqrt().floor() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let sample = bootstrap(x.len(), &mut rng);
                let tree_params = TreeParams {
                    max_depth: params.max_depth,
                    max_features: Some(max_features),
                    seed: rng.gen(),
                    ..TreeParams::default()
                };
                DecisionTree::fit_classifier_on(x, y, n_classes, &sample, tree_params)
            })
            .collect();
        RandomForestClassifier { trees, n_classes }
    }

    /// Mean of the trees' leaf class distributions.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let k = self.trees.len().max(1) as f64;
        x.iter()
            .map(|row| {
                let mut acc = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    for (a, p) in acc.iter_mut().zip(tree.predict_row(row)) {
                        *a += p;
                    }
                }
                acc.into_iter().map(|v| v / k).collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTree>,
}

impl RandomForestRegressor {
    /// Each tree sees a bootstrap sample and every feature.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: ForestParams) -> RandomForestRegressor {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let sample = bootstrap(x.len(), &mut rng);
                let tree_params = TreeParams { max_depth: params.max_depth, seed: rng.gen(), ..TreeParams::default() };
                DecisionTree::fit_regressor_on(x, y, &sample, tree_params)
            })
            .collect();
        RandomForestRegressor { trees }
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        let k = self.trees.len().max(1) as f64;
        x.iter()
            .map(|row| self.trees.iter().map(|t| t.predict_value(row)).sum::<f64>() / k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forest_probabilities_sum_to_one() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, (i % 3) as f64]).collect();
        let y: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        let params = ForestParams { n_estimators: 15, ..ForestParams::default() };
        let rf = RandomForestClassifier::fit(&x, &y, 2, params);
        let p = rf.predict_proba(&[vec![1.0, 1.0], vec![18.0, 0.0]]);
        for row in &p {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
        assert!(p[0][0] > 0.5 && p[1][1] > 0.5);
    }

    #[test]
    fn forest_regression_tracks_a_step() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| if i < 15 { 0.0 } else { 10.0 }).collect();
        let rf = RandomForestRegressor::fit(&x, &y, ForestParams { n_estimators: 20, ..ForestParams::default() });
        let p = rf.predict(&[vec![2.0], vec![27.0]]);
        assert!(p[0] < 2.0 && p[1] > 8.0);
    }
}
