//! CART decision trees stored as a flat node arena.
//!
//! Classification trees split on Gini impurity and keep the class
//! distribution in each leaf; regression trees split on variance and keep
//! the leaf mean.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf { value: Vec<f64> },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features considered per split; `None` means all.
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams { max_depth: None, min_samples_split: 2, max_features: None, seed: 42 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

enum Criterion<'a> {
    Gini { y: &'a [usize], n_classes: usize },
    Variance { y: &'a [f64] },
}

impl Criterion<'_> {
    fn leaf_value(&self, samples: &[usize]) -> Vec<f64> {
        match self {
            Criterion::Gini { y, n_classes } => {
                let mut counts = vec![0.0; *n_classes];
                for &s in samples {
                    counts[y[s]] += 1.0;
                }
                let n = samples.len().max(1) as f64;
                counts.into_iter().map(|c| c / n).collect()
            }
            Criterion::Variance { y } => {
                let n = samples.len().max(1) as f64;
                vec![samples.iter().map(|&s| y[s]).sum::<f64>() / n]
            }
        }
    }

    fn is_pure(&self, samples: &[usize]) -> bool {
        match self {
            Criterion::Gini { y, .. } => samples.iter().all(|&s| y[s] == y[samples[0]]),
            Criterion::Variance { y } => samples.iter().all(|&s| y[s] == y[samples[0]]),
        }
    }

    /// Best (threshold, weighted child impurity) for samples sorted by the
    /// feature, or `None` if the feature is constant.
    fn best_threshold(&self, sorted: &[usize], values: &[f64]) -> Option<(f64, f64)> {
        let n = sorted.len();
        let mut best: Option<(f64, f64)> = None;
        match self {
            Criterion::Gini { y, n_classes } => {
                let mut right = vec![0.0; *n_classes];
                for &s in sorted {
                    right[y[s]] += 1.0;
                }
                let mut left = vec![0.0; *n_classes];
                let gini = |counts: &[f64], total: f64| {
                    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
                };
                for i in 0..n - 1 {
                    let cls = y[sorted[i]];
                    left[cls] += 1.0;
                    right[cls] -= 1.0;
                    if values[i] == values[i + 1] {
                        continue;
                    }
                    let nl = (i + 1) as f64;
                    let nr = (n - i - 1) as f64;
                    let impurity = (nl * gini(left.as_slice(), nl) + nr * gini(right.as_slice(), nr)) / n as f64;
                    if best.map_or(true, |(_, b)| impurity < b) {
                        best = Some(((values[i] + values[i + 1]) / 2.0, impurity));
                    }
                }
            }
            Criterion::Variance { y } => {
                let (mut rs, mut rq) = (0.0, 0.0);
                for &s in sorted {
                    rs += y[s];
                    rq += y[s] * y[s];
                }
                let (mut ls, mut lq) = (0.0, 0.0);
                for i in 0..n - 1 {
                    let v = y[sorted[i]];
                    ls += v;
                    lq += v * v;
                    rs -= v;
                    rq -= v * v;
                    if values[i] == values[i + 1] {
                        continue;
                    }
                    let nl = (i + 1) as f64;
                    let nr = (n - i - 1) as f64;
                    // n·var = Σy² - (Σy)²/n
                    let sse = (lq - ls * ls / nl) + (rq - rs * rs / nr);
                    let impurity = sse / n as f64;
                    if best.map_or(true, |(_, b)| impurity < b) {
                        best = Some(((values[i] + values[i + 1]) / 2.0, impurity));
                    }
                }
            }
        }
        best
    }
}

impl DecisionTree {
    pub fn fit_classifier(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: TreeParams) -> DecisionTree {
        let samples: Vec<usize> = (0..x.len()).collect();
        DecisionTree::fit_classifier_on(x, y, n_classes, &samples, params)
    }

    /// Fits on a subset (possibly with repeats) of the rows.
    pub fn fit_classifier_on(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        samples: &[usize],
        params: TreeParams,
    ) -> DecisionTree {
        let n_classes = y.iter().map(|&c| c + 1).max().unwrap_or(0).max(n_classes).max(1);
        build(x, &Criterion::Gini { y, n_classes }, samples, params)
    }

    pub fn fit_regressor(x: &[Vec<f64>], y: &[f64], params: TreeParams) -> DecisionTree {
        let samples: Vec<usize> = (0..x.len()).collect();
        DecisionTree::fit_regressor_on(x, y, &samples, params)
    }

    pub fn fit_regressor_on(x: &[Vec<f64>], y: &[f64], samples: &[usize], params: TreeParams) -> DecisionTree {
        build(x, &Criterion::Variance { y }, samples, params)
    }

    /// Index of the leaf node `row` falls into.
    pub fn leaf_index(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { .. } => return idx,
                Node::Split { feature, threshold, left, right } => {
                    let v = row.get(*feature).copied().unwrap_or(0.0);
                    idx = if v <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Leaf payload: class distribution or `[mean]`.
    pub fn predict_row(&self, row: &[f64]) -> &[f64] {
        match &self.nodes[self.leaf_index(row)] {
            Node::Leaf { value } => value,
            Node::Split { .. } => &[],
        }
    }

    pub fn predict_value(&self, row: &[f64]) -> f64 {
        self.predict_row(row).first().copied().unwrap_or(0.0)
    }

    /// Overwrites a leaf's payload with a single value.
    pub fn set_leaf_value(&mut self, leaf: usize, v: f64) {
        if let Some(Node::Leaf { value }) = self.nodes.get_mut(leaf) {
            *value = vec![v];
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| matches!(n, Node::Leaf { .. }).then_some(i))
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            max = max.max(d);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, d + 1));
                stack.push((*right, d + 1));
            }
        }
        max
    }
}

/// Iterative depth-first build; each pending entry owns its sample list.
fn build(x: &[Vec<f64>], criterion: &Criterion<'_>, samples: &[usize], params: TreeParams) -> DecisionTree {
    let n_features = x.first().map_or(0, Vec::len);
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut nodes = vec![Node::Leaf { value: criterion.leaf_value(samples) }];
    let mut pending: Vec<(usize, Vec<usize>, usize)> = vec![(0, samples.to_vec(), 0)];
    let mut features: Vec<usize> = (0..n_features).collect();

    while let Some((node_idx, idx, depth)) = pending.pop() {
        let depth_ok = params.max_depth.map_or(true, |d| depth < d);
        if !depth_ok || idx.len() < params.min_samples_split.max(2) || criterion.is_pure(&idx) {
            continue;
        }

        let candidates: &[usize] = match params.max_features {
            Some(k) if k < n_features => {
                features.shuffle(&mut rng);
                &features[..k.max(1)]
            }
            _ => &features,
        };

        let mut best: Option<(usize, f64, f64)> = None;
        for &f in candidates {
            let mut sorted = idx.clone();
            sorted.sort_by(|&a, &b| x[a][f].total_cmp(&x[b][f]));
            let values: Vec<f64> = sorted.iter().map(|&s| x[s][f]).collect();
            if let Some((threshold, impurity)) = criterion.best_threshold(&sorted, &values) {
                if best.map_or(true, |(_, _, b)| impurity < b) {
                    best = Some((f, threshold, impurity));
                }
            }
        }

        let Some((feature, threshold, _)) = best else { continue };
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            idx.iter().partition(|&&s| x[s][feature] <= threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            continue;
        }

        let left = nodes.len();
        nodes.push(Node::Leaf { value: criterion.leaf_value(&left_idx) });
        let right = nodes.len();
        nodes.push(Node::Leaf { value: criterion.leaf_value(&right_idx) });
        nodes[node_idx] = Node::Split { feature, threshold, left, right };

        pending.push((right, right_idx, depth + 1));
        pending.push((left, left_idx, depth + 1));
    }

    DecisionTree { nodes, n_features }
}
