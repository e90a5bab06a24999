//! Regression through classification: bucket the target by quantiles,
//! classify into a bucket, predict the bucket mean.

use serde::{Deserialize, Serialize};

use crate::classical::naive_bayes::GaussianNb;
use crate::train::predictor::argmax;

/// Quantile of sorted data with linear interpolation between neighbours.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Bin edges for `y`: deduplicated quantiles, or evenly spaced edges over
/// `[min, max]` when fewer than three distinct quantile edges survive.
pub fn bin_edges(y: &[f64], n_bins: usize) -> Vec<f64> {
    let n_bins = n_bins.max(2);
    let mut sorted: Vec<f64> = y.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return vec![0.0, 1.0];
    }
    sorted.sort_by(f64::total_cmp);

    let mut edges: Vec<f64> = (0..=n_bins).map(|i| quantile(&sorted, i as f64 / n_bins as f64)).collect();
    edges.dedup();
    if edges.len() >= 3 {
        return edges;
    }

    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let step = (max - min) / n_bins as f64;
    (0..=n_bins).map(|i| min + step * i as f64).collect()
}

/// Bucket index: number of inner edges strictly below `v`.
pub fn bin_index(edges: &[f64], v: f64) -> usize {
    let last = edges.len().saturating_sub(2);
    let inner = &edges[1..edges.len().saturating_sub(1).max(1)];
    inner.iter().filter(|&&e| e < v).count().min(last)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedRegressor {
    edges: Vec<f64>,
    bin_means: Vec<f64>,
    classifier: GaussianNb,
}

impl BinnedRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], n_bins: usize, var_smoothing: f64) -> BinnedRegressor {
        let edges = bin_edges(y, n_bins);
        let n_buckets = edges.len() - 1;
        let labels: Vec<usize> = y.iter().map(|&v| bin_index(&edges, v)).collect();

        let bin_means = (0..n_buckets)
            .map(|b| {
                let members: Vec<f64> = y.iter().zip(&labels).filter(|(_, &l)| l == b).map(|(v, _)| *v).collect();
                if members.is_empty() {
                    (edges[b] + edges[b + 1]) / 2.0
                } else {
                    members.iter().sum::<f64>() / members.len() as f64
                }
            })
            .collect();

        let classifier = GaussianNb::fit(x, &labels, n_buckets, var_smoothing);
        BinnedRegressor { edges, bin_means, classifier }
    }

    pub fn n_bins(&self) -> usize {
        self.bin_means.len()
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        self.classifier
            .predict_proba(x)
            .iter()
            .map(|p| self.bin_means[argmax(p).min(self.bin_means.len() - 1)])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_matches_linear_interpolation() {
        let s = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&s, 0.5), 2.5);
        assert_eq!(quantile(&s, 0.0), 1.0);
        assert_eq!(quantile(&s, 1.0), 4.0);
    }

    #[test]
    fn skewed_target_falls_back_to_uniform_edges() {
        let mut y = vec![0.0; 98];
        y.extend([5.0, 10.0]);
        let edges = bin_edges(&y, 10);
        assert_eq!(edges.len(), 11);
        assert_eq!(edges[0], 0.0);
        assert_eq!(edges[10], 10.0);
        assert!((edges[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bin_index_clips_to_range() {
        let edges = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(bin_index(&edges, -5.0), 0);
        assert_eq!(bin_index(&edges, 1.0), 0);
        assert_eq!(bin_index(&edges, 1.5), 1);
        assert_eq!(bin_index(&edges, 99.0), 2);
    }

    #[test]
    fn predicts_bucket_means() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![if i < 20 { 0.0 } else { 10.0 } + (i % 5) as f64 * 0.1]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 1.0 } else { 9.0 }).collect();
        let reg = BinnedRegressor::fit(&x, &y, 4, 1e-9);
        let p = reg.predict(&[vec![0.2], vec![10.2]]);
        assert_eq!(p, vec![1.0, 9.0]);
    }
}
