//! Brute-force k-nearest neighbours with Euclidean distance.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbors {
    k: usize,
    x: Vec<Vec<f64>>,
}

impl Neighbors {
    fn new(k: usize, x: &[Vec<f64>]) -> Neighbors {
        Neighbors { k: k.max(1), x: x.to_vec() }
    }

    /// Indices of the k nearest stored rows; ties keep the earlier row.
    fn nearest(&self, row: &[f64]) -> Vec<usize> {
        let mut dist: Vec<(f64, usize)> = self
            .x
            .iter()
            .enumerate()
            .map(|(i, r)| (r.iter().zip(row).map(|(a, b)| (a - b).powi(2)).sum::<f64>(), i))
            .collect();
        dist.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        dist.into_iter().take(self.k).map(|(_, i)| i).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnClassifier {
    neighbors: Neighbors,
    y: Vec<usize>,
    n_classes: usize,
}

impl KnnClassifier {
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, k: usize) -> KnnClassifier {
        KnnClassifier { neighbors: Neighbors::new(k, x), y: y.to_vec(), n_classes }
    }

    /// Uniform vote fractions among the k neighbours.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        x.iter()
            .map(|row| {
                let near = self.neighbors.nearest(row);
                let mut votes = vec![0.0; self.n_classes];
                for &i in &near {
                    if let Some(v) = votes.get_mut(self.y[i]) {
                        *v += 1.0;
                    }
                }
                let n = near.len().max(1) as f64;
                votes.into_iter().map(|v| v / n).collect()
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnRegressor {
    neighbors: Neighbors,
    y: Vec<f64>,
}

impl KnnRegressor {
    pub fn fit(x: &[Vec<f64>], y: &[f64], k: usize) -> KnnRegressor {
        KnnRegressor { neighbors: Neighbors::new(k, x), y: y.to_vec() }
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter()
            .map(|row| {
                let near = self.neighbors.nearest(row);
                near.iter().map(|&i| self.y[i]).sum::<f64>() / near.len().max(1) as f64
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn majority_of_neighbours_wins() {
        let x = vec![vec![0.0], vec![0.1], vec![0.2], vec![5.0], vec![5.1]];
        let knn = KnnClassifier::fit(&x, &[0, 0, 0, 1, 1], 2, 3);
        let p = knn.predict_proba(&[vec![0.05], vec![5.05]]);
        assert_eq!(p[0], vec![1.0, 0.0]);
        assert!((p[1][1] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn k_larger_than_training_set_uses_everything() {
        let x = vec![vec![0.0], vec![1.0]];
        let knn = KnnRegressor::fit(&x, &[2.0, 4.0], 7);
        assert_eq!(knn.predict(&[vec![0.0]]), vec![3.0]);
    }
}
