//! Gaussian naive Bayes.

use serde::{Deserialize, Serialize};

use crate::activation::softmax;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaussianNb {
    /// Per class: `None` when the class had no training rows.
    classes: Vec<Option<ClassStats>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ClassStats {
    log_prior: f64,
    mean: Vec<f64>,
    var: Vec<f64>,
}

impl GaussianNb {
    /// `var_smoothing` is scaled by the largest per-feature variance and
    /// added to every class variance.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, var_smoothing: f64) -> GaussianNb {
        let d = x.first().map_or(0, Vec::len);
        let n = x.len().max(1) as f64;

        let max_var = (0..d)
            .map(|j| {
                let mu = x.iter().map(|r| r[j]).sum::<f64>() / n;
                x.iter().map(|r| (r[j] - mu).powi(2)).sum::<f64>() / n
            })
            .fold(0.0, f64::max);
        let epsilon = var_smoothing * max_var.max(f64::MIN_POSITIVE);

        let n_classes = y.iter().map(|&c| c + 1).max().unwrap_or(0).max(n_classes);
        let classes = (0..n_classes)
            .map(|c| {
                let rows: Vec<&Vec<f64>> = x.iter().zip(y).filter(|(_, &l)| l == c).map(|(r, _)| r).collect();
                if rows.is_empty() {
                    return None;
                }
                let m = rows.len() as f64;
                let mean: Vec<f64> = (0..d).map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / m).collect();
                let var: Vec<f64> = (0..d)
                    .map(|j| rows.iter().map(|r| (r[j] - mean[j]).powi(2)).sum::<f64>() / m + epsilon)
                    .collect();
                Some(ClassStats { log_prior: (m / n).ln(), mean, var })
            })
            .collect();
        GaussianNb { classes }
    }

    fn joint_log_likelihood(&self, row: &[f64]) -> Vec<f64> {
        self.classes
            .iter()
            .map(|stats| match stats {
                None => f64::NEG_INFINITY,
                Some(s) => {
                    let ll: f64 = row
                        .iter()
                        .zip(s.mean.iter().zip(&s.var))
                        .map(|(v, (mu, var))| {
                            -0.5 * (2.0 * std::f64::consts::PI * var).ln() - (v - mu).powi(2) / (2.0 * var)
                        })
                        .sum();
                    s.log_prior + ll
                }
            })
            .collect()
    }

    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        x.iter().map(|row| softmax(&self.joint_log_likelihood(row))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated_gaussians_are_classified() {
        let x = vec![vec![0.0], vec![0.2], vec![-0.1], vec![5.0], vec![5.3], vec![4.9]];
        let nb = GaussianNb::fit(&x, &[0, 0, 0, 1, 1, 1], 2, 1e-9);
        let p = nb.predict_proba(&[vec![0.1], vec![5.1]]);
        assert!(p[0][0] > 0.99 && p[1][1] > 0.99);
    }

    #[test]
    fn empty_class_gets_zero_probability() {
        let x = vec![vec![0.0], vec![1.0]];
        let nb = GaussianNb::fit(&x, &[0, 0], 3, 1e-9);
        let p = nb.predict_proba(&[vec![0.5]]);
        assert_eq!(p[0][1], 0.0);
        assert!((p[0][0] - 1.0).abs() < 1e-12);
    }
}
