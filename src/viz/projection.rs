//! Two-dimensional embeddings for plotting data with more than two
//! features.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FitError;

/// Above this many rows the exact t-SNE is replaced by PCA.
pub const TSNE_MAX_ROWS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// First two features.
    None,
    #[default]
    Pca2,
    Tsne2,
}

impl FromStr for Projection {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Projection::None),
            "pca2" | "pca" => Ok(Projection::Pca2),
            "tsne2" | "tsne" => Ok(Projection::Tsne2),
            other => Err(FitError::InvalidConfig(format!("unknown projection '{other}' (none, pca2, tsne2)"))),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Projection::None => "none",
            Projection::Pca2 => "pca2",
            Projection::Tsne2 => "tsne2",
        })
    }
}

impl Projection {
    /// Embeds every row in two dimensions.
    pub fn project(&self, x: &[Vec<f64>], seed: u64) -> Vec<[f64; 2]> {
        match self {
            Projection::None => first_two(x),
            Projection::Pca2 => pca2(x),
            Projection::Tsne2 if x.len() > TSNE_MAX_ROWS => {
                warn!(rows = x.len(), limit = TSNE_MAX_ROWS, "too many rows for t-SNE; using PCA");
                pca2(x)
            }
            Projection::Tsne2 => tsne2(x, seed),
        }
    }
}

fn first_two(x: &[Vec<f64>]) -> Vec<[f64; 2]> {
    x.iter()
        .map(|r| [r.first().copied().unwrap_or(0.0), r.get(1).copied().unwrap_or(0.0)])
        .collect()
}

// ---------------------------------------------------------------------------
// PCA
// ---------------------------------------------------------------------------

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn normalize(v: &mut [f64]) -> f64 {
    let norm = dot(v, v).sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    norm
}

fn remove_component(v: &mut [f64], axis: Option<&[f64]>) {
    if let Some(axis) = axis {
        let c = dot(v, axis);
        v.iter_mut().zip(axis).for_each(|(x, a)| *x -= c * a);
    }
}

/// Leading eigenvector of a symmetric matrix by power iteration, kept
/// orthogonal to `orth` when given.
fn leading_eigenvector(cov: &[Vec<f64>], orth: Option<&[f64]>) -> Vec<f64> {
    let d = cov.len();
    let mut v: Vec<f64> = (0..d).map(|i| 1.0 + (i % 3) as f64 * 0.25).collect();
    remove_component(&mut v, orth);
    if normalize(&mut v) == 0.0 {
        v = (0..d).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        remove_component(&mut v, orth);
        normalize(&mut v);
    }
    for _ in 0..300 {
        let mut next: Vec<f64> = cov.iter().map(|row| dot(row, &v)).collect();
        remove_component(&mut next, orth);
        if normalize(&mut next) == 0.0 {
            break;
        }
        let delta: f64 = next.iter().zip(&v).map(|(a, b)| (a - b).abs()).sum();
        v = next;
        if delta < 1e-10 {
            break;
        }
    }
    v
}

/// Projection onto the top two principal components of the centred data.
pub fn pca2(x: &[Vec<f64>]) -> Vec<[f64; 2]> {
    let n = x.len();
    let d = x.first().map_or(0, Vec::len);
    if n == 0 || d < 2 {
        return first_two(x);
    }

    let mean: Vec<f64> = (0..d).map(|j| x.iter().map(|r| r[j]).sum::<f64>() / n as f64).collect();
    let centred: Vec<Vec<f64>> = x.iter().map(|r| r.iter().zip(&mean).map(|(v, m)| v - m).collect()).collect();

    let mut cov = vec![vec![0.0; d]; d];
    for r in &centred {
        for i in 0..d {
            for j in i..d {
                cov[i][j] += r[i] * r[j];
            }
        }
    }
    for i in 0..d {
        for j in i..d {
            cov[i][j] /= n as f64;
            cov[j][i] = cov[i][j];
        }
    }

    let first = leading_eigenvector(&cov, None);
    let lambda = dot(&first, &cov.iter().map(|row| dot(row, &first)).collect::<Vec<_>>());
    for i in 0..d {
        for j in 0..d {
            cov[i][j] -= lambda * first[i] * first[j];
        }
    }
    let second = leading_eigenvector(&cov, Some(&first));
    debug!(lambda, "pca projection");

    centred.iter().map(|r| [dot(r, &first), dot(r, &second)]).collect()
}

// ---------------------------------------------------------------------------
// t-SNE
// ---------------------------------------------------------------------------

const TSNE_ITERATIONS: usize = 300;
const EXAGGERATION_ITERATIONS: usize = 100;
const EARLY_EXAGGERATION: f64 = 12.0;

/// Conditional probabilities for row `i` at precision `beta`; returns the
/// row and its entropy.
fn conditional_row(d2: &[f64], i: usize, beta: f64) -> (Vec<f64>, f64) {
    let mut p: Vec<f64> = d2.iter().enumerate().map(|(j, &d)| if j == i { 0.0 } else { (-d * beta).exp() }).collect();
    let sum: f64 = p.iter().sum::<f64>().max(1e-300);
    let mut entropy = 0.0;
    for pj in p.iter_mut() {
        *pj /= sum;
        if *pj > 1e-300 {
            entropy -= *pj * pj.ln();
        }
    }
    (p, entropy)
}

/// Symmetric joint probabilities with each row calibrated to `perplexity`.
fn joint_probabilities(x: &[Vec<f64>], perplexity: f64) -> Vec<Vec<f64>> {
    let n = x.len();
    let d2: Vec<Vec<f64>> = x
        .iter()
        .map(|a| x.iter().map(|b| a.iter().zip(b).map(|(u, v)| (u - v).powi(2)).sum()).collect())
        .collect();
    let target = perplexity.ln();

    let mut cond = Vec::with_capacity(n);
    for i in 0..n {
        let (mut lo, mut hi, mut beta) = (0.0f64, f64::INFINITY, 1.0f64);
        let (mut row, mut h) = conditional_row(&d2[i], i, beta);
        for _ in 0..64 {
            if (h - target).abs() < 1e-5 {
                break;
            }
            if h > target {
                lo = beta;
                beta = if hi.is_finite() { (beta + hi) / 2.0 } else { beta * 2.0 };
            } else {
                hi = beta;
                beta = (beta + lo) / 2.0;
            }
            (row, h) = conditional_row(&d2[i], i, beta);
        }
        cond.push(row);
    }

    let mut p = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            p[i][j] = ((cond[i][j] + cond[j][i]) / (2.0 * n as f64)).max(1e-12);
        }
    }
    p
}

/// Exact t-SNE with early exaggeration, momentum and per-coordinate gains.
pub fn tsne2(x: &[Vec<f64>], seed: u64) -> Vec<[f64; 2]> {
    let n = x.len();
    if n < 3 {
        return pca2(x);
    }
    let perplexity = (30.0f64).min((n - 1) as f64 / 3.0).max(1.0);
    let p = joint_probabilities(x, perplexity);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut y: Vec<[f64; 2]> = (0..n).map(|_| [rng.gen_range(-1e-2..1e-2), rng.gen_range(-1e-2..1e-2)]).collect();
    let mut velocity = vec![[0.0; 2]; n];
    let mut gains = vec![[1.0; 2]; n];
    // Step size scales with n so the exaggerated attraction cannot overshoot
    // on small inputs.
    let learning_rate = (n as f64 / (4.0 * EARLY_EXAGGERATION)).max(1.0);

    for iter in 0..TSNE_ITERATIONS {
        let exaggeration = if iter < EXAGGERATION_ITERATIONS { EARLY_EXAGGERATION } else { 1.0 };
        let momentum = if iter < EXAGGERATION_ITERATIONS { 0.5 } else { 0.8 };

        let mut kernel = vec![vec![0.0; n]; n];
        let mut z = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                let d = (y[i][0] - y[j][0]).powi(2) + (y[i][1] - y[j][1]).powi(2);
                let k = 1.0 / (1.0 + d);
                kernel[i][j] = k;
                kernel[j][i] = k;
                z += 2.0 * k;
            }
        }
        let z = z.max(1e-300);

        for i in 0..n {
            let mut grad = [0.0; 2];
            for j in 0..n {
                if i == j {
                    continue;
                }
                let k = kernel[i][j];
                let coeff = 4.0 * (exaggeration * p[i][j] - k / z) * k;
                grad[0] += coeff * (y[i][0] - y[j][0]);
                grad[1] += coeff * (y[i][1] - y[j][1]);
            }
            for c in 0..2 {
                let same_sign = (grad[c] > 0.0) == (velocity[i][c] > 0.0);
                gains[i][c] = if same_sign { (gains[i][c] * 0.8f64).max(0.01) } else { gains[i][c] + 0.2 };
                velocity[i][c] = momentum * velocity[i][c] - learning_rate * gains[i][c] * grad[c];
            }
        }
        let mut mean = [0.0; 2];
        for (yi, vi) in y.iter_mut().zip(&velocity) {
            yi[0] += vi[0];
            yi[1] += vi[1];
            mean[0] += yi[0] / n as f64;
            mean[1] += yi[1] / n as f64;
        }
        for yi in y.iter_mut() {
            yi[0] -= mean[0];
            yi[1] -= mean[1];
        }
    }
    y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names() {
        assert_eq!("PCA2".parse::<Projection>().unwrap(), Projection::Pca2);
        assert_eq!("tsne2".parse::<Projection>().unwrap(), Projection::Tsne2);
        assert!("umap".parse::<Projection>().is_err());
        assert_eq!(Projection::default().to_string(), "pca2");
    }

    #[test]
    fn pca_finds_the_dominant_axis() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 0.5, i as f64 * 0.01 * (i % 2) as f64]).collect();
        let y = pca2(&x);
        assert_eq!(y.len(), 20);
        let spread = |k: usize| {
            let (lo, hi) = y.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| (lo.min(p[k]), hi.max(p[k])));
            hi - lo
        };
        assert!((spread(0) - 19.0).abs() < 0.1);
        assert!(spread(1) < 1.0);
    }

    #[test]
    fn none_takes_first_two_features() {
        let y = Projection::None.project(&[vec![1.0, 2.0, 3.0]], 0);
        assert_eq!(y, vec![[1.0, 2.0]]);
    }

    #[test]
    fn tsne_separates_clusters() {
        let mut x = Vec::new();
        for i in 0..15 {
            let e = i as f64 * 0.01;
            x.push(vec![e, 0.0, 0.0]);
            x.push(vec![10.0 + e, 10.0, 10.0]);
        }
        let y = tsne2(&x, 5);
        let centre = |parity: usize| {
            let pts: Vec<&[f64; 2]> = y.iter().enumerate().filter(|(i, _)| i % 2 == parity).map(|(_, p)| p).collect();
            let n = pts.len() as f64;
            [pts.iter().map(|p| p[0]).sum::<f64>() / n, pts.iter().map(|p| p[1]).sum::<f64>() / n]
        };
        let (a, b) = (centre(0), centre(1));
        let between = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
        let within = y
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let c = if i % 2 == 0 { a } else { b };
                ((p[0] - c[0]).powi(2) + (p[1] - c[1]).powi(2)).sqrt()
            })
            .fold(0.0, f64::max);
        assert!(between > within, "between {between} within {within}");
    }

    #[test]
    fn tsne_output_is_centred_and_finite() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![(i % 5) as f64, (i / 5) as f64, (i % 3) as f64]).collect();
        let y = tsne2(&x, 11);
        assert_eq!(y.len(), 40);
        assert!(y.iter().all(|p| p[0].is_finite() && p[1].is_finite()));
        let mx = y.iter().map(|p| p[0]).sum::<f64>() / 40.0;
        let my = y.iter().map(|p| p[1]).sum::<f64>() / 40.0;
        assert!(mx.abs() < 1e-9 && my.abs() < 1e-9);
    }
}
