//! Kernel support vector machines trained by dual coordinate descent.
//!
//! The bias is absorbed into the kernel (`K(x, z) + 1`), which removes the
//! equality constraint from the dual and lets each coordinate be updated in
//! closed form. Kernel rows are computed on demand, so memory stays linear
//! in the number of training rows.

use serde::{Deserialize, Serialize};

use crate::activation::{sigmoid, softmax};
use crate::error::{FitError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Kernel {
    Linear,
    Rbf { gamma: f64 },
    Poly { gamma: f64, degree: i32 },
    Sigmoid { gamma: f64 },
}

/// How `gamma` was requested before it is resolved against the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma {
    /// `1 / (D * var(X))`
    Scale,
    /// `1 / D`
    Auto,
    Value(f64),
}

impl Gamma {
    pub fn parse(s: &str) -> Result<Gamma> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scale" => Ok(Gamma::Scale),
            "auto" => Ok(Gamma::Auto),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|g| g.is_finite() && *g > 0.0)
                .map(Gamma::Value)
                .ok_or_else(|| FitError::InvalidConfig(format!("gamma must be scale, auto or a positive number, got '{s}'"))),
        }
    }

    fn resolve(&self, x: &[Vec<f64>]) -> f64 {
        let d = x.first().map_or(1, Vec::len).max(1) as f64;
        match self {
            Gamma::Value(g) => *g,
            Gamma::Auto => 1.0 / d,
            Gamma::Scale => {
                let n = x.iter().map(Vec::len).sum::<usize>().max(1) as f64;
                let mean = x.iter().flatten().sum::<f64>() / n;
                let var = x.iter().flatten().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                if var > 0.0 { 1.0 / (d * var) } else { 1.0 }
            }
        }
    }
}

impl Kernel {
    /// Builds a kernel from its name; `degree` only applies to `poly`.
    pub fn from_name(name: &str, gamma: Gamma, degree: usize, x: &[Vec<f64>]) -> Result<Kernel> {
        let g = gamma.resolve(x);
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Kernel::Linear),
            "rbf" => Ok(Kernel::Rbf { gamma: g }),
            "poly" => Ok(Kernel::Poly { gamma: g, degree: degree.max(1) as i32 }),
            "sigmoid" => Ok(Kernel::Sigmoid { gamma: g }),
            other => Err(FitError::InvalidConfig(format!("unknown kernel '{other}'"))),
        }
    }

    pub fn eval(&self, a: &[f64], b: &[f64]) -> f64 {
        let dot = || a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();
        match *self {
            Kernel::Linear => dot(),
            Kernel::Rbf { gamma } => {
                let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
                (-gamma * d2).exp()
            }
            Kernel::Poly { gamma, degree } => (gamma * dot()).powi(degree),
            Kernel::Sigmoid { gamma } => (gamma * dot()).tanh(),
        }
    }

    /// Kernel with the bias feature folded in.
    fn eval_biased(&self, a: &[f64], b: &[f64]) -> f64 {
        self.eval(a, b) + 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvmParams {
    pub c: f64,
    pub epsilon: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for SvmParams {
    fn default() -> Self {
        SvmParams { c: 1.0, epsilon: 0.1, max_iter: 200, tol: 1e-3 }
    }
}

/// Support rows and their signed dual coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelMachine {
    kernel: Kernel,
    support: Vec<Vec<f64>>,
    coef: Vec<f64>,
}

impl KernelMachine {
    fn from_dual(kernel: Kernel, x: &[Vec<f64>], coef: &[f64]) -> KernelMachine {
        let (support, coef) = x
            .iter()
            .zip(coef)
            .filter(|(_, c)| **c != 0.0)
            .map(|(r, c)| (r.clone(), *c))
            .unzip();
        KernelMachine { kernel, support, coef }
    }

    pub fn decision(&self, row: &[f64]) -> f64 {
        self.support
            .iter()
            .zip(&self.coef)
            .map(|(s, c)| c * self.kernel.eval_biased(s, row))
            .sum()
    }

    pub fn n_support(&self) -> usize {
        self.support.len()
    }
}

/// Adds `delta * K(x_i, ·)` to the cached decision values.
fn update_decisions(kernel: &Kernel, x: &[Vec<f64>], i: usize, delta: f64, f: &mut [f64]) {
    for (k, row) in x.iter().enumerate() {
        f[k] += delta * kernel.eval_biased(&x[i], row);
    }
}

/// Hinge-loss dual for labels in {-1, +1}.
fn fit_binary(kernel: Kernel, x: &[Vec<f64>], y: &[f64], params: &SvmParams) -> KernelMachine {
    let n = x.len();
    let diag: Vec<f64> = x.iter().map(|r| kernel.eval_biased(r, r)).collect();
    let mut alpha = vec![0.0; n];
    let mut f = vec![0.0; n];

    for _ in 0..params.max_iter {
        let mut max_step: f64 = 0.0;
        for i in 0..n {
            if diag[i] <= 1e-12 {
                continue;
            }
            let grad = y[i] * f[i] - 1.0;
            let next = (alpha[i] - grad / diag[i]).clamp(0.0, params.c);
            let delta = next - alpha[i];
            if delta != 0.0 {
                alpha[i] = next;
                update_decisions(&kernel, x, i, delta * y[i], &mut f);
                max_step = max_step.max(delta.abs());
            }
        }
        if max_step < params.tol {
            break;
        }
    }

    let coef: Vec<f64> = alpha.iter().zip(y).map(|(a, y)| a * y).collect();
    KernelMachine::from_dual(kernel, x, &coef)
}

fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

/// Classifier: one machine for two classes, one-vs-rest otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svc {
    machines: Vec<KernelMachine>,
    n_classes: usize,
}

impl Svc {
    pub fn fit(kernel: Kernel, x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &SvmParams) -> Svc {
        let signed = |positive: usize| -> Vec<f64> {
            y.iter().map(|&c| if c == positive { 1.0 } else { -1.0 }).collect()
        };
        let machines = if n_classes <= 2 {
            vec![fit_binary(kernel, x, &signed(1), params)]
        } else {
            (0..n_classes).map(|c| fit_binary(kernel, x, &signed(c), params)).collect()
        };
        Svc { machines, n_classes: n_classes.max(2) }
    }

    /// Sigmoid of the margin for two classes, softmax over the one-vs-rest
    /// margins otherwise.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Vec<Vec<f64>> {
        x.iter()
            .map(|row| {
                let margins: Vec<f64> = self.machines.iter().map(|m| m.decision(row)).collect();
                if self.n_classes == 2 {
                    let p = sigmoid(margins[0]);
                    vec![1.0 - p, p]
                } else {
                    softmax(&margins)
                }
            })
            .collect()
    }
}

/// Epsilon-insensitive regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Svr {
    machine: KernelMachine,
}

impl Svr {
    pub fn fit(kernel: Kernel, x: &[Vec<f64>], y: &[f64], params: &SvmParams) -> Svr {
        let n = x.len();
        let diag: Vec<f64> = x.iter().map(|r| kernel.eval_biased(r, r)).collect();
        let mut beta = vec![0.0; n];
        let mut f = vec![0.0; n];

        for _ in 0..params.max_iter {
            let mut max_step: f64 = 0.0;
            for i in 0..n {
                if diag[i] <= 1e-12 {
                    continue;
                }
                // Prediction at i without its own contribution.
                let rest = f[i] - beta[i] * diag[i];
                let next = (soft_threshold(y[i] - rest, params.epsilon) / diag[i]).clamp(-params.c, params.c);
                let delta = next - beta[i];
                if delta != 0.0 {
                    beta[i] = next;
                    update_decisions(&kernel, x, i, delta, &mut f);
                    max_step = max_step.max(delta.abs());
                }
            }
            if max_step < params.tol {
                break;
            }
        }

        Svr { machine: KernelMachine::from_dual(kernel, x, &beta) }
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.machine.decision(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            let t = i as f64 * 0.05;
            x.push(vec![-1.0 + t, -1.0 - t]);
            y.push(0);
            x.push(vec![1.0 - t, 1.0 + t]);
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn gamma_parsing() {
        assert_eq!(Gamma::parse("scale").unwrap(), Gamma::Scale);
        assert_eq!(Gamma::parse("AUTO").unwrap(), Gamma::Auto);
        assert_eq!(Gamma::parse("0.5").unwrap(), Gamma::Value(0.5));
        assert!(Gamma::parse("-1").is_err());
    }

    #[test]
    fn auto_gamma_is_inverse_dimension() {
        let x = vec![vec![0.0; 4]];
        assert_eq!(Kernel::from_name("rbf", Gamma::Auto, 3, &x).unwrap(), Kernel::Rbf { gamma: 0.25 });
        assert!(Kernel::from_name("cubic", Gamma::Auto, 3, &x).is_err());
    }

    #[test]
    fn rbf_svc_separates_blobs() {
        let (x, y) = blobs();
        let kernel = Kernel::from_name("rbf", Gamma::Scale, 3, &x).unwrap();
        let svc = Svc::fit(kernel, &x, &y, 2, &SvmParams::default());
        let p = svc.predict_proba(&[vec![-1.2, -1.1], vec![1.1, 1.3]]);
        assert!(p[0][0] > 0.5 && p[1][1] > 0.5);
    }

    #[test]
    fn multiclass_svc_probabilities_sum_to_one() {
        let x = vec![vec![0.0], vec![0.1], vec![5.0], vec![5.1], vec![10.0], vec![10.1]];
        let y = vec![0, 0, 1, 1, 2, 2];
        let svc = Svc::fit(Kernel::Rbf { gamma: 0.5 }, &x, &y, 3, &SvmParams::default());
        let p = svc.predict_proba(&[vec![5.05]]);
        assert!((p[0].iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(crate::train::predictor::argmax(&p[0]), 1);
    }

    #[test]
    fn linear_svr_follows_a_line() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64 / 10.0 - 1.5]).collect();
        let y: Vec<f64> = x.iter().map(|r| 2.0 * r[0] + 1.0).collect();
        let params = SvmParams { c: 10.0, epsilon: 0.01, max_iter: 2000, tol: 1e-6 };
        let svr = Svr::fit(Kernel::Linear, &x, &y, &params);
        let p = svr.predict(&[vec![0.5]]);
        assert!((p[0] - 2.0).abs() < 0.25, "prediction {}", p[0]);
    }
}
