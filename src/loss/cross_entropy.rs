use crate::activation::activation::softmax;

/// Categorical cross-entropy over logits (softmax applied internally).
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// L = -Σ expected[i] · log(softmax(logits)[i] + ε)
    ///
    /// `expected` is a one-hot target distribution, shape [n_classes].
    pub fn loss(logits: &[f64], expected: &[f64]) -> f64 {
        softmax(logits).iter().zip(expected.iter())
            .map(|(p, e)| -e * (p + EPS).ln())
            .sum()
    }

    /// Gradient of softmax + cross-entropy w.r.t. the logits:
    ///   ∂L/∂z_i = softmax(z)[i] - expected[i]
    pub fn derivative(logits: &[f64], expected: &[f64]) -> Vec<f64> {
        softmax(logits).iter().zip(expected.iter())
            .map(|(p, e)| p - e)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_logits_cost_ln_c() {
        let l = CrossEntropyLoss::loss(&[0.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert!((l - 3f64.ln()).abs() < 1e-9);
    }

    #[test]
    fn gradient_sums_to_zero() {
        let g = CrossEntropyLoss::derivative(&[0.3, -1.2, 2.0], &[1.0, 0.0, 0.0]);
        assert!(g.iter().sum::<f64>().abs() < 1e-12);
        assert!(g[0] < 0.0);
    }
}
