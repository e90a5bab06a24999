use serde::{Serialize, Deserialize};

/// Element-wise activations used by hidden and output layers.
///
/// Output layers always use `Identity`: the network emits logits and the
/// loss (or the predictor) applies sigmoid / softmax where needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationFunction {
    ReLU,
    Tanh,
    Identity,
}

impl ActivationFunction {
    /// Maps the `activation` hyperparameter to a hidden-layer activation.
    /// Anything other than `relu` selects Tanh.
    pub fn hidden_from_name(name: &str) -> ActivationFunction {
        if name.trim().eq_ignore_ascii_case("relu") {
            ActivationFunction::ReLU
        } else {
            ActivationFunction::Tanh
        }
    }

    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::Identity => x,
        }
    }

    /// Derivative evaluated at the pre-activation value `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::Identity => 1.0,
        }
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Softmax over a logit vector, shifted by the max for stability.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return vec![1.0 / logits.len().max(1) as f64; logits.len()];
    }
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_symmetric_and_bounded() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0 && sigmoid(800.0) <= 1.0);
    }

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[1000.0, 1001.0, 999.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p[1] > p[0] && p[0] > p[2]);
    }

    #[test]
    fn hidden_activation_defaults_to_tanh() {
        assert_eq!(ActivationFunction::hidden_from_name("RELU"), ActivationFunction::ReLU);
        assert_eq!(ActivationFunction::hidden_from_name("gelu"), ActivationFunction::Tanh);
    }
}
