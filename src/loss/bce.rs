use crate::activation::activation::sigmoid;

/// Binary cross-entropy on raw logits, averaged over outputs.
///
/// Used for binary classification (one logit) and multilabel
/// classification (one logit per label).
pub struct BceWithLogitsLoss;

impl BceWithLogitsLoss {
    /// Stable form: max(z, 0) - z·y + ln(1 + e^{-|z|})
    pub fn loss(logits: &[f64], expected: &[f64]) -> f64 {
        let n = logits.len().max(1) as f64;
        logits.iter().zip(expected.iter())
            .map(|(&z, &y)| z.max(0.0) - z * y + (-z.abs()).exp().ln_1p())
            .sum::<f64>() / n
    }

    /// Per-logit gradient: (σ(z) - y) / n
    pub fn derivative(logits: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = logits.len().max(1) as f64;
        logits.iter().zip(expected.iter())
            .map(|(&z, &y)| (sigmoid(z) - y) / n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_logit_costs_ln2() {
        let l = BceWithLogitsLoss::loss(&[0.0], &[1.0]);
        assert!((l - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[test]
    fn large_logits_stay_finite() {
        assert!(BceWithLogitsLoss::loss(&[1e4, -1e4], &[0.0, 1.0]).is_finite());
        let g = BceWithLogitsLoss::derivative(&[1e4], &[1.0]);
        assert!(g[0].abs() < 1e-9);
    }
}
