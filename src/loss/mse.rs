pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len().max(1) as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Per-output gradient of the mean: 2(predicted - expected) / n
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = predicted.len().max(1) as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| 2.0 * (a - b) / n)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_prediction_has_zero_loss_and_gradient() {
        assert_eq!(MseLoss::loss(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
        assert_eq!(MseLoss::derivative(&[1.0, 2.0], &[1.0, 2.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn gradient_points_towards_target() {
        assert_eq!(MseLoss::loss(&[3.0], &[1.0]), 4.0);
        assert_eq!(MseLoss::derivative(&[3.0], &[1.0]), vec![4.0]);
    }
}
