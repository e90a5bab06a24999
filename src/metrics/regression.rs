use serde::{Deserialize, Serialize};

/// Below this total sum of squares the target is treated as constant.
const SS_TOT_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub r2: f64,
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    pub n: usize,
}

/// Coefficient of determination, 0 when the true values are all equal.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot < SS_TOT_FLOOR {
        return 0.0;
    }
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).powi(2)).sum();
    1.0 - ss_res / ss_tot
}

impl RegressionMetrics {
    pub fn compute(y_true: &[f64], y_pred: &[f64]) -> RegressionMetrics {
        let n = y_true.len();
        let denom = n.max(1) as f64;
        let mae = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).abs()).sum::<f64>() / denom;
        let mse = y_true.iter().zip(y_pred).map(|(y, p)| (y - p).powi(2)).sum::<f64>() / denom;
        RegressionMetrics { r2: r2_score(y_true, y_pred), mae, mse, rmse: mse.sqrt(), n }
    }

    pub fn render(&self) -> String {
        [
            "=== Regression Metrics ===".to_string(),
            format!("R^2  : {:.6}", self.r2),
            format!("MAE  : {:.6}", self.mae),
            format!("MSE  : {:.6}", self.mse),
            format!("RMSE : {:.6}", self.rmse),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_fit_scores_one() {
        let y = [1.0, 2.0, 4.0];
        assert_eq!(r2_score(&y, &y), 1.0);
    }

    #[test]
    fn predicting_the_mean_scores_zero() {
        let y = [1.0, 2.0, 3.0];
        assert!(r2_score(&y, &[2.0, 2.0, 2.0]).abs() < 1e-12);
    }

    #[test]
    fn constant_target_scores_zero() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 0.0);
    }

    #[test]
    fn rmse_is_root_of_mse() {
        let m = RegressionMetrics::compute(&[0.0, 0.0], &[3.0, -1.0]);
        assert_eq!(m.mae, 2.0);
        assert_eq!(m.mse, 5.0);
        assert!((m.rmse - 5f64.sqrt()).abs() < 1e-12);
        assert!(m.render().starts_with("=== Regression Metrics ==="));
    }
}
