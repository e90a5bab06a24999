pub mod sgd;
pub mod adam;

use serde::{Serialize, Deserialize};

use crate::error::{FitError, Result};
use crate::layers::dense::Layer;
use crate::math::matrix::Matrix;

pub use sgd::Sgd;
pub use adam::Adam;

/// One parameter update over every layer, given averaged gradients in
/// layer order as `(weights_grad, biases_grad)`.
pub trait Optimizer {
    fn step(&mut self, layers: &mut [Layer], grads: Vec<(Matrix, Matrix)>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

impl OptimizerKind {
    pub fn parse(name: &str) -> Result<OptimizerKind> {
        match name.trim().to_ascii_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "sgd" => Ok(OptimizerKind::Sgd),
            other => Err(FitError::InvalidConfig(format!("unknown optimizer '{other}'"))),
        }
    }

    pub fn build(self, learning_rate: f64, weight_decay: f64) -> Box<dyn Optimizer + Send> {
        match self {
            OptimizerKind::Adam => Box::new(Adam::new(learning_rate, weight_decay)),
            OptimizerKind::Sgd => Box::new(Sgd::new(learning_rate, weight_decay)),
        }
    }
}
