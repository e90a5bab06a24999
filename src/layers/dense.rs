use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

/// Fully connected layer. Weights are stored input × output so a forward
/// pass is `row · W + b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    #[serde(skip)]
    pub neurons: Matrix,
    #[serde(skip)]
    pre_neurons: Matrix,  // pre-activation values (z = Wx + b) needed for correct derivative
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    /// He initialisation before ReLU, Xavier otherwise; biases start at zero.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Layer {
        let weights = match activation {
            ActivationFunction::ReLU => Matrix::he(input_size, size, rng),
            _ => Matrix::xavier(input_size, size, rng),
        };

        Layer {
            size,
            neurons: Matrix::zeros(1, size),
            pre_neurons: Matrix::zeros(1, size),
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// Forward pass that caches z and a for the backward pass.
    pub fn feed_from(&mut self, input: &[f64]) -> Vec<f64> {
        let z = Matrix::row_vector(input).dot(&self.weights) + self.biases.clone();
        let a = z.map(|x| self.activator.function(x));
        self.pre_neurons = z;
        self.neurons = a.clone();
        a.data.into_iter().next().unwrap_or_default()
    }

    /// Forward pass that leaves the layer untouched.
    pub fn evaluate(&self, input: &[f64]) -> Vec<f64> {
        let z = Matrix::row_vector(input).dot(&self.weights) + self.biases.clone();
        z.data[0].iter().map(|&x| self.activator.function(x)).collect()
    }

    /// Computes gradient adjustments. Returns (weights_grad, biases_grad).
    /// `next_layer_delta` is ∂L/∂a for this layer (error in activation space).
    pub fn compute_gradients(
        &self,
        next_layer_delta: Matrix,
        inputs: &Matrix,
    ) -> (Matrix, Matrix) {
        let act_derivative = self.pre_neurons.map(|x| self.activator.derivative(x));
        // δ = error ⊙ σ'(z)
        let layer_delta = next_layer_delta.hadamard(&act_derivative);

        let weights_adjustment = inputs.transpose().dot(&layer_delta);
        let biases_adjustment = layer_delta;

        (weights_adjustment, biases_adjustment)
    }

    /// Σ|w| over weights and biases, used by the L1 penalty.
    pub fn parameters_abs_sum(&self) -> f64 {
        self.weights.abs_sum() + self.biases.abs_sum()
    }
}
