use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::Optimizer;

/// Plain gradient descent with optional coupled L2 weight decay.
pub struct Sgd {
    pub learning_rate: f64,
    pub weight_decay: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64, weight_decay: f64) -> Sgd {
        Sgd { learning_rate, weight_decay }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, layers: &mut [Layer], grads: Vec<(Matrix, Matrix)>) {
        let lr = self.learning_rate;
        let wd = self.weight_decay;
        for (layer, (w_grad, b_grad)) in layers.iter_mut().zip(grads) {
            let w_grad = w_grad + layer.weights.map(|w| w * wd);
            let b_grad = b_grad + layer.biases.map(|b| b * wd);
            layer.weights = layer.weights.clone() - w_grad.map(|x| x * lr);
            layer.biases = layer.biases.clone() - b_grad.map(|x| x * lr);
        }
    }
}
