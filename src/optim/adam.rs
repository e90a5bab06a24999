use crate::{math::matrix::Matrix, layers::dense::Layer};
use crate::optim::Optimizer;

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPS: f64 = 1e-8;

/// Adam with coupled L2 weight decay (decay is added to the gradient
/// before the moment updates).
pub struct Adam {
    pub learning_rate: f64,
    pub weight_decay: f64,
    t: i32,
    // first and second moments per layer: (m_w, v_w, m_b, v_b)
    moments: Vec<(Matrix, Matrix, Matrix, Matrix)>,
}

impl Adam {
    pub fn new(learning_rate: f64, weight_decay: f64) -> Adam {
        Adam { learning_rate, weight_decay, t: 0, moments: Vec::new() }
    }

    fn ensure_moments(&mut self, layers: &[Layer]) {
        if self.moments.len() == layers.len() {
            return;
        }
        self.moments = layers.iter()
            .map(|l| (
                Matrix::zeros(l.weights.rows, l.weights.cols),
                Matrix::zeros(l.weights.rows, l.weights.cols),
                Matrix::zeros(l.biases.rows, l.biases.cols),
                Matrix::zeros(l.biases.rows, l.biases.cols),
            ))
            .collect();
    }
}

fn update(param: &mut Matrix, grad: &Matrix, m: &mut Matrix, v: &mut Matrix, lr_t: f64, wd: f64) {
    for i in 0..param.rows {
        for j in 0..param.cols {
            let g = grad.data[i][j] + wd * param.data[i][j];
            m.data[i][j] = BETA1 * m.data[i][j] + (1.0 - BETA1) * g;
            v.data[i][j] = BETA2 * v.data[i][j] + (1.0 - BETA2) * g * g;
            param.data[i][j] -= lr_t * m.data[i][j] / (v.data[i][j].sqrt() + EPS);
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, layers: &mut [Layer], grads: Vec<(Matrix, Matrix)>) {
        self.ensure_moments(layers);
        self.t += 1;
        let bias1 = 1.0 - BETA1.powi(self.t);
        let bias2 = 1.0 - BETA2.powi(self.t);
        let lr_t = self.learning_rate * bias2.sqrt() / bias1;
        let wd = self.weight_decay;

        for ((layer, (w_grad, b_grad)), (m_w, v_w, m_b, v_b)) in
            layers.iter_mut().zip(grads).zip(self.moments.iter_mut())
        {
            update(&mut layer.weights, &w_grad, m_w, v_w, lr_t, wd);
            update(&mut layer.biases, &b_grad, m_b, v_b, lr_t, wd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn first_step_moves_each_weight_by_about_lr() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut layers = vec![Layer::new(1, 2, ActivationFunction::Identity, &mut rng)];
        let before = layers[0].weights.clone();
        let grads = vec![(
            Matrix::from_data(vec![vec![1.0], vec![-2.0]]),
            Matrix::from_data(vec![vec![0.5]]),
        )];
        let mut adam = Adam::new(0.01, 0.0);
        adam.step(&mut layers, grads);
        let dw0 = before.data[0][0] - layers[0].weights.data[0][0];
        let dw1 = before.data[1][0] - layers[0].weights.data[1][0];
        assert!((dw0 - 0.01).abs() < 1e-6);
        assert!((dw1 + 0.01).abs() < 1e-6);
    }
}
