use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    pub fn new<R: Rng + ?Sized>(
        layer_specs: Vec<(usize, usize, ActivationFunction)>,
        rng: &mut R,
    ) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Network { layers }
    }

    /// A single affine layer emitting raw outputs (regression value or logits).
    pub fn linear<R: Rng + ?Sized>(input_dim: usize, output_dim: usize, rng: &mut R) -> Network {
        Network::new(vec![(output_dim, input_dim, ActivationFunction::Identity)], rng)
    }

    /// Feed-forward network with `hidden_layers` hidden layers of width
    /// `hidden` followed by an Identity output layer.
    pub fn mlp<R: Rng + ?Sized>(
        input_dim: usize,
        hidden: usize,
        hidden_layers: usize,
        activation: ActivationFunction,
        output_dim: usize,
        rng: &mut R,
    ) -> Network {
        let hidden = hidden.max(1);
        let mut specs = Vec::with_capacity(hidden_layers.max(1) + 1);
        let mut fan_in = input_dim;
        for _ in 0..hidden_layers.max(1) {
            specs.push((hidden, fan_in, activation));
            fan_in = hidden;
        }
        specs.push((output_dim, fan_in, ActivationFunction::Identity));
        Network::new(specs, rng)
    }

    /// Forward pass; stores activations in each layer for backprop.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.feed_from(&current);
        }
        current
    }

    /// Stateless forward pass used for evaluation and plotting.
    pub fn predict(&self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &self.layers {
            current = layer.evaluate(&current);
        }
        current
    }

    pub fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    /// Σ|θ| across every layer.
    pub fn l1_norm(&self) -> f64 {
        self.layers.iter().map(Layer::parameters_abs_sum).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn mlp_shapes_chain() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = Network::mlp(4, 8, 2, ActivationFunction::ReLU, 3, &mut rng);
        assert_eq!(net.layers.len(), 3);
        assert_eq!(net.input_dim(), 4);
        assert_eq!(net.output_dim(), 3);
        assert_eq!(net.predict(&[0.1, 0.2, 0.3, 0.4]).len(), 3);
    }

    #[test]
    fn serde_round_trip_preserves_predictions() {
        let mut rng = StdRng::seed_from_u64(4);
        let net = Network::linear(2, 1, &mut rng);
        let json = serde_json::to_string(&net).unwrap();
        let back: Network = serde_json::from_str(&json).unwrap();
        assert_eq!(net.predict(&[1.0, 2.0]), back.predict(&[1.0, 2.0]));
    }
}
