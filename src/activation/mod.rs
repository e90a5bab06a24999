pub mod activation;

pub use activation::{ActivationFunction, sigmoid, softmax};
