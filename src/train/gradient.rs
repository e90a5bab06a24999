use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::activation::activation::ActivationFunction;
use crate::config::Hyperparams;
use crate::error::{FitError, Result};
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::metrics::score::ScoreKind;
use crate::network::network::Network;
use crate::optim::{Optimizer, OptimizerKind};
use crate::task::{Backend, ModelChoice, TaskSpec};
use crate::train::neural::NeuralModel;
use crate::train::pause::PauseToken;
use crate::train::predictor::Predictor;
use crate::train::progress::{ProgressEvent, ProgressSink};
use crate::train::trainer::{TrainData, TrainOutcome, TrainedModel, Trainer};

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

/// Resolved settings for one gradient run.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientConfig {
    pub learning_rate: f64,
    /// Coupled L2 decay handed to the optimizer.
    pub weight_decay: f64,
    /// Weight of the Σ|θ| penalty added to the loss.
    pub l1: f64,
    pub optimizer: OptimizerKind,
    /// `None` means min(256, training rows).
    pub batch_size: Option<usize>,
    /// `None` picks a width from the input dimension.
    pub hidden: Option<usize>,
    pub layers: usize,
    pub activation: ActivationFunction,
    pub epochs: usize,
    pub seed: u64,
}

impl GradientConfig {
    pub fn from_hyperparams(model: ModelChoice, hp: &Hyperparams, epochs: usize, seed: u64) -> Result<GradientConfig> {
        let default_lr = if model == ModelChoice::MlpReg { 5e-3 } else { 5e-2 };
        let alpha = hp.f64_or("alpha", 1e-2);

        let (weight_decay, l1) = match model {
            ModelChoice::Ridge => (alpha, 0.0),
            ModelChoice::Lasso => (0.0, hp.f64_or("l1_lambda", alpha)),
            ModelChoice::LogReg => {
                let c = hp.f64_or("C", 1.0);
                if c.is_nan() || c <= 0.0 {
                    return Err(FitError::InvalidConfig(format!("C must be positive, got {c}")));
                }
                let penalty = hp.str_or("penalty", "L2").to_ascii_uppercase();
                let (wd, l1) = match penalty.as_str() {
                    "L1" => (0.0, 1.0 / c),
                    "L2" => (1.0 / c, 0.0),
                    other => {
                        warn!(penalty = %other, "unknown penalty; using none");
                        (0.0, 0.0)
                    }
                };
                (wd, l1 + hp.f64_or("l1_lambda", 0.0))
            }
            ModelChoice::LinReg | ModelChoice::MlpReg | ModelChoice::MlpCls => (0.0, 0.0),
            other => return Err(FitError::UnsupportedModel(format!("{other} is not a gradient model"))),
        };

        let optimizer = OptimizerKind::parse(&hp.str_or("optimizer", "adam"))?;
        let epochs = epochs.max(1);
        Ok(GradientConfig {
            learning_rate: hp.f64_or("lr", default_lr),
            weight_decay,
            l1,
            optimizer,
            batch_size: hp.opt_usize("batch_size").filter(|&b| b > 0),
            hidden: hp.opt_usize("hidden").filter(|&h| h > 0),
            layers: hp.usize_or("layers", 2).max(1),
            activation: ActivationFunction::hidden_from_name(&hp.str_or("activation", "relu")),
            epochs,
            seed: hp.opt_usize("seed").map_or(seed, |s| s as u64),
        })
    }
}

// ---------------------------------------------------------------------------
// Trainer
// ---------------------------------------------------------------------------

pub struct GradientTrainer {
    model: ModelChoice,
    config: GradientConfig,
    pause: PauseToken,
}

impl GradientTrainer {
    pub fn new(model: ModelChoice, config: GradientConfig, pause: PauseToken) -> GradientTrainer {
        GradientTrainer { model, config, pause }
    }

    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    fn build_network(&self, task: &TaskSpec, rng: &mut StdRng) -> Network {
        let d = task.feature_dim;
        let out = task.output_width();
        match self.model {
            ModelChoice::MlpReg | ModelChoice::MlpCls => {
                let floor = if self.model == ModelChoice::MlpReg { 16 } else { 8 };
                let hidden = self.config.hidden.unwrap_or_else(|| floor.max(2 * d));
                Network::mlp(d, hidden, self.config.layers, self.config.activation, out, rng)
            }
            _ => Network::linear(d, out, rng),
        }
    }
}

impl Trainer for GradientTrainer {
    fn backend(&self) -> Backend {
        Backend::Gradient
    }

    fn train(&mut self, data: &TrainData<'_>, task: &TaskSpec, sink: &mut dyn ProgressSink) -> Result<TrainOutcome> {
        if data.x_train.is_empty() {
            return Err(FitError::InsufficientData { needed: 1, got: 0 });
        }
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut model = NeuralModel { network: self.build_network(task, &mut rng), task: task.clone() };
        let loss_type = LossType::for_task(task.kind);
        let width = task.output_width();
        let labels: Vec<Vec<f64>> = (0..data.y_train.len())
            .map(|i| data.y_train.expected_output(i, width))
            .collect();

        let batch_size = self.config.batch_size.unwrap_or_else(|| data.x_train.len().min(256)).max(1);
        let mut optimizer = self.config.optimizer.build(self.config.learning_rate, self.config.weight_decay);
        let score_kind = ScoreKind::for_gradient(task.kind);
        let epochs = self.config.epochs;
        let mut history = Vec::with_capacity(epochs);
        let mut score = 0.0;

        debug!(
            batch_size,
            lr = self.config.learning_rate,
            weight_decay = self.config.weight_decay,
            l1 = self.config.l1,
            "gradient training"
        );

        for epoch in 1..=epochs {
            let data_loss = run_one_epoch(
                &mut model.network,
                data.x_train,
                &labels,
                optimizer.as_mut(),
                batch_size,
                loss_type,
                self.config.l1,
                &self.pause,
                &mut rng,
            );
            let loss = data_loss + self.config.l1 * model.network.l1_norm();

            score = score_kind.compute(data.y_test, &model.predict(data.x_test));
            let event = ProgressEvent { epoch, epochs_total: epochs, loss, score };
            debug!(epoch, loss, score, "epoch done");
            history.push(event);
            sink.on_epoch(&event, &model)?;
        }

        Ok(TrainOutcome { model: TrainedModel::Neural(model), score, score_kind, history })
    }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one full epoch of minibatch training over the training data.
/// Returns the mean data loss over all samples.
#[allow(clippy::too_many_arguments)]
fn run_one_epoch(
    network: &mut Network,
    inputs: &[Vec<f64>],
    labels: &[Vec<f64>],
    optimizer: &mut dyn Optimizer,
    batch_size: usize,
    loss_type: LossType,
    l1: f64,
    pause: &PauseToken,
    rng: &mut StdRng,
) -> f64 {
    let n = inputs.len();
    let mut total_loss = 0.0;

    // Shuffle sample order each epoch.
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for batch_start in (0..n).step_by(batch_size) {
        pause.wait_while_paused();

        let batch_end = (batch_start + batch_size).min(n);
        let actual_batch_size = (batch_end - batch_start) as f64;

        // Zero-initialize accumulated gradient storage.
        let mut acc_grads: Vec<(Matrix, Matrix)> = network.layers.iter()
            .map(|layer| (
                Matrix::zeros(layer.weights.rows, layer.weights.cols),
                Matrix::zeros(layer.biases.rows, layer.biases.cols),
            ))
            .collect();

        for &idx in &indices[batch_start..batch_end] {
            let input    = &inputs[idx];
            let expected = &labels[idx];

            let output = network.forward(input);
            total_loss += loss_type.loss(&output, expected);

            let error = loss_type.derivative(&output, expected);
            let mut delta = Matrix::row_vector(&error);

            // Backward pass.
            for i in (0..network.layers.len()).rev() {
                let input_for_layer = if i == 0 {
                    Matrix::row_vector(input)
                } else {
                    network.layers[i - 1].neurons.clone()
                };

                let (w_grad, b_grad) = network.layers[i].compute_gradients(delta, &input_for_layer);

                delta = b_grad.dot(&network.layers[i].weights.transpose());

                acc_grads[i].0 = std::mem::take(&mut acc_grads[i].0) + w_grad;
                acc_grads[i].1 = std::mem::take(&mut acc_grads[i].1) + b_grad;
            }
        }

        // Average, add the L1 subgradient, and apply.
        let inv_batch = 1.0 / actual_batch_size;
        let grads: Vec<(Matrix, Matrix)> = acc_grads.into_iter()
            .zip(network.layers.iter())
            .map(|((w_acc, b_acc), layer)| {
                let mut w_avg = w_acc.map(|x| x * inv_batch);
                let mut b_avg = b_acc.map(|x| x * inv_batch);
                if l1 > 0.0 {
                    w_avg = w_avg + layer.weights.map(|w| l1 * sign(w));
                    b_avg = b_avg + layer.biases.map(|b| l1 * sign(b));
                }
                (w_avg, b_avg)
            })
            .collect();
        optimizer.step(&mut network.layers, grads);
    }

    total_loss / n as f64
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Targets, TaskKind};
    use crate::train::progress::NoProgress;

    fn line_data(n: usize) -> (Vec<Vec<f64>>, Targets) {
        let x: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64 / n as f64 * 2.0 - 1.0]).collect();
        let y = Targets::Values(x.iter().map(|r| 3.0 * r[0] + 0.5).collect());
        (x, y)
    }

    #[test]
    fn logreg_penalty_maps_to_decay_or_l1() {
        let hp = Hyperparams::default().with("C", 4.0);
        let cfg = GradientConfig::from_hyperparams(ModelChoice::LogReg, &hp, 10, 1).unwrap();
        assert_eq!((cfg.weight_decay, cfg.l1), (0.25, 0.0));
        let hp = hp.with("penalty", "l1");
        let cfg = GradientConfig::from_hyperparams(ModelChoice::LogReg, &hp, 10, 1).unwrap();
        assert_eq!((cfg.weight_decay, cfg.l1), (0.0, 0.25));
    }

    #[test]
    fn regression_defaults() {
        let hp = Hyperparams::default();
        let ridge = GradientConfig::from_hyperparams(ModelChoice::Ridge, &hp, 5, 1).unwrap();
        assert_eq!(ridge.weight_decay, 1e-2);
        let lasso = GradientConfig::from_hyperparams(ModelChoice::Lasso, &hp, 5, 1).unwrap();
        assert_eq!(lasso.l1, 1e-2);
        let mlp = GradientConfig::from_hyperparams(ModelChoice::MlpReg, &hp, 5, 1).unwrap();
        assert_eq!(mlp.learning_rate, 5e-3);
        assert_eq!(mlp.layers, 2);
    }

    #[test]
    fn linreg_fits_a_line_and_reports_each_epoch() {
        let (x, y) = line_data(40);
        let task = TaskSpec::regression(1);
        let cfg = GradientConfig::from_hyperparams(ModelChoice::LinReg, &Hyperparams::default(), 200, 7).unwrap();
        let mut trainer = GradientTrainer::new(ModelChoice::LinReg, cfg, PauseToken::new());
        let data = TrainData { x_train: &x, y_train: &y, x_test: &x, y_test: &y };
        let mut seen = 0;
        let mut sink = |e: &ProgressEvent, _m: &dyn Predictor| -> Result<()> {
            seen += 1;
            assert_eq!(e.epochs_total, 200);
            Ok(())
        };
        let outcome = trainer.train(&data, &task, &mut sink).unwrap();
        assert_eq!(seen, 200);
        assert!(outcome.score > 0.95, "r2 = {}", outcome.score);
        assert_eq!(outcome.history.len(), 200);
    }

    #[test]
    fn same_seed_gives_same_model() {
        let (x, y) = line_data(20);
        let task = TaskSpec::regression(1);
        let run = || {
            let cfg = GradientConfig::from_hyperparams(ModelChoice::MlpReg, &Hyperparams::default(), 5, 3).unwrap();
            let mut t = GradientTrainer::new(ModelChoice::MlpReg, cfg, PauseToken::new());
            let data = TrainData { x_train: &x, y_train: &y, x_test: &x, y_test: &y };
            t.train(&data, &task, &mut NoProgress).unwrap().score
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn multiclass_network_learns_separable_classes() {
        let mut x = Vec::new();
        let mut c = Vec::new();
        for i in 0..30 {
            let k = i % 3;
            x.push(vec![k as f64 * 2.0 - 2.0 + (i as f64) * 0.001]);
            c.push(k);
        }
        let y = Targets::Classes(c);
        let task = TaskSpec {
            kind: TaskKind::MulticlassClassification,
            feature_dim: 1,
            num_classes: 3,
            class_names: vec!["a".into(), "b".into(), "c".into()],
        };
        let cfg = GradientConfig::from_hyperparams(ModelChoice::MlpCls, &Hyperparams::default(), 150, 11).unwrap();
        let mut t = GradientTrainer::new(ModelChoice::MlpCls, cfg, PauseToken::new());
        let data = TrainData { x_train: &x, y_train: &y, x_test: &x, y_test: &y };
        let out = t.train(&data, &task, &mut NoProgress).unwrap();
        assert!(out.score > 0.9, "accuracy = {}", out.score);
    }
}
