use serde::{Deserialize, Serialize};

#[cfg(feature = "classical")]
use crate::classical::ClassicalModel;
use crate::config::Hyperparams;
use crate::error::Result;
use crate::metrics::score::ScoreKind;
use crate::task::{Backend, ModelChoice, Targets, TaskSpec};
use crate::train::gradient::{GradientConfig, GradientTrainer};
use crate::train::neural::NeuralModel;
use crate::train::pause::PauseToken;
use crate::train::predictor::{Predictor, Scores};
use crate::train::progress::{ProgressEvent, ProgressSink};

/// Borrowed train and held-out partitions.
#[derive(Debug, Clone, Copy)]
pub struct TrainData<'a> {
    pub x_train: &'a [Vec<f64>],
    pub y_train: &'a Targets,
    pub x_test: &'a [Vec<f64>],
    pub y_test: &'a Targets,
}

/// Either backend's fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", content = "model", rename_all = "snake_case")]
pub enum TrainedModel {
    Neural(NeuralModel),
    #[cfg(feature = "classical")]
    Classical(ClassicalModel),
}

impl TrainedModel {
    pub fn backend(&self) -> Backend {
        match self {
            TrainedModel::Neural(_) => Backend::Gradient,
            #[cfg(feature = "classical")]
            TrainedModel::Classical(_) => Backend::Classical,
        }
    }
}

impl Predictor for TrainedModel {
    fn task(&self) -> &TaskSpec {
        match self {
            TrainedModel::Neural(m) => m.task(),
            #[cfg(feature = "classical")]
            TrainedModel::Classical(m) => m.task(),
        }
    }

    fn predict_scores(&self, x: &[Vec<f64>]) -> Scores {
        match self {
            TrainedModel::Neural(m) => m.predict_scores(x),
            #[cfg(feature = "classical")]
            TrainedModel::Classical(m) => m.predict_scores(x),
        }
    }
}

/// Result of one training run.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: TrainedModel,
    /// Held-out score after the last epoch.
    pub score: f64,
    pub score_kind: ScoreKind,
    pub history: Vec<ProgressEvent>,
}

/// A training backend. Every backend reports through `sink` and returns
/// the final held-out score.
pub trait Trainer {
    fn backend(&self) -> Backend;

    fn train(&mut self, data: &TrainData<'_>, task: &TaskSpec, sink: &mut dyn ProgressSink) -> Result<TrainOutcome>;
}

/// Resolves the backend for `choice` once, before any data is read.
pub fn build_trainer(
    choice: ModelChoice,
    hp: &Hyperparams,
    epochs: usize,
    seed: u64,
    pause: PauseToken,
) -> Result<Box<dyn Trainer + Send>> {
    match choice.backend() {
        Backend::Gradient => {
            let config = GradientConfig::from_hyperparams(choice, hp, epochs, seed)?;
            Ok(Box::new(GradientTrainer::new(choice, config, pause)))
        }
        Backend::Classical => build_classical(choice, hp, epochs),
    }
}

#[cfg(feature = "classical")]
fn build_classical(choice: ModelChoice, hp: &Hyperparams, epochs: usize) -> Result<Box<dyn Trainer + Send>> {
    use crate::classical::ClassicalParams;
    use crate::train::classical::ClassicalTrainer;

    let params = ClassicalParams::from_hyperparams(hp)?;
    Ok(Box::new(ClassicalTrainer::new(choice, params, epochs)))
}

#[cfg(not(feature = "classical"))]
fn build_classical(choice: ModelChoice, _hp: &Hyperparams, _epochs: usize) -> Result<Box<dyn Trainer + Send>> {
    Err(crate::error::FitError::DependencyUnavailable(choice.to_string()))
}
