use tracing::debug;

use crate::classical::{ClassicalModel, ClassicalParams};
use crate::error::{FitError, Result};
use crate::metrics::score::ScoreKind;
use crate::task::{Backend, ModelChoice, TaskSpec};
use crate::train::predictor::Predictor;
use crate::train::progress::{ProgressEvent, ProgressSink};
use crate::train::trainer::{TrainData, TrainOutcome, TrainedModel, Trainer};

/// Fits once, then reports a single event at `epoch == epochs_total`.
pub struct ClassicalTrainer {
    choice: ModelChoice,
    params: ClassicalParams,
    epochs: usize,
}

impl ClassicalTrainer {
    pub fn new(choice: ModelChoice, params: ClassicalParams, epochs: usize) -> ClassicalTrainer {
        ClassicalTrainer { choice, params, epochs: epochs.max(1) }
    }
}

impl Trainer for ClassicalTrainer {
    fn backend(&self) -> Backend {
        Backend::Classical
    }

    fn train(&mut self, data: &TrainData<'_>, task: &TaskSpec, sink: &mut dyn ProgressSink) -> Result<TrainOutcome> {
        if data.x_train.is_empty() {
            return Err(FitError::InsufficientData { needed: 1, got: 0 });
        }
        debug!(model = %self.choice, rows = data.x_train.len(), "fitting classical estimator");
        let model = ClassicalModel::fit(self.choice, &self.params, task, data.x_train, data.y_train)?;

        let score_kind = ScoreKind::for_classical(task.kind);
        let score = score_kind.compute(data.y_test, &model.predict(data.x_test));
        let event = ProgressEvent { epoch: self.epochs, epochs_total: self.epochs, loss: 0.0, score };
        sink.on_epoch(&event, &model)?;

        Ok(TrainOutcome { model: TrainedModel::Classical(model), score, score_kind, history: vec![event] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Hyperparams;
    use crate::task::{Targets, TaskKind};

    #[test]
    fn emits_exactly_one_final_event() {
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64]).collect();
        let y = Targets::Classes((0..20).map(|i| usize::from(i >= 10)).collect());
        let task = TaskSpec {
            kind: TaskKind::BinaryClassification,
            feature_dim: 1,
            num_classes: 2,
            class_names: vec!["0".into(), "1".into()],
        };
        let params = ClassicalParams::from_hyperparams(&Hyperparams::default()).unwrap();
        let mut trainer = ClassicalTrainer::new(ModelChoice::DtCls, params, 37);
        let data = TrainData { x_train: &x, y_train: &y, x_test: &x, y_test: &y };

        let mut events = Vec::new();
        let mut sink = |e: &ProgressEvent, _m: &dyn Predictor| -> Result<()> {
            events.push(*e);
            Ok(())
        };
        let out = trainer.train(&data, &task, &mut sink).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!((events[0].epoch, events[0].epochs_total, events[0].loss), (37, 37, 0.0));
        assert!(events[0].is_final());
        assert_eq!(out.score, 1.0);
        assert_eq!(out.score_kind, ScoreKind::Accuracy);
    }
}
