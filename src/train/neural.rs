use serde::{Deserialize, Serialize};

use crate::activation::{sigmoid, softmax};
use crate::network::network::Network;
use crate::task::{TaskKind, TaskSpec};
use crate::train::predictor::{Predictor, Scores};

/// A trained network plus the task it was trained for. The network emits
/// raw values (regression) or logits (classification).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeuralModel {
    pub network: Network,
    pub task: TaskSpec,
}

impl Predictor for NeuralModel {
    fn task(&self) -> &TaskSpec {
        &self.task
    }

    fn predict_scores(&self, x: &[Vec<f64>]) -> Scores {
        let outputs = x.iter().map(|row| self.network.predict(row));
        match self.task.kind {
            TaskKind::Regression => Scores::Regression(outputs.map(|o| o[0]).collect()),
            TaskKind::BinaryClassification => Scores::Binary(outputs.map(|o| sigmoid(o[0])).collect()),
            TaskKind::MulticlassClassification => {
                Scores::Multiclass(outputs.map(|o| softmax(&o)).collect())
            }
            TaskKind::MultilabelClassification => {
                Scores::Multilabel(outputs.map(|o| o.into_iter().map(sigmoid).collect()).collect())
            }
        }
    }
}
