use serde::{Serialize, Deserialize};

use crate::loss::{BceWithLogitsLoss, CrossEntropyLoss, MseLoss};
use crate::task::TaskKind;

/// Selects which loss function the training loop uses.
///
/// - `Mse`: regression.
/// - `BinaryCrossEntropy`: binary and multilabel classification, on logits.
/// - `CrossEntropy`: multiclass classification, softmax over logits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    BinaryCrossEntropy,
    CrossEntropy,
}

impl LossType {
    pub fn for_task(kind: TaskKind) -> LossType {
        match kind {
            TaskKind::Regression => LossType::Mse,
            TaskKind::BinaryClassification | TaskKind::MultilabelClassification => {
                LossType::BinaryCrossEntropy
            }
            TaskKind::MulticlassClassification => LossType::CrossEntropy,
        }
    }

    /// Scalar loss for one sample.
    pub fn loss(&self, output: &[f64], expected: &[f64]) -> f64 {
        match self {
            LossType::Mse                => MseLoss::loss(output, expected),
            LossType::BinaryCrossEntropy => BceWithLogitsLoss::loss(output, expected),
            LossType::CrossEntropy       => CrossEntropyLoss::loss(output, expected),
        }
    }

    /// Per-output gradient for one sample.
    pub fn derivative(&self, output: &[f64], expected: &[f64]) -> Vec<f64> {
        match self {
            LossType::Mse                => MseLoss::derivative(output, expected),
            LossType::BinaryCrossEntropy => BceWithLogitsLoss::derivative(output, expected),
            LossType::CrossEntropy       => CrossEntropyLoss::derivative(output, expected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_follows_task_kind() {
        assert_eq!(LossType::for_task(TaskKind::Regression), LossType::Mse);
        assert_eq!(LossType::for_task(TaskKind::BinaryClassification), LossType::BinaryCrossEntropy);
        assert_eq!(LossType::for_task(TaskKind::MultilabelClassification), LossType::BinaryCrossEntropy);
        assert_eq!(LossType::for_task(TaskKind::MulticlassClassification), LossType::CrossEntropy);
    }
}
