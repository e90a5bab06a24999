use serde::{Deserialize, Serialize};

use crate::metrics::classification::ConfusionMatrix;
use crate::metrics::multilabel::{label_accuracy, micro_f1};
use crate::metrics::regression::r2_score;
use crate::task::{Targets, TaskKind};

/// The single held-out summary number carried by progress events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    R2,
    Accuracy,
    /// Mean per-label accuracy over the indicator matrix.
    LabelAccuracy,
    MicroF1,
}

impl ScoreKind {
    /// Per-epoch score of the gradient backend.
    pub fn for_gradient(kind: TaskKind) -> ScoreKind {
        match kind {
            TaskKind::Regression => ScoreKind::R2,
            TaskKind::MultilabelClassification => ScoreKind::LabelAccuracy,
            _ => ScoreKind::Accuracy,
        }
    }

    /// One-shot score of the classical backend.
    pub fn for_classical(kind: TaskKind) -> ScoreKind {
        match kind {
            TaskKind::Regression => ScoreKind::R2,
            TaskKind::MultilabelClassification => ScoreKind::MicroF1,
            _ => ScoreKind::Accuracy,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoreKind::R2 => "r2",
            ScoreKind::Accuracy => "accuracy",
            ScoreKind::LabelAccuracy => "label_accuracy",
            ScoreKind::MicroF1 => "micro_f1",
        }
    }

    /// Scores `pred` against `truth`; mismatched target shapes score 0.
    pub fn compute(&self, truth: &Targets, pred: &Targets) -> f64 {
        match (self, truth, pred) {
            (ScoreKind::R2, Targets::Values(t), Targets::Values(p)) => r2_score(t, p),
            (ScoreKind::Accuracy, Targets::Classes(t), Targets::Classes(p)) => {
                ConfusionMatrix::from_labels(t, p, 0).accuracy()
            }
            (ScoreKind::LabelAccuracy, Targets::Indicators(t), Targets::Indicators(p)) => {
                label_accuracy(t, p)
            }
            (ScoreKind::MicroF1, Targets::Indicators(t), Targets::Indicators(p)) => micro_f1(t, p),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_family_is_fixed_by_task_kind() {
        assert_eq!(ScoreKind::for_gradient(TaskKind::Regression), ScoreKind::R2);
        assert_eq!(ScoreKind::for_gradient(TaskKind::MultilabelClassification), ScoreKind::LabelAccuracy);
        assert_eq!(ScoreKind::for_classical(TaskKind::MultilabelClassification), ScoreKind::MicroF1);
        assert_eq!(ScoreKind::for_classical(TaskKind::BinaryClassification), ScoreKind::Accuracy);
    }

    #[test]
    fn accuracy_from_classes() {
        let s = ScoreKind::Accuracy.compute(&Targets::Classes(vec![0, 1, 1, 0]), &Targets::Classes(vec![0, 1, 0, 0]));
        assert_eq!(s, 0.75);
    }
}
