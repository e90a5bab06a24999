use crate::task::{Targets, TaskKind, TaskSpec};

/// Raw per-row model outputs before thresholding.
#[derive(Debug, Clone, PartialEq)]
pub enum Scores {
    Regression(Vec<f64>),
    /// Probability of class 1.
    Binary(Vec<f64>),
    /// Class probabilities per row.
    Multiclass(Vec<Vec<f64>>),
    /// Per-label probabilities per row.
    Multilabel(Vec<Vec<f64>>),
}

pub(crate) fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

impl Scores {
    pub fn len(&self) -> usize {
        match self {
            Scores::Regression(v) | Scores::Binary(v) => v.len(),
            Scores::Multiclass(rows) | Scores::Multilabel(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hard predictions: 0.5 threshold for binary and multilabel, argmax for
    /// multiclass.
    pub fn to_targets(&self) -> Targets {
        match self {
            Scores::Regression(v) => Targets::Values(v.clone()),
            Scores::Binary(p) => Targets::Classes(p.iter().map(|&p| usize::from(p >= 0.5)).collect()),
            Scores::Multiclass(rows) => Targets::Classes(rows.iter().map(|r| argmax(r)).collect()),
            Scores::Multilabel(rows) => Targets::Indicators(
                rows.iter().map(|r| r.iter().map(|&p| u8::from(p >= 0.5)).collect()).collect(),
            ),
        }
    }

    /// Probability-like scalar per row used to colour decision surfaces:
    /// P(class 1) for binary, the winning class index for multiclass.
    pub fn surface_value(&self, row: usize) -> f64 {
        match self {
            Scores::Regression(v) | Scores::Binary(v) => v[row],
            Scores::Multiclass(rows) => argmax(&rows[row]) as f64,
            Scores::Multilabel(rows) => rows[row].iter().sum::<f64>() / rows[row].len().max(1) as f64,
        }
    }
}

/// Anything that can score feature rows for a known task.
pub trait Predictor {
    fn task(&self) -> &TaskSpec;

    fn predict_scores(&self, x: &[Vec<f64>]) -> Scores;

    fn predict(&self, x: &[Vec<f64>]) -> Targets {
        self.predict_scores(x).to_targets()
    }
}

/// Packs class probabilities into the `Scores` variant matching `kind`.
pub(crate) fn class_scores(kind: TaskKind, probs: Vec<Vec<f64>>) -> Scores {
    match kind {
        TaskKind::BinaryClassification => {
            Scores::Binary(probs.into_iter().map(|p| p.get(1).copied().unwrap_or(0.0)).collect())
        }
        TaskKind::MultilabelClassification => Scores::Multilabel(probs),
        _ => Scores::Multiclass(probs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_and_argmax() {
        assert_eq!(Scores::Binary(vec![0.2, 0.5, 0.9]).to_targets(), Targets::Classes(vec![0, 1, 1]));
        assert_eq!(
            Scores::Multiclass(vec![vec![0.1, 0.7, 0.2], vec![0.6, 0.3, 0.1]]).to_targets(),
            Targets::Classes(vec![1, 0])
        );
        assert_eq!(
            Scores::Multilabel(vec![vec![0.9, 0.1]]).to_targets(),
            Targets::Indicators(vec![vec![1, 0]])
        );
    }

    #[test]
    fn binary_scores_take_positive_class_column() {
        let s = class_scores(TaskKind::BinaryClassification, vec![vec![0.3, 0.7]]);
        assert_eq!(s, Scores::Binary(vec![0.7]));
    }
}
