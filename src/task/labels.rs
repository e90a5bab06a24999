use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FitError, Result};
use crate::task::model_choice::{Family, ModelChoice};

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Regression,
    BinaryClassification,
    MulticlassClassification,
    MultilabelClassification,
}

impl TaskKind {
    pub fn is_classification(&self) -> bool {
        !matches!(self, TaskKind::Regression)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Regression => "regression",
            TaskKind::BinaryClassification => "binary",
            TaskKind::MulticlassClassification => "multiclass",
            TaskKind::MultilabelClassification => "multilabel",
        }
    }
}

/// Fixed once before splitting. For multilabel tasks `class_names` holds the
/// label (target column) names and `num_classes` their count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub feature_dim: usize,
    pub num_classes: usize,
    pub class_names: Vec<String>,
}

impl TaskSpec {
    pub fn regression(feature_dim: usize) -> TaskSpec {
        TaskSpec { kind: TaskKind::Regression, feature_dim, num_classes: 0, class_names: Vec::new() }
    }

    /// Width of the raw model output: one value for regression and binary
    /// tasks, one logit per class or label otherwise.
    pub fn output_width(&self) -> usize {
        match self.kind {
            TaskKind::Regression | TaskKind::BinaryClassification => 1,
            TaskKind::MulticlassClassification | TaskKind::MultilabelClassification => {
                self.num_classes.max(1)
            }
        }
    }

    pub fn class_name(&self, idx: usize) -> &str {
        self.class_names.get(idx).map_or("?", String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Label encoding
// ---------------------------------------------------------------------------

/// Maps stringified labels to their position in a sorted class list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Sorted unique labels, compared as strings.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> LabelEncoder {
        let mut classes: Vec<String> = labels.iter().map(|s| s.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        LabelEncoder { classes }
    }

    /// A fixed class set, e.g. the one seen at training time.
    pub fn from_classes(mut classes: Vec<String>) -> LabelEncoder {
        classes.sort();
        classes.dedup();
        LabelEncoder { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, label: &str) -> Result<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| FitError::UnknownLabel { label: label.to_string(), known: self.classes.len() })
    }

    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    pub fn decode(&self, idx: usize) -> Option<&str> {
        self.classes.get(idx).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Encoded targets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Targets {
    Values(Vec<f64>),
    Classes(Vec<usize>),
    Indicators(Vec<Vec<u8>>),
}

impl Targets {
    pub fn len(&self) -> usize {
        match self {
            Targets::Values(v) => v.len(),
            Targets::Classes(c) => c.len(),
            Targets::Indicators(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn select(&self, indices: &[usize]) -> Targets {
        match self {
            Targets::Values(v) => Targets::Values(indices.iter().map(|&i| v[i]).collect()),
            Targets::Classes(c) => Targets::Classes(indices.iter().map(|&i| c[i]).collect()),
            Targets::Indicators(rows) => {
                Targets::Indicators(indices.iter().map(|&i| rows[i].clone()).collect())
            }
        }
    }

    /// Expected network output for row `i`: the value, the 0/1 label for
    /// binary tasks, a one-hot vector for multiclass, the indicator row for
    /// multilabel.
    pub fn expected_output(&self, i: usize, width: usize) -> Vec<f64> {
        match self {
            Targets::Values(v) => vec![v[i]],
            Targets::Classes(c) if width <= 1 => vec![c[i] as f64],
            Targets::Classes(c) => {
                let mut one_hot = vec![0.0; width];
                if c[i] < width {
                    one_hot[c[i]] = 1.0;
                }
                one_hot
            }
            Targets::Indicators(rows) => rows[i].iter().map(|&b| b as f64).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Normalized {
    pub task: TaskSpec,
    pub targets: Targets,
    /// Present for single-label classification.
    pub encoder: Option<LabelEncoder>,
}

fn parse_indicator(cell: &str) -> Option<u8> {
    match cell.trim().parse::<f64>() {
        Ok(v) if v == 0.0 => Some(0),
        Ok(v) if v == 1.0 => Some(1),
        _ => None,
    }
}

/// Derives the task and canonical target encoding.
///
/// `raw_rows[i][j]` is row `i`'s cell for target column `j`. The task kind
/// comes from `model`; several 0/1 target columns under a classification
/// model give a multilabel task. When `fixed` is given, labels are mapped
/// through that class set and any unseen label is an error.
pub fn normalize(
    model: ModelChoice,
    target_names: &[String],
    raw_rows: &[Vec<String>],
    feature_dim: usize,
    fixed: Option<&LabelEncoder>,
) -> Result<Normalized> {
    if target_names.is_empty() {
        return Err(FitError::InvalidConfig("no target column given".into()));
    }
    if let Some(row) = raw_rows.iter().find(|r| r.len() != target_names.len()) {
        return Err(FitError::Data(format!(
            "target row has {} cells, expected {}",
            row.len(),
            target_names.len()
        )));
    }

    let multi = target_names.len() > 1;
    if multi && model.family() == Family::Classification {
        let indicators: Option<Vec<Vec<u8>>> = raw_rows
            .iter()
            .map(|row| row.iter().map(|c| parse_indicator(c)).collect())
            .collect();
        if let Some(rows) = indicators {
            let task = TaskSpec {
                kind: TaskKind::MultilabelClassification,
                feature_dim,
                num_classes: target_names.len(),
                class_names: target_names.to_vec(),
            };
            return Ok(Normalized { task, targets: Targets::Indicators(rows), encoder: None });
        }
    }
    if multi {
        warn!(
            used = %target_names[0],
            dropped = target_names.len() - 1,
            "several target columns for a single-output model; using the first"
        );
    }

    let first: Vec<&str> = raw_rows.iter().map(|r| r[0].as_str()).collect();
    match model.family() {
        Family::Regression => {
            let values = first
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    cell.trim().parse::<f64>().map_err(|_| {
                        FitError::Data(format!(
                            "target '{}' row {}: '{}' is not numeric",
                            target_names[0],
                            i + 1,
                            cell
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            Ok(Normalized {
                task: TaskSpec::regression(feature_dim),
                targets: Targets::Values(values),
                encoder: None,
            })
        }
        Family::Classification => {
            let encoder = match fixed {
                Some(enc) => enc.clone(),
                None => LabelEncoder::fit(&first),
            };
            let classes = encoder.encode_all(&first)?;
            let (kind, num_classes) = if encoder.len() <= 2 {
                (TaskKind::BinaryClassification, 2)
            } else {
                (TaskKind::MulticlassClassification, encoder.len())
            };
            let mut class_names = encoder.classes().to_vec();
            while class_names.len() < num_classes {
                class_names.push(format!("class_{}", class_names.len()));
            }
            let task = TaskSpec { kind, feature_dim, num_classes, class_names };
            Ok(Normalized { task, targets: Targets::Classes(classes), encoder: Some(encoder) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
        cells.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn string_labels_sort_and_encode_by_position() {
        let raw = rows(&[&["M"], &["B"], &["M"]]);
        let n = normalize(ModelChoice::LogReg, &names(&["diag"]), &raw, 2, None).unwrap();
        assert_eq!(n.task.kind, TaskKind::BinaryClassification);
        assert_eq!(n.task.class_names, vec!["B", "M"]);
        assert_eq!(n.targets, Targets::Classes(vec![1, 0, 1]));
    }

    #[test]
    fn decode_inverts_encode_for_seen_labels() {
        let enc = LabelEncoder::fit(&["cat", "dog", "ant", "dog"]);
        for label in ["ant", "cat", "dog"] {
            let idx = enc.encode(label).unwrap();
            assert_eq!(enc.decode(idx), Some(label));
        }
    }

    #[test]
    fn unseen_label_against_fixed_set_is_an_error() {
        let enc = LabelEncoder::from_classes(names(&["a", "b"]));
        let raw = rows(&[&["a"], &["c"]]);
        let err = normalize(ModelChoice::DtCls, &names(&["y"]), &raw, 1, Some(&enc)).unwrap_err();
        assert!(matches!(err, FitError::UnknownLabel { ref label, known: 2 } if label == "c"));
    }

    #[test]
    fn three_classes_are_multiclass() {
        let raw = rows(&[&["x"], &["y"], &["z"]]);
        let n = normalize(ModelChoice::MlpCls, &names(&["t"]), &raw, 3, None).unwrap();
        assert_eq!(n.task.kind, TaskKind::MulticlassClassification);
        assert_eq!(n.task.output_width(), 3);
    }

    #[test]
    fn binary_indicator_columns_become_multilabel() {
        let raw = rows(&[&["0", "1", "1"], &["1", "0", "0"]]);
        let n = normalize(ModelChoice::MlpCls, &names(&["a", "b", "c"]), &raw, 4, None).unwrap();
        assert_eq!(n.task.kind, TaskKind::MultilabelClassification);
        assert_eq!(n.task.num_classes, 3);
        assert!(n.encoder.is_none());
    }

    #[test]
    fn non_binary_multi_target_uses_first_column() {
        let raw = rows(&[&["a", "2"], &["b", "0"]]);
        let n = normalize(ModelChoice::DtCls, &names(&["t", "u"]), &raw, 1, None).unwrap();
        assert_eq!(n.task.kind, TaskKind::BinaryClassification);
        assert_eq!(n.targets, Targets::Classes(vec![0, 1]));
    }

    #[test]
    fn regression_kind_is_fixed_by_model_even_for_integer_targets() {
        let raw = rows(&[&["0"], &["1"], &["1"]]);
        let n = normalize(ModelChoice::LinReg, &names(&["y"]), &raw, 1, None).unwrap();
        assert_eq!(n.task.kind, TaskKind::Regression);
        assert_eq!(n.targets, Targets::Values(vec![0.0, 1.0, 1.0]));
    }

    #[test]
    fn non_numeric_regression_target_is_rejected() {
        let raw = rows(&[&["1.5"], &["oops"]]);
        assert!(matches!(
            normalize(ModelChoice::Ridge, &names(&["y"]), &raw, 1, None),
            Err(FitError::Data(_))
        ));
    }

    #[test]
    fn single_observed_class_pads_binary_names() {
        let raw = rows(&[&["yes"], &["yes"]]);
        let n = normalize(ModelChoice::LogReg, &names(&["y"]), &raw, 1, None).unwrap();
        assert_eq!(n.task.class_names, vec!["yes", "class_1"]);
    }

    #[test]
    fn expected_output_is_one_hot_for_multiclass() {
        let t = Targets::Classes(vec![2, 0]);
        assert_eq!(t.expected_output(0, 3), vec![0.0, 0.0, 1.0]);
        assert_eq!(t.expected_output(1, 1), vec![0.0]);
    }
}
