use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::fsio::atomic_write;
use crate::metrics::classification::ClassificationMetrics;
use crate::metrics::multilabel::MultilabelMetrics;
use crate::metrics::regression::RegressionMetrics;
use crate::task::{Targets, TaskKind, TaskSpec};

/// Final held-out evaluation of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricsReport {
    Regression(RegressionMetrics),
    Classification(ClassificationMetrics),
    Multilabel(MultilabelMetrics),
}

impl MetricsReport {
    /// Picks the metric family from the task, never from the data.
    pub fn evaluate(task: &TaskSpec, truth: &Targets, pred: &Targets) -> Result<MetricsReport> {
        match (task.kind, truth, pred) {
            (TaskKind::Regression, Targets::Values(t), Targets::Values(p)) => {
                Ok(MetricsReport::Regression(RegressionMetrics::compute(t, p)))
            }
            (
                TaskKind::BinaryClassification | TaskKind::MulticlassClassification,
                Targets::Classes(t),
                Targets::Classes(p),
            ) => Ok(MetricsReport::Classification(ClassificationMetrics::compute(t, p, &task.class_names))),
            (TaskKind::MultilabelClassification, Targets::Indicators(t), Targets::Indicators(p)) => {
                Ok(MetricsReport::Multilabel(MultilabelMetrics::compute(t, p, &task.class_names)))
            }
            (kind, _, _) => Err(FitError::Data(format!(
                "targets do not match a {} task",
                kind.as_str()
            ))),
        }
    }

    pub fn render_text(&self) -> String {
        match self {
            MetricsReport::Regression(m) => m.render(),
            MetricsReport::Classification(m) => m.render(),
            MetricsReport::Multilabel(m) => m.render(),
        }
    }

    /// Headline score name and value, as stored in cache metadata.
    pub fn headline(&self) -> (&'static str, f64) {
        match self {
            MetricsReport::Regression(m) => ("r2", m.r2),
            MetricsReport::Classification(m) => ("accuracy", m.accuracy),
            MetricsReport::Multilabel(m) => ("micro_f1", m.micro_f1),
        }
    }

    /// Path of the JSON artifact written next to the text report.
    pub fn json_path(text_path: &Path) -> PathBuf {
        let mut name = text_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".json");
        text_path.with_file_name(name)
    }

    /// Writes the text report to `path` and the JSON form next to it, both
    /// atomically. Returns the JSON path.
    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        let mut text = self.render_text();
        text.push('\n');
        atomic_write(path, text.as_bytes())?;
        let json_path = MetricsReport::json_path(path);
        atomic_write(&json_path, serde_json::to_string_pretty(self)?.as_bytes())?;
        Ok(json_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_family_follows_task() {
        let task = TaskSpec::regression(1);
        let r = MetricsReport::evaluate(&task, &Targets::Values(vec![1.0, 2.0]), &Targets::Values(vec![1.0, 2.0])).unwrap();
        assert_eq!(r.headline(), ("r2", 1.0));
        assert!(MetricsReport::evaluate(&task, &Targets::Classes(vec![0]), &Targets::Classes(vec![0])).is_err());
    }

    #[test]
    fn writes_text_and_tagged_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.txt");
        let task = TaskSpec {
            kind: TaskKind::BinaryClassification,
            feature_dim: 2,
            num_classes: 2,
            class_names: vec!["B".into(), "M".into()],
        };
        let report = MetricsReport::evaluate(&task, &Targets::Classes(vec![0, 1]), &Targets::Classes(vec![0, 0])).unwrap();
        let json_path = report.write(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("Classification Report"));
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(json["kind"], "classification");
        let back: MetricsReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}
