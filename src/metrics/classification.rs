use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Confusion matrix
// ---------------------------------------------------------------------------

/// Rows are true classes, columns predicted classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Grows past `n_classes` if an index falls outside it.
    pub fn from_labels(truth: &[usize], pred: &[usize], n_classes: usize) -> ConfusionMatrix {
        let c = truth
            .iter()
            .chain(pred.iter())
            .map(|&i| i + 1)
            .max()
            .unwrap_or(0)
            .max(n_classes);
        let mut counts = vec![vec![0; c]; c];
        for (&t, &p) in truth.iter().zip(pred) {
            counts[t][p] += 1;
        }
        ConfusionMatrix { counts }
    }

    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn trace(&self) -> usize {
        (0..self.n_classes()).map(|i| self.counts[i][i]).sum()
    }

    pub fn row_sums(&self) -> Vec<usize> {
        self.counts.iter().map(|r| r.iter().sum()).collect()
    }

    pub fn col_sums(&self) -> Vec<usize> {
        (0..self.n_classes()).map(|j| self.counts.iter().map(|r| r[j]).sum()).collect()
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.trace(), self.total())
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

pub(crate) fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

// ---------------------------------------------------------------------------
// Per-class and aggregate metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub class_names: Vec<String>,
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub micro_precision: f64,
    pub micro_recall: f64,
    pub micro_f1: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationMetrics {
    pub fn compute(truth: &[usize], pred: &[usize], class_names: &[String]) -> ClassificationMetrics {
        let confusion = ConfusionMatrix::from_labels(truth, pred, class_names.len());
        let c = confusion.n_classes();
        let mut names = class_names.to_vec();
        while names.len() < c {
            names.push(format!("class_{}", names.len()));
        }

        let rows = confusion.row_sums();
        let cols = confusion.col_sums();
        let per_class: Vec<ClassMetrics> = (0..c)
            .map(|i| {
                let tp = confusion.counts[i][i];
                let precision = ratio(tp, cols[i]);
                let recall = ratio(tp, rows[i]);
                ClassMetrics {
                    name: names[i].clone(),
                    precision,
                    recall,
                    f1: f1(precision, recall),
                    support: rows[i],
                }
            })
            .collect();

        let k = c.max(1) as f64;
        let accuracy = confusion.accuracy();
        ClassificationMetrics {
            macro_precision: per_class.iter().map(|m| m.precision).sum::<f64>() / k,
            macro_recall: per_class.iter().map(|m| m.recall).sum::<f64>() / k,
            macro_f1: per_class.iter().map(|m| m.f1).sum::<f64>() / k,
            // single-label: micro P = micro R = micro F1 = accuracy
            micro_precision: accuracy,
            micro_recall: accuracy,
            micro_f1: accuracy,
            accuracy,
            class_names: names,
            per_class,
            confusion,
        }
    }

    /// Aligned per-class table followed by the confusion matrix.
    pub fn render(&self) -> String {
        let total = self.confusion.total();
        let namew = self.class_names.iter().map(|s| s.chars().count()).max().unwrap_or(0).max(12);
        let mut lines = vec![
            "=== Classification Report ===".to_string(),
            format!("{:>namew$} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support"),
            String::new(),
        ];
        for m in &self.per_class {
            lines.push(format!(
                "{:>namew$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                m.name, m.precision, m.recall, m.f1, m.support
            ));
        }
        lines.push(String::new());
        lines.push(format!("{:>namew$} {:>10} {:>10} {:>10.4} {:>10}", "accuracy", "", "", self.accuracy, total));
        lines.push(format!(
            "{:>namew$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            "macro avg", self.macro_precision, self.macro_recall, self.macro_f1, total
        ));
        lines.push(format!(
            "{:>namew$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            "micro avg", self.micro_precision, self.micro_recall, self.micro_f1, total
        ));

        let cm_name = self.class_names.iter().map(|s| s.chars().count()).max().unwrap_or(0).max(5);
        let max_count = self.confusion.counts.iter().flatten().copied().max().unwrap_or(0);
        let cellw = self
            .class_names
            .iter()
            .map(|s| s.chars().count())
            .chain(std::iter::once(max_count.to_string().len()))
            .max()
            .unwrap_or(0)
            .max(3);
        lines.push(String::new());
        lines.push("Confusion Matrix (rows=true, cols=pred):".to_string());
        let header: Vec<String> = self.class_names.iter().map(|s| format!("{s:>cellw$}")).collect();
        lines.push(format!("{}{}", " ".repeat(cm_name + 3), header.join(" ")));
        for (i, row) in self.confusion.counts.iter().enumerate() {
            let cells: Vec<String> = row.iter().map(|v| format!("{v:>cellw$}")).collect();
            lines.push(format!("{:>cm_name$} | {}", self.class_names[i], cells.join(" ")));
        }
        lines.push(String::new());
        lines.push(format!("Overall accuracy: {:.4}", self.accuracy));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn confusion_sums_match_class_counts() {
        let truth = [0, 0, 1, 2, 2, 2];
        let pred = [0, 1, 1, 2, 0, 2];
        let cm = ConfusionMatrix::from_labels(&truth, &pred, 3);
        assert_eq!(cm.row_sums(), vec![2, 1, 3]);
        assert_eq!(cm.col_sums(), vec![2, 2, 2]);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn per_class_and_macro_values() {
        let m = ClassificationMetrics::compute(&[0, 0, 1, 1], &[0, 1, 1, 1], &names(&["B", "M"]));
        assert_eq!(m.per_class[0].precision, 1.0);
        assert_eq!(m.per_class[0].recall, 0.5);
        assert!((m.per_class[1].precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.accuracy, 0.75);
        assert_eq!(m.micro_f1, m.accuracy);
        assert!((m.macro_recall - 0.75).abs() < 1e-12);
    }

    #[test]
    fn absent_class_has_zero_f1() {
        let m = ClassificationMetrics::compute(&[0, 0], &[0, 0], &names(&["a", "b"]));
        assert_eq!(m.per_class[1].f1, 0.0);
        assert_eq!(m.confusion.counts, vec![vec![2, 0], vec![0, 0]]);
    }

    #[test]
    fn report_lists_class_names_in_matrix_headers() {
        let m = ClassificationMetrics::compute(&[0, 1], &[0, 1], &names(&["B", "M"]));
        let text = m.render();
        assert!(text.contains("Confusion Matrix (rows=true, cols=pred):"));
        assert!(text.contains("macro avg"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("B |")));
    }
}
