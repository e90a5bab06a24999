use serde::{Deserialize, Serialize};

use crate::metrics::classification::f1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultilabelMetrics {
    pub labels: Vec<String>,
    pub micro_f1: f64,
    pub macro_f1: f64,
    pub exact_match: f64,
    pub per_label_f1: Vec<f64>,
}

fn counts(truth: &[Vec<u8>], pred: &[Vec<u8>], label: usize) -> (usize, usize, usize) {
    let (mut tp, mut fp, mut fn_) = (0, 0, 0);
    for (t, p) in truth.iter().zip(pred) {
        match (t.get(label).copied().unwrap_or(0), p.get(label).copied().unwrap_or(0)) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (1, 0) => fn_ += 1,
            _ => {}
        }
    }
    (tp, fp, fn_)
}

fn f1_from_counts(tp: usize, fp: usize, fn_: usize) -> f64 {
    let precision = if tp + fp == 0 { 0.0 } else { tp as f64 / (tp + fp) as f64 };
    let recall = if tp + fn_ == 0 { 0.0 } else { tp as f64 / (tp + fn_) as f64 };
    f1(precision, recall)
}

/// Micro-F1 over the whole indicator matrix.
pub fn micro_f1(truth: &[Vec<u8>], pred: &[Vec<u8>]) -> f64 {
    let n_labels = truth.first().map_or(0, Vec::len);
    let (tp, fp, fn_) = (0..n_labels)
        .map(|l| counts(truth, pred, l))
        .fold((0, 0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));
    f1_from_counts(tp, fp, fn_)
}

/// Fraction of individual label cells predicted correctly.
pub fn label_accuracy(truth: &[Vec<u8>], pred: &[Vec<u8>]) -> f64 {
    let (mut hit, mut total) = (0usize, 0usize);
    for (t, p) in truth.iter().zip(pred) {
        for (a, b) in t.iter().zip(p) {
            total += 1;
            hit += usize::from(a == b);
        }
    }
    if total == 0 { 0.0 } else { hit as f64 / total as f64 }
}

impl MultilabelMetrics {
    pub fn compute(truth: &[Vec<u8>], pred: &[Vec<u8>], labels: &[String]) -> MultilabelMetrics {
        let n_labels = truth.first().map_or(labels.len(), Vec::len);
        let per_label_f1: Vec<f64> = (0..n_labels)
            .map(|l| {
                let (tp, fp, fn_) = counts(truth, pred, l);
                f1_from_counts(tp, fp, fn_)
            })
            .collect();
        let exact = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
        MultilabelMetrics {
            labels: labels.to_vec(),
            micro_f1: micro_f1(truth, pred),
            macro_f1: per_label_f1.iter().sum::<f64>() / per_label_f1.len().max(1) as f64,
            exact_match: if truth.is_empty() { 0.0 } else { exact as f64 / truth.len() as f64 },
            per_label_f1,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            "=== Multilabel Metrics ===".to_string(),
            format!("F1 (micro): {:.6}", self.micro_f1),
            format!("F1 (macro): {:.6}", self.macro_f1),
            format!("Exact-match accuracy: {:.6}", self.exact_match),
        ];
        if !self.per_label_f1.is_empty() {
            lines.push(String::new());
            let w = self.labels.iter().map(|s| s.chars().count()).max().unwrap_or(0).max(5);
            for (i, f) in self.per_label_f1.iter().enumerate() {
                let name = self.labels.get(i).map_or("?", String::as_str);
                lines.push(format!("{name:>w$}  F1 {f:.6}"));
            }
        }
        lines.join("\n")
    }
}
