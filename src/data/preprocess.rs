//! Feature preprocessing: imputation, scaling and categorical encoding.
//!
//! Output column order is every numeric feature first (in request order),
//! then every categorical feature.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};

const MISSING: [&str; 8] = ["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

pub fn is_missing(cell: &str) -> bool {
    MISSING.contains(&cell.trim())
}

fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

// ---------------------------------------------------------------------------
// Treatment options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMethod {
    #[default]
    Standard,
    MinMax,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    #[default]
    Mean,
    Median,
    MostFrequent,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataTreatment {
    pub scale: ScaleMethod,
    pub impute: ImputeStrategy,
    pub onehot: bool,
}

impl FromStr for ScaleMethod {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(ScaleMethod::Standard),
            "minmax" => Ok(ScaleMethod::MinMax),
            "none" => Ok(ScaleMethod::None),
            other => Err(FitError::InvalidConfig(format!("unknown scaling method '{other}'"))),
        }
    }
}

impl FromStr for ImputeStrategy {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(ImputeStrategy::Mean),
            "median" => Ok(ImputeStrategy::Median),
            "most_frequent" => Ok(ImputeStrategy::MostFrequent),
            "zero" => Ok(ImputeStrategy::Zero),
            other => Err(FitError::InvalidConfig(format!("unknown imputation strategy '{other}'"))),
        }
    }
}

impl fmt::Display for ScaleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScaleMethod::Standard => "standard",
            ScaleMethod::MinMax => "minmax",
            ScaleMethod::None => "none",
        })
    }
}

impl fmt::Display for ImputeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImputeStrategy::Mean => "mean",
            ImputeStrategy::Median => "median",
            ImputeStrategy::MostFrequent => "most_frequent",
            ImputeStrategy::Zero => "zero",
        })
    }
}

// ---------------------------------------------------------------------------
// Fitted column plans
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NumericPlan {
    column: usize,
    fill: f64,
    shift: f64,
    scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct CategoricalPlan {
    column: usize,
    fill: String,
    categories: Vec<String>,
}

impl NumericPlan {
    fn apply(&self, cell: &str, row: usize) -> Result<f64> {
        let v = if is_missing(cell) {
            self.fill
        } else {
            parse_cell(cell).ok_or_else(|| {
                FitError::Data(format!("row {}: '{}' is not numeric", row + 1, cell))
            })?
        };
        Ok((v - self.shift) / self.scale)
    }
}

impl CategoricalPlan {
    fn value<'a>(&'a self, cell: &'a str) -> &'a str {
        if is_missing(cell) { &self.fill } else { cell }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Most frequent value; ties go to the smallest.
fn mode_f64(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut best = (0.0, 0usize);
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        if j - i > best.1 {
            best = (sorted[i], j - i);
        }
        i = j;
    }
    best.0
}

fn mode_str(values: &[&str]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (v, c) in counts {
        if best.map_or(true, |(_, bc)| c > bc) {
            best = Some((v, c));
        }
    }
    best.map(|(v, _)| v.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Preprocessor
// ---------------------------------------------------------------------------

/// Fitted preprocessing pipeline for the requested feature columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    treatment: DataTreatment,
    n_columns: usize,
    numeric: Vec<NumericPlan>,
    categorical: Vec<CategoricalPlan>,
}

impl Preprocessor {
    /// Learns imputation values, scaler parameters and categories from
    /// `rows` (row-major feature cells).
    pub fn fit(rows: &[Vec<String>], n_columns: usize, treatment: DataTreatment) -> Result<Preprocessor> {
        if let Some(row) = rows.iter().find(|r| r.len() != n_columns) {
            return Err(FitError::Data(format!(
                "feature row has {} cells, expected {}",
                row.len(),
                n_columns
            )));
        }

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for column in 0..n_columns {
            let cells: Vec<&str> = rows.iter().map(|r| r[column].as_str()).collect();
            let present: Vec<&str> = cells.iter().copied().filter(|c| !is_missing(c)).collect();
            let parsed: Option<Vec<f64>> = present.iter().map(|c| parse_cell(c)).collect();

            match parsed {
                Some(values) => {
                    let fill = match treatment.impute {
                        ImputeStrategy::Mean => mean(&values),
                        ImputeStrategy::Median => median(&values),
                        ImputeStrategy::MostFrequent => mode_f64(&values),
                        ImputeStrategy::Zero => 0.0,
                    };
                    let imputed: Vec<f64> = cells
                        .iter()
                        .map(|c| if is_missing(c) { fill } else { parse_cell(c).unwrap_or(fill) })
                        .collect();
                    let (shift, scale) = match treatment.scale {
                        ScaleMethod::Standard => {
                            let mu = mean(&imputed);
                            let var = mean(&imputed.iter().map(|v| (v - mu).powi(2)).collect::<Vec<_>>());
                            let sd = var.sqrt();
                            (mu, if sd > 0.0 { sd } else { 1.0 })
                        }
                        ScaleMethod::MinMax => {
                            let lo = imputed.iter().cloned().fold(f64::INFINITY, f64::min);
                            let hi = imputed.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                            if imputed.is_empty() {
                                (0.0, 1.0)
                            } else {
                                let range = hi - lo;
                                (lo, if range > 0.0 { range } else { 1.0 })
                            }
                        }
                        ScaleMethod::None => (0.0, 1.0),
                    };
                    numeric.push(NumericPlan { column, fill, shift, scale });
                }
                None => {
                    let fill = match treatment.impute {
                        ImputeStrategy::Zero => String::new(),
                        _ => mode_str(&present),
                    };
                    let mut categories: Vec<String> = cells
                        .iter()
                        .map(|c| if is_missing(c) { fill.clone() } else { c.to_string() })
                        .collect();
                    categories.sort();
                    categories.dedup();
                    categorical.push(CategoricalPlan { column, fill, categories });
                }
            }
        }

        Ok(Preprocessor { treatment, n_columns, numeric, categorical })
    }

    pub fn fit_transform(
        rows: &[Vec<String>],
        n_columns: usize,
        treatment: DataTreatment,
    ) -> Result<(Preprocessor, Vec<Vec<f64>>)> {
        let pre = Preprocessor::fit(rows, n_columns, treatment)?;
        let x = pre.transform(rows)?;
        Ok((pre, x))
    }

    /// Applies the fitted plans. Unknown categories encode as all-zero
    /// one-hot blocks, or -1 under ordinal encoding.
    pub fn transform(&self, rows: &[Vec<String>]) -> Result<Vec<Vec<f64>>> {
        let width = self.output_dim();
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != self.n_columns {
                    return Err(FitError::Data(format!(
                        "row {} has {} feature cells, expected {}",
                        i + 1,
                        row.len(),
                        self.n_columns
                    )));
                }
                let mut out = Vec::with_capacity(width);
                for plan in &self.numeric {
                    out.push(plan.apply(&row[plan.column], i)?);
                }
                for plan in &self.categorical {
                    let value = plan.value(&row[plan.column]);
                    let idx = plan.categories.binary_search_by(|c| c.as_str().cmp(value)).ok();
                    if self.treatment.onehot {
                        out.extend((0..plan.categories.len()).map(|k| if Some(k) == idx { 1.0 } else { 0.0 }));
                    } else {
                        out.push(idx.map_or(-1.0, |k| k as f64));
                    }
                }
                Ok(out)
            })
            .collect()
    }

    /// Number of output features after encoding.
    pub fn output_dim(&self) -> usize {
        let cat: usize = if self.treatment.onehot {
            self.categorical.iter().map(|p| p.categories.len()).sum()
        } else {
            self.categorical.len()
        };
        self.numeric.len() + cat
    }

    /// Output column names, given the input feature names.
    pub fn output_names(&self, names: &[String]) -> Vec<String> {
        let name = |c: usize| names.get(c).cloned().unwrap_or_else(|| format!("x{c}"));
        let mut out: Vec<String> = self.numeric.iter().map(|p| name(p.column)).collect();
        for plan in &self.categorical {
            if self.treatment.onehot {
                out.extend(plan.categories.iter().map(|cat| format!("{}={}", name(plan.column), cat)));
            } else {
                out.push(name(plan.column));
            }
        }
        out
    }

    pub fn numeric_columns(&self) -> usize {
        self.numeric.len()
    }

    pub fn categorical_columns(&self) -> usize {
        self.categorical.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(cells: &[&[&str]]) -> Vec<Vec<String>> {
        cells.iter().map(|r| r.iter().map(|c| c.to_string()).collect()).collect()
    }

    #[test]
    fn standard_scaling_centres_columns() {
        let data = rows(&[&["1"], &["2"], &["3"]]);
        let (_, x) = Preprocessor::fit_transform(&data, 1, DataTreatment::default()).unwrap();
        let sum: f64 = x.iter().map(|r| r[0]).sum();
        assert!(sum.abs() < 1e-12);
        assert!((x[2][0] - 1.224744871391589).abs() < 1e-9);
    }

    #[test]
    fn constant_column_does_not_divide_by_zero() {
        let data = rows(&[&["5"], &["5"]]);
        for scale in [ScaleMethod::Standard, ScaleMethod::MinMax] {
            let t = DataTreatment { scale, ..DataTreatment::default() };
            let (_, x) = Preprocessor::fit_transform(&data, 1, t).unwrap();
            assert!(x.iter().all(|r| r[0] == 0.0));
        }
    }

    #[test]
    fn missing_numeric_cells_are_imputed() {
        let data = rows(&[&["1"], &["NA"], &["3"], &["3"]]);
        let t = |impute| DataTreatment { scale: ScaleMethod::None, impute, onehot: false };
        let (_, x) = Preprocessor::fit_transform(&data, 1, t(ImputeStrategy::Mean)).unwrap();
        assert!((x[1][0] - 7.0 / 3.0).abs() < 1e-12);
        let (_, x) = Preprocessor::fit_transform(&data, 1, t(ImputeStrategy::Median)).unwrap();
        assert_eq!(x[1][0], 3.0);
        let (_, x) = Preprocessor::fit_transform(&data, 1, t(ImputeStrategy::MostFrequent)).unwrap();
        assert_eq!(x[1][0], 3.0);
        let (_, x) = Preprocessor::fit_transform(&data, 1, t(ImputeStrategy::Zero)).unwrap();
        assert_eq!(x[1][0], 0.0);
    }

    #[test]
    fn categorical_block_follows_numeric_block() {
        let data = rows(&[&["red", "1"], &["blue", "2"], &["", "3"], &["red", "4"]]);
        let t = DataTreatment { scale: ScaleMethod::None, impute: ImputeStrategy::Mean, onehot: true };
        let (pre, x) = Preprocessor::fit_transform(&data, 2, t).unwrap();
        assert_eq!(pre.output_dim(), 3);
        assert_eq!(pre.output_names(&["color".into(), "n".into()]), vec!["n", "color=blue", "color=red"]);
        assert_eq!(x[0], vec![1.0, 0.0, 1.0]);
        // missing category imputed to the most frequent ("red")
        assert_eq!(x[2], vec![3.0, 0.0, 1.0]);
    }

    #[test]
    fn ordinal_encoding_without_onehot() {
        let data = rows(&[&["b"], &["a"], &["c"]]);
        let (_, x) = Preprocessor::fit_transform(&data, 1, DataTreatment::default()).unwrap();
        assert_eq!(x, vec![vec![1.0], vec![0.0], vec![2.0]]);
    }

    #[test]
    fn row_count_is_preserved() {
        let data = rows(&[&["1", "x"], &["", ""], &["2", "y"]]);
        let (_, x) = Preprocessor::fit_transform(&data, 2, DataTreatment::default()).unwrap();
        assert_eq!(x.len(), 3);
    }
}
