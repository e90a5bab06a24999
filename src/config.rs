//! Run configuration, built once from the command line and threaded through
//! every component.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::data::preprocess::DataTreatment;
use crate::error::{FitError, Result};
use crate::task::ModelChoice;
use crate::viz::projection::Projection;

// ---------------------------------------------------------------------------
// Plot style
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotStyle {
    /// Data-fit view only.
    #[default]
    Modern,
    /// Bevelled gray frame with a score-history strip above the data view.
    Retro95,
}

impl FromStr for PlotStyle {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modern" => Ok(PlotStyle::Modern),
            "retro95" | "retro" => Ok(PlotStyle::Retro95),
            other => Err(FitError::InvalidConfig(format!("unknown plot style '{other}'"))),
        }
    }
}

impl fmt::Display for PlotStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlotStyle::Modern => "modern",
            PlotStyle::Retro95 => "retro95",
        })
    }
}

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

/// Free-form per-model overrides parsed from the `--hparams` JSON blob.
///
/// Accessors fall back to the caller's default when a key is absent or has
/// the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hyperparams(Map<String, Value>);

impl Hyperparams {
    /// Parses a JSON object. Invalid JSON or a non-object value is logged
    /// and treated as an empty blob.
    pub fn parse(blob: &str) -> Hyperparams {
        if blob.trim().is_empty() {
            return Hyperparams::default();
        }
        match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(map)) => Hyperparams(map),
            Ok(other) => {
                warn!(value = %other, "hyperparameters are not a JSON object; ignoring");
                Hyperparams::default()
            }
            Err(e) => {
                warn!(error = %e, "invalid hyperparameter JSON; ignoring");
                Hyperparams::default()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Hyperparams {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Numbers, and strings that parse as numbers, are accepted.
    pub fn opt_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn f64_or(&self, key: &str, default: f64) -> f64 {
        self.opt_f64(key).unwrap_or(default)
    }

    pub fn opt_usize(&self, key: &str) -> Option<usize> {
        let v = self.opt_f64(key)?;
        if v.is_finite() && v >= 0.0 {
            Some(v.round() as usize)
        } else {
            None
        }
    }

    pub fn usize_or(&self, key: &str, default: usize) -> usize {
        self.opt_usize(key).unwrap_or(default)
    }

    pub fn opt_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn str_or(&self, key: &str, default: &str) -> String {
        self.opt_str(key).unwrap_or_else(|| default.to_string())
    }
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Everything one training run needs. Nothing reads the environment after
/// this struct is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    pub features: Vec<String>,
    pub targets: Vec<String>,
    pub model: ModelChoice,
    pub epochs: usize,
    pub train_fraction: f64,
    pub seed: u64,
    pub projection: Projection,
    pub plot_path: Option<PathBuf>,
    pub metrics_path: Option<PathBuf>,
    /// Render every N epochs; the final epoch is always rendered.
    pub frame_every: usize,
    pub style: PlotStyle,
    pub hyperparams: Hyperparams,
    pub treatment: DataTreatment,
    /// `None` disables the model cache.
    pub cache_dir: Option<PathBuf>,
    pub model_name: Option<String>,
}

impl RunConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(
        csv_path: impl Into<PathBuf>,
        features: Vec<String>,
        targets: Vec<String>,
        model: ModelChoice,
    ) -> RunConfig {
        RunConfig {
            csv_path: csv_path.into(),
            features,
            targets,
            model,
            epochs: 100,
            train_fraction: 0.70,
            seed: 123,
            projection: Projection::Pca2,
            plot_path: None,
            metrics_path: None,
            frame_every: 1,
            style: PlotStyle::Modern,
            hyperparams: Hyperparams::default(),
            treatment: DataTreatment::default(),
            cache_dir: Some(PathBuf::from("./cache")),
            model_name: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.features.is_empty() {
            return Err(FitError::InvalidConfig("at least one feature column is required".into()));
        }
        if self.targets.is_empty() {
            return Err(FitError::InvalidConfig("at least one target column is required".into()));
        }
        if self.epochs == 0 {
            return Err(FitError::InvalidConfig("epochs must be at least 1".into()));
        }
        if !self.train_fraction.is_finite() {
            return Err(FitError::InvalidConfig("train fraction must be a finite number".into()));
        }
        Ok(())
    }

    /// Name under which the trained model is cached.
    pub fn cache_name(&self) -> String {
        self.model_name.clone().unwrap_or_else(|| self.model.as_str().to_string())
    }
}

/// Splits a comma-separated column list, dropping empty entries.
pub fn split_columns(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_hparams_are_ignored() {
        assert!(Hyperparams::parse("{not json").is_empty());
        assert!(Hyperparams::parse("[1, 2]").is_empty());
    }

    #[test]
    fn typed_accessors_fall_back_to_defaults() {
        let hp = Hyperparams::parse(r#"{"lr": 0.1, "hidden": "32", "kernel": "linear"}"#);
        assert_eq!(hp.f64_or("lr", 1.0), 0.1);
        assert_eq!(hp.usize_or("hidden", 8), 32);
        assert_eq!(hp.str_or("kernel", "rbf"), "linear");
        assert_eq!(hp.usize_or("layers", 2), 2);
        assert_eq!(hp.opt_usize("max_depth"), None);
    }

    #[test]
    fn column_lists_are_trimmed() {
        assert_eq!(split_columns(" a, b ,,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = RunConfig::new("x.csv", vec!["a".into()], vec!["y".into()], ModelChoice::LinReg);
        assert_eq!(cfg.epochs, 100);
        assert_eq!(cfg.seed, 123);
        assert_eq!(cfg.train_fraction, 0.70);
        assert_eq!(cfg.cache_name(), "linreg");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn plot_style_parses() {
        assert_eq!("Retro95".parse::<PlotStyle>().unwrap(), PlotStyle::Retro95);
        assert!("neon".parse::<PlotStyle>().is_err());
    }
}
