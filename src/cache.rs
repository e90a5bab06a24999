//! Trained-model cache: `<dir>/model.<name>.cache.json` holds the
//! parameters, `<dir>/model.<name>.meta.json` a readable summary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::fsio::atomic_write;
use crate::task::{ModelChoice, TaskKind};
use crate::train::TrainedModel;

/// Sidecar summary written next to the cached parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub model_name: String,
    pub model_id: ModelChoice,
    pub task: TaskKind,
    pub input_dim: usize,
    pub score_name: String,
    /// `None` when the held-out score was not finite.
    #[serde(default)]
    pub score_value: Option<f64>,
    /// Class or label names; empty for regression.
    #[serde(default)]
    pub class_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedModel {
    pub metadata: CacheMetadata,
    pub model: TrainedModel,
}

/// Paths written by [`save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub model: PathBuf,
    pub metadata: PathBuf,
}

/// Replaces characters that are unsafe in file names with `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();
    if cleaned.is_empty() {
        "model".to_string()
    } else {
        cleaned
    }
}

pub fn cache_paths(dir: &Path, name: &str) -> CachePaths {
    let stem = sanitize_name(name);
    CachePaths {
        model: dir.join(format!("model.{stem}.cache.json")),
        metadata: dir.join(format!("model.{stem}.meta.json")),
    }
}

/// Keeps a score only when it can round-trip through JSON.
pub fn finite_score(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Writes both files, overwriting any earlier model of the same name.
pub fn save(dir: &Path, model: &TrainedModel, metadata: &CacheMetadata) -> Result<CachePaths> {
    let paths = cache_paths(dir, &metadata.model_name);
    let cached = CachedModel { metadata: metadata.clone(), model: model.clone() };
    atomic_write(&paths.model, &serde_json::to_vec(&cached)?)?;
    atomic_write(&paths.metadata, &serde_json::to_vec_pretty(metadata)?)?;
    Ok(paths)
}

pub fn load(dir: &Path, name: &str) -> Result<CachedModel> {
    let path = cache_paths(dir, name).model;
    if !path.exists() {
        return Err(FitError::Data(format!("no cached model at {}", path.display())));
    }
    Ok(serde_json::from_slice(&fs::read(&path)?)?)
}

pub fn load_metadata(dir: &Path, name: &str) -> Result<CacheMetadata> {
    let path = cache_paths(dir, name).metadata;
    Ok(serde_json::from_slice(&fs::read(path)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;
    use crate::task::TaskSpec;
    use crate::train::predictor::{Predictor, Scores};
    use crate::train::NeuralModel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample() -> (TrainedModel, CacheMetadata) {
        let mut rng = StdRng::seed_from_u64(3);
        let model = TrainedModel::Neural(NeuralModel {
            network: Network::linear(2, 1, &mut rng),
            task: TaskSpec::regression(2),
        });
        let meta = CacheMetadata {
            model_name: "my run/1".into(),
            model_id: ModelChoice::LinReg,
            task: TaskKind::Regression,
            input_dim: 2,
            score_name: "r2".into(),
            score_value: Some(0.5),
            class_names: Vec::new(),
        };
        (model, meta)
    }

    #[test]
    fn names_are_sanitized() {
        assert_eq!(sanitize_name("my run/1"), "my_run_1");
        assert_eq!(sanitize_name("  "), "model");
        assert_eq!(sanitize_name("rf_cls"), "rf_cls");
    }

    #[test]
    fn save_then_load_restores_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let (model, meta) = sample();
        let paths = save(dir.path(), &model, &meta).unwrap();
        assert!(paths.model.ends_with("model.my_run_1.cache.json"));
        assert!(paths.metadata.exists());

        let back = load(dir.path(), "my run/1").unwrap();
        assert_eq!(back.metadata, meta);
        let x = vec![vec![0.25, -1.0]];
        match (back.model.predict_scores(&x), model.predict_scores(&x)) {
            (Scores::Regression(a), Scores::Regression(b)) => assert!((a[0] - b[0]).abs() < 1e-9),
            other => panic!("unexpected scores {other:?}"),
        }
        assert_eq!(load_metadata(dir.path(), "my run/1").unwrap().score_name, "r2");
    }

    #[test]
    fn nan_score_round_trips_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let (model, mut meta) = sample();
        meta.score_value = finite_score(f64::NAN);
        save(dir.path(), &model, &meta).unwrap();
        let text = fs::read_to_string(cache_paths(dir.path(), "my run/1").metadata).unwrap();
        assert!(text.contains("\"score_value\": null"));
        assert_eq!(load_metadata(dir.path(), "my run/1").unwrap().score_value, None);
        assert_eq!(finite_score(0.25), Some(0.25));
    }

    #[test]
    fn missing_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path(), "nothing").is_err());
    }
}
