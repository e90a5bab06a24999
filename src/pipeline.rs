//! One end-to-end run: load, resolve, preprocess, normalize, split, train,
//! evaluate, report, cache.

use std::path::PathBuf;

use tracing::info;

use crate::cache::{self, CacheMetadata, CachePaths};
use crate::config::RunConfig;
use crate::data::{resolve_columns, Preprocessor, Table};
use crate::error::Result;
use crate::metrics::report::MetricsReport;
use crate::metrics::score::ScoreKind;
use crate::split::train_test_split;
use crate::task::{normalize, TaskSpec};
use crate::train::predictor::Predictor;
use crate::train::{build_trainer, PauseToken, ProgressEvent, TrainData, TrainedModel};
use crate::viz::{RenderOptions, Renderer};

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub task: TaskSpec,
    pub features: Vec<String>,
    pub targets: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub model: TrainedModel,
    pub score: f64,
    pub score_kind: ScoreKind,
    pub history: Vec<ProgressEvent>,
    pub report: MetricsReport,
    pub plot_path: Option<PathBuf>,
    pub metrics_path: Option<PathBuf>,
    pub cache: Option<CachePaths>,
}

/// Runs the whole pipeline for `config`.
///
/// Progress lines and the final report go to stdout. `observer` sees every
/// progress event after the plot frame for it has been written.
pub fn run(
    config: &RunConfig,
    pause: &PauseToken,
    mut observer: Option<&mut dyn FnMut(&ProgressEvent)>,
) -> Result<RunOutcome> {
    config.validate()?;
    // Unknown or unavailable models fail here, before any data is read.
    let mut trainer = build_trainer(config.model, &config.hyperparams, config.epochs, config.seed, pause.clone())?;

    let table = Table::from_path(&config.csv_path)?;
    let features = resolve_columns(&config.features, table.headers())?;
    let targets = resolve_columns(&config.targets, table.headers())?;
    let feature_idx: Vec<usize> = features.iter().map(|r| r.index).collect();
    let target_idx: Vec<usize> = targets.iter().map(|r| r.index).collect();
    let feature_names: Vec<String> = features.iter().map(|r| r.header.clone()).collect();
    let target_names: Vec<String> = targets.iter().map(|r| r.header.clone()).collect();
    info!(features = ?feature_names, targets = ?target_names, rows = table.n_rows(), "columns resolved");

    // Preprocessing is fitted on every row before the split.
    let (pre, x) = Preprocessor::fit_transform(&table.select(&feature_idx), feature_idx.len(), config.treatment)?;
    let normalized = normalize(config.model, &target_names, &table.select(&target_idx), pre.output_dim(), None)?;
    let task = normalized.task;
    info!(
        model = %config.model,
        task = task.kind.as_str(),
        input_dim = task.feature_dim,
        classes = task.num_classes,
        "begin"
    );

    let split = train_test_split(&x, &normalized.targets, config.train_fraction, config.seed)?;
    info!(train = split.x_train.len(), test = split.x_test.len(), backend = ?trainer.backend(), "split ready");

    let mut renderer = config.plot_path.as_ref().map(|path| {
        let opts = RenderOptions {
            path: path.clone(),
            style: config.style,
            projection: config.projection,
            frame_every: config.frame_every,
            seed: config.seed,
        };
        Renderer::new(opts, x.clone(), normalized.targets.clone())
    });

    let data = TrainData {
        x_train: &split.x_train,
        y_train: &split.y_train,
        x_test: &split.x_test,
        y_test: &split.y_test,
    };
    let mut sink = |event: &ProgressEvent, model: &dyn Predictor| -> Result<()> {
        println!("{}", event.line());
        if let Some(r) = renderer.as_mut() {
            r.observe(event, model)?;
        }
        if let Some(obs) = observer.as_mut() {
            (*obs)(event);
        }
        Ok(())
    };
    let outcome = trainer.train(&data, &task, &mut sink)?;

    let predictions = outcome.model.predict(&split.x_test);
    let report = MetricsReport::evaluate(&task, &split.y_test, &predictions)?;
    println!("{}", report.render_text());
    if let Some(path) = &config.metrics_path {
        let json = report.write(path)?;
        info!(report = %path.display(), json = %json.display(), "metrics written");
    }

    let cache = match &config.cache_dir {
        Some(dir) => {
            let (score_name, score_value) = report.headline();
            let metadata = CacheMetadata {
                model_name: config.cache_name(),
                model_id: config.model,
                task: task.kind,
                input_dim: task.feature_dim,
                score_name: score_name.to_string(),
                score_value: cache::finite_score(score_value),
                class_names: task.class_names.clone(),
            };
            Some(cache::save(dir, &outcome.model, &metadata)?)
        }
        None => None,
    };

    info!(
        score = outcome.score,
        score_kind = outcome.score_kind.name(),
        cache = ?cache.as_ref().map(|c| c.model.display().to_string()),
        "done"
    );

    Ok(RunOutcome {
        task,
        features: feature_names,
        targets: target_names,
        train_rows: split.x_train.len(),
        test_rows: split.x_test.len(),
        model: outcome.model,
        score: outcome.score,
        score_kind: outcome.score_kind,
        history: outcome.history,
        report,
        plot_path: config.plot_path.clone(),
        metrics_path: config.metrics_path.clone(),
        cache,
    })
}
