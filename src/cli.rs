//! Command-line flags shared by the `ferrite-fit` and `monitor` binaries.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser};
use tracing_subscriber::EnvFilter;

use crate::config::{split_columns, Hyperparams, PlotStyle, RunConfig};
use crate::data::{DataTreatment, ImputeStrategy, ScaleMethod};
use crate::error::{FitError, Result};
use crate::task::ModelChoice;
use crate::viz::Projection;

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Input CSV file with a header row
    #[arg(long)]
    pub csv: PathBuf,

    /// Feature column name(s), comma separated
    #[arg(long = "x", alias = "x-col", value_name = "COLUMNS")]
    pub x: String,

    /// Target column name(s), comma separated; several 0/1 columns make a
    /// multilabel task for classifiers
    #[arg(long = "y", alias = "y-col", value_name = "COLUMNS")]
    pub y: String,

    /// linreg, ridge, lasso, mlp_reg, logreg, mlp_cls, dt_cls, rf_cls,
    /// knn_cls, nb_cls, svm_cls, gb_cls, dt_reg, rf_reg, knn_reg, nb_reg,
    /// svm_reg or gb_reg
    #[arg(long, default_value = "linreg", value_parser = clap::value_parser!(ModelChoice))]
    pub model: ModelChoice,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Fraction of rows used for training
    #[arg(long = "train-pct", default_value_t = 0.70)]
    pub train_pct: f64,

    /// Seed for the split and model initialisation
    #[arg(long, default_value_t = 123)]
    pub seed: u64,

    /// Projection for data with more than two features: none, pca2, tsne2
    #[arg(long, default_value = "pca2", value_parser = clap::value_parser!(Projection))]
    pub proj: Projection,

    /// Render a plot frame every N epochs (the last epoch always renders)
    #[arg(long = "frame-every", alias = "plot-every", default_value_t = 1)]
    pub frame_every: usize,

    /// Live plot PNG path; no plot when omitted
    #[arg(long = "out-plot")]
    pub out_plot: Option<PathBuf>,

    /// Metrics report path; a JSON copy is written next to it
    #[arg(long = "out-metrics")]
    pub out_metrics: Option<PathBuf>,

    /// modern or retro95
    #[arg(
        long = "plot-style",
        env = "FERRITE_PLOT_STYLE",
        default_value = "modern",
        value_parser = clap::value_parser!(PlotStyle)
    )]
    pub plot_style: PlotStyle,

    /// JSON object of hyperparameter overrides, e.g. '{"lr": 0.01}'
    #[arg(long, default_value = "")]
    pub hparams: String,

    /// none, standard or minmax
    #[arg(long, default_value = "standard", value_parser = clap::value_parser!(ScaleMethod))]
    pub scale: ScaleMethod,

    /// mean, median, most_frequent or zero
    #[arg(long, default_value = "mean", value_parser = clap::value_parser!(ImputeStrategy))]
    pub impute: ImputeStrategy,

    /// One-hot encode categorical feature columns
    #[arg(long)]
    pub onehot: bool,

    #[arg(long = "cache-dir", default_value = "./cache")]
    pub cache_dir: PathBuf,

    /// Do not write the model cache
    #[arg(long = "no-cache")]
    pub no_cache: bool,

    /// Cache name; defaults to the model identifier
    #[arg(long = "model-name")]
    pub model_name: Option<String>,
}

impl RunArgs {
    /// Builds and validates the run configuration.
    pub fn into_config(self) -> Result<RunConfig> {
        let features = split_columns(&self.x);
        let targets = split_columns(&self.y);
        if features.is_empty() || targets.is_empty() {
            return Err(FitError::InvalidConfig("--x and --y need at least one column name each".into()));
        }

        let mut config = RunConfig::new(self.csv, features, targets, self.model);
        config.epochs = self.epochs;
        config.train_fraction = self.train_pct;
        config.seed = self.seed;
        config.projection = self.proj;
        config.frame_every = self.frame_every;
        config.plot_path = self.out_plot.filter(|p| !p.as_os_str().is_empty());
        config.metrics_path = self.out_metrics.filter(|p| !p.as_os_str().is_empty());
        config.style = self.plot_style;
        config.hyperparams = Hyperparams::parse(&self.hparams);
        config.treatment = DataTreatment {
            scale: self.scale,
            impute: self.impute,
            onehot: self.onehot,
        };
        config.cache_dir = (!self.no_cache).then_some(self.cache_dir);
        config.model_name = self.model_name.filter(|n| !n.trim().is_empty());
        config.validate()?;
        Ok(config)
    }
}

/// Parses the process arguments. Help and version exit 0; a bad flag or
/// value exits 1 like every other fatal error.
pub fn parse_args<P: Parser>() -> std::result::Result<P, ExitCode> {
    P::try_parse().map_err(|e| {
        let _ = e.print();
        if e.use_stderr() {
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        }
    })
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the default
/// `ferrite_fit=info` filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ferrite_fit=info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
