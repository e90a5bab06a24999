pub mod error;
pub mod config;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod task;
pub mod split;
pub mod train;
#[cfg(feature = "classical")]
pub mod classical;
pub mod metrics;
pub mod viz;
pub mod fsio;
pub mod cache;
pub mod pipeline;
pub mod cli;

// Convenience re-exports
pub use error::{FitError, Result};
pub use config::{Hyperparams, PlotStyle, RunConfig};
pub use math::matrix::Matrix;
pub use network::network::Network;
pub use task::{ModelChoice, TaskKind, TaskSpec};
pub use train::{PauseToken, ProgressEvent, TrainedModel};
pub use metrics::report::MetricsReport;
pub use pipeline::{run, RunOutcome};
