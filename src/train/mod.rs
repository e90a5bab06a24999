pub mod gradient;
pub mod neural;
pub mod pause;
pub mod predictor;
pub mod progress;
pub mod trainer;
#[cfg(feature = "classical")]
pub mod classical;

pub use gradient::{GradientConfig, GradientTrainer};
pub use neural::NeuralModel;
pub use pause::PauseToken;
pub use predictor::{Predictor, Scores};
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use trainer::{build_trainer, TrainData, TrainOutcome, TrainedModel, Trainer};
#[cfg(feature = "classical")]
pub use classical::ClassicalTrainer;
