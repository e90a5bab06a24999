pub mod model_choice;
pub mod labels;

pub use model_choice::{Backend, Family, ModelChoice};
pub use labels::{normalize, LabelEncoder, Normalized, Targets, TaskKind, TaskSpec};
