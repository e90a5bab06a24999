pub mod regression;
pub mod classification;
pub mod multilabel;
pub mod score;
pub mod report;

pub use regression::{r2_score, RegressionMetrics};
pub use classification::{ClassMetrics, ClassificationMetrics, ConfusionMatrix};
pub use multilabel::MultilabelMetrics;
pub use score::ScoreKind;
pub use report::MetricsReport;
