pub mod table;
pub mod resolver;
pub mod preprocess;

pub use table::Table;
pub use resolver::{resolve_column, resolve_columns, MatchKind, Resolved};
pub use preprocess::{DataTreatment, ImputeStrategy, Preprocessor, ScaleMethod};
