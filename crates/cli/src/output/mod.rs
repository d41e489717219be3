pub mod format;
pub mod model;
pub mod result_builder;

pub use format::OutputFormat;
pub use model::{CommandError, CommandResult, ErrorCode, SCHEMA_VERSION};
pub use result_builder::{print_result, ResultBuilder};
