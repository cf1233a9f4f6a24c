pub mod applicator;
pub mod loader;
pub mod schema;

pub use applicator::{apply_plan, apply_plan_to_file, FileReport, PlanError};
pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{Metadata, PlanConfig, RequestDefinition, ValidationError, ValidationIssue};
