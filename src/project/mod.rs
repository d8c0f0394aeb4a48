//! Host configuration and workspace loading.

mod schema;
mod settings;
mod workspace_loader;

pub use schema::SchemaHelp;
pub use settings::{EvaluationPolicy, Settings, SettingsError};
pub use workspace_loader::{LoadError, WorkspaceLoader, is_msbuild_file};
