//! janitor - tidy a directory by file extension
//!
//! This library resolves an extension-to-category mapping from YAML
//! configuration (or built-in defaults) and moves the files of a directory
//! into one subfolder per category, never overwriting anything.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod output;

pub use config::{CategoryMapping, Config, ConfigError, ConfigSource, LoadedConfig};
pub use file_category::CategoryIndex;
pub use file_organizer::{OrganizeError, Organizer, RunContext, RunReport};

pub use cli::{OrganizeCommand, run_cli_with_config};
