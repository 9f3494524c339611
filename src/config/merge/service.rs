//! MergeService: orchestrates sources and deserializes to TaskfsConfig.

use super::builder_with_defaults;
use crate::config::sources::{environment, file};
use crate::config::TaskfsConfig;
use config::ConfigError;
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from the standard sources.
    /// Precedence: defaults -> global file -> explicit file -> environment.
    pub fn load(explicit: Option<&Path>) -> Result<TaskfsConfig, ConfigError> {
        let builder = builder_with_defaults()?;
        let builder = file::add_global(builder);
        let builder = match explicit {
            Some(path) => file::add_explicit(builder, path),
            None => builder,
        };
        let builder = environment::add_to_builder(builder);

        builder.build()?.try_deserialize()
    }

    /// Load one file with environment overlay, skipping the global file.
    pub fn load_from_file(path: &Path) -> Result<TaskfsConfig, ConfigError> {
        let builder = file::add_explicit(builder_with_defaults()?, path);
        let builder = environment::add_to_builder(builder);

        builder.build()?.try_deserialize()
    }
}
