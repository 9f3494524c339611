//! Merge policy: defaults first, then each source overrides what it sets.

pub mod service;

use super::TaskfsConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Builder seeded with the serialized default configuration.
pub(crate) fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let defaults = Config::try_from(&TaskfsConfig::default())?;
    Ok(Config::builder().add_source(defaults))
}
