//! Environment variable source: TASKFS__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const ENV_PREFIX: &str = "TASKFS";

/// Add environment variable overlay to builder.
///
/// `TASKFS__STORAGE__ROOT=/srv/blobs` sets `storage.root`. The double
/// underscore keeps these apart from the `TASKFS_LOG*` logging overrides.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
