//! TOML file sources: the optional global file and an explicit `--config` file.

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, File, FileFormat};
use std::path::Path;

/// Add the global config file if it exists.
pub fn add_global(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    match xdg::global_config_file() {
        Ok(path) => builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        ),
        Err(e) => {
            tracing::debug!("Skipping global config file: {}", e);
            builder
        }
    }
}

/// Add a file the caller named explicitly. It must exist.
pub fn add_explicit(builder: ConfigBuilder<DefaultState>, path: &Path) -> ConfigBuilder<DefaultState> {
    builder.add_source(File::from(path).format(FileFormat::Toml).required(true))
}
