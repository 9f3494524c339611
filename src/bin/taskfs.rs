//! taskfs CLI Binary
//!
//! Command-line interface for archive-backed task and answer collections.

use anyhow::Context;
use clap::Parser;
use taskfs::config::ConfigLoader;
use taskfs::logging::init_logging;
use taskfs::tooling::cli::{Cli, CliContext};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        ConfigLoader::load(cli.config.as_deref()).context("Error loading configuration")?;
    cli.apply_logging_overrides(&mut config.logging);
    init_logging(&config.logging).context("Error initializing logging")?;

    let context = CliContext::new(config).context("Error opening collection store")?;
    let output = context.execute(&cli.command)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    output.write_to(&mut handle)?;
    Ok(())
}
