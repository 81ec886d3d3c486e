//! Slicer CLI
//!
//! Splits a video into fixed-length MP4 segments with ffmpeg.
//!
//! # Usage
//!
//! ```bash
//! slicer slice --input movie.mov --segment-seconds 15
//! slicer slice --input movie.mov --fast-copy --audio-track 1 --json
//! slicer inspect --input movie.mov --segment-seconds 30
//! slicer check
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use slicer_cli::adapters::{TomlConfigAdapter, TracingLogAdapter};
use slicer_cli::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    TracingLogAdapter::init(&cli.log_level, cli.log_format)?;
    debug!("Starting slicer");

    let settings = TomlConfigAdapter::load(cli.config.as_deref())
        .context("Failed to load settings")?;

    match cli.command {
        Commands::Slice(args) => {
            info!(input = %args.input.display(), "Executing slice command");
            commands::slice(args, &settings).await?;
        }
        Commands::Inspect(args) => {
            info!(input = %args.input.display(), "Executing inspect command");
            commands::inspect(args, &settings).await?;
        }
        Commands::Check(args) => {
            debug!("Executing check command");
            commands::check(args, &settings).await?;
        }
    }

    Ok(())
}
