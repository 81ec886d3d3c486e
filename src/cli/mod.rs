//! CLI module for the slicer
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::adapters::LogFormat;

pub mod args;
pub mod commands;

/// Slice videos into fixed-length segments with ffmpeg
#[derive(Parser)]
#[command(name = "slicer")]
#[command(about = "Slice videos into fixed-length MP4 segments")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level or filter directive (e.g. `debug`, `slicer_cli=trace`)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format: text or json
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Split a video into fixed-length segments
    Slice(args::SliceArgs),
    /// Show duration, audio tracks and segment estimate
    Inspect(args::InspectArgs),
    /// Report where ffmpeg and ffprobe resolve and whether they run
    Check(args::CheckArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_slice_with_globals() {
        let cli = Cli::try_parse_from([
            "slicer",
            "slice",
            "--input",
            "movie.mov",
            "--segment-seconds",
            "30",
            "--fast-copy",
            "--audio-track",
            "1",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level, "info");
        match cli.command {
            Commands::Slice(args) => {
                assert_eq!(args.input, PathBuf::from("movie.mov"));
                assert_eq!(args.segment_seconds, Some(30));
                assert!(args.fast_copy);
                assert_eq!(args.audio_track, Some(1));
                assert_eq!(args.output_dir, None);
            }
            _ => panic!("expected slice"),
        }
    }

    #[test]
    fn test_negative_segment_seconds_reaches_validation() {
        let cli = Cli::try_parse_from([
            "slicer",
            "slice",
            "--input",
            "movie.mov",
            "--segment-seconds",
            "-5",
        ])
        .unwrap();
        match cli.command {
            Commands::Slice(args) => assert_eq!(args.segment_seconds, Some(-5)),
            _ => panic!("expected slice"),
        }
    }

    #[test]
    fn test_crf_out_of_range_rejected() {
        let result = Cli::try_parse_from([
            "slicer", "slice", "--input", "movie.mov", "--crf", "52",
        ]);
        assert!(result.is_err());
    }
}
