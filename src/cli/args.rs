//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the slice command
#[derive(Args, Debug)]
pub struct SliceArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output directory (default: `clips` next to the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Segment length in seconds (default: 15, or the settings file)
    #[arg(short, long, allow_negative_numbers = true)]
    pub segment_seconds: Option<i64>,

    /// Copy streams instead of re-encoding; cuts snap to keyframes
    #[arg(long)]
    pub fast_copy: bool,

    /// Audio track position among the audio streams (0 = first)
    #[arg(short, long)]
    pub audio_track: Option<u32>,

    /// Constant Rate Factor for re-encoding (0-51)
    #[arg(long, value_parser = crf_in_range)]
    pub crf: Option<u8>,

    /// Encoding preset for re-encoding
    #[arg(long)]
    pub preset: Option<String>,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Segment length used for the estimate
    #[arg(short, long)]
    pub segment_seconds: Option<u32>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

fn crf_in_range(s: &str) -> Result<u8, String> {
    clap_num::number_range(s, 0, 51)
}
