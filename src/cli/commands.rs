//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::app::{AppContainer, DefaultAppContainer};
use crate::cli::args::{CheckArgs, InspectArgs, SliceArgs};
use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Execute the slice command
pub async fn slice(args: SliceArgs, settings: &SlicerSettings) -> Result<()> {
    let segment_seconds = args
        .segment_seconds
        .unwrap_or_else(|| i64::from(settings.defaults.segment_seconds));
    let config = SliceConfig::new(segment_seconds, args.fast_copy, args.audio_track)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.input));
    let request = SliceRequest::new(args.input.clone(), output_dir, config)?;

    if !request.input_path.is_file() {
        bail!(
            "Input file does not exist: {}",
            request.input_path.display()
        );
    }

    let mut settings = settings.clone();
    if let Some(crf) = args.crf {
        settings.encoder.crf = crf;
    }
    if let Some(preset) = args.preset {
        settings.encoder.preset = preset;
    }

    let container = DefaultAppContainer::new(&settings);
    if !container.inspect_interactor().is_available(Tool::Ffmpeg).await {
        return Err(DomainError::tool_unavailable(Tool::Ffmpeg.name()))
            .context("Cannot start slicing; install ffmpeg or set [tools] ffmpeg in the settings file");
    }

    let mut handle = container
        .slice_interactor()
        .spawn_job(request)
        .await
        .context("Failed to start slicing job")?;
    if !args.json {
        println!("Writing segments to {}", handle.output_pattern().display());
    }

    let mut cancelled = false;
    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) if !args.json => println!("{}", progress_line(&event)),
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !cancelled => {
                warn!("Interrupted, stopping ffmpeg");
                handle.cancel();
                cancelled = true;
            }
        }
    }

    let report = handle.finish().await.context("Slicing failed")?;
    info!(segments = report.output_files.len(), "Slice command completed");

    if args.json {
        print_json(&report)?;
    } else {
        println!(
            "Done: {} segment(s) in {:.1}s",
            report.output_files.len(),
            report.elapsed.as_secs_f64()
        );
        for file in &report.output_files {
            println!("  {}", file.display());
        }
    }
    Ok(())
}

/// Execute the inspect command
pub async fn inspect(args: InspectArgs, settings: &SlicerSettings) -> Result<()> {
    if !args.input.is_file() {
        bail!("Input file does not exist: {}", args.input.display());
    }
    if args.segment_seconds == Some(0) {
        return Err(DomainError::InvalidConfig(
            "segment length must be a positive number of seconds".to_string(),
        )
        .into());
    }

    let container = DefaultAppContainer::new(settings);
    let summary = container
        .inspect_interactor()
        .inspect(&args.input, args.segment_seconds)
        .await;

    if args.json {
        return print_json(&summary);
    }

    println!("File:     {}", summary.input_path.display());
    match summary.duration_seconds {
        Some(seconds) => println!("Duration: {} ({:.3}s)", format_duration(seconds), seconds),
        None => println!("Duration: unknown"),
    }
    if let (Some(seconds), Some(estimate)) = (summary.segment_seconds, summary.estimated_segments) {
        println!("Segments: ~{} of {}s", estimate, seconds);
    }
    if summary.audio_tracks.is_empty() {
        println!("Audio:    none found");
    } else {
        println!("Audio:");
        for track in &summary.audio_tracks {
            println!("  [{}] {}", track.position, track.label);
        }
    }
    Ok(())
}

/// Execute the check command; fails when a tool is unavailable
pub async fn check(args: CheckArgs, settings: &SlicerSettings) -> Result<()> {
    let container = DefaultAppContainer::new(settings);
    let statuses = container.inspect_interactor().check_tools().await;

    if args.json {
        print_json(&statuses)?;
    } else {
        for status in &statuses {
            let state = if status.available { "ok" } else { "unavailable" };
            println!("{:<8} {:<12} {}", status.tool.name(), state, status.path.display());
            if let Some(version) = &status.version {
                println!("         {}", version);
            }
        }
    }

    if let Some(missing) = statuses.iter().find(|s| !s.available) {
        return Err(DomainError::tool_unavailable(missing.tool.name()).into());
    }
    Ok(())
}

/// `clips` next to the input file
pub fn default_output_dir(input: &Path) -> PathBuf {
    input
        .parent()
        .map(|parent| parent.join("clips"))
        .unwrap_or_else(|| PathBuf::from("clips"))
}

/// Percentage when the total is known, a plain count otherwise
pub fn progress_line(event: &ProgressEvent) -> String {
    match (event.fraction(), event.segments_total) {
        (Some(fraction), Some(total)) => format!(
            "[{:>3.0}%] segment {}/{}",
            fraction * 100.0,
            event.segments_done,
            total
        ),
        _ => format!("segments written: {}", event.segments_done),
    }
}

/// Seconds as `HH:MM:SS.mmm`
pub fn format_duration(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let (hours, rest) = (total_ms / 3_600_000, total_ms % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, rest / 1000, rest % 1000)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/videos/movie.mov")),
            PathBuf::from("/videos/clips")
        );
        assert_eq!(default_output_dir(Path::new("movie.mov")), PathBuf::from("clips"));
    }

    #[test]
    fn test_progress_line() {
        assert_eq!(
            progress_line(&ProgressEvent::new(1, Some(4))),
            "[ 25%] segment 1/4"
        );
        assert_eq!(
            progress_line(&ProgressEvent::new(7, None)),
            "segments written: 7"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00:00.000");
        assert_eq!(format_duration(40.5), "00:00:40.500");
        assert_eq!(format_duration(3725.25), "01:02:05.250");
    }
}
