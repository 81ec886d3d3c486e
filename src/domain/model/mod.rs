// Domain models - Core types and data structures

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Segment length used when neither the command line nor the settings file sets one
pub const DEFAULT_SEGMENT_SECONDS: u32 = 15;

/// External tools the slicer drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Transcoding tool
    Ffmpeg,
    /// Probing tool
    Ffprobe,
}

impl Tool {
    /// Executable base name
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Ffmpeg => "ffmpeg",
            Tool::Ffprobe => "ffprobe",
        }
    }

    pub fn all() -> [Tool; 2] {
        [Tool::Ffmpeg, Tool::Ffprobe]
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable parameters for one slicing job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceConfig {
    segment_seconds: u32,
    fast_copy: bool,
    audio_stream_index: Option<u32>,
}

impl SliceConfig {
    /// Create a new config, rejecting non-positive segment lengths
    pub fn new(
        segment_seconds: i64,
        fast_copy: bool,
        audio_stream_index: Option<u32>,
    ) -> Result<Self, DomainError> {
        if segment_seconds <= 0 {
            return Err(DomainError::InvalidConfig(format!(
                "segment length must be a positive number of seconds, got {}",
                segment_seconds
            )));
        }
        let segment_seconds = u32::try_from(segment_seconds).map_err(|_| {
            DomainError::InvalidConfig(format!(
                "segment length {} seconds is too large",
                segment_seconds
            ))
        })?;

        Ok(Self {
            segment_seconds,
            fast_copy,
            audio_stream_index,
        })
    }

    pub fn segment_seconds(&self) -> u32 {
        self.segment_seconds
    }

    pub fn fast_copy(&self) -> bool {
        self.fast_copy
    }

    /// Zero-based position among audio streams, not the container index
    pub fn audio_stream_index(&self) -> Option<u32> {
        self.audio_stream_index
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            segment_seconds: DEFAULT_SEGMENT_SECONDS,
            fast_copy: false,
            audio_stream_index: None,
        }
    }
}

/// One probed audio stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioTrack {
    /// Container-wide stream index (display only)
    pub index: u32,
    /// Rank among audio streams, as addressed by `0:a:<position>`
    pub position: u32,
    pub codec: Option<String>,
    pub channel_count: Option<u32>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub label: String,
}

impl AudioTrack {
    /// Create a track and derive its display label
    pub fn new(
        index: u32,
        position: u32,
        codec: Option<String>,
        channel_count: Option<u32>,
        language: Option<String>,
        title: Option<String>,
    ) -> Self {
        let codec = non_empty(codec);
        let language = non_empty(language);
        let title = non_empty(title);
        let label = Self::derive_label(
            index,
            codec.as_deref(),
            channel_count,
            language.as_deref(),
            title.as_deref(),
        );

        Self {
            index,
            position,
            codec,
            channel_count,
            language,
            title,
            label,
        }
    }

    /// Title, else language, else `Stream #<index>`, plus a `(codec Nch)` suffix when known
    pub fn derive_label(
        index: u32,
        codec: Option<&str>,
        channel_count: Option<u32>,
        language: Option<&str>,
        title: Option<&str>,
    ) -> String {
        let main = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .or_else(|| language.map(str::trim).filter(|l| !l.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Stream #{}", index));

        let mut tech_parts = Vec::new();
        if let Some(codec) = codec.filter(|c| !c.is_empty()) {
            tech_parts.push(codec.to_string());
        }
        if let Some(channels) = channel_count {
            tech_parts.push(format!("{}ch", channels));
        }

        if tech_parts.is_empty() {
            main
        } else {
            format!("{} ({})", main, tech_parts.join(" "))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Progress snapshot emitted while a job runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub segments_done: u32,
    /// Absent when the duration probe failed
    pub segments_total: Option<u32>,
}

impl ProgressEvent {
    pub fn new(segments_done: u32, segments_total: Option<u32>) -> Self {
        Self {
            segments_done,
            segments_total,
        }
    }

    /// Completed share in `[0, 1]`, if an estimate exists
    pub fn fraction(&self) -> Option<f64> {
        match self.segments_total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.segments_done as f64 / total as f64).clamp(0.0, 1.0)),
            None => None,
        }
    }

    /// Whether consumers should show indeterminate progress
    pub fn is_indeterminate(&self) -> bool {
        self.segments_total.is_none()
    }
}

/// Segmentation job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
}


/// Validated input for one slicing operation
#[derive(Debug, Clone)]
pub struct SliceRequest {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub config: SliceConfig,
}

impl SliceRequest {
    /// Create new slice request with validation
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        config: SliceConfig,
    ) -> Result<Self, DomainError> {
        let input_path = input_path.into();
        let output_dir = output_dir.into();

        if output_dir.as_os_str().is_empty() {
            return Err(DomainError::InvalidConfig(
                "output directory cannot be empty".to_string(),
            ));
        }
        if input_stem(&input_path).is_none() {
            return Err(DomainError::InvalidConfig(format!(
                "input path has no file name: {}",
                input_path.display()
            )));
        }

        Ok(Self {
            input_path,
            output_dir,
            config,
        })
    }

    /// Input file name without its extension, bytes preserved
    pub fn input_stem(&self) -> OsString {
        input_stem(&self.input_path).unwrap_or_default()
    }
}

/// File name without extension, if the path has one
pub fn input_stem(path: &Path) -> Option<OsString> {
    path.file_stem()
        .filter(|s| !s.is_empty())
        .map(OsStr::to_os_string)
}

/// Raw outcome of running the transcoding process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub segments_observed: u32,
    pub exit_code: Option<i32>,
}

/// Terminal record of a successful slicing job
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub state: JobState,
    pub input_path: PathBuf,
    pub output_pattern: PathBuf,
    pub segments_observed: u32,
    pub segments_total: Option<u32>,
    pub output_files: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

/// Result of inspecting an input file
#[derive(Debug, Clone, Serialize)]
pub struct MediaSummary {
    pub input_path: PathBuf,
    pub duration_seconds: Option<f64>,
    pub audio_tracks: Vec<AudioTrack>,
    pub segment_seconds: Option<u32>,
    pub estimated_segments: Option<u32>,
}

/// Resolution and availability of one external tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolStatus {
    pub tool: Tool,
    pub path: PathBuf,
    pub available: bool,
    pub version: Option<String>,
}

/// Encoder parameters used in re-encode mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Tolerance passed to the segment muxer, in seconds
    pub segment_time_delta: f64,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 23,
            audio_codec: "aac".to_string(),
            audio_bitrate: "128k".to_string(),
            segment_time_delta: 0.05,
        }
    }
}

/// Explicit tool locations that take precedence over searching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOverrides {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
}

impl ToolOverrides {
    pub fn get(&self, tool: Tool) -> Option<&Path> {
        match tool {
            Tool::Ffmpeg => self.ffmpeg.as_deref(),
            Tool::Ffprobe => self.ffprobe.as_deref(),
        }
    }
}

/// Defaults for job parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobDefaults {
    pub segment_seconds: u32,
}

impl Default for JobDefaults {
    fn default() -> Self {
        Self {
            segment_seconds: DEFAULT_SEGMENT_SECONDS,
        }
    }
}

/// Everything the optional settings file can set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerSettings {
    pub encoder: EncoderSettings,
    pub tools: ToolOverrides,
    pub defaults: JobDefaults,
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}
