//! ffmpeg command assembly for segment muxing

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{input_stem, EncoderSettings, SliceConfig};
use crate::ports::FsPort;

/// Fully assembled segmentation command
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentCommand {
    /// Transcoder executable
    pub program: PathBuf,
    /// Arguments, without the program itself
    pub args: Vec<OsString>,
    /// `<dir>/<stem>_%03d.mp4`
    pub output_pattern: PathBuf,
}

impl SegmentCommand {
    /// Arguments as strings, lossily converted
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Builds segment-muxer invocations from a validated config
pub struct CommandBuilder {
    program: PathBuf,
    encoder: EncoderSettings,
    fs: Arc<dyn FsPort>,
}

impl CommandBuilder {
    /// Create a builder for the given transcoder path
    pub fn new(program: impl Into<PathBuf>, fs: Arc<dyn FsPort>) -> Self {
        Self {
            program: program.into(),
            encoder: EncoderSettings::default(),
            fs,
        }
    }

    /// Use custom re-encode parameters
    pub fn with_encoder(mut self, encoder: EncoderSettings) -> Self {
        self.encoder = encoder;
        self
    }

    /// Ensure the output directory exists and assemble the command
    pub fn build(
        &self,
        input_path: &Path,
        output_dir: &Path,
        config: &SliceConfig,
    ) -> Result<SegmentCommand, DomainError> {
        let stem = input_stem(input_path).ok_or_else(|| {
            DomainError::InvalidConfig(format!(
                "input path has no file name: {}",
                input_path.display()
            ))
        })?;

        self.fs.create_dir_all(output_dir).map_err(|e| {
            DomainError::io(
                format!("creating output directory {}", output_dir.display()),
                e,
            )
        })?;

        let output_pattern = output_pattern(output_dir, &stem);
        let args = self.arguments(input_path, &output_pattern, config);
        debug!(program = %self.program.display(), ?args, "Built segmentation command");

        Ok(SegmentCommand {
            program: self.program.clone(),
            args,
            output_pattern,
        })
    }

    /// Argument list for one job
    pub fn arguments(
        &self,
        input_path: &Path,
        output_pattern: &Path,
        config: &SliceConfig,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(40);

        push(&mut args, &["-hide_banner", "-y", "-i"]);
        args.push(input_path.as_os_str().to_os_string());
        push(&mut args, &["-map", "0:v:0"]);

        // Trailing `?` keeps video-only inputs working
        let audio_map = match config.audio_stream_index() {
            Some(position) => format!("0:a:{}", position),
            None => "0:a:0?".to_string(),
        };
        push(&mut args, &["-map", &audio_map]);

        if config.fast_copy() {
            push(&mut args, &["-c", "copy"]);
        } else {
            let crf = self.encoder.crf.to_string();
            let force_expr = force_key_frames_expr(config.segment_seconds());
            push(
                &mut args,
                &[
                    "-c:v",
                    &self.encoder.video_codec,
                    "-preset",
                    &self.encoder.preset,
                    "-crf",
                    &crf,
                    "-sc_threshold",
                    "0",
                    "-force_key_frames",
                    &force_expr,
                    "-c:a",
                    &self.encoder.audio_codec,
                    "-b:a",
                    &self.encoder.audio_bitrate,
                ],
            );
        }

        let segment_time = config.segment_seconds().to_string();
        let segment_delta = self.encoder.segment_time_delta.to_string();
        push(
            &mut args,
            &[
                "-f",
                "segment",
                "-segment_time",
                &segment_time,
                "-segment_time_delta",
                &segment_delta,
                "-reset_timestamps",
                "1",
            ],
        );
        args.push(output_pattern.as_os_str().to_os_string());

        args
    }
}

fn push(args: &mut Vec<OsString>, values: &[&str]) {
    args.extend(values.iter().map(OsString::from));
}

/// Keyframe expression forcing a keyframe at every segment boundary
pub fn force_key_frames_expr(segment_seconds: u32) -> String {
    format!("expr:gte(t,n_forced*{})", segment_seconds)
}

/// Segment muxer output pattern for an input stem.
///
/// The muxer reads the whole path as a printf-style template, so `%` in the
/// directory or stem is doubled.
pub fn output_pattern(output_dir: &Path, stem: &OsStr) -> PathBuf {
    let mut pattern = escape_percent(output_dir.join(stem).as_os_str());
    pattern.push("_%03d.mp4");
    PathBuf::from(pattern)
}

#[cfg(unix)]
fn escape_percent(value: &OsStr) -> OsString {
    use std::os::unix::ffi::{OsStrExt, OsStringExt};

    let mut bytes = Vec::with_capacity(value.len());
    for &b in value.as_bytes() {
        if b == b'%' {
            bytes.push(b'%');
        }
        bytes.push(b);
    }
    OsString::from_vec(bytes)
}

#[cfg(not(unix))]
fn escape_percent(value: &OsStr) -> OsString {
    match value.to_str() {
        Some(s) => OsString::from(s.replace('%', "%%")),
        // TODO: unpaired surrogates skip escaping; walk the wide chars instead
        None => value.to_os_string(),
    }
}
