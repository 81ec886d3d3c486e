//! FFprobe adapter for media file probing
//!
//! This module queries duration and audio streams by running ffprobe and
//! parsing its output.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_name: Option<String>,
    channels: Option<u32>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    tools: Arc<dyn ToolPort>,
}

impl FfprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(tools: Arc<dyn ToolPort>) -> Self {
        Self { tools }
    }

    /// Run ffprobe and return stdout, failing on spawn errors or non-zero exit
    async fn run(&self, args: &[&str], file_path: &Path) -> Result<String, DomainError> {
        let program = self.tools.resolve(Tool::Ffprobe);
        let output = Command::new(&program)
            .args(args)
            .arg(file_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::probe(format!("could not run {}: {}", program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(DomainError::probe(if detail.is_empty() {
                format!("ffprobe exited with {}", output.status)
            } else {
                detail.to_string()
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Parse the single-value duration output
pub fn parse_duration(output: &str) -> Result<f64, DomainError> {
    let trimmed = output.trim();
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| DomainError::probe(format!("unparseable duration: {:?}", trimmed)))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(DomainError::probe(format!("invalid duration: {}", seconds)));
    }
    Ok(seconds)
}

/// Parse the JSON stream listing into tracks ordered by relative audio position
pub fn parse_audio_streams(json: &str) -> Result<Vec<AudioTrack>, DomainError> {
    let output: FfprobeOutput = if json.trim().is_empty() {
        FfprobeOutput::default()
    } else {
        serde_json::from_str(json)
            .map_err(|e| DomainError::probe(format!("malformed ffprobe JSON: {}", e)))?
    };

    Ok(output
        .streams
        .into_iter()
        .zip(0u32..)
        .map(|(stream, position)| {
            AudioTrack::new(
                stream.index,
                position,
                stream.codec_name,
                stream.channels,
                stream.tags.language,
                stream.tags.title,
            )
        })
        .collect())
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn duration_seconds(&self, file_path: &Path) -> Result<f64, DomainError> {
        let stdout = self
            .run(
                &[
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ],
                file_path,
            )
            .await?;
        let duration = parse_duration(&stdout)?;
        debug!(input = %file_path.display(), duration, "Probed duration");
        Ok(duration)
    }

    async fn list_audio_tracks(&self, file_path: &Path) -> Vec<AudioTrack> {
        let result = self
            .run(
                &[
                    "-v",
                    "error",
                    "-select_streams",
                    "a",
                    "-show_entries",
                    "stream=index,codec_name,channels,tags",
                    "-of",
                    "json",
                ],
                file_path,
            )
            .await
            .and_then(|stdout| parse_audio_streams(&stdout));

        match result {
            Ok(tracks) => {
                debug!(input = %file_path.display(), count = tracks.len(), "Probed audio tracks");
                tracks
            }
            Err(e) => {
                warn!(input = %file_path.display(), error = %e, "Audio track listing failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRACKS: &str = r#"{
        "programs": [],
        "streams": [
            {
                "index": 1,
                "codec_name": "aac",
                "channels": 2,
                "tags": { "language": "eng", "title": "Stereo Mix", "handler_name": "SoundHandler" }
            },
            {
                "index": 3,
                "codec_name": "ac3",
                "channels": 6,
                "tags": { "language": "rus" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("40.000000\n").unwrap(), 40.0);
        assert_eq!(parse_duration("  12.5 ").unwrap(), 12.5);
        assert!(matches!(parse_duration("N/A"), Err(DomainError::Probe { .. })));
        assert!(parse_duration("").is_err());
        assert!(parse_duration("-1").is_err());
        assert!(parse_duration("inf").is_err());
    }

    #[test]
    fn test_parse_audio_streams_positions() {
        let tracks = parse_audio_streams(TWO_TRACKS).unwrap();
        assert_eq!(tracks.len(), 2);

        assert_eq!(tracks[0].position, 0);
        assert_eq!(tracks[0].index, 1);
        assert_eq!(tracks[0].label, "Stereo Mix (aac 2ch)");

        assert_eq!(tracks[1].position, 1);
        assert_eq!(tracks[1].index, 3);
        assert_eq!(tracks[1].language.as_deref(), Some("rus"));
        assert_eq!(tracks[1].label, "rus (ac3 6ch)");
    }

    #[test]
    fn test_parse_audio_streams_sparse_fields() {
        let json = r#"{"streams": [{"index": 2}, {"index": 5, "codec_name": "", "tags": {"title": ""}}]}"#;
        let tracks = parse_audio_streams(json).unwrap();
        assert_eq!(tracks[0].label, "Stream #2");
        assert_eq!(tracks[1].label, "Stream #5");
        assert_eq!(tracks[1].codec, None);
    }

    #[test]
    fn test_parse_audio_streams_empty() {
        assert!(parse_audio_streams("{}").unwrap().is_empty());
        assert!(parse_audio_streams("").unwrap().is_empty());
        assert!(parse_audio_streams(r#"{"streams": []}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_audio_streams_malformed() {
        assert!(parse_audio_streams("{\"streams\": [").is_err());
        assert!(parse_audio_streams("not json").is_err());
    }

    struct MissingTool;

    #[async_trait]
    impl ToolPort for MissingTool {
        fn resolve(&self, _tool: Tool) -> std::path::PathBuf {
            std::path::PathBuf::from("/definitely/not/here/ffprobe")
        }

        async fn is_available(&self, _tool: Tool) -> bool {
            false
        }

        async fn status(&self, tool: Tool) -> ToolStatus {
            ToolStatus {
                tool,
                path: self.resolve(tool),
                available: false,
                version: None,
            }
        }
    }

    #[tokio::test]
    async fn test_missing_tool_degrades_gracefully() {
        let adapter = FfprobeAdapter::new(Arc::new(MissingTool));
        let input = Path::new("/definitely/not/here/movie.mov");

        assert!(adapter.list_audio_tracks(input).await.is_empty());
        assert!(matches!(
            adapter.duration_seconds(input).await,
            Err(DomainError::Probe { .. })
        ));
    }
}
