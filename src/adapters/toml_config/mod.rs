// TOML config adapter - Read-only settings file

use std::path::Path;

use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Loads [`SlicerSettings`] from TOML
///
/// ```toml
/// [encoder]
/// preset = "fast"
/// crf = 20
///
/// [tools]
/// ffmpeg = "/opt/ffmpeg/bin/ffmpeg"
///
/// [defaults]
/// segment_seconds = 30
/// ```
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Settings from an optional file; built-in defaults when `None`
    pub fn load(path: Option<&Path>) -> Result<SlicerSettings, DomainError> {
        match path {
            Some(path) => Self::load_file(path),
            None => Ok(SlicerSettings::default()),
        }
    }

    /// Read and parse a settings file
    pub fn load_file(path: &Path) -> Result<SlicerSettings, DomainError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Settings(format!("failed to read {}: {}", path.display(), e))
        })?;
        let settings = Self::parse(&content)
            .map_err(|e| DomainError::Settings(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse and validate TOML content
    pub fn parse(content: &str) -> Result<SlicerSettings, DomainError> {
        let settings: SlicerSettings = toml::from_str(content)
            .map_err(|e| DomainError::Settings(format!("failed to parse TOML: {}", e)))?;
        Self::validate(&settings)?;
        Ok(settings)
    }

    fn validate(settings: &SlicerSettings) -> Result<(), DomainError> {
        if settings.encoder.crf > 51 {
            return Err(DomainError::Settings(
                "encoder.crf cannot exceed 51".to_string(),
            ));
        }
        if settings.defaults.segment_seconds == 0 {
            return Err(DomainError::Settings(
                "defaults.segment_seconds must be positive".to_string(),
            ));
        }
        let delta = settings.encoder.segment_time_delta;
        if !delta.is_finite() || delta < 0.0 {
            return Err(DomainError::Settings(
                "encoder.segment_time_delta must be a non-negative number".to_string(),
            ));
        }
        for (name, value) in [
            ("encoder.video_codec", &settings.encoder.video_codec),
            ("encoder.preset", &settings.encoder.preset),
            ("encoder.audio_codec", &settings.encoder.audio_codec),
            ("encoder.audio_bitrate", &settings.encoder.audio_bitrate),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::Settings(format!("{} cannot be empty", name)));
            }
        }
        Ok(())
    }
}
