// Domain rules - Business logic and policies

use crate::domain::errors::*;
use crate::domain::model::*;

/// Approximate number of segments a job will write
pub struct SegmentEstimator;

impl SegmentEstimator {
    /// `ceil(duration / segment_seconds)`, or `None` when the duration is unusable
    pub fn estimate(duration_seconds: f64, segment_seconds: u32) -> Option<u32> {
        if !duration_seconds.is_finite() || duration_seconds <= 0.0 || segment_seconds == 0 {
            return None;
        }
        let segments = (duration_seconds / segment_seconds as f64).ceil();
        if segments > u32::MAX as f64 {
            return None;
        }
        Some(segments as u32)
    }

    /// Estimate from a probe result, treating a probe failure as "no estimate"
    pub fn from_probe(
        duration: &Result<f64, DomainError>,
        segment_seconds: u32,
    ) -> Option<u32> {
        duration
            .as_ref()
            .ok()
            .and_then(|d| Self::estimate(*d, segment_seconds))
    }
}

/// Checks an audio selection against the probed tracks
pub struct AudioSelectionRule;

impl AudioSelectionRule {
    /// Reject a position past the last known track.
    ///
    /// An empty track list is accepted: the probe may have failed, and the
    /// transcoder reports a missing stream itself.
    pub fn validate(config: &SliceConfig, tracks: &[AudioTrack]) -> Result<(), DomainError> {
        let Some(position) = config.audio_stream_index() else {
            return Ok(());
        };
        if tracks.is_empty() || (position as usize) < tracks.len() {
            return Ok(());
        }
        Err(DomainError::InvalidConfig(format!(
            "audio track {} does not exist; the input has {} audio track(s) (0..={})",
            position,
            tracks.len(),
            tracks.len() - 1
        )))
    }
}
