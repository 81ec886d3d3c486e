// Inspect interactor - Media summary and tool checks

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

/// Interactor for media inspection and tool checks
pub struct InspectInteractor {
    tool_port: Arc<dyn ToolPort>,
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(tool_port: Arc<dyn ToolPort>, probe_port: Arc<dyn ProbePort>) -> Self {
        Self {
            tool_port,
            probe_port,
        }
    }

    /// Duration, audio tracks and, for a segment length, the segment estimate
    pub async fn inspect(&self, input: &Path, segment_seconds: Option<u32>) -> MediaSummary {
        info!(input = %input.display(), "Inspecting media file");

        let duration = self.probe_port.duration_seconds(input).await;
        if let Err(e) = &duration {
            warn!(error = %e, "Duration unavailable");
        }
        let audio_tracks = self.probe_port.list_audio_tracks(input).await;
        let estimated_segments =
            segment_seconds.and_then(|seconds| SegmentEstimator::from_probe(&duration, seconds));

        MediaSummary {
            input_path: input.to_path_buf(),
            duration_seconds: duration.ok(),
            audio_tracks,
            segment_seconds,
            estimated_segments,
        }
    }

    /// Resolution and availability of every external tool
    pub async fn check_tools(&self) -> Vec<ToolStatus> {
        let mut statuses = Vec::new();
        for tool in Tool::all() {
            statuses.push(self.tool_port.status(tool).await);
        }
        statuses
    }

    /// Whether a tool passed its version check
    pub async fn is_available(&self, tool: Tool) -> bool {
        self.tool_port.is_available(tool).await
    }
}
