// Ports - Interface definitions (contracts)

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::command::SegmentCommand;

/// Port for locating and checking external tools
#[async_trait]
pub trait ToolPort: Send + Sync {
    /// Resolve the executable path; never fails, falls back to the bare name
    fn resolve(&self, tool: Tool) -> PathBuf;

    /// Run the tool's version query; every failure collapses to `false`
    async fn is_available(&self, tool: Tool) -> bool;

    /// Resolution, availability and version of a tool
    async fn status(&self, tool: Tool) -> ToolStatus;
}

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Container duration in seconds
    async fn duration_seconds(&self, file_path: &Path) -> Result<f64, DomainError>;

    /// Audio streams in relative audio order; empty on any failure
    async fn list_audio_tracks(&self, file_path: &Path) -> Vec<AudioTrack>;
}

/// Port for running a segmentation command
#[async_trait]
pub trait ExecutePort: Send + Sync {
    /// Run the command to completion, sending progress as segments open
    async fn run_segmentation(
        &self,
        command: &SegmentCommand,
        segments_total: Option<u32>,
        progress: mpsc::UnboundedSender<ProgressEvent>,
        cancel: watch::Receiver<bool>,
    ) -> Result<ExecutionOutcome, DomainError>;
}

/// Port for the few file system queries the slicer needs
pub trait FsPort: Send + Sync {
    /// Whether a regular file exists at the path
    fn is_file(&self, path: &Path) -> bool;

    /// Create directory (including parent directories)
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()>;

    /// Segment files `<stem>_NNN.mp4` directly inside `dir`, sorted by name
    fn segment_files(&self, dir: &Path, stem: &OsStr) -> Vec<PathBuf>;
}
