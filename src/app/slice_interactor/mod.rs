// Slice interactor - Orchestrates the video slicing use case

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::engine::CommandBuilder;
use crate::ports::*;

/// Interactor for the slicing use case
pub struct SliceInteractor {
    tool_port: Arc<dyn ToolPort>,
    probe_port: Arc<dyn ProbePort>,
    execute_port: Arc<dyn ExecutePort>,
    fs_port: Arc<dyn FsPort>,
    encoder: EncoderSettings,
}

impl SliceInteractor {
    /// Create new slice interactor with injected ports
    pub fn new(
        tool_port: Arc<dyn ToolPort>,
        probe_port: Arc<dyn ProbePort>,
        execute_port: Arc<dyn ExecutePort>,
        fs_port: Arc<dyn FsPort>,
    ) -> Self {
        Self {
            tool_port,
            probe_port,
            execute_port,
            fs_port,
            encoder: EncoderSettings::default(),
        }
    }

    /// Encoder parameters used for re-encode jobs
    pub fn with_encoder(mut self, encoder: EncoderSettings) -> Self {
        self.encoder = encoder;
        self
    }

    /// Run a job to completion, handing every progress event to `on_progress`
    pub async fn start_job<F>(
        &self,
        request: SliceRequest,
        mut on_progress: F,
    ) -> Result<JobReport, DomainError>
    where
        F: FnMut(ProgressEvent),
    {
        let mut handle = self.spawn_job(request).await?;
        while let Some(event) = handle.next_event().await {
            on_progress(event);
        }
        handle.finish().await
    }

    /// Probe, build the command and start the transcoder in a background task.
    ///
    /// Configuration and I/O errors are returned here; anything that happens
    /// once the process is running arrives through [`JobHandle::finish`].
    pub async fn spawn_job(&self, request: SliceRequest) -> Result<JobHandle, DomainError> {
        let config = request.config.clone();
        info!(
            input = %request.input_path.display(),
            output_dir = %request.output_dir.display(),
            segment_seconds = config.segment_seconds(),
            fast_copy = config.fast_copy(),
            "Starting slicing job"
        );

        let duration = self.probe_port.duration_seconds(&request.input_path).await;
        if let Err(e) = &duration {
            warn!(error = %e, "Duration unavailable, progress will be indeterminate");
        }
        let segments_total = SegmentEstimator::from_probe(&duration, config.segment_seconds());
        debug!(?segments_total, "Estimated segment count");

        if config.audio_stream_index().is_some() {
            let tracks = self.probe_port.list_audio_tracks(&request.input_path).await;
            AudioSelectionRule::validate(&config, &tracks)?;
        }

        let program = self.tool_port.resolve(Tool::Ffmpeg);
        let command = CommandBuilder::new(program, Arc::clone(&self.fs_port))
            .with_encoder(self.encoder.clone())
            .build(&request.input_path, &request.output_dir, &config)?;
        let output_pattern = command.output_pattern.clone();

        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let execute_port = Arc::clone(&self.execute_port);
        let fs_port = Arc::clone(&self.fs_port);
        let stem = request.input_stem();
        let task = tokio::spawn(async move {
            let started_at = Utc::now();
            let clock = Instant::now();

            let outcome = execute_port
                .run_segmentation(&command, segments_total, progress_tx, cancel_rx)
                .await?;

            let output_files = fs_port.segment_files(&request.output_dir, &stem);
            info!(
                segments_done = outcome.segments_observed,
                files = output_files.len(),
                "Slicing job finished"
            );

            Ok(JobReport {
                state: JobState::Succeeded,
                input_path: request.input_path,
                output_pattern: command.output_pattern,
                segments_observed: outcome.segments_observed,
                segments_total,
                output_files,
                started_at,
                elapsed: clock.elapsed(),
            })
        });

        Ok(JobHandle {
            events: progress_rx,
            cancel: cancel_tx,
            task,
            segments_total,
            output_pattern,
        })
    }
}

/// A running slicing job
#[derive(Debug)]
pub struct JobHandle {
    events: mpsc::UnboundedReceiver<ProgressEvent>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<Result<JobReport, DomainError>>,
    segments_total: Option<u32>,
    output_pattern: PathBuf,
}

impl JobHandle {
    /// Segment estimate, `None` when the duration could not be probed
    pub fn segments_total(&self) -> Option<u32> {
        self.segments_total
    }

    pub fn output_pattern(&self) -> &Path {
        &self.output_pattern
    }

    /// Next progress event; `None` once the transcoder's output has ended
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// Ask the job to stop; it then ends with [`DomainError::Cancelled`]
    pub fn cancel(&self) {
        // A closed receiver means the job has already finished
        let _ = self.cancel.send(true);
    }

    /// Wait for the job and return its terminal result
    pub async fn finish(self) -> Result<JobReport, DomainError> {
        let JobHandle { events, task, .. } = self;
        drop(events);
        match task.await {
            Ok(result) => result,
            Err(e) => Err(DomainError::JobFailed {
                exit_code: None,
                message: format!("job task ended abnormally: {}", e),
            }),
        }
    }
}
