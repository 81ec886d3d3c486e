//! FFmpeg execution adapter
//!
//! Runs a segmentation command as a child process. stdout and stderr are read
//! line by line on their own tasks and merged into one channel; every line is
//! offered to the segment marker detector to drive progress.

use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::command::SegmentCommand;
use crate::engine::progress::{OpeningForWritingMarker, ProgressCounter, SegmentMarkerDetector};
use crate::ports::*;

/// Non-marker output lines kept for failure diagnostics
const DIAGNOSTIC_TAIL: usize = 8;

/// FFmpeg-based execution adapter
pub struct FfmpegExecAdapter {
    detector: Arc<dyn SegmentMarkerDetector>,
}

impl FfmpegExecAdapter {
    /// Create adapter using the default `Opening '...' for writing` marker
    pub fn new() -> Self {
        Self::with_detector(Arc::new(OpeningForWritingMarker))
    }

    /// Create adapter with a custom segment marker detector
    pub fn with_detector(detector: Arc<dyn SegmentMarkerDetector>) -> Self {
        Self { detector }
    }
}

impl Default for FfmpegExecAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward lines from one pipe until EOF.
///
/// Lines are decoded lossily. The pipe is drained to the end even after a
/// read error or a closed receiver, so the child never writes into a closed
/// pipe. Lines keep their order within one pipe but not across stdout and
/// stderr.
async fn forward_lines<R>(reader: R, stream: &'static str, lines: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
                let _ = lines.send(line.to_string());
            }
            Err(e) => {
                debug!(stream, error = %e, "Error reading tool output, discarding the rest");
                if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                    debug!(stream, error = %e, "Stopped draining tool output");
                }
                break;
            }
        }
    }
}

/// Keeps the last few non-marker lines
#[derive(Debug, Default)]
struct OutputTail {
    lines: VecDeque<String>,
}

impl OutputTail {
    fn push(&mut self, line: String) {
        let line = line.trim().to_string();
        if line.is_empty() {
            return;
        }
        if self.lines.len() == DIAGNOSTIC_TAIL {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }
}

#[async_trait]
impl ExecutePort for FfmpegExecAdapter {
    async fn run_segmentation(
        &self,
        command: &SegmentCommand,
        segments_total: Option<u32>,
        progress: mpsc::UnboundedSender<ProgressEvent>,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<ExecutionOutcome, DomainError> {
        let mut state = JobState::Pending;
        debug!(?state, program = %command.program.display(), "Spawning segmentation process");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    DomainError::tool_unavailable(command.program.display().to_string())
                } else {
                    DomainError::io(format!("spawning {}", command.program.display()), e)
                }
            })?;

        state = JobState::Running;
        info!(?state, pid = child.id(), "Segmentation started");

        let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, "stdout", line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, "stderr", line_tx.clone()));
        }
        drop(line_tx);

        let mut counter = ProgressCounter::new(segments_total);
        let mut tail = OutputTail::default();
        let mut cancelled = *cancel.borrow();
        let mut cancel_open = true;
        if cancelled {
            let _ = child.start_kill();
        }
        let _ = progress.send(counter.initial_event());

        loop {
            tokio::select! {
                line = line_rx.recv() => {
                    let Some(line) = line else { break };
                    match counter.observe(&line, self.detector.as_ref()) {
                        Some(event) => {
                            debug!(
                                segments_done = event.segments_done,
                                segments_total = ?event.segments_total,
                                "Segment opened"
                            );
                            let _ = progress.send(event);
                        }
                        None => tail.push(line),
                    }
                }
                changed = cancel.changed(), if cancel_open && !cancelled => {
                    match changed {
                        Ok(()) if *cancel.borrow() => {
                            info!("Cancelling segmentation");
                            if let Err(e) = child.start_kill() {
                                warn!(error = %e, "Failed to kill segmentation process");
                            }
                            cancelled = true;
                        }
                        Ok(()) => {}
                        Err(_) => cancel_open = false,
                    }
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| DomainError::io("waiting for segmentation process", e))?;

        let outcome = ExecutionOutcome {
            segments_observed: counter.segments_observed(),
            exit_code: status.code(),
        };

        if cancelled {
            state = JobState::Failed;
            info!(?state, "Segmentation cancelled");
            return Err(DomainError::Cancelled);
        }

        if status.success() {
            state = JobState::Succeeded;
            info!(?state, segments = outcome.segments_observed, "Segmentation finished");
            Ok(outcome)
        } else {
            state = JobState::Failed;
            let message = match tail.last() {
                Some(line) => format!("ffmpeg exited with {}: {}", status, line),
                None => format!("ffmpeg exited with {}", status),
            };
            warn!(?state, exit_code = ?status.code(), %message, "Segmentation failed");
            Err(DomainError::JobFailed {
                exit_code: status.code(),
                message,
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;
    use std::time::Duration;

    /// A shell script standing in for ffmpeg
    fn scripted(script: &str) -> SegmentCommand {
        SegmentCommand {
            program: PathBuf::from("sh"),
            args: vec![OsString::from("-c"), OsString::from(script)],
            output_pattern: PathBuf::from("clips/movie_%03d.mp4"),
        }
    }

    async fn run(
        command: SegmentCommand,
        total: Option<u32>,
    ) -> (Result<ExecutionOutcome, DomainError>, Vec<ProgressEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let result = FfmpegExecAdapter::new()
            .run_segmentation(&command, total, tx, cancel_rx)
            .await;
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (result, events)
    }

    const THREE_SEGMENTS: &str = "\
echo \"Input #0, mov,mp4 from 'movie.mov':\" >&2
echo \"[segment @ 0x1] Opening 'clips/movie_000.mp4' for writing\" >&2
echo \"frame=  360 fps=120\" >&2
echo \"[segment @ 0x1] Opening 'clips/movie_001.mp4' for writing\" >&2
echo \"[segment @ 0x1] Opening 'clips/movie_002.mp4' for writing\" >&2
";

    #[tokio::test]
    async fn test_success_reports_progress() {
        let (result, events) = run(scripted(THREE_SEGMENTS), Some(3)).await;
        let outcome = result.unwrap();

        assert_eq!(outcome.segments_observed, 3);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(
            events,
            vec![
                ProgressEvent::new(0, Some(3)),
                ProgressEvent::new(1, Some(3)),
                ProgressEvent::new(2, Some(3)),
                ProgressEvent::new(3, Some(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_progress_capped_at_estimate() {
        let (result, events) = run(scripted(THREE_SEGMENTS), Some(2)).await;
        assert_eq!(result.unwrap().segments_observed, 3);

        let done: Vec<u32> = events.iter().map(|e| e.segments_done).collect();
        assert_eq!(done, vec![0, 1, 2, 2]);
        assert!(done.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_progress_without_estimate() {
        let (result, events) = run(scripted(THREE_SEGMENTS), None).await;
        assert!(result.is_ok());
        assert_eq!(events.last(), Some(&ProgressEvent::new(3, None)));
        assert!(events.iter().all(|e| e.segments_total.is_none()));
    }

    #[tokio::test]
    async fn test_markers_on_stdout_are_counted() {
        let script = "echo \"Opening 'a_000.mp4' for writing\"; echo \"Opening 'a_001.mp4' for writing\" >&2";
        let (result, _) = run(scripted(script), None).await;
        assert_eq!(result.unwrap().segments_observed, 2);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_job_failure() {
        let script = "\
echo \"[segment @ 0x1] Opening 'clips/movie_000.mp4' for writing\" >&2
echo \"Stream map '0:a:4' matches no streams.\" >&2
exit 1
";
        let (result, events) = run(scripted(script), Some(3)).await;
        match result {
            Err(DomainError::JobFailed { exit_code, message }) => {
                assert_eq!(exit_code, Some(1));
                assert!(message.contains("matches no streams"), "{}", message);
            }
            other => panic!("expected JobFailed, got {:?}", other),
        }
        assert_eq!(events.last(), Some(&ProgressEvent::new(1, Some(3))));
    }

    #[tokio::test]
    async fn test_non_utf8_output_keeps_job_alive() {
        let script = "\
printf 'title           : Caf\\351\\n' >&2
i=0
while [ $i -lt 2000 ]; do echo \"frame=$i fps=30 q=28.0 size=N/A\" >&2; i=$((i+1)); done
echo \"[segment @ 0x1] Opening 'clips/caf_000.mp4' for writing\" >&2
echo \"[segment @ 0x1] Opening 'clips/caf_001.mp4' for writing\" >&2
echo \"[segment @ 0x1] Opening 'clips/caf_002.mp4' for writing\" >&2
";
        let (result, events) = run(scripted(script), Some(3)).await;
        let outcome = result.unwrap();

        assert_eq!(outcome.segments_observed, 3);
        assert_eq!(outcome.exit_code, Some(0));
        assert_eq!(events.last(), Some(&ProgressEvent::new(3, Some(3))));
    }

    #[tokio::test]
    async fn test_non_utf8_failure_line_is_decoded_lossily() {
        let script = "printf 'Caf\\351: No such file or directory\\n' >&2; exit 1";
        let (result, _) = run(scripted(script), None).await;
        match result {
            Err(DomainError::JobFailed { message, .. }) => {
                assert!(message.contains("Caf\u{fffd}: No such file"), "{}", message);
            }
            other => panic!("expected JobFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_silent_failure_has_generic_message() {
        let (result, _) = run(scripted("exit 2"), None).await;
        match result {
            Err(DomainError::JobFailed { exit_code, message }) => {
                assert_eq!(exit_code, Some(2));
                assert!(message.starts_with("ffmpeg exited with"));
            }
            other => panic!("expected JobFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_tool_unavailable() {
        let command = SegmentCommand {
            program: PathBuf::from("/definitely/not/here/ffmpeg"),
            args: Vec::new(),
            output_pattern: PathBuf::from("out_%03d.mp4"),
        };
        let (result, events) = run(command, Some(1)).await;
        assert!(matches!(result, Err(DomainError::ToolUnavailable { .. })));
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_kills_process() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let command = scripted("echo \"Opening 'x_000.mp4' for writing\" >&2; exec sleep 30");

        let job = tokio::spawn(async move {
            FfmpegExecAdapter::new()
                .run_segmentation(&command, Some(2), tx, cancel_rx)
                .await
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        cancel_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(10), job)
            .await
            .expect("job did not stop after cancel")
            .unwrap();
        assert!(matches!(result, Err(DomainError::Cancelled)));
    }

    #[tokio::test]
    async fn test_custom_detector() {
        let detector = |line: &str| line.starts_with("SEGMENT ");
        let (tx, _rx) = mpsc::unbounded_channel();
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let outcome = FfmpegExecAdapter::with_detector(Arc::new(detector))
            .run_segmentation(
                &scripted("echo 'SEGMENT a'; echo 'SEGMENT b'; echo 'noise'"),
                None,
                tx,
                cancel_rx,
            )
            .await
            .unwrap();
        assert_eq!(outcome.segments_observed, 2);
    }
}
