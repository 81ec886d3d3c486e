//! Segment progress derived from transcoder output

use crate::domain::model::ProgressEvent;

/// Decides whether an output line announces a new segment file
pub trait SegmentMarkerDetector: Send + Sync {
    fn is_segment_start(&self, line: &str) -> bool;
}

/// Matches ffmpeg's `Opening '<file>' for writing` log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct OpeningForWritingMarker;

impl SegmentMarkerDetector for OpeningForWritingMarker {
    fn is_segment_start(&self, line: &str) -> bool {
        line.contains("Opening '") && line.contains("for writing")
    }
}

impl<F> SegmentMarkerDetector for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_segment_start(&self, line: &str) -> bool {
        self(line)
    }
}

/// Running segment count for one job
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    segments_done: u32,
    segments_total: Option<u32>,
}

impl ProgressCounter {
    pub fn new(segments_total: Option<u32>) -> Self {
        Self {
            segments_done: 0,
            segments_total,
        }
    }

    /// Event sent before any output is read
    pub fn initial_event(&self) -> ProgressEvent {
        ProgressEvent::new(0, self.segments_total)
    }

    /// Count the line if it is a segment marker and return the event to send
    pub fn observe(
        &mut self,
        line: &str,
        detector: &dyn SegmentMarkerDetector,
    ) -> Option<ProgressEvent> {
        if !detector.is_segment_start(line) {
            return None;
        }
        self.segments_done = self.segments_done.saturating_add(1);
        Some(self.current_event())
    }

    /// Current progress, capped at the estimate when one exists
    pub fn current_event(&self) -> ProgressEvent {
        let done = match self.segments_total {
            Some(total) => self.segments_done.min(total),
            None => self.segments_done,
        };
        ProgressEvent::new(done, self.segments_total)
    }

    /// Markers seen so far, uncapped
    pub fn segments_observed(&self) -> u32 {
        self.segments_done
    }
}
