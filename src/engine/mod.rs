//! Core segmentation engine module
//!
//! Pure pieces of a slicing job: turning a config into an ffmpeg invocation
//! and turning ffmpeg's log output into progress events.

pub mod command;
pub mod progress;

pub use command::{CommandBuilder, SegmentCommand};
pub use progress::{OpeningForWritingMarker, ProgressCounter, SegmentMarkerDetector};
