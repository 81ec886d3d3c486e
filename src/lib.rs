//! Slicer CLI library
//!
//! Splits a video into fixed-length MP4 segments by driving `ffmpeg`, with
//! `ffprobe` supplying the duration estimate and audio track list.
//!
//! The crate follows a ports-and-adapters layout: [`domain`] holds the value
//! types and rules, [`ports`] the traits the application talks to,
//! [`adapters`] their process and filesystem implementations, [`engine`] the
//! command construction and progress parsing, and [`app`] the interactors
//! the [`cli`] front end calls.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod ports;

// Re-export commonly used types
pub use app::{JobHandle, SliceInteractor};
pub use domain::errors::DomainError;
pub use domain::model::{
    AudioTrack, JobReport, ProgressEvent, SliceConfig, SliceRequest, SlicerSettings,
};
