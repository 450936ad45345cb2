//! Per-run settings, independent of how they were parsed.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::bitrate::DEFAULT_OVERHEAD_FACTOR;
use crate::command::{AudioMode, Codec};

/// What the user asked for regarding the video bitrate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateRequest {
    /// Approximate output size in megabytes.
    Size(f64),
    /// Video bitrate in kbps. Always single pass.
    Bitrate(u64),
    Unspecified,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub video: PathBuf,
    pub rate: RateRequest,
    pub resize: Option<u32>,
    pub framerate: Option<f64>,
    pub codec: Codec,
    pub audio: AudioMode,
    pub one_pass: bool,
    /// Print the commands instead of running them.
    pub command_only: bool,
    pub overhead_factor: f64,
    pub ffmpeg: OsString,
    pub ffprobe: OsString,
}

impl Options {
    pub fn new(video: impl Into<PathBuf>) -> Self {
        Self {
            video: video.into(),
            rate: RateRequest::Unspecified,
            resize: None,
            framerate: None,
            codec: Codec::default(),
            audio: AudioMode::default(),
            one_pass: false,
            command_only: false,
            overhead_factor: DEFAULT_OVERHEAD_FACTOR,
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
        }
    }
}
