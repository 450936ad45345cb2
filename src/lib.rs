//! # webm-shrink
//!
//! Re-encode a video to WebM (VP8 or VP9) near a target file size, using
//! `ffprobe` for the duration and `ffmpeg` for one or two encode passes.

pub mod bitrate;
pub mod command;
pub mod error;
pub mod options;
pub mod probe;
pub mod runner;

pub use bitrate::{compute_video_bitrate_kbps, EncodingTarget};
pub use command::{AudioMode, Codec, CommandBuilder, EncodeCommand, Pass, RateMode};
pub use error::{Error, Result};
pub use options::{Options, RateRequest};
pub use runner::{prepare, run, run_with_output};
