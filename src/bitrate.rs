//! Video bitrate from a target file size.

use std::ops::RangeInclusive;

use crate::{Error, Result};

/// Accepted correction factors for headers, container and jitter.
pub const OVERHEAD_FACTOR_RANGE: RangeInclusive<f64> = 0.01..=0.30;

/// Correction factor used when none is given (5%).
pub const DEFAULT_OVERHEAD_FACTOR: f64 = 0.05;

/// Bits per second budgeted for the audio stream when audio is kept.
pub const AUDIO_BITRATE_BPS: u64 = 64 * 1024;

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Inputs for a single size-based bitrate computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodingTarget {
    pub container_size_bytes: f64,
    pub duration_seconds: f64,
    pub overhead_factor: f64,
    /// 0 when audio is disabled.
    pub audio_bitrate_bps: u64,
}

impl EncodingTarget {
    pub fn from_megabytes(
        size_mb: f64,
        duration_seconds: f64,
        overhead_factor: f64,
        audio_bitrate_bps: u64,
    ) -> Self {
        Self {
            container_size_bytes: size_mb * BYTES_PER_MEGABYTE,
            duration_seconds,
            overhead_factor,
            audio_bitrate_bps,
        }
    }
}

/// Compute the video bitrate in kbps (1 kbit = 1024 bits), truncated.
///
/// The overhead factor is checked first, then the duration. A budget that
/// leaves less than 1 kbps for video is reported as
/// [`Error::InfeasibleTarget`] instead of being handed to the encoder.
pub fn compute_video_bitrate_kbps(target: &EncodingTarget) -> Result<u64> {
    if !OVERHEAD_FACTOR_RANGE.contains(&target.overhead_factor) {
        return Err(Error::invalid_parameter(format!(
            "Valid --cfac values range from {:.2} to {:.2}, got {}",
            OVERHEAD_FACTOR_RANGE.start(),
            OVERHEAD_FACTOR_RANGE.end(),
            target.overhead_factor
        )));
    }
    if !(target.duration_seconds.is_finite() && target.duration_seconds > 0.0) {
        return Err(Error::invalid_input(format!(
            "Invalid duration: {}",
            target.duration_seconds
        )));
    }

    let mut available_bits = target.container_size_bytes * 8.0;
    available_bits -= available_bits * target.overhead_factor;

    let audio_bits = target.audio_bitrate_bps as f64 * target.duration_seconds;
    let video_bits = available_bits - audio_bits;
    let kbps = (video_bits / target.duration_seconds / 1024.0).floor();

    if kbps.is_nan() || kbps < 1.0 {
        return Err(Error::InfeasibleTarget {
            container_size_bytes: target.container_size_bytes,
            duration_seconds: target.duration_seconds,
            kbps,
        });
    }

    Ok(kbps as u64)
}
