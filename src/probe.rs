//! Media duration via ffprobe.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::{Error, Result};

/// Read the container duration (seconds) of `path`.
pub fn probe_duration(ffprobe: &OsStr, path: &Path) -> Result<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "quiet",
            "-of",
            "csv=p=0",
            "-show_entries",
            "format=duration",
        ])
        .arg(path)
        .stderr(Stdio::inherit())
        .output()
        .map_err(|source| Error::Spawn {
            tool: ffprobe.to_string_lossy().into_owned(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::ExternalToolFailure {
            tool: ffprobe.to_string_lossy().into_owned(),
            action: "Unable to get stream duration",
            status: output.status,
        });
    }

    let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))?;
    debug!(path = %path.display(), duration, "probed duration");
    Ok(duration)
}

/// Parse ffprobe's duration output, which must be a positive number.
pub fn parse_duration(raw: &str) -> Result<f64> {
    let raw = raw.trim();
    let duration: f64 = raw
        .parse()
        .map_err(|_| Error::invalid_input(format!("Unparsable duration: {raw:?}")))?;
    if !(duration.is_finite() && duration > 0.0) {
        return Err(Error::invalid_input(format!("Invalid length: {raw}")));
    }
    Ok(duration)
}
