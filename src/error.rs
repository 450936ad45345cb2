//! Error types for webm-shrink

use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for webm-shrink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can end a run. None of these are retried.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing input file, or a duration that is not a positive number
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A user-supplied parameter outside its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The size budget leaves nothing for the video stream
    #[error(
        "Target of {container_size_bytes} bytes is too small for {duration_seconds:.2}s \
         of video (computed {kbps} kbps)"
    )]
    InfeasibleTarget {
        container_size_bytes: f64,
        duration_seconds: f64,
        kbps: f64,
    },

    /// An external tool could not be started
    #[error("Unable to run `{tool}`: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// An external tool exited unsuccessfully
    #[error("{action}: `{tool}` failed ({status})")]
    ExternalToolFailure {
        tool: String,
        action: &'static str,
        status: ExitStatus,
    },
}

impl Error {
    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Error::InvalidParameter(msg.into())
    }
}
