//! One run: resolve the rate, then print or execute the encode plan.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::Stdio;

use tracing::{debug, info, warn};

use crate::bitrate::{compute_video_bitrate_kbps, EncodingTarget, AUDIO_BITRATE_BPS};
use crate::command::{AudioMode, CommandBuilder, EncodeCommand, RateMode};
use crate::options::{Options, RateRequest};
use crate::probe::probe_duration;
use crate::{Error, Result};

/// Run with `--commandonly` output going to stdout.
pub fn run(options: &Options) -> Result<()> {
    let stdout = io::stdout();
    run_with_output(options, &mut stdout.lock())
}

/// Run, writing printed commands to `out`.
///
/// Passes run strictly in order; the first failure aborts the run and
/// later passes are not attempted.
pub fn run_with_output<W: Write>(options: &Options, out: &mut W) -> Result<()> {
    let builder = prepare(options)?;

    for cmd in builder.plan_encodes() {
        if options.command_only {
            writeln!(out, "{cmd}")?;
        } else {
            info!("Running command: {cmd}");
            encode(&cmd)?;
        }
    }

    remove_pass_log(&builder.pass_log_file());
    Ok(())
}

/// Validate the options and resolve them into a [`CommandBuilder`].
///
/// Size-based requests probe the input duration here.
pub fn prepare(options: &Options) -> Result<CommandBuilder> {
    if !options.video.exists() {
        return Err(Error::invalid_input(format!(
            "File {} does not exist.",
            options.video.display()
        )));
    }
    if options.resize == Some(0) {
        return Err(Error::invalid_parameter("Resize height must be positive"));
    }
    if let Some(fps) = options.framerate {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(Error::invalid_parameter(format!(
                "Framerate must be positive, got {fps}"
            )));
        }
    }

    let input = fs::canonicalize(&options.video)?;
    let mut builder = CommandBuilder::new(options.ffmpeg.clone(), input);
    if builder.output == builder.input {
        return Err(Error::invalid_input(format!(
            "Refusing to overwrite {} with its own re-encode",
            builder.input.display()
        )));
    }

    builder.codec = options.codec;
    builder.audio = options.audio;
    builder.resize = options.resize;
    builder.framerate = options.framerate;
    builder.one_pass = options.one_pass;
    builder.rate = match options.rate {
        RateRequest::Size(megabytes) => {
            let duration = probe_duration(&options.ffprobe, &builder.input)?;
            let audio_bitrate_bps = match options.audio {
                AudioMode::On => AUDIO_BITRATE_BPS,
                AudioMode::Off => 0,
            };
            let target = EncodingTarget::from_megabytes(
                megabytes,
                duration,
                options.overhead_factor,
                audio_bitrate_bps,
            );
            let kbps = compute_video_bitrate_kbps(&target)?;
            info!(megabytes, duration, kbps, "computed video bitrate");
            RateMode::BySize(kbps)
        }
        RateRequest::Bitrate(0) => {
            return Err(Error::invalid_parameter("Bitrate must be positive"));
        }
        RateRequest::Bitrate(kbps) => {
            builder.one_pass = true;
            RateMode::ByBitrate(kbps)
        }
        RateRequest::Unspecified => RateMode::None,
    };

    Ok(builder)
}

fn encode(cmd: &EncodeCommand) -> Result<()> {
    let tool = cmd.program.to_string_lossy().into_owned();
    let status = cmd
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| Error::Spawn {
            tool: tool.clone(),
            source,
        })?;

    if !status.success() {
        return Err(Error::ExternalToolFailure {
            tool,
            action: "Unable to encode the video",
            status,
        });
    }
    Ok(())
}

/// Best effort; a missing log is not an error.
fn remove_pass_log(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed two-pass log"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "unable to remove two-pass log: {e}"),
    }
}
