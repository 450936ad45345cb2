//! ffmpeg argument lists for single- and two-pass WebM encodes.
//!
//! Every option fragment is a fixed slice selected from the encode settings,
//! and the command is kept as discrete arguments so paths never pass through
//! a shell.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// File name prefix ffmpeg uses for its two-pass statistics.
pub const PASS_LOG_PREFIX: &str = "ffmpeg2pass";

/// Where the first pass discards its output.
pub const NULL_OUTPUT: &str = if cfg!(windows) { "NUL" } else { "/dev/null" };

const AUDIO_OFF: &[&str] = &["-an"];

/// VPx generation used for the video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    Vp8,
    Vp9,
}

impl Codec {
    pub fn from_vpx_version(version: u8) -> Option<Self> {
        match version {
            8 => Some(Codec::Vp8),
            9 => Some(Codec::Vp9),
            _ => None,
        }
    }

    fn video_args(self) -> &'static [&'static str] {
        match self {
            Codec::Vp8 => &["-c:v", "libvpx", "-cpu-used", "16"],
            Codec::Vp9 => &["-c:v", "libvpx-vp9", "-cpu-used", "8"],
        }
    }

    /// Vorbis goes with VP8, Opus with VP9.
    fn audio_args(self) -> &'static [&'static str] {
        match self {
            Codec::Vp8 => &["-c:a", "libvorbis", "-b:a", "64k", "-ac", "2"],
            Codec::Vp9 => &["-c:a", "libopus", "-b:a", "64k", "-ac", "2"],
        }
    }
}

/// How the video bitrate is chosen. Rates are in kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateMode {
    /// Computed from a target file size.
    BySize(u64),
    /// Given explicitly by the user.
    ByBitrate(u64),
    /// Left to the encoder.
    None,
}

impl RateMode {
    pub fn kbps(self) -> Option<u64> {
        match self {
            RateMode::BySize(kbps) | RateMode::ByBitrate(kbps) => Some(kbps),
            RateMode::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioMode {
    #[default]
    On,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    None,
    First,
    Second,
}

impl Pass {
    fn args(self) -> &'static [&'static str] {
        match self {
            Pass::None => &[],
            Pass::First => &["-pass", "1"],
            Pass::Second => &["-pass", "2"],
        }
    }
}

/// A program plus its arguments, ready to spawn or print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl EncodeCommand {
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for EncodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", shell_quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", shell_quote(arg))?;
        }
        Ok(())
    }
}

/// POSIX single-quoting, only where the argument needs it.
fn shell_quote(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        arg.into_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

/// Everything needed to turn one input into its encode commands.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    pub ffmpeg: OsString,
    pub input: PathBuf,
    pub output: PathBuf,
    pub codec: Codec,
    pub rate: RateMode,
    pub audio: AudioMode,
    /// Output height; width follows the aspect ratio.
    pub resize: Option<u32>,
    pub framerate: Option<f64>,
    pub threads: usize,
    /// Force a single pass even for size-based rates.
    pub one_pass: bool,
}

impl CommandBuilder {
    /// Settings for `input`, writing `<stem>.webm` next to it.
    pub fn new(ffmpeg: impl Into<OsString>, input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = input.with_extension("webm");
        Self {
            ffmpeg: ffmpeg.into(),
            input,
            output,
            codec: Codec::default(),
            rate: RateMode::None,
            audio: AudioMode::default(),
            resize: None,
            framerate: None,
            threads: available_threads(),
            one_pass: false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        self.output.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Statistics file written by the first pass.
    pub fn pass_log_file(&self) -> PathBuf {
        self.output_dir().join(format!("{PASS_LOG_PREFIX}-0.log"))
    }

    /// Two passes only for size-based rates without `one_pass`.
    pub fn is_two_pass(&self) -> bool {
        matches!(self.rate, RateMode::BySize(_)) && !self.one_pass
    }

    /// The commands to run, in order.
    pub fn plan_encodes(&self) -> Vec<EncodeCommand> {
        if self.is_two_pass() {
            vec![self.build(Pass::First), self.build(Pass::Second)]
        } else {
            vec![self.build(Pass::None)]
        }
    }

    pub fn build(&self, pass: Pass) -> EncodeCommand {
        let mut args: Vec<OsString> = Vec::with_capacity(32);

        extend(&mut args, &["-y", "-i"]);
        args.push(self.input.clone().into_os_string());
        extend(&mut args, &["-map", "0:0", "-map", "0:1"]);

        if let Some(height) = self.resize {
            extend(&mut args, &["-filter:v", &format!("scale=-1:{height}")]);
        }
        if let Some(fps) = self.framerate {
            extend(&mut args, &["-r", &fps.to_string()]);
        }

        extend(&mut args, self.codec.video_args());
        extend(&mut args, pass.args());
        if pass != Pass::None {
            args.push("-passlogfile".into());
            args.push(self.output_dir().join(PASS_LOG_PREFIX).into_os_string());
        }

        if let Some(kbps) = self.rate.kbps() {
            extend(&mut args, &["-b:v", &format!("{kbps}k")]);
        }
        extend(&mut args, &["-threads", &self.threads.to_string()]);

        // the first pass only gathers video statistics
        if self.audio == AudioMode::Off || pass == Pass::First {
            extend(&mut args, AUDIO_OFF);
        } else {
            extend(&mut args, self.codec.audio_args());
        }

        extend(&mut args, &["-f", "webm"]);
        if pass == Pass::First {
            args.push(NULL_OUTPUT.into());
        } else {
            args.push(self.output.clone().into_os_string());
        }

        EncodeCommand {
            program: self.ffmpeg.clone(),
            args,
        }
    }
}

fn extend(args: &mut Vec<OsString>, fragment: &[&str]) {
    args.extend(fragment.iter().map(OsString::from));
}

/// Hardware threads available to the encoder, at least 1.
pub fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}
