use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use webm_shrink::bitrate::DEFAULT_OVERHEAD_FACTOR;
use webm_shrink::{AudioMode, Codec, Options, RateRequest};

/// Shrink a video to a WebM of roughly a given size using ffmpeg.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The video file to be converted.
    video: PathBuf,
    /// Target size of the new video in MB (approximate).
    #[arg(short, long, conflicts_with = "bitrate")]
    size: Option<f64>,
    /// Target bitrate in k of the video (approximate). This implies --onepass.
    #[arg(short, long)]
    bitrate: Option<u64>,
    /// Resize video to this height. Aspect ratio will be kept.
    #[arg(short, long)]
    resize: Option<u32>,
    /// Output framerate.
    #[arg(short, long)]
    framerate: Option<f64>,
    /// 8 for VP8 (default), or 9 for VP9.
    #[arg(short = 'x', long, default_value_t = 8, value_parser = clap::value_parser!(u8).range(8..=9))]
    vpxversion: u8,
    /// Disable audio completely.
    #[arg(short = 'a', long)]
    noaudio: bool,
    /// Disable two-pass encoding.
    #[arg(short = '1', long)]
    onepass: bool,
    /// Output ffmpeg commands only.
    #[arg(short, long)]
    commandonly: bool,
    /// Correction factor for headers, container and jitter (0.01 to 0.30).
    /// Increase if videos get too large.
    #[arg(long, default_value_t = DEFAULT_OVERHEAD_FACTOR)]
    cfac: f64,
    /// ffmpeg executable.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,
    /// ffprobe executable.
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,
    /// Log debug details.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_options(self) -> Options {
        let rate = match (self.size, self.bitrate) {
            (Some(megabytes), _) => RateRequest::Size(megabytes),
            (None, Some(kbps)) => RateRequest::Bitrate(kbps),
            (None, None) => RateRequest::Unspecified,
        };
        let mut options = Options::new(self.video);
        options.rate = rate;
        options.resize = self.resize;
        options.framerate = self.framerate;
        options.codec = Codec::from_vpx_version(self.vpxversion).unwrap_or_default();
        options.audio = if self.noaudio {
            AudioMode::Off
        } else {
            AudioMode::On
        };
        options.one_pass = self.onepass;
        options.command_only = self.commandonly;
        options.overhead_factor = self.cfac;
        options.ffmpeg = self.ffmpeg.into_os_string();
        options.ffprobe = self.ffprobe.into_os_string();
        options
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = webm_shrink::run(&args.into_options()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
