//! End-to-end runs against stand-in ffprobe/ffmpeg scripts.
//!
//! The scripts record their arguments so the tests can check which passes
//! ran and in which order.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use webm_shrink::{run_with_output, AudioMode, Error, Options, RateRequest};

// Writing an executable while another thread forks can make exec fail
// with ETXTBSY, so fixtures run one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

struct Fixture {
    _serial: MutexGuard<'static, ()>,
    dir: tempfile::TempDir,
    video: PathBuf,
    calls: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let video = dir.path().join("holiday clip.mp4");
        fs::write(&video, b"fake video").unwrap();
        let calls = dir.path().join("calls.txt");
        Fixture {
            _serial: serial,
            dir,
            video,
            calls,
        }
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// ffprobe printing a fixed duration.
    fn ffprobe(&self, stdout: &str, code: i32) -> PathBuf {
        self.script("ffprobe", &format!("echo '{stdout}'\nexit {code}"))
    }

    /// ffmpeg that logs its arguments, writes the pass log like the real
    /// encoder, and exits with `code` on pass number `fail_on`.
    fn ffmpeg(&self, fail_on: &str, code: i32) -> PathBuf {
        let calls = self.calls.display();
        self.script(
            "ffmpeg",
            &format!(
                r#"echo "$*" >> '{calls}'
prev=""
for a in "$@"; do
  if [ "$prev" = "-passlogfile" ]; then : > "$a-0.log"; fi
  if [ "$prev" = "-pass" ] && [ "$a" = "{fail_on}" ]; then exit {code}; fi
  prev="$a"
done
exit 0"#
            ),
        )
    }

    fn options(&self, ffprobe: &Path, ffmpeg: &Path) -> Options {
        let mut options = Options::new(&self.video);
        options.ffprobe = ffprobe.into();
        options.ffmpeg = ffmpeg.into();
        options
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.calls)
            .unwrap_or_default()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    fn pass_log(&self) -> PathBuf {
        fs::canonicalize(self.dir.path())
            .unwrap()
            .join("ffmpeg2pass-0.log")
    }
}

#[test]
fn test_two_pass_size_run() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("60.000000", 0);
    let ffmpeg = fx.ffmpeg("none", 1);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Size(10.0);

    run_with_output(&options, &mut Vec::new()).unwrap();

    let calls = fx.calls();
    assert_eq!(calls.len(), 2);
    // 10 MB over 60s, 5% overhead, 64k audio
    assert!(calls[0].contains("-pass 1"));
    assert!(calls[0].contains("-b:v 1233k"));
    assert!(calls[0].contains("-an -f webm /dev/null"));
    assert!(calls[1].contains("-pass 2"));
    assert!(calls[1].contains("-c:a libvorbis"));
    assert!(calls[1].ends_with("holiday clip.webm"));
    assert!(!fx.pass_log().exists());
}

#[test]
fn test_command_only_runs_probe_but_not_encoder() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("60.0", 0);
    let ffmpeg = fx.ffmpeg("none", 1);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Size(10.0);
    options.audio = AudioMode::Off;
    options.command_only = true;

    let mut out = Vec::new();
    run_with_output(&options, &mut out).unwrap();

    let out = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("-b:v 1297k"));
    assert!(lines[1].contains("'"), "path with a space is quoted: {}", lines[1]);
    assert!(fx.calls().is_empty());
}

#[test]
fn test_failed_first_pass_aborts() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("60.0", 0);
    let ffmpeg = fx.ffmpeg("1", 3);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Size(10.0);

    let err = run_with_output(&options, &mut Vec::new()).unwrap_err();
    match err {
        Error::ExternalToolFailure { status, .. } => assert_eq!(status.code(), Some(3)),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fx.calls().len(), 1);
}

#[test]
fn test_failed_probe() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("", 1);
    let ffmpeg = fx.ffmpeg("none", 1);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Size(10.0);

    let err = run_with_output(&options, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, Error::ExternalToolFailure { .. }));
    assert!(fx.calls().is_empty());
}

#[test]
fn test_unusable_duration() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("N/A", 0);
    let ffmpeg = fx.ffmpeg("none", 1);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Size(10.0);

    let err = run_with_output(&options, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[test]
fn test_target_too_small() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("3600", 0);
    let ffmpeg = fx.ffmpeg("none", 1);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Size(1.0);

    let err = run_with_output(&options, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, Error::InfeasibleTarget { .. }));
    assert!(fx.calls().is_empty());
}

#[test]
fn test_bad_overhead_factor() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("60", 0);
    let ffmpeg = fx.ffmpeg("none", 1);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Size(10.0);
    options.overhead_factor = 0.5;

    let err = run_with_output(&options, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidParameter(_)));
}

#[test]
fn test_explicit_bitrate_single_pass() {
    let fx = Fixture::new();
    let ffprobe = fx.ffprobe("", 1);
    let ffmpeg = fx.ffmpeg("none", 1);
    let mut options = fx.options(&ffprobe, &ffmpeg);
    options.rate = RateRequest::Bitrate(750);

    run_with_output(&options, &mut Vec::new()).unwrap();

    let calls = fx.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("-b:v 750k"));
    assert!(!calls[0].contains("-pass"));
}
