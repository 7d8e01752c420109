//! CLI end-to-end tests
//!
//! Tests for the flake command-line interface. None of these need a
//! working ffmpeg.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the flake binary
#[allow(deprecated)]
fn flake_cmd() -> Command {
    let mut cmd = Command::cargo_bin("flake").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help_flag() {
    flake_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--threads"));
}

#[test]
fn test_cli_requires_input_and_output() {
    flake_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input"));
}

#[test]
fn test_cli_rejects_zero_threads() {
    let dir = tempdir().unwrap();
    flake_cmd()
        .arg("-i")
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path().join("out"))
        .args(["-t", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--threads"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_cli_missing_input_exits_with_error() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("out");

    flake_cmd()
        .arg("-i")
        .arg(dir.path().join("missing"))
        .arg("-o")
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Input directory does not exist"));

    assert!(!output.exists());
}

#[test]
fn test_cli_empty_input_warns_and_succeeds() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("notes.txt"), b"not audio").unwrap();

    flake_cmd()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stderr(predicate::str::contains("No flac files found"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn test_cli_missing_config_file() {
    let dir = tempdir().unwrap();
    flake_cmd()
        .arg("-i")
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path().join("out"))
        .arg("-c")
        .arg(dir.path().join("nope.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_cli_invalid_config_rejected() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("flake.toml");
    fs::write(&config, "[batch]\nsource_extensions = [\".flac\"]\n").unwrap();

    flake_cmd()
        .arg("-i")
        .arg(dir.path())
        .arg("-o")
        .arg(dir.path().join("out"))
        .arg("-c")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bare extension"));
}

#[test]
fn test_cli_per_file_failures_do_not_fail_the_run() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(input.join("album")).unwrap();
    fs::write(input.join("album/track.flac"), b"fLaC").unwrap();
    let output = dir.path().join("out");
    let report = dir.path().join("report.json");

    flake_cmd()
        .env("FLAKE_CONVERTER__FFMPEG_PATH", dir.path().join("no-such-ffmpeg"))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stderr(predicate::str::contains("Error converting album/track.flac"));

    assert!(!output.join("album/track.mp3").exists());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["summary"]["discovered"], 1);
    assert_eq!(json["summary"]["failed"], 1);
    assert_eq!(json["entries"][0]["source"], "album/track.flac");
    assert_eq!(json["entries"][0]["status"], "failed");
}

#[test]
fn test_cli_unwritable_report_exits_with_error() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(&input).unwrap();

    flake_cmd()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .arg("--report")
        .arg(dir.path().join("no/such/dir/report.json"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to create report file"));
}

/// A stand-in ffmpeg that answers `-version` and hangs on conversions.
#[cfg(unix)]
fn hanging_ffmpeg(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("slow-ffmpeg");
    fs::write(
        &path,
        "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then echo ffmpeg; exit 0; fi\nexec sleep 30\n",
    )
    .unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: &str) {
    let status = Command::new("kill")
        .args([signal, &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

#[cfg(unix)]
#[test]
fn test_cli_second_interrupt_aborts() {
    use std::process::Stdio;
    use std::thread::sleep;
    use std::time::{Duration, Instant};

    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    fs::create_dir_all(&input).unwrap();
    fs::write(input.join("track.flac"), b"fLaC").unwrap();

    let mut child = flake_cmd()
        .env("FLAKE_CONVERTER__FFMPEG_PATH", hanging_ffmpeg(dir.path()))
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("out"))
        .args(["-t", "1"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // Let the conversion start and the signal handlers install
    sleep(Duration::from_millis(1500));
    send_signal(child.id(), "-INT");
    sleep(Duration::from_millis(300));
    assert!(child.try_wait().unwrap().is_none(), "first interrupt only cancels");
    send_signal(child.id(), "-TERM");

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("flake did not exit after the second signal");
        }
        sleep(Duration::from_millis(50));
    };

    assert_eq!(status.code(), Some(130));
    assert!(!dir.path().join("out/track.mp3").exists());
}
