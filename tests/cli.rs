#![cfg(all(feature = "cli", feature = "logging"))]

use std::process::Command;

fn ytfetch() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ytfetch"))
}

#[test]
fn missing_url_prints_help_and_fails() {
    let out = ytfetch().output().unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Usage:"), "{stdout}");
    assert!(stdout.contains("--itag"));
    assert!(stdout.contains("--build-playback-report"));
}

#[test]
fn version_flag() {
    let out = ytfetch().arg("--version").output().unwrap();

    assert!(out.status.success());
    assert_eq!(
        String::from_utf8_lossy(&out.stdout).trim(),
        format!("ytfetch {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn non_numeric_itag_is_a_usage_error() {
    let out = ytfetch()
        .args(["dQw4w9WgXcQ", "--itag", "best"])
        .output()
        .unwrap();

    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn unrecognized_url_fails_before_any_request() {
    let out = ytfetch()
        .arg("https://example.com/not-a-video")
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("video ID"));
}
