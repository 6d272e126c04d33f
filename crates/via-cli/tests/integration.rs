//! Integration tests for via-cli.
//!
//! Tests cover the CLI binary invocation end to end: factory patch export,
//! rendering patches to WAV files, and table inspection.

use std::process::Command;
use tempfile::TempDir;

/// Helper to get the path to the `via` binary built by cargo.
fn via_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_via"))
}

#[test]
fn cli_example_patch_list() {
    let output = via_bin()
        .args(["example-patch", "--list"])
        .output()
        .expect("failed to run via example-patch --list");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for name in ["envelope", "looping_envelope", "wavetable", "clocked_wavetable"] {
        assert!(stdout.contains(name), "listing should contain '{name}'");
    }
}

#[test]
fn cli_example_patch_then_render() {
    let dir = TempDir::new().unwrap();
    let patch_path = dir.path().join("patch.toml");
    let wav_path = dir.path().join("out.wav");

    let status = via_bin()
        .args(["example-patch", "--name", "envelope"])
        .arg(&patch_path)
        .status()
        .expect("failed to run via example-patch");
    assert!(status.success());
    let text = std::fs::read_to_string(&patch_path).unwrap();
    assert!(text.contains("type = \"atsr\""), "{text}");

    let output = via_bin()
        .arg("render")
        .arg(&patch_path)
        .arg(&wav_path)
        .args(["--duration", "0.25"])
        .output()
        .expect("failed to run via render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let reader = hound::WavReader::open(&wav_path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, 48000);
    // 0.25 s at 1500 ticks/s of 32-sample blocks
    assert_eq!(reader.len(), 375 * 32);
}

#[test]
fn cli_render_factory_all_channels() {
    let dir = TempDir::new().unwrap();
    let wav_path = dir.path().join("wt.wav");

    let output = via_bin()
        .args(["render", "--factory", "wavetable"])
        .arg(&wav_path)
        .args(["--duration", "0.01", "--channel", "all"])
        .output()
        .expect("failed to run via render");
    assert!(
        output.status.success(),
        "render failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let mut reader = hound::WavReader::open(&wav_path).unwrap();
    assert_eq!(reader.spec().channels, 3);
    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples.len(), 480 * 3);
    // DAC2 is the inverse of DAC1: their PCM values sum to one step below zero
    for frame in samples.chunks(3) {
        assert_eq!(i32::from(frame[0]) + i32::from(frame[1]), -16);
    }
}

#[test]
fn cli_render_rejects_missing_patch() {
    let dir = TempDir::new().unwrap();
    let output = via_bin()
        .arg("render")
        .arg(dir.path().join("nope.toml"))
        .arg(dir.path().join("out.wav"))
        .output()
        .expect("failed to run via render");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope.toml"), "{stderr}");
}

#[test]
fn cli_tables_json() {
    let output = via_bin()
        .args(["tables", "--json"])
        .output()
        .expect("failed to run via tables --json");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"big_sine\""));
    assert!(stdout.contains("\"rev_expo\""));
    assert!(stdout.contains("\"cycle_len\": 512"));
}

#[test]
fn cli_tables_text() {
    let output = via_bin().arg("tables").output().expect("failed to run via tables");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Static Tables"));
    assert!(stdout.contains("Default Family"));
}
