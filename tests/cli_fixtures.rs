use std::path::PathBuf;
use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_voiceprint_cli"))
}

fn temp_wav(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("voiceprint_cli_{}_{}.wav", name, std::process::id()))
}

fn synth(path: &PathBuf, pattern: &str, frequency: &str) {
    let output = cli()
        .args(["synth", "--pattern", pattern, "--frequency", frequency])
        .arg(path)
        .output()
        .expect("failed to run voiceprint_cli synth");
    assert!(output.status.success(), "synth exited with {:?}", output.status.code());
}

#[test]
fn compare_identical_recordings_as_json() {
    let path = temp_wav("identical");
    synth(&path, "voice", "150");

    let output = cli()
        .arg("compare")
        .arg(&path)
        .arg(&path)
        .arg("--json")
        .output()
        .expect("failed to run voiceprint_cli compare");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success(), "CLI exited with {:?}", output.status.code());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("report JSON payload");
    assert!((json["total"].as_f64().unwrap_or_default() - 1.0).abs() < 1e-6);
    assert!(json["details"]["durationRatio"].is_number());
}

#[test]
fn compare_enforces_min_score() {
    let a = temp_wav("min_a");
    let b = temp_wav("min_b");
    synth(&a, "voice", "150");
    synth(&b, "silence", "0");

    let output = cli()
        .arg("compare")
        .arg(&a)
        .arg(&b)
        .args(["--min-score", "0.5"])
        .output()
        .expect("failed to run voiceprint_cli compare");
    let _ = std::fs::remove_file(&a);
    let _ = std::fs::remove_file(&b);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn features_prints_feature_set() {
    let path = temp_wav("features");
    synth(&path, "sine", "440");

    let output = cli()
        .arg("features")
        .arg(&path)
        .output()
        .expect("failed to run voiceprint_cli features");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("feature JSON");
    let f0 = json["fundamentalHz"].as_f64().unwrap_or_default();
    assert!((f0 - 440.0).abs() < 5.0, "f0 {}", f0);
    assert_eq!(json["mfcc"].as_array().map(|a| a.len()), Some(13));
}

#[test]
fn monitor_emits_snapshots() {
    let path = temp_wav("monitor");
    synth(&path, "voice", "200");

    let output = cli()
        .arg("monitor")
        .arg(&path)
        .output()
        .expect("failed to run voiceprint_cli monitor");
    let _ = std::fs::remove_file(&path);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let lines: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("snapshot JSON line"))
        .collect();
    assert!(!lines.is_empty(), "expected at least one snapshot");
    assert!(lines.iter().any(|l| l["effectiveDurationSecs"].as_f64().unwrap_or(0.0) > 0.0));
}

#[test]
fn missing_file_fails() {
    let output = cli()
        .args(["features", "/definitely/not/here.wav"])
        .output()
        .expect("failed to run voiceprint_cli features");
    assert_eq!(output.status.code(), Some(1));
}
