use std::process::Command;

use serde_json::Value;

fn cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_chord_cli"))
}

#[test]
fn replay_fixture_succeeds() {
    let output = cli()
        .args(["replay", "--fixture", "c_am_f_g"])
        .output()
        .expect("failed to run chord_cli replay");
    assert!(
        output.status.success(),
        "CLI exited with {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    let json: Value = serde_json::from_str(stdout.trim()).expect("replay report JSON payload");
    assert_eq!(json["fixture"], "c_am_f_g");
    assert_eq!(json["event_count"], 4);
    assert_eq!(json["events"][1]["chord"], "Am");
    assert_eq!(json["events"][1]["origin"], "detected");
}

#[test]
fn replay_fixture_through_session_matches_inline() {
    let output = cli()
        .args(["replay", "--fixture", "sustained_g7", "--session"])
        .output()
        .expect("failed to run threaded replay");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("report JSON");
    assert_eq!(json["event_count"], 3);
    assert_eq!(json["stats"]["frames_received"], 46);
}

#[test]
fn replay_detects_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("wrong.json");
    std::fs::write(
        &path,
        r#"{
            "name": "wrong",
            "samples": [
                { "chroma": [1, 0, 0, 0, 0.8, 0, 0, 0.8, 0, 0, 0, 0], "rms": 0.2, "timestamp_secs": 0.0 }
            ],
            "expect": { "events": [ { "chord": "Cm", "timestamp": 0.0 } ] }
        }"#,
    )
    .expect("write fixture");

    let output = cli()
        .args(["replay", "--fixture", &path.to_string_lossy()])
        .output()
        .expect("failed to run mismatch replay");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr UTF-8");
    assert!(
        stderr.contains("\"failures\""),
        "expected diff JSON in stderr, got {stderr}"
    );
}

#[test]
fn classify_single_frame() {
    let output = cli()
        .args([
            "classify",
            "--chroma",
            "0,0,1,0,0,0.8,0,0,0,0.8,0,0",
            "--rms",
            "0.3",
        ])
        .output()
        .expect("failed to run classify");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("classification JSON");
    assert_eq!(json["chord"], "Dm");
}

#[test]
fn classify_rejects_short_chroma() {
    let output = cli()
        .args(["classify", "--chroma", "1,0,0"])
        .output()
        .expect("failed to run classify");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn expand_prints_notes() {
    let output = cli()
        .args(["expand", "Bbmaj7"])
        .output()
        .expect("failed to run expand");
    assert!(output.status.success());
    let json: Value = serde_json::from_slice(&output.stdout).expect("notes JSON");
    assert_eq!(json, serde_json::json!(["A#", "D", "F", "A"]));
}

#[test]
fn simulate_is_deterministic_for_keyword_title() {
    let run = |seed: &str| {
        let output = cli()
            .args(["simulate", "--title", "Amazing Grace", "--count", "4", "--seed", seed])
            .output()
            .expect("failed to run simulate");
        assert!(output.status.success());
        String::from_utf8(output.stdout).expect("stdout UTF-8")
    };

    let chords: Vec<String> = run("1")
        .lines()
        .map(|line| {
            let json: Value = serde_json::from_str(line).expect("entry JSON");
            assert_eq!(json["origin"], "simulated");
            json["chord"].as_str().unwrap_or_default().to_string()
        })
        .collect();
    assert_eq!(chords, vec!["G", "D", "Em", "C"]);
    assert_eq!(run("5"), run("5"));
}

#[test]
fn dump_fixtures_lists_json_assets() {
    let output = cli()
        .arg("dump-fixtures")
        .output()
        .expect("failed to run dump-fixtures");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert!(stdout.contains("c_am_f_g"));
    assert!(stdout.contains("silence_then_dm7"));
}

#[test]
fn templates_lists_vocabulary() {
    let output = cli().arg("templates").output().expect("failed to run templates");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout UTF-8");
    assert_eq!(stdout.lines().count(), 9);
    assert!(stdout.contains("maj7"));
}
