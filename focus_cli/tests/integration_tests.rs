//! Integration tests for the focus binary.
//!
//! These tests verify end-to-end behavior including:
//! - Running each timer mode against a simulated clock
//! - Session logging and progress persistence
//! - CSV rollup operations
//! - Presets and time capsules

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("focus"))
}

/// CLI bound to `data_dir`, isolated from the user's config file
fn focus(data_dir: &Path) -> Command {
    let mut cmd = cli();
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn log_lines(data_dir: &Path) -> Vec<String> {
    fs::read_to_string(data_dir.join("log/sessions.jsonl"))
        .map(|content| content.lines().map(String::from).collect())
        .unwrap_or_default()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Focus timer with streaks, achievements and daily challenges",
        ));
}

#[test]
fn test_countdown_logs_one_session() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["run", "countdown", "--duration", "3s", "--simulate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Completed Timer: 3s countdown (3s)"))
        .stdout(predicate::str::contains("🔥 Streak: 1 day"))
        .stdout(predicate::str::contains("Achievement unlocked: First Focus"));

    let lines = log_lines(data_dir);
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(record["type"], "timer");
    assert_eq!(record["totalSeconds"], 3);
    assert!(record["completedAt"].is_string());

    assert!(data_dir.join("state.json").exists());
}

#[test]
fn test_interval_records_full_accounting() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args([
            "run", "interval", "--work", "5s", "--rest", "3s", "--rounds", "2", "--simulate",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("▶ Rest (round 1/2)"))
        .stdout(predicate::str::contains("▶ Work (round 2/2)"))
        .stdout(predicate::str::contains(
            "✓ Completed Interval: 2 x 5s work / 3s rest (16s)",
        ));

    assert_eq!(log_lines(data_dir).len(), 1);
}

#[test]
fn test_sequence_runs_each_step() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args([
            "run",
            "sequence",
            "--step",
            "Plan:10s",
            "--step",
            "Build:1m",
            "--simulate",
            "--name",
            "Morning",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("▶ Build (step 2/2)"))
        .stdout(predicate::str::contains(
            "✓ Completed Morning: Plan → Build (1m 10s)",
        ));

    let record: serde_json::Value = serde_json::from_str(&log_lines(data_dir)[0]).unwrap();
    assert_eq!(record["type"], "sequence");
    assert_eq!(record["name"], "Morning");
    assert_eq!(record["totalSeconds"], 70);
}

#[test]
fn test_runs_repeats_until_count() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let output = focus(data_dir)
        .args([
            "run", "countdown", "--duration", "2", "--runs", "3", "--simulate",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let stdout = String::from_utf8_lossy(&output);
    assert_eq!(stdout.matches("✓ Completed").count(), 3);
    // Same day, so the streak only grows once
    assert_eq!(stdout.matches("🔥 Streak").count(), 1);
    assert_eq!(log_lines(data_dir).len(), 3);
}

#[test]
fn test_session_log_keeps_recent_limit() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let config_dir = data_dir.join("config/focus");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[history]\nrecent_limit = 3\n").unwrap();

    for name in ["One", "Two", "Three", "Four", "Five"] {
        focus(data_dir)
            .args(["run", "countdown", "--duration", "1", "--simulate", "--name", name])
            .assert()
            .success();
    }

    let names: Vec<String> = log_lines(data_dir)
        .iter()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            record["name"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(names, vec!["Three", "Four", "Five"]);

    // Streak and totals are kept in state, not in the bounded log
    focus(data_dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Completions: 5"));
}

#[test]
fn test_stopwatch_stops_at_max_ticks() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["run", "stopwatch", "--max-ticks", "5", "--simulate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Stopped after 5 ticks at 5s"));

    // A stopwatch never completes on its own
    assert!(log_lines(data_dir).is_empty());
}

#[test]
fn test_simulated_stopwatch_requires_bound() {
    let temp_dir = setup_test_dir();

    focus(temp_dir.path())
        .args(["run", "stopwatch", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--max-ticks"));
}

#[test]
fn test_invalid_duration_rejected() {
    let temp_dir = setup_test_dir();

    focus(temp_dir.path())
        .args(["run", "countdown", "--duration", "soon", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid duration"));
}

#[test]
fn test_zero_rounds_complete_with_zero_total() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args([
            "run", "interval", "--work", "5s", "--rest", "5s", "--rounds", "0", "--runs", "3",
            "--simulate",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("invalid configuration (0s)"));

    // Never loops, even when asked to repeat
    assert_eq!(log_lines(data_dir).len(), 1);
}

#[test]
fn test_status_reflects_progress() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Streak:      0 day(s)"));

    focus(data_dir)
        .args(["run", "countdown", "--duration", "2s", "--simulate"])
        .assert()
        .success();

    focus(data_dir)
        .args(["status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Streak:      1 day(s)"))
        .stdout(predicate::str::contains("Completions: 1"))
        .stdout(predicate::str::contains("This month:  1 sessions, 2s"))
        .stdout(predicate::str::contains("🏆 First Focus"));
}

#[test]
fn test_history_lists_newest_first() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sessions recorded yet"));

    for name in ["First", "Second"] {
        focus(data_dir)
            .args(["run", "countdown", "--duration", "1", "--simulate", "--name", name])
            .assert()
            .success();
    }

    let output = focus(data_dir)
        .args(["history"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);

    let first = stdout.find("First").expect("First missing from history");
    let second = stdout.find("Second").expect("Second missing from history");
    assert!(second < first, "Expected newest first:\n{}", stdout);

    focus(data_dir)
        .args(["history", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Second"))
        .stdout(predicate::str::contains("First").not());
}

#[test]
fn test_rollup_creates_csv() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    for _ in 0..3 {
        focus(data_dir)
            .args(["run", "countdown", "--duration", "1", "--simulate"])
            .assert()
            .success();
    }

    focus(data_dir)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 3 sessions"));

    let csv_path = data_dir.join("sessions.csv");
    assert!(csv_path.exists());

    let csv_content = fs::read_to_string(&csv_path).expect("Failed to read CSV");
    assert!(csv_content.starts_with("id,type,name,total_seconds,details,completed_at"));
    assert!(!data_dir.join("log/sessions.jsonl").exists());

    // History still sees the archived sessions
    let output = focus(data_dir)
        .arg("history")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8_lossy(&output).matches("timer").count(), 3);
}

#[test]
fn test_rollup_with_cleanup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["run", "countdown", "--duration", "1", "--simulate"])
        .assert()
        .success();

    focus(data_dir)
        .args(["rollup", "--cleanup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed logs"));

    let entries: Vec<_> = fs::read_dir(data_dir.join("log"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".processed"))
        .collect();

    assert_eq!(entries.len(), 0);
}

#[test]
fn test_empty_rollup() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}

#[test]
fn test_preset_lifecycle() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["preset", "add", "Pomodoro", "countdown", "--duration", "25m"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved preset 'Pomodoro'"));

    focus(data_dir)
        .args(["preset", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("countdown 25m"));

    focus(data_dir)
        .args(["run", "preset", "pomodoro", "--simulate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Completed Pomodoro: 25m countdown (25m)"));

    focus(data_dir)
        .args(["preset", "remove", "Pomodoro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed preset 'Pomodoro'"));

    focus(data_dir)
        .args(["run", "preset", "Pomodoro", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no preset named"));
}

#[test]
fn test_capsule_seal_and_open() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["capsule", "seal", "Remember why you started", "--days", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Capsule sealed"));

    focus(data_dir)
        .args(["capsule", "open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remember why you started"));

    // Opened capsules stay opened
    focus(data_dir)
        .args(["capsule", "open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No capsules ready"));
}

#[test]
fn test_sealed_capsule_waits() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    focus(data_dir)
        .args(["capsule", "seal", "Not yet", "--days", "30"])
        .assert()
        .success();

    focus(data_dir)
        .args(["capsule", "open"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not yet").not());
}
