//! Integration tests for the coach binary.
//!
//! These tests verify end-to-end behavior including:
//! - Week calendar statuses
//! - Guided session workflow and journal persistence
//! - Benign rejections and store recovery

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TEMPLATES: &str = r#"[
    {
        "id": "legs_a",
        "name": "Legs A",
        "workout_kind": "strength",
        "weekday": 1,
        "estimated_duration_min": 45,
        "exercises": [
            {"id": "squat", "exercise_ref": "back_squat", "order": 0,
             "set_count": 3, "reps_spec": "5", "rest_seconds": 120,
             "suggested_load": 100.0}
        ]
    }
]"#;

const MONDAY: &str = "synthetic:2024-01-15:legs_a";

/// Helper to create a data directory holding the template file
fn setup_test_dir() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("templates.json"), TEMPLATES).unwrap();
    temp_dir
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("coach"))
}

/// Run the CLI against `data_dir`, with config lookups kept inside it
fn coach(data_dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    cli()
        .env("HOME", data_dir)
        .env("XDG_CONFIG_HOME", data_dir.join("config"))
        .args(args)
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
}

fn journal_lines(data_dir: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(data_dir.join("workouts.jsonl"))
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Coaching schedule and guided workout sessions",
        ));
}

#[test]
fn test_week_shows_pending_synthetic_workout() {
    let temp_dir = setup_test_dir();

    coach(
        temp_dir.path(),
        &["week", "--date", "2024-01-15", "--today", "2024-01-15"],
    )
    .success()
    .stdout(predicate::str::contains("Week of 2024-01-15 .. 2024-01-21"))
    .stdout(predicate::str::contains("pending"))
    .stdout(predicate::str::contains(MONDAY));
}

#[test]
fn test_week_statuses_relative_to_today() {
    let temp_dir = setup_test_dir();

    coach(
        temp_dir.path(),
        &["week", "--date", "2024-01-15", "--today", "2024-01-14"],
    )
    .success()
    .stdout(predicate::str::contains("future"))
    .stdout(predicate::str::contains("pending").not());

    coach(
        temp_dir.path(),
        &["week", "--date", "2024-01-15", "--today", "2024-01-17"],
    )
    .success()
    .stdout(predicate::str::contains("missed"));
}

#[test]
fn test_full_session_is_journaled() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    coach(data_dir, &["start", MONDAY])
        .success()
        .stdout(predicate::str::contains("Starting Legs A (3 sets across 1 exercises)"))
        .stdout(predicate::str::contains("Next: back_squat set 1/3 (5 reps @ 100)"));
    assert!(data_dir.join("session.json").exists());

    coach(data_dir, &["done", "--reps", "5", "--weight", "100"])
        .success()
        .stdout(predicate::str::contains("Rest 120s"));
    coach(data_dir, &["done", "--reps", "5", "--weight", "100"]).success();
    coach(data_dir, &["done", "--reps", "4", "--weight", "100"])
        .success()
        .stdout(predicate::str::contains("All sets resolved"));

    coach(data_dir, &["finish", "--difficulty", "8", "--notes", "felt strong"])
        .success()
        .stdout(predicate::str::contains("Sets: 3/3"))
        .stdout(predicate::str::contains("Volume: 1400.0"))
        .stdout(predicate::str::contains("Session saved"));

    assert!(!data_dir.join("session.json").exists());
    let lines = journal_lines(data_dir);
    assert_eq!(lines.len(), 1);
    let payload = &lines[0]["payload"];
    assert_eq!(payload["workout_id"], MONDAY);
    assert_eq!(payload["template_id"], "legs_a");
    assert_eq!(payload["completed_sets"].as_array().unwrap().len(), 3);
    assert_eq!(payload["difficulty"], 8);
    assert_eq!(payload["notes"], "felt strong");

    coach(
        data_dir,
        &["week", "--date", "2024-01-15", "--today", "2024-01-17"],
    )
    .success()
    .stdout(predicate::str::contains("completed"))
    .stdout(predicate::str::contains("missed").not());
}

#[test]
fn test_failed_save_keeps_session_for_retry() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let journal = data_dir.join("workouts.jsonl");

    coach(data_dir, &["start", MONDAY]).success();
    for _ in 0..3 {
        coach(data_dir, &["done", "--reps", "5", "--weight", "100"]).success();
    }

    // A directory where the journal should be makes the append fail
    fs::create_dir(&journal).unwrap();
    coach(data_dir, &["finish", "--difficulty", "6"])
        .failure()
        .stderr(predicate::str::contains("session kept for retry"));

    let stored: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data_dir.join("session.json")).unwrap())
            .unwrap();
    assert_eq!(stored["state"], "completed");
    assert_eq!(stored["completed_sets"].as_array().unwrap().len(), 3);

    fs::remove_dir(&journal).unwrap();
    coach(data_dir, &["finish", "--difficulty", "6"])
        .success()
        .stdout(predicate::str::contains("Session saved"));

    assert!(!data_dir.join("session.json").exists());
    let lines = journal_lines(data_dir);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["payload"]["completed_sets"].as_array().unwrap().len(), 3);
    assert_eq!(lines[0]["payload"]["difficulty"], 6);
}

#[test]
fn test_config_from_isolated_home() {
    let temp_dir = setup_test_dir();
    let config_dir = temp_dir.path().join("config").join("coach");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "[session]\ndefault_rest_seconds = 45\n",
    )
    .unwrap();
    // Template rest applies when set; clear it so the configured default is used
    fs::write(
        temp_dir.path().join("templates.json"),
        TEMPLATES.replace("\"rest_seconds\": 120", "\"rest_seconds\": 0"),
    )
    .unwrap();

    coach(temp_dir.path(), &["start", MONDAY]).success();
    coach(temp_dir.path(), &["done", "--reps", "5", "--weight", "100"])
        .success()
        .stdout(predicate::str::contains("Rest 45s"));
}

#[test]
fn test_personal_record_against_history() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    coach(data_dir, &["start", MONDAY]).success();
    coach(data_dir, &["done", "--reps", "5", "--weight", "100"])
        .success()
        .stdout(predicate::str::contains("personal record").not());
    coach(data_dir, &["finish", "--force"]).success();

    coach(data_dir, &["start", "synthetic:2024-01-22:legs_a"]).success();
    coach(data_dir, &["done", "--reps", "5", "--weight", "110"])
        .success()
        .stdout(predicate::str::contains(
            "New personal record: back_squat 5 x 110",
        ));
}

#[test]
fn test_rejections_exit_successfully() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    coach(data_dir, &["done", "--reps", "5"])
        .success()
        .stdout(predicate::str::contains(
            "Nothing to do: session has not been started",
        ));
    assert!(!data_dir.join("session.json").exists());

    coach(data_dir, &["start", MONDAY]).success();
    coach(data_dir, &["start", "synthetic:2024-01-22:legs_a"])
        .success()
        .stdout(predicate::str::contains("already in progress"));

    coach(data_dir, &["finish"])
        .success()
        .stdout(predicate::str::contains("unresolved sets"));
    assert!(data_dir.join("session.json").exists());
    assert!(!data_dir.join("workouts.jsonl").exists());
}

#[test]
fn test_forced_finish_clamps_feedback() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    coach(data_dir, &["start", MONDAY]).success();
    coach(data_dir, &["done", "--reps", "5", "--weight", "100"]).success();
    coach(data_dir, &["skip-exercise"])
        .success()
        .stdout(predicate::str::contains("All sets resolved"));
    coach(
        data_dir,
        &["finish", "--force", "--difficulty", "15", "--notes", "  "],
    )
    .success()
    .stdout(predicate::str::contains("Sets: 1/3"));

    let lines = journal_lines(data_dir);
    assert_eq!(lines[0]["payload"]["difficulty"], 10);
    assert!(lines[0]["payload"]["notes"].is_null());
}

#[test]
fn test_cardio_and_edit() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    coach(data_dir, &["start", MONDAY]).success();
    coach(data_dir, &["done", "--reps", "5", "--weight", "100"]).success();
    coach(
        data_dir,
        &["edit", "--exercise", "squat", "--set", "1", "--reps", "6", "--weight", "100"],
    )
    .success();
    coach(
        data_dir,
        &["edit", "--exercise", "squat", "--set", "2", "--reps", "6", "--weight", "100"],
    )
    .success()
    .stdout(predicate::str::contains("has not been completed"));
    coach(
        data_dir,
        &["cardio", "--kind", "bike", "--minutes", "10", "--calories", "90"],
    )
    .success();

    coach(data_dir, &["status"])
        .success()
        .stdout(predicate::str::contains("Legs A"))
        .stdout(predicate::str::contains("Cardio: bike 10 min"))
        .stdout(predicate::str::contains("Next: back_squat set 2/3"));

    coach(data_dir, &["finish", "--force"]).success();
    let payload = &journal_lines(data_dir)[0]["payload"];
    assert_eq!(payload["completed_sets"][0]["reps"], 6);
    assert_eq!(payload["cardio_entries"][0]["kind"], "bike");
}

#[test]
fn test_rest_controls() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    coach(data_dir, &["start", MONDAY]).success();
    coach(data_dir, &["done", "--reps", "5", "--weight", "100"]).success();
    coach(data_dir, &["rest", "--add", "30"]).success();
    coach(data_dir, &["status"])
        .success()
        .stdout(predicate::str::contains("of 150s left"));

    coach(data_dir, &["rest", "--skip"]).success();
    coach(data_dir, &["status"])
        .success()
        .stdout(predicate::str::contains("Resting").not());
}

#[test]
fn test_unknown_workout_fails() {
    let temp_dir = setup_test_dir();

    coach(temp_dir.path(), &["start", "synthetic:2024-01-15:nope"])
        .failure()
        .stderr(predicate::str::contains("workout not found"));
    assert!(!temp_dir.path().join("session.json").exists());
}

#[test]
fn test_corrupt_session_is_reported_and_kept() {
    let temp_dir = setup_test_dir();
    let session_path = temp_dir.path().join("session.json");
    fs::write(&session_path, "{ not a session").unwrap();

    coach(temp_dir.path(), &["done", "--reps", "5"])
        .failure()
        .stderr(predicate::str::contains("unreadable"));
    assert_eq!(
        fs::read_to_string(&session_path).unwrap(),
        "{ not a session"
    );

    coach(temp_dir.path(), &["discard"])
        .success()
        .stdout(predicate::str::contains("Session discarded"));
    assert!(!session_path.exists());
}

#[test]
fn test_discard_without_session() {
    let temp_dir = setup_test_dir();

    coach(temp_dir.path(), &["discard"])
        .success()
        .stdout(predicate::str::contains("No session in progress"));
    coach(temp_dir.path(), &["status"])
        .success()
        .stdout(predicate::str::contains("No session in progress"));
}
