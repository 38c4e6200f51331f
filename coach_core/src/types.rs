//! Core domain types for the coaching system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Templates and professional training programs (prescriptions)
//! - Logged workouts (history)
//! - Materialized workouts and calendar cells
//! - Session records, summaries and the persistence payload

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Weekday number of a date, 0 = Sunday through 6 = Saturday
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Planned rep count for a reps spec such as "12", "10 each" or "8-12".
///
/// Uses the leading integer; specs without one (e.g. "AMRAP") plan 0 reps.
pub fn parse_reps_spec(spec: &str) -> u32 {
    let digits: String = spec
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

// ============================================================================
// Prescription Types
// ============================================================================

/// One exercise prescribed by a template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TemplateExercise {
    pub id: String,
    pub exercise_ref: String,
    pub order: u32,
    pub set_count: u32,
    pub reps_spec: String,
    pub rest_seconds: u32,
    #[serde(default)]
    pub suggested_load: Option<f64>,
    #[serde(default)]
    pub is_superset: bool,
}

impl TemplateExercise {
    pub fn planned_reps(&self) -> u32 {
        parse_reps_spec(&self.reps_spec)
    }
}

/// A recurring workout prescription tied to a weekday
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub workout_kind: String,
    #[serde(default)]
    pub phase: Option<String>,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u8,
    pub estimated_duration_min: u32,
    pub exercises: Vec<TemplateExercise>,
}

/// A training day inside a professional program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgramDay {
    pub id: String,
    pub name: String,
    pub workout_kind: String,
    #[serde(default)]
    pub phase: Option<String>,
    /// Explicit weekday, when the professional pinned one
    #[serde(default)]
    pub weekday: Option<u8>,
    #[serde(default)]
    pub estimated_duration_min: u32,
    #[serde(default)]
    pub exercises: Vec<TemplateExercise>,
}

/// A professional-authored program assigned to a client
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrainingProgram {
    pub id: String,
    pub name: String,
    pub client_id: String,
    pub days: Vec<ProgramDay>,
}

impl TrainingProgram {
    /// Days with at least one exercise, in author order
    pub fn populated_days(&self) -> impl Iterator<Item = &ProgramDay> {
        self.days.iter().filter(|d| !d.exercises.is_empty())
    }
}

/// Cosmetic tag for a day with a known recurring activity outside the plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringActivity {
    pub weekday: u8,
    pub kind: String,
    pub icon: String,
}

// ============================================================================
// History Types
// ============================================================================

/// Lifecycle of a workout record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

/// Resolution of a single set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SetStatus {
    Pending,
    Done,
    Skipped,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggedSet {
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub status: SetStatus,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggedExercise {
    pub id: String,
    pub exercise_ref: String,
    pub sets: Vec<LoggedSet>,
}

/// A persisted record of a workout actually performed (or abandoned)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggedWorkout {
    pub id: String,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    pub date: NaiveDate,
    pub status: WorkoutStatus,
    #[serde(default)]
    pub exercises: Vec<LoggedExercise>,
}

/// Inclusive range of calendar dates
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The Monday-start ISO week containing `date`
    pub fn week_of(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let len = ((self.end - self.start).num_days() + 1).max(0);
        (0..len).map(move |i| start + Duration::days(i))
    }
}

// ============================================================================
// Materialized Workout Types
// ============================================================================

/// One set of a materialized workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSet {
    pub set_number: u32,
    pub planned_reps: u32,
    pub planned_load: Option<f64>,
    pub status: SetStatus,
    #[serde(default)]
    pub actual_reps: Option<u32>,
    #[serde(default)]
    pub actual_weight: Option<f64>,
}

impl ExerciseSet {
    pub fn pending(set_number: u32, planned_reps: u32, planned_load: Option<f64>) -> Self {
        Self {
            set_number,
            planned_reps,
            planned_load,
            status: SetStatus::Pending,
            actual_reps: None,
            actual_weight: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status != SetStatus::Pending
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutExercise {
    pub id: String,
    pub exercise_ref: String,
    pub order: u32,
    pub reps_spec: String,
    pub rest_seconds: u32,
    #[serde(default)]
    pub is_superset: bool,
    pub sets: Vec<ExerciseSet>,
}

impl WorkoutExercise {
    pub fn done_sets(&self) -> usize {
        self.sets.iter().filter(|s| s.status == SetStatus::Done).count()
    }
}

/// A full workout aggregate, either promoted from a log or synthesized
/// from a template for a date with no log yet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: String,
    pub template_id: Option<String>,
    pub name: String,
    pub kind: String,
    pub phase: Option<String>,
    pub date: NaiveDate,
    pub status: WorkoutStatus,
    pub synthetic: bool,
    pub estimated_duration_min: u32,
    pub exercises: Vec<WorkoutExercise>,
}

impl Workout {
    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn done_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.done_sets()).sum()
    }

    pub fn resolved_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.is_resolved())
            .count()
    }
}

// ============================================================================
// Calendar Types
// ============================================================================

/// Derived status of a calendar day
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Completed,
    Missed,
    Pending,
    Future,
    Rest,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayStatus::Completed => "completed",
            DayStatus::Missed => "missed",
            DayStatus::Pending => "pending",
            DayStatus::Future => "future",
            DayStatus::Rest => "rest",
        }
    }
}

/// One calendar cell; recomputed on every reconciliation pass
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DayWorkout {
    pub date: NaiveDate,
    pub weekday: u8,
    pub status: DayStatus,
    pub workout: Option<Workout>,
    pub kind: Option<String>,
    pub icon: Option<String>,
}

/// Seven cells, Monday first
pub type Week = [DayWorkout; 7];

// ============================================================================
// Session Types
// ============================================================================

/// User input for a set
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetInput {
    pub reps: u32,
    pub weight: f64,
}

/// A set the user actually performed during a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedSet {
    pub exercise_id: String,
    pub exercise_ref: String,
    pub set_number: u32,
    pub reps: u32,
    pub weight: f64,
    pub completed_at: DateTime<Utc>,
}

impl CompletedSet {
    pub fn volume(&self) -> f64 {
        self.weight * self.reps as f64
    }
}

/// A cardio block logged during a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompletedCardio {
    pub kind: String,
    pub duration_min: u32,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub calories: Option<u32>,
    pub recorded_at: DateTime<Utc>,
}

/// A detected best-ever result for an exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecord {
    pub exercise_ref: String,
    pub weight: f64,
    pub reps: u32,
    pub date: NaiveDate,
}

/// End-of-session report
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSummary {
    pub workout_id: String,
    pub name: String,
    pub elapsed_seconds: i64,
    pub duration_min: u32,
    pub exercises_completed: usize,
    pub exercises_total: usize,
    pub sets_completed: usize,
    pub sets_total: usize,
    pub total_volume: f64,
    pub estimated_calories: u32,
    pub personal_records: Vec<PersonalRecord>,
    pub cardio: Vec<CompletedCardio>,
}

/// Subjective feedback collected at finish time
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionFeedback {
    pub difficulty: Option<u8>,
    pub energy: Option<u8>,
    pub notes: Option<String>,
}

/// Payload handed to the persistence collaborator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionPayload {
    pub workout_id: String,
    pub template_id: Option<String>,
    pub name: String,
    pub kind: String,
    pub date: NaiveDate,
    pub duration_min: u32,
    pub completed_sets: Vec<CompletedSet>,
    pub cardio_entries: Vec<CompletedCardio>,
    pub difficulty: Option<u8>,
    pub energy: Option<u8>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_numbering_starts_on_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 14).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();

        assert_eq!(weekday_of(sunday), 0);
        assert_eq!(weekday_of(monday), 1);
        assert_eq!(weekday_of(saturday), 6);
    }

    #[test]
    fn test_parse_reps_spec() {
        assert_eq!(parse_reps_spec("12"), 12);
        assert_eq!(parse_reps_spec("10 each"), 10);
        assert_eq!(parse_reps_spec(" 8-12"), 8);
        assert_eq!(parse_reps_spec("AMRAP"), 0);
        assert_eq!(parse_reps_spec(""), 0);
    }

    #[test]
    fn test_week_of_is_monday_start() {
        // Sunday belongs to the week that started the previous Monday
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 21).unwrap();
        let range = DateRange::week_of(sunday);

        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(range.end, sunday);
        assert_eq!(range.days().count(), 7);
        assert!(range.contains(sunday));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 1, 22).unwrap()));
    }

    #[test]
    fn test_populated_days_skips_empty() {
        let program = TrainingProgram {
            id: "p1".into(),
            name: "Block 1".into(),
            client_id: "c1".into(),
            days: vec![
                ProgramDay {
                    id: "d1".into(),
                    name: "Empty".into(),
                    workout_kind: "strength".into(),
                    phase: None,
                    weekday: None,
                    estimated_duration_min: 0,
                    exercises: vec![],
                },
                ProgramDay {
                    id: "d2".into(),
                    name: "Legs".into(),
                    workout_kind: "strength".into(),
                    phase: None,
                    weekday: None,
                    estimated_duration_min: 45,
                    exercises: vec![TemplateExercise {
                        id: "e1".into(),
                        exercise_ref: "squat".into(),
                        order: 0,
                        set_count: 3,
                        reps_spec: "5".into(),
                        rest_seconds: 120,
                        suggested_load: Some(100.0),
                        is_superset: false,
                    }],
                },
            ],
        };

        let ids: Vec<_> = program.populated_days().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["d2"]);
    }

    #[test]
    fn test_logged_workout_defaults() {
        let json = r#"{"id":"w1","date":"2024-01-16","status":"completed"}"#;
        let logged: LoggedWorkout = serde_json::from_str(json).unwrap();

        assert_eq!(logged.status, WorkoutStatus::Completed);
        assert!(logged.template_id.is_none());
        assert!(logged.exercises.is_empty());
    }
}
