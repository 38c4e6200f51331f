//! Guided session engine.
//!
//! Drives one live workout: `NotStarted → InProgress → Completed`, with a
//! `(exercise, set)` cursor that only moves forward. Every operation is a
//! synchronous transition on a plain serializable value, so the whole
//! session can be written to the local store after each step and resumed
//! after a restart.
//!
//! Operations invoked in a state that doesn't accept them return a
//! [`SessionRejection`] and leave the session untouched.

use crate::records::RecordDetector;
use crate::rest_timer::RestTimer;
use crate::{
    CompletedCardio, CompletedSet, ExerciseSet, PersonalRecord, SessionFeedback, SessionPayload,
    SessionRejection, SetInput, SetStatus, Workout, WorkoutExercise, WorkoutStatus,
    WorkoutSummary,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MET value used for resistance training time
const LIFTING_MET: f64 = 5.0;
/// MET value used for cardio entries without their own calorie count
const CARDIO_MET: f64 = 8.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// Caller-supplied defaults for a session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionOptions {
    /// Rest used for sets whose exercise has no configured rest
    pub default_rest_seconds: u32,
    /// Body mass for calorie estimation
    pub body_weight_kg: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            default_rest_seconds: 90,
            body_weight_kg: 70.0,
        }
    }
}

/// Position of the current set
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cursor {
    pub exercise: usize,
    pub set: usize,
}

/// What a transition signalled to the caller
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transition {
    /// Record detected for the set just completed
    pub personal_record: Option<PersonalRecord>,
    /// Rest countdown started, in seconds
    pub rest_seconds: Option<u32>,
    /// The session reached `Completed`
    pub completed: bool,
}

/// Reducer input
#[derive(Clone, Debug, PartialEq)]
pub enum SessionAction {
    Start(Workout),
    CompleteSet(SetInput),
    EditSet {
        exercise_id: String,
        set_number: u32,
        input: SetInput,
    },
    SkipSet,
    SkipExercise,
    AddCardio(CompletedCardio),
    SkipRest,
    AddRestTime(i64),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GuidedSession {
    state: SessionState,
    options: SessionOptions,
    workout: Option<Workout>,
    cursor: Cursor,
    started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    completed_sets: Vec<CompletedSet>,
    cardio: Vec<CompletedCardio>,
    personal_records: Vec<PersonalRecord>,
    rest_timer: RestTimer,
}

impl Default for GuidedSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl GuidedSession {
    /// A fresh, not-started session
    pub fn new(options: SessionOptions) -> Self {
        Self {
            state: SessionState::NotStarted,
            options,
            workout: None,
            cursor: Cursor::default(),
            started_at: None,
            completed_at: None,
            completed_sets: Vec::new(),
            cardio: Vec::new(),
            personal_records: Vec::new(),
            rest_timer: RestTimer::new(),
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Begin the session on `workout`.
    ///
    /// Calling it again with the same workout while in progress is a no-op.
    /// A workout with no sets at all completes immediately.
    pub fn start(&mut self, workout: Workout, now: DateTime<Utc>) -> Result<(), SessionRejection> {
        match self.state {
            SessionState::Completed => return Err(SessionRejection::AlreadyCompleted),
            SessionState::InProgress => {
                let same = self.workout.as_ref().is_some_and(|w| w.id == workout.id);
                return if same {
                    tracing::debug!("Session for {} already in progress", workout.id);
                    Ok(())
                } else {
                    Err(SessionRejection::AlreadyInProgress)
                };
            }
            SessionState::NotStarted => {}
        }

        tracing::info!(
            "Starting session for {} ({} sets across {} exercises)",
            workout.id,
            workout.total_sets(),
            workout.exercises.len()
        );

        self.workout = Some(workout);
        self.started_at = Some(now);
        self.cursor = Cursor::default();
        self.state = SessionState::InProgress;

        match self.first_position() {
            Some(cursor) => {
                self.cursor = cursor;
                self.set_workout_status(WorkoutStatus::InProgress);
            }
            None => self.complete(now),
        }
        Ok(())
    }

    /// Record the current set as done and move on.
    ///
    /// Starts the rest countdown unless this was the final set overall.
    pub fn complete_set(
        &mut self,
        input: SetInput,
        now: DateTime<Utc>,
        detector: &dyn RecordDetector,
    ) -> Result<Transition, SessionRejection> {
        self.require_in_progress()?;
        let cursor = self.cursor;
        let next = self.next_position(cursor);

        let (completed, rest) = {
            let exercise = self.exercise_mut(cursor.exercise)?;
            let rest = exercise.rest_seconds;
            let exercise_id = exercise.id.clone();
            let exercise_ref = exercise.exercise_ref.clone();
            let set = set_mut(exercise, cursor.set)?;
            set.status = SetStatus::Done;
            set.actual_reps = Some(input.reps);
            set.actual_weight = Some(input.weight);
            (
                CompletedSet {
                    exercise_id,
                    exercise_ref,
                    set_number: set.set_number,
                    reps: input.reps,
                    weight: input.weight,
                    completed_at: now,
                },
                rest,
            )
        };

        let earlier: Vec<&CompletedSet> = self
            .completed_sets
            .iter()
            .filter(|s| s.exercise_ref == completed.exercise_ref)
            .collect();
        let record = detector.detect(&completed, &earlier);
        if let Some(ref pr) = record {
            self.personal_records.push(pr.clone());
        }

        tracing::debug!(
            "Completed set {} of {}: {} x {}",
            completed.set_number,
            completed.exercise_ref,
            completed.reps,
            completed.weight
        );
        self.completed_sets.push(completed);

        let mut transition = Transition {
            personal_record: record,
            ..Transition::default()
        };
        match next {
            Some(next) => {
                self.cursor = next;
                let seconds = if rest > 0 {
                    rest
                } else {
                    self.options.default_rest_seconds
                };
                self.rest_timer.start(seconds, now);
                transition.rest_seconds = Some(seconds);
            }
            None => {
                self.complete(now);
                transition.completed = true;
            }
        }
        Ok(transition)
    }

    /// Change the recorded values of an already-done set.
    ///
    /// Leaves the cursor and the completed-set count alone. Records for the
    /// edited exercise are detected again from the corrected sets.
    pub fn edit_completed_set(
        &mut self,
        exercise_id: &str,
        set_number: u32,
        input: SetInput,
        detector: &dyn RecordDetector,
    ) -> Result<(), SessionRejection> {
        self.require_in_progress()?;
        let not_found = || SessionRejection::SetNotFound {
            exercise_id: exercise_id.to_string(),
            set_number,
        };

        let workout = self.workout.as_mut().ok_or(SessionRejection::NotStarted)?;
        let exercise = workout
            .exercises
            .iter_mut()
            .find(|e| e.id == exercise_id)
            .ok_or_else(not_found)?;
        let exercise_ref = exercise.exercise_ref.clone();
        let set = exercise
            .sets
            .iter_mut()
            .find(|s| s.set_number == set_number)
            .ok_or_else(not_found)?;

        if set.status != SetStatus::Done {
            return Err(SessionRejection::SetNotDone {
                exercise_id: exercise_id.to_string(),
                set_number,
            });
        }
        set.actual_reps = Some(input.reps);
        set.actual_weight = Some(input.weight);

        if let Some(record) = self
            .completed_sets
            .iter_mut()
            .find(|s| s.exercise_id == exercise_id && s.set_number == set_number)
        {
            record.reps = input.reps;
            record.weight = input.weight;
        }
        self.redetect_records(&exercise_ref, detector);

        tracing::debug!("Edited set {} of {}", set_number, exercise_id);
        Ok(())
    }

    /// Mark the current set skipped and move on. Never starts rest.
    pub fn skip_set(&mut self, now: DateTime<Utc>) -> Result<Transition, SessionRejection> {
        self.require_in_progress()?;
        let cursor = self.cursor;
        let next = self.next_position(cursor);

        let exercise = self.exercise_mut(cursor.exercise)?;
        set_mut(exercise, cursor.set)?.status = SetStatus::Skipped;
        tracing::debug!("Skipped set {} of exercise {}", cursor.set + 1, cursor.exercise);

        Ok(self.advance_to(next, now))
    }

    /// Skip every remaining set of the current exercise
    pub fn skip_exercise(&mut self, now: DateTime<Utc>) -> Result<Transition, SessionRejection> {
        self.require_in_progress()?;
        let cursor = self.cursor;
        let next = self.next_exercise_position(cursor.exercise);

        let exercise = self.exercise_mut(cursor.exercise)?;
        for set in exercise.sets.iter_mut().skip(cursor.set) {
            if set.status == SetStatus::Pending {
                set.status = SetStatus::Skipped;
            }
        }
        tracing::debug!("Skipped rest of exercise {}", exercise.id);

        Ok(self.advance_to(next, now))
    }

    /// Log a cardio block; allowed until the session completes
    pub fn add_cardio(&mut self, entry: CompletedCardio) -> Result<(), SessionRejection> {
        if self.state == SessionState::Completed {
            return Err(SessionRejection::AlreadyCompleted);
        }
        tracing::debug!("Added {} min of {}", entry.duration_min, entry.kind);
        self.cardio.push(entry);
        Ok(())
    }

    /// Stop the rest countdown early
    pub fn skip_rest(&mut self) {
        self.rest_timer.skip();
    }

    /// Lengthen (or with a negative value, shorten) the running rest.
    ///
    /// Does nothing while no rest is running.
    pub fn add_rest_time(&mut self, seconds: i64, now: DateTime<Utc>) {
        self.rest_timer.add_time(seconds, now);
    }

    /// Build the end-of-session summary.
    ///
    /// Valid once completed, or while in progress when `force` is set (the
    /// session is then closed early). Session data is kept; discarding it is
    /// up to the caller.
    pub fn finish_workout(
        &mut self,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<WorkoutSummary, SessionRejection> {
        match self.state {
            SessionState::NotStarted => return Err(SessionRejection::NotStarted),
            SessionState::InProgress if !force => return Err(SessionRejection::NotFinished),
            SessionState::InProgress => {
                tracing::info!("Finishing session early");
                self.complete(now);
            }
            SessionState::Completed => {}
        }

        let workout = self.workout.as_ref().ok_or(SessionRejection::NotStarted)?;
        let ended_at = self.completed_at.unwrap_or(now);
        let elapsed_seconds = self
            .started_at
            .map(|start| (ended_at - start).num_seconds().max(0))
            .unwrap_or(0);

        let summary = WorkoutSummary {
            workout_id: workout.id.clone(),
            name: workout.name.clone(),
            elapsed_seconds,
            duration_min: ((elapsed_seconds + 30) / 60) as u32,
            exercises_completed: workout
                .exercises
                .iter()
                .filter(|e| e.done_sets() > 0 && e.sets.iter().all(ExerciseSet::is_resolved))
                .count(),
            exercises_total: workout.exercises.len(),
            sets_completed: workout.done_sets(),
            sets_total: workout.total_sets(),
            total_volume: total_volume(workout),
            estimated_calories: self.estimate_calories(elapsed_seconds),
            personal_records: self.personal_records.clone(),
            cardio: self.cardio.clone(),
        };

        tracing::info!(
            "Session {} finished: {}/{} sets, volume {:.1}",
            summary.workout_id,
            summary.sets_completed,
            summary.sets_total,
            summary.total_volume
        );
        Ok(summary)
    }

    /// Payload for the persistence collaborator
    pub fn payload(
        &self,
        summary: &WorkoutSummary,
        feedback: SessionFeedback,
    ) -> Result<SessionPayload, SessionRejection> {
        let workout = self.workout.as_ref().ok_or(SessionRejection::NotStarted)?;
        let clamp = |v: Option<u8>| v.map(|v| v.clamp(1, 10));
        Ok(SessionPayload {
            workout_id: workout.id.clone(),
            template_id: workout.template_id.clone(),
            name: workout.name.clone(),
            kind: workout.kind.clone(),
            date: workout.date,
            duration_min: summary.duration_min,
            completed_sets: self.completed_sets.clone(),
            cardio_entries: self.cardio.clone(),
            difficulty: clamp(feedback.difficulty),
            energy: clamp(feedback.energy),
            notes: feedback.notes.filter(|n| !n.trim().is_empty()),
        })
    }

    /// Reducer entry point: apply one action
    pub fn apply(
        &mut self,
        action: SessionAction,
        now: DateTime<Utc>,
        detector: &dyn RecordDetector,
    ) -> Result<Transition, SessionRejection> {
        match action {
            SessionAction::Start(workout) => {
                self.start(workout, now)?;
                Ok(Transition {
                    completed: self.state == SessionState::Completed,
                    ..Transition::default()
                })
            }
            SessionAction::CompleteSet(input) => self.complete_set(input, now, detector),
            SessionAction::EditSet {
                exercise_id,
                set_number,
                input,
            } => self
                .edit_completed_set(&exercise_id, set_number, input, detector)
                .map(|_| Transition::default()),
            SessionAction::SkipSet => self.skip_set(now),
            SessionAction::SkipExercise => self.skip_exercise(now),
            SessionAction::AddCardio(entry) => {
                self.add_cardio(entry).map(|_| Transition::default())
            }
            SessionAction::SkipRest => {
                self.skip_rest();
                Ok(Transition::default())
            }
            SessionAction::AddRestTime(seconds) => {
                self.add_rest_time(seconds, now);
                Ok(Transition::default())
            }
        }
    }

    // ------------------------------------------------------------------
    // Derived values
    // ------------------------------------------------------------------

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Defaults the session was created with
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The workout being performed, with per-set status and actuals
    pub fn workout(&self) -> Option<&Workout> {
        self.workout.as_ref()
    }

    /// Position of the next set to perform
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// When `start` was accepted
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// When the session reached `Completed`; the summary's elapsed time ends here
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Sets performed so far, in completion order
    pub fn completed_sets(&self) -> &[CompletedSet] {
        &self.completed_sets
    }

    /// Cardio blocks logged so far
    pub fn cardio(&self) -> &[CompletedCardio] {
        &self.cardio
    }

    /// Records detected during this session
    pub fn personal_records(&self) -> &[PersonalRecord] {
        &self.personal_records
    }

    /// The rest countdown between sets
    pub fn rest_timer(&self) -> &RestTimer {
        &self.rest_timer
    }

    /// Number of sets performed; never exceeds the planned set count
    pub fn completed_sets_count(&self) -> usize {
        self.completed_sets.len()
    }

    /// Exercise under the cursor; `None` unless in progress
    pub fn current_exercise(&self) -> Option<&WorkoutExercise> {
        if self.state != SessionState::InProgress {
            return None;
        }
        self.workout.as_ref()?.exercises.get(self.cursor.exercise)
    }

    /// Set under the cursor; `None` unless in progress
    pub fn current_set(&self) -> Option<&ExerciseSet> {
        self.current_exercise()?.sets.get(self.cursor.set)
    }

    /// Percentage of planned sets resolved (done or skipped)
    pub fn progress(&self) -> f64 {
        match &self.workout {
            Some(w) if w.total_sets() > 0 => {
                w.resolved_sets() as f64 / w.total_sets() as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    /// Whether the cursor is on the final set of its exercise
    pub fn is_last_set(&self) -> bool {
        self.current_exercise()
            .is_some_and(|e| self.cursor.set + 1 >= e.sets.len())
    }

    /// Whether no exercise with sets follows the current one
    pub fn is_last_exercise(&self) -> bool {
        self.current_exercise().is_some()
            && self.next_exercise_position(self.cursor.exercise).is_none()
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_in_progress(&self) -> Result<(), SessionRejection> {
        match self.state {
            SessionState::NotStarted => Err(SessionRejection::NotStarted),
            SessionState::Completed => Err(SessionRejection::AlreadyCompleted),
            SessionState::InProgress => Ok(()),
        }
    }

    fn exercise_mut(&mut self, index: usize) -> Result<&mut WorkoutExercise, SessionRejection> {
        self.workout
            .as_mut()
            .and_then(|w| w.exercises.get_mut(index))
            .ok_or(SessionRejection::NotStarted)
    }

    fn exercises(&self) -> &[WorkoutExercise] {
        self.workout
            .as_ref()
            .map(|w| w.exercises.as_slice())
            .unwrap_or(&[])
    }

    fn first_position(&self) -> Option<Cursor> {
        self.exercises()
            .iter()
            .position(|e| !e.sets.is_empty())
            .map(|exercise| Cursor { exercise, set: 0 })
    }

    fn next_exercise_position(&self, after: usize) -> Option<Cursor> {
        self.exercises()
            .iter()
            .enumerate()
            .skip(after + 1)
            .find(|(_, e)| !e.sets.is_empty())
            .map(|(exercise, _)| Cursor { exercise, set: 0 })
    }

    fn next_position(&self, from: Cursor) -> Option<Cursor> {
        let sets = self.exercises().get(from.exercise).map_or(0, |e| e.sets.len());
        if from.set + 1 < sets {
            Some(Cursor {
                exercise: from.exercise,
                set: from.set + 1,
            })
        } else {
            self.next_exercise_position(from.exercise)
        }
    }

    fn advance_to(&mut self, next: Option<Cursor>, now: DateTime<Utc>) -> Transition {
        match next {
            Some(cursor) => {
                self.cursor = cursor;
                Transition::default()
            }
            None => {
                self.complete(now);
                Transition {
                    completed: true,
                    ..Transition::default()
                }
            }
        }
    }

    fn complete(&mut self, now: DateTime<Utc>) {
        self.state = SessionState::Completed;
        self.completed_at = Some(now);
        self.rest_timer.skip();
        self.set_workout_status(WorkoutStatus::Completed);
        tracing::info!("Session completed");
    }

    /// Replace the records for `exercise_ref` by replaying its sets in order
    fn redetect_records(&mut self, exercise_ref: &str, detector: &dyn RecordDetector) {
        self.personal_records.retain(|r| r.exercise_ref != exercise_ref);

        let sets: Vec<&CompletedSet> = self
            .completed_sets
            .iter()
            .filter(|s| s.exercise_ref == exercise_ref)
            .collect();
        let records: Vec<PersonalRecord> = sets
            .iter()
            .enumerate()
            .filter_map(|(i, set)| detector.detect(set, &sets[..i]))
            .collect();
        self.personal_records.extend(records);
    }

    fn set_workout_status(&mut self, status: WorkoutStatus) {
        if let Some(workout) = self.workout.as_mut() {
            workout.status = status;
        }
    }

    fn estimate_calories(&self, elapsed_seconds: i64) -> u32 {
        let kg = self.options.body_weight_kg;
        let lifting = LIFTING_MET * kg * elapsed_seconds as f64 / 3600.0;
        let cardio: f64 = self
            .cardio
            .iter()
            .map(|c| match c.calories {
                Some(kcal) => kcal as f64,
                None => CARDIO_MET * kg * c.duration_min as f64 / 60.0,
            })
            .sum();
        (lifting + cardio).round().max(0.0) as u32
    }
}

fn set_mut(exercise: &mut WorkoutExercise, index: usize) -> Result<&mut ExerciseSet, SessionRejection> {
    let exercise_id = exercise.id.clone();
    exercise
        .sets
        .get_mut(index)
        .ok_or(SessionRejection::SetNotFound {
            exercise_id,
            set_number: index as u32 + 1,
        })
}

/// Σ weight × reps over done sets
pub fn total_volume(workout: &Workout) -> f64 {
    workout
        .exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .filter(|s| s.status == SetStatus::Done)
        .map(|s| s.actual_weight.unwrap_or(0.0) * s.actual_reps.unwrap_or(0) as f64)
        .sum()
}
