//! Append-only journal of finished sessions.
//!
//! Saved sessions are appended to a JSONL (JSON Lines) file with file
//! locking. The journal doubles as the local logged-workout history.

use crate::source::SessionSink;
use crate::{
    LoggedExercise, LoggedSet, LoggedWorkout, Result, SessionPayload, SetStatus, WorkoutStatus,
};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One journal line
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SavedSession {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub payload: SessionPayload,
}

impl SavedSession {
    /// History view of this session.
    ///
    /// Completed when at least one set was done or cardio was logged,
    /// cancelled otherwise.
    pub fn to_logged(&self) -> LoggedWorkout {
        let payload = &self.payload;
        let mut exercises: Vec<LoggedExercise> = Vec::new();
        for set in &payload.completed_sets {
            let logged = LoggedSet {
                set_number: set.set_number,
                reps: set.reps,
                weight: set.weight,
                status: SetStatus::Done,
            };
            match exercises.iter_mut().find(|e| e.id == set.exercise_id) {
                Some(exercise) => exercise.sets.push(logged),
                None => exercises.push(LoggedExercise {
                    id: set.exercise_id.clone(),
                    exercise_ref: set.exercise_ref.clone(),
                    sets: vec![logged],
                }),
            }
        }

        let did_work = !payload.completed_sets.is_empty() || !payload.cardio_entries.is_empty();
        LoggedWorkout {
            id: self.id.to_string(),
            template_id: payload.template_id.clone(),
            name: payload.name.clone(),
            kind: Some(payload.kind.clone()),
            date: payload.date,
            status: if did_work {
                WorkoutStatus::Completed
            } else {
                WorkoutStatus::Cancelled
            },
            exercises,
        }
    }
}

/// JSONL-based session sink with file locking
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionSink for JsonlSink {
    fn save_session(&mut self, payload: &SessionPayload) -> Result<String> {
        self.ensure_parent_dir()?;

        let record = SavedSession {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            payload: payload.clone(),
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(&record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::info!(
            "Saved session {} for workout {}",
            record.id,
            record.payload.workout_id
        );
        Ok(record.id.to_string())
    }
}

/// Read all saved sessions; unparseable lines are skipped with a warning
pub fn read_saved_sessions(path: &Path) -> Result<Vec<SavedSession>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut sessions = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<SavedSession>(&line) {
            Ok(session) => sessions.push(session),
            Err(e) => {
                tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} sessions from journal", sessions.len());
    Ok(sessions)
}
