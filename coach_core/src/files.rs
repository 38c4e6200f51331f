//! File-backed collaborators for a local data directory.
//!
//! Layout:
//! - `program.json`   optional active program (`TrainingProgram`)
//! - `templates.json` user templates (`[Template]`)
//! - `activities.json` optional recurring activity tags (`[RecurringActivity]`)
//! - `workouts.jsonl` session journal, read back as logged history
//! - `session.json`   the live session

use crate::source::{ProgramSource, TemplateSource, WorkoutLog};
use crate::wal::read_saved_sessions;
use crate::{
    DateRange, Error, LoggedWorkout, RecurringActivity, Result, Template, TrainingProgram,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Paths inside a data directory
#[derive(Clone, Debug)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn program(&self) -> PathBuf {
        self.root.join("program.json")
    }

    pub fn templates(&self) -> PathBuf {
        self.root.join("templates.json")
    }

    pub fn activities(&self) -> PathBuf {
        self.root.join("activities.json")
    }

    /// Append-only journal of saved sessions
    pub fn journal(&self) -> PathBuf {
        self.root.join("workouts.jsonl")
    }

    /// The live session store
    pub fn session(&self) -> PathBuf {
        self.root.join("session.json")
    }
}

/// Reads the three collaborator collections from JSON files.
///
/// Missing files mean "nothing there"; malformed files are errors so the
/// adapter can degrade to the next source.
pub struct FileSources {
    paths: DataPaths,
}

impl FileSources {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    /// Recurring activity tags; a missing or unreadable file means none
    pub fn recurring_activities(&self) -> Vec<RecurringActivity> {
        match read_json::<Vec<RecurringActivity>>(&self.paths.activities()) {
            Ok(activities) => activities.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Ignoring recurring activities: {}", e);
                Vec::new()
            }
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        tracing::debug!("No file at {:?}", path);
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| Error::Source(format!("failed to parse {:?}: {}", path, e)))?;
    Ok(Some(value))
}

impl ProgramSource for FileSources {
    fn active_program(&self, client_id: &str) -> Result<Option<TrainingProgram>> {
        let program: Option<TrainingProgram> = read_json(&self.paths.program())?;
        Ok(program.filter(|p| {
            let assigned = p.client_id == client_id;
            if !assigned {
                tracing::debug!("Program {} belongs to {}, not {}", p.id, p.client_id, client_id);
            }
            assigned
        }))
    }
}

impl TemplateSource for FileSources {
    fn user_templates(&self, _user_id: &str) -> Result<Vec<Template>> {
        let templates: Vec<Template> = read_json(&self.paths.templates())?.unwrap_or_default();
        if let Some(bad) = templates.iter().find(|t| t.weekday > 6) {
            return Err(Error::Source(format!(
                "template {} has invalid weekday {}",
                bad.id, bad.weekday
            )));
        }
        Ok(templates)
    }
}

impl WorkoutLog for FileSources {
    fn logged_workouts(&self, _user_id: &str, range: DateRange) -> Result<Vec<LoggedWorkout>> {
        let logged: Vec<LoggedWorkout> = read_saved_sessions(&self.paths.journal())?
            .iter()
            .map(|s| s.to_logged())
            .filter(|w| range.contains(w.date))
            .collect();
        tracing::debug!(
            "Loaded {} logged workouts for {} .. {}",
            logged.len(),
            range.start,
            range.end
        );
        Ok(logged)
    }
}
