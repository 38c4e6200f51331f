//! Durable local store for the live session.
//!
//! The in-progress session is written after every transition so a restart
//! never loses work. Only finishing or discarding clears it; there is no
//! expiry.

use crate::records::RecordDetector;
use crate::session::{GuidedSession, SessionAction, SessionOptions, Transition};
use crate::{Error, Result, SessionRejection};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Session store backed by a single JSON file
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the stored session with a shared lock.
    ///
    /// Returns `None` if nothing is stored. A corrupted file is an error:
    /// silently replacing it would throw away the user's sets.
    pub fn load(&self) -> Result<Option<GuidedSession>> {
        if !self.path.exists() {
            tracing::debug!("No stored session at {:?}", self.path);
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let session = serde_json::from_str::<GuidedSession>(&contents).map_err(|e| {
            tracing::warn!("Stored session at {:?} is unreadable: {}", self.path, e);
            Error::Store(format!("stored session is unreadable: {}", e))
        })?;
        tracing::debug!("Loaded session from {:?}", self.path);
        Ok(Some(session))
    }

    /// Atomically replace the stored session.
    ///
    /// Writes a temp file in the same directory under an exclusive lock,
    /// syncs it and renames it over the old one.
    pub fn save(&self, session: &GuidedSession) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Store("session path missing parent".into()))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(session)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved session to {:?}", self.path);
        Ok(())
    }

    /// Remove the stored session (finish or discard)
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Cleared stored session at {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load (or create) the session, apply one action and write it back.
    ///
    /// A rejected action leaves the stored session unchanged and is returned
    /// in the inner result.
    pub fn transition(
        &self,
        options: SessionOptions,
        action: SessionAction,
        now: DateTime<Utc>,
        detector: &dyn RecordDetector,
    ) -> Result<std::result::Result<Transition, SessionRejection>> {
        let mut session = self
            .load()?
            .unwrap_or_else(|| GuidedSession::new(options));

        match session.apply(action, now, detector) {
            Ok(transition) => {
                self.save(&session)?;
                Ok(Ok(transition))
            }
            Err(rejection) => {
                tracing::info!("Session action rejected: {}", rejection);
                Ok(Err(rejection))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec;
    use crate::records::NoRecords;
    use crate::session::SessionState;
    use crate::{SetInput, Template, TemplateExercise};
    use chrono::NaiveDate;

    fn workout() -> crate::Workout {
        let template = Template {
            id: "t1".into(),
            name: "Upper".into(),
            workout_kind: "strength".into(),
            phase: None,
            weekday: 3,
            estimated_duration_min: 40,
            exercises: vec![TemplateExercise {
                id: "press".into(),
                exercise_ref: "press".into(),
                order: 0,
                set_count: 2,
                reps_spec: "8".into(),
                rest_seconds: 90,
                suggested_load: Some(40.0),
                is_superset: false,
            }],
        };
        codec::materialize(&template, NaiveDate::from_ymd_opt(2024, 1, 17).unwrap())
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));

        let mut session = GuidedSession::default();
        session.start(workout(), Utc::now()).unwrap();
        store.save(&session).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("nothing.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupted_store_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "{ invalid json }").unwrap();

        let store = SessionStore::new(&path);
        assert!(matches!(store.load(), Err(Error::Store(_))));
        // The file is left for the user to inspect or discard
        assert!(path.exists());
    }

    #[test]
    fn test_transition_writes_every_step() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        let now = Utc::now();
        let options = SessionOptions::default();

        store
            .transition(options, SessionAction::Start(workout()), now, &NoRecords)
            .unwrap()
            .unwrap();
        assert!(store.exists());

        let t = store
            .transition(
                options,
                SessionAction::CompleteSet(SetInput {
                    reps: 8,
                    weight: 40.0,
                }),
                now,
                &NoRecords,
            )
            .unwrap()
            .unwrap();
        assert_eq!(t.rest_seconds, Some(90));

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.state(), SessionState::InProgress);
        assert_eq!(loaded.completed_sets_count(), 1);
    }

    #[test]
    fn test_rejected_transition_leaves_store_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));

        let result = store
            .transition(
                SessionOptions::default(),
                SessionAction::SkipSet,
                Utc::now(),
                &NoRecords,
            )
            .unwrap();

        assert_eq!(result, Err(SessionRejection::NotStarted));
        assert!(!store.exists());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        store.save(&GuidedSession::default()).unwrap();

        store.clear().unwrap();
        assert!(!store.exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(temp_dir.path().join("session.json"));
        store.save(&GuidedSession::default()).unwrap();
        store.save(&GuidedSession::default()).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "session.json")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }
}
