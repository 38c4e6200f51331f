//! Personal-record detection hook.
//!
//! The session engine asks a [`RecordDetector`] after every completed set.
//! Detection never blocks completion: a detector can only add a record to the
//! summary.

use crate::{CompletedSet, LoggedWorkout, PersonalRecord, SetStatus};
use std::collections::HashMap;

pub trait RecordDetector {
    /// Check `candidate` against history and the earlier sets of the same
    /// exercise in this session (`session_sets`, oldest first).
    fn detect(&self, candidate: &CompletedSet, session_sets: &[&CompletedSet])
        -> Option<PersonalRecord>;
}

/// Detector that never reports a record
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRecords;

impl RecordDetector for NoRecords {
    fn detect(&self, _: &CompletedSet, _: &[&CompletedSet]) -> Option<PersonalRecord> {
        None
    }
}

/// A set is a record when `reps × weight` strictly beats the best prior
/// same-exercise score. Ties and exercises with no prior sets don't count.
#[derive(Clone, Debug, Default)]
pub struct BestSetDetector {
    best: HashMap<String, f64>,
}

impl BestSetDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed best scores from done sets in logged history
    pub fn from_history(history: &[LoggedWorkout]) -> Self {
        let mut detector = Self::new();
        for (exercise_ref, set) in history
            .iter()
            .flat_map(|w| w.exercises.iter())
            .flat_map(|e| e.sets.iter().map(move |s| (e.exercise_ref.as_str(), s)))
            .filter(|(_, s)| s.status == SetStatus::Done)
        {
            detector.record(exercise_ref, set.weight * set.reps as f64);
        }
        tracing::debug!(
            "Seeded record detector with {} exercises",
            detector.best.len()
        );
        detector
    }

    /// Raise the best score for `exercise_ref` if `score` beats it
    pub fn record(&mut self, exercise_ref: &str, score: f64) {
        let best = self.best.entry(exercise_ref.to_string()).or_insert(score);
        if score > *best {
            *best = score;
        }
    }

    /// Best reps × weight seen so far, if any
    pub fn best_for(&self, exercise_ref: &str) -> Option<f64> {
        self.best.get(exercise_ref).copied()
    }
}

impl RecordDetector for BestSetDetector {
    fn detect(
        &self,
        candidate: &CompletedSet,
        session_sets: &[&CompletedSet],
    ) -> Option<PersonalRecord> {
        let prior = session_sets
            .iter()
            .map(|s| s.volume())
            .chain(self.best_for(&candidate.exercise_ref))
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))?;

        let score = candidate.volume();
        if score > prior {
            tracing::info!(
                "New personal record on {}: {} x {}",
                candidate.exercise_ref,
                candidate.reps,
                candidate.weight
            );
            Some(PersonalRecord {
                exercise_ref: candidate.exercise_ref.clone(),
                weight: candidate.weight,
                reps: candidate.reps,
                date: candidate.completed_at.date_naive(),
            })
        } else {
            None
        }
    }
}
