//! Data source adapter.
//!
//! Reads the professional program, the user's own templates and the logged
//! history through collaborator traits, and normalizes prescriptions into a
//! single `Template` list. Fetch failures degrade to the next-best source
//! instead of reaching the calendar.

use crate::{
    distribution, DateRange, LoggedWorkout, Result, SessionPayload, Template, TrainingProgram,
};
use std::thread;

/// Read access to professional programs
pub trait ProgramSource {
    fn active_program(&self, client_id: &str) -> Result<Option<TrainingProgram>>;
}

/// Read access to user-authored templates
pub trait TemplateSource {
    fn user_templates(&self, user_id: &str) -> Result<Vec<Template>>;
}

/// Read access to logged workout history
pub trait WorkoutLog {
    fn logged_workouts(&self, user_id: &str, range: DateRange) -> Result<Vec<LoggedWorkout>>;
}

/// Write access for finished sessions; returns the saved record id
pub trait SessionSink {
    fn save_session(&mut self, payload: &SessionPayload) -> Result<String>;
}

/// Normalize the available prescriptions into templates.
///
/// A program with at least one populated day replaces the user's templates
/// entirely. Empty days are dropped; days without an explicit weekday are
/// spread with [`distribution::distribute`] over the populated-day count, as
/// are days whose weekday is out of range.
pub fn normalize(program: Option<&TrainingProgram>, user_templates: Vec<Template>) -> Vec<Template> {
    let Some(program) = program else {
        return user_templates;
    };

    let days: Vec<_> = program.populated_days().collect();
    if days.is_empty() {
        tracing::debug!(
            "Program {} has no populated days, using user templates",
            program.id
        );
        return user_templates;
    }

    tracing::info!(
        "Using program {} ({} training days) instead of {} user templates",
        program.id,
        days.len(),
        user_templates.len()
    );

    let total = days.len();
    days.into_iter()
        .enumerate()
        .map(|(i, day)| Template {
            id: day.id.clone(),
            name: day.name.clone(),
            workout_kind: day.workout_kind.clone(),
            phase: day.phase.clone(),
            weekday: match day.weekday {
                Some(weekday) if weekday <= 6 => weekday,
                Some(weekday) => {
                    let fallback = distribution::weekday_for(i, total);
                    tracing::warn!(
                        "Program day {} has invalid weekday {}, placing it on {}",
                        day.id,
                        weekday,
                        fallback
                    );
                    fallback
                }
                None => distribution::weekday_for(i, total),
            },
            estimated_duration_min: day.estimated_duration_min,
            exercises: day.exercises.clone(),
        })
        .collect()
}

/// Fetch program and templates in parallel and normalize them.
///
/// A failed program fetch is treated as "no program"; a failed template
/// fetch as "no templates". Never returns an error.
pub fn load_templates<P, T>(programs: &P, templates: &T, client_id: &str, user_id: &str) -> Vec<Template>
where
    P: ProgramSource + Sync + ?Sized,
    T: TemplateSource + Sync + ?Sized,
{
    let (program, user_templates) = thread::scope(|s| {
        let program = s.spawn(|| programs.active_program(client_id));
        let user_templates = s.spawn(|| templates.user_templates(user_id));
        (join_fetch(program), join_fetch(user_templates))
    });

    let program = match program {
        Ok(program) => program,
        Err(e) => {
            tracing::warn!("Failed to fetch program for {}: {}. Falling back to user templates.", client_id, e);
            None
        }
    };

    let user_templates = match user_templates {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("Failed to fetch templates for {}: {}. Ignoring them.", user_id, e);
            Vec::new()
        }
    };

    normalize(program.as_ref(), user_templates)
}

fn join_fetch<R>(handle: thread::ScopedJoinHandle<'_, Result<R>>) -> Result<R> {
    handle
        .join()
        .unwrap_or_else(|_| Err(crate::Error::Source("fetch thread panicked".into())))
}

/// Fetch logged history, degrading to an empty history on failure
pub fn load_logged<L>(log: &L, user_id: &str, range: DateRange) -> Vec<LoggedWorkout>
where
    L: WorkoutLog + ?Sized,
{
    match log.logged_workouts(user_id, range) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(
                "Failed to fetch logged workouts for {} ({} .. {}): {}",
                user_id,
                range.start,
                range.end,
                e
            );
            Vec::new()
        }
    }
}
