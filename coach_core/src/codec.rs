//! Synthetic workout identity and materialization.
//!
//! A synthetic workout is addressed by `synthetic:<YYYY-MM-DD>:<template id>`.
//! The date has a fixed width, so everything after the second separator is
//! the template id verbatim and any template id round-trips unchanged.

use crate::{
    ExerciseSet, LoggedExercise, LoggedWorkout, SetStatus, Template, TemplateExercise, Workout,
    WorkoutExercise, WorkoutStatus,
};
use chrono::NaiveDate;

const PREFIX: &str = "synthetic:";
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_LEN: usize = 10;

/// Decoded address of a synthetic workout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntheticRef {
    pub template_id: String,
    pub date: NaiveDate,
}

/// Encode a (template, date) pair into a stable workout id
pub fn encode(template_id: &str, date: NaiveDate) -> String {
    format!("{}{}:{}", PREFIX, date.format(DATE_FORMAT), template_id)
}

/// Decode a synthetic id. Malformed or foreign ids yield `None`.
pub fn decode(id: &str) -> Option<SyntheticRef> {
    let rest = id.strip_prefix(PREFIX)?;
    let date_part = rest.get(..DATE_LEN)?;
    let template_id = rest.get(DATE_LEN..)?.strip_prefix(':')?;
    if template_id.is_empty() {
        return None;
    }
    let date = NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()?;
    // Reject non-canonical dates like "2024-1-05" padded to width
    if date.format(DATE_FORMAT).to_string() != date_part {
        return None;
    }
    Some(SyntheticRef {
        template_id: template_id.to_string(),
        date,
    })
}

/// Whether `id` addresses a synthetic (not yet logged) workout
pub fn is_synthetic(id: &str) -> bool {
    decode(id).is_some()
}

fn expand_exercise(exercise: &TemplateExercise) -> WorkoutExercise {
    let planned_reps = exercise.planned_reps();
    WorkoutExercise {
        id: exercise.id.clone(),
        exercise_ref: exercise.exercise_ref.clone(),
        order: exercise.order,
        reps_spec: exercise.reps_spec.clone(),
        rest_seconds: exercise.rest_seconds,
        is_superset: exercise.is_superset,
        sets: (1..=exercise.set_count)
            .map(|n| ExerciseSet::pending(n, planned_reps, exercise.suggested_load))
            .collect(),
    }
}

fn sorted_exercises(template: &Template) -> Vec<&TemplateExercise> {
    let mut exercises: Vec<_> = template.exercises.iter().collect();
    exercises.sort_by_key(|e| e.order);
    exercises
}

/// Build the synthetic workout for `template` on `date`
pub fn materialize(template: &Template, date: NaiveDate) -> Workout {
    Workout {
        id: encode(&template.id, date),
        template_id: Some(template.id.clone()),
        name: template.name.clone(),
        kind: template.workout_kind.clone(),
        phase: template.phase.clone(),
        date,
        status: WorkoutStatus::Pending,
        synthetic: true,
        estimated_duration_min: template.estimated_duration_min,
        exercises: sorted_exercises(template)
            .into_iter()
            .map(expand_exercise)
            .collect(),
    }
}

fn logged_exercise(logged: &LoggedExercise, prescribed: Option<&TemplateExercise>) -> WorkoutExercise {
    let mut exercise = match prescribed {
        Some(p) => expand_exercise(p),
        None => WorkoutExercise {
            id: logged.id.clone(),
            exercise_ref: logged.exercise_ref.clone(),
            order: u32::MAX,
            reps_spec: String::new(),
            rest_seconds: 0,
            is_superset: false,
            sets: Vec::new(),
        },
    };

    for set in &logged.sets {
        let actual = ExerciseSet {
            set_number: set.set_number,
            planned_reps: set.reps,
            planned_load: None,
            status: set.status,
            actual_reps: (set.status == SetStatus::Done).then_some(set.reps),
            actual_weight: (set.status == SetStatus::Done).then_some(set.weight),
        };
        match exercise
            .sets
            .iter_mut()
            .find(|s| s.set_number == set.set_number)
        {
            Some(slot) => {
                slot.status = actual.status;
                slot.actual_reps = actual.actual_reps;
                slot.actual_weight = actual.actual_weight;
            }
            None => exercise.sets.push(actual),
        }
    }
    exercise.sets.sort_by_key(|s| s.set_number);
    exercise
}

/// Promote a logged workout to a full aggregate.
///
/// Exercises the template prescribes but the log lacks are filled in as
/// pending, so a partially synced record still shows the full structure.
pub fn promote(logged: &LoggedWorkout, template: Option<&Template>) -> Workout {
    let prescribed = template.map(sorted_exercises).unwrap_or_default();
    let mut exercises = Vec::new();

    for p in &prescribed {
        let matching = logged
            .exercises
            .iter()
            .find(|l| l.id == p.id || l.exercise_ref == p.exercise_ref);
        exercises.push(match matching {
            Some(l) => logged_exercise(l, Some(*p)),
            None => expand_exercise(p),
        });
    }

    // Logged exercises that the template doesn't know about keep their place at the end
    for l in &logged.exercises {
        let known = prescribed
            .iter()
            .any(|p| l.id == p.id || l.exercise_ref == p.exercise_ref);
        if !known {
            exercises.push(logged_exercise(l, None));
        }
    }

    let name = if logged.name.is_empty() {
        template.map(|t| t.name.clone()).unwrap_or_default()
    } else {
        logged.name.clone()
    };
    let kind = logged
        .kind
        .clone()
        .or_else(|| template.map(|t| t.workout_kind.clone()))
        .unwrap_or_default();

    Workout {
        id: logged.id.clone(),
        template_id: logged
            .template_id
            .clone()
            .or_else(|| template.map(|t| t.id.clone())),
        name,
        kind,
        phase: template.and_then(|t| t.phase.clone()),
        date: logged.date,
        status: logged.status,
        synthetic: false,
        estimated_duration_min: template.map(|t| t.estimated_duration_min).unwrap_or(0),
        exercises,
    }
}

/// Find the workout addressed by `id`.
///
/// Synthetic ids are decoded and re-materialized from the template's
/// current content; any other id must match a logged workout. Unknown ids
/// (including synthetic ids for templates that no longer exist) yield `None`.
pub fn resolve(id: &str, templates: &[Template], logged: &[LoggedWorkout]) -> Option<Workout> {
    if let Some(synthetic) = decode(id) {
        let template = templates
            .iter()
            .rev()
            .find(|t| t.id == synthetic.template_id)?;
        return Some(materialize(template, synthetic.date));
    }

    let record = logged.iter().find(|w| w.id == id)?;
    let template = record
        .template_id
        .as_deref()
        .and_then(|tid| templates.iter().rev().find(|t| t.id == tid));
    Some(promote(record, template))
}
