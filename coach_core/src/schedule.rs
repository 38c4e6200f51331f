//! Weekly schedule reconciliation.
//!
//! Blends normalized templates with logged history into seven calendar
//! cells (Monday first) and derives each day's status:
//!
//! | logged    | template | day    | status    |
//! |-----------|----------|--------|-----------|
//! | completed | any      | any    | completed |
//! | other     | yes      | past   | missed    |
//! | other     | no       | past   | rest      |
//! | other     | yes      | today  | pending   |
//! | other     | no       | today  | rest      |
//! | other     | yes      | future | future    |
//! | other     | no       | future | rest      |
//!
//! Pure function of its inputs; nothing here is persisted.

use crate::{
    codec, weekday_of, DateRange, DayStatus, DayWorkout, LoggedWorkout, RecurringActivity,
    Template, Week, WorkoutStatus,
};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Build the calendar for the week containing `reference`, judging past and
/// future relative to `today`.
pub fn build_week(
    reference: NaiveDate,
    today: NaiveDate,
    templates: &[Template],
    logged: &[LoggedWorkout],
) -> Week {
    let range = DateRange::week_of(reference);
    let week: Week = std::array::from_fn(|i| {
        let date = range.start + chrono::Duration::days(i as i64);
        build_day(date, today, templates, logged)
    });

    tracing::debug!(
        "Built week {} .. {} from {} templates and {} logged workouts",
        range.start,
        range.end,
        templates.len(),
        logged.len()
    );
    week
}

/// Logged record for `date`; a completed record beats any other on the same day
fn logged_for(date: NaiveDate, logged: &[LoggedWorkout]) -> Option<&LoggedWorkout> {
    let mut same_day = logged.iter().filter(|w| w.date == date);
    let first = same_day.next()?;
    if first.status == WorkoutStatus::Completed {
        return Some(first);
    }
    Some(
        same_day
            .find(|w| w.status == WorkoutStatus::Completed)
            .unwrap_or(first),
    )
}

/// Template for a weekday; the last one encountered wins
fn template_for(weekday: u8, templates: &[Template]) -> Option<&Template> {
    templates.iter().rev().find(|t| t.weekday == weekday)
}

/// Status decision for a single day
pub fn day_status(
    logged: Option<&LoggedWorkout>,
    has_template: bool,
    date: NaiveDate,
    today: NaiveDate,
) -> DayStatus {
    if logged.is_some_and(|w| w.status == WorkoutStatus::Completed) {
        return DayStatus::Completed;
    }
    if !has_template {
        return DayStatus::Rest;
    }
    match date.cmp(&today) {
        Ordering::Less => DayStatus::Missed,
        Ordering::Equal => DayStatus::Pending,
        Ordering::Greater => DayStatus::Future,
    }
}

fn build_day(
    date: NaiveDate,
    today: NaiveDate,
    templates: &[Template],
    logged: &[LoggedWorkout],
) -> DayWorkout {
    let weekday = weekday_of(date);
    let record = logged_for(date, logged);
    let template = template_for(weekday, templates);
    let status = day_status(record, template.is_some(), date, today);

    let workout = match (record, template) {
        (Some(record), _) => {
            // Prefer the template the record was logged against
            let source = record
                .template_id
                .as_deref()
                .and_then(|tid| templates.iter().rev().find(|t| t.id == tid))
                .or(template);
            Some(codec::promote(record, source))
        }
        (None, Some(template)) => Some(codec::materialize(template, date)),
        (None, None) => None,
    };

    let kind = template.map(|t| t.workout_kind.clone()).or_else(|| {
        record.and_then(|r| r.kind.clone())
    });
    let icon = kind.as_deref().map(icon_for_kind).map(str::to_string);

    DayWorkout {
        date,
        weekday,
        status,
        workout,
        kind,
        icon,
    }
}

/// Display icon for a workout kind
pub fn icon_for_kind(kind: &str) -> &'static str {
    match kind.to_lowercase().as_str() {
        "strength" | "hypertrophy" | "power" => "dumbbell",
        "cardio" | "run" | "running" | "cycling" | "conditioning" => "heart",
        "mobility" | "stretching" | "yoga" => "stretch",
        "sport" | "match" | "game" => "trophy",
        _ => "calendar",
    }
}

/// Tag days that have a known recurring activity but no kind of their own.
///
/// Cosmetic only: status and workout are left untouched.
pub fn annotate_activities(week: &mut Week, activities: &[RecurringActivity]) {
    for day in week.iter_mut() {
        if day.kind.is_some() {
            continue;
        }
        if let Some(activity) = activities.iter().find(|a| a.weekday == day.weekday) {
            day.kind = Some(activity.kind.clone());
            day.icon = Some(activity.icon.clone());
        }
    }
}
