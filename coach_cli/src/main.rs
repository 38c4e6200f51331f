use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use coach_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "coach")]
#[command(about = "Coaching schedule and guided workout sessions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the week-at-a-glance calendar (default)
    Week {
        /// Any date inside the week to show
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Date to judge past and future against
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Start a guided session for a workout id from the calendar
    Start { workout_id: String },

    /// Show the live session
    Status,

    /// Complete the current set
    Done {
        #[arg(long)]
        reps: u32,

        #[arg(long, default_value_t = 0.0)]
        weight: f64,
    },

    /// Correct a set that was already completed
    Edit {
        #[arg(long)]
        exercise: String,

        #[arg(long)]
        set: u32,

        #[arg(long)]
        reps: u32,

        #[arg(long, default_value_t = 0.0)]
        weight: f64,
    },

    /// Skip the current set
    SkipSet,

    /// Skip the rest of the current exercise
    SkipExercise,

    /// Log a cardio block
    Cardio {
        #[arg(long)]
        kind: String,

        #[arg(long)]
        minutes: u32,

        #[arg(long)]
        distance: Option<f64>,

        #[arg(long)]
        calories: Option<u32>,
    },

    /// Control the rest countdown
    Rest {
        /// Stop the countdown
        #[arg(long, conflicts_with = "add")]
        skip: bool,

        /// Add (or with a negative value, remove) seconds
        #[arg(long, allow_hyphen_values = true)]
        add: Option<i64>,
    },

    /// Finish the session, print the summary and save it
    Finish {
        /// End now even if sets remain
        #[arg(long)]
        force: bool,

        /// Perceived difficulty, 1-10
        #[arg(long)]
        difficulty: Option<u8>,

        /// Energy level, 1-10
        #[arg(long)]
        energy: Option<u8>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Throw away the live session without saving
    Discard,
}

/// Everything a command needs to reach the data directory
struct Context {
    config: Config,
    paths: DataPaths,
    sources: FileSources,
}

impl Context {
    fn new(config: Config, data_dir: PathBuf) -> Self {
        let paths = DataPaths::new(data_dir);
        let sources = FileSources::new(paths.clone());
        Self {
            config,
            paths,
            sources,
        }
    }

    fn store(&self) -> SessionStore {
        SessionStore::new(self.paths.session())
    }

    fn templates(&self) -> Vec<Template> {
        load_templates(
            &self.sources,
            &self.sources,
            &self.config.profile.client_id,
            &self.config.profile.user_id,
        )
    }

    /// Every logged workout on record
    fn history(&self) -> Vec<LoggedWorkout> {
        let all_time = DateRange {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        };
        load_logged(&self.sources, &self.config.profile.user_id, all_time)
    }

    /// Apply one action to the stored session and report the outcome
    fn apply(&self, action: SessionAction) -> Result<()> {
        let detector = BestSetDetector::from_history(&self.history());
        let outcome = self.store().transition(
            self.config.session_options(),
            action,
            Utc::now(),
            &detector,
        )?;

        match outcome {
            Ok(transition) => {
                if let Some(record) = &transition.personal_record {
                    println!(
                        "★ New personal record: {} {} x {}",
                        record.exercise_ref, record.reps, record.weight
                    );
                }
                if transition.completed {
                    println!("✓ All sets resolved. Run `coach finish` to save.");
                } else if let Some(seconds) = transition.rest_seconds {
                    println!("Rest {}s", seconds);
                }
                self.print_next()
            }
            Err(rejection) => {
                println!("Nothing to do: {}", rejection);
                Ok(())
            }
        }
    }

    fn print_next(&self) -> Result<()> {
        let Some(session) = self.store().load()? else {
            return Ok(());
        };
        if let (Some(exercise), Some(set)) = (session.current_exercise(), session.current_set()) {
            println!(
                "Next: {} set {}/{} ({} reps{})",
                exercise.exercise_ref,
                set.set_number,
                exercise.sets.len(),
                set.planned_reps,
                set.planned_load
                    .map(|load| format!(" @ {}", load))
                    .unwrap_or_default()
            );
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    coach_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);
    let ctx = Context::new(config, data_dir);

    match cli.command {
        Some(Commands::Week { date, today }) => cmd_week(&ctx, date, today),
        Some(Commands::Start { workout_id }) => cmd_start(&ctx, &workout_id),
        Some(Commands::Status) => cmd_status(&ctx),
        Some(Commands::Done { reps, weight }) => {
            ctx.apply(SessionAction::CompleteSet(SetInput { reps, weight }))
        }
        Some(Commands::Edit {
            exercise,
            set,
            reps,
            weight,
        }) => ctx.apply(SessionAction::EditSet {
            exercise_id: exercise,
            set_number: set,
            input: SetInput { reps, weight },
        }),
        Some(Commands::SkipSet) => ctx.apply(SessionAction::SkipSet),
        Some(Commands::SkipExercise) => ctx.apply(SessionAction::SkipExercise),
        Some(Commands::Cardio {
            kind,
            minutes,
            distance,
            calories,
        }) => ctx.apply(SessionAction::AddCardio(CompletedCardio {
            kind,
            duration_min: minutes,
            distance_km: distance,
            calories,
            recorded_at: Utc::now(),
        })),
        Some(Commands::Rest { skip, add }) => match (skip, add) {
            (_, Some(seconds)) => ctx.apply(SessionAction::AddRestTime(seconds)),
            _ => ctx.apply(SessionAction::SkipRest),
        },
        Some(Commands::Finish {
            force,
            difficulty,
            energy,
            notes,
        }) => cmd_finish(
            &ctx,
            force,
            SessionFeedback {
                difficulty,
                energy,
                notes,
            },
        ),
        Some(Commands::Discard) => cmd_discard(&ctx),
        None => cmd_week(&ctx, None, None),
    }
}

fn cmd_week(ctx: &Context, date: Option<NaiveDate>, today: Option<NaiveDate>) -> Result<()> {
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let reference = date.unwrap_or(today);
    let range = DateRange::week_of(reference);

    let templates = ctx.templates();
    let logged = load_logged(&ctx.sources, &ctx.config.profile.user_id, range);
    let mut week = build_week(reference, today, &templates, &logged);
    annotate_activities(&mut week, &ctx.sources.recurring_activities());

    println!("Week of {} .. {}", range.start, range.end);
    for day in &week {
        let label = match (&day.workout, &day.kind) {
            (Some(workout), _) => format!("{}  [{}]", workout.name, workout.id),
            (None, Some(kind)) => kind.clone(),
            (None, None) => String::new(),
        };
        println!(
            "{} {}  {} {:<9} {}",
            day.date.format("%a"),
            day.date,
            day.icon.as_deref().unwrap_or(" "),
            day.status.as_str(),
            label
        );
    }
    Ok(())
}

fn cmd_start(ctx: &Context, workout_id: &str) -> Result<()> {
    let Some(workout) = codec::resolve(workout_id, &ctx.templates(), &ctx.history()) else {
        return Err(Error::Other(format!("workout not found: {}", workout_id)));
    };

    println!(
        "Starting {} ({} sets across {} exercises)",
        workout.name,
        workout.total_sets(),
        workout.exercises.len()
    );
    ctx.apply(SessionAction::Start(workout))
}

fn cmd_status(ctx: &Context) -> Result<()> {
    let Some(session) = ctx.store().load()? else {
        println!("No session in progress.");
        return Ok(());
    };
    let Some(workout) = session.workout() else {
        println!("No session in progress.");
        return Ok(());
    };

    let now = Utc::now();
    println!("{} [{}]", workout.name, workout.id);
    println!(
        "  {:?}: {}/{} sets done, {:.0}% resolved",
        session.state(),
        session.completed_sets_count(),
        workout.total_sets(),
        session.progress()
    );
    if session.rest_timer().is_running(now) {
        println!(
            "  Resting: {}s of {}s left",
            session.rest_timer().time_remaining(now),
            session.rest_timer().total_time()
        );
    }
    for cardio in session.cardio() {
        println!("  Cardio: {} {} min", cardio.kind, cardio.duration_min);
    }
    ctx.print_next()
}

fn cmd_finish(ctx: &Context, force: bool, feedback: SessionFeedback) -> Result<()> {
    let store = ctx.store();
    let Some(mut session) = store.load()? else {
        println!("Nothing to do: {}", SessionRejection::NotStarted);
        return Ok(());
    };

    let summary = match session.finish_workout(force, Utc::now()) {
        Ok(summary) => summary,
        Err(rejection) => {
            println!("Nothing to do: {}", rejection);
            return Ok(());
        }
    };
    // Keep the closed session around until the journal has it
    store.save(&session)?;

    let payload = session
        .payload(&summary, feedback)
        .map_err(|e| Error::Other(e.to_string()))?;
    let mut sink = JsonlSink::new(ctx.paths.journal());
    let saved_id = sink
        .save_session(&payload)
        .map_err(|e| Error::Persistence(format!("session kept for retry: {}", e)))?;
    store.clear()?;

    display_summary(&summary);
    println!("\n✓ Session saved ({})", saved_id);
    Ok(())
}

fn cmd_discard(ctx: &Context) -> Result<()> {
    let store = ctx.store();
    if store.exists() {
        store.clear()?;
        println!("✓ Session discarded.");
    } else {
        println!("No session in progress.");
    }
    Ok(())
}

fn display_summary(summary: &WorkoutSummary) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", summary.name);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!("  Duration: {} min", summary.duration_min);
    println!(
        "  Exercises: {}/{}",
        summary.exercises_completed, summary.exercises_total
    );
    println!("  Sets: {}/{}", summary.sets_completed, summary.sets_total);
    println!("  Volume: {:.1}", summary.total_volume);
    println!("  Calories: ~{}", summary.estimated_calories);

    for cardio in &summary.cardio {
        println!("  → {} {} min", cardio.kind, cardio.duration_min);
    }
    for record in &summary.personal_records {
        println!(
            "  ★ {} {} x {}",
            record.exercise_ref, record.reps, record.weight
        );
    }
}
