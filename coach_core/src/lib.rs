#![forbid(unsafe_code)]

//! Core domain model and business logic for the coaching system.
//!
//! This crate provides:
//! - Domain types (templates, programs, logged and materialized workouts)
//! - Data source adapter and day distribution
//! - Weekly schedule reconciliation
//! - Synthetic workout identity
//! - Guided session engine with rest timer and record detection
//! - Persistence (session store, session journal)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod distribution;
pub mod source;
pub mod schedule;
pub mod codec;
pub mod rest_timer;
pub mod records;
pub mod session;
pub mod store;
pub mod wal;
pub mod files;

// Re-export commonly used types
pub use error::{Error, Result, SessionRejection};
pub use types::*;
pub use config::Config;
pub use distribution::distribute;
pub use source::{load_logged, load_templates, normalize, ProgramSource, SessionSink, TemplateSource, WorkoutLog};
pub use schedule::{annotate_activities, build_week};
pub use rest_timer::RestTimer;
pub use records::{BestSetDetector, NoRecords, RecordDetector};
pub use session::{GuidedSession, SessionAction, SessionOptions, SessionState, Transition};
pub use store::SessionStore;
pub use wal::{read_saved_sessions, JsonlSink, SavedSession};
pub use files::{DataPaths, FileSources};
