//! Error types for the coach_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for coach_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A read collaborator (program, templates, logged workouts) failed
    #[error("Source error: {0}")]
    Source(String),

    /// Local session store error
    #[error("Store error: {0}")]
    Store(String),

    /// The persistence collaborator rejected a finished session
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Benign rejection of a session operation.
///
/// Returned when an operation is invoked in a state that does not accept it.
/// The session is left untouched; callers usually just report the message.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionRejection {
    #[error("session has not been started")]
    NotStarted,

    #[error("a different workout is already in progress")]
    AlreadyInProgress,

    #[error("session is already completed")]
    AlreadyCompleted,

    #[error("session still has unresolved sets; finish early to end it now")]
    NotFinished,

    #[error("no set {set_number} for exercise {exercise_id}")]
    SetNotFound { exercise_id: String, set_number: u32 },

    #[error("set {set_number} of exercise {exercise_id} has not been completed")]
    SetNotDone { exercise_id: String, set_number: u32 },
}
