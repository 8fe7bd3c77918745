// src/error.rs

use std::path::PathBuf;

/// Failure modes of a notifier run.
///
/// `SheetFormat` is the one kind the orchestrator routes on: it triggers a
/// direct admin alert instead of the group reminder. Everything else is fatal
/// and only logged.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    /// Required configuration missing.
    #[error("config error: {0}")]
    Config(String),

    /// Roster file never appeared within the wait ceiling.
    #[error("roster file {} not available after waiting", .0.display())]
    FileUnavailable(PathBuf),

    /// Headers of the roster sheet are missing or wrong.
    #[error("roster format error: {0}")]
    SheetFormat(String),

    /// Workbook could not be opened or parsed.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Roster is missing a column the composer needs.
    #[error("roster is missing expected column '{0}'")]
    MissingColumn(String),

    /// signal-cli could not be spawned or exited non-zero.
    #[error("dispatch error: {0}")]
    Dispatch(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, NotifierError>;
