use std::io;
use thiserror::Error;

/// Errors that can occur when working with the pt_progress library
///
/// Every message starts with a component tag so a diagnostic printed on the
/// error stream names the subsystem that faulted.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The monitor configuration is invalid (zero refresh rate, zero bar length, ...)
    #[error("[config] {0}")]
    Config(String),
    /// The session is not in a state that allows the operation
    #[error("[init] {0}")]
    NotInitialized(String),
    /// Growing the registry failed
    #[error("[thread] failed to grow the progress registry to {requested} entries")]
    Allocation {
        /// The capacity that could not be reserved
        requested: usize,
    },
    /// The output gate was poisoned by a panicking writer
    #[error("[mutex] output gate is poisoned: {0}")]
    Lock(String),
    /// `start` was called on a session that already left the initialized state
    #[error("[start] {0}")]
    AlreadyStarted(String),
    /// No async runtime is available to host the background loops
    #[error("[start] {0}")]
    Runtime(String),
    /// A background loop could not be joined
    #[error("[thread] failed to join {name}: {reason}")]
    Join {
        /// Which loop failed
        name: &'static str,
        /// Why joining failed
        reason: String,
    },
    /// Writing to the terminal failed
    #[error("[print] {0}")]
    Io(#[from] io::Error),
}

impl ProgressError {
    /// Whether the error is a programmer/configuration mistake rather than a
    /// runtime condition.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ProgressError::Io(_))
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ProgressError::Config(msg.into())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ProgressError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        ProgressError::Lock(err.to_string())
    }
}

/// Crate-wide result alias
pub type Result<T, E = ProgressError> = std::result::Result<T, E>;

/// Fail-fast adapter for hosts that want misconfiguration to end the process.
///
/// Prints the tagged diagnostic on stderr and exits with status 1.
pub trait OrExit<T> {
    /// Unwraps the value or terminates the process with the error message.
    fn or_exit(self) -> T;
}

impl<T> OrExit<T> for Result<T> {
    fn or_exit(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
    }
}
