use lathe_traits::TaskMode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("machine not ready (powered={powered}, homed={homed})")]
    NotReady { powered: bool, homed: bool },
    #[error("command refused in {actual:?} mode, needs {expected:?}")]
    WrongMode { expected: TaskMode, actual: TaskMode },
    #[error("command rejected: {0}")]
    Rejected(String),
    #[error("mode switch timeout")]
    ModeTimeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
