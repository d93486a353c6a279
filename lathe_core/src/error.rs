use lathe_traits::Axis;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VcpError {
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("runtime rejected command: {0}")]
    Rejected(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Limits(#[from] LimitsError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("invalid state: {0}")]
    State(String),
}

/// Rejected soft-limit compositions.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum LimitsError {
    #[error("{axis} limits inverted: min {min:.3} > max {max:.3}")]
    Inverted { axis: Axis, min: f64, max: f64 },
    #[error("{0} must be finite")]
    NonFinite(&'static str),
}

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum PathError {
    #[error("taper angle {0} deg outside (0, 90]")]
    InvalidAngle(f64),
    #[error("tool position unknown")]
    UnknownPosition,
    #[error("joystick is centered")]
    NoDirection,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing motion runtime")]
    MissingRuntime,
    #[error("missing indicator pins")]
    MissingPins,
    #[error("missing default axis envelope")]
    MissingAxes,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
