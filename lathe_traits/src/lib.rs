//! Collaborator seams for the manual turning core.
//!
//! The motion runtime (mode switching, MDI, jogging, status polling) and the
//! HAL-style indicator pins live outside the core; everything the core needs
//! from them goes through the traits in this crate.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Error type crossing the trait boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Physical lathe axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// Axis letter as used in MDI commands.
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Z => 'Z',
        }
    }

    /// Joint index in the runtime's position vector (X=0, Z=2).
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Z => 2,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Direction of travel along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    Plus,
    Minus,
}

impl Sense {
    pub fn signum(self) -> f64 {
        match self {
            Sense::Plus => 1.0,
            Sense::Minus => -1.0,
        }
    }
}

/// Runtime task mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMode {
    Manual,
    Mdi,
    Auto,
}

/// Snapshot of the runtime state relevant to manual operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineStatus {
    pub powered: bool,
    pub all_homed: bool,
    pub mode: TaskMode,
}

impl MachineStatus {
    /// Manual operation needs a powered, homed machine that is not running a program.
    pub fn allows_manual_operation(&self) -> bool {
        self.powered && self.all_homed && self.mode != TaskMode::Auto
    }
}

/// Produced axis-limit pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitPin {
    XMin,
    XMax,
    ZMin,
    ZMax,
}

impl LimitPin {
    pub const ALL: [LimitPin; 4] = [LimitPin::XMin, LimitPin::XMax, LimitPin::ZMin, LimitPin::ZMax];

    pub fn axis(self) -> Axis {
        match self {
            LimitPin::XMin | LimitPin::XMax => Axis::X,
            LimitPin::ZMin | LimitPin::ZMax => Axis::Z,
        }
    }

    /// Pin name as exported by the panel component.
    pub fn pin_name(self) -> &'static str {
        match self {
            LimitPin::XMin => "axis-limits.x-min",
            LimitPin::XMax => "axis-limits.x-max",
            LimitPin::ZMin => "axis-limits.z-min",
            LimitPin::ZMax => "axis-limits.z-max",
        }
    }
}

/// Command and mode channels of the external motion runtime.
///
/// Mode switches and MDI submissions are treated as synchronous; callers
/// follow `set_mode` with `wait_complete` before relying on the new mode.
pub trait MotionRuntime {
    fn status(&mut self) -> Result<MachineStatus, BoxError>;
    fn set_mode(&mut self, mode: TaskMode) -> Result<(), BoxError>;
    fn wait_complete(&mut self) -> Result<(), BoxError>;
    fn mdi(&mut self, command: &str) -> Result<(), BoxError>;
    /// Start a continuous jog; `speed` is in machine units per second.
    fn jog(&mut self, axis: Axis, sense: Sense, speed: f64) -> Result<(), BoxError>;
    fn jog_stop(&mut self, axis: Axis) -> Result<(), BoxError>;
}

/// Indicator and limit pins produced by the panel.
pub trait IndicatorPins {
    fn spindle_started(&self) -> bool;
    fn set_spindle_started(&mut self, on: bool);
    fn power_feeding(&self) -> bool;
    fn set_power_feeding(&mut self, on: bool);
    fn set_axis_limit(&mut self, pin: LimitPin, value: f64);
}

impl<T: MotionRuntime + ?Sized> MotionRuntime for Box<T> {
    fn status(&mut self) -> Result<MachineStatus, BoxError> {
        (**self).status()
    }
    fn set_mode(&mut self, mode: TaskMode) -> Result<(), BoxError> {
        (**self).set_mode(mode)
    }
    fn wait_complete(&mut self) -> Result<(), BoxError> {
        (**self).wait_complete()
    }
    fn mdi(&mut self, command: &str) -> Result<(), BoxError> {
        (**self).mdi(command)
    }
    fn jog(&mut self, axis: Axis, sense: Sense, speed: f64) -> Result<(), BoxError> {
        (**self).jog(axis, sense, speed)
    }
    fn jog_stop(&mut self, axis: Axis) -> Result<(), BoxError> {
        (**self).jog_stop(axis)
    }
}
