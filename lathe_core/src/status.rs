//! Readout snapshot for the UI layer.

use crate::fsm::ManualTurningState;
use crate::limits::SoftLimits;
use crate::messages::UserMessage;
use crate::types::{JoggedAxis, JoystickFunction, Position, SpindleMode};

#[derive(Debug, Clone, PartialEq)]
pub struct PanelStatus {
    pub state: ManualTurningState,
    pub joystick_function: JoystickFunction,
    pub jogged_axis: JoggedAxis,
    pub spindle_started: bool,
    pub power_feeding: bool,
    pub spindle_mode: SpindleMode,
    /// Absolute measured spindle speed.
    pub actual_rpm: u32,
    /// Feed per revolution times override while power feeding, else 0.
    pub actual_feed: f64,
    pub taper_enabled: bool,
    pub position: Option<Position>,
    pub limits: SoftLimits,
    /// True once the runtime pins carry `limits`.
    pub limits_applied: bool,
    /// Oldest first.
    pub messages: Vec<UserMessage>,
    pub last_error: Option<String>,
}
