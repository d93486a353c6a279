//! Panel inputs as delivered by the pin listeners and the position feed.

use crate::types::{JoystickDirection, Position};

/// One pin edge or readout update, dispatched to the core in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelInput {
    /// `spindle.switch-fwd-in`
    SpindleFwd(bool),
    /// `spindle.switch-rev-in`
    SpindleRev(bool),
    /// `spindle.cover-opened`
    SpindleCover(bool),
    /// `joystick.{x,z}-{plus,minus}`
    Joystick {
        direction: JoystickDirection,
        active: bool,
    },
    /// `joystick.rapid`
    Rapid(bool),
    /// Absolute tool position.
    Position(Position),
    /// `spindle.actual-rpm`
    SpindleRpm(f64),
    /// Feed override factor (1.0 = 100%).
    FeedOverride(f64),
    CycleStop(bool),
}
