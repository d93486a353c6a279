//! Panel-level value types shared by the planner, state machine and readouts.

use lathe_traits::{Axis, Sense};

/// Joystick deflection. At most one direction is active; `None` is centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoystickDirection {
    #[default]
    None,
    XPlus,
    XMinus,
    ZPlus,
    ZMinus,
}

impl JoystickDirection {
    pub const DEFLECTED: [Self; 4] = [Self::XPlus, Self::XMinus, Self::ZPlus, Self::ZMinus];

    pub fn axis(self) -> Option<Axis> {
        match self {
            Self::None => None,
            Self::XPlus | Self::XMinus => Some(Axis::X),
            Self::ZPlus | Self::ZMinus => Some(Axis::Z),
        }
    }

    pub fn sense(self) -> Option<Sense> {
        match self {
            Self::None => None,
            Self::XPlus | Self::ZPlus => Some(Sense::Plus),
            Self::XMinus | Self::ZMinus => Some(Sense::Minus),
        }
    }

    pub fn is_centered(self) -> bool {
        self == Self::None
    }

    /// Pin name of the joystick input for this direction.
    pub fn pin_name(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::XPlus => Some("joystick.x-plus"),
            Self::XMinus => Some("joystick.x-minus"),
            Self::ZPlus => Some("joystick.z-plus"),
            Self::ZMinus => Some("joystick.z-minus"),
        }
    }
}

/// Physical spindle lever position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpindleLever {
    Rev,
    Fwd,
    #[default]
    None,
}

impl SpindleLever {
    pub fn is_engaged(self) -> bool {
        self != Self::None
    }
}

/// Continuous motion currently commanded by the joystick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoystickFunction {
    #[default]
    None,
    Feeding,
    Jogging,
}

/// Axis targeted by the last jog command, kept so the matching stop can be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoggedAxis {
    #[default]
    None,
    X,
    Z,
}

impl JoggedAxis {
    pub fn axis(self) -> Option<Axis> {
        match self {
            Self::None => None,
            Self::X => Some(Axis::X),
            Self::Z => Some(Axis::Z),
        }
    }
}

impl From<Axis> for JoggedAxis {
    fn from(a: Axis) -> Self {
        match a {
            Axis::X => Self::X,
            Axis::Z => Self::Z,
        }
    }
}

/// Spindle speed control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpindleMode {
    /// Constant RPM (G97)
    #[default]
    Rpm,
    /// Constant surface speed (G96)
    Css,
}

/// Point in diameter-mode coordinates (X doubled).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartesianPoint {
    pub x: f64,
    pub z: f64,
}

impl CartesianPoint {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

/// Absolute tool position in machine coordinates (X as radius).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    pub fn on(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Z => self.z,
        }
    }
}
