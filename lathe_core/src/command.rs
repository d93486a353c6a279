//! MDI commands issued by the core, rendered to the runtime's text dialect.
//!
//! Every coordinate and feed value is written with three decimals.

use std::fmt;

use lathe_traits::Axis;

use crate::types::SpindleLever;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleDirection {
    Forward,
    Reverse,
}

impl SpindleDirection {
    pub fn from_lever(lever: SpindleLever) -> Option<Self> {
        match lever {
            SpindleLever::Fwd => Some(Self::Forward),
            SpindleLever::Rev => Some(Self::Reverse),
            SpindleLever::None => None,
        }
    }

    pub fn m_code(self) -> &'static str {
        match self {
            Self::Forward => "M3",
            Self::Reverse => "M4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleSpeed {
    ConstantRpm { rpm: u32 },
    ConstantSurface { surface_speed: u32, max_rpm: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpindleCommand {
    pub direction: SpindleDirection,
    pub speed: SpindleSpeed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MdiCommand {
    /// Feed along one axis to an absolute machine coordinate (X as radius).
    StraightMove {
        feed_per_rev: f64,
        axis: Axis,
        target: f64,
    },
    /// Feed to an absolute point in diameter mode.
    TaperMove {
        feed_per_rev: f64,
        x_diameter: f64,
        z: f64,
    },
    SpindleStart(SpindleCommand),
    SpindleStop,
}

impl MdiCommand {
    pub fn is_feed(&self) -> bool {
        matches!(self, Self::StraightMove { .. } | Self::TaperMove { .. })
    }
}

impl fmt::Display for MdiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StraightMove {
                feed_per_rev,
                axis,
                target,
            } => write!(f, "G95 F{feed_per_rev:.3} G53 G1 {axis}{target:.3}"),
            Self::TaperMove {
                feed_per_rev,
                x_diameter,
                z,
            } => write!(
                f,
                "G95 F{feed_per_rev:.3} G40 G7 G53 G1 X{x_diameter:.3} Z{z:.3}"
            ),
            Self::SpindleStart(SpindleCommand { direction, speed }) => {
                let m = direction.m_code();
                match speed {
                    SpindleSpeed::ConstantRpm { rpm } => write!(f, "{m} G97 S{rpm}"),
                    SpindleSpeed::ConstantSurface {
                        surface_speed,
                        max_rpm,
                    } => write!(f, "{m} G96 S{surface_speed} D{max_rpm}"),
                }
            }
            Self::SpindleStop => f.write_str("M5"),
        }
    }
}
