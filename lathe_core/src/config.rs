//! Runtime settings of the turning core.
//!
//! These are separate from the TOML-deserialized config in `lathe_config`;
//! see `conversions` for the mapping.

use std::time::Duration;

use crate::command::{SpindleCommand, SpindleDirection, SpindleSpeed};
use crate::types::SpindleMode;

/// Spindle speed settings, editable by the operator at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpindleCfg {
    pub mode: SpindleMode,
    pub rpm: u32,
    /// Surface speed used in CSS mode.
    pub css: u32,
    /// RPM cap in CSS mode.
    pub max_rpm: u32,
}

impl Default for SpindleCfg {
    fn default() -> Self {
        Self {
            mode: SpindleMode::Rpm,
            rpm: 300,
            css: 200,
            max_rpm: 2000,
        }
    }
}

impl SpindleCfg {
    pub fn command(&self, direction: SpindleDirection) -> SpindleCommand {
        let speed = match self.mode {
            SpindleMode::Rpm => SpindleSpeed::ConstantRpm { rpm: self.rpm },
            SpindleMode::Css => SpindleSpeed::ConstantSurface {
                surface_speed: self.css,
                max_rpm: self.max_rpm,
            },
        };
        SpindleCommand { direction, speed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedCfg {
    pub feed_per_rev: f64,
    pub taper_enabled: bool,
    pub taper_angle_deg: f64,
}

impl Default for FeedCfg {
    fn default() -> Self {
        Self {
            feed_per_rev: 0.1,
            taper_enabled: false,
            taper_angle_deg: 45.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JogCfg {
    /// Machine units per minute.
    pub linear_speed: f64,
}

impl Default for JogCfg {
    fn default() -> Self {
        Self {
            linear_speed: 1200.0,
        }
    }
}

impl JogCfg {
    /// Jog speed in units per second, as the runtime's jog call expects.
    pub fn speed_per_sec(&self) -> f64 {
        self.linear_speed / 60.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingCfg {
    pub pre_feed_delay: Duration,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            pre_feed_delay: Duration::from_millis(300),
        }
    }
}
