//! `From` implementations bridging `lathe_config` types to `lathe_core` types.

use std::time::Duration;

use lathe_traits::TaskMode;

use crate::config::{FeedCfg, JogCfg, SpindleCfg, TimingCfg};
use crate::input::PanelInput;
use crate::limits::{LimitInputs, SoftLimits};
use crate::types::{JoystickDirection, Position, SpindleMode};

// ── Spindle ──────────────────────────────────────────────────────────────────

impl From<lathe_config::SpindleMode> for SpindleMode {
    fn from(m: lathe_config::SpindleMode) -> Self {
        match m {
            lathe_config::SpindleMode::Rpm => Self::Rpm,
            lathe_config::SpindleMode::Css => Self::Css,
        }
    }
}

impl From<&lathe_config::Spindle> for SpindleCfg {
    fn from(c: &lathe_config::Spindle) -> Self {
        Self {
            mode: c.mode.into(),
            rpm: c.rpm,
            css: c.css,
            max_rpm: c.max_rpm,
        }
    }
}

// ── Feed / Jog / Timing ──────────────────────────────────────────────────────

impl From<&lathe_config::Feed> for FeedCfg {
    fn from(c: &lathe_config::Feed) -> Self {
        Self {
            feed_per_rev: c.feed_per_rev,
            taper_enabled: c.taper_enabled,
            taper_angle_deg: c.taper_angle_deg,
        }
    }
}

impl From<&lathe_config::Jog> for JogCfg {
    fn from(c: &lathe_config::Jog) -> Self {
        Self {
            linear_speed: c.linear_speed,
        }
    }
}

impl From<&lathe_config::Timing> for TimingCfg {
    fn from(c: &lathe_config::Timing) -> Self {
        Self {
            pre_feed_delay: Duration::from_millis(c.pre_feed_delay_ms),
        }
    }
}

// ── Limits ───────────────────────────────────────────────────────────────────

impl From<&lathe_config::Axes> for SoftLimits {
    fn from(c: &lathe_config::Axes) -> Self {
        Self::new(c.x_min, c.x_max, c.z_min, c.z_max)
    }
}

impl From<&lathe_config::Limits> for LimitInputs {
    fn from(c: &lathe_config::Limits) -> Self {
        Self {
            chuck_limit: c.chuck_limit,
            chuck_active: c.chuck_active,
            tailstock_limit: c.tailstock_limit,
            custom_x_min: c.custom_x_min,
            custom_x_max: c.custom_x_max,
            custom_z_min: c.custom_z_min,
            custom_z_max: c.custom_z_max,
            x_min_active: c.x_min_active,
            x_max_active: c.x_max_active,
            z_min_active: c.z_min_active,
            z_max_active: c.z_max_active,
        }
    }
}

// ── Simulator / scenario ─────────────────────────────────────────────────────

pub fn task_mode(m: lathe_config::MachineMode) -> TaskMode {
    match m {
        lathe_config::MachineMode::Manual => TaskMode::Manual,
        lathe_config::MachineMode::Mdi => TaskMode::Mdi,
        lathe_config::MachineMode::Auto => TaskMode::Auto,
    }
}

impl From<lathe_config::JoystickDir> for JoystickDirection {
    fn from(d: lathe_config::JoystickDir) -> Self {
        match d {
            lathe_config::JoystickDir::XPlus => Self::XPlus,
            lathe_config::JoystickDir::XMinus => Self::XMinus,
            lathe_config::JoystickDir::ZPlus => Self::ZPlus,
            lathe_config::JoystickDir::ZMinus => Self::ZMinus,
        }
    }
}

impl From<&lathe_config::ScenarioInput> for PanelInput {
    fn from(i: &lathe_config::ScenarioInput) -> Self {
        use lathe_config::ScenarioInput as S;
        match *i {
            S::SpindleFwd { value } => Self::SpindleFwd(value),
            S::SpindleRev { value } => Self::SpindleRev(value),
            S::SpindleCover { value } => Self::SpindleCover(value),
            S::Joystick { direction, value } => Self::Joystick {
                direction: direction.into(),
                active: value,
            },
            S::Rapid { value } => Self::Rapid(value),
            S::Position { x, z } => Self::Position(Position::new(x, z)),
            S::SpindleRpm { value } => Self::SpindleRpm(value),
            S::FeedOverride { value } => Self::FeedOverride(value),
            S::CycleStop { value } => Self::CycleStop(value),
        }
    }
}
