#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and scenario parsing for the lathe control panel.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `Scenario` is a timed list of panel inputs used to replay a session
//!   against the simulated runtime.
use serde::Deserialize;

/// Default travel envelope in machine coordinates (X in radius).
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Axes {
    pub x_min: f64,
    pub x_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpindleMode {
    /// Constant RPM (G97)
    #[default]
    Rpm,
    /// Constant surface speed (G96)
    Css,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Spindle {
    pub mode: SpindleMode,
    pub rpm: u32,
    /// Surface speed for CSS mode (m/min)
    pub css: u32,
    /// RPM clamp applied in CSS mode (D word)
    pub max_rpm: u32,
}

impl Default for Spindle {
    fn default() -> Self {
        Self {
            mode: SpindleMode::Rpm,
            rpm: 300,
            css: 200,
            max_rpm: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Feed {
    /// Feed per spindle revolution (G95)
    pub feed_per_rev: f64,
    pub taper_enabled: bool,
    /// Angle to the spindle axis in degrees, (0, 90]
    pub taper_angle_deg: f64,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            feed_per_rev: 0.1,
            taper_enabled: false,
            taper_angle_deg: 45.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Jog {
    /// Continuous jog speed in machine units per minute
    pub linear_speed: f64,
}

impl Default for Jog {
    fn default() -> Self {
        Self {
            linear_speed: 1200.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Grace window between joystick deflection and the feed move
    pub pre_feed_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pre_feed_delay_ms: 300,
        }
    }
}

/// Operator constraints applied on top of the default envelope at startup.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Limits {
    /// Workpiece clearance from the chuck face (reduces Z- travel)
    pub chuck_limit: f64,
    pub chuck_active: bool,
    /// Clearance from the tailstock (reduces Z+ travel)
    pub tailstock_limit: f64,
    pub custom_x_min: Option<f64>,
    pub custom_x_max: Option<f64>,
    pub custom_z_min: Option<f64>,
    pub custom_z_max: Option<f64>,
    pub x_min_active: bool,
    pub x_max_active: bool,
    pub z_min_active: bool,
    pub z_max_active: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MachineMode {
    #[default]
    Manual,
    Mdi,
    Auto,
}

/// Start state of the simulated runtime.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Sim {
    pub powered: bool,
    pub homed: bool,
    pub mode: MachineMode,
    /// Delay before a mode switch takes effect
    pub mode_latency_ms: u64,
}

impl Default for Sim {
    fn default() -> Self {
        Self {
            powered: true,
            homed: true,
            mode: MachineMode::Manual,
            mode_latency_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub axes: Axes,
    #[serde(default)]
    pub spindle: Spindle,
    #[serde(default)]
    pub feed: Feed,
    #[serde(default)]
    pub jog: Jog,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub sim: Sim,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

fn check_custom_pair(axis: &str, min: Option<f64>, max: Option<f64>) -> eyre::Result<()> {
    for (name, v) in [("min", min), ("max", max)] {
        if let Some(v) = v
            && !v.is_finite()
        {
            eyre::bail!("limits.custom_{axis}_{name} must be finite");
        }
    }
    if let (Some(lo), Some(hi)) = (min, max)
        && lo > hi
    {
        eyre::bail!("limits.custom_{axis}_min must be <= limits.custom_{axis}_max");
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Axes
        let a = &self.axes;
        if ![a.x_min, a.x_max, a.z_min, a.z_max]
            .iter()
            .all(|v| v.is_finite())
        {
            eyre::bail!("axes bounds must be finite");
        }
        if a.x_min >= a.x_max {
            eyre::bail!("axes.x_min must be < axes.x_max");
        }
        if a.z_min >= a.z_max {
            eyre::bail!("axes.z_min must be < axes.z_max");
        }

        // Spindle
        if self.spindle.rpm == 0 {
            eyre::bail!("spindle.rpm must be > 0");
        }
        if self.spindle.css == 0 {
            eyre::bail!("spindle.css must be > 0");
        }
        if self.spindle.max_rpm == 0 {
            eyre::bail!("spindle.max_rpm must be > 0");
        }

        // Feed
        if !(self.feed.feed_per_rev > 0.0 && self.feed.feed_per_rev <= 10.0) {
            eyre::bail!("feed.feed_per_rev must be in (0.0, 10.0]");
        }
        if !(self.feed.taper_angle_deg > 0.0 && self.feed.taper_angle_deg <= 90.0) {
            eyre::bail!("feed.taper_angle_deg must be in (0.0, 90.0]");
        }

        // Jog
        if !(self.jog.linear_speed.is_finite() && self.jog.linear_speed > 0.0) {
            eyre::bail!("jog.linear_speed must be > 0");
        }

        // Timing
        if !(50..=2000).contains(&self.timing.pre_feed_delay_ms) {
            eyre::bail!("timing.pre_feed_delay_ms must be in [50, 2000]");
        }

        // Limits
        let l = &self.limits;
        if !(l.chuck_limit.is_finite() && l.chuck_limit >= 0.0) {
            eyre::bail!("limits.chuck_limit must be >= 0");
        }
        if !(l.tailstock_limit.is_finite() && l.tailstock_limit >= 0.0) {
            eyre::bail!("limits.tailstock_limit must be >= 0");
        }
        check_custom_pair("x", l.custom_x_min, l.custom_x_max)?;
        check_custom_pair("z", l.custom_z_min, l.custom_z_max)?;

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Joystick deflection named in scenario files.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum JoystickDir {
    XPlus,
    XMinus,
    ZPlus,
    ZMinus,
}

/// One panel input in a scenario.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum ScenarioInput {
    SpindleFwd { value: bool },
    SpindleRev { value: bool },
    SpindleCover { value: bool },
    Joystick { direction: JoystickDir, value: bool },
    Rapid { value: bool },
    Position { x: f64, z: f64 },
    SpindleRpm { value: f64 },
    FeedOverride { value: f64 },
    CycleStop { value: bool },
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScenarioStep {
    /// Offset from scenario start
    pub at_ms: u64,
    #[serde(flatten)]
    pub input: ScenarioInput,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Scenario {
    #[serde(rename = "step", default)]
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn validate(&self) -> eyre::Result<()> {
        for (i, pair) in self.steps.windows(2).enumerate() {
            if pair[1].at_ms < pair[0].at_ms {
                eyre::bail!(
                    "scenario steps must be ordered by at_ms (step {} at {} ms follows {} ms)",
                    i + 1,
                    pair[1].at_ms,
                    pair[0].at_ms
                );
            }
        }
        Ok(())
    }
}

pub fn load_scenario_toml(s: &str) -> eyre::Result<Scenario> {
    let scenario: Scenario = toml::from_str(s).map_err(|e| eyre::eyre!("parse scenario: {e}"))?;
    scenario.validate()?;
    Ok(scenario)
}

pub fn load_scenario_file(path: &std::path::Path) -> eyre::Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read scenario {:?}: {}", path, e))?;
    load_scenario_toml(&text)
}
