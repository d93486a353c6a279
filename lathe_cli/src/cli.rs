//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use lathe_core::JoystickDirection;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "lathe", version, about = "Manual turning panel for a CNC lathe")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/lathe_config.toml")]
    pub config: PathBuf,

    /// Emit results and errors as JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Joystick deflection as typed on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Direction {
    XPlus,
    XMinus,
    ZPlus,
    ZMinus,
}

impl From<Direction> for JoystickDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::XPlus => Self::XPlus,
            Direction::XMinus => Self::XMinus,
            Direction::ZPlus => Self::ZPlus,
            Direction::ZMinus => Self::ZMinus,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scenario of panel inputs against the simulated runtime
    Simulate {
        /// Scenario TOML with [[step]] tables
        #[arg(long, value_name = "FILE")]
        scenario: PathBuf,
        /// Run on the wall clock through the channel dispatcher instead of a simulated clock
        #[arg(long, action = ArgAction::SetTrue)]
        realtime: bool,
        /// Keep the clock running this long after the last step so a pending feed delay can expire
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        settle_ms: u64,
        /// Exit non-zero if the runtime refused or failed any command
        #[arg(long, action = ArgAction::SetTrue)]
        fail_on_error: bool,
    },
    /// Print the soft-limit envelope composed from the config
    Limits {
        /// Override limits.chuck_limit and activate it
        #[arg(long, value_name = "MM")]
        chuck: Option<f64>,
        /// Override limits.tailstock_limit
        #[arg(long, value_name = "MM")]
        tailstock: Option<f64>,
    },
    /// Print the feed command the panel would issue for a joystick deflection
    Plan {
        #[arg(long, value_enum)]
        direction: Direction,
        /// Taper angle in degrees; falls back to feed.taper_angle_deg when taper is enabled in the config
        #[arg(long, value_name = "DEG")]
        angle: Option<f64>,
        /// Tool X position (radius)
        #[arg(long, allow_negative_numbers = true)]
        x: Option<f64>,
        /// Tool Z position
        #[arg(long, allow_negative_numbers = true)]
        z: Option<f64>,
    },
    /// Quick health check: config, limits, and a spindle start/stop against the simulator
    SelfCheck,
}
