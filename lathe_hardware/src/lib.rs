//! Simulated motion runtime and pin bank.
//!
//! Stands in for the machine-control runtime when no controller is attached.
//! It enforces the same ordering rules the real runtime does: MDI commands
//! are refused outside MDI mode, jog commands outside manual mode, and
//! nothing is accepted while the machine is off or unhomed.

pub mod error;
pub mod util;

use std::time::{Duration, Instant};

use lathe_traits::{
    Axis, BoxError, IndicatorPins, LimitPin, MachineStatus, MotionRuntime, Sense, TaskMode,
};

use crate::error::RuntimeError;

/// One call observed by the simulator, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    Mode(TaskMode),
    WaitComplete,
    Mdi(String),
    Jog { axis: Axis, sense: Sense, speed: f64 },
    JogStop(Axis),
}

/// Simulated runtime. Mode switches settle after `mode_latency`.
pub struct SimulatedRuntime {
    powered: bool,
    homed: bool,
    mode: TaskMode,
    pending_mode: Option<(TaskMode, Instant)>,
    mode_latency: Duration,
    wait_timeout: Duration,
    jogging: Vec<(Axis, Sense)>,
    active_move: Option<String>,
    reject_next: Option<String>,
    journal: Vec<RuntimeCall>,
}

impl Default for SimulatedRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRuntime {
    /// A powered, homed machine in manual mode.
    pub fn new() -> Self {
        Self {
            powered: true,
            homed: true,
            mode: TaskMode::Manual,
            pending_mode: None,
            mode_latency: Duration::ZERO,
            wait_timeout: Duration::from_millis(500),
            jogging: Vec::new(),
            active_move: None,
            reject_next: None,
            journal: Vec::new(),
        }
    }

    pub fn with_state(mut self, powered: bool, homed: bool, mode: TaskMode) -> Self {
        self.powered = powered;
        self.homed = homed;
        self.mode = mode;
        self
    }

    pub fn with_mode_latency(mut self, latency: Duration) -> Self {
        self.mode_latency = latency;
        self
    }

    pub fn set_powered(&mut self, on: bool) {
        self.powered = on;
    }

    pub fn set_homed(&mut self, homed: bool) {
        self.homed = homed;
    }

    /// Force the mode without going through `set_mode` (e.g. a program started elsewhere).
    pub fn force_mode(&mut self, mode: TaskMode) {
        self.pending_mode = None;
        self.mode = mode;
    }

    /// Make the next MDI submission fail with `reason`.
    pub fn reject_next_mdi(&mut self, reason: impl Into<String>) {
        self.reject_next = Some(reason.into());
    }

    pub fn journal(&self) -> &[RuntimeCall] {
        &self.journal
    }

    /// MDI strings accepted so far.
    pub fn mdi_history(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter_map(|c| match c {
                RuntimeCall::Mdi(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The MDI command still in effect, if the runtime has not left MDI mode since.
    pub fn active_move(&self) -> Option<&str> {
        self.active_move.as_deref()
    }

    pub fn active_jogs(&self) -> &[(Axis, Sense)] {
        &self.jogging
    }

    pub fn mode(&mut self) -> TaskMode {
        self.settle();
        self.mode
    }

    fn settle(&mut self) {
        if let Some((mode, at)) = self.pending_mode
            && Instant::now() >= at
        {
            self.mode = mode;
            self.pending_mode = None;
        }
    }

    fn ensure_ready(&self) -> error::Result<()> {
        if self.powered && self.homed {
            Ok(())
        } else {
            Err(RuntimeError::NotReady {
                powered: self.powered,
                homed: self.homed,
            })
        }
    }

    fn ensure_mode(&mut self, expected: TaskMode) -> error::Result<()> {
        self.settle();
        if self.mode == expected {
            Ok(())
        } else {
            Err(RuntimeError::WrongMode {
                expected,
                actual: self.mode,
            })
        }
    }
}

impl MotionRuntime for SimulatedRuntime {
    fn status(&mut self) -> Result<MachineStatus, BoxError> {
        self.settle();
        Ok(MachineStatus {
            powered: self.powered,
            all_homed: self.homed,
            mode: self.mode,
        })
    }

    fn set_mode(&mut self, mode: TaskMode) -> Result<(), BoxError> {
        self.journal.push(RuntimeCall::Mode(mode));
        if mode != TaskMode::Manual {
            self.jogging.clear();
        }
        if mode != TaskMode::Mdi {
            // Leaving MDI ends whatever move the last MDI command started.
            self.active_move = None;
        }
        if self.mode_latency.is_zero() {
            self.mode = mode;
            self.pending_mode = None;
        } else {
            self.pending_mode = Some((mode, Instant::now() + self.mode_latency));
        }
        tracing::debug!(?mode, "sim mode request");
        Ok(())
    }

    fn wait_complete(&mut self) -> Result<(), BoxError> {
        self.journal.push(RuntimeCall::WaitComplete);
        if let Some((_, at)) = self.pending_mode {
            let waited = util::poll_until_settled(
                || Instant::now() >= at,
                self.wait_timeout,
                Duration::from_micros(250),
            )?;
            tracing::debug!(?waited, "sim mode settled");
            self.settle();
        }
        Ok(())
    }

    fn mdi(&mut self, command: &str) -> Result<(), BoxError> {
        self.ensure_ready()?;
        self.ensure_mode(TaskMode::Mdi)?;
        if let Some(reason) = self.reject_next.take() {
            tracing::warn!(command, %reason, "sim rejected mdi");
            return Err(Box::new(RuntimeError::Rejected(reason)));
        }
        tracing::info!(command, "sim mdi");
        self.journal.push(RuntimeCall::Mdi(command.to_string()));
        self.active_move = Some(command.to_string());
        Ok(())
    }

    fn jog(&mut self, axis: Axis, sense: Sense, speed: f64) -> Result<(), BoxError> {
        self.ensure_ready()?;
        self.ensure_mode(TaskMode::Manual)?;
        tracing::info!(%axis, ?sense, speed, "sim jog");
        self.jogging.retain(|(a, _)| *a != axis);
        self.jogging.push((axis, sense));
        self.journal.push(RuntimeCall::Jog { axis, sense, speed });
        Ok(())
    }

    fn jog_stop(&mut self, axis: Axis) -> Result<(), BoxError> {
        self.ensure_mode(TaskMode::Manual)?;
        tracing::info!(%axis, "sim jog stop");
        self.jogging.retain(|(a, _)| *a != axis);
        self.journal.push(RuntimeCall::JogStop(axis));
        Ok(())
    }
}

/// Simulated pin bank for the panel's produced pins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulatedPins {
    pub spindle_started: bool,
    pub power_feeding: bool,
    pub x_min: Option<f64>,
    pub x_max: Option<f64>,
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
}

impl SimulatedPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis_limit(&self, pin: LimitPin) -> Option<f64> {
        match pin {
            LimitPin::XMin => self.x_min,
            LimitPin::XMax => self.x_max,
            LimitPin::ZMin => self.z_min,
            LimitPin::ZMax => self.z_max,
        }
    }
}

impl IndicatorPins for SimulatedPins {
    fn spindle_started(&self) -> bool {
        self.spindle_started
    }

    fn set_spindle_started(&mut self, on: bool) {
        self.spindle_started = on;
    }

    fn power_feeding(&self) -> bool {
        self.power_feeding
    }

    fn set_power_feeding(&mut self, on: bool) {
        self.power_feeding = on;
    }

    fn set_axis_limit(&mut self, pin: LimitPin, value: f64) {
        tracing::debug!(pin = pin.pin_name(), value, "sim pin");
        let slot = match pin {
            LimitPin::XMin => &mut self.x_min,
            LimitPin::XMax => &mut self.x_max,
            LimitPin::ZMin => &mut self.z_min,
            LimitPin::ZMax => &mut self.z_max,
        };
        *slot = Some(value);
    }
}
