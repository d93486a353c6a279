//! Recording test doubles for the runtime and pin traits.
//!
//! Unlike the simulator these never refuse a command unless told to, which
//! keeps state-machine tests focused on what the core issues.

use lathe_traits::{
    Axis, BoxError, IndicatorPins, LimitPin, MachineStatus, MotionRuntime, Sense, TaskMode,
};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    SetMode(TaskMode),
    WaitComplete,
    Mdi(String),
    Jog { axis: Axis, sense: Sense, speed: f64 },
    JogStop(Axis),
}

#[derive(Debug)]
pub struct RecordingRuntime {
    pub status: MachineStatus,
    pub calls: Vec<RecordedCall>,
    /// When set, every MDI submission fails with this message.
    pub fail_mdi: Option<String>,
}

impl Default for RecordingRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingRuntime {
    /// Powered, homed, manual mode.
    pub fn new() -> Self {
        Self {
            status: MachineStatus {
                powered: true,
                all_homed: true,
                mode: TaskMode::Manual,
            },
            calls: Vec::new(),
            fail_mdi: None,
        }
    }

    pub fn mdi_commands(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Mdi(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    /// MDI commands that are feed moves (G95 ... G1).
    pub fn feed_commands(&self) -> Vec<&str> {
        self.mdi_commands()
            .into_iter()
            .filter(|c| c.starts_with("G95"))
            .collect()
    }

    pub fn jogs(&self) -> Vec<(Axis, Sense)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::Jog { axis, sense, .. } => Some((*axis, *sense)),
                _ => None,
            })
            .collect()
    }

    pub fn jog_stops(&self) -> Vec<Axis> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                RecordedCall::JogStop(axis) => Some(*axis),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl MotionRuntime for RecordingRuntime {
    fn status(&mut self) -> Result<MachineStatus, BoxError> {
        Ok(self.status)
    }

    fn set_mode(&mut self, mode: TaskMode) -> Result<(), BoxError> {
        self.status.mode = mode;
        self.calls.push(RecordedCall::SetMode(mode));
        Ok(())
    }

    fn wait_complete(&mut self) -> Result<(), BoxError> {
        self.calls.push(RecordedCall::WaitComplete);
        Ok(())
    }

    fn mdi(&mut self, command: &str) -> Result<(), BoxError> {
        if let Some(msg) = &self.fail_mdi {
            return Err(Box::new(std::io::Error::other(msg.clone())));
        }
        self.calls.push(RecordedCall::Mdi(command.to_string()));
        Ok(())
    }

    fn jog(&mut self, axis: Axis, sense: Sense, speed: f64) -> Result<(), BoxError> {
        self.calls.push(RecordedCall::Jog { axis, sense, speed });
        Ok(())
    }

    fn jog_stop(&mut self, axis: Axis) -> Result<(), BoxError> {
        self.calls.push(RecordedCall::JogStop(axis));
        Ok(())
    }
}

/// Pin bank that keeps every axis-limit write.
#[derive(Debug, Default, Clone)]
pub struct RecordingPins {
    pub spindle_started: bool,
    pub power_feeding: bool,
    pub limit_writes: Vec<(LimitPin, f64)>,
}

impl RecordingPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value written to `pin`.
    pub fn limit(&self, pin: LimitPin) -> Option<f64> {
        self.limit_writes
            .iter()
            .rev()
            .find(|(p, _)| *p == pin)
            .map(|(_, v)| *v)
    }
}

impl IndicatorPins for RecordingPins {
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
        self.limit_writes.push((pin, value));
    }
}
