//! Applies composed soft limits to the runtime's axis-limit pins.
//!
//! A bound is only written once the tool sits on the legal side of it;
//! writing a bound the tool is already past would fault the runtime. Until
//! all four bounds of the latest envelope are written, every position update
//! retries the ones still pending.

use lathe_traits::{IndicatorPins, LimitPin};

use crate::limits::SoftLimits;
use crate::types::Position;

#[derive(Debug, Default)]
pub struct LimitEnforcer {
    target: Option<SoftLimits>,
    applied: Option<SoftLimits>,
    written: [Option<f64>; 4],
    warned: [bool; 4],
}

fn slot(pin: LimitPin) -> usize {
    match pin {
        LimitPin::XMin => 0,
        LimitPin::XMax => 1,
        LimitPin::ZMin => 2,
        LimitPin::ZMax => 3,
    }
}

/// True when `pos` has not crossed `bound` for this pin.
pub fn clear_of(pin: LimitPin, bound: f64, pos: Position) -> bool {
    let p = pos.on(pin.axis());
    match pin {
        LimitPin::XMin | LimitPin::ZMin => p >= bound,
        LimitPin::XMax | LimitPin::ZMax => p <= bound,
    }
}

impl LimitEnforcer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_limits_changed(&mut self, limits: SoftLimits) {
        if self.target != Some(limits) {
            self.warned = [false; 4];
        }
        self.target = Some(limits);
    }

    /// The envelope last written in full, if any.
    pub fn applied(&self) -> Option<SoftLimits> {
        self.applied
    }

    pub fn is_settled(&self) -> bool {
        self.target.is_some() && self.applied == self.target
    }

    /// Write every pending bound the tool is clear of.
    ///
    /// Returns the pins still waiting for the tool to back off.
    pub fn on_position<P: IndicatorPins>(&mut self, pos: Position, pins: &mut P) -> Vec<LimitPin> {
        let Some(target) = self.target else {
            return Vec::new();
        };
        if self.applied == Some(target) {
            return Vec::new();
        }

        let mut blocked = Vec::new();
        for pin in LimitPin::ALL {
            let i = slot(pin);
            let bound = target.get(pin);
            if self.written[i] == Some(bound) {
                continue;
            }
            if clear_of(pin, bound, pos) {
                pins.set_axis_limit(pin, bound);
                self.written[i] = Some(bound);
            } else {
                if !self.warned[i] {
                    tracing::warn!(
                        pin = pin.pin_name(),
                        bound,
                        position = pos.on(pin.axis()),
                        "tool is past new limit; back off to activate it"
                    );
                    self.warned[i] = true;
                }
                blocked.push(pin);
            }
        }

        if blocked.is_empty() {
            tracing::info!("soft limits applied to runtime");
            self.applied = Some(target);
        }
        blocked
    }
}
