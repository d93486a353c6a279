//! Soft-limit composition.
//!
//! The effective envelope is the default travel envelope tightened by the
//! operator's chuck, tailstock and custom constraints. Constraints never widen
//! travel: chuck/tailstock clearances are clamped to >= 0 and custom bounds are
//! clamped into the default envelope before they are applied. A composition
//! that would invert an axis is rejected and the triggering change rolled back.

use lathe_traits::{Axis, LimitPin};

use crate::error::LimitsError;

/// Travel envelope in machine coordinates (X as radius).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftLimits {
    pub x_min: f64,
    pub x_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl SoftLimits {
    pub const fn new(x_min: f64, x_max: f64, z_min: f64, z_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            z_min,
            z_max,
        }
    }

    pub fn get(&self, pin: LimitPin) -> f64 {
        match pin {
            LimitPin::XMin => self.x_min,
            LimitPin::XMax => self.x_max,
            LimitPin::ZMin => self.z_min,
            LimitPin::ZMax => self.z_max,
        }
    }

    fn slot(&mut self, pin: LimitPin) -> &mut f64 {
        match pin {
            LimitPin::XMin => &mut self.x_min,
            LimitPin::XMax => &mut self.x_max,
            LimitPin::ZMin => &mut self.z_min,
            LimitPin::ZMax => &mut self.z_max,
        }
    }

    /// True when `self` lies entirely inside `outer`.
    pub fn is_within(&self, outer: &Self) -> bool {
        self.x_min >= outer.x_min
            && self.x_max <= outer.x_max
            && self.z_min >= outer.z_min
            && self.z_max <= outer.z_max
    }

    pub fn validate(&self) -> Result<(), LimitsError> {
        for pin in LimitPin::ALL {
            if !self.get(pin).is_finite() {
                return Err(LimitsError::NonFinite(pin.pin_name()));
            }
        }
        if self.x_min > self.x_max {
            return Err(LimitsError::Inverted {
                axis: Axis::X,
                min: self.x_min,
                max: self.x_max,
            });
        }
        if self.z_min > self.z_max {
            return Err(LimitsError::Inverted {
                axis: Axis::Z,
                min: self.z_min,
                max: self.z_max,
            });
        }
        Ok(())
    }
}

/// Operator constraints, each independently settable and gated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LimitInputs {
    pub chuck_limit: f64,
    pub chuck_active: bool,
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

impl LimitInputs {
    pub fn custom(&self, pin: LimitPin) -> Option<f64> {
        match pin {
            LimitPin::XMin => self.custom_x_min,
            LimitPin::XMax => self.custom_x_max,
            LimitPin::ZMin => self.custom_z_min,
            LimitPin::ZMax => self.custom_z_max,
        }
    }

    pub fn custom_active(&self, pin: LimitPin) -> bool {
        match pin {
            LimitPin::XMin => self.x_min_active,
            LimitPin::XMax => self.x_max_active,
            LimitPin::ZMin => self.z_min_active,
            LimitPin::ZMax => self.z_max_active,
        }
    }

    fn custom_mut(&mut self, pin: LimitPin) -> &mut Option<f64> {
        match pin {
            LimitPin::XMin => &mut self.custom_x_min,
            LimitPin::XMax => &mut self.custom_x_max,
            LimitPin::ZMin => &mut self.custom_z_min,
            LimitPin::ZMax => &mut self.custom_z_max,
        }
    }

    fn active_mut(&mut self, pin: LimitPin) -> &mut bool {
        match pin {
            LimitPin::XMin => &mut self.x_min_active,
            LimitPin::XMax => &mut self.x_max_active,
            LimitPin::ZMin => &mut self.z_min_active,
            LimitPin::ZMax => &mut self.z_max_active,
        }
    }
}

fn is_min(pin: LimitPin) -> bool {
    matches!(pin, LimitPin::XMin | LimitPin::ZMin)
}

/// Compose the effective envelope. Pure and deterministic.
pub fn compose(defaults: &SoftLimits, inputs: &LimitInputs) -> Result<SoftLimits, LimitsError> {
    let mut out = *defaults;

    if inputs.chuck_active {
        out.z_min += inputs.chuck_limit.max(0.0);
    }
    out.z_max -= inputs.tailstock_limit.max(0.0);

    for pin in LimitPin::ALL {
        if !inputs.custom_active(pin) {
            continue;
        }
        // Unset custom values fall back to the default bound.
        let Some(v) = inputs.custom(pin) else {
            continue;
        };
        let (lo, hi) = match pin.axis() {
            Axis::X => (defaults.x_min, defaults.x_max),
            Axis::Z => (defaults.z_min, defaults.z_max),
        };
        let v = v.clamp(lo, hi);
        let slot = out.slot(pin);
        *slot = if is_min(pin) { slot.max(v) } else { slot.min(v) };
    }

    out.validate()?;
    Ok(out)
}

type Listener = Box<dyn FnMut(&SoftLimits)>;

/// Owns the limit inputs and publishes each recomputed envelope to subscribers.
///
/// Subscribers receive a shared reference while the handler is mutably
/// borrowed, so they cannot mutate the handler from inside a notification.
pub struct SoftLimitsHandler {
    defaults: SoftLimits,
    inputs: LimitInputs,
    current: SoftLimits,
    listeners: Vec<Listener>,
}

impl std::fmt::Debug for SoftLimitsHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftLimitsHandler")
            .field("defaults", &self.defaults)
            .field("inputs", &self.inputs)
            .field("current", &self.current)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl SoftLimitsHandler {
    pub fn new(defaults: SoftLimits) -> Result<Self, LimitsError> {
        Self::with_inputs(defaults, LimitInputs::default())
    }

    pub fn with_inputs(defaults: SoftLimits, inputs: LimitInputs) -> Result<Self, LimitsError> {
        defaults.validate()?;
        let current = compose(&defaults, &inputs)?;
        Ok(Self {
            defaults,
            inputs,
            current,
            listeners: Vec::new(),
        })
    }

    pub fn limits(&self) -> SoftLimits {
        self.current
    }

    pub fn defaults(&self) -> SoftLimits {
        self.defaults
    }

    pub fn inputs(&self) -> &LimitInputs {
        &self.inputs
    }

    pub fn subscribe<F>(&mut self, f: F)
    where
        F: FnMut(&SoftLimits) + 'static,
    {
        self.listeners.push(Box::new(f));
    }

    /// Apply one input change, recompute, and publish once.
    ///
    /// On rejection the inputs are restored and nothing is published.
    pub fn update<F>(&mut self, change: F) -> Result<SoftLimits, LimitsError>
    where
        F: FnOnce(&mut LimitInputs),
    {
        let previous = self.inputs;
        change(&mut self.inputs);
        match compose(&self.defaults, &self.inputs) {
            Ok(limits) => {
                self.current = limits;
                tracing::info!(
                    x_min = limits.x_min,
                    x_max = limits.x_max,
                    z_min = limits.z_min,
                    z_max = limits.z_max,
                    "soft limits updated"
                );
                for listener in &mut self.listeners {
                    listener(&limits);
                }
                Ok(limits)
            }
            Err(e) => {
                self.inputs = previous;
                tracing::warn!(error = %e, "soft limit change rejected");
                Err(e)
            }
        }
    }

    pub fn set_chuck_limit(&mut self, value: f64) -> Result<SoftLimits, LimitsError> {
        finite("chuck_limit", value)?;
        self.update(|i| i.chuck_limit = value)
    }

    pub fn set_chuck_active(&mut self, active: bool) -> Result<SoftLimits, LimitsError> {
        self.update(|i| i.chuck_active = active)
    }

    pub fn set_tailstock_limit(&mut self, value: f64) -> Result<SoftLimits, LimitsError> {
        finite("tailstock_limit", value)?;
        self.update(|i| i.tailstock_limit = value)
    }

    pub fn set_custom_limit(
        &mut self,
        pin: LimitPin,
        value: Option<f64>,
    ) -> Result<SoftLimits, LimitsError> {
        if let Some(v) = value {
            finite(pin.pin_name(), v)?;
        }
        self.update(|i| *i.custom_mut(pin) = value)
    }

    pub fn set_custom_limit_active(
        &mut self,
        pin: LimitPin,
        active: bool,
    ) -> Result<SoftLimits, LimitsError> {
        self.update(|i| *i.active_mut(pin) = active)
    }

    /// Toggle all four custom bounds at once.
    pub fn set_custom_limits_active(&mut self, active: bool) -> Result<SoftLimits, LimitsError> {
        self.update(|i| {
            for pin in LimitPin::ALL {
                *i.active_mut(pin) = active;
            }
        })
    }
}

fn finite(name: &'static str, v: f64) -> Result<(), LimitsError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(LimitsError::NonFinite(name))
    }
}
