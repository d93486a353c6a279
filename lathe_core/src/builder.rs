//! Type-state builder for `ManualTurningCore`.
//!
//! `build()` is only available once a runtime and pins were supplied;
//! `try_build()` is always available and reports what is missing.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use lathe_traits::{Clock, IndicatorPins, MonotonicClock, MotionRuntime};

use crate::config::{FeedCfg, JogCfg, SpindleCfg, TimingCfg};
use crate::core::ManualTurningCore;
use crate::enforcement::LimitEnforcer;
use crate::error::{BuildError, Report, Result};
use crate::fsm::ManualTurningState;
use crate::limits::{LimitInputs, SoftLimits, SoftLimitsHandler};
use crate::messages::MessageStack;
use crate::timer::DelayTimer;
use crate::types::{JoggedAxis, JoystickDirection, JoystickFunction, SpindleLever};

/// Accepted pre-feed grace window.
pub const PRE_FEED_DELAY_RANGE_MS: std::ops::RangeInclusive<u64> = 50..=2000;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct CoreBuilder<R, P, RS = Missing, PS = Missing> {
    runtime: Option<R>,
    pins: Option<P>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    axes: Option<SoftLimits>,
    limit_inputs: LimitInputs,
    spindle: SpindleCfg,
    feed: FeedCfg,
    jog: JogCfg,
    timing: TimingCfg,
    _state: PhantomData<(RS, PS)>,
}

impl<R, P> Default for CoreBuilder<R, P> {
    fn default() -> Self {
        Self {
            runtime: None,
            pins: None,
            clock: None,
            axes: None,
            limit_inputs: LimitInputs::default(),
            spindle: SpindleCfg::default(),
            feed: FeedCfg::default(),
            jog: JogCfg::default(),
            timing: TimingCfg::default(),
            _state: PhantomData,
        }
    }
}

impl<R: MotionRuntime, P: IndicatorPins> ManualTurningCore<R, P> {
    pub fn builder() -> CoreBuilder<R, P> {
        CoreBuilder::default()
    }
}

impl<R, P, RS, PS> CoreBuilder<R, P, RS, PS> {
    fn retype<RS2, PS2>(self) -> CoreBuilder<R, P, RS2, PS2> {
        CoreBuilder {
            runtime: self.runtime,
            pins: self.pins,
            clock: self.clock,
            axes: self.axes,
            limit_inputs: self.limit_inputs,
            spindle: self.spindle,
            feed: self.feed,
            jog: self.jog,
            timing: self.timing,
            _state: PhantomData,
        }
    }

    /// Default travel envelope the operator constraints tighten.
    pub fn with_axes(mut self, axes: SoftLimits) -> Self {
        self.axes = Some(axes);
        self
    }
    pub fn with_limit_inputs(mut self, inputs: LimitInputs) -> Self {
        self.limit_inputs = inputs;
        self
    }
    pub fn with_spindle(mut self, spindle: SpindleCfg) -> Self {
        self.spindle = spindle;
        self
    }
    pub fn with_feed(mut self, feed: FeedCfg) -> Self {
        self.feed = feed;
        self
    }
    pub fn with_jog(mut self, jog: JogCfg) -> Self {
        self.jog = jog;
        self
    }
    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.timing = timing;
        self
    }
    pub fn with_pre_feed_delay(mut self, delay: Duration) -> Self {
        self.timing.pre_feed_delay = delay;
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }
    /// Apply every section of a validated `lathe_config::Config`.
    pub fn with_config(self, cfg: &lathe_config::Config) -> Self {
        self.with_axes(SoftLimits::from(&cfg.axes))
            .with_limit_inputs(LimitInputs::from(&cfg.limits))
            .with_spindle(SpindleCfg::from(&cfg.spindle))
            .with_feed(FeedCfg::from(&cfg.feed))
            .with_jog(JogCfg::from(&cfg.jog))
            .with_timing(TimingCfg::from(&cfg.timing))
    }
}

// Setters that advance type-state
impl<R, P, PS> CoreBuilder<R, P, Missing, PS> {
    pub fn with_runtime(mut self, runtime: R) -> CoreBuilder<R, P, Set, PS> {
        self.runtime = Some(runtime);
        self.retype()
    }
}

impl<R, P, RS> CoreBuilder<R, P, RS, Missing> {
    pub fn with_pins(mut self, pins: P) -> CoreBuilder<R, P, RS, Set> {
        self.pins = Some(pins);
        self.retype()
    }
}

fn invalid(msg: &'static str) -> Report {
    Report::new(BuildError::InvalidConfig(msg))
}

impl<R: MotionRuntime, P: IndicatorPins, RS, PS> CoreBuilder<R, P, RS, PS> {
    /// Fallible build available in any type-state; returns a typed error for missing pieces.
    pub fn try_build(self) -> Result<ManualTurningCore<R, P>> {
        let runtime = self
            .runtime
            .ok_or_else(|| Report::new(BuildError::MissingRuntime))?;
        let pins = self
            .pins
            .ok_or_else(|| Report::new(BuildError::MissingPins))?;
        let axes = self
            .axes
            .ok_or_else(|| Report::new(BuildError::MissingAxes))?;

        // ── Validation ───────────────────────────────────────────────────────
        if axes.validate().is_err() {
            return Err(invalid("axis envelope must be finite with min <= max"));
        }
        if !(self.feed.feed_per_rev.is_finite() && self.feed.feed_per_rev > 0.0) {
            return Err(invalid("feed_per_rev must be > 0"));
        }
        if !(self.feed.taper_angle_deg > 0.0 && self.feed.taper_angle_deg <= 90.0) {
            return Err(invalid("taper angle must be in (0, 90]"));
        }
        if !(self.jog.linear_speed.is_finite() && self.jog.linear_speed > 0.0) {
            return Err(invalid("jog speed must be > 0"));
        }
        if self.spindle.rpm == 0 || self.spindle.css == 0 || self.spindle.max_rpm == 0 {
            return Err(invalid("spindle speeds must be > 0"));
        }
        let delay_ms = u64::try_from(self.timing.pre_feed_delay.as_millis()).unwrap_or(u64::MAX);
        if !PRE_FEED_DELAY_RANGE_MS.contains(&delay_ms) {
            return Err(invalid("pre-feed delay must be within 50..=2000 ms"));
        }

        let limits = SoftLimitsHandler::with_inputs(axes, self.limit_inputs)
            .map_err(|_| invalid("initial limit constraints invert the envelope"))?;
        let mut enforcer = LimitEnforcer::new();
        enforcer.on_limits_changed(limits.limits());

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };

        Ok(ManualTurningCore {
            runtime,
            pins,
            clock,
            spindle: self.spindle,
            feed: self.feed,
            jog: self.jog,
            timing: self.timing,
            limits,
            enforcer,
            state: ManualTurningState::Idle,
            joystick_function: JoystickFunction::None,
            jogged_axis: JoggedAxis::None,
            jog_sense: None,
            lever: SpindleLever::None,
            cover_open: false,
            direction: JoystickDirection::None,
            rapid: false,
            position: None,
            actual_rpm: 0.0,
            feed_override: 1.0,
            timer: DelayTimer::new(),
            messages: MessageStack::new(),
            last_error: None,
        })
    }
}

impl<R: MotionRuntime, P: IndicatorPins> CoreBuilder<R, P, Set, Set> {
    /// Validate and build. Only available when runtime and pins are set.
    pub fn build(self) -> Result<ManualTurningCore<R, P>> {
        self.try_build()
    }
}
