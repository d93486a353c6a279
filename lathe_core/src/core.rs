//! The manual turning core (`ManualTurningCore`).
//!
//! Consumes spindle-lever, cover, joystick and rapid signals, derives an
//! event, and drives the state machine. Entry and exit actions talk to the
//! motion runtime (spindle, feed and jog commands) and the indicator pins.
//! Handlers never return errors: runtime failures are logged, remembered as
//! `last_error`, and the state machine carries on.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eyre::WrapErr;
use lathe_traits::{BoxError, Clock, IndicatorPins, LimitPin, MotionRuntime, Sense, TaskMode};

use crate::command::{MdiCommand, SpindleDirection};
use crate::config::{FeedCfg, JogCfg, SpindleCfg, TimingCfg};
use crate::enforcement::LimitEnforcer;
use crate::error::{LimitsError, Report, Result, VcpError};
use crate::event::{Event, derive_event};
use crate::fsm::ManualTurningState;
use crate::input::PanelInput;
use crate::limits::{SoftLimits, SoftLimitsHandler};
use crate::messages::{MessageStack, UserMessage};
use crate::planner::{FeedRequest, plan_feed};
use crate::runtime_error::map_runtime_error;
use crate::status::PanelStatus;
use crate::timer::{DelayTimer, TimerToken};
use crate::types::{
    JoggedAxis, JoystickDirection, JoystickFunction, Position, SpindleLever, SpindleMode,
};

fn runtime_report(e: BoxError) -> Report {
    Report::new(map_runtime_error(&*e))
}

pub struct ManualTurningCore<R: MotionRuntime, P: IndicatorPins> {
    pub(crate) runtime: R,
    pub(crate) pins: P,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) spindle: SpindleCfg,
    pub(crate) feed: FeedCfg,
    pub(crate) jog: JogCfg,
    pub(crate) timing: TimingCfg,
    pub(crate) limits: SoftLimitsHandler,
    pub(crate) enforcer: LimitEnforcer,

    pub(crate) state: ManualTurningState,
    pub(crate) joystick_function: JoystickFunction,
    pub(crate) jogged_axis: JoggedAxis,
    pub(crate) jog_sense: Option<Sense>,
    pub(crate) lever: SpindleLever,
    pub(crate) cover_open: bool,
    pub(crate) direction: JoystickDirection,
    pub(crate) rapid: bool,
    pub(crate) position: Option<Position>,
    pub(crate) actual_rpm: f64,
    pub(crate) feed_override: f64,
    pub(crate) timer: DelayTimer,
    pub(crate) messages: MessageStack,
    pub(crate) last_error: Option<VcpError>,
}

impl<R: MotionRuntime, P: IndicatorPins> std::fmt::Debug for ManualTurningCore<R, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualTurningCore")
            .field("state", &self.state)
            .field("joystick_function", &self.joystick_function)
            .field("jogged_axis", &self.jogged_axis)
            .field("lever", &self.lever)
            .field("direction", &self.direction)
            .field("rapid", &self.rapid)
            .field("limits", &self.limits.limits())
            .finish_non_exhaustive()
    }
}

impl<R: MotionRuntime, P: IndicatorPins> ManualTurningCore<R, P> {
    // ── Inputs ───────────────────────────────────────────────────────────────

    /// Dispatch one panel input.
    pub fn apply(&mut self, input: PanelInput) {
        match input {
            PanelInput::SpindleFwd(on) => self.on_spindle_switch_fwd(on),
            PanelInput::SpindleRev(on) => self.on_spindle_switch_rev(on),
            PanelInput::SpindleCover(open) => self.on_spindle_cover(open),
            PanelInput::Joystick { direction, active } => self.on_joystick(direction, active),
            PanelInput::Rapid(on) => self.on_rapid(on),
            PanelInput::Position(pos) => {
                self.on_position(pos);
            }
            PanelInput::SpindleRpm(rpm) => self.on_spindle_actual_rpm(rpm),
            PanelInput::FeedOverride(f) => self.on_feed_override(f),
            PanelInput::CycleStop(pressed) => self.on_cycle_stop(pressed),
        }
    }

    pub fn on_spindle_switch_fwd(&mut self, on: bool) {
        let lever = match (on, self.lever) {
            (true, _) => SpindleLever::Fwd,
            (false, SpindleLever::Fwd) => SpindleLever::None,
            (false, other) => other,
        };
        self.set_lever(lever);
    }

    pub fn on_spindle_switch_rev(&mut self, on: bool) {
        let lever = match (on, self.lever) {
            (true, _) => SpindleLever::Rev,
            (false, SpindleLever::Rev) => SpindleLever::None,
            (false, other) => other,
        };
        self.set_lever(lever);
    }

    /// An open cover counts as the lever in neutral.
    pub fn on_spindle_cover(&mut self, open: bool) {
        if open == self.cover_open {
            return;
        }
        let was_on = self.spindle_on();
        self.cover_open = open;
        tracing::info!(open, "spindle cover");
        self.on_signal_change(was_on, false);
    }

    /// Edge on one joystick direction pin.
    ///
    /// Swinging from one feed direction straight into another while feeding
    /// stops the feed and requires a return to neutral.
    pub fn on_joystick(&mut self, direction: JoystickDirection, active: bool) {
        let next = if active {
            direction
        } else if self.direction == direction {
            JoystickDirection::None
        } else {
            // release of a direction that is not the current one
            return;
        };
        if next == self.direction {
            return;
        }
        let was_on = self.spindle_on();
        let swung = !self.direction.is_centered() && !next.is_centered();
        self.direction = next;
        tracing::debug!(direction = ?next, "joystick");
        if swung && self.state == ManualTurningState::Feeding {
            if self.can_handle_manual_operations() {
                tracing::warn!(direction = ?next, "joystick swung while feeding");
                self.transition_to(ManualTurningState::JoystickResetRequired);
            }
            return;
        }
        self.on_signal_change(was_on, false);
    }

    pub fn on_rapid(&mut self, on: bool) {
        if on == self.rapid {
            return;
        }
        let was_on = self.spindle_on();
        self.rapid = on;
        tracing::debug!(rapid = on, "joystick rapid");
        self.on_signal_change(was_on, false);
    }

    /// Absolute position update; returns limit pins still waiting for the tool to back off.
    pub fn on_position(&mut self, pos: Position) -> Vec<LimitPin> {
        self.position = Some(pos);
        self.enforcer.on_position(pos, &mut self.pins)
    }

    pub fn on_spindle_actual_rpm(&mut self, rpm: f64) {
        if rpm.is_finite() {
            self.actual_rpm = rpm;
        }
    }

    pub fn on_feed_override(&mut self, factor: f64) {
        if factor.is_finite() {
            self.feed_override = factor.max(0.0);
        }
    }

    pub fn on_cycle_stop(&mut self, pressed: bool) {
        if pressed {
            self.disable_taper("cycle stop");
        }
    }

    // ── Timers ───────────────────────────────────────────────────────────────

    /// Fire the feed-delay timer if its deadline has passed. Returns true if it fired.
    pub fn poll_timers(&mut self) -> bool {
        match self.timer.poll(self.clock.now()) {
            Some(token) => self.on_timer(token),
            None => false,
        }
    }

    /// Deliver a timer expiry. Stale tokens are ignored.
    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        if !self.timer.is_current(token) || self.state != ManualTurningState::PreFeedDelay {
            tracing::debug!(state = %self.state, "stale feed delay ignored");
            return false;
        }
        if !self.can_handle_manual_operations() {
            tracing::debug!("feed delay expired while manual operation not permitted");
            return false;
        }
        self.dispatch(Event::FeedDelayExpired);
        true
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Time left on the pending feed delay, measured on the core's clock.
    pub fn time_to_deadline(&self) -> Option<Duration> {
        self.timer
            .deadline()
            .map(|d| d.saturating_duration_since(self.clock.now()))
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    pub fn set_spindle_mode(&mut self, mode: SpindleMode) {
        self.spindle.mode = mode;
    }

    pub fn set_spindle_rpm(&mut self, rpm: u32) {
        self.spindle.rpm = rpm;
    }

    pub fn set_surface_speed(&mut self, css: u32) {
        self.spindle.css = css;
    }

    pub fn set_max_rpm(&mut self, max_rpm: u32) {
        self.spindle.max_rpm = max_rpm;
    }

    pub fn set_feed_per_rev(&mut self, feed_per_rev: f64) {
        self.feed.feed_per_rev = feed_per_rev;
    }

    pub fn set_taper_enabled(&mut self, enabled: bool) {
        self.feed.taper_enabled = enabled;
    }

    /// Angles outside (0, 90] are accepted here and rejected when a feed is planned.
    pub fn set_taper_angle(&mut self, angle_deg: f64) {
        self.feed.taper_angle_deg = angle_deg;
    }

    /// Units per minute.
    pub fn set_jog_speed(&mut self, linear_speed: f64) {
        self.jog.linear_speed = linear_speed;
    }

    pub fn spindle_cfg(&self) -> &SpindleCfg {
        &self.spindle
    }

    pub fn feed_cfg(&self) -> &FeedCfg {
        &self.feed
    }

    pub fn jog_cfg(&self) -> &JogCfg {
        &self.jog
    }

    pub fn timing_cfg(&self) -> &TimingCfg {
        &self.timing
    }

    // ── Soft limits ──────────────────────────────────────────────────────────

    pub fn soft_limits(&self) -> SoftLimits {
        self.limits.limits()
    }

    pub fn limits_handler(&self) -> &SoftLimitsHandler {
        &self.limits
    }

    /// Register a listener for every published envelope.
    pub fn subscribe_limits<F>(&mut self, f: F)
    where
        F: FnMut(&SoftLimits) + 'static,
    {
        self.limits.subscribe(f);
    }

    pub fn set_chuck_limit(&mut self, value: f64) -> Result<SoftLimits> {
        self.change_limits(|h| h.set_chuck_limit(value))
    }

    pub fn set_chuck_active(&mut self, active: bool) -> Result<SoftLimits> {
        self.change_limits(|h| h.set_chuck_active(active))
    }

    pub fn set_tailstock_limit(&mut self, value: f64) -> Result<SoftLimits> {
        self.change_limits(|h| h.set_tailstock_limit(value))
    }

    pub fn set_custom_limit(&mut self, pin: LimitPin, value: Option<f64>) -> Result<SoftLimits> {
        self.change_limits(|h| h.set_custom_limit(pin, value))
    }

    pub fn set_custom_limit_active(&mut self, pin: LimitPin, active: bool) -> Result<SoftLimits> {
        self.change_limits(|h| h.set_custom_limit_active(pin, active))
    }

    pub fn set_custom_limits_active(&mut self, active: bool) -> Result<SoftLimits> {
        self.change_limits(|h| h.set_custom_limits_active(active))
    }

    fn change_limits<F>(&mut self, change: F) -> Result<SoftLimits>
    where
        F: FnOnce(&mut SoftLimitsHandler) -> std::result::Result<SoftLimits, LimitsError>,
    {
        let limits = change(&mut self.limits)
            .map_err(|e| Report::new(VcpError::from(e)))
            .wrap_err("updating soft limits")?;
        self.enforcer.on_limits_changed(limits);
        Ok(limits)
    }

    // ── Readouts ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> ManualTurningState {
        self.state
    }

    pub fn joystick_function(&self) -> JoystickFunction {
        self.joystick_function
    }

    pub fn jogged_axis(&self) -> JoggedAxis {
        self.jogged_axis
    }

    pub fn joystick_direction(&self) -> JoystickDirection {
        self.direction
    }

    pub fn spindle_lever(&self) -> SpindleLever {
        self.lever
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn messages(&self) -> &MessageStack {
        &self.messages
    }

    /// Dismiss the newest advisory.
    pub fn pop_message(&mut self) -> Option<UserMessage> {
        self.messages.pop()
    }

    pub fn last_error(&self) -> Option<&VcpError> {
        self.last_error.as_ref()
    }

    /// Absolute measured spindle speed, rounded.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn actual_rpm(&self) -> u32 {
        self.actual_rpm.abs().round().min(f64::from(u32::MAX)) as u32
    }

    /// Effective feed per revolution, zero unless power feeding.
    pub fn actual_feed(&self) -> f64 {
        if self.pins.power_feeding() {
            self.feed.feed_per_rev * self.feed_override
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> PanelStatus {
        PanelStatus {
            state: self.state,
            joystick_function: self.joystick_function,
            jogged_axis: self.jogged_axis,
            spindle_started: self.pins.spindle_started(),
            power_feeding: self.pins.power_feeding(),
            spindle_mode: self.spindle.mode,
            actual_rpm: self.actual_rpm(),
            actual_feed: self.actual_feed(),
            taper_enabled: self.feed.taper_enabled,
            position: self.position,
            limits: self.limits.limits(),
            limits_applied: self.enforcer.is_settled(),
            messages: self.messages.iter().copied().collect(),
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn pins(&self) -> &P {
        &self.pins
    }

    /// Powered, homed, and not running a program.
    pub fn can_handle_manual_operations(&mut self) -> bool {
        match self.runtime.status() {
            Ok(status) => status.allows_manual_operation(),
            Err(e) => {
                let report = runtime_report(e).wrap_err("reading runtime status");
                self.record_failure("status poll", &report);
                false
            }
        }
    }

    // ── Private: arbitration ─────────────────────────────────────────────────

    fn spindle_on(&self) -> bool {
        self.lever.is_engaged() && !self.cover_open
    }

    fn set_lever(&mut self, lever: SpindleLever) {
        if lever == self.lever {
            return;
        }
        let was_on = self.spindle_on();
        let reversed = self.lever.is_engaged() && lever.is_engaged();
        self.lever = lever;
        tracing::info!(?lever, "spindle lever");
        self.on_signal_change(was_on, reversed);
    }

    fn on_signal_change(&mut self, spindle_was_on: bool, reversed: bool) {
        if !self.can_handle_manual_operations() {
            tracing::debug!("manual operation not permitted; input ignored");
            return;
        }
        let spindle_on = self.spindle_on();
        if spindle_was_on && !spindle_on {
            self.stop_spindle();
        } else if reversed && spindle_on && self.pins.spindle_started() {
            // The restart sequence leaves MDI mode, which ends a running feed.
            if self.state == ManualTurningState::Feeding {
                self.transition_to(ManualTurningState::JoystickResetRequired);
            }
            self.start_spindle();
        }
        let event = derive_event(spindle_on, self.direction, self.rapid);
        self.dispatch(event);
    }

    fn dispatch(&mut self, event: Event) {
        match self.state.next(event) {
            Some(next) => self.transition_to(next),
            None => tracing::trace!(state = %self.state, ?event, "no transition"),
        }
    }

    fn transition_to(&mut self, next: ManualTurningState) {
        let prev = self.state;
        if prev == next {
            if next == ManualTurningState::Jogging {
                self.update_jog();
            }
            return;
        }
        self.exit(prev);
        tracing::info!(from = %prev, to = %next, "state transition");
        self.state = next;
        self.enter(next);
    }

    fn enter(&mut self, state: ManualTurningState) {
        use ManualTurningState as S;
        match state {
            S::Idle => {
                self.pins.set_spindle_started(false);
                self.pins.set_power_feeding(false);
            }
            S::SpindleOnReadyToFeed => {
                if !self.pins.spindle_started() {
                    self.start_spindle();
                }
            }
            S::PreFeedDelay => {
                let deadline = self.clock.deadline_after(self.timing.pre_feed_delay);
                self.timer.arm(deadline);
                tracing::debug!(delay_ms = self.timing.pre_feed_delay.as_millis(), "feed delay armed");
            }
            S::Feeding => self.start_feed(),
            S::Jogging => self.start_jog(),
            S::CannotFeedWithSpindleOff | S::JoystickResetRequired => {
                self.pins.set_power_feeding(false);
                if let Some(msg) = state.advisory() {
                    self.messages.push(msg);
                }
            }
        }
    }

    fn exit(&mut self, state: ManualTurningState) {
        use ManualTurningState as S;
        match state {
            S::PreFeedDelay => self.timer.cancel(),
            S::Feeding => self.stop_feed(),
            S::Jogging => self.stop_jog(),
            S::CannotFeedWithSpindleOff | S::JoystickResetRequired => {
                if let Some(msg) = state.advisory() {
                    self.messages.remove(msg);
                }
            }
            S::Idle | S::SpindleOnReadyToFeed => {}
        }
    }

    // ── Private: actions ─────────────────────────────────────────────────────

    fn start_spindle(&mut self) {
        let Some(direction) = SpindleDirection::from_lever(self.lever) else {
            return;
        };
        let cmd = MdiCommand::SpindleStart(self.spindle.command(direction));
        match self.run_mdi(&cmd, true) {
            Ok(()) => self.pins.set_spindle_started(true),
            Err(e) => self.record_failure("spindle start", &e),
        }
    }

    fn stop_spindle(&mut self) {
        // A running feed is halted before the spindle stops under it.
        self.stop_feed();
        if self.pins.spindle_started() {
            if let Err(e) = self.run_mdi(&MdiCommand::SpindleStop, true) {
                self.record_failure("spindle stop", &e);
            }
            self.pins.set_spindle_started(false);
        }
        self.disable_taper("spindle stopped");
    }

    fn disable_taper(&mut self, reason: &'static str) {
        if self.feed.taper_enabled {
            self.feed.taper_enabled = false;
            tracing::info!(reason, "taper turning disabled");
        }
    }

    fn start_feed(&mut self) {
        let req = FeedRequest {
            direction: self.direction,
            feed_per_rev: self.feed.feed_per_rev,
            taper_angle_deg: self
                .feed
                .taper_enabled
                .then_some(self.feed.taper_angle_deg),
            position: self.position,
        };
        let cmd = match plan_feed(&req, &self.limits.limits()) {
            Ok(cmd) => cmd,
            Err(e) => {
                let report = Report::new(VcpError::from(e));
                self.record_failure("feed planning", &report);
                return;
            }
        };
        match self.run_mdi(&cmd, false) {
            Ok(()) => {
                self.pins.set_power_feeding(true);
                self.joystick_function = JoystickFunction::Feeding;
            }
            Err(e) => self.record_failure("feed start", &e),
        }
    }

    /// Ends the MDI feed move by returning the runtime to manual mode.
    fn stop_feed(&mut self) {
        if self.joystick_function != JoystickFunction::Feeding {
            return;
        }
        self.joystick_function = JoystickFunction::None;
        if let Err(e) = self.switch_mode(TaskMode::Manual) {
            self.record_failure("feed stop", &e);
        }
        self.pins.set_power_feeding(false);
        tracing::info!("feed stopped");
    }

    fn start_jog(&mut self) {
        let (Some(axis), Some(sense)) = (self.direction.axis(), self.direction.sense()) else {
            tracing::debug!("jog armed with joystick centered");
            return;
        };
        if let Err(e) = self.ensure_manual_mode() {
            self.record_failure("jog start", &e);
            return;
        }
        let speed = self.jog.speed_per_sec();
        match self
            .runtime
            .jog(axis, sense, speed)
            .map_err(runtime_report)
            .wrap_err_with(|| format!("jog {axis}"))
        {
            Ok(()) => {
                self.jogged_axis = axis.into();
                self.jog_sense = Some(sense);
                self.joystick_function = JoystickFunction::Jogging;
                tracing::info!(%axis, ?sense, speed, "jog started");
            }
            Err(e) => self.record_failure("jog start", &e),
        }
    }

    fn stop_jog(&mut self) {
        if let Some(axis) = self.jogged_axis.axis() {
            match self
                .runtime
                .jog_stop(axis)
                .map_err(runtime_report)
                .wrap_err_with(|| format!("jog stop {axis}"))
            {
                Ok(()) => tracing::info!(%axis, "jog stopped"),
                Err(e) => self.record_failure("jog stop", &e),
            }
        }
        self.jogged_axis = JoggedAxis::None;
        self.jog_sense = None;
        if self.joystick_function == JoystickFunction::Jogging {
            self.joystick_function = JoystickFunction::None;
        }
    }

    /// Jogging self-transition: re-issue only when axis or sense changed.
    fn update_jog(&mut self) {
        let wanted = self.direction.axis().zip(self.direction.sense());
        let active = self.jogged_axis.axis().zip(self.jog_sense);
        if wanted == active {
            tracing::trace!("jog unchanged");
            return;
        }
        if active.is_some() {
            self.stop_jog();
        }
        if wanted.is_some() {
            self.start_jog();
        }
    }

    // ── Private: runtime protocol ────────────────────────────────────────────

    fn switch_mode(&mut self, mode: TaskMode) -> Result<()> {
        self.runtime
            .set_mode(mode)
            .map_err(runtime_report)
            .wrap_err_with(|| format!("switching to {mode:?} mode"))?;
        self.runtime
            .wait_complete()
            .map_err(runtime_report)
            .wrap_err("waiting for mode switch")
    }

    fn ensure_manual_mode(&mut self) -> Result<()> {
        let status = self
            .runtime
            .status()
            .map_err(runtime_report)
            .wrap_err("reading runtime status")?;
        if status.mode == TaskMode::Manual {
            Ok(())
        } else {
            self.switch_mode(TaskMode::Manual)
        }
    }

    /// MDI protocol: switch to MDI, submit, and optionally return to manual.
    ///
    /// Feed moves stay in MDI mode; leaving it is how the feed is stopped.
    /// An active jog is stopped first since it does not survive the switch to
    /// MDI; a Jogging self-transition re-issues it afterwards.
    fn run_mdi(&mut self, cmd: &MdiCommand, return_to_manual: bool) -> Result<()> {
        let text = cmd.to_string();
        if self.jogged_axis.axis().is_some() {
            self.stop_jog();
        }
        self.switch_mode(TaskMode::Mdi)?;
        self.runtime
            .mdi(&text)
            .map_err(runtime_report)
            .wrap_err_with(|| format!("mdi `{text}`"))?;
        tracing::info!(command = %text, "mdi issued");
        if return_to_manual {
            self.switch_mode(TaskMode::Manual)?;
        }
        Ok(())
    }

    fn record_failure(&mut self, action: &'static str, err: &Report) {
        tracing::warn!(error = %format!("{err:#}"), action, "runtime action failed");
        let typed = err
            .downcast_ref::<VcpError>()
            .cloned()
            .unwrap_or_else(|| VcpError::Runtime(format!("{err:#}")));
        self.last_error = Some(typed);
    }
}
