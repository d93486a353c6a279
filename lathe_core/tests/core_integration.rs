use lathe_core::mocks::{RecordedCall, RecordingPins, RecordingRuntime};
use lathe_core::{
    JoggedAxis, JoystickDirection as J, JoystickFunction, ManualTurningCore,
    ManualTurningState as S, PanelInput, PathError, Position, SoftLimits, SpindleMode,
    UserMessage, VcpError,
};
use lathe_traits::{Axis, LimitPin, ManualClock, Sense, TaskMode};

type Core = ManualTurningCore<RecordingRuntime, RecordingPins>;

const AXES: SoftLimits = SoftLimits::new(0.0, 140.0, -500.0, 0.0);

fn core() -> (Core, ManualClock) {
    let clock = ManualClock::new();
    let core = ManualTurningCore::builder()
        .with_runtime(RecordingRuntime::new())
        .with_pins(RecordingPins::new())
        .with_axes(AXES)
        .with_clock(clock.clone())
        .build()
        .expect("build core");
    (core, clock)
}

/// Spindle forward, joystick deflected, delay elapsed.
fn feeding(direction: J) -> (Core, ManualClock) {
    let (mut core, clock) = core();
    core.on_spindle_switch_fwd(true);
    core.on_joystick(direction, true);
    clock.advance_ms(300);
    assert!(core.poll_timers());
    assert_eq!(core.state(), S::Feeding);
    (core, clock)
}

#[test]
fn spindle_start_uses_mdi_protocol() {
    let (mut core, _clock) = core();
    core.on_spindle_switch_fwd(true);

    assert_eq!(core.state(), S::SpindleOnReadyToFeed);
    assert!(core.pins().spindle_started);
    assert_eq!(
        core.runtime().calls,
        vec![
            RecordedCall::SetMode(TaskMode::Mdi),
            RecordedCall::WaitComplete,
            RecordedCall::Mdi("M3 G97 S300".into()),
            RecordedCall::SetMode(TaskMode::Manual),
            RecordedCall::WaitComplete,
        ]
    );
}

#[test]
fn css_mode_reverse_spindle() {
    let (mut core, _clock) = core();
    core.set_spindle_mode(SpindleMode::Css);
    core.set_surface_speed(180);
    core.set_max_rpm(2500);
    core.on_spindle_switch_rev(true);
    assert_eq!(core.runtime().mdi_commands(), vec!["M4 G96 S180 D2500"]);
}

#[test]
fn feed_starts_only_after_delay() {
    let (mut core, clock) = core();
    core.on_spindle_switch_fwd(true);
    core.on_joystick(J::XPlus, true);
    assert_eq!(core.state(), S::PreFeedDelay);
    assert!(core.next_deadline().is_some());

    clock.advance_ms(299);
    assert!(!core.poll_timers());
    assert!(core.runtime().feed_commands().is_empty());

    clock.advance_ms(1);
    assert!(core.poll_timers());
    assert_eq!(core.state(), S::Feeding);
    assert_eq!(core.runtime().feed_commands(), vec!["G95 F0.100 G53 G1 X139.999"]);
    assert!(core.pins().power_feeding);
    assert_eq!(core.joystick_function(), JoystickFunction::Feeding);
    // feed moves stay in MDI mode
    assert_eq!(core.runtime().status.mode, TaskMode::Mdi);
}

#[test]
fn releasing_joystick_stops_feed() {
    let (mut core, _clock) = feeding(J::ZMinus);
    core.runtime_mut().clear();
    core.on_joystick(J::ZMinus, false);

    assert_eq!(core.state(), S::SpindleOnReadyToFeed);
    assert!(!core.pins().power_feeding);
    assert_eq!(core.joystick_function(), JoystickFunction::None);
    assert_eq!(
        core.runtime().calls,
        vec![
            RecordedCall::SetMode(TaskMode::Manual),
            RecordedCall::WaitComplete
        ]
    );
    // spindle keeps running; no second start
    assert!(core.runtime().mdi_commands().is_empty());
}

#[test]
fn rapid_during_delay_jogs_and_never_feeds() {
    let (mut core, clock) = core();
    core.on_spindle_switch_fwd(true);
    core.on_joystick(J::XMinus, true);
    core.on_rapid(true);

    assert_eq!(core.state(), S::Jogging);
    assert_eq!(core.next_deadline(), None);
    clock.advance_ms(5_000);
    assert!(!core.poll_timers());
    assert!(core.runtime().feed_commands().is_empty());
    assert_eq!(core.runtime().jogs(), vec![(Axis::X, Sense::Minus)]);
    assert_eq!(core.jogged_axis(), JoggedAxis::X);
}

#[test]
fn jog_speed_is_per_second() {
    let (mut core, _clock) = core();
    core.set_jog_speed(900.0);
    core.on_rapid(true);
    core.on_joystick(J::ZPlus, true);
    let speed = core.runtime().calls.iter().find_map(|c| match c {
        RecordedCall::Jog { speed, .. } => Some(*speed),
        _ => None,
    });
    assert_eq!(speed, Some(15.0));
}

#[test]
fn jogging_follows_direction_changes_and_stops_on_exit() {
    let (mut core, _clock) = core();
    core.on_rapid(true);
    assert_eq!(core.state(), S::Jogging);
    assert!(core.runtime().jogs().is_empty());

    core.on_joystick(J::ZMinus, true);
    assert_eq!(core.runtime().jogs(), vec![(Axis::Z, Sense::Minus)]);

    core.on_joystick(J::ZMinus, false);
    assert_eq!(core.runtime().jog_stops(), vec![Axis::Z]);
    assert_eq!(core.jogged_axis(), JoggedAxis::None);

    core.on_joystick(J::XPlus, true);
    assert_eq!(core.runtime().jogs().len(), 2);

    // releasing rapid with the joystick held: reset required, jog stopped
    core.on_rapid(false);
    assert_eq!(core.state(), S::JoystickResetRequired);
    assert_eq!(core.runtime().jog_stops(), vec![Axis::Z, Axis::X]);
    assert_eq!(core.messages().top(), Some(UserMessage::JoystickResetRequired));
}

#[test]
fn feed_to_jog_switches_back_to_manual_first() {
    let (mut core, _clock) = feeding(J::XPlus);
    core.runtime_mut().clear();
    core.on_rapid(true);
    assert_eq!(core.state(), S::Jogging);
    let calls = &core.runtime().calls;
    assert_eq!(calls[0], RecordedCall::SetMode(TaskMode::Manual));
    assert!(matches!(
        calls.last(),
        Some(RecordedCall::Jog {
            axis: Axis::X,
            sense: Sense::Plus,
            ..
        })
    ));
}

#[test]
fn feeding_without_spindle_shows_advisory() {
    let (mut core, _clock) = core();
    core.on_joystick(J::XPlus, true);
    assert_eq!(core.state(), S::CannotFeedWithSpindleOff);
    assert_eq!(
        core.messages().iter().copied().collect::<Vec<_>>(),
        vec![UserMessage::CannotFeedWithSpindleOff]
    );
    assert!(core.runtime().calls.is_empty());

    core.on_joystick(J::XPlus, false);
    assert_eq!(core.state(), S::Idle);
    assert!(core.messages().is_empty());
}

#[test]
fn spindle_on_with_joystick_held_requires_reset() {
    let (mut core, _clock) = core();
    core.on_joystick(J::ZPlus, true);
    core.on_spindle_switch_fwd(true);
    assert_eq!(core.state(), S::JoystickResetRequired);
    assert!(!core.pins().spindle_started);
    assert!(core.runtime().feed_commands().is_empty());

    core.on_joystick(J::ZPlus, false);
    assert_eq!(core.state(), S::SpindleOnReadyToFeed);
    assert!(core.pins().spindle_started);
    assert!(core.messages().is_empty());
}

#[test]
fn stopping_spindle_mid_feed_halts_feed_then_spindle() {
    let (mut core, _clock) = feeding(J::XPlus);
    core.runtime_mut().clear();
    core.on_spindle_switch_fwd(false);

    assert_eq!(core.state(), S::JoystickResetRequired);
    assert!(!core.pins().power_feeding);
    assert!(!core.pins().spindle_started);
    let calls = &core.runtime().calls;
    assert_eq!(calls[0], RecordedCall::SetMode(TaskMode::Manual));
    assert_eq!(core.runtime().mdi_commands(), vec!["M5"]);

    // releasing the joystick clears the interlock
    core.on_joystick(J::XPlus, false);
    assert_eq!(core.state(), S::Idle);
}

#[test]
fn reset_required_ignores_further_deflections() {
    let (mut core, clock) = feeding(J::XPlus);
    core.on_spindle_switch_fwd(false);
    assert_eq!(core.state(), S::JoystickResetRequired);
    core.on_spindle_switch_fwd(true);
    assert_eq!(core.state(), S::JoystickResetRequired);
    core.on_joystick(J::ZMinus, true);
    clock.advance_ms(1_000);
    core.poll_timers();
    assert_eq!(core.state(), S::JoystickResetRequired);
    assert_eq!(core.messages().len(), 1);
    assert_eq!(core.runtime().feed_commands().len(), 1);
}

#[test]
fn opening_cover_counts_as_spindle_off() {
    let (mut core, _clock) = core();
    core.on_spindle_switch_fwd(true);
    core.on_spindle_cover(true);
    assert_eq!(core.state(), S::Idle);
    assert_eq!(core.runtime().mdi_commands(), vec!["M3 G97 S300", "M5"]);

    core.on_spindle_cover(false);
    assert_eq!(core.state(), S::SpindleOnReadyToFeed);
    assert_eq!(
        core.runtime().mdi_commands(),
        vec!["M3 G97 S300", "M5", "M3 G97 S300"]
    );
}

#[test]
fn lever_reversal_restarts_spindle() {
    let (mut core, _clock) = core();
    core.on_spindle_switch_fwd(true);
    core.on_spindle_switch_rev(true);
    assert_eq!(core.runtime().mdi_commands(), vec!["M3 G97 S300", "M4 G97 S300"]);
    assert_eq!(core.state(), S::SpindleOnReadyToFeed);
}

#[test]
fn inputs_ignored_when_machine_not_ready() {
    let (mut core, _clock) = core();
    core.runtime_mut().status.all_homed = false;
    core.on_spindle_switch_fwd(true);
    core.on_joystick(J::XPlus, true);
    assert_eq!(core.state(), S::Idle);
    assert!(core.runtime().calls.is_empty());

    core.runtime_mut().status.all_homed = true;
    core.runtime_mut().status.mode = TaskMode::Auto;
    core.on_rapid(true);
    assert_eq!(core.state(), S::Idle);
    assert!(core.runtime().calls.is_empty());
}

#[test]
fn taper_feed_uses_position_and_angle() {
    let (mut core, clock) = core();
    core.set_taper_enabled(true);
    core.set_taper_angle(45.0);
    core.on_position(Position::new(10.0, -100.0));
    core.on_spindle_switch_fwd(true);
    core.on_joystick(J::XMinus, true);
    clock.advance_ms(300);
    core.poll_timers();
    // start (20, -100), corner (0, 0): adjacent 10
    assert_eq!(
        core.runtime().feed_commands(),
        vec!["G95 F0.100 G40 G7 G53 G1 X0.000 Z-90.000"]
    );
}

#[test]
fn taper_without_position_records_error_and_issues_nothing() {
    let (mut core, clock) = core();
    core.set_taper_enabled(true);
    core.on_spindle_switch_fwd(true);
    core.on_joystick(J::ZPlus, true);
    clock.advance_ms(300);
    core.poll_timers();
    assert_eq!(core.state(), S::Feeding);
    assert!(core.runtime().feed_commands().is_empty());
    assert!(!core.pins().power_feeding);
    assert_eq!(
        core.last_error(),
        Some(&VcpError::Path(PathError::UnknownPosition))
    );
}

#[test]
fn taper_turns_off_on_spindle_stop_and_cycle_stop() {
    let (mut core, _clock) = core();
    core.set_taper_enabled(true);
    core.on_spindle_switch_fwd(true);
    core.on_spindle_switch_fwd(false);
    assert!(!core.feed_cfg().taper_enabled);

    core.set_taper_enabled(true);
    core.on_cycle_stop(true);
    assert!(!core.feed_cfg().taper_enabled);
}

#[test]
fn readouts_report_feed_and_rpm() {
    let (mut core, _clock) = feeding(J::XPlus);
    core.apply(PanelInput::FeedOverride(0.5));
    core.apply(PanelInput::SpindleRpm(-523.6));
    let st = core.snapshot();
    assert_eq!(st.actual_rpm, 524);
    assert!((st.actual_feed - 0.05).abs() < 1e-12);
    assert!(st.power_feeding && st.spindle_started);
    assert_eq!(st.state, S::Feeding);

    core.on_joystick(J::XPlus, false);
    assert_eq!(core.actual_feed(), 0.0);
}

#[test]
fn runtime_rejection_is_recorded_not_raised() {
    let (mut core, _clock) = core();
    core.runtime_mut().fail_mdi = Some("command rejected: spindle fault".into());
    core.on_spindle_switch_fwd(true);
    assert_eq!(core.state(), S::SpindleOnReadyToFeed);
    assert!(!core.pins().spindle_started);
    assert!(matches!(core.last_error(), Some(VcpError::Rejected(_))));
    assert!(core.snapshot().last_error.is_some());
}

#[test]
fn limit_changes_reach_planner_and_pins() {
    let (mut core, clock) = core();
    core.set_custom_limit(LimitPin::XMax, Some(60.0)).unwrap();
    core.set_custom_limit_active(LimitPin::XMax, true).unwrap();
    assert_eq!(core.soft_limits().x_max, 60.0);

    core.on_position(Position::new(30.0, -50.0));
    assert_eq!(core.pins().limit(LimitPin::XMax), Some(60.0));
    assert!(core.snapshot().limits_applied);

    core.on_spindle_switch_fwd(true);
    core.on_joystick(J::XPlus, true);
    clock.advance_ms(300);
    core.poll_timers();
    assert_eq!(core.runtime().feed_commands(), vec!["G95 F0.100 G53 G1 X59.999"]);
}

#[test]
fn rejected_limit_change_surfaces_typed_error() {
    let (mut core, _clock) = core();
    core.set_chuck_active(true).unwrap();
    let err = core.set_chuck_limit(600.0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<VcpError>(),
        Some(VcpError::Limits(_))
    ));
    assert_eq!(core.soft_limits(), AXES);
}

#[test]
fn limit_subscribers_see_every_change() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let (mut core, _clock) = core();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    core.subscribe_limits(move |l| sink.borrow_mut().push(l.z_max));
    core.set_tailstock_limit(25.0).unwrap();
    core.set_tailstock_limit(30.0).unwrap();
    assert_eq!(*seen.borrow(), vec![-25.0, -30.0]);
}
