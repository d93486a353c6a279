//! Single-threaded dispatcher for the turning core.
//!
//! Pin listeners and the position feed send `PanelInput`s over a channel; the
//! loop applies them in arrival order and fires the feed-delay timer on the
//! same thread, so every event is handled to completion before the next.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use lathe_traits::{IndicatorPins, ManualClock, MotionRuntime};

use crate::core::ManualTurningCore;
use crate::input::PanelInput;

/// Upper bound on one wait when no timer is pending, so shutdown is noticed.
pub const IDLE_TICK: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Disconnected,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub inputs: usize,
    pub timers_fired: usize,
    pub reason: StopReason,
}

/// Drain inputs until the channel disconnects or `shutdown` is set.
pub fn run<R, P>(
    core: &mut ManualTurningCore<R, P>,
    rx: &Receiver<PanelInput>,
    shutdown: &AtomicBool,
) -> RunSummary
where
    R: MotionRuntime,
    P: IndicatorPins,
{
    let mut inputs = 0usize;
    let mut timers_fired = 0usize;
    tracing::info!("dispatcher start");

    let reason = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        let wait = core.time_to_deadline().map_or(IDLE_TICK, |d| d.min(IDLE_TICK));

        match rx.recv_timeout(wait) {
            Ok(input) => {
                inputs += 1;
                core.apply(input);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break StopReason::Disconnected,
        }
        if core.poll_timers() {
            timers_fired += 1;
        }
    };

    tracing::info!(inputs, timers_fired, ?reason, "dispatcher stop");
    RunSummary {
        inputs,
        timers_fired,
        reason,
    }
}

/// Replay timed inputs against a core driven by a `ManualClock`.
///
/// Timers whose deadline falls before an input's offset fire first, at their
/// deadline. After the last input the clock runs on for `settle` so a pending
/// feed delay can still expire.
pub fn replay<R, P, I>(
    core: &mut ManualTurningCore<R, P>,
    clock: &ManualClock,
    steps: I,
    settle: Duration,
) -> RunSummary
where
    R: MotionRuntime,
    P: IndicatorPins,
    I: IntoIterator<Item = (Duration, PanelInput)>,
{
    use lathe_traits::Clock;

    let epoch = clock.now();
    let mut inputs = 0usize;
    let mut timers_fired = 0usize;
    let mut last = Duration::ZERO;

    let advance_to = |core: &mut ManualTurningCore<R, P>, at: Duration| -> usize {
        let target = epoch + at;
        let mut fired = 0;
        while let Some(deadline) = core.next_deadline() {
            if deadline > target {
                break;
            }
            clock.advance(deadline.saturating_duration_since(clock.now()));
            if core.poll_timers() {
                fired += 1;
            }
        }
        clock.advance(target.saturating_duration_since(clock.now()));
        fired
    };

    for (at, input) in steps {
        timers_fired += advance_to(core, at);
        core.apply(input);
        inputs += 1;
        last = last.max(at);
    }
    timers_fired += advance_to(core, last + settle);

    RunSummary {
        inputs,
        timers_fired,
        reason: StopReason::Disconnected,
    }
}
