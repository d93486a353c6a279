//! Scenario replay against the simulated runtime.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use eyre::WrapErr;
use lathe_config::{Config, Scenario};
use lathe_core::runner::{RunSummary, replay, run};
use lathe_core::{ManualTurningCore, PanelInput, conversions::task_mode};
use lathe_hardware::{RuntimeCall, SimulatedPins, SimulatedRuntime};
use lathe_traits::ManualClock;
use serde_json::json;

type SimCore = ManualTurningCore<SimulatedRuntime, SimulatedPins>;

/// Simulator in the start state the `[sim]` section describes.
pub fn sim_runtime(cfg: &Config) -> SimulatedRuntime {
    SimulatedRuntime::new()
        .with_state(cfg.sim.powered, cfg.sim.homed, task_mode(cfg.sim.mode))
        .with_mode_latency(Duration::from_millis(cfg.sim.mode_latency_ms))
}

fn timed_inputs(scenario: &Scenario) -> Vec<(Duration, PanelInput)> {
    scenario
        .steps
        .iter()
        .map(|s| (Duration::from_millis(s.at_ms), PanelInput::from(&s.input)))
        .collect()
}

pub fn run_simulate(
    cfg: &Config,
    scenario_path: &Path,
    realtime: bool,
    settle_ms: u64,
    fail_on_error: bool,
    json_mode: bool,
) -> eyre::Result<()> {
    let scenario = lathe_config::load_scenario_file(scenario_path)?;
    let steps = timed_inputs(&scenario);
    let settle = Duration::from_millis(settle_ms);
    tracing::info!(steps = steps.len(), realtime, "simulate start");

    let (core, summary) = if realtime {
        run_realtime(cfg, steps, settle)?
    } else {
        let clock = ManualClock::new();
        let mut core = ManualTurningCore::builder()
            .with_config(cfg)
            .with_runtime(sim_runtime(cfg))
            .with_pins(SimulatedPins::new())
            .with_clock(clock.clone())
            .build()
            .wrap_err("building turning core")?;
        let summary = replay(&mut core, &clock, steps, settle);
        (core, summary)
    };

    print_report(&core, &summary, json_mode);

    if fail_on_error && let Some(err) = core.last_error() {
        return Err(eyre::Report::new(err.clone()).wrap_err("scenario finished with a runtime error"));
    }
    Ok(())
}

fn run_realtime(
    cfg: &Config,
    steps: Vec<(Duration, PanelInput)>,
    settle: Duration,
) -> eyre::Result<(SimCore, RunSummary)> {
    let mut core = ManualTurningCore::builder()
        .with_config(cfg)
        .with_runtime(sim_runtime(cfg))
        .with_pins(SimulatedPins::new())
        .build()
        .wrap_err("building turning core")?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler; continuing without it");
        }
    }

    let (tx, rx) = crossbeam_channel::unbounded::<PanelInput>();
    let feeder = std::thread::Builder::new()
        .name("scenario-feeder".into())
        .spawn(move || {
            let start = Instant::now();
            let mut last = Duration::ZERO;
            for (at, input) in steps {
                std::thread::sleep((start + at).saturating_duration_since(Instant::now()));
                if tx.send(input).is_err() {
                    return;
                }
                last = last.max(at);
            }
            std::thread::sleep((start + last + settle).saturating_duration_since(Instant::now()));
        })
        .wrap_err("spawn scenario feeder")?;

    let summary = run(&mut core, &rx, &shutdown);
    drop(rx);
    if feeder.join().is_err() {
        tracing::warn!("scenario feeder panicked");
    }
    Ok((core, summary))
}

fn journal_line(call: &RuntimeCall) -> String {
    match call {
        RuntimeCall::Mode(mode) => format!("mode {mode:?}"),
        RuntimeCall::WaitComplete => "wait".to_string(),
        RuntimeCall::Mdi(cmd) => format!("mdi {cmd}"),
        RuntimeCall::Jog { axis, sense, speed } => format!("jog {axis} {sense:?} {speed:.3}/s"),
        RuntimeCall::JogStop(axis) => format!("jog-stop {axis}"),
    }
}

fn print_report(core: &SimCore, summary: &RunSummary, json_mode: bool) {
    let status = core.snapshot();
    let commands: Vec<String> = core
        .runtime()
        .journal()
        .iter()
        .filter(|c| !matches!(c, RuntimeCall::WaitComplete))
        .map(journal_line)
        .collect();

    if json_mode {
        let l = status.limits;
        let obj = json!({
            "state": status.state.to_string(),
            "inputs": summary.inputs,
            "timers_fired": summary.timers_fired,
            "stop_reason": format!("{:?}", summary.reason),
            "spindle_started": status.spindle_started,
            "power_feeding": status.power_feeding,
            "commands": commands,
            "mdi": core.runtime().mdi_history(),
            "limits": { "x_min": l.x_min, "x_max": l.x_max, "z_min": l.z_min, "z_max": l.z_max },
            "limits_applied": status.limits_applied,
            "messages": status.messages.iter().map(|m| m.text()).collect::<Vec<_>>(),
            "last_error": status.last_error,
        });
        println!("{obj}");
        return;
    }

    for line in &commands {
        println!("  {line}");
    }
    println!(
        "Simulation finished: {} inputs, {} feed delays expired, final state {}",
        summary.inputs, summary.timers_fired, status.state
    );
    println!(
        "Spindle started: {}  Power feeding: {}",
        status.spindle_started, status.power_feeding
    );
    for msg in &status.messages {
        println!("Advisory: {}", msg.text());
    }
    if let Some(err) = &status.last_error {
        println!("Last runtime error: {err}");
    }
}
