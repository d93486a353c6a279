//! Offline commands: composed limits, feed planning, and the self-check.

use eyre::WrapErr;
use lathe_config::Config;
use lathe_core::error::VcpError;
use lathe_core::{
    FeedRequest, LimitInputs, ManualTurningCore, Position, SoftLimits, SoftLimitsHandler,
    plan_feed,
};
use lathe_hardware::SimulatedPins;
use serde_json::json;

use crate::cli::Direction;
use crate::simulate::sim_runtime;

/// Envelope from `[axes]` tightened by `[limits]`, with optional overrides.
pub fn composed_limits(
    cfg: &Config,
    chuck: Option<f64>,
    tailstock: Option<f64>,
) -> eyre::Result<SoftLimits> {
    let defaults = SoftLimits::from(&cfg.axes);
    let mut inputs = LimitInputs::from(&cfg.limits);
    if let Some(c) = chuck {
        inputs.chuck_limit = c;
        inputs.chuck_active = true;
    }
    if let Some(t) = tailstock {
        inputs.tailstock_limit = t;
    }
    let handler = SoftLimitsHandler::with_inputs(defaults, inputs)
        .map_err(|e| eyre::Report::new(VcpError::from(e)))
        .wrap_err("composing soft limits")?;
    Ok(handler.limits())
}

pub fn run_limits(
    cfg: &Config,
    chuck: Option<f64>,
    tailstock: Option<f64>,
    json_mode: bool,
) -> eyre::Result<()> {
    let l = composed_limits(cfg, chuck, tailstock)?;
    if json_mode {
        println!(
            "{}",
            json!({ "x_min": l.x_min, "x_max": l.x_max, "z_min": l.z_min, "z_max": l.z_max })
        );
    } else {
        println!("X: {:.3} .. {:.3}", l.x_min, l.x_max);
        println!("Z: {:.3} .. {:.3}", l.z_min, l.z_max);
    }
    Ok(())
}

pub fn run_plan(
    cfg: &Config,
    direction: Direction,
    angle: Option<f64>,
    x: Option<f64>,
    z: Option<f64>,
    json_mode: bool,
) -> eyre::Result<()> {
    let limits = composed_limits(cfg, None, None)?;
    let taper_angle_deg = angle.or_else(|| cfg.feed.taper_enabled.then_some(cfg.feed.taper_angle_deg));
    let position = match (x, z) {
        (Some(x), Some(z)) => Some(Position::new(x, z)),
        _ => None,
    };
    let req = FeedRequest {
        direction: direction.into(),
        feed_per_rev: cfg.feed.feed_per_rev,
        taper_angle_deg,
        position,
    };
    let cmd = plan_feed(&req, &limits)
        .map_err(|e| eyre::Report::new(VcpError::from(e)))
        .wrap_err("planning feed move")?;
    tracing::debug!(command = %cmd, "planned feed");

    if json_mode {
        println!(
            "{}",
            json!({ "command": cmd.to_string(), "taper": taper_angle_deg.is_some() })
        );
    } else {
        println!("{cmd}");
    }
    Ok(())
}

/// Build the core against the simulator and cycle the spindle once.
pub fn run_self_check(cfg: &Config, json_mode: bool) -> eyre::Result<()> {
    let limits = composed_limits(cfg, None, None)?;
    let mut core = ManualTurningCore::builder()
        .with_config(cfg)
        .with_runtime(sim_runtime(cfg))
        .with_pins(SimulatedPins::new())
        .build()
        .wrap_err("building turning core")?;

    if !core.can_handle_manual_operations() {
        eyre::bail!("simulated machine is not ready for manual operation (check [sim] powered/homed/mode)");
    }
    core.on_spindle_switch_fwd(true);
    core.on_spindle_switch_fwd(false);
    if let Some(err) = core.last_error() {
        return Err(eyre::Report::new(err.clone()).wrap_err("spindle start/stop against the simulator"));
    }

    if json_mode {
        println!(
            "{}",
            json!({
                "ok": true,
                "limits": { "x_min": limits.x_min, "x_max": limits.x_max, "z_min": limits.z_min, "z_max": limits.z_max },
                "mdi": core.runtime().mdi_history(),
            })
        );
    } else {
        println!("OK");
    }
    Ok(())
}
