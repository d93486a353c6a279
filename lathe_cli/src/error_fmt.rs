//! Human-readable error descriptions and structured JSON error formatting.

use lathe_core::error::{BuildError, LimitsError, PathError, VcpError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingRuntime => {
                "What happened: No motion runtime was provided to the turning core.\nLikely causes: The simulator or controller connection was not wired into the builder.\nHow to fix: Pass a runtime via with_runtime(...).".to_string()
            }
            BuildError::MissingPins => {
                "What happened: No indicator pins were provided to the turning core.\nLikely causes: The pin bank was not wired into the builder.\nHow to fix: Pass a pin bank via with_pins(...).".to_string()
            }
            BuildError::MissingAxes => {
                "What happened: The default axis envelope is unknown.\nLikely causes: The [axes] section was not applied to the builder.\nHow to fix: Add x_min, x_max, z_min and z_max under [axes] in the config.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(ve) = err.downcast_ref::<VcpError>() {
        return match ve {
            VcpError::Limits(le) => limits_text(le),
            VcpError::Path(pe) => path_text(pe),
            VcpError::Rejected(reason) => format!(
                "What happened: The motion runtime rejected a command ({reason}).\nLikely causes: Machine not homed, wrong task mode, or an interpreter error.\nHow to fix: Home the machine, check the runtime log, then retry."
            ),
            VcpError::Runtime(msg) => format!(
                "What happened: The motion runtime failed ({msg}).\nLikely causes: Runtime not running or the command channel closed.\nHow to fix: Restart the runtime and re-run with --log-level=debug for more detail."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if let Some(le) = err.downcast_ref::<LimitsError>() {
        return limits_text(le);
    }
    if let Some(pe) = err.downcast_ref::<PathError>() {
        return path_text(pe);
    }

    // String-based heuristics for errors coming from config or scenario loading
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") || lower.contains("read scenario") {
        return format!(
            "What happened: A file could not be read.\nLikely causes: Wrong path or missing permissions.\nHow to fix: Check the path passed via --config or --scenario. Original: {msg}"
        );
    }

    if lower.contains("parse config") || lower.contains("parse scenario") {
        return format!(
            "What happened: A TOML file could not be parsed.\nLikely causes: Syntax error, unknown input name, or a missing [axes] section.\nHow to fix: Fix the file at the reported line. Original: {msg}"
        );
    }

    if lower.contains("scenario") {
        return format!(
            "What happened: The scenario file is invalid.\nLikely causes: {msg}.\nHow to fix: Edit the [[step]] tables and try again."
        );
    }

    if lower.contains("must be") {
        return format!(
            "What happened: Configuration is invalid.\nLikely causes: {msg}.\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn limits_text(e: &LimitsError) -> String {
    match e {
        LimitsError::Inverted { axis, min, max } => format!(
            "What happened: The {axis} soft limits would cross (min {min:.3} > max {max:.3}).\nLikely causes: Chuck and tailstock clearances or custom limits leave no travel.\nHow to fix: Reduce the clearances or widen the custom limits."
        ),
        LimitsError::NonFinite(what) => format!(
            "What happened: {what} is not a finite number.\nLikely causes: A NaN or infinite value reached the limit inputs.\nHow to fix: Enter a finite value."
        ),
    }
}

fn path_text(e: &PathError) -> String {
    match e {
        PathError::InvalidAngle(deg) => format!(
            "What happened: Taper angle {deg} deg is outside (0, 90].\nLikely causes: Angle left at 0 or entered in the wrong unit.\nHow to fix: Pass --angle between 0 (exclusive) and 90, or fix feed.taper_angle_deg."
        ),
        PathError::UnknownPosition => {
            "What happened: Taper turning needs the tool position.\nLikely causes: No position was given.\nHow to fix: Pass both --x and --z.".to_string()
        }
        PathError::NoDirection => {
            "What happened: No feed direction was given.\nLikely causes: Joystick centered.\nHow to fix: Pass --direction.".to_string()
        }
    }
}

/// Stable reason name used as the JSON `reason` and to pick the exit code.
pub fn reason_name(err: &eyre::Report) -> &'static str {
    if err.downcast_ref::<BuildError>().is_some() {
        return "Build";
    }
    match err.downcast_ref::<VcpError>() {
        Some(VcpError::Limits(_)) => return "Limits",
        Some(VcpError::Path(_)) => return "Path",
        Some(VcpError::Rejected(_)) => return "Rejected",
        Some(VcpError::Runtime(_)) => return "Runtime",
        Some(_) => return "Error",
        None => {}
    }
    if err.downcast_ref::<LimitsError>().is_some() {
        return "Limits";
    }
    if err.downcast_ref::<PathError>().is_some() {
        return "Path";
    }
    "Error"
}

/// Map typed errors to stable exit codes; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match reason_name(err) {
        "Build" => 3,
        "Limits" => 4,
        "Path" => 5,
        "Rejected" | "Runtime" => 6,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    json!({
        "reason": reason_name(err),
        "message": humanize(err),
        "error": format!("{err:#}"),
    })
    .to_string()
}
