mod cli;
mod error_fmt;
mod plan;
mod simulate;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let verbose = matches!(cli.log_level.as_str(), "debug" | "trace");

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
            if verbose {
                eprintln!("\n{e:?}");
            }
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> eyre::Result<()> {
    if !cli.json {
        color_eyre::install()?;
    }

    let cfg = lathe_config::load_file(&cli.config)?;
    cfg.validate().wrap_err("invalid configuration")?;
    init_tracing(&cli, &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Simulate {
            scenario,
            realtime,
            settle_ms,
            fail_on_error,
        } => simulate::run_simulate(&cfg, &scenario, realtime, settle_ms, fail_on_error, cli.json),
        Commands::Limits { chuck, tailstock } => plan::run_limits(&cfg, chuck, tailstock, cli.json),
        Commands::Plan {
            direction,
            angle,
            x,
            z,
        } => plan::run_plan(&cfg, direction, angle, x, z, cli.json),
        Commands::SelfCheck => plan::run_self_check(&cfg, cli.json),
    }
}

/// Console layer (pretty or JSON) on stderr, plus an optional JSON file layer from `[logging]`.
fn init_tracing(cli: &Cli, logging: &lathe_config::Logging) -> eyre::Result<()> {
    let console_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let json_console = cli.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter())
    });
    let pretty_console = (!cli.json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(console_filter())
    });

    let file_layer = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file must name a file: {file:?}"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let level = logging.level.as_deref().unwrap_or("info");
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(EnvFilter::new(level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(json_console)
        .with(pretty_console)
        .with(file_layer)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
