//! # Ironvale Sim
//!
//! Runs the simulation core headless for a configured duration.
//!
//! ```text
//! ironvale-sim [config.toml] [--json-logs] [--write-config <path>]
//! ```

use anyhow::{bail, Result};
use ironvale_engine::{run, SimConfig, CONFIG_FILE};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    json_logs: bool,
    write_config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json-logs" => args.json_logs = true,
            "--write-config" => match iter.next() {
                Some(path) => args.write_config = Some(PathBuf::from(path)),
                None => bail!("--write-config needs a path"),
            },
            flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
            path => args.config = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

/// Main entry point.
fn main() -> Result<()> {
    let args = parse_args()?;

    let filter = EnvFilter::from_default_env().add_directive("ironvale=info".parse()?);
    if args.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
    }

    info!("Ironvale sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = args.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let mut config = SimConfig::load_from(&path);
    config.validate();

    if let Some(out) = args.write_config {
        config.save_to(&out)?;
        return Ok(());
    }

    let summary = run(&config)?;
    info!(
        "Survived {:.1}s with {} kills ({} xp)",
        summary.sim_seconds, summary.enemies_killed, summary.xp_earned
    );

    info!("Ironvale sim shutdown complete");
    Ok(())
}
