use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use drill_core::{
    load_drill_config_from_env, load_drill_config_or_builtin, DrillConfig, DrillSession, Exit,
    TrackId,
};
use tracing::info;

mod app;
mod command_text;
mod driver;
mod xp;

use app::{run_console, ConsoleApp, ConsoleOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Timed incident-response drill", long_about = None)]
struct Cli {
    /// Learning track whose fault catalog drives the drill.
    #[arg(long, default_value = "LIGHTNING_OPERATOR")]
    track: String,
    /// Seed for the spawn generator; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Enable the `debug` overlay (decay totals and first remedies).
    #[arg(long)]
    debug: bool,
    /// Override the tick period in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,
    /// JSON config file; falls back to DRILL_CONFIG_PATH, then the builtin.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Emit status, debug and proof output as JSON.
    #[arg(long)]
    json: bool,
    /// Starting XP balance for completion accounting.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    xp: i64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_drill_config_or_builtin(path),
        None => load_drill_config_from_env(),
    };
    if let Some(tick_ms) = cli.tick_ms {
        config = Arc::new(DrillConfig {
            tick_period_ms: tick_ms.max(1),
            ..config.as_ref().clone()
        });
    }

    let track = TrackId::from_name_or_default(&cli.track);
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(target: "drill::console", %track, seed, debug = cli.debug, "console.start");

    let session = DrillSession::seeded(track, config, seed).with_debug(cli.debug);
    let app = ConsoleApp::new(
        session,
        seed,
        ConsoleOptions {
            json: cli.json,
            xp: cli.xp,
        },
    );

    let (exit, accepted) = run_console(app).await?;
    match exit {
        Exit::Completed(completion) if accepted => {
            info!(target: "drill::console", success = completion.success, "console.exit");
        }
        Exit::Completed(_) | Exit::Aborted => {
            println!("Drill abandoned; no score recorded.");
        }
    }
    Ok(())
}
