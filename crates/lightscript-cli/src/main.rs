//! Lightscript player
//!
//! Plays a light show script on one bulb until interrupted.
//!
//! ```text
//! lightscript <script> <bulb>
//! ```
//!
//! SIGINT/SIGTERM stop playback and restore the bulb; SIGHUP re-reads the
//! script. Diagnostics go to stderr; set `RUST_LOG` to change verbosity.

mod args;

use anyhow::{bail, Context, Result};
use args::CliArgs;
use lightscript_bulb::{BulbConnector, HueConnector, SimulatedConnector};
use lightscript_config::{Config, Driver};
use lightscript_core::{Script, TICKS_PER_SECOND};
use lightscript_player::{PlaybackControl, Player, PlayerConfig, SignalManager};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status for a usage error
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = match CliArgs::parse() {
        Ok(args) => args,
        Err(usage) => {
            eprintln!("{}", usage);
            return Ok(ExitCode::from(EXIT_USAGE));
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let script = Script::load(&args.script_path)
        .with_context(|| format!("failed to load script {}", args.script_path.display()))?;
    info!(
        "Loaded {} commands from {} ({:.1}s per pass)",
        script.len(),
        args.script_path.display(),
        script.total_ticks() as f64 / TICKS_PER_SECOND
    );

    match config.bulb.driver {
        Driver::Hue => {
            let (Some(bridge), Some(username)) = (&config.bulb.bridge, &config.bulb.username)
            else {
                bail!("hue driver needs a bridge and a username");
            };
            let connector =
                HueConnector::new(bridge, username, args.bulb_id, config.bulb.timeout())?;
            play(connector, script, &args.script_path, &config).await?;
        }
        Driver::Simulated => {
            info!("Using simulated bulb; run with RUST_LOG=debug to see bulb calls");
            let connector = SimulatedConnector::new(args.bulb_id);
            play(connector, script, &args.script_path, &config).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn play<C: BulbConnector>(
    connector: C,
    script: Script,
    script_path: &Path,
    config: &Config,
) -> Result<()> {
    let control = Arc::new(PlaybackControl::new());
    let signals = SignalManager::new(control.clone(), script_path)
        .listen()
        .context("failed to install signal handlers")?;

    let player_config = PlayerConfig {
        backoff_initial: config.playback.backoff_initial(),
        backoff_max: config.playback.backoff_max(),
    };

    info!("Playing on bulb {}", connector.identifier());
    let result = Player::new(connector, script, control, player_config).run().await;
    signals.abort();

    let summary = result?;
    info!(
        "Played {} passes ({} commands, {} reconnects)",
        summary.passes, summary.commands, summary.reconnects
    );
    Ok(())
}
