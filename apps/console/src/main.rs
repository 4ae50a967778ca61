//! routewatch - watch audio device topology and report real changes
//!
//! Subcommands:
//! - `routewatch devices` - List available devices, sorted by name
//! - `routewatch dump` - Print a diagnostic snapshot of the session
//! - `routewatch watch` - Follow topology changes until interrupted
//!
//! The plain OS backend runs live on the desktop. Every backend can run
//! against in-memory sessions with `--simulate`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use routewatch_session_core::DeviceKind;

mod commands;
mod config;
mod logging;
mod simulate;

use commands::Context;
use config::{BackendKind, ConsoleConfig};

#[derive(Parser)]
#[command(name = "routewatch")]
#[command(about = "Watch audio device topology and report real changes")]
#[command(version)]
struct Cli {
    /// Config file (defaults to config.json in the user config directory)
    #[arg(short, long, global = true, env = "ROUTEWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Session backend to drive (overrides the config file)
    #[arg(short, long, global = true, value_enum)]
    backend: Option<BackendKind>,

    /// Run against in-memory sessions with scripted device activity
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available devices
    Devices {
        /// Device kind to list
        #[arg(short, long, value_enum, default_value = "all")]
        kind: KindArg,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print a diagnostic snapshot of the session
    Dump {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Follow topology changes until interrupted
    Watch {
        /// Stop after this many seconds
        #[arg(short, long)]
        duration: Option<u64>,

        /// Route poll interval in milliseconds (overrides the config file)
        #[arg(long)]
        poll_ms: Option<u64>,

        /// Delay between simulated steps in milliseconds
        #[arg(long, default_value = "750")]
        step_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    All,
    Microphone,
    Speaker,
    Camera,
}

impl From<KindArg> for DeviceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::All => DeviceKind::All,
            KindArg::Microphone => DeviceKind::Microphone,
            KindArg::Speaker => DeviceKind::Speaker,
            KindArg::Camera => DeviceKind::Camera,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    logging::init(&config.logging);

    if let Commands::Watch {
        poll_ms: Some(poll_ms), ..
    } = &cli.command
    {
        config.poll_interval_ms = *poll_ms;
    }

    let ctx = Context {
        backend: cli.backend.unwrap_or(config.backend),
        simulate: cli.simulate,
        config,
    };

    match cli.command {
        Commands::Devices { kind, json } => commands::devices(&ctx, kind.into(), json),
        Commands::Dump { json } => commands::dump(&ctx, json),
        Commands::Watch {
            duration, step_ms, ..
        } => {
            commands::watch(
                &ctx,
                duration.map(Duration::from_secs),
                Duration::from_millis(step_ms),
                &mut std::io::stdout(),
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["routewatch", "devices", "--kind", "microphone", "--backend", "sdk", "--simulate"])
            .unwrap();

        assert_eq!(cli.backend, Some(BackendKind::Sdk));
        assert!(cli.simulate);
        assert!(matches!(
            cli.command,
            Commands::Devices {
                kind: KindArg::Microphone,
                json: false
            }
        ));
    }
}
