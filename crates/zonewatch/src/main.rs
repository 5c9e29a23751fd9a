mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use zonewatch_core::Monitor;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "zonewatch", &mut std::io::stdout());
            Ok(())
        }

        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        cmd => {
            let config = zonewatch_config::load_config()?;
            let monitor = build_monitor(&config, &cli.global)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &monitor, &config, &cli.global).await
        }
    }
}

/// Build a `Monitor` from the config file plus CLI overrides.
fn build_monitor(
    config: &zonewatch_config::Config,
    global: &GlobalOpts,
) -> Result<Monitor, CliError> {
    let mut monitor_config = zonewatch_config::to_monitor_config(config)?;
    if let Some(account) = global.account.clone().filter(|a| !a.trim().is_empty()) {
        monitor_config.account_id = Some(account);
    }
    if let Some(secs) = global.timeout {
        monitor_config.transport.timeout = Duration::from_secs(secs.max(1));
    }

    let credentials = Arc::new(zonewatch_config::build_resolver(config));
    if let Some(token) = &global.token {
        credentials.set_override(token.as_str(), global.account.clone());
    }

    Ok(Monitor::new(monitor_config, credentials)?)
}
