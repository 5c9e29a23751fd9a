//! Command dispatch: bridges CLI args -> monitor operations -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod ddos;
pub mod report;
pub mod watch;
pub mod zones;

use zonewatch_config::Config;
use zonewatch_core::Monitor;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    monitor: &Monitor,
    config: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Zones => zones::handle(monitor, global).await,
        Command::Report(args) => report::handle(monitor, args, global).await,
        Command::Ddos(args) => ddos::handle(monitor, args, global).await,
        Command::Watch(args) => watch::handle(monitor, args, global).await,
        Command::Auth(args) => auth::handle(monitor, config, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
