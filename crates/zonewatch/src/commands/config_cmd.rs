//! Config subcommand handlers.
//!
//! These run before a monitor is built, so they work without a token.

use zonewatch_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = zonewatch_config::config_path();
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = zonewatch_config::load_config()?;
            let toml = zonewatch_config::to_toml(&cfg)?;
            let out =
                output::render_single(&global.output, &cfg, |_| toml.clone(), |_| toml.clone());
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            let path = zonewatch_config::config_path();
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!("{} already exists; pass --force to overwrite", path.display()),
                });
            }
            zonewatch_config::save_config(&Config::default())?;
            tracing::info!(path = %path.display(), "config written");
            if !global.quiet {
                eprintln!("Wrote default config to {}", path.display());
            }
            Ok(())
        }
    }
}
