//! Token management: status, set, clear.
//!
//! Only the token's origin is ever printed, never the token itself.

use serde::Serialize;
use zonewatch_config::{Config, KeyringSource};
use zonewatch_core::Monitor;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AuthStatus {
    authenticated: bool,
    source: Option<String>,
    account_id: Option<String>,
}

impl AuthStatus {
    fn of(monitor: &Monitor) -> Self {
        match monitor.credentials().current() {
            Ok(record) => Self {
                authenticated: true,
                source: Some(record.origin.to_string()),
                account_id: monitor.account_id(),
            },
            Err(_) => Self {
                authenticated: false,
                source: None,
                account_id: monitor.account_id(),
            },
        }
    }

    fn render(&self, color: bool) -> String {
        let mut out = match &self.source {
            Some(source) => format!("{} (from {source})", output::good("Signed in", color)),
            None => output::bad("Not signed in", color),
        };
        if let Some(account) = &self.account_id {
            out.push_str(&format!("\nAccount: {account}"));
        }
        out
    }
}

pub async fn handle(
    monitor: &Monitor,
    config: &Config,
    args: AuthArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let credentials = monitor.credentials();

    match args.command {
        AuthCommand::Status => {}

        AuthCommand::Set { token, account_id } => {
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "must not be empty".into(),
                });
            }

            // Try the candidate before persisting it.
            credentials.set_override(token.trim(), account_id.clone());
            let validated = monitor.fetch_zones().await;
            credentials.clear_override();
            let zones = validated?;

            let keyring = KeyringSource::new(&config.credentials.keyring_service);
            keyring.store(token.trim(), account_id.as_deref())?;
            credentials.reload();
            tracing::info!(zones = zones.len(), "token saved to keyring");
            if !global.quiet {
                eprintln!("Token saved; {} zones visible", zones.len());
            }
        }

        AuthCommand::Clear => {
            KeyringSource::new(&config.credentials.keyring_service).delete()?;
            credentials.reload();
            if !global.quiet {
                eprintln!("Saved token removed");
            }
        }
    }

    let status = AuthStatus::of(monitor);
    let out = output::render_single(
        &global.output,
        &status,
        |s| s.render(color),
        |s| s.source.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_shows_origin_only() {
        let status = AuthStatus {
            authenticated: true,
            source: Some("$CLOUDFLARE_API_TOKEN".into()),
            account_id: Some("acct-1".into()),
        };
        assert_eq!(
            status.render(false),
            "Signed in (from $CLOUDFLARE_API_TOKEN)\nAccount: acct-1"
        );
    }

    #[test]
    fn signed_out_status() {
        let status = AuthStatus {
            authenticated: false,
            source: None,
            account_id: None,
        };
        assert_eq!(status.render(false), "Not signed in");
    }
}
