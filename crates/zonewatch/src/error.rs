//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use zonewatch_config::ConfigError;
use zonewatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the analytics API: {reason}")]
    #[diagnostic(
        code(zonewatch::connection_failed),
        help(
            "Check network access to the API endpoint.\n\
             A TLS-intercepting proxy needs api.ca_cert in the config file."
        )
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("API token rejected: {message}")]
    #[diagnostic(
        code(zonewatch::auth_failed),
        help(
            "The token needs Zone:Read and Analytics:Read permissions.\n\
             Replace it with: zonewatch auth set <TOKEN>"
        )
    )]
    AuthFailed { message: String },

    #[error("No API token configured")]
    #[diagnostic(
        code(zonewatch::no_credentials),
        help(
            "Save one with: zonewatch auth set <TOKEN>\n\
             Or set the CLOUDFLARE_API_TOKEN environment variable."
        )
    )]
    NoCredentials,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(zonewatch::not_found),
        help("Run: zonewatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(zonewatch::api_error))]
    ApiError { status: String, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(zonewatch::invalid_response),
        help("The API returned a payload zonewatch could not decode. Re-run with -vv for details.")
    )]
    InvalidResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(zonewatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("{source}")]
    #[diagnostic(code(zonewatch::config), help("Config file: {path}"))]
    Config {
        #[source]
        source: ConfigError,
        path: String,
    },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ──────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            source => CliError::Config {
                source,
                path: zonewatch_config::config_path().display().to_string(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated => CliError::NoCredentials,

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },

            CoreError::ZoneNotFound { identifier } => CliError::NotFound {
                resource_type: "zone".into(),
                identifier,
                list_command: "zones".into(),
            },

            CoreError::Decode { message } => CliError::InvalidResponse { message },

            CoreError::Api { message, status } => CliError::ApiError {
                status: status.map_or_else(|| "graphql".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_exit_with_auth_code() {
        assert_eq!(CliError::from(CoreError::NotAuthenticated).exit_code(), exit_code::AUTH);
        let rejected = CoreError::AuthenticationFailed {
            message: "HTTP 403".into(),
        };
        assert_eq!(CliError::from(rejected).exit_code(), exit_code::AUTH);
    }

    #[test]
    fn missing_zone_points_at_zone_list() {
        let err = CliError::from(CoreError::ZoneNotFound {
            identifier: "example.net".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(err.to_string(), "zone 'example.net' not found");
    }

    #[test]
    fn graphql_errors_without_status_are_labelled() {
        let err = CliError::from(CoreError::Api {
            message: "quota exceeded".into(),
            status: None,
        });
        assert_eq!(err.to_string(), "API error (graphql): quota exceeded");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err = CliError::from(ConfigError::Validation {
            field: "analytics.top_n".into(),
            reason: "must be at least 1".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
