// ── Core error types ──
//
// User-facing errors from zonewatch-core. Consumers never see raw HTTP
// plumbing: the `From<zonewatch_api::Error>` impl translates gateway
// errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in -- no API token configured")]
    NotAuthenticated,

    #[error("API token rejected: {message}")]
    AuthenticationFailed { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the analytics API: {reason}")]
    ConnectionFailed { reason: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Zone not found: {identifier}")]
    ZoneNotFound { identifier: String },

    #[error("Unexpected response from the analytics API: {message}")]
    Decode { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for failures that a new or reloaded token could fix.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::AuthenticationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<zonewatch_api::Error> for CoreError {
    fn from(err: zonewatch_api::Error) -> Self {
        if err.is_auth_rejected() {
            return CoreError::AuthenticationFailed {
                message: err.to_string(),
            };
        }

        match err {
            zonewatch_api::Error::NotAuthenticated => CoreError::NotAuthenticated,
            zonewatch_api::Error::InvalidEndpoint(message) => CoreError::Config {
                message: format!("Invalid endpoint: {message}"),
            },
            zonewatch_api::Error::InvalidResponse(reason) => CoreError::ConnectionFailed { reason },
            zonewatch_api::Error::Http { status } => CoreError::Api {
                message: format!("HTTP {status}"),
                status: Some(status),
            },
            zonewatch_api::Error::Api { message, status } => CoreError::Api { message, status },
            zonewatch_api::Error::Decode { message, body: _ } => CoreError::Decode { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_token_maps_to_authentication_failed() {
        let err = CoreError::from(zonewatch_api::Error::Http { status: 401 });
        assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
        assert!(err.is_auth());
    }

    #[test]
    fn missing_token_stays_distinct() {
        let err = CoreError::from(zonewatch_api::Error::NotAuthenticated);
        assert!(matches!(err, CoreError::NotAuthenticated));
    }

    #[test]
    fn plain_status_keeps_code() {
        let err = CoreError::from(zonewatch_api::Error::Http { status: 503 });
        assert!(matches!(err, CoreError::Api { status: Some(503), .. }));
        assert!(!err.is_auth());
    }
}
