use thiserror::Error;

/// Top-level error type for the `zonewatch-api` crate.
///
/// Every failure that leaves the gateway is one of these kinds. Raw
/// `reqwest` errors are folded into [`InvalidResponse`](Self::InvalidResponse)
/// before they cross the crate boundary; `zonewatch-core` maps the rest into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// No bearer token could be resolved. Raised before any network I/O.
    #[error("Not authenticated -- no API token configured")]
    NotAuthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// The endpoint URL could not be built from the configured base.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// The server could not be reached or sent something that is not
    /// a usable HTTP response (connection refused, timeout, truncated body).
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx status with no decodable structured error body.
    #[error("HTTP error {status}")]
    Http { status: u16 },

    /// Structured error reported by the API. Carries the first message
    /// of the error array.
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// 2xx response whose body does not match the expected shape.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },
}

impl Error {
    /// Returns `true` if the remote side rejected our credentials.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(
            self,
            Self::Http {
                status: 401 | 403
            } | Self::Api {
                status: Some(401 | 403),
                ..
            }
        )
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            return Self::InvalidEndpoint(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Http {
                status: status.as_u16(),
            };
        }
        Self::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_rejection_covers_plain_and_structured_errors() {
        assert!(Error::Http { status: 401 }.is_auth_rejected());
        assert!(
            Error::Api {
                message: "Invalid access token".into(),
                status: Some(403),
            }
            .is_auth_rejected()
        );
        assert!(!Error::Http { status: 500 }.is_auth_rejected());
        assert!(!Error::NotAuthenticated.is_auth_rejected());
    }
}
