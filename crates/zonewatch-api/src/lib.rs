// zonewatch-api: Async Rust client for zone listing and security analytics

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::{CredentialRecord, CredentialResolver, CredentialSource, ResolvedFrom};
pub use client::{ApiClient, DEFAULT_BASE_URL, DEFAULT_PER_PAGE};
pub use error::Error;
pub use transport::TransportConfig;
