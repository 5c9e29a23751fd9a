// Async HTTP gateway for the zone REST API and the GraphQL analytics API.
//
// Base path: /client/v4/
// Auth: `Authorization: Bearer <token>`, resolved per request

use std::future::Future;
use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::auth::CredentialResolver;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{ErrorBody, GraphqlRequest, GraphqlResponse, RestEnvelope, ZoneResponse};

/// Default REST API root.
pub const DEFAULT_BASE_URL: &str = "https://api.cloudflare.com/client/v4/";

/// Page size used for REST list calls.
pub const DEFAULT_PER_PAGE: u32 = 50;

const GRAPHQL_PATH: &str = "graphql";
const BODY_PREVIEW_CHARS: usize = 200;

// ── Client ───────────────────────────────────────────────────────────

/// Authenticated client for the remote API.
///
/// Two call shapes: paginated REST lists and GraphQL queries. Both fail
/// with [`Error::NotAuthenticated`] before any network I/O when no token
/// resolves, and every transport failure is mapped into [`Error`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<CredentialResolver>,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, credential resolver, and transport config.
    pub fn new(
        base_url: &str,
        credentials: Arc<CredentialResolver>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        credentials: Arc<CredentialResolver>,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Ensure the base URL ends with `/` so relative joins append
    /// rather than replace the last segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidEndpoint(format!("not a base URL: {raw}")));
        }
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn credentials(&self) -> &Arc<CredentialResolver> {
        &self.credentials
    }

    // ── Request plumbing ─────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::InvalidEndpoint(format!("{path}: {e}")))
    }

    /// Resolve the token for this request. Fails before any I/O if none.
    fn bearer(&self) -> Result<HeaderValue, Error> {
        let record = self.credentials.current()?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", record.token.expose_secret()))
            .map_err(|_| Error::NotAuthenticated)?;
        value.set_sensitive(true);
        Ok(value)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<T>, Error> {
        let auth = self.bearer()?;
        let url = self.url(path)?;
        debug!("GET {url} page={page} per_page={per_page}");

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, auth)
            .query(&[("page", page), ("per_page", per_page)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        let envelope: RestEnvelope<Vec<T>> = decode(&body)?;
        if !envelope.success {
            if let Some(first) = envelope.errors.into_iter().next() {
                return Err(Error::Api {
                    message: first.message,
                    status: Some(status.as_u16()),
                });
            }
        }

        Ok(envelope.result.unwrap_or_default())
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect all pages into a single `Vec<T>`.
    ///
    /// Pages are 1-based. Keeps fetching while a page comes back full;
    /// a short or empty page ends the walk after its items are kept.
    pub async fn paginate_all<T, F, Fut>(&self, per_page: u32, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(u32, u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>, Error>>,
    {
        let per_page = per_page.max(1);
        let mut all = Vec::new();
        let mut page: u32 = 1;

        loop {
            let items = fetch(page, per_page).await?;
            let received = items.len();
            all.extend(items);

            let full = usize::try_from(per_page).is_ok_and(|limit| received >= limit);
            if received == 0 || !full {
                break;
            }

            page = page.saturating_add(1);
        }

        Ok(all)
    }

    /// Fetch every item of a paginated REST list endpoint.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        per_page: u32,
    ) -> Result<Vec<T>, Error> {
        self.paginate_all(per_page, |page, per_page| {
            self.get_page(path, page, per_page)
        })
        .await
    }

    // ── GraphQL ──────────────────────────────────────────────────────

    /// POST a GraphQL query with bound variables and decode `data`.
    ///
    /// If the response carries both `data` and `errors`, the errors are
    /// logged and the partial data returned. Only `errors` without `data`
    /// is a failure.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T, Error> {
        let auth = self.bearer()?;
        let url = self.url(GRAPHQL_PATH)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, auth)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        let envelope: GraphqlResponse<T> = decode(&body)?;
        let errors = envelope.errors.unwrap_or_default();

        match envelope.data {
            Some(data) => {
                if let Some(first) = errors.first() {
                    warn!(
                        count = errors.len(),
                        first = %first.message,
                        "GraphQL returned partial data with errors"
                    );
                }
                Ok(data)
            }
            None => match errors.into_iter().next() {
                Some(first) => Err(Error::Api {
                    message: first.message,
                    status: Some(status.as_u16()),
                }),
                None => Err(Error::Decode {
                    message: "GraphQL response has neither data nor errors".into(),
                    body,
                }),
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// List every zone visible to the token.
    pub async fn list_zones(&self) -> Result<Vec<ZoneResponse>, Error> {
        self.list_all("zones", DEFAULT_PER_PAGE).await
    }
}

// ── Response handling ────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, Error> {
    serde_json::from_str(body).map_err(|e| {
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();
        Error::Decode {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.to_owned(),
        }
    })
}

/// Map a non-2xx response: a structured `errors` array surfaces its first
/// message, anything else becomes a bare status error.
async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
    let raw = resp.text().await.unwrap_or_default();

    let first = serde_json::from_str::<ErrorBody>(&raw)
        .ok()
        .and_then(|body| body.errors.into_iter().next());

    match first {
        Some(err) => Error::Api {
            message: if err.message.is_empty() {
                status.to_string()
            } else {
                err.message
            },
            status: Some(status.as_u16()),
        },
        None => Error::Http {
            status: status.as_u16(),
        },
    }
}
