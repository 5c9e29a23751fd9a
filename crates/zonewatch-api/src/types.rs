// Wire types for the REST and GraphQL analytics endpoints.
//
// Every analytics wrapper is optional. The GraphQL schema has been seen
// to drop intermediate nullable objects, so "absent at any level" decodes
// to an empty group list rather than an error.

use serde::{Deserialize, Serialize};

// ── REST envelope ────────────────────────────────────────────────────

/// `{ success, errors, result, result_info }` envelope used by every REST endpoint.
#[derive(Debug, Deserialize)]
pub struct RestEnvelope<T> {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    pub result: Option<T>,
    #[serde(default)]
    pub result_info: Option<ResultInfo>,
}

fn default_true() -> bool {
    true
}

/// One entry of a REST `errors` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: String,
}

/// Error-only body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultInfo {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub count: Option<u32>,
    pub total_count: Option<u64>,
}

// ── Zones ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneResponse {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub plan: Option<PlanResponse>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub name: Option<String>,
}

// ── GraphQL envelope ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct GraphqlRequest<'a> {
    pub query: &'a str,
    pub variables: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

// ── Analytics wrappers ───────────────────────────────────────────────

/// `data` of an analytics query: `{ viewer { zones|accounts [ { groups [...] } ] } }`.
///
/// Queries alias their dataset to `groups` so one decode shape serves
/// every dataset.
#[derive(Debug, Deserialize)]
pub struct AnalyticsData<G> {
    #[serde(default)]
    pub viewer: Option<Viewer<G>>,
}

#[derive(Debug, Deserialize)]
pub struct Viewer<G> {
    #[serde(default)]
    pub zones: Option<Vec<Option<Scope<G>>>>,
    #[serde(default)]
    pub accounts: Option<Vec<Option<Scope<G>>>>,
}

#[derive(Debug, Deserialize)]
pub struct Scope<G> {
    #[serde(default)]
    pub groups: Option<Vec<G>>,
}

impl<G> AnalyticsData<G> {
    /// Groups under `viewer.zones[*].groups`, or empty if any level is missing.
    pub fn zone_groups(self) -> Vec<G> {
        flatten_scopes(self.viewer.and_then(|v| v.zones))
    }

    /// Groups under `viewer.accounts[*].groups`, or empty if any level is missing.
    pub fn account_groups(self) -> Vec<G> {
        flatten_scopes(self.viewer.and_then(|v| v.accounts))
    }
}

fn flatten_scopes<G>(scopes: Option<Vec<Option<Scope<G>>>>) -> Vec<G> {
    scopes
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|scope| scope.groups)
        .flatten()
        .collect()
}

// ── firewallEventsAdaptiveGroups ─────────────────────────────────────

/// One pre-aggregated firewall event bucket: a count and whichever
/// dimensions the query asked for.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirewallEventGroup {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub dimensions: Option<FirewallDimensions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallDimensions {
    #[serde(default)]
    pub client_request_path: Option<String>,
    #[serde(default, rename = "clientRequestHTTPHost")]
    pub client_request_http_host: Option<String>,
    #[serde(default, rename = "clientIP")]
    pub client_ip: Option<String>,
    #[serde(default)]
    pub client_country_name: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
}

// ── dosdAttackAnalyticsGroups ────────────────────────────────────────

/// One attack-analytics group. Several groups may share an `attackId`
/// when an attack used more than one vector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttackGroup {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub dimensions: Option<AttackDimensions>,
    #[serde(default)]
    pub sum: Option<AttackSum>,
    #[serde(default)]
    pub max: Option<AttackMax>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackDimensions {
    #[serde(default)]
    pub attack_id: Option<String>,
    #[serde(default)]
    pub attack_type: Option<String>,
    #[serde(default)]
    pub mitigation_type: Option<String>,
    #[serde(default)]
    pub start_datetime: Option<String>,
    #[serde(default)]
    pub end_datetime: Option<String>,
    #[serde(default)]
    pub ip_protocol_name: Option<String>,
    #[serde(default)]
    pub source_port: Option<u32>,
    #[serde(default)]
    pub destination_port: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttackSum {
    #[serde(default)]
    pub packets: Option<f64>,
    #[serde(default)]
    pub bits: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackMax {
    #[serde(default)]
    pub packet_rate: Option<f64>,
    #[serde(default)]
    pub bit_rate: Option<f64>,
}
