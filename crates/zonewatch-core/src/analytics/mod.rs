// ── Event aggregation ──
//
// Time-windowed GraphQL queries over pre-aggregated firewall event groups,
// shaped into ranked domain rows. The remote API never exposes individual
// requests: every figure here is a sum of group counts.

mod ddos;
mod queries;
mod ranking;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::debug;

use zonewatch_api::ApiClient;
use zonewatch_api::types::{AnalyticsData, FirewallEventGroup};

use crate::config::AnalyticsConfig;
use crate::convert::non_empty;
use crate::error::CoreError;
use crate::model::{IpHit, TopBlock, Zone};

pub use ddos::{
    HourBucket, bucket_hourly, classify_bucket, heuristic_events, merge_attack_groups,
    peak_rps_estimate,
};
pub use ranking::{Ranked, rank};

const ACTION_BLOCK: &str = "block";

// ── Time window ────────────────────────────────────────────────────

/// A closed `[since, until]` query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl TimeWindow {
    /// The rolling window of `days` ending at `now`.
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            since: now - Duration::days(i64::from(days)),
            until: now,
        }
    }

    fn variables(&self, scope_key: &str, scope_id: &str, limit: u32) -> serde_json::Value {
        json!({
            scope_key: scope_id,
            "since": self.since.to_rfc3339(),
            "until": self.until.to_rfc3339(),
            "limit": limit,
        })
    }
}

// ── Analytics ──────────────────────────────────────────────────────

/// Event aggregator: one method per published view.
#[derive(Clone)]
pub struct Analytics {
    api: Arc<ApiClient>,
    config: AnalyticsConfig,
}

impl Analytics {
    pub fn new(api: Arc<ApiClient>, config: AnalyticsConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run a zone-scoped firewall-events query and return its groups.
    async fn firewall_groups(
        &self,
        query: &str,
        zone: &Zone,
        window: &TimeWindow,
        limit: u32,
    ) -> Result<Vec<FirewallEventGroup>, zonewatch_api::Error> {
        let variables = window.variables("zoneTag", &zone.id, limit);
        let data: AnalyticsData<FirewallEventGroup> = self.api.graphql(query, &variables).await?;
        let groups = data.zone_groups();
        debug!(zone = %zone.id, groups = groups.len(), "firewall event groups fetched");
        Ok(groups)
    }

    /// Top blocked/challenged paths in the window.
    pub async fn top_blocks(
        &self,
        zone: &Zone,
        window: &TimeWindow,
    ) -> Result<Vec<TopBlock>, CoreError> {
        let groups = self
            .firewall_groups(
                queries::TOP_BLOCKS,
                zone,
                window,
                self.config.ranked_query_limit(),
            )
            .await?;

        let rows = groups
            .iter()
            .map(|g| top_block_from_group(g, zone, window.until))
            .collect();
        Ok(rank(rows, self.config.top_n))
    }

    /// Top offending client IPs in the window.
    pub async fn ip_hits(&self, zone: &Zone, window: &TimeWindow) -> Result<Vec<IpHit>, CoreError> {
        let groups = self
            .firewall_groups(
                queries::IP_HITS,
                zone,
                window,
                self.config.ranked_query_limit(),
            )
            .await?;

        let rows = fold_ip_hits(&groups, zone, window.until);
        Ok(rank(rows, self.config.top_n))
    }

    /// Total blocked and challenged requests in the window.
    pub async fn blocked_total(&self, zone: &Zone, window: &TimeWindow) -> Result<u64, CoreError> {
        let groups = self
            .firewall_groups(
                queries::BLOCKED_TOTAL,
                zone,
                window,
                self.config.full_window_limit,
            )
            .await?;
        Ok(sum_counts(&groups))
    }
}

// ── Row shaping ────────────────────────────────────────────────────

/// Raw count summation over every returned group.
pub fn sum_counts(groups: &[FirewallEventGroup]) -> u64 {
    groups.iter().fold(0u64, |acc, g| acc.saturating_add(g.count))
}

/// Map one event group to a blocked-path row.
pub fn top_block_from_group(
    group: &FirewallEventGroup,
    zone: &Zone,
    last_seen: DateTime<Utc>,
) -> TopBlock {
    let dims = group.dimensions.as_ref();
    TopBlock {
        zone_id: zone.id.clone(),
        host: non_empty(dims.and_then(|d| d.client_request_http_host.as_ref()))
            .unwrap_or(&zone.name)
            .to_owned(),
        path: non_empty(dims.and_then(|d| d.client_request_path.as_ref()))
            .unwrap_or("/")
            .to_owned(),
        ip: non_empty(dims.and_then(|d| d.client_ip.as_ref()))
            .unwrap_or_default()
            .to_owned(),
        action: non_empty(dims.and_then(|d| d.action.as_ref()))
            .unwrap_or_default()
            .to_owned(),
        count: group.count,
        last_seen,
    }
}

/// Fold IP/country/action groups into one row per IP, keeping the order
/// in which each IP first appeared.
pub fn fold_ip_hits(
    groups: &[FirewallEventGroup],
    zone: &Zone,
    last_seen: DateTime<Utc>,
) -> Vec<IpHit> {
    let mut rows: Vec<IpHit> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for group in groups {
        let dims = group.dimensions.as_ref();
        let Some(ip) = non_empty(dims.and_then(|d| d.client_ip.as_ref())) else {
            continue;
        };
        let blocked = dims
            .and_then(|d| d.action.as_deref())
            .is_some_and(|a| a.eq_ignore_ascii_case(ACTION_BLOCK));
        let country =
            non_empty(dims.and_then(|d| d.client_country_name.as_ref())).map(String::from);

        let slot = *index.entry(ip.to_owned()).or_insert_with(|| {
            rows.push(IpHit {
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                ip: ip.to_owned(),
                request_count: 0,
                blocked_count: 0,
                country: None,
                last_seen,
            });
            rows.len() - 1
        });

        if let Some(row) = rows.get_mut(slot) {
            row.request_count = row.request_count.saturating_add(group.count);
            if blocked {
                row.blocked_count = row.blocked_count.saturating_add(group.count);
            }
            if row.country.is_none() {
                row.country = country;
            }
        }
    }

    rows
}
