// ── Security signal domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A blocked or challenged request path, ranked by event count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopBlock {
    pub zone_id: String,
    /// Request host, or the zone name when the event carried none.
    pub host: String,
    /// Request path; empty paths are normalized to `/`.
    pub path: String,
    pub ip: String,
    pub action: String,
    pub count: u64,
    pub last_seen: DateTime<Utc>,
}

impl TopBlock {
    /// Identity: zone + host + path + IP.
    pub fn key(&self) -> String {
        format!("{}|{}|{}|{}", self.zone_id, self.host, self.path, self.ip)
    }
}

/// A client address seen hitting firewall rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpHit {
    pub zone_id: String,
    pub zone_name: String,
    pub ip: String,
    /// Blocked plus challenged events.
    pub request_count: u64,
    /// Events whose action was `block`.
    pub blocked_count: u64,
    pub country: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl IpHit {
    /// Identity: zone + IP.
    pub fn key(&self) -> String {
        format!("{}|{}", self.zone_id, self.ip)
    }
}

/// Which detection stage produced a [`DdosEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectionTier {
    /// Account-level attack analytics.
    Account,
    /// Zone-level attack analytics.
    Zone,
    /// Hourly bucketing over blocked firewall events.
    Heuristic,
}

/// An inferred or reported DDoS attack window.
///
/// Invariants: `end >= start` when present, `peak_rps >= 1`. Detection
/// implies the edge already acted, so `mitigated` is always `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdosEvent {
    /// Zone + interval start + disambiguator.
    pub id: String,
    pub zone_id: String,
    pub zone_name: String,
    /// Human-readable attack-type label.
    pub attack_type: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub peak_rps: u64,
    pub total_requests: u64,
    pub mitigated: bool,
    pub tier: DetectionTier,
}

impl DdosEvent {
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end.map(|end| end - self.start)
    }
}

/// Everything derived for one zone in one refresh cycle.
///
/// Always produced or replaced as a unit; never a merge of old and new.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone_id: Option<String>,
    pub top_blocks: Vec<TopBlock>,
    pub ip_hits: Vec<IpHit>,
    pub ddos_events: Vec<DdosEvent>,
    pub blocked_total: u64,
    pub generated_at: Option<DateTime<Utc>>,
}

impl ZoneReport {
    /// Empty zone-scoped views for `zone_id` (used when a cycle fails).
    pub fn empty_for(zone_id: Option<String>) -> Self {
        Self {
            zone_id,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top_blocks.is_empty()
            && self.ip_hits.is_empty()
            && self.ddos_events.is_empty()
            && self.blocked_total == 0
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn tier_round_trips_through_strings() {
        assert_eq!(DetectionTier::Heuristic.to_string(), "heuristic");
        assert_eq!(
            DetectionTier::from_str("account").ok(),
            Some(DetectionTier::Account)
        );
    }

    #[test]
    fn empty_report_keeps_zone() {
        let report = ZoneReport::empty_for(Some("z1".into()));
        assert_eq!(report.zone_id.as_deref(), Some("z1"));
        assert!(report.is_empty());
    }
}
