// ── DDoS classification ──
//
// Tiered detection. Account-level attack analytics (when an account id is
// known), then zone-level attack analytics, then an hourly bucketing
// heuristic over blocked firewall events. The first tier that yields at
// least one event wins. Only a heuristic failure reaches the caller.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, DurationRound, Utc};
use tracing::{debug, info, warn};

use zonewatch_api::types::{AnalyticsData, AttackGroup, FirewallEventGroup};

use super::{Analytics, TimeWindow, queries};
use crate::convert::{non_empty, parse_datetime};
use crate::error::CoreError;
use crate::model::{DdosEvent, DetectionTier, Zone};

/// Average packet size used to turn a bit rate into a packet rate.
const ASSUMED_PACKET_BYTES: f64 = 1500.0;

const HEURISTIC_VOLUME_THRESHOLD: u64 = 1000;
const HEURISTIC_SPREAD_VOLUME: u64 = 500;
const HEURISTIC_SPREAD_IPS: usize = 50;

impl Analytics {
    /// Detect attack windows for `zone` over `window`.
    ///
    /// Errors from the dedicated tiers are logged and trigger the next
    /// tier. An empty vector means every tier ran and found nothing.
    pub async fn ddos_events(
        &self,
        zone: &Zone,
        account_id: Option<&str>,
        window: &TimeWindow,
    ) -> Result<Vec<DdosEvent>, CoreError> {
        if let Some(account) = account_id.filter(|a| !a.trim().is_empty()) {
            match self
                .attack_groups(queries::ACCOUNT_ATTACKS, "accountTag", account, window)
                .await
            {
                Ok(groups) => {
                    let events = merge_attack_groups(&groups, zone, DetectionTier::Account);
                    if !events.is_empty() {
                        return Ok(finish(events, DetectionTier::Account, zone));
                    }
                    debug!(zone = %zone.id, "account attack analytics empty, trying zone tier");
                }
                Err(e) => warn!(zone = %zone.id, error = %e, "account attack analytics failed"),
            }
        }

        match self
            .attack_groups(queries::ZONE_ATTACKS, "zoneTag", &zone.id, window)
            .await
        {
            Ok(groups) => {
                let events = merge_attack_groups(&groups, zone, DetectionTier::Zone);
                if !events.is_empty() {
                    return Ok(finish(events, DetectionTier::Zone, zone));
                }
                debug!(zone = %zone.id, "zone attack analytics empty, falling back to heuristic");
            }
            Err(e) => warn!(zone = %zone.id, error = %e, "zone attack analytics failed"),
        }

        let groups = self
            .firewall_groups(
                queries::BLOCKED_TIMELINE,
                zone,
                window,
                self.config.full_window_limit,
            )
            .await?;
        let events = heuristic_events(&groups, zone, window.until);
        Ok(finish(events, DetectionTier::Heuristic, zone))
    }

    async fn attack_groups(
        &self,
        query: &str,
        scope_key: &str,
        scope_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<AttackGroup>, zonewatch_api::Error> {
        let variables = window.variables(scope_key, scope_id, self.config.attack_limit);
        let data: AnalyticsData<AttackGroup> = self.api.graphql(query, &variables).await?;
        Ok(if scope_key == "accountTag" {
            data.account_groups()
        } else {
            data.zone_groups()
        })
    }
}

fn finish(mut events: Vec<DdosEvent>, tier: DetectionTier, zone: &Zone) -> Vec<DdosEvent> {
    events.sort_by(|a, b| b.start.cmp(&a.start));
    info!(zone = %zone.id, %tier, events = events.len(), "ddos detection complete");
    events
}

// ── Peak rate ──────────────────────────────────────────────────────

/// Estimate peak requests per second for a dedicated-tier attack.
///
/// Precedence: reported packet rate, then bit rate at 1500-byte packets,
/// then total packets over the attack duration. A zero or unknown
/// duration yields the raw packet total. Never below 1.
pub fn peak_rps_estimate(
    packet_rate: Option<f64>,
    bit_rate: Option<f64>,
    packets: f64,
    duration_secs: i64,
) -> u64 {
    let estimate = match (packet_rate, bit_rate) {
        (Some(rate), _) if rate > 0.0 => rate,
        (_, Some(bits)) if bits > 0.0 => bits / 8.0 / ASSUMED_PACKET_BYTES,
        _ if duration_secs > 0 => {
            packets / f64::from(i32::try_from(duration_secs).unwrap_or(i32::MAX))
        }
        _ => packets,
    };
    float_to_count(estimate).max(1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn float_to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.floor() as u64
    } else {
        0
    }
}

// ── Dedicated tiers ────────────────────────────────────────────────

/// Accumulator for all groups sharing one attack id.
struct AttackAccumulator {
    first_index: usize,
    attack_type: String,
    mitigation: Option<String>,
    vectors: Vec<String>,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    packets: f64,
    count: u64,
    packet_rate: Option<f64>,
    bit_rate: Option<f64>,
}

fn max_rate(current: Option<f64>, next: Option<f64>) -> Option<f64> {
    match (current, next) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

fn vector_descriptor(protocol: Option<&str>, src: Option<u32>, dst: Option<u32>) -> Option<String> {
    let protocol = protocol.map(str::trim).filter(|p| !p.is_empty())?;
    let port = |p: Option<u32>| p.map_or_else(|| "*".to_owned(), |p| p.to_string());
    Some(format!("{protocol} src:{} dst:{}", port(src), port(dst)))
}

/// Merge attack-analytics groups into one event per attack id.
///
/// Groups sharing an id (one per vector) combine into the earliest start,
/// the latest end, summed packets and the highest reported rates. Groups
/// with an unparsable start are skipped. Groups without an id stand alone.
pub fn merge_attack_groups(
    groups: &[AttackGroup],
    zone: &Zone,
    tier: DetectionTier,
) -> Vec<DdosEvent> {
    let mut merged: Vec<AttackAccumulator> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for (index, group) in groups.iter().enumerate() {
        let Some(dims) = group.dimensions.as_ref() else {
            continue;
        };
        let Some(start) = parse_datetime(dims.start_datetime.as_deref()) else {
            debug!(zone = %zone.id, "skipping attack group with unparsable start");
            continue;
        };
        let end = parse_datetime(dims.end_datetime.as_deref()).filter(|end| *end >= start);
        let packets = group.sum.as_ref().and_then(|s| s.packets).unwrap_or(0.0);
        let packet_rate = group.max.as_ref().and_then(|m| m.packet_rate);
        let bit_rate = group.max.as_ref().and_then(|m| m.bit_rate);
        let vector = vector_descriptor(
            dims.ip_protocol_name.as_deref(),
            dims.source_port,
            dims.destination_port,
        );

        let key = non_empty(dims.attack_id.as_ref())
            .map_or_else(|| format!("#{index}"), String::from);
        if let Some(acc) = by_id.get(&key).and_then(|&slot| merged.get_mut(slot)) {
            acc.start = acc.start.min(start);
            acc.end = match (acc.end, end) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            };
            acc.packets += packets;
            acc.count = acc.count.saturating_add(group.count);
            acc.packet_rate = max_rate(acc.packet_rate, packet_rate);
            acc.bit_rate = max_rate(acc.bit_rate, bit_rate);
            if acc.mitigation.is_none() {
                acc.mitigation = non_empty(dims.mitigation_type.as_ref()).map(String::from);
            }
            if let Some(vector) = vector {
                if !acc.vectors.contains(&vector) {
                    acc.vectors.push(vector);
                }
            }
        } else {
            by_id.insert(key, merged.len());
            merged.push(AttackAccumulator {
                first_index: index,
                attack_type: non_empty(dims.attack_type.as_ref())
                    .unwrap_or("Unknown attack")
                    .to_owned(),
                mitigation: non_empty(dims.mitigation_type.as_ref()).map(String::from),
                vectors: vector.into_iter().collect(),
                start,
                end,
                packets,
                count: group.count,
                packet_rate,
                bit_rate,
            });
        }
    }

    merged
        .into_iter()
        .map(|acc| {
            let duration_secs = acc.end.map_or(0, |end| (end - acc.start).num_seconds());
            let total_requests = match float_to_count(acc.packets) {
                0 => acc.count,
                packets => packets,
            };
            DdosEvent {
                id: format!(
                    "{}:{}:{tier}{}",
                    zone.id,
                    acc.start.timestamp(),
                    acc.first_index
                ),
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                attack_type: attack_label(
                    &acc.attack_type,
                    acc.mitigation.as_deref(),
                    &acc.vectors,
                ),
                start: acc.start,
                end: acc.end,
                peak_rps: peak_rps_estimate(
                    acc.packet_rate,
                    acc.bit_rate,
                    acc.packets,
                    duration_secs,
                ),
                total_requests,
                mitigated: true,
                tier,
            }
        })
        .collect()
}

fn attack_label(attack_type: &str, mitigation: Option<&str>, vectors: &[String]) -> String {
    let mut label = attack_type.to_owned();
    if let Some(action) = mitigation {
        label.push_str(&format!(" ({action})"));
    }
    if !vectors.is_empty() {
        label.push_str(&format!(" [{}]", vectors.join(", ")));
    }
    label
}

// ── Heuristic fallback ─────────────────────────────────────────────

/// One hour of blocked events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourBucket {
    pub start: DateTime<Utc>,
    pub requests: u64,
    pub source_ips: usize,
}

/// Bucket blocked-event groups by the hour their timestamp falls in.
///
/// Unparsable timestamps land in the bucket starting one hour before
/// `until`. Buckets come back in ascending start order.
pub fn bucket_hourly(groups: &[FirewallEventGroup], until: DateTime<Utc>) -> Vec<HourBucket> {
    let hour = Duration::hours(1);
    let fallback = until - hour;
    let mut buckets: HashMap<DateTime<Utc>, (u64, HashSet<&str>)> = HashMap::new();

    for group in groups {
        let dims = group.dimensions.as_ref();
        let start = parse_datetime(dims.and_then(|d| d.datetime.as_deref()))
            .and_then(|ts| ts.duration_trunc(hour).ok())
            .unwrap_or(fallback);
        let entry = buckets.entry(start).or_default();
        entry.0 = entry.0.saturating_add(group.count);
        if let Some(ip) = non_empty(dims.and_then(|d| d.client_ip.as_ref())) {
            entry.1.insert(ip);
        }
    }

    let mut out: Vec<HourBucket> = buckets
        .into_iter()
        .map(|(start, (requests, ips))| HourBucket {
            start,
            requests,
            source_ips: ips.len(),
        })
        .collect();
    out.sort_by_key(|b| b.start);
    out
}

/// Label for a bucket that crosses the volume or spread threshold, or
/// `None` when it stays below both.
pub fn classify_bucket(requests: u64, source_ips: usize) -> Option<String> {
    let volumetric = requests > HEURISTIC_VOLUME_THRESHOLD;
    let spread = requests > HEURISTIC_SPREAD_VOLUME && source_ips > HEURISTIC_SPREAD_IPS;
    if !(volumetric || spread) {
        return None;
    }
    Some(if source_ips > HEURISTIC_SPREAD_IPS {
        format!("Distributed attack ({source_ips} source IPs)")
    } else {
        format!("Volumetric attack ({source_ips} source IPs)")
    })
}

/// Promote qualifying hourly buckets to one-hour attack events.
pub fn heuristic_events(
    groups: &[FirewallEventGroup],
    zone: &Zone,
    until: DateTime<Utc>,
) -> Vec<DdosEvent> {
    let window = Duration::hours(1);
    let window_secs = u64::try_from(window.num_seconds()).unwrap_or(1);

    bucket_hourly(groups, until)
        .into_iter()
        .filter_map(|bucket| {
            let label = classify_bucket(bucket.requests, bucket.source_ips)?;
            Some(DdosEvent {
                id: format!(
                    "{}:{}:{}",
                    zone.id,
                    bucket.start.timestamp(),
                    DetectionTier::Heuristic
                ),
                zone_id: zone.id.clone(),
                zone_name: zone.name.clone(),
                attack_type: label,
                start: bucket.start,
                end: Some(bucket.start + window),
                peak_rps: (bucket.requests / window_secs).max(1),
                total_requests: bucket.requests,
                mitigated: true,
                tier: DetectionTier::Heuristic,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use zonewatch_api::types::{AttackDimensions, AttackMax, AttackSum, FirewallDimensions};

    use super::*;

    fn zone() -> Zone {
        Zone::from_id("z1").with_name("example.com")
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, h, m, 0).unwrap()
    }

    fn blocked(count: u64, ts: &str, ip: &str) -> FirewallEventGroup {
        FirewallEventGroup {
            count,
            dimensions: Some(FirewallDimensions {
                datetime: Some(ts.into()),
                client_ip: Some(ip.into()),
                ..FirewallDimensions::default()
            }),
        }
    }

    fn attack(id: &str, start: &str, end: Option<&str>, proto: &str, dst: u32) -> AttackGroup {
        AttackGroup {
            count: 1,
            dimensions: Some(AttackDimensions {
                attack_id: Some(id.into()),
                attack_type: Some("SYN flood".into()),
                mitigation_type: Some("drop".into()),
                start_datetime: Some(start.into()),
                end_datetime: end.map(String::from),
                ip_protocol_name: Some(proto.into()),
                source_port: None,
                destination_port: Some(dst),
            }),
            sum: Some(AttackSum {
                packets: Some(1_000.0),
                bits: None,
            }),
            max: Some(AttackMax {
                packet_rate: Some(0.0),
                bit_rate: Some(96_000.0),
            }),
        }
    }

    // ── Peak rate ──

    #[test]
    fn bit_rate_converts_at_1500_byte_packets() {
        assert_eq!(peak_rps_estimate(Some(0.0), Some(12_000.0), 0.0, 0), 1);
        assert_eq!(peak_rps_estimate(None, Some(120_000_000.0), 0.0, 0), 10_000);
    }

    #[test]
    fn reported_packet_rate_wins() {
        assert_eq!(peak_rps_estimate(Some(4_200.0), Some(1e12), 9.0, 60), 4_200);
    }

    #[test]
    fn duration_estimate_guards_zero_duration() {
        assert_eq!(peak_rps_estimate(None, None, 6_000.0, 60), 100);
        assert_eq!(peak_rps_estimate(None, None, 6_000.0, 0), 6_000);
        assert_eq!(peak_rps_estimate(None, None, 0.0, 0), 1);
    }

    // ── Dedicated tiers ──

    #[test]
    fn groups_sharing_an_attack_id_merge() {
        let groups = vec![
            attack("a1", "2024-06-15T10:05:00Z", Some("2024-06-15T10:20:00Z"), "TCP", 443),
            attack("a1", "2024-06-15T10:00:00Z", Some("2024-06-15T10:10:00Z"), "UDP", 53),
            attack("a1", "2024-06-15T10:02:00Z", None, "TCP", 443),
        ];

        let events = merge_attack_groups(&groups, &zone(), DetectionTier::Zone);

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.start, at(10, 0));
        assert_eq!(event.end, Some(at(10, 20)));
        assert_eq!(event.total_requests, 3_000);
        assert_eq!(event.peak_rps, 8);
        assert_eq!(
            event.attack_type,
            "SYN flood (drop) [TCP src:* dst:443, UDP src:* dst:53]"
        );
        assert!(event.mitigated);
        assert_eq!(event.tier, DetectionTier::Zone);
    }

    #[test]
    fn unparsable_start_is_skipped_and_inverted_end_dropped() {
        let groups = vec![
            attack("bad", "not-a-time", None, "TCP", 80),
            attack("a2", "2024-06-15T10:00:00Z", Some("2024-06-15T09:00:00Z"), "TCP", 80),
        ];

        let events = merge_attack_groups(&groups, &zone(), DetectionTier::Account);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].end, None);
        assert!(events[0].id.starts_with("z1:"));
    }

    // ── Heuristic ──

    #[test]
    fn volumetric_bucket_floors_peak_to_one() {
        let groups: Vec<_> = (0..10)
            .map(|i| blocked(120, "2024-06-15T10:42:00Z", &format!("198.51.100.{i}")))
            .collect();

        let events = heuristic_events(&groups, &zone(), at(12, 0));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].attack_type, "Volumetric attack (10 source IPs)");
        assert_eq!(events[0].total_requests, 1_200);
        assert_eq!(events[0].peak_rps, 1);
        assert_eq!(events[0].start, at(10, 0));
        assert_eq!(events[0].end, Some(at(11, 0)));
    }

    #[test]
    fn spread_bucket_is_distributed() {
        assert_eq!(
            classify_bucket(600, 80).as_deref(),
            Some("Distributed attack (80 source IPs)")
        );
    }

    #[test]
    fn small_bucket_is_not_promoted() {
        assert_eq!(classify_bucket(400, 200), None);
        assert_eq!(classify_bucket(1_000, 10), None);
        assert_eq!(classify_bucket(600, 50), None);
    }

    #[test]
    fn unparsable_timestamps_land_an_hour_before_window_end() {
        let groups = vec![
            blocked(700, "garbage", "203.0.113.1"),
            blocked(700, "", "203.0.113.2"),
            blocked(5, "2024-06-15T08:59:59Z", "203.0.113.1"),
        ];

        let buckets = bucket_hourly(&groups, at(12, 30));

        assert_eq!(
            buckets,
            vec![
                HourBucket {
                    start: at(8, 0),
                    requests: 5,
                    source_ips: 1
                },
                HourBucket {
                    start: at(11, 30),
                    requests: 1_400,
                    source_ips: 2
                },
            ]
        );
    }
}
