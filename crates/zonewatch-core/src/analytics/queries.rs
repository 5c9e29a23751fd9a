// GraphQL templates for the analytics API.
//
// Every dataset is aliased to `groups` so `AnalyticsData<G>` decodes all
// of them. Variables: $zoneTag / $accountTag (string), $since / $until
// (RFC 3339), $limit (number).

/// Blocked and challenged events by path, host, client IP and action.
pub(crate) const TOP_BLOCKS: &str = r#"
query TopBlocks($zoneTag: string, $since: Time, $until: Time, $limit: uint64) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      groups: firewallEventsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $since, datetime_leq: $until, action_in: ["block", "challenge"] }
        orderBy: [count_DESC]
      ) {
        count
        dimensions {
          clientRequestPath
          clientRequestHTTPHost
          clientIP
          action
        }
      }
    }
  }
}
"#;

/// Blocked and challenged events by client IP, country and action.
pub(crate) const IP_HITS: &str = r#"
query IpHits($zoneTag: string, $since: Time, $until: Time, $limit: uint64) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      groups: firewallEventsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $since, datetime_leq: $until, action_in: ["block", "challenge"] }
        orderBy: [count_DESC]
      ) {
        count
        dimensions {
          clientIP
          clientCountryName
          action
        }
      }
    }
  }
}
"#;

/// Blocked and challenged events by action only, summed for the window total.
pub(crate) const BLOCKED_TOTAL: &str = r#"
query BlockedTotal($zoneTag: string, $since: Time, $until: Time, $limit: uint64) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      groups: firewallEventsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $since, datetime_leq: $until, action_in: ["block", "challenge"] }
        orderBy: [count_DESC]
      ) {
        count
        dimensions {
          action
        }
      }
    }
  }
}
"#;

/// Blocked events only, by timestamp and client IP, for hourly bucketing.
pub(crate) const BLOCKED_TIMELINE: &str = r#"
query BlockedTimeline($zoneTag: string, $since: Time, $until: Time, $limit: uint64) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      groups: firewallEventsAdaptiveGroups(
        limit: $limit
        filter: { datetime_geq: $since, datetime_leq: $until, action: "block" }
        orderBy: [count_DESC]
      ) {
        count
        dimensions {
          datetime
          clientIP
        }
      }
    }
  }
}
"#;

/// Attack analytics scoped to one zone.
pub(crate) const ZONE_ATTACKS: &str = r#"
query ZoneAttacks($zoneTag: string, $since: Time, $until: Time, $limit: uint64) {
  viewer {
    zones(filter: { zoneTag: $zoneTag }) {
      groups: dosdAttackAnalyticsGroups(
        limit: $limit
        filter: { startDatetime_geq: $since, startDatetime_leq: $until }
        orderBy: [startDatetime_DESC]
      ) {
        count
        dimensions {
          attackId
          attackType
          mitigationType
          startDatetime
          endDatetime
          ipProtocolName
          sourcePort
          destinationPort
        }
        sum {
          packets
          bits
        }
        max {
          packetRate
          bitRate
        }
      }
    }
  }
}
"#;

/// Attack analytics scoped to the whole account.
pub(crate) const ACCOUNT_ATTACKS: &str = r#"
query AccountAttacks($accountTag: string, $since: Time, $until: Time, $limit: uint64) {
  viewer {
    accounts(filter: { accountTag: $accountTag }) {
      groups: dosdAttackAnalyticsGroups(
        limit: $limit
        filter: { startDatetime_geq: $since, startDatetime_leq: $until }
        orderBy: [startDatetime_DESC]
      ) {
        count
        dimensions {
          attackId
          attackType
          mitigationType
          startDatetime
          endDatetime
          ipProtocolName
          sourcePort
          destinationPort
        }
        sum {
          packets
          bits
        }
        max {
          packetRate
          bitRate
        }
      }
    }
  }
}
"#;
