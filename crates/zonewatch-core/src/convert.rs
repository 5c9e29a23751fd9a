// ── API-to-domain type conversions ──
//
// Bridges raw `zonewatch_api` response types into `zonewatch_core::model`
// types: parses timestamps, normalizes empty strings, and fills defaults.

use chrono::{DateTime, Utc};

use zonewatch_api::types::ZoneResponse;

use crate::model::{Zone, ZoneStatus};

// ── Helpers ────────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp as returned by the analytics API.
pub(crate) fn parse_datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Treat empty and whitespace-only strings as absent.
pub(crate) fn non_empty(raw: Option<&String>) -> Option<&str> {
    raw.map(|s| s.trim()).filter(|s| !s.is_empty())
}

// ── Zone ───────────────────────────────────────────────────────────

impl From<ZoneResponse> for Zone {
    fn from(z: ZoneResponse) -> Self {
        Self {
            id: z.id,
            name: z.name,
            status: ZoneStatus::from(z.status),
            plan: z
                .plan
                .and_then(|p| p.name)
                .filter(|name| !name.trim().is_empty()),
        }
    }
}
