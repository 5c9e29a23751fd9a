// ── Runtime configuration ──
//
// These types describe *what* to query and *how often*. They never touch
// disk: front ends build a `MonitorConfig` (usually via zonewatch-config)
// and hand it in.

use std::time::Duration;

use zonewatch_api::transport::TransportConfig;

/// Tuning for the event aggregator and DDoS classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    /// Rows kept in each ranked view.
    pub top_n: usize,
    /// Lookback for the blocked-path, IP, and total views (days).
    pub lookback_days: u32,
    /// Lookback for DDoS detection (days).
    pub ddos_lookback_days: u32,
    /// Group ceiling for full-window sums and the heuristic fallback.
    pub full_window_limit: u32,
    /// Group ceiling for the dedicated attack-analytics tiers.
    pub attack_limit: u32,
}

impl AnalyticsConfig {
    /// Ranked queries over-fetch so that folding rows per key still
    /// leaves `top_n` candidates.
    pub fn ranked_query_limit(&self) -> u32 {
        u32::try_from(self.top_n.saturating_mul(2)).unwrap_or(u32::MAX)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            lookback_days: 7,
            ddos_lookback_days: 30,
            full_window_limit: 10_000,
            attack_limit: 1_000,
        }
    }
}

/// Configuration for a [`Monitor`](crate::Monitor).
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// REST API root (e.g. `https://api.cloudflare.com/client/v4/`).
    pub base_url: String,
    /// HTTP transport tuning.
    pub transport: TransportConfig,
    /// How often to run a full refresh cycle. Zero disables the timer.
    pub refresh_interval: Duration,
    /// Quiet period after a zone selection change before refreshing.
    pub selection_debounce: Duration,
    pub analytics: AnalyticsConfig,
    /// Account for account-level attack analytics. When unset, the
    /// resolved credential's account id is used.
    pub account_id: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_url: zonewatch_api::DEFAULT_BASE_URL.into(),
            transport: TransportConfig::default(),
            refresh_interval: Duration::from_secs(300),
            selection_debounce: Duration::from_millis(300),
            analytics: AnalyticsConfig::default(),
            account_id: None,
        }
    }
}
