//! Aggregation and detection layer between `zonewatch-api` and front ends.
//!
//! - **[`Analytics`]**: issues time-windowed GraphQL queries for firewall
//!   event groups and shapes them into [`TopBlock`] and [`IpHit`] rows, plus
//!   the blocked-request total for the window.
//!
//! - **[`rank()`]**: stable Top-N by count, shared by every ranked view.
//!
//! - **DDoS classification** ([`Analytics::ddos_events`]): tiered detection,
//!   account-level attack analytics, then zone-level, then an hourly
//!   bucketing heuristic over blocked events.
//!
//! - **[`Monitor`]**: drives periodic and on-demand refresh cycles and
//!   publishes an immutable [`MonitorState`] through a `watch` channel.
//!   Only the most recently started cycle may publish.

pub mod analytics;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod monitor;

// ── Primary re-exports ──────────────────────────────────────────────
pub use analytics::{Analytics, TimeWindow, rank};
pub use config::{AnalyticsConfig, MonitorConfig};
pub use error::CoreError;
pub use model::{DdosEvent, DetectionTier, IpHit, TopBlock, Zone, ZoneReport, ZoneStatus};
pub use monitor::{Monitor, MonitorState};
