//! Zone report handler.
//!
//! The table view stacks a short summary over three tables (blocked
//! paths, offending IPs, DDoS windows). Structured formats emit the zone
//! and its report together.

use std::fmt::Write as _;

use serde::Serialize;
use tabled::Tabled;
use zonewatch_core::{IpHit, Monitor, TopBlock, Zone, ZoneReport};

use crate::cli::{GlobalOpts, ZoneArgs};
use crate::error::CliError;
use crate::output;

use super::ddos::DdosRow;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct BlockRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Events")]
    count: String,
}

impl From<&TopBlock> for BlockRow {
    fn from(b: &TopBlock) -> Self {
        Self {
            host: b.host.clone(),
            path: b.path.clone(),
            ip: b.ip.clone(),
            action: b.action.clone(),
            count: output::fmt_count(b.count),
        }
    }
}

#[derive(Tabled)]
struct IpRow {
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Events")]
    requests: String,
    #[tabled(rename = "Blocked")]
    blocked: String,
}

impl From<&IpHit> for IpRow {
    fn from(h: &IpHit) -> Self {
        Self {
            ip: h.ip.clone(),
            country: h.country.clone().unwrap_or_default(),
            requests: output::fmt_count(h.request_count),
            blocked: output::fmt_count(h.blocked_count),
        }
    }
}

// ── View ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub(super) struct ReportView<'a> {
    pub zone: &'a Zone,
    pub report: &'a ZoneReport,
}

/// Multi-section table rendering of a zone report.
pub(super) fn render_detail(view: &ReportView<'_>, lookback_days: u32, color: bool) -> String {
    let ReportView { zone, report } = view;
    let mut out = String::new();

    let _ = writeln!(out, "{}  ({})", output::heading(&zone.name, color), zone.id);
    let _ = writeln!(
        out,
        "Blocked ({lookback_days}d):  {}",
        output::fmt_count(report.blocked_total)
    );
    if let Some(at) = report.generated_at {
        let _ = writeln!(out, "Generated:     {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    let _ = writeln!(out, "\n{}", output::heading("Top blocked paths", color));
    out.push_str(&section(&report.top_blocks, |b| BlockRow::from(b)));

    let _ = writeln!(out, "\n{}", output::heading("Top offending IPs", color));
    out.push_str(&section(&report.ip_hits, |h| IpRow::from(h)));

    let _ = writeln!(out, "\n{}", output::heading("DDoS attacks", color));
    if report.ddos_events.is_empty() {
        out.push_str(&output::good("  none detected", color));
    } else {
        let rows: Vec<DdosRow> = report.ddos_events.iter().map(DdosRow::from).collect();
        out.push_str(&output::render_table(&rows));
    }
    out
}

fn section<T, R: Tabled>(items: &[T], to_row: impl Fn(&T) -> R) -> String {
    if items.is_empty() {
        return "  (none)\n".into();
    }
    let rows: Vec<R> = items.iter().map(to_row).collect();
    format!("{}\n", output::render_table(&rows))
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &Monitor,
    args: ZoneArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let zone = monitor.find_zone(&args.zone).await?;
    let report = monitor.aggregate(&zone).await?;

    let color = output::should_color(&global.color);
    let lookback = monitor.analytics().config().lookback_days;
    let view = ReportView {
        zone: &zone,
        report: &report,
    };
    let out = output::render_single(
        &global.output,
        &view,
        |v| render_detail(v, lookback, color),
        |v| v.report.blocked_total.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn empty_report_renders_placeholders() {
        let zone = Zone::from_id("z1").with_name("example.com");
        let report = ZoneReport {
            zone_id: Some("z1".into()),
            blocked_total: 1_500,
            generated_at: Some(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()),
            ..ZoneReport::default()
        };
        let view = ReportView {
            zone: &zone,
            report: &report,
        };

        let out = render_detail(&view, 7, false);
        assert!(out.starts_with("example.com  (z1)\n"));
        assert!(out.contains("Blocked (7d):  1,500"));
        assert!(out.contains("Generated:     2024-06-15 12:00:00 UTC"));
        assert_eq!(out.matches("(none)").count(), 2);
        assert!(out.ends_with("none detected"));
    }
}
