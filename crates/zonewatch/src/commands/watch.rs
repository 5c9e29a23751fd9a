//! Long-running watch: start the monitor and print every published state
//! until interrupted.

use zonewatch_core::{Monitor, MonitorState};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    monitor: &Monitor,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !monitor.credentials().is_authenticated() {
        return Err(CliError::NoCredentials);
    }

    let color = output::should_color(&global.color);
    let mut state = monitor.state();
    monitor.select_zone(args.zone);
    monitor.start().await;
    tracing::info!("watching; press Ctrl-C to stop");

    let mut last_printed = None;
    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal.map_err(CliError::from),
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = state.borrow_and_update().clone();
                if snapshot.loading || snapshot.last_refresh == last_printed {
                    continue;
                }
                last_printed = snapshot.last_refresh;
                let out = render_snapshot(&global.output, &snapshot, color);
                output::print_output(&out, global.quiet);
            }
        }
    };

    monitor.shutdown().await;
    result
}

fn render_snapshot(format: &OutputFormat, state: &MonitorState, color: bool) -> String {
    match format {
        // One document per line, so the stream stays line-oriented.
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_single(
            &OutputFormat::JsonCompact,
            state,
            summary_line_plain,
            summary_line_plain,
        ),
        OutputFormat::Table => summary_line(state, color),
        _ => output::render_single(format, state, summary_line_plain, |s| {
            s.report.blocked_total.to_string()
        }),
    }
}

fn summary_line_plain(state: &MonitorState) -> String {
    summary_line(state, false)
}

fn summary_line(state: &MonitorState, color: bool) -> String {
    let stamp = state
        .last_refresh
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();

    let mut line = match state.report.zone_id.as_deref() {
        None => format!("[{stamp}] {} zones", state.zones.len()),
        Some(zone_id) => {
            let name = state
                .zones
                .iter()
                .find(|z| z.id == zone_id)
                .map_or(zone_id, |z| z.name.as_str());
            let ddos = state.report.ddos_events.len();
            let ddos = if ddos == 0 {
                output::good("no DDoS", color)
            } else {
                output::bad(&format!("{ddos} DDoS events"), color)
            };
            let mut line = format!(
                "[{stamp}] {}: {} blocked, {ddos}",
                output::heading(name, color),
                output::fmt_count(state.report.blocked_total),
            );
            if let Some(top) = state.report.ip_hits.first() {
                let count = output::fmt_count(top.request_count);
                line.push_str(&format!(", top IP {} ({count})", top.ip));
            }
            line
        }
    };

    if let Some(err) = &state.last_error {
        line.push_str("  ");
        line.push_str(&output::bad(&format!("error: {err}"), color));
    }
    line
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use zonewatch_core::{IpHit, Zone, ZoneReport};

    use super::*;

    fn state() -> MonitorState {
        let hit = IpHit {
            zone_id: "z1".into(),
            zone_name: "example.com".into(),
            ip: "192.0.2.9".into(),
            request_count: 2_048,
            blocked_count: 2_000,
            country: None,
            last_seen: chrono::DateTime::UNIX_EPOCH,
        };
        MonitorState {
            zones: Arc::new(vec![Zone::from_id("z1").with_name("example.com")]),
            report: Arc::new(ZoneReport {
                zone_id: Some("z1".into()),
                ip_hits: vec![hit],
                blocked_total: 12_345,
                ..ZoneReport::default()
            }),
            authenticated: true,
            ..MonitorState::default()
        }
    }

    #[test]
    fn summary_names_zone_and_totals() {
        let line = summary_line(&state(), false);
        assert_eq!(line, "[] example.com: 12,345 blocked, no DDoS, top IP 192.0.2.9 (2,048)");
    }

    #[test]
    fn summary_without_selection_counts_zones() {
        let mut s = state();
        s.report = Arc::new(ZoneReport::default());
        s.last_error = Some("HTTP 500".into());
        assert_eq!(summary_line(&s, false), "[] 1 zones  error: HTTP 500");
    }

    #[test]
    fn json_stream_is_single_line() {
        let out = render_snapshot(&OutputFormat::Json, &state(), false);
        assert!(!out.contains('\n'));
        assert!(out.contains("\"blocked_total\":12345"));
    }
}
