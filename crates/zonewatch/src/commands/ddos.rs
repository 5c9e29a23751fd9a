//! DDoS event handler.

use chrono::Utc;
use tabled::Tabled;
use zonewatch_core::{DdosEvent, Monitor, TimeWindow};

use crate::cli::{DdosArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(super) struct DdosRow {
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Type")]
    attack_type: String,
    #[tabled(rename = "Peak RPS")]
    peak_rps: String,
    #[tabled(rename = "Requests")]
    requests: String,
    #[tabled(rename = "Source")]
    tier: String,
}

impl From<&DdosEvent> for DdosRow {
    fn from(e: &DdosEvent) -> Self {
        Self {
            start: e.start.format("%Y-%m-%d %H:%M UTC").to_string(),
            duration: e.duration().map_or_else(|| "ongoing".into(), fmt_duration),
            attack_type: e.attack_type.clone(),
            peak_rps: output::fmt_count(e.peak_rps),
            requests: output::fmt_count(e.total_requests),
            tier: e.tier.to_string(),
        }
    }
}

fn fmt_duration(d: chrono::Duration) -> String {
    let minutes = d.num_minutes();
    if minutes >= 60 {
        format!("{}h {:02}m", minutes / 60, minutes % 60)
    } else if minutes > 0 {
        format!("{minutes}m")
    } else {
        format!("{}s", d.num_seconds().max(0))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &Monitor,
    args: DdosArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let analytics = monitor.analytics();
    let days = args.days.unwrap_or(analytics.config().ddos_lookback_days);
    if days == 0 {
        return Err(CliError::Validation {
            field: "days".into(),
            reason: "must be at least 1".into(),
        });
    }

    let zone = monitor.find_zone(&args.zone).await?;
    let window = TimeWindow::last_days(days, Utc::now());
    let account_id = monitor.account_id();
    let events = analytics
        .ddos_events(&zone, account_id.as_deref(), &window)
        .await?;

    let out = output::render_list(&global.output, &events, |e| DdosRow::from(e), |e| e.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_compact() {
        assert_eq!(fmt_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(fmt_duration(chrono::Duration::minutes(9)), "9m");
        assert_eq!(fmt_duration(chrono::Duration::minutes(125)), "2h 05m");
    }
}
