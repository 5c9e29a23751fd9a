//! Zone list handler.

use tabled::Tabled;
use zonewatch_core::{Monitor, Zone};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Plan")]
    plan: String,
}

impl From<&Zone> for ZoneRow {
    fn from(z: &Zone) -> Self {
        Self {
            id: z.id.clone(),
            name: z.name.clone(),
            status: z.status.to_string(),
            plan: z.plan.clone().unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    let zones = monitor.fetch_zones().await?;
    let out = output::render_list(&global.output, &zones, |z| ZoneRow::from(z), |z| z.name.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}
