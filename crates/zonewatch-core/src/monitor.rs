// ── Monitor ──
//
// Refresh scheduler and published state. Two triggers (a fixed interval
// and a debounced zone selection) route through `refresh_now`. Each cycle
// takes a generation number; only the most recently started cycle may
// publish, and it publishes the whole state in one `watch` update.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use zonewatch_api::{ApiClient, CredentialResolver};

use crate::analytics::{Analytics, TimeWindow};
use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::{Zone, ZoneReport};

// ── Published state ──────────────────────────────────────────────────

/// Immutable view handed to collaborators on every change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonitorState {
    pub zones: Arc<Vec<Zone>>,
    pub selected_zone: Option<String>,
    pub report: Arc<ZoneReport>,
    pub authenticated: bool,
    pub loading: bool,
    pub last_error: Option<String>,
    pub last_refresh: Option<DateTime<Utc>>,
}

// ── Monitor ──────────────────────────────────────────────────────────

/// Cheaply cloneable handle driving refresh cycles.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    api: Arc<ApiClient>,
    analytics: Analytics,
    state: watch::Sender<MonitorState>,
    selection: watch::Sender<Option<String>>,
    generation: AtomicU64,
    tasks: Mutex<Tasks>,
}

/// Background tasks of the current run. The token is replaced when a
/// stopped monitor is started again.
#[derive(Default)]
struct Tasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Monitor {
    /// Build a monitor. Does NOT start background tasks; call
    /// [`start()`](Self::start) for that.
    pub fn new(
        config: MonitorConfig,
        credentials: Arc<CredentialResolver>,
    ) -> Result<Self, CoreError> {
        let api = ApiClient::new(&config.base_url, credentials, &config.transport)?;
        Ok(Self::with_client(config, api))
    }

    /// Build a monitor around an existing API client.
    pub fn with_client(config: MonitorConfig, api: ApiClient) -> Self {
        let api = Arc::new(api);
        let analytics = Analytics::new(Arc::clone(&api), config.analytics.clone());
        let (state, _) = watch::channel(MonitorState {
            authenticated: api.credentials().is_authenticated(),
            ..MonitorState::default()
        });
        let (selection, _) = watch::channel(None);

        Self {
            inner: Arc::new(MonitorInner {
                config,
                api,
                analytics,
                state,
                selection,
                generation: AtomicU64::new(0),
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn analytics(&self) -> &Analytics {
        &self.inner.analytics
    }

    pub fn credentials(&self) -> &Arc<CredentialResolver> {
        self.inner.api.credentials()
    }

    /// Account used for account-level attack analytics: the configured
    /// one, else the one stored with the resolved token.
    pub fn account_id(&self) -> Option<String> {
        self.inner.config.account_id.clone().or_else(|| {
            self.credentials()
                .current()
                .ok()
                .and_then(|record| record.account_id.clone())
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the interval timer and the selection watcher.
    ///
    /// The timer fires immediately, so starting also performs the
    /// initial load. Calling it on a running monitor is a no-op; after
    /// [`shutdown()`](Self::shutdown) it starts a fresh run.
    pub async fn start(&self) {
        let mut tasks = self.inner.tasks.lock().await;
        if !tasks.handles.is_empty() {
            return;
        }
        if tasks.cancel.is_cancelled() {
            tasks.cancel = CancellationToken::new();
        }
        let cancel = tasks.cancel.clone();

        let interval = self.inner.config.refresh_interval;
        let refresh = if interval.is_zero() {
            let monitor = self.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = monitor.refresh_now() => {}
                }
            })
        } else {
            tokio::spawn(refresh_task(self.clone(), interval, cancel.clone()))
        };
        tasks.handles.push(refresh);

        tasks.handles.push(tokio::spawn(selection_task(
            self.clone(),
            self.inner.selection.subscribe(),
            self.inner.config.selection_debounce,
            cancel,
        )));
        info!(interval_secs = interval.as_secs(), "monitor started");
    }

    /// Cancel background tasks, including cycles started by a selection
    /// change, and wait for them to finish. Nothing publishes afterwards
    /// until the next [`start()`](Self::start) or explicit refresh.
    pub async fn shutdown(&self) {
        let mut tasks = self.inner.tasks.lock().await;
        tasks.cancel.cancel();
        for handle in tasks.handles.drain(..) {
            let _ = handle.await;
        }
        debug!("monitor stopped");
    }

    // ── Collaborator operations ──────────────────────────────────────

    /// Run one full cycle. Returns once the result is published, or
    /// discarded because a newer cycle started meanwhile.
    pub async fn refresh_now(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let selected = self.inner.selection.borrow().clone();
        self.inner.state.send_modify(|s| s.loading = true);
        info!(generation, zone = ?selected, "refresh cycle started");

        let prior_zones = Arc::clone(&self.inner.state.borrow().zones);
        let (zones, mut failure) = match self.fetch_zones().await {
            Ok(zones) => (Arc::new(zones), None),
            Err(e) => (Arc::clone(&prior_zones), Some(e)),
        };

        let target = selected
            .as_deref()
            .map(|identifier| locate_zone(identifier, &zones, &prior_zones));
        let report = match &target {
            None => Ok(ZoneReport::default()),
            Some(_) if failure.as_ref().is_some_and(CoreError::is_auth) => Err(None),
            Some(zone) => self.aggregate(zone).await.map_err(Some),
        };
        let report = match report {
            Ok(report) => report,
            Err(e) => {
                if failure.is_none() {
                    failure = e;
                }
                ZoneReport::empty_for(target.map(|zone| zone.id))
            }
        };

        let authenticated = self.inner.api.credentials().is_authenticated()
            && !failure.as_ref().is_some_and(CoreError::is_auth);
        if let Some(e) = &failure {
            warn!(generation, error = %e, "refresh cycle failed");
        }

        let applied = self.inner.state.send_if_modified(|s| {
            if self.inner.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.zones = zones;
            s.report = Arc::new(report);
            s.authenticated = authenticated;
            s.loading = false;
            s.last_error = failure.map(|e| e.to_string());
            s.last_refresh = Some(Utc::now());
            true
        });

        if applied {
            info!(generation, "refresh cycle published");
        } else {
            debug!(generation, "discarding stale refresh cycle");
        }
    }

    /// Record the selected zone (id or name). The selection watcher
    /// refreshes once the selection has been quiet for the debounce period.
    ///
    /// A change also supersedes any cycle in flight: the state is marked
    /// loading and the older cycle's result is discarded.
    pub fn select_zone(&self, zone: Option<String>) {
        let zone = zone.filter(|z| !z.trim().is_empty());
        let changed = self.inner.selection.send_if_modified(|current| {
            if *current == zone {
                false
            } else {
                current.clone_from(&zone);
                true
            }
        });
        if changed {
            debug!(zone = ?zone, "zone selection changed");
            self.inner.state.send_modify(|s| {
                self.inner.generation.fetch_add(1, Ordering::SeqCst);
                s.selected_zone = zone;
                s.loading = true;
            });
        }
    }

    /// Apply a token in memory (highest priority) and refresh.
    pub async fn set_credential(&self, token: &str, account_id: Option<String>) {
        self.credentials().set_override(token, account_id);
        self.refresh_now().await;
    }

    /// Drop the in-memory token and refresh with whatever the persistent
    /// sources provide.
    pub async fn clear_credential(&self) {
        self.credentials().clear_override();
        self.refresh_now().await;
    }

    /// Re-run credential resolution from scratch and refresh.
    pub async fn reload_credentials(&self) {
        self.credentials().reload();
        self.refresh_now().await;
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to published state changes.
    pub fn state(&self) -> watch::Receiver<MonitorState> {
        self.inner.state.subscribe()
    }

    /// Current published state.
    pub fn snapshot(&self) -> MonitorState {
        self.inner.state.borrow().clone()
    }

    // ── One-shot helpers ─────────────────────────────────────────────

    /// Fetch every zone visible to the current token.
    pub async fn fetch_zones(&self) -> Result<Vec<Zone>, CoreError> {
        let zones = self.inner.api.list_zones().await?;
        debug!(count = zones.len(), "zones fetched");
        Ok(zones.into_iter().map(Zone::from).collect())
    }

    /// Look a zone up by id or name.
    pub async fn find_zone(&self, identifier: &str) -> Result<Zone, CoreError> {
        self.fetch_zones()
            .await?
            .into_iter()
            .find(|z| z.matches(identifier))
            .ok_or_else(|| CoreError::ZoneNotFound {
                identifier: identifier.to_owned(),
            })
    }

    /// Run the four zone-scoped queries concurrently and assemble a
    /// report. Any failure fails the whole report.
    pub async fn aggregate(&self, zone: &Zone) -> Result<ZoneReport, CoreError> {
        let analytics = &self.inner.analytics;
        let now = Utc::now();
        let window = TimeWindow::last_days(analytics.config().lookback_days, now);
        let ddos_window = TimeWindow::last_days(analytics.config().ddos_lookback_days, now);
        let account_id = self.account_id();

        let (blocks, hits, ddos, total) = tokio::join!(
            analytics.top_blocks(zone, &window),
            analytics.ip_hits(zone, &window),
            analytics.ddos_events(zone, account_id.as_deref(), &ddos_window),
            analytics.blocked_total(zone, &window),
        );

        Ok(ZoneReport {
            zone_id: Some(zone.id.clone()),
            top_blocks: blocks?,
            ip_hits: hits?,
            ddos_events: ddos?,
            blocked_total: total?,
            generated_at: Some(now),
        })
    }
}

/// Resolve a selected identifier against the fresh list, then the prior
/// list, then fall back to treating it as a raw zone id.
fn locate_zone(identifier: &str, zones: &[Zone], prior: &[Zone]) -> Zone {
    zones
        .iter()
        .chain(prior)
        .find(|z| z.matches(identifier))
        .cloned()
        .unwrap_or_else(|| Zone::from_id(identifier))
}

// ── Background tasks ─────────────────────────────────────────────────

/// Periodically run a full cycle. The first tick fires immediately.
async fn refresh_task(monitor: Monitor, every: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => monitor.refresh_now().await,
        }
    }
}

/// Wait for a selection change, let it settle for `debounce`, then start
/// a cycle. Cycles run in their own tasks so a newer selection can
/// supersede one still in flight; they are aborted when the watcher stops.
async fn selection_task(
    monitor: Monitor,
    mut selection: watch::Receiver<Option<String>>,
    debounce: Duration,
    cancel: CancellationToken,
) {
    let mut cycles = JoinSet::new();

    'watch: loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = selection.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break 'watch,
                changed = selection.changed() => {
                    if changed.is_err() {
                        break 'watch;
                    }
                }
                () = tokio::time::sleep(debounce) => break,
            }
        }

        while cycles.try_join_next().is_some() {}
        let monitor = monitor.clone();
        cycles.spawn(async move { monitor.refresh_now().await });
    }

    cycles.shutdown().await;
}
