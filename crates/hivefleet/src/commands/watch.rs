//! `watch`: set up a coordinator per worker and stream state changes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use futures_util::stream::select_all;
use serde::Serialize;

use hivefleet_core::{
    CoordinatorState, FleetConfig, FleetRegistry, SetupPolicy, SetupReport, WorkerKey,
};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::error::CliError;
use crate::output;

/// One line of the watch stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct WatchEvent {
    at: DateTime<Utc>,
    farm_id: u64,
    worker_id: u64,
    name: String,
    is_on: bool,
    available: bool,
    gpus_online: u32,
    gpus_total: u32,
    last_update_success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl WatchEvent {
    fn from_state(key: WorkerKey, state: &CoordinatorState) -> Self {
        let snapshot = state.snapshot.as_deref();
        Self {
            at: Utc::now(),
            farm_id: key.farm_id,
            worker_id: key.worker_id,
            name: snapshot.map_or_else(|| key.coordinator_name(), |s| s.name.clone()),
            is_on: snapshot.is_some_and(|s| s.is_on()),
            available: snapshot.is_some_and(|s| s.is_available()),
            gpus_online: snapshot.map_or(0, |s| s.gpus_online),
            gpus_total: snapshot.map_or(0, |s| s.total_gpus()),
            last_update_success: state.last_update_success,
            error: if state.last_update_success {
                None
            } else {
                state.last_failure.as_ref().map(|f| f.reason.clone())
            },
        }
    }

    /// Whether anything but the timestamp differs.
    fn same_as(&self, other: &Self) -> bool {
        Self { at: other.at, ..self.clone() } == *other
    }
}

fn line(e: &WatchEvent, color: bool) -> String {
    let mut out = format!(
        "{}  {:<20} {:>6}  {}  gpus {}/{}",
        e.at.format("%H:%M:%S"),
        e.name,
        format!("{}/{}", e.farm_id, e.worker_id),
        output::paint_state(e.is_on, e.available, color),
        e.gpus_online,
        e.gpus_total,
    );
    if let Some(ref err) = e.error {
        out.push_str(&format!("  (poll failed: {err})"));
    }
    out
}

pub async fn handle(
    registry: &FleetRegistry,
    args: WatchArgs,
    fleet: &FleetConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let policy = if args.fail_fast {
        SetupPolicy::FailFast
    } else {
        fleet.setup_policy
    };

    let report = match args.farm {
        Some(farm_id) => {
            let keys: Vec<WorkerKey> = registry
                .list_workers(farm_id)
                .await?
                .iter()
                .map(|w| w.key())
                .collect();
            registry.setup(&keys, policy).await?
        }
        None => registry.setup_all(policy).await?,
    };
    announce(&report, global, fleet);

    if registry.is_empty() {
        return Ok(());
    }

    let color = output::should_color(&global.color);
    let mut updates = select_all(registry.switches().into_iter().map(|switch| {
        let key = switch.key();
        switch.coordinator().updates().map(move |state| (key, state))
    }));
    let mut last_seen: HashMap<WorkerKey, WatchEvent> = HashMap::new();

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted, stopping coordinators");
                break;
            }
            next = updates.next() => {
                let Some((key, state)) = next else { break };
                let event = WatchEvent::from_state(key, &state);
                if last_seen.get(&key).is_some_and(|prev| prev.same_as(&event)) {
                    continue;
                }
                let out = output::render_event(&global.output, &event, |e| line(e, color))?;
                output::print_output(&out, global.quiet);
                last_seen.insert(key, event);
            }
        }
    }

    registry.unload().await;
    if !global.quiet {
        eprintln!("Stopped watching {} worker(s)", last_seen.len());
    }
    Ok(())
}

fn announce(report: &SetupReport, global: &GlobalOpts, fleet: &FleetConfig) {
    if global.quiet {
        return;
    }
    for (key, err) in &report.skipped {
        eprintln!("- skipping worker {key}: {err}");
    }
    if report.loaded.is_empty() {
        eprintln!("No workers to watch");
    } else {
        eprintln!(
            "Watching {} worker(s), polling every {}s (Ctrl-C to stop)",
            report.loaded.len(),
            fleet.coordinator.update_interval.as_secs()
        );
    }
}
