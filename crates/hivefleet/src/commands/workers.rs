//! Worker command handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use tabled::Tabled;

use hivefleet_core::{
    CommandOutcome, DeviceInfo, FleetRegistry, ToggleEntity, WorkerAttributes, WorkerKey,
    WorkerSnapshot, WorkerSwitch,
};

use crate::cli::{GlobalOpts, WorkerRef, WorkersArgs, WorkersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WorkerRow {
    #[tabled(rename = "Farm")]
    farm: u64,
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "GPUs")]
    gpus: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Upgrade")]
    upgrade: String,
}

fn row(w: &WorkerSnapshot, color: bool) -> WorkerRow {
    WorkerRow {
        farm: w.farm_id,
        id: w.unique_id,
        name: w.name.clone(),
        state: output::paint_state(w.is_on(), w.is_available(), color),
        gpus: format!("{}/{}", w.gpus_online, w.total_gpus()),
        version: w.version.clone(),
        upgrade: if w.needs_upgrade { "pending" } else { "" }.into(),
    }
}

// ── Detail view ─────────────────────────────────────────────────────

/// Everything `workers show` knows about one worker.
#[derive(Serialize)]
struct WorkerView {
    #[serde(flatten)]
    attributes: WorkerAttributes,
    name: String,
    is_on: bool,
    available: bool,
    snapshot: Option<Arc<WorkerSnapshot>>,
    device: DeviceInfo,
    last_success: Option<DateTime<Utc>>,
}

impl WorkerView {
    fn from_switch(switch: &WorkerSwitch) -> Self {
        Self {
            attributes: switch.attributes(),
            name: switch.name(),
            is_on: switch.is_on(),
            available: switch.available(),
            snapshot: switch.snapshot(),
            device: switch.device_info(),
            last_success: switch.coordinator().state().last_success,
        }
    }
}

fn detail(v: &WorkerView, color: bool) -> String {
    let mut lines = vec![
        format!("Worker:   {}", v.name),
        format!(
            "ID:       {}/{}",
            v.attributes.farm_id, v.attributes.worker_id
        ),
        format!(
            "State:    {}",
            output::paint_state(v.is_on, v.available, color)
        ),
        format!("Version:  {}", v.attributes.version),
        format!("Device:   {}", v.device.identifier),
    ];
    if let Some(ref s) = v.snapshot {
        lines.push(format!(
            "GPUs:     {} online, {} offline",
            s.gpus_online, s.gpus_offline
        ));
        lines.push(format!("Online:   {}", if s.online { "yes" } else { "no" }));
        if s.needs_upgrade {
            lines.push("Upgrade:  pending".into());
        }
    }
    if let Some(at) = v.last_success {
        lines.push(format!("Polled:   {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    registry: &FleetRegistry,
    args: WorkersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        WorkersCommand::List { farm } => {
            let workers = list(registry, farm).await?;
            let out = output::render_list(
                &global.output,
                &workers,
                |w| row(w, color),
                |w| w.key().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WorkersCommand::Show(target) => {
            let switch = probe(registry, target).await?;
            let view = WorkerView::from_switch(&switch);
            let out = output::render_single(
                &global.output,
                &view,
                |v| detail(v, color),
                |v| v.is_on.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WorkersCommand::On(target) => {
            let switch = probe(registry, target).await?;
            let outcome = switch.turn_on().await.map_err(|e| worker_err(target, e))?;
            report(global, "miner start", &switch, outcome);
            Ok(())
        }

        WorkersCommand::Off(target) => {
            let switch = probe(registry, target).await?;
            let outcome = switch.turn_off().await.map_err(|e| worker_err(target, e))?;
            report(global, "miner stop", &switch, outcome);
            Ok(())
        }

        WorkersCommand::Restart(target) => {
            let switch = probe(registry, target).await?;
            let outcome = switch
                .restart_miner()
                .await
                .map_err(|e| worker_err(target, e))?;
            report(global, "miner restart", &switch, outcome);
            Ok(())
        }

        WorkersCommand::Reboot(target) => {
            let switch = probe(registry, target).await?;
            if !util::confirm(&format!("Reboot {}?", label(&switch)), "reboot", global.yes)? {
                return Ok(());
            }
            let outcome = switch.reboot().await.map_err(|e| worker_err(target, e))?;
            report(global, "reboot", &switch, outcome);
            Ok(())
        }

        WorkersCommand::Shutdown(target) => {
            let switch = probe(registry, target).await?;
            if !util::confirm(
                &format!("Power off {}? It will not come back on its own.", label(&switch)),
                "shutdown",
                global.yes,
            )? {
                return Ok(());
            }
            let outcome = switch.shutdown().await.map_err(|e| worker_err(target, e))?;
            report(global, "shutdown", &switch, outcome);
            Ok(())
        }

        WorkersCommand::Upgrade(target) => {
            let switch = probe(registry, target).await?;
            if !util::confirm(
                &format!("Upgrade Hive OS on {}?", label(&switch)),
                "upgrade",
                global.yes,
            )? {
                return Ok(());
            }
            let outcome = switch.upgrade().await.map_err(|e| worker_err(target, e))?;
            report(global, "upgrade", &switch, outcome);
            Ok(())
        }
    }
}

/// Workers of one farm, or of every farm sorted by key.
async fn list(
    registry: &FleetRegistry,
    farm: Option<u64>,
) -> Result<Vec<WorkerSnapshot>, CliError> {
    if let Some(farm_id) = farm {
        return registry.list_workers(farm_id).await.map_err(|e| {
            match e.root() {
                hivefleet_core::CoreError::Api { status: 404, .. } => CliError::NotFound {
                    resource_type: "farm".into(),
                    identifier: farm_id.to_string(),
                    list_command: "farms list".into(),
                },
                _ => e.into(),
            }
        });
    }

    let farms = registry.farms().await?;
    let per_farm = try_join_all(farms.iter().map(|f| registry.list_workers(f.id))).await?;
    let mut workers: Vec<_> = per_farm.into_iter().flatten().collect();
    workers.sort_by_key(WorkerSnapshot::key);
    Ok(workers)
}

async fn probe(registry: &FleetRegistry, target: WorkerRef) -> Result<WorkerSwitch, CliError> {
    let key = WorkerKey::from(target);
    registry
        .probe(key)
        .await
        .map_err(|e| CliError::for_worker(key, e))
}

fn worker_err(target: WorkerRef, err: hivefleet_core::CoreError) -> CliError {
    CliError::for_worker(target.into(), err)
}

fn label(switch: &WorkerSwitch) -> String {
    format!("{} ({})", switch.name(), switch.key())
}

fn report(global: &GlobalOpts, action: &str, switch: &WorkerSwitch, outcome: CommandOutcome) {
    if !global.quiet {
        eprintln!("{}", util::describe_outcome(action, &label(switch), outcome));
    }
}
