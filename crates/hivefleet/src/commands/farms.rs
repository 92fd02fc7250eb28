//! Farm command handlers.

use hivefleet_core::{Farm, FleetRegistry};
use tabled::Tabled;

use crate::cli::{FarmsArgs, FarmsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct FarmRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Workers")]
    workers: String,
}

fn row(f: &Farm) -> FarmRow {
    FarmRow {
        id: f.id,
        name: f.name.clone(),
        workers: f.worker_count.map_or_else(|| "-".into(), |n| n.to_string()),
    }
}

pub async fn handle(
    registry: &FleetRegistry,
    args: FarmsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        FarmsCommand::List => {
            let farms = registry.farms().await?;
            let out = output::render_list(&global.output, &farms, row, |f| f.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
