//! Command dispatch: bridges CLI args -> registry operations -> output.

pub mod config_cmd;
pub mod farms;
pub mod util;
pub mod watch;
pub mod workers;

use hivefleet_core::{FleetConfig, FleetRegistry};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    registry: &FleetRegistry,
    fleet: &FleetConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Farms(args) => farms::handle(registry, args, global).await,
        Command::Workers(args) => workers::handle(registry, args, global).await,
        Command::Watch(args) => watch::handle(registry, args, fleet, global).await,
        // Handled before a registry is built.
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command does not need an API connection".into(),
        )),
    }
}
