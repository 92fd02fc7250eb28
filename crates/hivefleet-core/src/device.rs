// ── Worker switch ──
//
// Renders a coordinator's cached snapshot as an on/off entity and relays
// commands to the API. State is never predicted locally: after a command
// the switch keeps showing the coordinator's snapshot until the next poll.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{info, warn};

use hivefleet_api::{MinerAction, WorkerCommand};

use crate::coordinator::{CoordinatorState, WorkerCoordinator};
use crate::error::CoreError;
use crate::model::{DeviceInfo, WorkerAttributes, WorkerKey, WorkerSnapshot};

/// Identifier domain used in [`DeviceInfo::identifier`].
pub const DEVICE_DOMAIN: &str = "hiveos";

/// Result of a switch action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The command was sent to the API.
    Sent,
    /// No API call was made.
    Skipped(SkipReason),
}

impl CommandOutcome {
    pub fn was_sent(self) -> bool {
        matches!(self, Self::Sent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    AlreadyOn,
    AlreadyOff,
    Unavailable,
    UpToDate,
}

/// A two-state entity backed by remote state.
///
/// Implementations decide where `is_on` comes from; [`WorkerSwitch`]
/// reads it straight from its coordinator.
#[async_trait]
pub trait ToggleEntity: Send + Sync {
    fn unique_id(&self) -> String;
    fn name(&self) -> String;
    fn is_on(&self) -> bool;
    fn available(&self) -> bool;
    /// `true` when `is_on` may be a local guess rather than observed state.
    fn assumed_state(&self) -> bool;
    async fn turn_on(&self) -> Result<CommandOutcome, CoreError>;
    async fn turn_off(&self) -> Result<CommandOutcome, CoreError>;
}

/// Switch entity for one worker, driven by its coordinator.
#[derive(Debug, Clone)]
pub struct WorkerSwitch {
    coordinator: WorkerCoordinator,
}

impl WorkerSwitch {
    pub fn new(coordinator: WorkerCoordinator) -> Self {
        Self { coordinator }
    }

    pub fn key(&self) -> WorkerKey {
        self.coordinator.key()
    }

    pub fn coordinator(&self) -> &WorkerCoordinator {
        &self.coordinator
    }

    pub fn snapshot(&self) -> Option<Arc<WorkerSnapshot>> {
        self.coordinator.snapshot()
    }

    /// Push channel for re-rendering when the coordinator updates.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.coordinator.subscribe()
    }

    pub fn attributes(&self) -> WorkerAttributes {
        let key = self.key();
        WorkerAttributes {
            farm_id: key.farm_id,
            worker_id: key.worker_id,
            version: self
                .snapshot()
                .map(|s| s.version.clone())
                .unwrap_or_default(),
        }
    }

    pub fn device_info(&self) -> DeviceInfo {
        let snapshot = self.snapshot();
        DeviceInfo {
            identifier: format!("{DEVICE_DOMAIN}:{}", self.key().worker_id),
            name: self.name(),
            sw_version: snapshot.map(|s| s.version.clone()).unwrap_or_default(),
        }
    }

    // ── Side-effect actions ──────────────────────────────────────────

    /// Power the rig off. Skipped when the worker is unavailable.
    pub async fn shutdown(&self) -> Result<CommandOutcome, CoreError> {
        self.send_if_available(WorkerCommand::Shutdown).await
    }

    pub async fn reboot(&self) -> Result<CommandOutcome, CoreError> {
        self.send_if_available(WorkerCommand::Reboot).await
    }

    pub async fn restart_miner(&self) -> Result<CommandOutcome, CoreError> {
        self.send_if_available(WorkerCommand::Miner(MinerAction::Restart))
            .await
    }

    /// Upgrade Hive OS. Only sent when the worker is available and the
    /// API reports a pending upgrade.
    pub async fn upgrade(&self) -> Result<CommandOutcome, CoreError> {
        if !self.available() {
            warn!(worker = %self.key(), "cannot upgrade: worker unavailable");
            return Ok(CommandOutcome::Skipped(SkipReason::Unavailable));
        }
        let needs_upgrade = self.snapshot().is_some_and(|s| s.needs_upgrade);
        if !needs_upgrade {
            info!(worker = %self.key(), "worker is already up to date");
            return Ok(CommandOutcome::Skipped(SkipReason::UpToDate));
        }
        self.send(WorkerCommand::Upgrade).await
    }

    async fn send_if_available(&self, command: WorkerCommand) -> Result<CommandOutcome, CoreError> {
        if !self.available() {
            warn!(
                worker = %self.key(),
                command = command.name(),
                "worker unavailable, command not sent"
            );
            return Ok(CommandOutcome::Skipped(SkipReason::Unavailable));
        }
        self.send(command).await
    }

    async fn send(&self, command: WorkerCommand) -> Result<CommandOutcome, CoreError> {
        self.coordinator.send_command(command).await?;
        Ok(CommandOutcome::Sent)
    }
}

#[async_trait]
impl ToggleEntity for WorkerSwitch {
    fn unique_id(&self) -> String {
        self.key().worker_id.to_string()
    }

    fn name(&self) -> String {
        self.snapshot()
            .map_or_else(|| self.coordinator.name().to_owned(), |s| s.name.clone())
    }

    fn is_on(&self) -> bool {
        self.snapshot().is_some_and(|s| s.is_on())
    }

    fn available(&self) -> bool {
        self.snapshot().is_some_and(|s| s.is_available())
    }

    fn assumed_state(&self) -> bool {
        false
    }

    async fn turn_on(&self) -> Result<CommandOutcome, CoreError> {
        if self.is_on() {
            return Ok(CommandOutcome::Skipped(SkipReason::AlreadyOn));
        }
        self.send(WorkerCommand::Miner(MinerAction::Start)).await
    }

    async fn turn_off(&self) -> Result<CommandOutcome, CoreError> {
        if !self.is_on() {
            return Ok(CommandOutcome::Skipped(SkipReason::AlreadyOff));
        }
        self.send(WorkerCommand::Miner(MinerAction::Stop)).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::CoordinatorConfig;
    use crate::source::HiveApi;
    use crate::testing::{FakeApi, record};

    const KEY: WorkerKey = WorkerKey {
        farm_id: 3,
        worker_id: 7,
    };

    async fn switch_with(
        gpus_online: u32,
        gpus_offline: u32,
        online: bool,
        needs_upgrade: bool,
    ) -> (Arc<FakeApi>, WorkerSwitch) {
        let api = Arc::new(FakeApi::new());
        api.set_record(record(KEY, gpus_online, gpus_offline, online, needs_upgrade));
        let coord = WorkerCoordinator::new(
            KEY,
            Arc::clone(&api) as Arc<dyn HiveApi>,
            CoordinatorConfig::default(),
        );
        coord.refresh_now().await.unwrap();
        (api, WorkerSwitch::new(coord))
    }

    #[tokio::test]
    async fn renders_snapshot_state() {
        let (_api, switch) = switch_with(2, 1, true, false).await;

        assert!(switch.is_on());
        assert!(switch.available());
        assert!(!switch.assumed_state());
        assert_eq!(switch.unique_id(), "7");
        assert_eq!(switch.name(), "rig7");
        assert_eq!(
            switch.attributes(),
            WorkerAttributes {
                farm_id: 3,
                worker_id: 7,
                version: "1.2".into(),
            }
        );
        assert_eq!(switch.device_info().identifier, "hiveos:7");
    }

    #[tokio::test]
    async fn no_snapshot_means_off_and_unavailable() {
        let api = Arc::new(FakeApi::new());
        let coord = WorkerCoordinator::new(
            KEY,
            Arc::clone(&api) as Arc<dyn HiveApi>,
            CoordinatorConfig::default(),
        );
        let switch = WorkerSwitch::new(coord);

        assert!(!switch.is_on());
        assert!(!switch.available());
        assert_eq!(switch.name(), "3_7");
    }

    #[tokio::test]
    async fn turn_on_when_on_makes_no_call() {
        let (api, switch) = switch_with(2, 0, true, false).await;

        let outcome = switch.turn_on().await.unwrap();

        assert_eq!(outcome, CommandOutcome::Skipped(SkipReason::AlreadyOn));
        assert!(api.commands().is_empty());
    }

    #[tokio::test]
    async fn turn_off_when_off_makes_no_call() {
        let (api, switch) = switch_with(0, 2, true, false).await;

        let outcome = switch.turn_off().await.unwrap();

        assert_eq!(outcome, CommandOutcome::Skipped(SkipReason::AlreadyOff));
        assert!(api.commands().is_empty());
    }

    #[tokio::test]
    async fn turn_on_sends_miner_start_without_predicting() {
        let (api, switch) = switch_with(0, 2, true, false).await;

        let outcome = switch.turn_on().await.unwrap();

        assert!(outcome.was_sent());
        assert_eq!(
            api.commands(),
            vec![(KEY, WorkerCommand::Miner(MinerAction::Start))]
        );
        // Still off until the next poll says otherwise.
        assert!(!switch.is_on());
    }

    #[tokio::test]
    async fn turn_off_sends_miner_stop() {
        let (api, switch) = switch_with(2, 0, true, false).await;

        switch.turn_off().await.unwrap();

        assert_eq!(
            api.commands(),
            vec![(KEY, WorkerCommand::Miner(MinerAction::Stop))]
        );
    }

    #[tokio::test]
    async fn upgrade_when_up_to_date_makes_no_call() {
        let (api, switch) = switch_with(2, 0, true, false).await;

        let outcome = switch.upgrade().await.unwrap();

        assert_eq!(outcome, CommandOutcome::Skipped(SkipReason::UpToDate));
        assert!(api.commands().is_empty());
    }

    #[tokio::test]
    async fn upgrade_when_pending_is_sent() {
        let (api, switch) = switch_with(2, 0, true, true).await;

        assert_eq!(switch.upgrade().await.unwrap(), CommandOutcome::Sent);
        assert_eq!(api.commands(), vec![(KEY, WorkerCommand::Upgrade)]);
    }

    #[tokio::test]
    async fn unavailable_worker_skips_side_effects() {
        let (api, switch) = switch_with(0, 0, true, true).await;

        for outcome in [
            switch.shutdown().await.unwrap(),
            switch.upgrade().await.unwrap(),
            switch.reboot().await.unwrap(),
            switch.restart_miner().await.unwrap(),
        ] {
            assert_eq!(outcome, CommandOutcome::Skipped(SkipReason::Unavailable));
        }
        assert!(api.commands().is_empty());
    }

    #[tokio::test]
    async fn available_worker_accepts_shutdown_and_restart() {
        let (api, switch) = switch_with(1, 0, true, false).await;

        switch.shutdown().await.unwrap();
        switch.restart_miner().await.unwrap();

        assert_eq!(
            api.commands(),
            vec![
                (KEY, WorkerCommand::Shutdown),
                (KEY, WorkerCommand::Miner(MinerAction::Restart)),
            ]
        );
    }
}
