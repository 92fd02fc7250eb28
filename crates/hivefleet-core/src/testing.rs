// In-memory `HiveApi` used by the coordinator, switch and registry tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use hivefleet_api::{Farm, WorkerCommand, WorkerRecord, WorkerStats, WorkerVersions};

use crate::model::WorkerKey;
use crate::source::HiveApi;

#[derive(Debug, Clone)]
pub(crate) enum FakeResponse {
    Record(WorkerRecord),
    Status(u16),
    Unauthorized,
}

#[derive(Default)]
struct FakeState {
    responses: BTreeMap<WorkerKey, FakeResponse>,
    farms: Vec<Farm>,
    fetch_delay: Duration,
    command_delay: Duration,
    fetches: usize,
    commands: Vec<(WorkerKey, WorkerCommand)>,
    failing_commands: HashSet<WorkerKey>,
    events: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
}

pub(crate) fn record(
    key: WorkerKey,
    gpus_online: u32,
    gpus_offline: u32,
    online: bool,
    needs_upgrade: bool,
) -> WorkerRecord {
    WorkerRecord {
        id: key.worker_id,
        name: format!("rig{}", key.worker_id),
        farm_id: key.farm_id,
        stats: Some(WorkerStats {
            gpus_online,
            gpus_offline,
            online,
        }),
        versions: WorkerVersions { hive: "1.2".into() },
        needs_upgrade,
    }
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_record(&self, record: WorkerRecord) {
        let key = WorkerKey::new(record.farm_id, record.id);
        self.set_response(key, FakeResponse::Record(record));
    }

    pub(crate) fn set_response(&self, key: WorkerKey, response: FakeResponse) {
        self.state.lock().unwrap().responses.insert(key, response);
    }

    pub(crate) fn add_farm(&self, id: u64, name: &str) {
        self.state.lock().unwrap().farms.push(Farm {
            id,
            name: name.into(),
            workers_count: None,
        });
    }

    pub(crate) fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().unwrap().fetch_delay = delay;
    }

    pub(crate) fn set_command_delay(&self, delay: Duration) {
        self.state.lock().unwrap().command_delay = delay;
    }

    pub(crate) fn fail_commands_for(&self, key: WorkerKey) {
        self.state.lock().unwrap().failing_commands.insert(key);
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub(crate) fn commands(&self) -> Vec<(WorkerKey, WorkerCommand)> {
        self.state.lock().unwrap().commands.clone()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    fn event(&self, event: impl Into<String>) {
        self.state.lock().unwrap().events.push(event.into());
    }
}

#[async_trait]
impl HiveApi for FakeApi {
    async fn fetch_worker(
        &self,
        farm_id: u64,
        worker_id: u64,
    ) -> Result<WorkerRecord, hivefleet_api::Error> {
        let key = WorkerKey::new(farm_id, worker_id);
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.fetches += 1;
            state.events.push(format!("fetch:start:{key}"));
            state.fetch_delay
        };

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self.state.lock().unwrap().responses.get(&key).cloned();
        self.event(format!("fetch:end:{key}"));

        match response {
            Some(FakeResponse::Record(record)) => Ok(record),
            Some(FakeResponse::Status(status)) => Err(hivefleet_api::Error::Api {
                status,
                body: "fake failure".into(),
            }),
            Some(FakeResponse::Unauthorized) => Err(hivefleet_api::Error::Authentication {
                message: "token rejected".into(),
            }),
            None => Err(hivefleet_api::Error::Api {
                status: 404,
                body: "no such worker".into(),
            }),
        }
    }

    async fn list_farms(&self) -> Result<Vec<Farm>, hivefleet_api::Error> {
        Ok(self.state.lock().unwrap().farms.clone())
    }

    async fn list_workers(&self, farm_id: u64) -> Result<Vec<WorkerRecord>, hivefleet_api::Error> {
        let state = self.state.lock().unwrap();
        Ok(state
            .responses
            .iter()
            .filter(|(key, _)| key.farm_id == farm_id)
            .map(|(key, response)| match response {
                FakeResponse::Record(rec) => rec.clone(),
                FakeResponse::Status(_) | FakeResponse::Unauthorized => {
                    record(*key, 0, 0, false, false)
                }
            })
            .collect())
    }

    async fn send_command(
        &self,
        farm_id: u64,
        worker_id: u64,
        command: WorkerCommand,
    ) -> Result<(), hivefleet_api::Error> {
        let key = WorkerKey::new(farm_id, worker_id);
        let delay = self.state.lock().unwrap().command_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.events.push(format!("command:{}:{key}", command.name()));
        if state.failing_commands.contains(&key) {
            return Err(hivefleet_api::Error::Api {
                status: 500,
                body: "command rejected".into(),
            });
        }
        state.commands.push((key, command));
        Ok(())
    }
}
