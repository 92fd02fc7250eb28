// ── Remote data source seam ──
//
// The coordinator and registry only need four capabilities from the
// HiveOS API. Abstracting them behind a trait lets tests drive the
// coordinator with an in-memory fake.

use async_trait::async_trait;

use hivefleet_api::{Farm, HiveClient, WorkerCommand, WorkerRecord};

/// The subset of the HiveOS API consumed by the core.
#[async_trait]
pub trait HiveApi: Send + Sync {
    /// Fetch one worker by `(farm_id, worker_id)`.
    async fn fetch_worker(
        &self,
        farm_id: u64,
        worker_id: u64,
    ) -> Result<WorkerRecord, hivefleet_api::Error>;

    async fn list_farms(&self) -> Result<Vec<Farm>, hivefleet_api::Error>;

    async fn list_workers(&self, farm_id: u64) -> Result<Vec<WorkerRecord>, hivefleet_api::Error>;

    /// Issue a command. The response body carries nothing of interest.
    async fn send_command(
        &self,
        farm_id: u64,
        worker_id: u64,
        command: WorkerCommand,
    ) -> Result<(), hivefleet_api::Error>;
}

#[async_trait]
impl HiveApi for HiveClient {
    async fn fetch_worker(
        &self,
        farm_id: u64,
        worker_id: u64,
    ) -> Result<WorkerRecord, hivefleet_api::Error> {
        self.get_worker(farm_id, worker_id).await
    }

    async fn list_farms(&self) -> Result<Vec<Farm>, hivefleet_api::Error> {
        HiveClient::list_farms(self).await
    }

    async fn list_workers(&self, farm_id: u64) -> Result<Vec<WorkerRecord>, hivefleet_api::Error> {
        HiveClient::list_workers(self, farm_id).await
    }

    async fn send_command(
        &self,
        farm_id: u64,
        worker_id: u64,
        command: WorkerCommand,
    ) -> Result<(), hivefleet_api::Error> {
        HiveClient::send_command(self, farm_id, worker_id, &command).await
    }
}
