// ── API-to-domain type conversions ──
//
// Bridges validated `hivefleet_api` wire records into canonical
// `hivefleet_core::model` types. Missing stats mean "never reported":
// both GPU counts are zero and `online` is false. A record without stats
// therefore yields an off, unavailable worker instead of a failed poll.

use hivefleet_api::{Farm as FarmRecord, WorkerRecord, WorkerStats};

use crate::error::CoreError;
use crate::model::{Farm, WorkerKey, WorkerSnapshot};

impl From<WorkerRecord> for WorkerSnapshot {
    fn from(record: WorkerRecord) -> Self {
        let stats = record.stats.unwrap_or(WorkerStats {
            gpus_online: 0,
            gpus_offline: 0,
            online: false,
        });

        Self {
            unique_id: record.id,
            name: record.name,
            farm_id: record.farm_id,
            version: record.versions.hive,
            gpus_online: stats.gpus_online,
            gpus_offline: stats.gpus_offline,
            online: stats.online,
            needs_upgrade: record.needs_upgrade,
        }
    }
}

impl From<FarmRecord> for Farm {
    fn from(record: FarmRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            worker_count: record.workers_count,
        }
    }
}

/// Convert a polled record into a snapshot for `key`, rejecting records
/// that belong to a different worker.
pub(crate) fn snapshot_for(key: WorkerKey, record: WorkerRecord) -> Result<WorkerSnapshot, CoreError> {
    if record.id != key.worker_id || record.farm_id != key.farm_id {
        return Err(CoreError::DataContract {
            message: format!(
                "expected worker {key}, got {}/{}",
                record.farm_id, record.id
            ),
        });
    }
    Ok(WorkerSnapshot::from(record))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn record(value: serde_json::Value) -> WorkerRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_record_maps_every_field() {
        let snap = WorkerSnapshot::from(record(json!({
            "id": 7,
            "name": "rig1",
            "farm_id": 3,
            "stats": { "gpus_online": 2, "gpus_offline": 1, "online": true },
            "versions": { "hive": "1.2" },
            "needs_upgrade": false
        })));

        assert_eq!(
            snap,
            WorkerSnapshot {
                unique_id: 7,
                name: "rig1".into(),
                farm_id: 3,
                version: "1.2".into(),
                gpus_online: 2,
                gpus_offline: 1,
                online: true,
                needs_upgrade: false,
            }
        );
        assert!(snap.is_on());
        assert!(snap.is_available());
    }

    #[test]
    fn zero_gpus_is_off_and_unavailable_even_when_online() {
        let snap = WorkerSnapshot::from(record(json!({
            "id": 7,
            "name": "rig1",
            "farm_id": 3,
            "stats": { "gpus_online": 0, "gpus_offline": 0, "online": true },
            "versions": { "hive": "1.2" },
            "needs_upgrade": false
        })));

        assert!(!snap.is_on());
        assert!(!snap.is_available());
    }

    #[test]
    fn absent_stats_default_to_zero() {
        let snap = WorkerSnapshot::from(record(json!({
            "id": 7,
            "name": "rig1",
            "farm_id": 3,
            "versions": { "hive": "1.2" },
            "needs_upgrade": true
        })));

        assert_eq!(snap.gpus_online, 0);
        assert_eq!(snap.gpus_offline, 0);
        assert!(!snap.online);
        assert!(snap.needs_upgrade);
    }

    #[test]
    fn mismatched_identity_is_rejected() {
        let rec = record(json!({
            "id": 8,
            "name": "other",
            "farm_id": 3,
            "versions": { "hive": "1.2" },
            "needs_upgrade": false
        }));

        let err = snapshot_for(WorkerKey::new(3, 7), rec).unwrap_err();
        assert!(matches!(err, CoreError::DataContract { .. }), "got {err:?}");
    }

    #[test]
    fn farm_record_converts() {
        let farm = Farm::from(FarmRecord {
            id: 3,
            name: "Main".into(),
            workers_count: Some(2),
        });
        assert_eq!(farm.worker_count, Some(2));
    }
}
