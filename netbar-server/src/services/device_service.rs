use std::sync::Arc;

use netbar_api::Money;
use netbar_api::message::Telemetry;
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::errors::EngineError;
use crate::models::{Device, DeviceStateLog, DeviceStatus};
use crate::repositories::{DeviceRepository, DeviceSnapshot, LogRepository};

/// Primitive status from one telemetry report, highest precedence first:
/// smoke, occupancy alarm, then a seat that is in use under an open session.
///
/// An in-use report without an open session stays idle; it is a zombie the
/// caller resets.
pub fn derive_status(telemetry: &Telemetry, smoke_threshold: u8, has_open_session: bool) -> DeviceStatus {
    if telemetry.smoke_percent >= smoke_threshold || telemetry.occupancy_alarm {
        DeviceStatus::Alarm
    } else if has_open_session {
        DeviceStatus::Active
    } else {
        DeviceStatus::Idle
    }
}

/// The seat counter was running and dropped back to zero.
pub fn is_end_of_use(previous_sec: u64, reported_sec: u64) -> bool {
    previous_sec > 0 && reported_sec == 0
}

/// The seat counter drifted from the server clock, or reads zero while the
/// server has seen time pass.
pub fn needs_resync(reported_sec: u64, server_sec: u64, tolerance_sec: u64) -> bool {
    reported_sec.abs_diff(server_sec) > tolerance_sec || (reported_sec == 0 && server_sec > 0)
}

/// The projected fee has eaten the remaining balance. An empty balance is
/// exhausted even when nothing has been charged yet.
pub fn balance_exhausted(projected_fee: Money, balance: Money) -> bool {
    !balance.is_negative() && projected_fee >= balance
}

/// Persistence side of the seat state machine.
pub struct DeviceService {
    storage: Arc<Storage>,
    device_repository: DeviceRepository,
    log_repository: LogRepository,
}

impl DeviceService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self {
            device_repository: DeviceRepository::new(storage.clone()),
            log_repository: LogRepository::new(storage.clone()),
            storage,
        }
    }

    pub async fn find(&self, device_id: &str) -> Result<Option<Device>, EngineError> {
        Ok(self.device_repository.find_by_id(device_id).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Device>, EngineError> {
        Ok(self.device_repository.find_all().await?)
    }

    /// Returns the device, registering it on first contact.
    pub async fn find_or_register(&self, device_id: &str) -> Result<Device, EngineError> {
        if let Some(device) = self.device_repository.find_by_id(device_id).await? {
            return Ok(device);
        }

        let mut tx = self.storage.get_pool().begin().await?;
        if self.device_repository.register(device_id, &mut tx).await? {
            tracing::info!("registered new device {}", device_id);
        }
        tx.commit().await?;

        self.device_repository
            .find_by_id(device_id)
            .await?
            .ok_or_else(|| EngineError::UnknownDevice(device_id.to_string()))
    }

    pub async fn accept_telemetry(&self, device_id: &str, snapshot: &DeviceSnapshot) -> Result<(), EngineError> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository.update_telemetry(device_id, snapshot, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn set_status(&self, device_id: &str, status: DeviceStatus) -> Result<(), EngineError> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.device_repository.set_status(device_id, status, &mut tx).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn set_maintenance(&self, device_id: &str, enabled: bool) -> Result<(), EngineError> {
        let mut tx = self.storage.get_pool().begin().await?;
        let found = self.device_repository.set_maintenance(device_id, enabled, &mut tx).await?;
        tx.commit().await?;

        if !found {
            return Err(EngineError::UnknownDevice(device_id.to_string()));
        }

        tracing::info!("maintenance {} on {}", if enabled { "enabled" } else { "disabled" }, device_id);

        Ok(())
    }

    /// Best effort: a failed write is logged and swallowed.
    pub async fn record_debug(&self, device_id: &str, text: &str, now: OffsetDateTime) {
        let entry = DeviceStateLog {
            id: 0,
            device_id: device_id.to_string(),
            state_text: text.to_string(),
            created_at: now,
        };

        let result: Result<(), sqlx::Error> = async {
            let mut tx = self.storage.get_pool().begin().await?;
            self.log_repository.create_device_state(&entry, &mut tx).await?;
            tx.commit().await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!("failed to record debug text for {}: {}", device_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::tests::*;

    use super::*;

    fn telemetry(in_use: bool, smoke_percent: u8, occupancy_alarm: bool) -> Telemetry {
        Telemetry {
            in_use,
            smoke_percent,
            occupancy_alarm,
            ..Default::default()
        }
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(derive_status(&telemetry(true, 60, false), 60, true), DeviceStatus::Alarm);
        assert_eq!(derive_status(&telemetry(false, 0, true), 60, false), DeviceStatus::Alarm);
        assert_eq!(derive_status(&telemetry(true, 59, false), 60, true), DeviceStatus::Active);
        assert_eq!(derive_status(&telemetry(false, 0, false), 60, true), DeviceStatus::Active);
        assert_eq!(derive_status(&telemetry(true, 0, false), 60, false), DeviceStatus::Idle);
        assert_eq!(derive_status(&telemetry(false, 0, false), 60, false), DeviceStatus::Idle);
    }

    #[test]
    fn test_end_of_use() {
        assert!(is_end_of_use(300, 0));
        assert!(!is_end_of_use(0, 0));
        assert!(!is_end_of_use(300, 305));
    }

    #[test]
    fn test_resync() {
        assert!(!needs_resync(100, 104, 5));
        assert!(!needs_resync(104, 100, 5));
        assert!(needs_resync(100, 106, 5));
        assert!(needs_resync(0, 3, 5));
        assert!(!needs_resync(0, 0, 5));
    }

    #[test]
    fn test_balance_exhausted() {
        assert!(balance_exhausted(Money::from_cents(500), Money::from_cents(500)));
        assert!(balance_exhausted(Money::from_cents(501), Money::from_cents(500)));
        assert!(!balance_exhausted(Money::from_cents(499), Money::from_cents(500)));
        assert!(balance_exhausted(Money::ZERO, Money::ZERO));
        assert!(!balance_exhausted(Money::ZERO, Money::from_cents(1)));
    }

    #[tokio::test]
    async fn test_find_or_register() {
        let storage = setup_test_db().await;
        let service = DeviceService::new(storage.clone());

        assert!(service.find("seat001").await.unwrap().is_none());
        let device = service.find_or_register("seat001").await.unwrap();
        assert_eq!(device.device_id, "seat001");
        assert_eq!(service.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_maintenance_on_unknown_device() {
        let storage = setup_test_db().await;
        let service = DeviceService::new(storage.clone());

        let result = service.set_maintenance("ghost", true).await;
        assert!(matches!(result, Err(EngineError::UnknownDevice(_))));
    }

    #[tokio::test]
    async fn test_record_debug() {
        let storage = setup_test_db().await;
        let service = DeviceService::new(storage.clone());

        service.record_debug("seat001", "boot ok", OffsetDateTime::now_utc()).await;

        let logs = LogRepository::new(storage.clone()).find_device_state_by_device("seat001").await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].state_text, "boot ok");
    }
}
