use std::sync::Arc;

use netbar_api::Money;
use sqlx::{Error, Pool, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::{Device, DeviceStatus};

/// Sensor readings and counters accepted from one telemetry message.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub status: DeviceStatus,
    pub pc_on: bool,
    pub light_on: bool,
    pub human_present: bool,
    pub smoke_percent: u8,
    pub current_sec: u64,
    pub current_fee: Money,
    pub last_update: OffsetDateTime,
}

#[derive(Clone)]
pub struct DeviceRepository {
    storage: Arc<Storage>,
}

impl DeviceRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl DeviceRepository {
    /// Registers a device on first contact. Returns `false` when it was already known.
    pub async fn register(&self, device_id: &str, transaction: &mut Transaction<'_, Sqlite>) -> Result<bool, Error> {
        let affected = sqlx::query("INSERT OR IGNORE INTO devices (device_id) VALUES ($1)")
            .bind(device_id)
            .execute(&mut **transaction)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    pub async fn find_by_id(&self, device_id: &str) -> Result<Option<Device>, Error> {
        let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE device_id = $1")
            .bind(device_id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(device)
    }

    pub async fn find_all(&self) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as("SELECT * FROM devices ORDER BY device_id")
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(devices)
    }

    /// Session-bound fields are checked against the sessions table in the
    /// same statement: without an open session the seat cannot be written
    /// back as Active, and its counters are zeroed.
    pub async fn update_telemetry(
        &self,
        device_id: &str,
        snapshot: &DeviceSnapshot,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            WITH live AS (
                SELECT EXISTS (SELECT 1 FROM sessions WHERE device_id = $9 AND end_time IS NULL) AS present
            )
            UPDATE devices
            SET status = CASE WHEN $1 = $10 AND NOT (SELECT present FROM live) THEN $11 ELSE $1 END,
                pc_on = $2, light_on = $3, human_present = $4, smoke_percent = $5,
                current_sec = CASE WHEN (SELECT present FROM live) THEN $6 ELSE 0 END,
                current_fee = CASE WHEN (SELECT present FROM live) THEN $7 ELSE 0 END,
                last_update = $8
            WHERE device_id = $9
            "#,
        )
        .bind(snapshot.status)
        .bind(snapshot.pc_on)
        .bind(snapshot.light_on)
        .bind(snapshot.human_present)
        .bind(i64::from(snapshot.smoke_percent))
        .bind(i64::try_from(snapshot.current_sec).unwrap_or(i64::MAX))
        .bind(snapshot.current_fee.cents())
        .bind(snapshot.last_update)
        .bind(device_id)
        .bind(DeviceStatus::Active)
        .bind(DeviceStatus::Idle)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn set_status(
        &self,
        device_id: &str,
        status: DeviceStatus,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET status = $1 WHERE device_id = $2")
            .bind(status)
            .bind(device_id)
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    pub async fn mark_active(
        &self,
        device_id: &str,
        user_id: i64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE devices
            SET status = $1, current_user_id = $2, current_sec = 0, current_fee = 0
            WHERE device_id = $3
            "#,
        )
        .bind(DeviceStatus::Active)
        .bind(user_id)
        .bind(device_id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn mark_idle(&self, device_id: &str, transaction: &mut Transaction<'_, Sqlite>) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE devices
            SET status = $1, current_user_id = NULL, current_sec = 0, current_fee = 0
            WHERE device_id = $2
            "#,
        )
        .bind(DeviceStatus::Idle)
        .bind(device_id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn set_maintenance(
        &self,
        device_id: &str,
        enabled: bool,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let affected = sqlx::query("UPDATE devices SET is_maintenance = $1 WHERE device_id = $2")
            .bind(enabled)
            .bind(device_id)
            .execute(&mut **transaction)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::EndReason;
    use crate::repositories::{SessionRepository, SettleRecord};
    use crate::tests::*;

    use super::*;

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let storage = setup_test_db().await;
        let repo = DeviceRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        assert!(repo.register("seat001", &mut tx).await.unwrap());
        assert!(!repo.register("seat001", &mut tx).await.unwrap());
        tx.commit().await.unwrap();

        let device = repo.find_by_id("seat001").await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Idle);
        assert!(device.last_update.is_none());
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_active_then_idle() {
        let storage = setup_test_db().await;
        let user = create_test_user(storage.clone(), "C1", Money::from_cents(1000)).await;
        create_test_device(storage.clone(), "seat001").await;

        let repo = DeviceRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.mark_active("seat001", user.id, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let device = repo.find_by_id("seat001").await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Active);
        assert_eq!(device.current_user_id, Some(user.id));

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.mark_idle("seat001", &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let device = repo.find_by_id("seat001").await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Idle);
        assert_eq!(device.current_user_id, None);
    }

    #[tokio::test]
    async fn test_update_telemetry() {
        let storage = setup_test_db().await;
        let user = create_test_user(storage.clone(), "C1", Money::from_cents(1000)).await;
        create_test_session(storage.clone(), "seat001", &user).await;

        let repo = DeviceRepository::new(storage.clone());
        let snapshot = DeviceSnapshot {
            status: DeviceStatus::Alarm,
            pc_on: true,
            light_on: false,
            human_present: true,
            smoke_percent: 65,
            current_sec: 120,
            current_fee: Money::from_cents(200),
            last_update: OffsetDateTime::now_utc(),
        };

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.update_telemetry("seat001", &snapshot, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let device = repo.find_by_id("seat001").await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Alarm);
        assert_eq!(device.smoke_percent, 65);
        assert_eq!(device.current_sec, 120);
        assert_eq!(device.current_fee, Money::from_cents(200));
        assert!(device.pc_on && device.human_present && !device.light_on);
        assert!(device.last_update.is_some());
    }

    #[tokio::test]
    async fn test_set_maintenance_unknown_device() {
        let storage = setup_test_db().await;
        let repo = DeviceRepository::new(storage.clone());

        let mut tx = storage.get_pool().begin().await.unwrap();
        assert!(!repo.set_maintenance("ghost", true, &mut tx).await.unwrap());
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_update_telemetry_after_session_closed() {
        let storage = setup_test_db().await;
        let user = create_test_user(storage.clone(), "C1", Money::from_cents(1000)).await;
        let session = create_test_session(storage.clone(), "seat001", &user).await;

        let repo = DeviceRepository::new(storage.clone());
        let snapshot = DeviceSnapshot {
            status: DeviceStatus::Active,
            pc_on: true,
            light_on: true,
            human_present: true,
            smoke_percent: 0,
            current_sec: 300,
            current_fee: Money::from_cents(500),
            last_update: OffsetDateTime::now_utc(),
        };

        // the session is settled between reading it and writing telemetry
        let record = SettleRecord {
            end_time: OffsetDateTime::now_utc(),
            duration_sec: 300,
            fee: Money::from_cents(500),
            end_reason: EndReason::AdminStop,
        };
        let mut tx = storage.get_pool().begin().await.unwrap();
        assert!(SessionRepository::new(storage.clone()).close(session.id, &record, &mut tx).await.unwrap());
        repo.mark_idle("seat001", &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.update_telemetry("seat001", &snapshot, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        let device = repo.find_by_id("seat001").await.unwrap().unwrap();
        assert_eq!(device.status, DeviceStatus::Idle);
        assert_eq!(device.current_user_id, None);
        assert_eq!(device.current_sec, 0);
        assert_eq!(device.current_fee, Money::ZERO);
        assert!(device.pc_on);

        let alarm = DeviceSnapshot {
            status: DeviceStatus::Alarm,
            smoke_percent: 80,
            ..snapshot
        };
        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.update_telemetry("seat001", &alarm, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repo.find_by_id("seat001").await.unwrap().unwrap().status, DeviceStatus::Alarm);
    }
}
