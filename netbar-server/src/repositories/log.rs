use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::{DeviceStateLog, SystemLog};

/// Audit trails that never gate a state transition.
#[derive(Clone)]
pub struct LogRepository {
    storage: Arc<Storage>,
}

impl LogRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl LogRepository {
    pub async fn create_system(&self, item: &SystemLog, transaction: &mut Transaction<'_, Sqlite>) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO system_log (log_type, device_id, card_uid, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(item.log_type)
        .bind(&item.device_id)
        .bind(&item.card_uid)
        .bind(&item.content)
        .bind(item.created_at)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn create_device_state(
        &self,
        item: &DeviceStateLog,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO device_state_log (device_id, state_text, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(&item.device_id)
        .bind(&item.state_text)
        .bind(item.created_at)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_system_by_device(&self, device_id: &str) -> Result<Vec<SystemLog>, Error> {
        let logs: Vec<SystemLog> = sqlx::query_as("SELECT * FROM system_log WHERE device_id = $1 ORDER BY id")
            .bind(device_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(logs)
    }

    pub async fn find_device_state_by_device(&self, device_id: &str) -> Result<Vec<DeviceStateLog>, Error> {
        let logs: Vec<DeviceStateLog> =
            sqlx::query_as("SELECT * FROM device_state_log WHERE device_id = $1 ORDER BY id")
                .bind(device_id)
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(logs)
    }
}
