use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::AlarmLog;

#[derive(Clone)]
pub struct AlarmRepository {
    storage: Arc<Storage>,
}

impl AlarmRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl AlarmRepository {
    pub async fn create(&self, item: &AlarmLog, transaction: &mut Transaction<'_, Sqlite>) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO alarm_log (device_id, alarm_type, message, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&item.device_id)
        .bind(item.alarm_type)
        .bind(&item.message)
        .bind(item.created_at)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_by_device(&self, device_id: &str) -> Result<Vec<AlarmLog>, Error> {
        let alarms: Vec<AlarmLog> = sqlx::query_as("SELECT * FROM alarm_log WHERE device_id = $1 ORDER BY id")
            .bind(device_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(alarms)
    }
}
