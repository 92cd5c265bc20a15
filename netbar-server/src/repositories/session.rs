use std::sync::Arc;

use netbar_api::Money;
use sqlx::{Error, Pool, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::{EndReason, Session};

/// The single write that closes a session.
#[derive(Debug, Clone, Copy)]
pub struct SettleRecord {
    pub end_time: OffsetDateTime,
    pub duration_sec: u64,
    pub fee: Money,
    pub end_reason: EndReason,
}

#[derive(Clone)]
pub struct SessionRepository {
    storage: Arc<Storage>,
}

impl SessionRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl SessionRepository {
    /// Inserts an open session. Fails with a unique violation when the
    /// device already has one.
    pub async fn create(&self, item: &Session, transaction: &mut Transaction<'_, Sqlite>) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO sessions (device_id, card_uid, user_name, start_time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&item.device_id)
        .bind(&item.card_uid)
        .bind(&item.user_name)
        .bind(item.start_time)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Session>, Error> {
        let session: Option<Session> = sqlx::query_as("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(session)
    }

    pub async fn find_open_by_device(&self, device_id: &str) -> Result<Option<Session>, Error> {
        let session: Option<Session> =
            sqlx::query_as("SELECT * FROM sessions WHERE device_id = $1 AND end_time IS NULL")
                .bind(device_id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(session)
    }

    pub async fn find_by_device(&self, device_id: &str) -> Result<Vec<Session>, Error> {
        let sessions: Vec<Session> = sqlx::query_as("SELECT * FROM sessions WHERE device_id = $1 ORDER BY id")
            .bind(device_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(sessions)
    }

    /// Closes the session if it is still open. Returns `false` when it was
    /// already closed.
    pub async fn close(
        &self,
        id: i64,
        record: &SettleRecord,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let affected = sqlx::query(
            r#"
            UPDATE sessions
            SET end_time = $1, duration_sec = $2, fee = $3, end_reason = $4
            WHERE id = $5 AND end_time IS NULL
            "#,
        )
        .bind(record.end_time)
        .bind(i64::try_from(record.duration_sec).unwrap_or(i64::MAX))
        .bind(record.fee.cents())
        .bind(record.end_reason)
        .bind(id)
        .execute(&mut **transaction)
        .await?
        .rows_affected();

        Ok(affected == 1)
    }
}
