use std::sync::Arc;

use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::{ConsumeLog, RechargeLog};

/// Balance movements: settlement debits and recharges.
#[derive(Clone)]
pub struct LedgerRepository {
    storage: Arc<Storage>,
}

impl LedgerRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl LedgerRepository {
    pub async fn record_consume(
        &self,
        item: &ConsumeLog,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO consume_log (user_id, session_id, amount, balance_after, remark, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.user_id)
        .bind(item.session_id)
        .bind(item.amount.cents())
        .bind(item.balance_after.cents())
        .bind(&item.remark)
        .bind(item.created_at)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn record_recharge(
        &self,
        item: &RechargeLog,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO recharge_log (user_id, amount, balance_after, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(item.user_id)
        .bind(item.amount.cents())
        .bind(item.balance_after.cents())
        .bind(item.created_at)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    pub async fn find_consume_by_user(&self, user_id: i64) -> Result<Vec<ConsumeLog>, Error> {
        let entries: Vec<ConsumeLog> = sqlx::query_as("SELECT * FROM consume_log WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(entries)
    }

    pub async fn find_recharge_by_user(&self, user_id: i64) -> Result<Vec<RechargeLog>, Error> {
        let entries: Vec<RechargeLog> = sqlx::query_as("SELECT * FROM recharge_log WHERE user_id = $1 ORDER BY id")
            .bind(user_id)
            .fetch_all(self.storage.get_pool())
            .await?;

        Ok(entries)
    }
}
