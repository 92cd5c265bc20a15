use std::sync::Arc;

use netbar_api::Money;
use sqlx::{Error, Pool, Sqlite, Transaction};

use crate::configs::Storage;

const RATE_KEY: &str = "rate_per_minute";

/// The per-minute rate, stored in cents under a fixed settings key.
#[derive(Clone)]
pub struct RateRepository {
    storage: Arc<Storage>,
}

impl RateRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn get_pool(&self) -> &Pool<Sqlite> {
        self.storage.get_pool()
    }
}

impl RateRepository {
    pub async fn find(&self) -> Result<Option<Money>, Error> {
        let cents: Option<i64> = sqlx::query_scalar("SELECT value FROM settings WHERE key = $1")
            .bind(RATE_KEY)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(cents.map(Money::from_cents))
    }

    /// Stores `rate` only when no rate exists yet.
    pub async fn seed(&self, rate: Money, transaction: &mut Transaction<'_, Sqlite>) -> Result<bool, Error> {
        let affected = sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES ($1, $2)")
            .bind(RATE_KEY)
            .bind(rate.cents())
            .execute(&mut **transaction)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    pub async fn update(&self, rate: Money, transaction: &mut Transaction<'_, Sqlite>) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(RATE_KEY)
        .bind(rate.cents())
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }
}
