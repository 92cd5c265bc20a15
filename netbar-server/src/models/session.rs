use netbar_api::Money;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EndReason {
    /// Seat reported its counter dropping back to zero
    Normal,
    /// Open session found while the seat was idle
    StaleAutoClose,
    /// Projected fee reached the remaining balance
    BalanceEmpty,
    /// Operator forced the checkout
    AdminStop,
    /// Seat asked to check out
    UserCheckout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub device_id: String,
    pub card_uid: String,
    pub user_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub duration_sec: i64,
    #[sqlx(try_from = "i64")]
    pub fee: Money,
    pub end_reason: Option<EndReason>,
}

impl Session {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Server-side elapsed seconds, never negative.
    pub fn elapsed_at(&self, now: OffsetDateTime) -> u64 {
        u64::try_from((now - self.start_time).whole_seconds()).unwrap_or(0)
    }
}

#[derive(Clone)]
pub struct SessionTable;

impl Table for SessionTable {
    fn name(&self) -> &'static str {
        "sessions"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                card_uid TEXT NOT NULL,
                user_name TEXT NOT NULL,
                start_time TIMESTAMP NOT NULL,
                end_time TIMESTAMP,
                duration_sec INTEGER NOT NULL DEFAULT 0,
                fee INTEGER NOT NULL DEFAULT 0,
                end_reason TEXT,
                FOREIGN KEY (device_id) REFERENCES devices (device_id)
            );
            CREATE UNIQUE INDEX IF NOT EXISTS sessions_one_open_per_device
                ON sessions (device_id) WHERE end_time IS NULL;
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS sessions;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["devices"]
    }
}
