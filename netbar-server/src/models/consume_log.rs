use netbar_api::Money;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// One settlement debit against a user balance.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConsumeLog {
    pub id: i64,
    pub user_id: i64,
    pub session_id: i64,
    #[sqlx(try_from = "i64")]
    pub amount: Money,
    #[sqlx(try_from = "i64")]
    pub balance_after: Money,
    pub remark: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct ConsumeLogTable;

impl Table for ConsumeLogTable {
    fn name(&self) -> &'static str {
        "consume_log"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS consume_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                session_id INTEGER NOT NULL UNIQUE,
                amount INTEGER NOT NULL,
                balance_after INTEGER NOT NULL,
                remark TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id),
                FOREIGN KEY (session_id) REFERENCES sessions (id)
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS consume_log;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users", "sessions"]
    }
}
