use netbar_api::Money;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RechargeLog {
    pub id: i64,
    pub user_id: i64,
    #[sqlx(try_from = "i64")]
    pub amount: Money,
    #[sqlx(try_from = "i64")]
    pub balance_after: Money,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct RechargeLogTable;

impl Table for RechargeLogTable {
    fn name(&self) -> &'static str {
        "recharge_log"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS recharge_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount INTEGER NOT NULL,
                balance_after INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id)
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS recharge_log;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
