use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemLogKind {
    Login,
    Logout,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SystemLog {
    pub id: i64,
    pub log_type: SystemLogKind,
    pub device_id: String,
    pub card_uid: String,
    pub content: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct SystemLogTable;

impl Table for SystemLogTable {
    fn name(&self) -> &'static str {
        "system_log"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS system_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                log_type TEXT NOT NULL,
                device_id TEXT NOT NULL,
                card_uid TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS system_log;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
