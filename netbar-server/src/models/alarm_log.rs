use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmKind {
    Smoke,
    Occupy,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AlarmLog {
    pub id: i64,
    pub device_id: String,
    pub alarm_type: AlarmKind,
    pub message: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct AlarmLogTable;

impl Table for AlarmLogTable {
    fn name(&self) -> &'static str {
        "alarm_log"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS alarm_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                alarm_type TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS alarm_log;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
