use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// Raw diagnostics text published by a seat.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceStateLog {
    pub id: i64,
    pub device_id: String,
    pub state_text: String,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct DeviceStateLogTable;

impl Table for DeviceStateLogTable {
    fn name(&self) -> &'static str {
        "device_state_log"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_state_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL,
                state_text TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_state_log;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
