use serde::{Deserialize, Serialize};

use super::Table;

/// Runtime-tunable scalar, keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: i64,
}

#[derive(Clone)]
pub struct SettingTable;

impl Table for SettingTable {
    fn name(&self) -> &'static str {
        "settings"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS settings;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
