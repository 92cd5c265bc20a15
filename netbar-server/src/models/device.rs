use std::time::Duration;

use netbar_api::Money;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::Table;

/// Primitive seat status as persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum DeviceStatus {
    #[default]
    Idle = 0,
    Active = 1,
    Alarm = 2,
}

/// Status shown to operators: the primitive status with the offline and
/// maintenance overlays applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Offline,
    Maintenance,
    Alarm,
    Active,
    Idle,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub device_id: String,
    pub status: DeviceStatus,
    pub is_maintenance: bool,
    pub pc_on: bool,
    pub light_on: bool,
    pub human_present: bool,
    pub smoke_percent: i64,
    /// Elapsed seconds of the running session as last reported
    pub current_sec: i64,
    #[sqlx(try_from = "i64")]
    pub current_fee: Money,
    pub current_user_id: Option<i64>,
    /// Time of the last accepted telemetry
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_update: Option<OffsetDateTime>,
}

impl Device {
    pub fn is_offline(&self, now: OffsetDateTime, liveness: Duration) -> bool {
        match self.last_update {
            Some(last_update) => (now - last_update) > liveness,
            None => true,
        }
    }

    pub fn seat_status(&self, now: OffsetDateTime, liveness: Duration) -> SeatStatus {
        if self.is_offline(now, liveness) {
            return SeatStatus::Offline;
        }
        if self.is_maintenance {
            return SeatStatus::Maintenance;
        }

        match self.status {
            DeviceStatus::Alarm => SeatStatus::Alarm,
            DeviceStatus::Active => SeatStatus::Active,
            DeviceStatus::Idle => SeatStatus::Idle,
        }
    }
}

#[derive(Clone)]
pub struct DeviceTable;

impl Table for DeviceTable {
    fn name(&self) -> &'static str {
        "devices"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                device_id TEXT PRIMARY KEY,
                status INTEGER NOT NULL DEFAULT 0,
                is_maintenance BOOLEAN NOT NULL DEFAULT 0,
                pc_on BOOLEAN NOT NULL DEFAULT 0,
                light_on BOOLEAN NOT NULL DEFAULT 0,
                human_present BOOLEAN NOT NULL DEFAULT 0,
                smoke_percent INTEGER NOT NULL DEFAULT 0,
                current_sec INTEGER NOT NULL DEFAULT 0,
                current_fee INTEGER NOT NULL DEFAULT 0,
                current_user_id INTEGER,
                last_update TIMESTAMP,
                FOREIGN KEY (current_user_id) REFERENCES users (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS devices;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
