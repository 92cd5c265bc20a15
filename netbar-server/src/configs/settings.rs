use std::env;

use config::{Config, ConfigError, Environment, File, FileFormat};
use netbar_api::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gateway {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff_secs: u64,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub url: String,
    #[serde(default)]
    pub clean_start: bool,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Billing {
    /// Seeded into the store when no rate has been configured yet
    pub default_rate: Money,
    /// Minimum balance required to open a session
    pub min_balance: Money,
}

impl Default for Billing {
    fn default() -> Self {
        Self {
            default_rate: Money::from_cents(100),
            min_balance: Money::from_cents(100),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DevicePolicy {
    pub smoke_alarm_threshold: u8,
    pub alarm_cooldown_secs: u64,
    pub sync_tolerance_secs: u64,
    pub offline_after_secs: u64,
    pub adult_age: u32,
}

impl Default for DevicePolicy {
    fn default() -> Self {
        Self {
            smoke_alarm_threshold: 60,
            alarm_cooldown_secs: 60,
            sync_tolerance_secs: 5,
            offline_after_secs: 30,
            adult_age: 18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub gateway: Gateway,
    pub database: Database,
    #[serde(default)]
    pub billing: Billing,
    #[serde(default)]
    pub device: DevicePolicy,
}

impl Settings {
    /// Loads `configs/default`, then layers `configs/<RUN_MODE>`, the file
    /// named by `NETBAR_CONFIG` and `NETBAR_<SECTION>__<KEY>` variables.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false));

        if let Ok(path) = env::var("NETBAR_CONFIG") {
            builder = builder.add_source(File::with_name(&path));
        }

        builder
            .add_source(
                Environment::with_prefix("NETBAR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(input, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

fn default_topic_prefix() -> String {
    String::from("netbar")
}

fn default_keep_alive() -> u64 {
    60
}

fn default_reconnect_backoff() -> u64 {
    5
}
