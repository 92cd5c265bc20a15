use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::configs::Storage;
use crate::errors::EngineError;
use crate::models::{AlarmKind, AlarmLog};
use crate::repositories::AlarmRepository;

/// Last emission per (device, alarm kind). Process local, lost on restart.
pub struct AlarmCooldown {
    window: Duration,
    entries: RwLock<HashMap<(String, AlarmKind), OffsetDateTime>>,
}

impl AlarmCooldown {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns `true` and marks the key when nothing was emitted for it
    /// within the window.
    pub async fn should_emit(&self, device_id: &str, kind: AlarmKind, now: OffsetDateTime) -> bool {
        let mut entries = self.entries.write().await;
        let key = (device_id.to_string(), kind);

        if let Some(last) = entries.get(&key) {
            if now - *last < self.window {
                return false;
            }
        }

        entries.insert(key, now);

        true
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

pub struct AlarmService {
    cooldown: AlarmCooldown,
    alarm_repository: AlarmRepository,
    storage: Arc<Storage>,
}

impl AlarmService {
    pub fn new(storage: Arc<Storage>, cooldown: AlarmCooldown) -> Self {
        Self {
            cooldown,
            alarm_repository: AlarmRepository::new(storage.clone()),
            storage,
        }
    }

    /// Writes an alarm record unless one of the same kind was written for
    /// the device within the cooldown window. Returns whether it was written.
    pub async fn raise(
        &self,
        device_id: &str,
        kind: AlarmKind,
        message: &str,
        now: OffsetDateTime,
    ) -> Result<bool, EngineError> {
        if !self.cooldown.should_emit(device_id, kind, now).await {
            tracing::debug!("alarm {:?} on {} suppressed by cooldown", kind, device_id);
            return Ok(false);
        }

        let alarm = AlarmLog {
            id: 0,
            device_id: device_id.to_string(),
            alarm_type: kind,
            message: message.to_string(),
            created_at: now,
        };

        let mut tx = self.storage.get_pool().begin().await?;
        self.alarm_repository.create(&alarm, &mut tx).await?;
        tx.commit().await?;

        tracing::warn!("alarm {:?} on {}: {}", kind, device_id, message);

        Ok(true)
    }
}
