use std::sync::Arc;

use netbar_api::Money;
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::errors::EngineError;
use crate::models::{EndReason, Session, SystemLog, SystemLogKind, User};
use crate::repositories::{DeviceRepository, LogRepository, SessionRepository};

use super::{BillingService, SettledSession};

/// Owns the `NoSession -> Open -> Closed` lifecycle of a seat.
pub struct SessionService {
    storage: Arc<Storage>,
    billing: Arc<BillingService>,
    session_repository: SessionRepository,
    device_repository: DeviceRepository,
    log_repository: LogRepository,
}

impl SessionService {
    pub fn new(storage: Arc<Storage>, billing: Arc<BillingService>) -> Self {
        Self {
            billing,
            session_repository: SessionRepository::new(storage.clone()),
            device_repository: DeviceRepository::new(storage.clone()),
            log_repository: LogRepository::new(storage.clone()),
            storage,
        }
    }

    pub async fn find_open(&self, device_id: &str) -> Result<Option<Session>, EngineError> {
        Ok(self.session_repository.find_open_by_device(device_id).await?)
    }

    /// Opens a session for `user` and marks the seat active in the same
    /// transaction.
    pub async fn open(&self, device_id: &str, user: &User, now: OffsetDateTime) -> Result<Session, EngineError> {
        let mut session = Session {
            id: 0,
            device_id: device_id.to_string(),
            card_uid: user.card_uid.clone(),
            user_name: user.username.clone(),
            start_time: now,
            end_time: None,
            duration_sec: 0,
            fee: Money::ZERO,
            end_reason: None,
        };

        let mut tx = self.storage.get_pool().begin().await?;
        session.id = self.session_repository.create(&session, &mut tx).await?;
        self.device_repository.mark_active(device_id, user.id, &mut tx).await?;
        tx.commit().await?;

        tracing::info!("session {} opened on {} for {}", session.id, device_id, user.card_uid);

        let entry = SystemLog {
            id: 0,
            log_type: SystemLogKind::Login,
            device_id: device_id.to_string(),
            card_uid: user.card_uid.clone(),
            content: format!("{} logged in", user.username),
            created_at: now,
        };
        if let Err(e) = self.write_log(&entry).await {
            tracing::warn!("failed to write login log for {}: {}", device_id, e);
        }

        Ok(session)
    }

    /// Settles the open session of `device_id`, if any.
    pub async fn checkout(
        &self,
        device_id: &str,
        now: OffsetDateTime,
        hint: Option<u64>,
        reason: EndReason,
    ) -> Result<Option<SettledSession>, EngineError> {
        match self.find_open(device_id).await? {
            Some(session) => self.billing.settle(&session, now, hint, reason).await,
            None => Ok(None),
        }
    }

    async fn write_log(&self, entry: &SystemLog) -> Result<(), sqlx::Error> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.log_repository.create_system(entry, &mut tx).await?;
        tx.commit().await
    }
}
