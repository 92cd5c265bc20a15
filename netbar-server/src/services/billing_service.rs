use std::sync::Arc;

use netbar_api::Money;
use serde::Serialize;
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::errors::EngineError;
use crate::models::{ConsumeLog, EndReason, Session, SystemLog, SystemLogKind};
use crate::repositories::{DeviceRepository, LedgerRepository, LogRepository, RateRepository, SessionRepository, SettleRecord, UserRepository};

/// Fee for `elapsed_sec` at `rate` per minute, rounded half-up to the cent.
pub fn fee_for(elapsed_sec: u64, rate: Money) -> Money {
    if !rate.is_positive() {
        return Money::ZERO;
    }

    let cents = (i128::from(elapsed_sec) * i128::from(rate.cents()) * 2 + 60) / 120;

    Money::from_cents(i64::try_from(cents).unwrap_or(i64::MAX))
}

/// Device-reported seconds win when positive, otherwise wall clock since start.
pub fn elapsed_for(session: &Session, now: OffsetDateTime, hint: Option<u64>) -> u64 {
    hint.filter(|sec| *sec > 0)
        .unwrap_or_else(|| session.elapsed_at(now))
}

/// Outcome of a settlement that actually closed the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettledSession {
    pub session_id: i64,
    pub device_id: String,
    pub card_uid: String,
    pub duration_sec: u64,
    pub fee: Money,
    /// `None` when nothing was debited
    pub balance_after: Option<Money>,
    pub end_reason: EndReason,
}

pub struct BillingService {
    storage: Arc<Storage>,
    default_rate: Money,
    session_repository: SessionRepository,
    user_repository: UserRepository,
    device_repository: DeviceRepository,
    ledger_repository: LedgerRepository,
    rate_repository: RateRepository,
    log_repository: LogRepository,
}

impl BillingService {
    pub fn new(storage: Arc<Storage>, default_rate: Money) -> Self {
        Self {
            default_rate,
            session_repository: SessionRepository::new(storage.clone()),
            user_repository: UserRepository::new(storage.clone()),
            device_repository: DeviceRepository::new(storage.clone()),
            ledger_repository: LedgerRepository::new(storage.clone()),
            rate_repository: RateRepository::new(storage.clone()),
            log_repository: LogRepository::new(storage.clone()),
            storage,
        }
    }

    /// Seeds the store with the configured rate when none is set.
    pub async fn seed_rate(&self) -> Result<(), EngineError> {
        let mut tx = self.storage.get_pool().begin().await?;
        if self.rate_repository.seed(self.default_rate, &mut tx).await? {
            tracing::info!("seeded rate {} per minute", self.default_rate);
        }
        tx.commit().await?;

        Ok(())
    }

    /// The live rate, read from the store on every call.
    pub async fn current_rate(&self) -> Result<Money, EngineError> {
        Ok(self.rate_repository.find().await?.unwrap_or(self.default_rate))
    }

    pub async fn update_rate(&self, rate: Money) -> Result<(), EngineError> {
        let mut tx = self.storage.get_pool().begin().await?;
        self.rate_repository.update(rate, &mut tx).await?;
        tx.commit().await?;

        tracing::info!("rate set to {} per minute", rate);

        Ok(())
    }

    /// Closes `session` and applies its fee.
    ///
    /// Idempotent by session id: the first caller closes the session, debits
    /// the balance and frees the seat in one transaction; every later caller
    /// gets `None` and changes nothing.
    pub async fn settle(
        &self,
        session: &Session,
        now: OffsetDateTime,
        hint: Option<u64>,
        reason: EndReason,
    ) -> Result<Option<SettledSession>, EngineError> {
        let duration_sec = elapsed_for(session, now, hint);
        let fee = match reason {
            EndReason::StaleAutoClose => Money::ZERO,
            _ => fee_for(duration_sec, self.current_rate().await?),
        };

        let record = SettleRecord {
            end_time: now,
            duration_sec,
            fee,
            end_reason: reason,
        };

        let mut tx = self.storage.get_pool().begin().await?;

        if !self.session_repository.close(session.id, &record, &mut tx).await? {
            tx.rollback().await?;
            tracing::debug!("session {} on {} already settled", session.id, session.device_id);
            return Ok(None);
        }

        let mut balance_after = None;
        if fee.is_positive() && !session.card_uid.is_empty() {
            if let Some((user_id, balance)) = self.user_repository.deduct(&session.card_uid, fee, &mut tx).await? {
                let entry = ConsumeLog {
                    id: 0,
                    user_id,
                    session_id: session.id,
                    amount: fee,
                    balance_after: balance,
                    remark: format!("{} {}s on {}", session.device_id, duration_sec, now.date()),
                    created_at: now,
                };
                self.ledger_repository.record_consume(&entry, &mut tx).await?;
                balance_after = Some(balance);
            }
        }

        self.device_repository.mark_idle(&session.device_id, &mut tx).await?;

        tx.commit().await?;

        tracing::info!(
            "settled session {} on {}: {}s, fee {}, reason {:?}",
            session.id,
            session.device_id,
            duration_sec,
            fee,
            reason
        );

        self.audit_logout(session, fee, reason, now).await;

        Ok(Some(SettledSession {
            session_id: session.id,
            device_id: session.device_id.clone(),
            card_uid: session.card_uid.clone(),
            duration_sec,
            fee,
            balance_after,
            end_reason: reason,
        }))
    }

    async fn audit_logout(&self, session: &Session, fee: Money, reason: EndReason, now: OffsetDateTime) {
        let entry = SystemLog {
            id: 0,
            log_type: SystemLogKind::Logout,
            device_id: session.device_id.clone(),
            card_uid: session.card_uid.clone(),
            content: format!("{} logged out, fee {}, reason {:?}", session.user_name, fee, reason),
            created_at: now,
        };

        let result: Result<(), sqlx::Error> = async {
            let mut tx = self.storage.get_pool().begin().await?;
            self.log_repository.create_system(&entry, &mut tx).await?;
            tx.commit().await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!("failed to write logout log for {}: {}", session.device_id, e);
        }
    }
}
