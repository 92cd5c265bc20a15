use std::sync::Arc;

use netbar_api::Money;
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::errors::{AccessError, EngineError};
use crate::models::{Device, DeviceStatus, EndReason, Session, User};
use crate::repositories::{SessionRepository, UserRepository};

use super::BillingService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Every rule passed; a session should be opened for this user
    Approved(User),
    /// The swiping card already owns the open session on this seat
    AlreadyActiveSameCard { session: Session, elapsed_sec: u64 },
    Rejected(AccessError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub decision: Decision,
    /// Id of a stale session force-closed before the rules ran
    pub stale_cleared: Option<i64>,
}

/// Rules a card swipe must pass before a seat opens.
pub struct AccessService {
    billing: Arc<BillingService>,
    session_repository: SessionRepository,
    user_repository: UserRepository,
    min_balance: Money,
    adult_age: u32,
}

impl AccessService {
    pub fn new(storage: Arc<Storage>, billing: Arc<BillingService>, min_balance: Money, adult_age: u32) -> Self {
        Self {
            billing,
            session_repository: SessionRepository::new(storage.clone()),
            user_repository: UserRepository::new(storage),
            min_balance,
            adult_age,
        }
    }

    /// Evaluates a swipe of `card_uid` on `device`.
    ///
    /// Order is fixed: maintenance, then contention with an open session,
    /// then the card holder's eligibility. An open session on a seat that
    /// reports itself idle is closed as stale and evaluation continues as if
    /// the seat were free.
    pub async fn evaluate(&self, device: &Device, card_uid: &str, now: OffsetDateTime) -> Result<Verdict, EngineError> {
        let mut stale_cleared = None;

        if device.is_maintenance {
            return Ok(Verdict::rejected(AccessError::DeviceInMaintenance, None));
        }

        if let Some(session) = self.session_repository.find_open_by_device(&device.device_id).await? {
            if device.status == DeviceStatus::Idle {
                tracing::warn!("closing stale session {} on idle seat {}", session.id, device.device_id);
                self.billing.settle(&session, now, None, EndReason::StaleAutoClose).await?;
                stale_cleared = Some(session.id);
            } else if session.card_uid == card_uid {
                let elapsed_sec = session.elapsed_at(now);
                return Ok(Verdict {
                    decision: Decision::AlreadyActiveSameCard { session, elapsed_sec },
                    stale_cleared,
                });
            } else {
                return Ok(Verdict::rejected(AccessError::DeviceBusy, stale_cleared));
            }
        }

        let Some(user) = self.user_repository.find_by_card(card_uid).await? else {
            return Ok(Verdict::rejected(AccessError::InvalidCard, stale_cleared));
        };

        if let Err(e) = self.check_eligibility(&user, now) {
            return Ok(Verdict::rejected(e, stale_cleared));
        }

        Ok(Verdict {
            decision: Decision::Approved(user),
            stale_cleared,
        })
    }

    fn check_eligibility(&self, user: &User, now: OffsetDateTime) -> Result<(), AccessError> {
        if !user.is_active {
            return Err(AccessError::DisabledAccount);
        }

        if let Some(age) = user.age_on(now.date()) {
            if age < self.adult_age {
                return Err(AccessError::UnderageUser);
            }
        }

        if user.balance < self.min_balance {
            return Err(AccessError::InsufficientBalance);
        }

        Ok(())
    }
}

impl Verdict {
    fn rejected(error: AccessError, stale_cleared: Option<i64>) -> Self {
        Self {
            decision: Decision::Rejected(error),
            stale_cleared,
        }
    }
}
