use std::sync::Arc;
use std::time::Duration;

use netbar_api::Money;
use netbar_api::message::{Alert, CardSwipe, Command, DebugNote, DeviceCommand, Inbound, Telemetry};
use serde::Serialize;
use time::OffsetDateTime;

use crate::configs::{Billing, DevicePolicy, Storage};
use crate::errors::{AccessError, EngineError};
use crate::models::{AlarmKind, Device, DeviceStatus, EndReason, RechargeLog, SeatStatus};
use crate::repositories::{DeviceSnapshot, LedgerRepository, UserRepository};

use super::{
    AccessService, AlarmCooldown, AlarmService, BillingService, CommandPublisher, Decision, DeviceService,
    SessionService, SettledSession, balance_exhausted, derive_status, fee_for, is_end_of_use, needs_resync,
};

/// A device row with its operator-facing status.
#[derive(Debug, Clone, Serialize)]
pub struct SeatView {
    #[serde(flatten)]
    pub device: Device,
    pub display_status: SeatStatus,
}

/// Turns inbound seat messages into session transitions, billing and
/// outbound commands. Callers serialize work per device.
pub struct SeatEngine {
    storage: Arc<Storage>,
    policy: DevicePolicy,
    publisher: Arc<dyn CommandPublisher>,
    billing: Arc<BillingService>,
    access: AccessService,
    sessions: SessionService,
    devices: DeviceService,
    alarms: AlarmService,
    user_repository: UserRepository,
    ledger_repository: LedgerRepository,
}

impl SeatEngine {
    pub fn new(
        storage: Arc<Storage>,
        publisher: Arc<dyn CommandPublisher>,
        billing: &Billing,
        policy: &DevicePolicy,
    ) -> Self {
        let billing_service = Arc::new(BillingService::new(storage.clone(), billing.default_rate));
        let cooldown = AlarmCooldown::new(Duration::from_secs(policy.alarm_cooldown_secs));

        Self {
            policy: policy.clone(),
            publisher,
            access: AccessService::new(storage.clone(), billing_service.clone(), billing.min_balance, policy.adult_age),
            sessions: SessionService::new(storage.clone(), billing_service.clone()),
            devices: DeviceService::new(storage.clone()),
            alarms: AlarmService::new(storage.clone(), cooldown),
            user_repository: UserRepository::new(storage.clone()),
            ledger_repository: LedgerRepository::new(storage.clone()),
            billing: billing_service,
            storage,
        }
    }

    pub async fn init(&self) -> Result<(), EngineError> {
        self.billing.seed_rate().await
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub async fn handle(&self, device_id: &str, message: Inbound) -> Result<(), EngineError> {
        self.handle_at(device_id, message, OffsetDateTime::now_utc()).await
    }

    pub async fn handle_at(&self, device_id: &str, message: Inbound, now: OffsetDateTime) -> Result<(), EngineError> {
        match message {
            Inbound::Telemetry(telemetry) => self.on_telemetry(device_id, &telemetry, now).await,
            Inbound::CardSwipe(swipe) => self.on_card(device_id, &swipe, now).await,
            Inbound::Alert(alert) => self.on_alert(device_id, &alert, now).await,
            Inbound::Debug(note) => self.on_debug(device_id, &note, now).await,
            Inbound::Command(command) => self.on_command(device_id, &command, now).await,
        }
    }

    async fn on_telemetry(&self, device_id: &str, telemetry: &Telemetry, now: OffsetDateTime) -> Result<(), EngineError> {
        let device = self.devices.find_or_register(device_id).await?;
        let previous_sec = u64::try_from(device.current_sec).unwrap_or(0);

        let mut open = self.sessions.find_open(device_id).await?;
        let ended = open.take_if(|_| is_end_of_use(previous_sec, telemetry.elapsed_sec));

        if let Some(session) = &ended {
            tracing::info!("seat {} reports end of use after {}s", device_id, previous_sec);
            self.billing.settle(session, now, Some(previous_sec), EndReason::Normal).await?;
        }

        let in_session = open.is_some();
        let snapshot = DeviceSnapshot {
            status: derive_status(telemetry, self.policy.smoke_alarm_threshold, in_session),
            pc_on: telemetry.pc_on,
            light_on: telemetry.light_on,
            human_present: telemetry.human_present,
            smoke_percent: telemetry.smoke_percent,
            current_sec: if in_session { telemetry.elapsed_sec } else { 0 },
            current_fee: if in_session { telemetry.fee } else { Money::ZERO },
            last_update: now,
        };
        self.devices.accept_telemetry(device_id, &snapshot).await?;

        if telemetry.smoke_percent >= self.policy.smoke_alarm_threshold {
            let message = format!("smoke {}%", telemetry.smoke_percent);
            self.raise_alarm(device_id, AlarmKind::Smoke, &message, now).await;
        }

        if ended.is_some() {
            return Ok(());
        }

        let Some(session) = open else {
            if telemetry.in_use {
                tracing::warn!("seat {} in use without an open session, resetting", device_id);
                self.notify(device_id, Command::Reset).await;
            }
            return Ok(());
        };

        let server_sec = session.elapsed_at(now);
        let user = self.user_repository.find_by_card(&session.card_uid).await?;
        let balance = user.as_ref().map_or(Money::ZERO, |user| user.balance);

        if needs_resync(telemetry.elapsed_sec, server_sec, self.policy.sync_tolerance_secs) {
            tracing::debug!("seat {} drifted: reports {}s, server {}s", device_id, telemetry.elapsed_sec, server_sec);
            self.notify(
                device_id,
                Command::RestoreSession {
                    name: session.user_name.clone(),
                    balance,
                    sec: server_sec,
                },
            )
            .await;
        }

        let elapsed = if telemetry.elapsed_sec > 0 { telemetry.elapsed_sec } else { server_sec };
        let projected = fee_for(elapsed, self.billing.current_rate().await?);

        if user.is_some() && balance_exhausted(projected, balance) {
            tracing::info!("balance exhausted on {}: projected {} against {}", device_id, projected, balance);
            self.notify(
                device_id,
                Command::Checkout {
                    code: "no_balance".to_string(),
                    msg: "balance_empty".to_string(),
                },
            )
            .await;
            self.billing.settle(&session, now, Some(elapsed), EndReason::BalanceEmpty).await?;
        }

        Ok(())
    }

    async fn on_card(&self, device_id: &str, swipe: &CardSwipe, now: OffsetDateTime) -> Result<(), EngineError> {
        let device = self.devices.find_or_register(device_id).await?;
        let verdict = self.access.evaluate(&device, &swipe.card_uid, now).await?;

        if let Some(session_id) = verdict.stale_cleared {
            tracing::info!("stale session {} cleared on {}", session_id, device_id);
        }

        let reply = match verdict.decision {
            Decision::Approved(user) => {
                self.sessions.open(device_id, &user, now).await?;
                Command::CardOk {
                    uid: user.card_uid,
                    name: user.username,
                    balance: user.balance,
                    sec: 0,
                }
            }
            Decision::AlreadyActiveSameCard { session, elapsed_sec } => {
                match self.user_repository.find_by_card(&session.card_uid).await? {
                    Some(user) => Command::CardOk {
                        uid: user.card_uid,
                        name: user.username,
                        balance: user.balance,
                        sec: elapsed_sec,
                    },
                    None => card_err(AccessError::InvalidCard),
                }
            }
            Decision::Rejected(e) => {
                tracing::info!("card {} rejected on {}: {}", swipe.card_uid, device_id, e);
                card_err(e)
            }
        };

        self.notify(device_id, reply).await;

        Ok(())
    }

    async fn on_alert(&self, device_id: &str, alert: &Alert, now: OffsetDateTime) -> Result<(), EngineError> {
        let kind = if alert.is_occupancy() {
            self.devices.set_status(device_id, DeviceStatus::Alarm).await?;
            AlarmKind::Occupy
        } else {
            AlarmKind::Other
        };

        self.raise_alarm(device_id, kind, &alert.text, now).await;

        Ok(())
    }

    async fn on_debug(&self, device_id: &str, note: &DebugNote, now: OffsetDateTime) -> Result<(), EngineError> {
        self.devices.record_debug(device_id, &note.text, now).await;

        if !note.requests_restore() {
            return Ok(());
        }

        let Some(device) = self.devices.find(device_id).await? else {
            return Ok(());
        };

        if let Some(session) = self.sessions.find_open(device_id).await? {
            let balance = self
                .user_repository
                .find_by_card(&session.card_uid)
                .await?
                .map_or(Money::ZERO, |user| user.balance);

            tracing::info!("restoring session {} on {}", session.id, device_id);
            self.notify(
                device_id,
                Command::RestoreSession {
                    name: session.user_name.clone(),
                    balance,
                    sec: session.elapsed_at(now),
                },
            )
            .await;
        }

        if device.is_maintenance {
            self.notify(device_id, Command::MaintOn).await;
        }

        Ok(())
    }

    async fn on_command(&self, device_id: &str, command: &DeviceCommand, now: OffsetDateTime) -> Result<(), EngineError> {
        if command.is_server_echo() {
            tracing::trace!("ignoring echo on {}: {}", device_id, command.text);
            return Ok(());
        }

        if !command.requests_checkout() {
            return Ok(());
        }

        let hint = match self.devices.find(device_id).await? {
            Some(device) => u64::try_from(device.current_sec).ok().filter(|sec| *sec > 0),
            None => return Ok(()),
        };

        match self.sessions.checkout(device_id, now, hint, EndReason::UserCheckout).await? {
            Some(settled) => tracing::info!("seat {} checked out, fee {}", device_id, settled.fee),
            None => tracing::debug!("checkout on {} without an open session", device_id),
        }

        Ok(())
    }

    pub async fn seats(&self, now: OffsetDateTime) -> Result<Vec<SeatView>, EngineError> {
        let liveness = Duration::from_secs(self.policy.offline_after_secs);

        Ok(self
            .devices
            .find_all()
            .await?
            .into_iter()
            .map(|device| SeatView {
                display_status: device.seat_status(now, liveness),
                device,
            })
            .collect())
    }

    /// Operator forced checkout. `None` when the seat had no open session.
    pub async fn admin_checkout(&self, device_id: &str, now: OffsetDateTime) -> Result<Option<SettledSession>, EngineError> {
        let device = self
            .devices
            .find(device_id)
            .await?
            .ok_or_else(|| EngineError::UnknownDevice(device_id.to_string()))?;

        let Some(session) = self.sessions.find_open(device_id).await? else {
            return Ok(None);
        };

        self.notify(
            device_id,
            Command::Checkout {
                code: "admin_stop".to_string(),
                msg: "admin_checkout".to_string(),
            },
        )
        .await;

        let hint = u64::try_from(device.current_sec).ok().filter(|sec| *sec > 0);

        self.billing.settle(&session, now, hint, EndReason::AdminStop).await
    }

    pub async fn set_maintenance(&self, device_id: &str, enabled: bool) -> Result<(), EngineError> {
        self.devices.set_maintenance(device_id, enabled).await?;

        let command = if enabled { Command::MaintOn } else { Command::MaintOff };
        self.notify(device_id, command).await;

        Ok(())
    }

    /// Publishes an operator command to a known device. Unlike engine
    /// replies, a publish failure is returned to the caller.
    pub async fn send_command(&self, device_id: &str, command: Command) -> Result<(), EngineError> {
        if self.devices.find(device_id).await?.is_none() {
            return Err(EngineError::UnknownDevice(device_id.to_string()));
        }

        self.publisher.publish(device_id, &command).await
    }

    pub async fn rate(&self) -> Result<Money, EngineError> {
        self.billing.current_rate().await
    }

    /// Stores the new rate and pushes it to every known device.
    pub async fn set_rate(&self, rate: Money) -> Result<(), EngineError> {
        self.billing.update_rate(rate).await?;

        for device in self.devices.find_all().await? {
            self.notify(&device.device_id, Command::SetRate { rate }).await;
        }

        Ok(())
    }

    /// Credits `amount` to a card. `None` for an unknown card.
    pub async fn recharge(&self, card_uid: &str, amount: Money, now: OffsetDateTime) -> Result<Option<Money>, EngineError> {
        let mut tx = self.storage.get_pool().begin().await?;

        let Some((user_id, balance_after)) = self.user_repository.credit(card_uid, amount, &mut tx).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let entry = RechargeLog {
            id: 0,
            user_id,
            amount,
            balance_after,
            created_at: now,
        };
        self.ledger_repository.record_recharge(&entry, &mut tx).await?;

        tx.commit().await?;

        tracing::info!("recharged {} with {}, balance {}", card_uid, amount, balance_after);

        Ok(Some(balance_after))
    }

    /// Alarm log writes never abort the state transition they accompany.
    async fn raise_alarm(&self, device_id: &str, kind: AlarmKind, message: &str, now: OffsetDateTime) {
        if let Err(e) = self.alarms.raise(device_id, kind, message, now).await {
            tracing::error!("failed to log {:?} alarm on {}: {}", kind, device_id, e);
        }
    }

    async fn notify(&self, device_id: &str, command: Command) {
        if let Err(e) = self.publisher.publish(device_id, &command).await {
            tracing::warn!("failed to publish {} to {}: {}", command, device_id, e);
        }
    }
}

fn card_err(error: AccessError) -> Command {
    Command::CardErr {
        code: error.code().to_string(),
        msg: error.msg().to_string(),
    }
}
