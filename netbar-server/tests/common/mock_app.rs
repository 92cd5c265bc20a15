use std::sync::Arc;

use axum::Router;
use netbar_api::message::{Command, Inbound};
use netbar_api::{Money, TopicKind};
use netbar_server::app::create_app;
use netbar_server::configs::{Billing, DevicePolicy, Storage};
use netbar_server::models::{Device, Session, User};
use netbar_server::repositories::{DeviceRepository, SessionRepository, UserRepository};
use netbar_server::services::{RecordingPublisher, SeatEngine};
use netbar_server::tests::{create_test_user, setup_test_db};
use time::OffsetDateTime;

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub engine: Arc<SeatEngine>,
    pub publisher: Arc<RecordingPublisher>,
    pub router: Router,
}

impl MockApp {
    pub async fn new() -> Self {
        Self::with_storage(setup_test_db().await).await
    }

    pub async fn with_storage(storage: Arc<Storage>) -> Self {
        let publisher = Arc::new(RecordingPublisher::new());

        let billing = Billing {
            default_rate: Money::from_cents(100),
            min_balance: Money::from_cents(100),
        };

        let engine = Arc::new(SeatEngine::new(
            storage.clone(),
            publisher.clone(),
            &billing,
            &DevicePolicy::default(),
        ));
        engine.init().await.unwrap();

        let router = create_app(engine.clone());

        Self {
            storage,
            engine,
            publisher,
            router,
        }
    }

    pub async fn user(&self, card_uid: &str, balance: &str) -> User {
        create_test_user(self.storage.clone(), card_uid, balance.parse().unwrap()).await
    }

    pub async fn send(&self, device_id: &str, kind: TopicKind, payload: &str, at: OffsetDateTime) {
        let message = Inbound::decode(kind, payload.as_bytes()).unwrap();
        self.engine.handle_at(device_id, message, at).await.unwrap();
    }

    pub async fn telemetry(&self, device_id: &str, payload: &str, at: OffsetDateTime) {
        self.send(device_id, TopicKind::State, payload, at).await;
    }

    pub async fn swipe(&self, device_id: &str, card_uid: &str, at: OffsetDateTime) {
        self.send(device_id, TopicKind::Card, &format!("uid={card_uid}"), at).await;
    }

    pub async fn commands(&self, device_id: &str) -> Vec<Command> {
        self.publisher.sent_to(device_id).await
    }

    pub async fn last_command(&self, device_id: &str) -> Option<Command> {
        self.commands(device_id).await.pop()
    }

    pub async fn device(&self, device_id: &str) -> Device {
        DeviceRepository::new(self.storage.clone())
            .find_by_id(device_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn sessions(&self, device_id: &str) -> Vec<Session> {
        SessionRepository::new(self.storage.clone())
            .find_by_device(device_id)
            .await
            .unwrap()
    }

    pub async fn balance(&self, card_uid: &str) -> Money {
        UserRepository::new(self.storage.clone())
            .find_by_card(card_uid)
            .await
            .unwrap()
            .unwrap()
            .balance
    }
}
