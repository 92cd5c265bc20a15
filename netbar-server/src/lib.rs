use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::app::create_app;
use crate::configs::{SchemaManager, Settings, Storage};
use crate::services::{Dispatcher, GatewayService, MqttPublisher, SeatEngine, connect};

pub mod app;
pub mod configs;
pub mod errors;
pub mod handles;
pub mod models;
pub mod repositories;
pub mod services;

pub async fn run(settings: &Arc<Settings>) -> anyhow::Result<()> {
    let storage = Arc::new(Storage::new(settings.database.clone(), SchemaManager::default()).await?);

    let (client, event_loop) = connect(&settings.gateway);
    let publisher = Arc::new(MqttPublisher::new(client.clone(), &settings.gateway.topic_prefix));

    let engine = Arc::new(SeatEngine::new(storage, publisher, &settings.billing, &settings.device));
    engine.init().await?;

    let dispatcher = Arc::new(Dispatcher::new(engine.clone(), &settings.gateway.topic_prefix));
    let gateway = GatewayService::new(client, event_loop, dispatcher, &settings.gateway);
    tokio::spawn(gateway.run());

    let app = create_app(engine);

    let ip_addr = settings.server.host.parse::<IpAddr>()?;

    let address = SocketAddr::from((ip_addr, settings.server.port));

    let listener = TcpListener::bind(&address).await?;

    tracing::info!("listening on {:?}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use netbar_api::Money;
    use time::OffsetDateTime;

    use crate::configs::{Database, SchemaManager, Storage};
    use crate::models::{Session, User};
    use crate::repositories::{DeviceRepository, SessionRepository, UserRepository};

    /// File-backed store with a multi-connection pool, for tests where
    /// writers must actually contend.
    pub async fn setup_file_db(path: &Path) -> Arc<Storage> {
        Arc::new(
            Storage::new(
                Database {
                    url: format!("sqlite://{}?mode=rwc", path.display()),
                    clean_start: true,
                    max_connections: Some(8),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        )
    }

    pub async fn setup_test_db() -> Arc<Storage> {
        Arc::new(
            Storage::new(
                Database {
                    url: String::from("sqlite::memory:"),
                    clean_start: true,
                    max_connections: None,
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        )
    }

    pub async fn create_test_user(storage: Arc<Storage>, card_uid: &str, balance: Money) -> User {
        let user = User {
            id: 0,
            card_uid: card_uid.to_string(),
            username: format!("user_{}", card_uid.to_lowercase()),
            id_card: "110101199001010011".to_string(),
            balance,
            is_active: true,
        };

        let repo = UserRepository::new(storage.clone());
        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = repo.create(&user, &mut tx).await.unwrap();
        tx.commit().await.unwrap();

        User { id, ..user }
    }

    pub async fn create_test_device(storage: Arc<Storage>, device_id: &str) {
        let repo = DeviceRepository::new(storage.clone());
        let mut tx = storage.get_pool().begin().await.unwrap();
        repo.register(device_id, &mut tx).await.unwrap();
        tx.commit().await.unwrap();
    }

    /// Opens a session for `user` on `device_id`, registering the device if needed.
    pub async fn create_test_session(storage: Arc<Storage>, device_id: &str, user: &User) -> Session {
        create_test_device(storage.clone(), device_id).await;

        let session = Session {
            id: 0,
            device_id: device_id.to_string(),
            card_uid: user.card_uid.clone(),
            user_name: user.username.clone(),
            start_time: OffsetDateTime::now_utc(),
            end_time: None,
            duration_sec: 0,
            fee: Money::ZERO,
            end_reason: None,
        };

        let mut tx = storage.get_pool().begin().await.unwrap();
        let id = SessionRepository::new(storage.clone()).create(&session, &mut tx).await.unwrap();
        DeviceRepository::new(storage.clone())
            .mark_active(device_id, user.id, &mut tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        Session { id, ..session }
    }
}
