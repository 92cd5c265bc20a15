use async_trait::async_trait;
use netbar_api::message::Command;
use netbar_api::{Topic, TopicKind};
use rumqttc::{AsyncClient, QoS};

use crate::errors::EngineError;

/// Outbound side of the bus: one command topic per device.
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    async fn publish(&self, device_id: &str, command: &Command) -> Result<(), EngineError>;
}

pub struct MqttPublisher {
    client: AsyncClient,
    prefix: String,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl CommandPublisher for MqttPublisher {
    async fn publish(&self, device_id: &str, command: &Command) -> Result<(), EngineError> {
        let topic = Topic::new(device_id, TopicKind::Cmd).render(&self.prefix);
        let payload = command.encode();

        self.client
            .publish(&topic, QoS::AtMostOnce, false, payload.into_bytes())
            .await
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        tracing::debug!("publish {} -> {}", topic, command);

        Ok(())
    }
}

/// Keeps every published command in memory.
#[cfg(any(test, feature = "mock"))]
#[derive(Default)]
pub struct RecordingPublisher {
    sent: tokio::sync::Mutex<Vec<(String, Command)>>,
}

#[cfg(any(test, feature = "mock"))]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<(String, Command)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, device_id: &str) -> Vec<Command> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(target, _)| target == device_id)
            .map(|(_, command)| command.clone())
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }
}

#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn publish(&self, device_id: &str, command: &Command) -> Result<(), EngineError> {
        self.sent.lock().await.push((device_id.to_string(), command.clone()));

        Ok(())
    }
}
