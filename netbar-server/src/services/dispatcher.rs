use std::collections::HashMap;
use std::sync::Arc;

use netbar_api::Topic;
use netbar_api::message::Inbound;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, Sender, error::TrySendError};
use tokio::task::JoinHandle;

use super::SeatEngine;

const QUEUE_CAPACITY: usize = 64;

struct Worker {
    sender: Sender<Inbound>,
    handle: JoinHandle<()>,
}

/// Routes inbound messages to the engine through one ordered queue per
/// device. Messages of one device never run concurrently; different devices
/// run in parallel.
pub struct Dispatcher {
    engine: Arc<SeatEngine>,
    prefix: String,
    workers: Mutex<HashMap<String, Worker>>,
}

impl Dispatcher {
    pub fn new(engine: Arc<SeatEngine>, prefix: impl Into<String>) -> Self {
        Self {
            engine,
            prefix: prefix.into(),
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Decodes a raw bus delivery and queues it. Unknown topics and
    /// undecodable payloads are dropped.
    pub async fn route(&self, topic: &str, payload: &[u8]) {
        let Some(topic) = Topic::parse(&self.prefix, topic) else {
            tracing::debug!("ignoring message on unknown topic {}", topic);
            return;
        };

        match Inbound::decode(topic.kind, payload) {
            Some(message) => self.dispatch(&topic.device_id, message).await,
            None => tracing::debug!("dropping empty payload on {}", topic),
        }
    }

    pub async fn dispatch(&self, device_id: &str, message: Inbound) {
        let mut workers = self.workers.lock().await;

        let worker = workers
            .entry(device_id.to_string())
            .or_insert_with(|| self.spawn_worker(device_id));

        match worker.sender.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                tracing::warn!("queue for {} is full, dropping {:?}", device_id, message.kind());
            }
            Err(TrySendError::Closed(message)) => {
                tracing::warn!("worker for {} stopped, restarting", device_id);
                let worker = self.spawn_worker(device_id);
                if worker.sender.try_send(message).is_err() {
                    tracing::error!("failed to queue message for {}", device_id);
                }
                workers.insert(device_id.to_string(), worker);
            }
        }
    }

    /// Closes every queue and waits until all queued messages are handled.
    pub async fn drain(&self) {
        let workers: Vec<Worker> = self.workers.lock().await.drain().map(|(_, worker)| worker).collect();

        for Worker { sender, handle } in workers {
            drop(sender);
            if let Err(e) = handle.await {
                tracing::error!("device worker ended abnormally: {}", e);
            }
        }
    }

    fn spawn_worker(&self, device_id: &str) -> Worker {
        let (sender, mut receiver) = mpsc::channel::<Inbound>(QUEUE_CAPACITY);
        let engine = self.engine.clone();
        let device_id = device_id.to_string();

        let handle = tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                let kind = message.kind();
                if let Err(e) = engine.handle(&device_id, message).await {
                    tracing::error!("failed to handle {:?} from {}: {}", kind, device_id, e);
                }
            }
        });

        Worker { sender, handle }
    }
}
