use std::sync::Arc;
use std::time::Duration;

use netbar_api::Topic;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, SubscribeFilter};

use crate::configs::Gateway;

use super::Dispatcher;

/// Builds the bus client from settings. The event loop must be driven by
/// [`GatewayService::run`] for the client to make progress.
pub fn connect(gateway: &Gateway) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(&gateway.client_id, &gateway.host, gateway.port);
    options.set_keep_alive(Duration::from_secs(gateway.keep_alive_secs));
    options.set_clean_session(true);

    if let (Some(username), Some(password)) = (&gateway.username, &gateway.password) {
        options.set_credentials(username, password);
    }

    AsyncClient::new(options, 64)
}

/// Inbound side of the bus. Subscribes on every (re)connect and feeds
/// deliveries to the dispatcher.
pub struct GatewayService {
    client: AsyncClient,
    event_loop: EventLoop,
    dispatcher: Arc<Dispatcher>,
    prefix: String,
    backoff: Duration,
}

impl GatewayService {
    pub fn new(client: AsyncClient, event_loop: EventLoop, dispatcher: Arc<Dispatcher>, gateway: &Gateway) -> Self {
        Self {
            client,
            event_loop,
            dispatcher,
            prefix: gateway.topic_prefix.clone(),
            backoff: Duration::from_secs(gateway.reconnect_backoff_secs),
        }
    }

    pub async fn run(mut self) {
        loop {
            match self.event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("connected to broker");
                    self.subscribe();
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    self.dispatcher.route(&publish.topic, &publish.payload).await;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("MQTT error: {}, retrying in {:?}", e, self.backoff);
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
    }

    fn subscribe(&self) {
        let filters = Topic::subscriptions(&self.prefix)
            .into_iter()
            .map(|path| SubscribeFilter::new(path, QoS::AtMostOnce));

        match self.client.try_subscribe_many(filters) {
            Ok(()) => tracing::debug!("subscribed to {}/+/#", self.prefix),
            Err(e) => tracing::error!("failed to subscribe: {}", e),
        }
    }
}
