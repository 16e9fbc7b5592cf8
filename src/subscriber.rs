use crate::{
    connection::provision, BrokerConnector, PushHandler, Result, StreamBusError, StreamContext,
    SubscribeOptions, SubscriberConfig,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Subscriber for one provisioned durable stream
///
/// Registers push-style callbacks or pull-style synchronous subscriptions
/// against the owned stream handle. Delivery happens on broker tasks outside
/// caller control; handlers must be re-entrant.
pub struct Subscriber {
    context: Arc<dyn StreamContext>,
    options: SubscribeOptions,
}

impl Subscriber {
    /// Provision a stream and create a subscriber for it
    pub async fn connect(
        config: SubscriberConfig,
        connector: &dyn BrokerConnector,
    ) -> Result<Self> {
        let context = provision(&config.connection, connector).await?;
        Ok(Self::with_context(context, config))
    }

    /// Create a subscriber for an already-provisioned stream handle
    pub fn with_context(context: Arc<dyn StreamContext>, config: SubscriberConfig) -> Self {
        Self {
            context,
            options: config.subscribe_options,
        }
    }

    /// Register a push-style subscription
    ///
    /// The handler is checked before any broker interaction: an unset handler
    /// fails without a registration side effect. Once registered, the broker
    /// invokes the handler once per routed message for the life of the
    /// subscription.
    pub async fn subscribe(&self, subject: &str, handler: Option<PushHandler>) -> Result<()> {
        let handler = handler.ok_or_else(|| {
            StreamBusError::invalid_handler("subscription message handler can't be unset")
        })?;

        self.context
            .subscribe_push(subject, handler, &self.options)
            .await
            .map_err(|e| {
                StreamBusError::subscribe(format!(
                    "can't register push subscription on '{subject}': {e}"
                ))
            })?;

        info!(subject, "registered push subscription");
        Ok(())
    }

    /// Register a pull-style synchronous subscription
    ///
    /// No callback is installed; the caller polls inbound messages through
    /// the stream handle's own primitives.
    pub async fn subscribe_sync(&self, subject: &str) -> Result<()> {
        self.context
            .subscribe_pull(subject, &self.options)
            .await
            .map_err(|e| {
                StreamBusError::subscribe(format!(
                    "can't register pull subscription on '{subject}': {e}"
                ))
            })?;

        debug!(subject, "registered pull subscription");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectionConfig, InMemoryBroker, InboundMessage, PublishOptions};
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config_fixture() -> SubscriberConfig {
        SubscriberConfig::new(ConnectionConfig::new(
            "nats://localhost:4222",
            "ORDERS",
            ["ORDERS.*"],
        ))
    }

    async fn subscriber_fixture(broker: &InMemoryBroker) -> Subscriber {
        Subscriber::connect(config_fixture(), broker).await.unwrap()
    }

    fn counting_handler() -> (PushHandler, Arc<AtomicUsize>) {
        let invocations = Arc::new(AtomicUsize::new(0));
        let invocations_clone = invocations.clone();
        let handler: PushHandler = Arc::new(move |_: InboundMessage| {
            invocations_clone.fetch_add(1, Ordering::SeqCst);
        });
        (handler, invocations)
    }

    #[tokio::test]
    async fn test_connect_provisions_the_stream() {
        let broker = InMemoryBroker::new();

        subscriber_fixture(&broker).await;

        assert_eq!(broker.declare_count(), 1);
        assert_eq!(
            broker.declared_streams().get("ORDERS"),
            Some(&vec!["ORDERS.*".to_string()])
        );
    }

    #[tokio::test]
    async fn test_subscribe_rejects_unset_handler_without_broker_interaction() {
        let broker = InMemoryBroker::new();
        let subscriber = subscriber_fixture(&broker).await;

        let actual = subscriber.subscribe("ORDERS.created", None).await;

        assert!(matches!(
            actual,
            Err(StreamBusError::InvalidHandler { .. })
        ));
        assert_eq!(broker.subscribe_push_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_registers_push_handler() {
        let broker = InMemoryBroker::new();
        let subscriber = subscriber_fixture(&broker).await;
        let (handler, invocations) = counting_handler();

        subscriber
            .subscribe("ORDERS.*", Some(handler))
            .await
            .unwrap();

        assert_eq!(broker.subscribe_push_count(), 1);
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscribed_handler_receives_published_frames() {
        let broker = InMemoryBroker::new();
        let subscriber = subscriber_fixture(&broker).await;
        let (handler, invocations) = counting_handler();

        subscriber
            .subscribe("ORDERS.*", Some(handler))
            .await
            .unwrap();

        let session = broker
            .connect("nats://localhost:4222", &Default::default())
            .await
            .unwrap();
        let context = session.stream_context(&Default::default()).await.unwrap();
        context
            .publish(
                "ORDERS.created",
                Bytes::from_static(b"frame"),
                &PublishOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(invocations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_subscribe_maps_broker_rejection_without_invoking_handler() {
        let broker = InMemoryBroker::new();
        let subscriber = subscriber_fixture(&broker).await;
        broker.fail_subscribe();
        let (handler, invocations) = counting_handler();

        let actual = subscriber.subscribe("ORDERS.*", Some(handler)).await;

        assert!(matches!(actual, Err(StreamBusError::Subscribe { .. })));
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscribe_sync_registers_pull_subscription() {
        let broker = InMemoryBroker::new();
        let subscriber = subscriber_fixture(&broker).await;

        subscriber.subscribe_sync("ORDERS.*").await.unwrap();

        assert_eq!(broker.subscribe_pull_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_sync_queue_is_pollable() {
        let broker = InMemoryBroker::new();
        let subscriber = subscriber_fixture(&broker).await;

        subscriber.subscribe_sync("ORDERS.*").await.unwrap();

        let session = broker
            .connect("nats://localhost:4222", &Default::default())
            .await
            .unwrap();
        let context = session.stream_context(&Default::default()).await.unwrap();
        context
            .publish(
                "ORDERS.created",
                Bytes::from_static(b"frame"),
                &PublishOptions::default(),
            )
            .await
            .unwrap();

        let actual = broker.pull_next("ORDERS.*").unwrap();
        assert_eq!(actual.subject, "ORDERS.created");
    }

    #[tokio::test]
    async fn test_subscribe_sync_maps_broker_rejection() {
        let broker = InMemoryBroker::new();
        let subscriber = subscriber_fixture(&broker).await;
        broker.fail_subscribe();

        let actual = subscriber.subscribe_sync("ORDERS.*").await;

        assert!(matches!(actual, Err(StreamBusError::Subscribe { .. })));
    }
}
