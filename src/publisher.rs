use crate::{
    connection::provision, BrokerConnector, Encoder, JsonEncoder, Message, PublishOptions,
    PublisherConfig, Result, StreamBusError, StreamContext,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Publisher for one provisioned durable stream
///
/// Offers a synchronous path (one blocking broker call per message) and an
/// asynchronous fan-out path (`workers_count` non-blocking calls per message
/// followed by a single bounded wait for the aggregate acknowledgment).
/// Stateless across calls apart from the owned stream handle.
pub struct Publisher {
    context: Arc<dyn StreamContext>,
    encoder: Arc<dyn Encoder>,
    options: PublishOptions,
    workers_count: usize,
    async_timeout: Duration,
}

impl Publisher {
    /// Provision a stream and create a publisher for it
    pub async fn connect(config: PublisherConfig, connector: &dyn BrokerConnector) -> Result<Self> {
        config.validate()?;
        let context = provision(&config.connection, connector).await?;
        Ok(Self::assemble(context, config))
    }

    /// Create a publisher for an already-provisioned stream handle
    pub fn with_context(context: Arc<dyn StreamContext>, config: PublisherConfig) -> Result<Self> {
        config.validate_settings()?;
        Ok(Self::assemble(context, config))
    }

    fn assemble(context: Arc<dyn StreamContext>, config: PublisherConfig) -> Self {
        Self {
            context,
            encoder: Arc::new(JsonEncoder::new()),
            options: config.publish_options,
            workers_count: config.workers_count,
            async_timeout: config.async_timeout,
        }
    }

    /// Replace the message encoder
    pub fn with_encoder(mut self, encoder: Arc<dyn Encoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Publish messages synchronously, in order
    ///
    /// Each message blocks until the broker acknowledges persistence. The
    /// call stops at the first encoding or broker failure; earlier messages
    /// stay published and later ones are never attempted.
    pub async fn publish(&self, subject: &str, messages: &[Message]) -> Result<()> {
        for message in messages {
            let payload = self.encoder.encode(message)?;

            self.context
                .publish(subject, payload, &self.options)
                .await
                .map_err(|e| {
                    StreamBusError::publish(format!(
                        "can't publish synchronously to '{subject}': {e}"
                    ))
                })?;

            debug!(subject, id = %message.id(), "published message");
        }

        Ok(())
    }

    /// Publish messages through the redundant async fan-out, in order
    ///
    /// Per message: encode once, issue `workers_count` non-blocking publish
    /// calls carrying the same encoded buffer, then wait once for the
    /// broker's aggregate completion signal, bounded by the async timeout.
    /// An issue-time rejection stops the fan-out immediately. When the bound
    /// elapses the wait is abandoned; in-flight publishes are not cancelled
    /// and late acknowledgments are discarded. Fan-out for the next message
    /// does not begin until the current wait resolves.
    pub async fn publish_async(&self, subject: &str, messages: &[Message]) -> Result<()> {
        for message in messages {
            let payload = self.encoder.encode(message)?;

            for _ in 0..self.workers_count {
                self.context
                    .publish_async(subject, payload.clone(), &self.options)
                    .map_err(|e| {
                        StreamBusError::publish(format!(
                            "can't publish asynchronously to '{subject}': {e}"
                        ))
                    })?;
            }

            if timeout(self.async_timeout, self.context.await_async_complete())
                .await
                .is_err()
            {
                warn!(
                    subject,
                    id = %message.id(),
                    timeout = ?self.async_timeout,
                    "abandoning wait for async publish completion"
                );
                return Err(StreamBusError::async_timeout(format!(
                    "didn't resolve in time after {:?}",
                    self.async_timeout
                )));
            }

            debug!(
                subject,
                id = %message.id(),
                workers = self.workers_count,
                "async fan-out acknowledged"
            );
        }

        Ok(())
    }

    /// Fan-out worker count in effect
    pub fn workers_count(&self) -> usize {
        self.workers_count
    }

    /// Async completion timeout in effect
    pub fn async_timeout(&self) -> Duration {
        self.async_timeout
    }
}
