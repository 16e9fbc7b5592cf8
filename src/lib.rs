//! # streambus
//!
//! Durable publish/subscribe client layered over a streaming message broker.
//!
//! The client opens a broker session, provisions a named durable stream bound
//! to a set of subject patterns, and drives publish and subscribe operations
//! against that stream.
//!
//! ## Key Components
//!
//! - **provision**: connection provisioner turning a configuration into a
//!   ready stream handle
//! - **Publisher**: synchronous publishing plus redundant async fan-out with
//!   a single bounded completion wait
//! - **Subscriber**: push-style callback and pull-style synchronous
//!   subscriptions
//! - **BrokerConnector / StreamContext**: broker capability traits the client
//!   is written against
//! - **InMemoryBroker**: in-process broker fake for tests and embedding
//!
//! ## Features
//!
//! - Idempotent stream provisioning (create-if-absent, no-op-if-matching)
//! - N-way fan-out async publishing amortizing one aggregate wait across all
//!   replicas of a message
//! - Bounded completion waits with fire-and-forget semantics past the
//!   deadline
//! - Injectable message encoding
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use streambus::{ConnectionConfig, InMemoryBroker, Message, Publisher, PublisherConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let connection = ConnectionConfig::new("nats://localhost:4222", "ORDERS", ["ORDERS.*"]);
//! let config = PublisherConfig::new(connection).with_workers_count(8);
//!
//! let broker = InMemoryBroker::new();
//! let publisher = Publisher::connect(config, &broker).await?;
//!
//! let message = Message::new(json!({"order_id": 42}));
//! publisher.publish_async("ORDERS.created", &[message]).await?;
//! # Ok(())
//! # }
//! ```

pub mod broker;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod publisher;
pub mod subscriber;
pub mod types;

// Re-export public API
pub use broker::{BrokerConnector, BrokerSession, InMemoryBroker, PushHandler, StreamContext};
pub use config::{
    ConnectionConfig, PublisherConfig, SubscriberConfig, DEFAULT_ASYNC_TIMEOUT,
    DEFAULT_WORKERS_COUNT,
};
pub use connection::provision;
pub use error::{Result, StreamBusError};
pub use message::{Encoder, JsonEncoder, Message, MessageBuilder};
pub use publisher::Publisher;
pub use subscriber::Subscriber;
pub use types::{
    ConnectOptions, InboundMessage, MessageId, MessageMetadata, PublishOptions, StreamOptions,
    SubscribeOptions,
};
