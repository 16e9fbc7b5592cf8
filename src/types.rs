use bytes::Bytes;
use chrono::{DateTime, Utc};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for messages
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Create a new message ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for MessageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<MessageId> for Uuid {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

/// Metadata attached to every outgoing message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Setters)]
#[setters(strip_option, into)]
pub struct MessageMetadata {
    /// Message ID
    pub id: MessageId,
    /// Destination subject
    pub subject: String,
    /// Message creation timestamp
    pub created_at: DateTime<Utc>,
    /// Custom headers
    pub headers: HashMap<String, String>,
    /// Correlation ID for request tracing
    pub correlation_id: Option<String>,
    /// Message source
    pub source: Option<String>,
    /// Message content type
    pub content_type: String,
    /// Message encoding
    pub encoding: String,
}

impl MessageMetadata {
    /// Create new message metadata
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            subject: subject.into(),
            created_at: Utc::now(),
            headers: HashMap::new(),
            correlation_id: None,
            source: None,
            content_type: "application/json".to_string(),
            encoding: "utf-8".to_string(),
        }
    }

    /// Add a header
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// Get a header value
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }

    /// Remove a header
    pub fn remove_header(&mut self, key: &str) -> Option<String> {
        self.headers.remove(key)
    }
}

/// A frame delivered by the broker to a subscription
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Subject the frame was published on
    pub subject: String,
    /// Encoded payload bytes
    pub payload: Bytes,
}

impl InboundMessage {
    /// Create a new inbound message
    pub fn new(subject: impl Into<String>, payload: Bytes) -> Self {
        Self {
            subject: subject.into(),
            payload,
        }
    }
}

/// Broker-specific options applied when opening a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectOptions {
    /// Client name reported to the broker
    pub name: Option<String>,
    /// Authentication token
    pub auth_token: Option<String>,
    /// Dial timeout for session establishment
    pub connect_timeout: Option<Duration>,
}

impl ConnectOptions {
    /// Create empty connect options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the authentication token
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Set the dial timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// Broker-specific options applied when deriving a stream context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOptions {
    /// Broker domain the stream lives in
    pub domain: Option<String>,
    /// Maximum number of unacknowledged async publishes the context accepts
    pub max_pending_async: Option<usize>,
}

impl StreamOptions {
    /// Create empty stream options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the broker domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the async publish pending limit
    pub fn with_max_pending_async(mut self, max: usize) -> Self {
        self.max_pending_async = Some(max);
        self
    }
}

/// Broker-specific options applied to each publish call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishOptions {
    /// Deduplication ID forwarded to the broker
    pub msg_id: Option<String>,
    /// Expected stream name, rejected if the subject maps elsewhere
    pub expected_stream: Option<String>,
}

impl PublishOptions {
    /// Create empty publish options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deduplication ID
    pub fn with_msg_id(mut self, msg_id: impl Into<String>) -> Self {
        self.msg_id = Some(msg_id.into());
        self
    }

    /// Set the expected stream name
    pub fn with_expected_stream(mut self, stream: impl Into<String>) -> Self {
        self.expected_stream = Some(stream.into());
        self
    }
}

/// Broker-specific options applied when registering a subscription
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscribeOptions {
    /// Durable consumer name
    pub durable_name: Option<String>,
    /// Queue group for load-balanced delivery
    pub queue_group: Option<String>,
    /// Deliver all retained messages instead of only new ones
    pub deliver_all: bool,
}

impl SubscribeOptions {
    /// Create empty subscribe options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the durable consumer name
    pub fn with_durable_name(mut self, name: impl Into<String>) -> Self {
        self.durable_name = Some(name.into());
        self
    }

    /// Set the queue group
    pub fn with_queue_group(mut self, group: impl Into<String>) -> Self {
        self.queue_group = Some(group.into());
        self
    }

    /// Request delivery of all retained messages
    pub fn with_deliver_all(mut self) -> Self {
        self.deliver_all = true;
        self
    }
}
