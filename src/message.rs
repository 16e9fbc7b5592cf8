use crate::{MessageId, MessageMetadata, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::HashMap;

/// A logical message destined for one subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message metadata
    pub metadata: MessageMetadata,
    /// Message payload
    pub payload: Json,
}

impl Message {
    /// Create a new message without a subject
    pub fn new(payload: Json) -> Self {
        Self {
            metadata: MessageMetadata::new(""),
            payload,
        }
    }

    /// Create a new message bound to a subject
    pub fn new_with_subject(subject: impl Into<String>, payload: Json) -> Self {
        Self {
            metadata: MessageMetadata::new(subject),
            payload,
        }
    }

    /// Create a new message with explicit metadata
    pub fn new_with_metadata(metadata: MessageMetadata, payload: Json) -> Self {
        Self { metadata, payload }
    }

    /// Get the message ID
    pub fn id(&self) -> &MessageId {
        &self.metadata.id
    }

    /// Get the subject
    pub fn subject(&self) -> &str {
        &self.metadata.subject
    }

    /// Set the subject
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.metadata.subject = subject.into();
    }

    /// Get the payload
    pub fn payload(&self) -> &Json {
        &self.payload
    }

    /// Get creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.metadata.created_at
    }

    /// Add a header
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.add_header(key, value);
    }

    /// Get a header value
    pub fn get_header(&self, key: &str) -> Option<&String> {
        self.metadata.get_header(key)
    }

    /// Get all headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.metadata.headers
    }

    /// Get correlation ID
    pub fn correlation_id(&self) -> Option<&String> {
        self.metadata.correlation_id.as_ref()
    }

    /// Get source
    pub fn source(&self) -> Option<&String> {
        self.metadata.source.as_ref()
    }

    /// Serialize the message envelope to bytes
    pub fn to_bytes(&self) -> Result<Bytes> {
        let buf = serde_json::to_vec(self)?;
        Ok(Bytes::from(buf))
    }

    /// Deserialize a message envelope from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(Into::into)
    }
}

/// Encode capability turning a message into a wire frame
///
/// Injected into the publisher so the envelope format can be swapped without
/// touching the publish protocol.
pub trait Encoder: Send + Sync {
    /// Encode a message to bytes
    fn encode(&self, message: &Message) -> Result<Bytes>;
}

/// Default encoder producing the JSON envelope
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder;

impl JsonEncoder {
    /// Create a new JSON encoder
    pub fn new() -> Self {
        Self
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, message: &Message) -> Result<Bytes> {
        message.to_bytes()
    }
}

/// Builder for creating messages
#[derive(Debug, Default)]
pub struct MessageBuilder {
    subject: Option<String>,
    payload: Option<Json>,
    headers: HashMap<String, String>,
    correlation_id: Option<String>,
    source: Option<String>,
    content_type: Option<String>,
    encoding: Option<String>,
}

impl MessageBuilder {
    /// Create a new message builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the payload
    pub fn payload(mut self, payload: Json) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the correlation ID
    pub fn correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Set the source
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the content type
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the encoding
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Build the message
    pub fn build(self) -> Message {
        let mut metadata = MessageMetadata::new(self.subject.unwrap_or_default());

        metadata.headers = self.headers;
        metadata.correlation_id = self.correlation_id;
        metadata.source = self.source;

        if let Some(content_type) = self.content_type {
            metadata.content_type = content_type;
        }

        if let Some(encoding) = self.encoding {
            metadata.encoding = encoding;
        }

        Message::new_with_metadata(metadata, self.payload.unwrap_or(Json::Null))
    }
}
