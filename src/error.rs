use thiserror::Error;

/// Result type for stream pub/sub operations
pub type Result<T> = std::result::Result<T, StreamBusError>;

/// Errors that can occur in the stream pub/sub client
///
/// Every error is terminal for the call that produced it: the client never
/// retries internally, and callers decide on retry or compensation.
#[derive(Error, Debug)]
pub enum StreamBusError {
    /// Configuration errors, rejected before any broker interaction
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Broker session establishment errors
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Errors deriving a stream-capable context from a session
    #[error("Stream context error: {message}")]
    StreamContext { message: String },

    /// Stream declaration rejected by the broker
    #[error("Stream provision error: {message}")]
    StreamProvision { message: String },

    /// Message encoding errors
    #[error("Encoding error: {message}")]
    Encoding { message: String },

    /// Publish errors, synchronous or at async issue time
    #[error("Publish error: {message}")]
    Publish { message: String },

    /// Aggregate async completion wait exceeded its bound
    #[error("Async publish timeout: {message}")]
    AsyncTimeout { message: String },

    /// Push subscription registered without a handler
    #[error("Invalid handler: {message}")]
    InvalidHandler { message: String },

    /// Subscription registration rejected by the broker
    #[error("Subscribe error: {message}")]
    Subscribe { message: String },
}

impl StreamBusError {
    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new stream context error
    pub fn stream_context(message: impl Into<String>) -> Self {
        Self::StreamContext {
            message: message.into(),
        }
    }

    /// Create a new stream provision error
    pub fn stream_provision(message: impl Into<String>) -> Self {
        Self::StreamProvision {
            message: message.into(),
        }
    }

    /// Create a new encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Create a new publish error
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish {
            message: message.into(),
        }
    }

    /// Create a new async timeout error
    pub fn async_timeout(message: impl Into<String>) -> Self {
        Self::AsyncTimeout {
            message: message.into(),
        }
    }

    /// Create a new invalid handler error
    pub fn invalid_handler(message: impl Into<String>) -> Self {
        Self::InvalidHandler {
            message: message.into(),
        }
    }

    /// Create a new subscribe error
    pub fn subscribe(message: impl Into<String>) -> Self {
        Self::Subscribe {
            message: message.into(),
        }
    }

    /// Check if the error is retryable by re-invoking the failed call
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Configuration { .. } => false,
            Self::Connection { .. } => true,
            Self::StreamContext { .. } => true,
            Self::StreamProvision { .. } => false,
            Self::Encoding { .. } => false,
            Self::Publish { .. } => true,
            Self::AsyncTimeout { .. } => true,
            Self::InvalidHandler { .. } => false,
            Self::Subscribe { .. } => true,
        }
    }

    /// Get the error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Connection { .. } => "connection",
            Self::StreamContext { .. } => "stream_context",
            Self::StreamProvision { .. } => "stream_provision",
            Self::Encoding { .. } => "encoding",
            Self::Publish { .. } => "publish",
            Self::AsyncTimeout { .. } => "async_timeout",
            Self::InvalidHandler { .. } => "invalid_handler",
            Self::Subscribe { .. } => "subscribe",
        }
    }
}

impl From<serde_json::Error> for StreamBusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_configuration_error_creation() {
        let fixture = "stream name must not be empty";
        let actual = StreamBusError::configuration(fixture);

        match actual {
            StreamBusError::Configuration { message } => assert_eq!(message, fixture),
            _ => panic!("Expected Configuration error"),
        }
    }

    #[test]
    fn test_connection_error_creation() {
        let fixture = "broker unreachable";
        let actual = StreamBusError::connection(fixture);

        match actual {
            StreamBusError::Connection { message } => assert_eq!(message, fixture),
            _ => panic!("Expected Connection error"),
        }
    }

    #[test]
    fn test_stream_provision_error_creation() {
        let fixture = "stream already exists with different subjects";
        let actual = StreamBusError::stream_provision(fixture);

        match actual {
            StreamBusError::StreamProvision { message } => assert_eq!(message, fixture),
            _ => panic!("Expected StreamProvision error"),
        }
    }

    #[test]
    fn test_publish_error_creation() {
        let fixture = "broker rejected the message";
        let actual = StreamBusError::publish(fixture);

        match actual {
            StreamBusError::Publish { message } => assert_eq!(message, fixture),
            _ => panic!("Expected Publish error"),
        }
    }

    #[test]
    fn test_async_timeout_error_creation() {
        let fixture = "didn't resolve in time";
        let actual = StreamBusError::async_timeout(fixture);

        match actual {
            StreamBusError::AsyncTimeout { message } => assert_eq!(message, fixture),
            _ => panic!("Expected AsyncTimeout error"),
        }
    }

    #[test]
    fn test_invalid_handler_error_creation() {
        let fixture = "handler can't be unset";
        let actual = StreamBusError::invalid_handler(fixture);

        match actual {
            StreamBusError::InvalidHandler { message } => assert_eq!(message, fixture),
            _ => panic!("Expected InvalidHandler error"),
        }
    }

    #[test]
    fn test_error_retryability() {
        let retryable_errors = vec![
            StreamBusError::connection("test"),
            StreamBusError::stream_context("test"),
            StreamBusError::publish("test"),
            StreamBusError::async_timeout("test"),
            StreamBusError::subscribe("test"),
        ];

        for error in retryable_errors {
            assert!(
                error.is_retryable(),
                "Error should be retryable: {:?}",
                error
            );
        }

        let non_retryable_errors = vec![
            StreamBusError::configuration("test"),
            StreamBusError::stream_provision("test"),
            StreamBusError::encoding("test"),
            StreamBusError::invalid_handler("test"),
        ];

        for error in non_retryable_errors {
            assert!(
                !error.is_retryable(),
                "Error should not be retryable: {:?}",
                error
            );
        }
    }

    #[test]
    fn test_error_categories() {
        let test_cases = vec![
            (StreamBusError::configuration("test"), "configuration"),
            (StreamBusError::connection("test"), "connection"),
            (StreamBusError::stream_context("test"), "stream_context"),
            (StreamBusError::stream_provision("test"), "stream_provision"),
            (StreamBusError::encoding("test"), "encoding"),
            (StreamBusError::publish("test"), "publish"),
            (StreamBusError::async_timeout("test"), "async_timeout"),
            (StreamBusError::invalid_handler("test"), "invalid_handler"),
            (StreamBusError::subscribe("test"), "subscribe"),
        ];

        for (error, expected_category) in test_cases {
            let actual = error.category();
            assert_eq!(actual, expected_category);
        }
    }

    #[test]
    fn test_error_display() {
        let fixture = StreamBusError::async_timeout("didn't resolve in time");
        let actual = format!("{fixture}");
        let expected = "Async publish timeout: didn't resolve in time";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let actual: StreamBusError = json_error.into();

        match actual {
            StreamBusError::Encoding { message } => assert!(!message.is_empty()),
            _ => panic!("Expected Encoding error"),
        }
    }
}
