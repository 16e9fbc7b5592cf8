use crate::{
    ConnectOptions, PublishOptions, Result, StreamBusError, StreamOptions, SubscribeOptions,
};
use std::time::Duration;

/// Default number of redundant fan-out publish calls per logical message
pub const DEFAULT_WORKERS_COUNT: usize = 100;

/// Default bound on the aggregate async completion wait
pub const DEFAULT_ASYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for provisioning a connection to one durable stream
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Broker address
    pub addr: String,
    /// Name of the durable stream
    pub stream_name: String,
    /// Subject patterns the stream covers
    pub subjects: Vec<String>,
    /// Broker-specific session options
    pub connect_options: ConnectOptions,
    /// Broker-specific stream context options
    pub stream_options: StreamOptions,
}

impl ConnectionConfig {
    /// Create a new connection configuration
    pub fn new(
        addr: impl Into<String>,
        stream_name: impl Into<String>,
        subjects: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            addr: addr.into(),
            stream_name: stream_name.into(),
            subjects: subjects.into_iter().map(Into::into).collect(),
            connect_options: ConnectOptions::default(),
            stream_options: StreamOptions::default(),
        }
    }

    /// Set the session options
    pub fn with_connect_options(mut self, options: ConnectOptions) -> Self {
        self.connect_options = options;
        self
    }

    /// Set the stream context options
    pub fn with_stream_options(mut self, options: StreamOptions) -> Self {
        self.stream_options = options;
        self
    }

    /// Validate the configuration before any broker interaction
    pub fn validate(&self) -> Result<()> {
        if self.addr.is_empty() {
            return Err(StreamBusError::configuration(
                "broker address must not be empty",
            ));
        }

        if self.stream_name.is_empty() {
            return Err(StreamBusError::configuration(
                "stream name must not be empty",
            ));
        }

        if self.subjects.is_empty() {
            return Err(StreamBusError::configuration(
                "at least one subject pattern is required",
            ));
        }

        if self.subjects.iter().any(String::is_empty) {
            return Err(StreamBusError::configuration(
                "subject patterns must not be empty",
            ));
        }

        Ok(())
    }
}

/// Configuration for a publisher
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherConfig {
    /// Connection and stream provisioning configuration
    pub connection: ConnectionConfig,
    /// Number of redundant fan-out publish calls per logical message
    pub workers_count: usize,
    /// Bound on the aggregate async completion wait per message
    pub async_timeout: Duration,
    /// Broker-specific per-call publish options
    pub publish_options: PublishOptions,
}

impl PublisherConfig {
    /// Create a publisher configuration with documented defaults
    pub fn new(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            workers_count: DEFAULT_WORKERS_COUNT,
            async_timeout: DEFAULT_ASYNC_TIMEOUT,
            publish_options: PublishOptions::default(),
        }
    }

    /// Set the fan-out worker count
    pub fn with_workers_count(mut self, workers_count: usize) -> Self {
        self.workers_count = workers_count;
        self
    }

    /// Set the async completion timeout
    pub fn with_async_timeout(mut self, async_timeout: Duration) -> Self {
        self.async_timeout = async_timeout;
        self
    }

    /// Set the per-call publish options
    pub fn with_publish_options(mut self, options: PublishOptions) -> Self {
        self.publish_options = options;
        self
    }

    /// Validate the publish settings only
    ///
    /// Used when the stream handle is supplied externally and the connection
    /// part of the configuration is not consulted.
    pub fn validate_settings(&self) -> Result<()> {
        if self.workers_count == 0 {
            return Err(StreamBusError::configuration(
                "workers count must be greater than zero",
            ));
        }

        if self.async_timeout.is_zero() {
            return Err(StreamBusError::configuration(
                "async timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Validate the full configuration
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.validate_settings()
    }
}

/// Configuration for a subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberConfig {
    /// Connection and stream provisioning configuration
    pub connection: ConnectionConfig,
    /// Broker-specific subscription options
    pub subscribe_options: SubscribeOptions,
}

impl SubscriberConfig {
    /// Create a subscriber configuration
    pub fn new(connection: ConnectionConfig) -> Self {
        Self {
            connection,
            subscribe_options: SubscribeOptions::default(),
        }
    }

    /// Set the subscription options
    pub fn with_subscribe_options(mut self, options: SubscribeOptions) -> Self {
        self.subscribe_options = options;
        self
    }

    /// Validate the full configuration
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn connection_fixture() -> ConnectionConfig {
        ConnectionConfig::new("nats://localhost:4222", "ORDERS", ["ORDERS.*"])
    }

    #[test]
    fn test_connection_config_creation() {
        let actual = connection_fixture();

        assert_eq!(actual.addr, "nats://localhost:4222");
        assert_eq!(actual.stream_name, "ORDERS");
        assert_eq!(actual.subjects, vec!["ORDERS.*".to_string()]);
        assert_eq!(actual.connect_options, ConnectOptions::default());
        assert_eq!(actual.stream_options, StreamOptions::default());
        assert!(actual.validate().is_ok());
    }

    #[test]
    fn test_connection_config_builders() {
        let actual = connection_fixture()
            .with_connect_options(ConnectOptions::new().with_name("order-service"))
            .with_stream_options(StreamOptions::new().with_domain("hub"));

        assert_eq!(
            actual.connect_options.name,
            Some("order-service".to_string())
        );
        assert_eq!(actual.stream_options.domain, Some("hub".to_string()));
    }

    #[test]
    fn test_connection_config_rejects_empty_addr() {
        let fixture = ConnectionConfig::new("", "ORDERS", ["ORDERS.*"]);

        let actual = fixture.validate();
        assert!(matches!(
            actual,
            Err(StreamBusError::Configuration { .. })
        ));
    }

    #[test]
    fn test_connection_config_rejects_empty_stream_name() {
        let fixture = ConnectionConfig::new("nats://localhost:4222", "", ["ORDERS.*"]);

        let actual = fixture.validate();
        assert!(matches!(
            actual,
            Err(StreamBusError::Configuration { .. })
        ));
    }

    #[test]
    fn test_connection_config_rejects_empty_subjects() {
        let fixture =
            ConnectionConfig::new("nats://localhost:4222", "ORDERS", Vec::<String>::new());

        let actual = fixture.validate();
        assert!(matches!(
            actual,
            Err(StreamBusError::Configuration { .. })
        ));
    }

    #[test]
    fn test_connection_config_rejects_blank_subject() {
        let fixture = ConnectionConfig::new("nats://localhost:4222", "ORDERS", ["ORDERS.*", ""]);

        let actual = fixture.validate();
        assert!(matches!(
            actual,
            Err(StreamBusError::Configuration { .. })
        ));
    }

    #[test]
    fn test_publisher_config_defaults() {
        let actual = PublisherConfig::new(connection_fixture());

        assert_eq!(actual.workers_count, DEFAULT_WORKERS_COUNT);
        assert_eq!(actual.async_timeout, DEFAULT_ASYNC_TIMEOUT);
        assert_eq!(actual.publish_options, PublishOptions::default());
        assert!(actual.validate().is_ok());
    }

    #[test]
    fn test_publisher_config_builders() {
        let actual = PublisherConfig::new(connection_fixture())
            .with_workers_count(3)
            .with_async_timeout(Duration::from_millis(50))
            .with_publish_options(PublishOptions::new().with_msg_id("dedupe-1"));

        assert_eq!(actual.workers_count, 3);
        assert_eq!(actual.async_timeout, Duration::from_millis(50));
        assert_eq!(
            actual.publish_options.msg_id,
            Some("dedupe-1".to_string())
        );
    }

    #[test]
    fn test_publisher_config_rejects_zero_workers() {
        let fixture = PublisherConfig::new(connection_fixture()).with_workers_count(0);

        let actual = fixture.validate();
        assert!(matches!(
            actual,
            Err(StreamBusError::Configuration { .. })
        ));
    }

    #[test]
    fn test_publisher_config_rejects_zero_timeout() {
        let fixture =
            PublisherConfig::new(connection_fixture()).with_async_timeout(Duration::ZERO);

        let actual = fixture.validate();
        assert!(matches!(
            actual,
            Err(StreamBusError::Configuration { .. })
        ));
    }

    #[test]
    fn test_publisher_config_validates_connection() {
        let fixture = PublisherConfig::new(ConnectionConfig::new("", "ORDERS", ["ORDERS.*"]));

        let actual = fixture.validate();
        assert!(matches!(
            actual,
            Err(StreamBusError::Configuration { .. })
        ));
    }

    #[test]
    fn test_subscriber_config_creation() {
        let actual = SubscriberConfig::new(connection_fixture())
            .with_subscribe_options(SubscribeOptions::new().with_durable_name("order-worker"));

        assert_eq!(
            actual.subscribe_options.durable_name,
            Some("order-worker".to_string())
        );
        assert!(actual.validate().is_ok());
    }
}
