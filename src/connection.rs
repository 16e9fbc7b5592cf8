use crate::{BrokerConnector, ConnectionConfig, Result, StreamBusError, StreamContext};
use std::sync::Arc;
use tracing::info;

/// Provision a ready stream handle for one durable stream
///
/// Opens a broker session, derives a stream-capable context, and declares the
/// configured stream (create-if-absent, no-op-if-matching). Every failure is
/// terminal for this call; no retry is performed internally. Repeated
/// provisioning with the same name and subjects is idempotent per broker
/// semantics.
pub async fn provision(
    config: &ConnectionConfig,
    connector: &dyn BrokerConnector,
) -> Result<Arc<dyn StreamContext>> {
    config.validate()?;

    let session = connector
        .connect(&config.addr, &config.connect_options)
        .await
        .map_err(|e| {
            StreamBusError::connection(format!("can't connect to broker at '{}': {e}", config.addr))
        })?;

    let context = session
        .stream_context(&config.stream_options)
        .await
        .map_err(|e| {
            StreamBusError::stream_context(format!("can't derive stream context: {e}"))
        })?;

    context
        .declare_stream(&config.stream_name, &config.subjects)
        .await
        .map_err(|e| {
            StreamBusError::stream_provision(format!(
                "can't provision stream '{}': {e}",
                config.stream_name
            ))
        })?;

    info!(
        stream = %config.stream_name,
        subjects = ?config.subjects,
        "provisioned durable stream"
    );
    Ok(context)
}
