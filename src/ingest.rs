use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::clients::Clients;
use crate::config::{Config, PayloadEncoding};
use crate::error::IngestError;
use crate::events::Notification;
use crate::message::DeviceMessage;
use crate::patch::PatchDocument;
use crate::twins::{DigitalTwinsClient, TwinStore};

#[derive(Debug, Clone, Copy)]
pub struct IngestOptions {
    pub payload_encoding: PayloadEncoding,
    pub read_humidity: bool,
}

impl From<&Config> for IngestOptions {
    fn from(config: &Config) -> Self {
        IngestOptions {
            payload_encoding: config.payload_encoding,
            read_humidity: config.read_humidity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing to do: no envelope or no data in it.
    Skipped,
    Updated {
        device_id: String,
        document: PatchDocument,
    },
}

/// Turns one notification into at most one twin update.
pub async fn ingest(
    store: &dyn TwinStore,
    options: &IngestOptions,
    notification: Option<&Notification>,
) -> Result<Outcome, IngestError> {
    let Some(data) = notification.and_then(Notification::data) else {
        debug!("no event data, skipping");
        return Ok(Outcome::Skipped);
    };
    debug!("event data: {}", data);

    let message = DeviceMessage::from_value(data)?;
    if !message.properties.is_empty() {
        debug!("application properties: {:?}", message.properties);
    }

    let reading = message.sensor_reading(options.payload_encoding, options.read_humidity)?;
    let device_id = message.device_id()?;

    info!(
        "Device:{} Temperature is:{} and Humidity is:{:?}",
        device_id, reading.temperature, reading.humidity
    );

    let document = PatchDocument::from_reading(&reading, options.read_humidity);
    debug!("patch document: {}", document);

    store.update(device_id, &document).await?;

    Ok(Outcome::Updated {
        device_id: device_id.to_string(),
        document,
    })
}

/// Invocation adapter. Every failure, including a payload that is not a
/// notification at all, is logged and dropped here, so a failed update is
/// lost until the device publishes again.
pub async fn handler(
    clients: &Clients,
    config: &Config,
    evt: LambdaEvent<Value>,
) -> Result<(), Error> {
    info!("Handling lambda invocation");

    let notification = match Notification::from_payload(evt.payload) {
        Ok(Some(notification)) if notification.data().is_some() => notification,
        Ok(_) => {
            debug!("empty notification, nothing to ingest");
            return Ok(());
        }
        Err(e) => {
            error!(kind = %e.kind(), "Error in ingest function: {}", e);
            return Ok(());
        }
    };
    debug!("notification event type: {:?}", notification.event_type());

    match run(clients, config, &notification).await {
        Ok(Outcome::Updated { device_id, document }) => {
            info!("updated twin {} with {} operations", device_id, document.len());
        }
        Ok(Outcome::Skipped) => {}
        Err(e) => {
            error!(kind = %e.kind(), "Error in ingest function: {}", e);
        }
    }

    Ok(())
}

async fn run(
    clients: &Clients,
    config: &Config,
    notification: &Notification,
) -> Result<Outcome, IngestError> {
    let store = DigitalTwinsClient::new(
        config.adt_service_url.as_deref(),
        &config.api_version,
        clients.http.clone(),
        clients.credential.clone(),
    )?;
    info!("ADT service client connection created.");

    ingest(&store, &IngestOptions::from(config), Some(notification)).await
}
