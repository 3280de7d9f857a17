use serde::de::{self, Deserialize, Deserializer};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::IngestError;

/// Event Grid schema event, as delivered for IoT Hub telemetry routes. Every
/// attribute besides `data` is optional so a bare `{ "data": ... }` record is
/// accepted too.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventGridEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub data_version: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// CloudEvents 1.0 structured-mode event.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub struct CloudEvent {
    pub specversion: String,
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Clone)]
pub enum Notification {
    EventGrid(EventGridEvent),
    CloudEvent(CloudEvent),
}

impl Notification {
    /// Decodes the raw invocation payload. JSON `null` is no notification at
    /// all; anything unrecognised is a `MalformedPayload`.
    pub fn from_payload(payload: Value) -> Result<Option<Notification>, IngestError> {
        if payload.is_null() {
            return Ok(None);
        }
        serde_json::from_value(payload)
            .map(Some)
            .map_err(|e| IngestError::MalformedPayload(format!("unrecognised notification - {}", e)))
    }

    /// The device message carried by the event, if any. `data: null` counts
    /// as absent.
    pub fn data(&self) -> Option<&Value> {
        let data = match self {
            Notification::EventGrid(event) => event.data.as_ref(),
            Notification::CloudEvent(event) => event.data.as_ref(),
        };
        data.filter(|v| !v.is_null())
    }

    pub fn event_type(&self) -> Option<&str> {
        match self {
            Notification::EventGrid(event) => event.event_type.as_deref(),
            Notification::CloudEvent(event) => Some(&event.event_type),
        }
    }
}

impl<'de> Deserialize<'de> for Notification {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_value: Value = Deserialize::deserialize(deserializer)?;
        debug!("raw_value: {:?}", raw_value);

        // CloudEvents must be checked first: the specversion attribute is the
        // only thing that tells the two schemas apart reliably.
        if raw_value.get("specversion").is_some() {
            return match CloudEvent::deserialize(&raw_value) {
                Ok(event) => {
                    tracing::debug!("cloud event detected");
                    Ok(Notification::CloudEvent(event))
                }
                Err(e) => Err(de::Error::custom(format!("bad cloud event: {e}"))),
            };
        }

        if !raw_value.is_object() {
            return Err(de::Error::custom(format!(
                "unsupported event type: {raw_value}"
            )));
        }

        if let Ok(event) = EventGridEvent::deserialize(&raw_value) {
            tracing::debug!("event grid event detected");
            return Ok(Notification::EventGrid(event));
        }

        Err(de::Error::custom(format!(
            "unsupported event type: {raw_value}"
        )))
    }
}
