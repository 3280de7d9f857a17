use base64::prelude::*;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::PayloadEncoding;
use crate::error::IngestError;

pub const DEVICE_ID_PROPERTY: &str = "iothub-connection-device-id";

/// IoT Hub telemetry message as routed into the notification `data` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMessage {
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub system_properties: Map<String, Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Readings taken from one telemetry message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: f64,
    pub humidity: Option<f64>,
}

// Humidity stays untyped until it is asked for, so a bad value cannot fail a
// temperature-only update.
#[derive(Debug, Deserialize)]
struct SensorPayload {
    #[serde(rename = "Temperature", default)]
    temperature: Option<f64>,
    #[serde(rename = "Humidity", default)]
    humidity: Option<Value>,
}

impl DeviceMessage {
    pub fn from_value(data: &Value) -> Result<DeviceMessage, IngestError> {
        if !data.is_object() {
            return Err(IngestError::MalformedPayload(format!(
                "device message is not an object: {data}"
            )));
        }
        Ok(DeviceMessage::deserialize(data)?)
    }

    pub fn device_id(&self) -> Result<&str, IngestError> {
        self.system_properties
            .get(DEVICE_ID_PROPERTY)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| IngestError::MissingField(format!("systemProperties.{DEVICE_ID_PROPERTY}")))
    }

    pub fn sensor_reading(
        &self,
        encoding: PayloadEncoding,
        read_humidity: bool,
    ) -> Result<SensorReading, IngestError> {
        let payload = match encoding {
            PayloadEncoding::Json => self.nested_payload()?,
            PayloadEncoding::Base64 => self.decoded_payload()?,
        };

        let temperature = payload
            .temperature
            .ok_or_else(|| IngestError::MissingField("Temperature".to_string()))?;

        let humidity = match payload.humidity {
            Some(value) if read_humidity && !value.is_null() => Some(value.as_f64().ok_or_else(|| {
                IngestError::MalformedPayload(format!("Humidity is not a number: {}", value))
            })?),
            _ => None,
        };

        Ok(SensorReading {
            temperature,
            humidity,
        })
    }

    fn nested_payload(&self) -> Result<SensorPayload, IngestError> {
        if !self.body.is_object() {
            return Err(IngestError::MalformedPayload(format!(
                "expected a JSON object body, got: {}",
                self.body
            )));
        }
        Ok(SensorPayload::deserialize(&self.body)?)
    }

    fn decoded_payload(&self) -> Result<SensorPayload, IngestError> {
        let encoded = self.body.as_str().ok_or_else(|| {
            IngestError::MalformedPayload(format!("expected a base64 string body, got: {}", self.body))
        })?;

        let bytes = BASE64_STANDARD.decode(encoded.trim())?;
        let json = String::from_utf8(bytes)?;
        debug!("decoded payload: {}", json);

        Ok(serde_json::from_str::<SensorPayload>(&json)?)
    }
}
