use std::fmt;

use serde::Serialize;

use crate::message::SensorReading;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Replace,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: String,
    pub value: f64,
}

/// Ordered JSON Patch document; serializes as a bare array of operations.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct PatchDocument {
    operations: Vec<PatchOperation>,
}

impl PatchDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_replace(&mut self, path: impl Into<String>, value: f64) {
        self.operations.push(PatchOperation {
            op: PatchOp::Replace,
            path: path.into(),
            value,
        });
    }

    /// `/Temperature` always, `/Humidity` only when asked for and present.
    pub fn from_reading(reading: &SensorReading, include_humidity: bool) -> Self {
        let mut document = Self::new();
        document.append_replace("/Temperature", reading.temperature);
        if include_humidity {
            if let Some(humidity) = reading.humidity {
                document.append_replace("/Humidity", humidity);
            }
        }
        document
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl fmt::Display for PatchDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}
