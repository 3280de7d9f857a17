use std::fmt;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Failures an ingest invocation can end with. None of them reach the
/// runtime; the invocation adapter logs them and returns normally.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("configuration missing: {0}")]
    ConfigMissing(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("remote call failed: {0}")]
    RemoteCallFailure(String),
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ErrorKind {
    ConfigMissing,
    MalformedPayload,
    MissingField,
    RemoteCallFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::ConfigMissing(_) => ErrorKind::ConfigMissing,
            IngestError::MalformedPayload(_) => ErrorKind::MalformedPayload,
            IngestError::MissingField(_) => ErrorKind::MissingField,
            IngestError::RemoteCallFailure(_) => ErrorKind::RemoteCallFailure,
        }
    }
}

impl From<base64::DecodeError> for IngestError {
    fn from(e: base64::DecodeError) -> Self {
        IngestError::MalformedPayload(format!("invalid base64 body - {}", e))
    }
}

impl From<FromUtf8Error> for IngestError {
    fn from(e: FromUtf8Error) -> Self {
        IngestError::MalformedPayload(format!("body is not valid UTF-8 - {}", e))
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(e: serde_json::Error) -> Self {
        IngestError::MalformedPayload(format!("invalid JSON - {}", e))
    }
}

impl From<reqwest::Error> for IngestError {
    fn from(e: reqwest::Error) -> Self {
        IngestError::RemoteCallFailure(e.to_string())
    }
}
