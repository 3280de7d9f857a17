use std::str::FromStr;
use std::string::String;
use std::{env, fmt};

pub const DEFAULT_API_VERSION: &str = "2022-05-31";

#[derive(Debug, Clone)]
pub struct Config {
    pub adt_service_url: Option<String>,
    pub api_version: String,
    pub payload_encoding: PayloadEncoding,
    pub read_humidity: bool,
    pub credential_source: CredentialSource,
    pub access_token: Option<String>,
    pub managed_identity_client_id: Option<String>,
}

/// How the device message `body` is carried inside the notification.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum PayloadEncoding {
    /// `body` is a nested JSON object.
    Json,
    /// `body` is a Base64 string wrapping UTF-8 JSON.
    Base64,
}

impl FromStr for PayloadEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "Json" | "JSON" | "json" => Ok(PayloadEncoding::Json),
            "Base64" | "base64" => Ok(PayloadEncoding::Base64),
            other => Err(format!("Invalid or Unsupported payload encoding {}", other)),
        }
    }
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum CredentialSource {
    ManagedIdentity,
    Static,
}

impl FromStr for CredentialSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "ManagedIdentity" => Ok(CredentialSource::ManagedIdentity),
            "Static" => Ok(CredentialSource::Static),
            other => Err(format!("Invalid or Unsupported credential source {}", other)),
        }
    }
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Config {
    /// Reads settings from the environment. A missing `ADT_SERVICE_URL` is not
    /// an error here; only values that are present but unusable are.
    pub fn load_from_env() -> Result<Config, String> {
        let credential_source = env::var("CREDENTIAL_SOURCE")
            .unwrap_or("ManagedIdentity".to_string())
            .parse::<CredentialSource>()?;

        let access_token = env::var("ADT_ACCESS_TOKEN")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if credential_source == CredentialSource::Static && access_token.is_none() {
            return Err("ADT_ACCESS_TOKEN not set - required when CREDENTIAL_SOURCE is Static".to_string());
        }

        let conf = Config {
            adt_service_url: env::var("ADT_SERVICE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            api_version: env::var("ADT_API_VERSION").unwrap_or(DEFAULT_API_VERSION.to_string()),
            payload_encoding: env::var("PAYLOAD_ENCODING")
                .unwrap_or("Base64".to_string())
                .parse::<PayloadEncoding>()?,
            read_humidity: env::var("READ_HUMIDITY")
                .unwrap_or("true".to_string())
                .parse::<bool>()
                .map_err(|e| format!("Error parsing READ_HUMIDITY to bool - {}", e))?,
            credential_source,
            access_token,
            managed_identity_client_id: env::var("MANAGED_IDENTITY_CLIENT_ID").ok(),
        };

        Ok(conf)
    }
}
