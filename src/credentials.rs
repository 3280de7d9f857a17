use std::env;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::IngestError;

/// Resource identifier the Digital Twins data plane expects tokens for.
pub const DIGITAL_TWINS_RESOURCE: &str = "https://digitaltwins.azure.net";

const IMDS_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";

#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    /// Unix timestamp, when the issuer reports one.
    pub expires_on: Option<u64>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens for the twin store.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_token(&self, resource: &str) -> Result<AccessToken, IngestError>;
}

/// A token provisioned out of band, e.g. `az account get-access-token` for
/// local runs.
pub struct StaticTokenCredential {
    token: String,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        StaticTokenCredential {
            token: token.into(),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenCredential {
    async fn get_token(&self, _: &str) -> Result<AccessToken, IngestError> {
        Ok(AccessToken {
            token: self.token.clone(),
            expires_on: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum IdentityEndpoint {
    /// App Service / Functions hosting exposes a local endpoint guarded by a
    /// per-process secret header.
    AppService { endpoint: String, secret: String },
    Imds { endpoint: String },
}

/// Platform-issued identity; no secret is stored in the function.
pub struct ManagedIdentityCredential {
    http: reqwest::Client,
    endpoint: IdentityEndpoint,
    client_id: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_on: Option<Value>,
}

impl ManagedIdentityCredential {
    /// Picks the App Service endpoint when `IDENTITY_ENDPOINT` and
    /// `IDENTITY_HEADER` are both set, the instance metadata service otherwise.
    pub fn from_env(http: reqwest::Client, client_id: Option<String>) -> Self {
        let endpoint = match (env::var("IDENTITY_ENDPOINT"), env::var("IDENTITY_HEADER")) {
            (Ok(endpoint), Ok(secret)) => IdentityEndpoint::AppService { endpoint, secret },
            _ => IdentityEndpoint::Imds {
                endpoint: IMDS_ENDPOINT.to_string(),
            },
        };

        ManagedIdentityCredential {
            http,
            endpoint,
            client_id,
        }
    }

    pub fn with_imds_endpoint(
        http: reqwest::Client,
        endpoint: impl Into<String>,
        client_id: Option<String>,
    ) -> Self {
        ManagedIdentityCredential {
            http,
            endpoint: IdentityEndpoint::Imds {
                endpoint: endpoint.into(),
            },
            client_id,
        }
    }

    fn request(&self, resource: &str) -> reqwest::RequestBuilder {
        let mut query: Vec<(&str, &str)> = vec![("resource", resource)];
        if let Some(client_id) = &self.client_id {
            query.push(("client_id", client_id.as_str()));
        }

        match &self.endpoint {
            IdentityEndpoint::AppService { endpoint, secret } => {
                query.push(("api-version", APP_SERVICE_API_VERSION));
                self.http
                    .get(endpoint)
                    .header("X-IDENTITY-HEADER", secret)
                    .query(&query)
            }
            IdentityEndpoint::Imds { endpoint } => {
                query.push(("api-version", IMDS_API_VERSION));
                self.http.get(endpoint).header("Metadata", "true").query(&query)
            }
        }
    }
}

#[async_trait]
impl CredentialProvider for ManagedIdentityCredential {
    async fn get_token(&self, resource: &str) -> Result<AccessToken, IngestError> {
        debug!(endpoint = ?self.endpoint_url(), "requesting managed identity token");

        let response = self.request(resource).send().await.map_err(|e| {
            IngestError::RemoteCallFailure(format!("managed identity endpoint unreachable - {}", e))
        })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(IngestError::RemoteCallFailure(format!(
                "managed identity endpoint returned {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            IngestError::RemoteCallFailure(format!("unexpected managed identity response - {}", e))
        })?;

        Ok(AccessToken {
            token: token.access_token,
            expires_on: token.expires_on.as_ref().and_then(parse_expires_on),
        })
    }
}

impl ManagedIdentityCredential {
    fn endpoint_url(&self) -> &str {
        match &self.endpoint {
            IdentityEndpoint::AppService { endpoint, .. } => endpoint,
            IdentityEndpoint::Imds { endpoint } => endpoint,
        }
    }
}

// IMDS reports expires_on as a string of epoch seconds, App Service as either.
fn parse_expires_on(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
