use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info};

use crate::credentials::{CredentialProvider, DIGITAL_TWINS_RESOURCE};
use crate::error::IngestError;
use crate::patch::PatchDocument;

const JSON_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

// RFC 3986 unreserved characters stay as they are.
const TWIN_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Remote store holding one twin per device.
#[async_trait]
pub trait TwinStore: Send + Sync {
    async fn update(&self, twin_id: &str, document: &PatchDocument) -> Result<(), IngestError>;
}

/// Azure Digital Twins data-plane client.
pub struct DigitalTwinsClient {
    endpoint: String,
    api_version: String,
    http: reqwest::Client,
    credential: Arc<dyn CredentialProvider>,
}

impl DigitalTwinsClient {
    pub fn new(
        endpoint: Option<&str>,
        api_version: &str,
        http: reqwest::Client,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<Self, IngestError> {
        let endpoint = endpoint
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IngestError::ConfigMissing("ADT_SERVICE_URL".to_string()))?;

        Ok(DigitalTwinsClient {
            endpoint: normalize_endpoint(endpoint),
            api_version: api_version.to_string(),
            http,
            credential,
        })
    }

    pub fn twin_url(&self, twin_id: &str) -> String {
        format!(
            "{}/digitaltwins/{}?api-version={}",
            self.endpoint,
            utf8_percent_encode(twin_id, TWIN_ID),
            self.api_version
        )
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

#[async_trait]
impl TwinStore for DigitalTwinsClient {
    async fn update(&self, twin_id: &str, document: &PatchDocument) -> Result<(), IngestError> {
        let token = self.credential.get_token(DIGITAL_TWINS_RESOURCE).await?;
        let uri = self.twin_url(twin_id);
        let body = serde_json::to_vec(document)
            .map_err(|e| IngestError::MalformedPayload(format!("failed to encode patch - {}", e)))?;

        debug!("sending twin update to uri: {:?}", uri);

        let start = Instant::now();
        let response = self
            .http
            .patch(&uri)
            .header(CONTENT_TYPE, JSON_PATCH_CONTENT_TYPE)
            .header(AUTHORIZATION, format!("Bearer {}", token.token))
            .body(body)
            .send()
            .await?;

        let status = response.status();
        info!(
            status = %status,
            twin_id,
            operations = document.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "twin update request completed"
        );

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read response body: {}>", e));
            return Err(IngestError::RemoteCallFailure(format!(
                "twin {} update returned {} - {}",
                twin_id, status, text
            )));
        }

        Ok(())
    }
}
