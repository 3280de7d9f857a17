use std::sync::Arc;

use crate::config::{Config, CredentialSource};
use crate::credentials::{CredentialProvider, ManagedIdentityCredential, StaticTokenCredential};
use crate::error::IngestError;

/// Process-wide state shared by every invocation. Built once in `main` and
/// passed by reference; the pooled HTTP client is safe to reuse concurrently.
#[derive(Clone)]
pub struct Clients {
    pub http: reqwest::Client,
    pub credential: Arc<dyn CredentialProvider>,
}

impl Clients {
    pub fn new(http: reqwest::Client, credential: Arc<dyn CredentialProvider>) -> Self {
        Clients { http, credential }
    }

    pub fn from_config(config: &Config) -> Result<Self, IngestError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let credential: Arc<dyn CredentialProvider> = match config.credential_source {
            CredentialSource::ManagedIdentity => Arc::new(ManagedIdentityCredential::from_env(
                http.clone(),
                config.managed_identity_client_id.clone(),
            )),
            CredentialSource::Static => {
                let token = config
                    .access_token
                    .clone()
                    .ok_or_else(|| IngestError::ConfigMissing("ADT_ACCESS_TOKEN".to_string()))?;
                Arc::new(StaticTokenCredential::new(token))
            }
        };

        Ok(Clients::new(http, credential))
    }
}
