// Default Real-variant transport: JSON over HTTP
//
// POSTs `params` as JSON to `<endpoint>/<request>` and decodes the JSON
// response. Providers with a different wire protocol register their own
// transport factory on the service type instead.

use crate::error::{BuildError, ServiceError, ServiceResult};
use crate::registry::symbol::Config;
use crate::units::Transport;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

/// Config key holding the base URL
pub const ENDPOINT_KEY: &str = "endpoint";

/// Config keys checked, in order, for a bearer token
pub const TOKEN_KEYS: [&str; 2] = ["token", "api_key"];

pub struct HttpTransport {
    client: Client,
    endpoint: Option<String>,
    token: Option<String>,
}

impl HttpTransport {
    pub fn new(endpoint: Option<String>, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
            token,
        }
    }

    /// Build from a service's merged configuration
    ///
    /// `endpoint` is optional: without it the transport is created, but
    /// every request fails with a transport error.
    ///
    /// # Errors
    /// - `endpoint` or a token key is present but not a string
    pub fn from_config(config: &Config) -> Result<Self, BuildError> {
        let endpoint = string_value(config, ENDPOINT_KEY)?;

        let mut token = None;
        for key in TOKEN_KEYS {
            if let Some(value) = string_value(config, key)? {
                token = Some(value);
                break;
            }
        }

        Ok(Self::new(endpoint, token))
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    fn url_for(&self, request: &str) -> ServiceResult<String> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or_else(|| ServiceError::Transport(format!("No endpoint configured for request '{}'", request)))?;
        Ok(format!("{}/{}", endpoint, request))
    }
}

fn string_value(config: &Config, key: &str) -> Result<Option<String>, BuildError> {
    match config.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(BuildError::Backend(format!(
            "Config key '{}' must be a string, got {}",
            key, other
        ))),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &str, params: Value) -> ServiceResult<Value> {
        let url = self.url_for(request)?;
        tracing::debug!("POST {}", url);

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&params);
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ServiceError::NotFound(format!("{}: {}", request, error_text)));
            }
            return Err(ServiceError::Transport(format!("{} returned {}: {}", url, status, error_text)));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}
