//! HTTP client for the Practicum homework statuses API.
//!
//! The client issues a single GET per poll cycle and hands back the decoded
//! JSON body untouched; shape checks live in [`crate::response`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::config::Config;
use crate::error::{HwbotError, RequestError, Result};

/// Source of homework status updates.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetches every status change since `from_date` (seconds since epoch).
    async fn fetch_updates(&self, from_date: i64) -> Result<Value>;
}

/// Practicum API client.
#[derive(Clone)]
pub struct PracticumClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl PracticumClient {
    /// Builds a client with the configured endpoint, token and request timeout.
    ///
    /// # Errors
    ///
    /// Returns `HwbotError::ConfigValidationError` if the HTTP client cannot
    /// be constructed (e.g. the TLS backend fails to initialize).
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.settings.request_timeout())
            .build()
            .map_err(|e| {
                HwbotError::config_validation(
                    format!("cannot build HTTP client: {e}"),
                    "Check the TLS configuration of this host",
                )
            })?;

        Ok(Self {
            client,
            endpoint: config.settings.endpoint.clone(),
            token: config.credentials.practicum_token.clone(),
        })
    }

    /// The endpoint this client queries.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn fetch_updates(&self, from_date: i64) -> Result<Value> {
        tracing::debug!(endpoint = %self.endpoint, from_date, "Requesting homework statuses");

        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| RequestError::Unreachable {
                endpoint: self.endpoint.clone(),
                from_date,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RequestError::UnexpectedStatus {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown status")
                    .to_string(),
            }
            .into());
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| RequestError::InvalidBody {
                message: e.to_string(),
            })?;

        tracing::debug!("Homework statuses received");
        Ok(body)
    }
}
