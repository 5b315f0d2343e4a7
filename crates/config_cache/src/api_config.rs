//! HTTP configuration provider
//!
//! `GET {host}{path}` with the subscription key header. 4xx and 5xx answers are
//! reported as status failures; connection and body failures as transport or
//! decode failures. With backoff enabled, 5xx and network failures are retried
//! until the elapsed-time budget runs out.

use std::time::Duration;

use contracts::{BackoffSettings, CachePayload, CacheSettings, ConfigFetchError, ConfigProvider};
use tracing::{debug, instrument, warn};

use crate::backoff::ExponentialBackoff;
use crate::error::CacheError;

/// API gateway subscription key header
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration provider over HTTP
#[derive(Debug, Clone)]
pub struct ApiConfigClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    backoff: BackoffSettings,
}

impl ApiConfigClient {
    pub fn new(settings: &CacheSettings) -> Result<Self, CacheError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| CacheError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: settings.endpoint(),
            api_key: settings.api_key.clone(),
            backoff: settings.backoff.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One request, no retry
    async fn execute(&self) -> Result<CachePayload, ConfigFetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ConfigFetchError::transport(&self.endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(
                ConfigFetchError::from_status(status.as_u16(), &self.endpoint).unwrap_or_else(
                    || ConfigFetchError::transport(&self.endpoint, format!("unexpected status {status}")),
                ),
            );
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ConfigFetchError::transport(&self.endpoint, e.to_string()))?;

        serde_json::from_slice::<CachePayload>(&body)
            .map_err(|e| ConfigFetchError::decode(&self.endpoint, e.to_string()))
    }
}

fn is_retryable(err: &ConfigFetchError) -> bool {
    matches!(
        err,
        ConfigFetchError::Server { .. } | ConfigFetchError::Transport { .. }
    )
}

impl ConfigProvider for ApiConfigClient {
    fn name(&self) -> &str {
        "api-config"
    }

    #[instrument(name = "config_provider_fetch", skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch(&self) -> Result<CachePayload, ConfigFetchError> {
        if !self.backoff.enabled {
            return self.execute().await;
        }

        let mut backoff = ExponentialBackoff::from_settings(&self.backoff);
        let mut attempt = 1u32;
        loop {
            match self.execute().await {
                Err(err) if is_retryable(&err) => match backoff.next_backoff() {
                    Some(delay) => {
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Configuration request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        debug!(attempt, "Backoff budget exhausted");
                        return Err(err);
                    }
                },
                other => return other,
            }
        }
    }
}
