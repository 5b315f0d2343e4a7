//! HTTP flow-list client
//!
//! POSTs the request to the node gateway and folds every failure into a
//! `FlowListOutcome`: connect errors, timeouts, non-2xx statuses and unreadable
//! bodies become `TransportError`; a fault body becomes `BusinessFault`.

use std::time::Duration;

use contracts::{FlowListClient, FlowListOutcome, FlowListRequest, NodeSettings};
use tracing::{debug, instrument, warn};

use crate::error::{NodeClientError, Result};
use crate::wire::{ListRequestBody, ListResponseBody};

#[derive(Debug, Clone)]
pub struct HttpFlowListClient {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl HttpFlowListClient {
    pub fn new(settings: &NodeSettings) -> Result<Self> {
        let url = reqwest::Url::parse(&settings.url).map_err(|e| NodeClientError::InvalidUrl {
            url: settings.url.clone(),
            message: e.to_string(),
        })?;
        let timeout = Duration::from_millis(settings.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeClientError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl FlowListClient for HttpFlowListClient {
    #[instrument(
        name = "node_fetch_flow_list",
        skip(self, request),
        fields(
            organization_id = %request.organization_id,
            broker = %request.broker_code,
            station = %request.station_code
        )
    )]
    async fn fetch_flow_list(&self, request: &FlowListRequest) -> FlowListOutcome {
        let response = match self
            .client
            .post(self.url.clone())
            .json(&ListRequestBody::from(request))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let cause = if e.is_timeout() {
                    format!("timed out after {} ms", self.timeout.as_millis())
                } else {
                    e.to_string()
                };
                warn!(error = %cause, "Node unreachable");
                return FlowListOutcome::TransportError(cause);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Node answered with an error status");
            return FlowListOutcome::TransportError(format!("HTTP status {status}"));
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return FlowListOutcome::TransportError(e.to_string()),
        };

        match serde_json::from_slice::<ListResponseBody>(&body) {
            Ok(decoded) => {
                let outcome = decoded.into_outcome();
                debug!(outcome = outcome.kind(), "Node answered");
                outcome
            }
            Err(e) => FlowListOutcome::TransportError(format!("unreadable response: {e}")),
        }
    }
}
