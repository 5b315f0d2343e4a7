//! Gateway wire format
//!
//! Request and response bodies use the node's field names. A response carries
//! either a `fault` or an `elencoFlussiRendicontazione`; a body with neither is
//! an empty listing.

use chrono::{DateTime, NaiveDateTime};
use contracts::{FlowListOutcome, FlowListRequest, FlowListing, FlowRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequestBody {
    #[serde(rename = "identificativoIntermediarioPA")]
    pub broker_code: String,
    #[serde(rename = "identificativoStazioneIntermediarioPA")]
    pub station_code: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub password: Option<String>,
    #[serde(rename = "identificativoPA")]
    pub organization_id: String,
}

impl From<&FlowListRequest> for ListRequestBody {
    fn from(request: &FlowListRequest) -> Self {
        Self {
            broker_code: request.broker_code.clone(),
            station_code: request.station_code.clone(),
            password: request.password.clone(),
            organization_id: request.organization_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListResponseBody {
    #[serde(default)]
    pub fault: Option<Fault>,

    #[serde(rename = "elencoFlussiRendicontazione", default)]
    pub listing: Option<FlowList>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    #[serde(default)]
    pub fault_code: String,
    #[serde(default)]
    pub fault_string: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Fault {
    /// Human readable description, falling back to code and string
    pub fn describe(&self) -> String {
        match &self.description {
            Some(description) if !description.is_empty() => description.clone(),
            _ => format!("{}: {}", self.fault_code, self.fault_string),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowList {
    #[serde(rename = "totRestituiti", default)]
    pub total: Option<u32>,

    #[serde(rename = "idRendicontazione", default)]
    pub flows: Vec<FlowEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowEntry {
    #[serde(rename = "identificativoFlusso")]
    pub flow_id: String,

    /// xs:dateTime as sent, with or without a zone offset
    #[serde(rename = "dataOraFlusso", default)]
    pub flow_timestamp: Option<String>,
}

impl FlowEntry {
    /// Wall-clock timestamp of the flow; `None` when absent or unparseable
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        let raw = self.flow_timestamp.as_deref()?.trim();
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Some(with_offset.naive_local());
        }
        match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(naive) => Some(naive),
            Err(e) => {
                debug!(flow_id = %self.flow_id, timestamp = raw, error = %e, "Unparseable flow timestamp");
                None
            }
        }
    }
}

impl ListResponseBody {
    pub fn into_outcome(self) -> FlowListOutcome {
        if let Some(fault) = self.fault {
            return FlowListOutcome::BusinessFault(fault.describe());
        }

        let list = self.listing.unwrap_or_default();
        let flows: Vec<FlowRecord> = list
            .flows
            .into_iter()
            .map(|entry| FlowRecord {
                flow_timestamp: entry.parsed_timestamp(),
                flow_id: entry.flow_id,
            })
            .collect();
        let mut listing = FlowListing::new(flows);
        if let Some(total) = list.total {
            listing.total = total;
        }
        FlowListOutcome::Success(listing)
    }
}
