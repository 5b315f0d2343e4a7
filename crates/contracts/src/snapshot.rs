//! ConfigSnapshot - routing metadata served by the configuration provider
//!
//! Immutable once built; a refresh produces a new snapshot that replaces the old one.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Organization -> station link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditorInstitutionStation {
    /// Organization identifier (`idPA`)
    #[serde(rename = "creditorInstitutionCode")]
    pub organization_id: String,

    #[serde(rename = "stationCode")]
    pub station_code: String,
}

/// Station record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    #[serde(rename = "stationCode")]
    pub station_code: String,

    #[serde(rename = "brokerCode")]
    pub broker_code: String,

    #[serde(default)]
    pub enabled: bool,
}

/// Raw provider response body
///
/// Both sections are keyed objects; document order is preserved so that the
/// snapshot keeps the provider's stored order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CachePayload {
    #[serde(rename = "creditorInstitutionStations", default)]
    pub creditor_institution_stations: IndexMap<String, CreditorInstitutionStation>,

    #[serde(default)]
    pub stations: IndexMap<String, Station>,
}

/// Resolved routing pair for one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingInfo {
    pub station_code: String,
    pub broker_code: String,
}

/// Immutable routing metadata snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    links: Vec<CreditorInstitutionStation>,
    stations: Vec<Station>,
    retrieved_on: NaiveDate,
}

impl ConfigSnapshot {
    /// Build a snapshot from ordered links and stations
    pub fn new(
        links: Vec<CreditorInstitutionStation>,
        stations: Vec<Station>,
        retrieved_on: NaiveDate,
    ) -> Self {
        Self {
            links,
            stations,
            retrieved_on,
        }
    }

    /// Build a snapshot from a provider payload, stamped with the retrieval date
    pub fn from_payload(payload: CachePayload, retrieved_on: NaiveDate) -> Self {
        Self::new(
            payload.creditor_institution_stations.into_values().collect(),
            payload.stations.into_values().collect(),
            retrieved_on,
        )
    }

    /// Snapshot with no routing data
    pub fn empty(retrieved_on: NaiveDate) -> Self {
        Self::new(Vec::new(), Vec::new(), retrieved_on)
    }

    /// Organization -> station links, in stored order
    pub fn links(&self) -> &[CreditorInstitutionStation] {
        &self.links
    }

    /// Station records, in stored order
    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn retrieved_on(&self) -> NaiveDate {
        self.retrieved_on
    }

    /// A snapshot retrieved on an earlier calendar date is stale
    pub fn is_stale(&self, today: NaiveDate) -> bool {
        self.retrieved_on < today
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.stations.is_empty()
    }
}
