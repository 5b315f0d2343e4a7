//! StationResolver - organization -> (station, broker)

use contracts::{ConfigSnapshot, RoutingInfo};

/// Pure routing lookup over a snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct StationResolver;

impl StationResolver {
    /// First enabled station, in the snapshot's station order, among the
    /// stations linked to `organization_id`
    pub fn resolve(snapshot: &ConfigSnapshot, organization_id: &str) -> Option<RoutingInfo> {
        let linked: Vec<&str> = snapshot
            .links()
            .iter()
            .filter(|link| link.organization_id == organization_id)
            .map(|link| link.station_code.as_str())
            .collect();

        if linked.is_empty() {
            return None;
        }

        snapshot
            .stations()
            .iter()
            .filter(|station| linked.contains(&station.station_code.as_str()))
            .find(|station| station.enabled)
            .map(|station| RoutingInfo {
                station_code: station.station_code.clone(),
                broker_code: station.broker_code.clone(),
            })
    }
}
