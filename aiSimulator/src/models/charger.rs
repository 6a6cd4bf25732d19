use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A charging station exposing one or more connectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charger {
    pub id: u32,
    pub max_power_kw: f64,
    pub connector_count: usize,
    /// DC fast ("level 3") charger
    pub is_level_3: bool,
    /// Connector index -> EV id, rebuilt every step
    #[serde(default)]
    pub connected_evs: BTreeMap<usize, u32>,
}

impl Charger {
    pub fn new(id: u32, max_power_kw: f64, connector_count: usize, is_level_3: bool) -> Self {
        Self {
            id,
            max_power_kw,
            connector_count,
            is_level_3,
            connected_evs: BTreeMap::new(),
        }
    }

    pub fn available_connectors(&self) -> usize {
        self.connector_count.saturating_sub(self.connected_evs.len())
    }

    pub fn reset_connections(&mut self) {
        self.connected_evs.clear();
    }

    /// Plugs `ev_id` into `connector`. Returns false if the connector index
    /// does not exist on this charger.
    pub fn connect(&mut self, connector: usize, ev_id: u32) -> bool {
        if connector >= self.connector_count {
            return false;
        }
        self.connected_evs.insert(connector, ev_id);
        true
    }
}
