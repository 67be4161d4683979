//! Connector registry
//!
//! Owns every connector instance for a run. Built once from a scenario
//! before any car thread starts; only the connectors' internal monitor
//! state mutates afterwards, so car threads share the registry behind an
//! `Arc` without further locking.

use anyhow::{Context, Result};

use super::crossroad::CrossRoad;
use super::ferry::Ferry;
use super::narrow_bridge::NarrowBridge;
use super::scenario::Scenario;
use super::types::{ConnectorId, ConnectorKind};

pub struct ConnectorRegistry {
    bridges: Vec<NarrowBridge>,
    ferries: Vec<Ferry>,
    crossroads: Vec<CrossRoad>,
}

impl ConnectorRegistry {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let bridges = scenario
            .bridges
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                NarrowBridge::new(
                    ConnectorId::new(ConnectorKind::NarrowBridge, i),
                    spec.travel_time,
                    spec.max_wait_time,
                )
            })
            .collect();
        let ferries = scenario
            .ferries
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                Ferry::new(
                    ConnectorId::new(ConnectorKind::Ferry, i),
                    spec.travel_time,
                    spec.max_wait_time,
                    spec.capacity,
                )
            })
            .collect();
        let crossroads = scenario
            .crossroads
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                CrossRoad::new(
                    ConnectorId::new(ConnectorKind::CrossRoad, i),
                    spec.travel_time,
                    spec.max_wait_time,
                )
            })
            .collect();

        Self {
            bridges,
            ferries,
            crossroads,
        }
    }

    pub fn bridge(&self, index: usize) -> Result<&NarrowBridge> {
        self.bridges
            .get(index)
            .with_context(|| format!("narrow bridge {} not found", index))
    }

    pub fn ferry(&self, index: usize) -> Result<&Ferry> {
        self.ferries
            .get(index)
            .with_context(|| format!("ferry {} not found", index))
    }

    pub fn crossroad(&self, index: usize) -> Result<&CrossRoad> {
        self.crossroads
            .get(index)
            .with_context(|| format!("crossroad {} not found", index))
    }

    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    pub fn ferry_count(&self) -> usize {
        self.ferries.len()
    }

    pub fn crossroad_count(&self) -> usize {
        self.crossroads.len()
    }
}
