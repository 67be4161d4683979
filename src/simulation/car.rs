//! Car driver
//!
//! Each car is driven by its own thread through an ordered route of
//! connector crossings. Segments are strictly sequential: a car never
//! starts driving towards the next connector before it has released the
//! previous one.

use anyhow::Result;

use super::clock::sleep_millis;
use super::events::{Action, EventLog};
use super::registry::ConnectorRegistry;
use super::scenario::CarSpec;
use super::types::{CarId, ConnectorKind, RouteSegment};

/// A car in the crossing simulation
#[derive(Debug, Clone)]
pub struct SimCar {
    pub id: CarId,
    /// Driving delay before each connector, in milliseconds
    pub travel_time: u64,
    pub route: Vec<RouteSegment>,
}

impl SimCar {
    pub fn new(id: CarId, spec: &CarSpec) -> Self {
        Self {
            id,
            travel_time: spec.travel_time,
            route: spec.route.clone(),
        }
    }

    /// Walk the full route: travel, arrive, cross and release each
    /// connector in order. Blocks inside connector admission whenever the
    /// car has to wait its turn.
    pub fn drive(&self, registry: &ConnectorRegistry, log: &EventLog) -> Result<()> {
        for segment in &self.route {
            log.record(self.id, segment.connector, Action::Travel);
            sleep_millis(self.travel_time);
            self.cross(segment, registry, log)?;
        }
        Ok(())
    }

    fn cross(
        &self,
        segment: &RouteSegment,
        registry: &ConnectorRegistry,
        log: &EventLog,
    ) -> Result<()> {
        match segment.connector.kind {
            ConnectorKind::NarrowBridge => {
                let bridge = registry.bridge(segment.connector.index)?;
                log.record(self.id, segment.connector, Action::Arrive);
                bridge.pass(segment.from, self.id, log);
                sleep_millis(bridge.travel_time());
                bridge.leave(segment.from, self.id, log);
            }
            ConnectorKind::Ferry => {
                let ferry = registry.ferry(segment.connector.index)?;
                // The ferry records the arrival itself, under the dock lock
                ferry.pass(segment.from, self.id, log);
                sleep_millis(ferry.travel_time());
                log.record(self.id, segment.connector, Action::FinishPassing);
            }
            ConnectorKind::CrossRoad => {
                let crossroad = registry.crossroad(segment.connector.index)?;
                log.record(self.id, segment.connector, Action::Arrive);
                crossroad.pass(segment.from, self.id, log);
                sleep_millis(crossroad.travel_time());
                crossroad.leave(segment.from, self.id, log);
            }
        }
        Ok(())
    }
}
