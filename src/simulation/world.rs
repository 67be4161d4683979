//! Simulation driver
//!
//! Builds the connector registry and the car list from a validated
//! scenario, runs one worker thread per car, and hands back the recorded
//! event history once every car has finished its route.

use std::sync::Arc;
use std::thread;

use anyhow::{bail, Context, Result};
use log::debug;

use super::car::SimCar;
use super::events::{Event, EventLog};
use super::registry::ConnectorRegistry;
use super::scenario::Scenario;
use super::types::CarId;

/// The assembled simulation: connectors, cars and the event sink
pub struct SimWorld {
    registry: Arc<ConnectorRegistry>,
    log: Arc<EventLog>,
    cars: Vec<SimCar>,
}

impl SimWorld {
    /// Validate the scenario and build every connector up front. With
    /// `echo` set, events are printed live as they are recorded.
    pub fn new(scenario: &Scenario, echo: bool) -> Result<Self> {
        scenario.validate().context("invalid scenario")?;

        let registry = ConnectorRegistry::from_scenario(scenario);
        debug!(
            "built registry: {} bridges, {} ferries, {} crossroads",
            registry.bridge_count(),
            registry.ferry_count(),
            registry.crossroad_count()
        );

        let cars = scenario
            .cars
            .iter()
            .enumerate()
            .map(|(i, spec)| SimCar::new(CarId(i), spec))
            .collect();

        Ok(Self {
            registry: Arc::new(registry),
            log: Arc::new(EventLog::new(echo)),
            cars,
        })
    }

    pub fn car_count(&self) -> usize {
        self.cars.len()
    }

    /// Run the whole simulation: one worker thread per car, all joined
    /// before returning. The returned events are in recorded order.
    pub fn run(self) -> Result<Vec<Event>> {
        let mut workers = Vec::with_capacity(self.cars.len());
        for car in self.cars {
            let registry = Arc::clone(&self.registry);
            let log = Arc::clone(&self.log);
            let car_id = car.id;
            let worker = thread::Builder::new()
                .name(format!("car-{}", car_id.0))
                .spawn(move || car.drive(&registry, &log))
                .with_context(|| format!("failed to spawn worker for {}", car_id))?;
            workers.push(worker);
        }
        debug!("spawned {} car workers", workers.len());

        for worker in workers {
            match worker.join() {
                Ok(result) => result?,
                Err(_) => bail!("a car worker panicked"),
            }
        }

        Ok(self.log.history())
    }
}
