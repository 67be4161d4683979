//! Crossing simulation core
//!
//! Connector monitors (narrow bridge, ferry, crossroad), the car drivers
//! that cross them, and the scenario/registry plumbing that wires a run
//! together. Everything here runs headless; the binary only adds argument
//! parsing and output.

mod car;
mod clock;
mod crossroad;
mod events;
mod ferry;
mod narrow_bridge;
mod registry;
mod scenario;
mod types;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use car::SimCar;
#[allow(unused_imports)]
pub use clock::{sleep_millis, SimClock};
#[allow(unused_imports)]
pub use crossroad::{CrossRoad, APPROACHES};
#[allow(unused_imports)]
pub use events::{Action, Event, EventLog};
#[allow(unused_imports)]
pub use ferry::Ferry;
#[allow(unused_imports)]
pub use narrow_bridge::NarrowBridge;
#[allow(unused_imports)]
pub use registry::ConnectorRegistry;
#[allow(unused_imports)]
pub use scenario::{BridgeSpec, CarSpec, CrossRoadSpec, FerrySpec, Scenario};
#[allow(unused_imports)]
pub use types::{CarId, ConnectorId, ConnectorKind, RouteSegment, PASS_DELAY_MS};
pub use world::SimWorld;
