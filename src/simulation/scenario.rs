//! Scenario configuration
//!
//! Typed connector parameters and car routes, a parser for the textual
//! scenario format, and a seeded random generator for stress runs.
//!
//! The textual format is whitespace-separated:
//!
//! ```text
//! <bridge count>    then per bridge:    travel_time max_wait_time
//! <ferry count>     then per ferry:     travel_time max_wait_time capacity
//! <crossroad count> then per crossroad: travel_time max_wait_time
//! <car count>       then per car:       travel_time segment_count
//!                   then per segment:   connector from to   (e.g. N0 0 1)
//! ```

use std::fmt;
use std::str::SplitWhitespace;

use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{ConnectorId, ConnectorKind, RouteSegment};

/// Parameters for one narrow bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSpec {
    pub travel_time: u64,
    pub max_wait_time: u64,
}

/// Parameters for one ferry (both docks share them)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FerrySpec {
    pub travel_time: u64,
    pub max_wait_time: u64,
    pub capacity: usize,
}

/// Parameters for one crossroad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossRoadSpec {
    pub travel_time: u64,
    pub max_wait_time: u64,
}

/// One car: its per-segment travel delay and its ordered route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarSpec {
    pub travel_time: u64,
    pub route: Vec<RouteSegment>,
}

/// A complete simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scenario {
    pub bridges: Vec<BridgeSpec>,
    pub ferries: Vec<FerrySpec>,
    pub crossroads: Vec<CrossRoadSpec>,
    pub cars: Vec<CarSpec>,
}

impl Scenario {
    /// Parse and validate the textual scenario format
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = TokenReader::new(text);

        let bridge_count = reader.read_usize("bridge count")?;
        let mut bridges = Vec::with_capacity(bridge_count);
        for i in 0..bridge_count {
            bridges.push(BridgeSpec {
                travel_time: reader
                    .read_u64("travel time")
                    .with_context(|| format!("bridge {}", i))?,
                max_wait_time: reader
                    .read_u64("maximum wait time")
                    .with_context(|| format!("bridge {}", i))?,
            });
        }

        let ferry_count = reader.read_usize("ferry count")?;
        let mut ferries = Vec::with_capacity(ferry_count);
        for i in 0..ferry_count {
            ferries.push(FerrySpec {
                travel_time: reader
                    .read_u64("travel time")
                    .with_context(|| format!("ferry {}", i))?,
                max_wait_time: reader
                    .read_u64("maximum wait time")
                    .with_context(|| format!("ferry {}", i))?,
                capacity: reader
                    .read_usize("capacity")
                    .with_context(|| format!("ferry {}", i))?,
            });
        }

        let crossroad_count = reader.read_usize("crossroad count")?;
        let mut crossroads = Vec::with_capacity(crossroad_count);
        for i in 0..crossroad_count {
            crossroads.push(CrossRoadSpec {
                travel_time: reader
                    .read_u64("travel time")
                    .with_context(|| format!("crossroad {}", i))?,
                max_wait_time: reader
                    .read_u64("maximum wait time")
                    .with_context(|| format!("crossroad {}", i))?,
            });
        }

        let car_count = reader.read_usize("car count")?;
        let mut cars = Vec::with_capacity(car_count);
        for i in 0..car_count {
            let travel_time = reader
                .read_u64("travel time")
                .with_context(|| format!("car {}", i))?;
            let segment_count = reader
                .read_usize("route length")
                .with_context(|| format!("car {}", i))?;
            let mut route = Vec::with_capacity(segment_count);
            for j in 0..segment_count {
                let connector: ConnectorId = reader
                    .token("connector reference")
                    .and_then(|t| t.parse())
                    .with_context(|| format!("car {} segment {}", i, j))?;
                let from = reader
                    .read_usize("from approach")
                    .with_context(|| format!("car {} segment {}", i, j))?;
                let to = reader
                    .read_usize("to approach")
                    .with_context(|| format!("car {} segment {}", i, j))?;
                route.push(RouteSegment::new(connector, from, to));
            }
            cars.push(CarSpec { travel_time, route });
        }

        if let Some(extra) = reader.peek() {
            bail!("unexpected trailing input starting at '{}'", extra);
        }

        let scenario = Self {
            bridges,
            ferries,
            crossroads,
            cars,
        };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check every route reference against the configured connectors
    pub fn validate(&self) -> Result<()> {
        for (i, car) in self.cars.iter().enumerate() {
            for segment in &car.route {
                let count = match segment.connector.kind {
                    ConnectorKind::NarrowBridge => self.bridges.len(),
                    ConnectorKind::Ferry => self.ferries.len(),
                    ConnectorKind::CrossRoad => self.crossroads.len(),
                };
                if segment.connector.index >= count {
                    bail!(
                        "car {} references {} but only {} of that kind exist",
                        i,
                        segment.connector,
                        count
                    );
                }
                segment
                    .validate()
                    .with_context(|| format!("car {}", i))?;
            }
        }
        Ok(())
    }

    /// Generate a scenario with `car_count` cars over a small random
    /// connector set. Deterministic for a given seed.
    pub fn random(seed: u64, car_count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let bridges = (0..2)
            .map(|_| BridgeSpec {
                travel_time: rng.random_range(20..80),
                max_wait_time: rng.random_range(100..300),
            })
            .collect();
        let ferries = (0..2)
            .map(|_| FerrySpec {
                travel_time: rng.random_range(20..80),
                max_wait_time: rng.random_range(100..300),
                capacity: rng.random_range(2..5),
            })
            .collect();
        let crossroads = (0..2)
            .map(|_| CrossRoadSpec {
                travel_time: rng.random_range(20..80),
                max_wait_time: rng.random_range(100..300),
            })
            .collect();

        let cars = (0..car_count)
            .map(|_| {
                let segments = rng.random_range(1..=4);
                let route = (0..segments)
                    .map(|_| {
                        let kind = match rng.random_range(0..3) {
                            0 => ConnectorKind::NarrowBridge,
                            1 => ConnectorKind::Ferry,
                            _ => ConnectorKind::CrossRoad,
                        };
                        let connector = ConnectorId::new(kind, rng.random_range(0..2));
                        let from = rng.random_range(0..kind.approaches());
                        let to = rng.random_range(0..kind.approaches());
                        RouteSegment::new(connector, from, to)
                    })
                    .collect();
                CarSpec {
                    travel_time: rng.random_range(10..50),
                    route,
                }
            })
            .collect();

        Self {
            bridges,
            ferries,
            crossroads,
            cars,
        }
    }
}

impl fmt::Display for Scenario {
    /// Renders the textual scenario format accepted by [`Scenario::parse`]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.bridges.len())?;
        for b in &self.bridges {
            writeln!(f, "{} {}", b.travel_time, b.max_wait_time)?;
        }
        writeln!(f, "{}", self.ferries.len())?;
        for ferry in &self.ferries {
            writeln!(
                f,
                "{} {} {}",
                ferry.travel_time, ferry.max_wait_time, ferry.capacity
            )?;
        }
        writeln!(f, "{}", self.crossroads.len())?;
        for c in &self.crossroads {
            writeln!(f, "{} {}", c.travel_time, c.max_wait_time)?;
        }
        writeln!(f, "{}", self.cars.len())?;
        for car in &self.cars {
            writeln!(f, "{} {}", car.travel_time, car.route.len())?;
            for segment in &car.route {
                writeln!(
                    f,
                    "{} {} {}",
                    segment.connector, segment.from, segment.to
                )?;
            }
        }
        Ok(())
    }
}

/// Whitespace token cursor over the scenario text
struct TokenReader<'a> {
    tokens: std::iter::Peekable<SplitWhitespace<'a>>,
}

impl<'a> TokenReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            tokens: text.split_whitespace().peekable(),
        }
    }

    fn token(&mut self, what: &str) -> Result<&'a str> {
        self.tokens
            .next()
            .with_context(|| format!("scenario ended early, expected {}", what))
    }

    fn read_usize(&mut self, what: &str) -> Result<usize> {
        let token = self.token(what)?;
        token
            .parse()
            .with_context(|| format!("expected {}, got '{}'", what, token))
    }

    fn read_u64(&mut self, what: &str) -> Result<u64> {
        let token = self.token(what)?;
        token
            .parse()
            .with_context(|| format!("expected {}, got '{}'", what, token))
    }

    fn peek(&mut self) -> Option<&'a str> {
        self.tokens.peek().copied()
    }
}
