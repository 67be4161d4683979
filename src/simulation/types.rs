//! Core types for the crossing simulation
//!
//! Standalone identifiers and route data shared by every other module.

use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// A unique identifier for a car
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CarId(pub usize);

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "car {}", self.0)
    }
}

/// The kind of connector a route segment crosses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    /// Single-lane bidirectional bridge
    NarrowBridge,
    /// Batch-loading ferry with one dock per shore
    Ferry,
    /// Four-approach intersection
    CrossRoad,
}

impl ConnectorKind {
    /// Single-letter code used in scenario text and event output
    pub fn code(&self) -> char {
        match self {
            ConnectorKind::NarrowBridge => 'N',
            ConnectorKind::Ferry => 'F',
            ConnectorKind::CrossRoad => 'C',
        }
    }

    /// Number of distinct approaches a car may enter this kind from
    pub fn approaches(&self) -> usize {
        match self {
            ConnectorKind::NarrowBridge | ConnectorKind::Ferry => 2,
            ConnectorKind::CrossRoad => 4,
        }
    }

    fn from_code(code: char) -> Option<Self> {
        match code {
            'N' => Some(ConnectorKind::NarrowBridge),
            'F' => Some(ConnectorKind::Ferry),
            'C' => Some(ConnectorKind::CrossRoad),
            _ => None,
        }
    }
}

/// A connector reference: kind plus index within that kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectorId {
    pub kind: ConnectorKind,
    pub index: usize,
}

impl ConnectorId {
    pub fn new(kind: ConnectorKind, index: usize) -> Self {
        Self { kind, index }
    }
}

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.code(), self.index)
    }
}

impl FromStr for ConnectorId {
    type Err = anyhow::Error;

    /// Parses the scenario-text form, e.g. `N0`, `F2`, `C1`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = chars
            .next()
            .and_then(ConnectorKind::from_code)
            .ok_or_else(|| anyhow::anyhow!("invalid connector code in '{}'", s))?;
        let index: usize = chars.as_str().parse()?;
        Ok(ConnectorId { kind, index })
    }
}

/// One segment of a car's route: a connector plus entry/exit approaches
///
/// The entry approach (`from`) decides which other cars this one conflicts
/// with; `to` is carried from the configuration and only range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSegment {
    pub connector: ConnectorId,
    pub from: usize,
    pub to: usize,
}

impl RouteSegment {
    pub fn new(connector: ConnectorId, from: usize, to: usize) -> Self {
        Self { connector, from, to }
    }

    /// Checks both approaches against the connector kind's approach count
    pub fn validate(&self) -> anyhow::Result<()> {
        let approaches = self.connector.kind.approaches();
        if self.from >= approaches || self.to >= approaches {
            bail!(
                "segment through {} has approach {} -> {}, valid range is 0..{}",
                self.connector,
                self.from,
                self.to,
                approaches
            );
        }
        Ok(())
    }
}

/// Following gap in milliseconds between same-direction cars that enter a
/// bridge or crossroad while others of that direction are already crossing
pub const PASS_DELAY_MS: u64 = 10;
