//! Lifecycle event recording
//!
//! Every car state transition is recorded as an `Event` in a shared
//! append-only log. Append order is the authoritative serialization of the
//! run: connectors record admissions and releases while holding their own
//! monitor lock, so replaying the log reproduces the exact interleaving.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use super::clock::SimClock;
use super::types::{CarId, ConnectorId};

/// A car's lifecycle action at a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Started driving towards the connector
    Travel,
    /// Reached the connector and is about to request admission
    Arrive,
    /// Admitted; the crossing has begun
    StartPassing,
    /// The crossing is complete
    FinishPassing,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Travel => "TRAVEL",
            Action::Arrive => "ARRIVE",
            Action::StartPassing => "START_PASSING",
            Action::FinishPassing => "FINISH_PASSING",
        };
        write!(f, "{}", name)
    }
}

/// One recorded state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub car: CarId,
    pub connector: ConnectorId,
    pub action: Action,
    pub timestamp_ms: u64,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8} {} {} {}",
            self.timestamp_ms, self.car, self.connector, self.action
        )
    }
}

/// Shared append-only sink for simulation events
///
/// The log has its own lock, independent of any connector's monitor lock.
/// When `echo` is set each event is also printed as it is recorded.
pub struct EventLog {
    clock: SimClock,
    events: Mutex<Vec<Event>>,
    echo: bool,
}

impl EventLog {
    pub fn new(echo: bool) -> Self {
        Self {
            clock: SimClock::new(),
            events: Mutex::new(Vec::new()),
            echo,
        }
    }

    /// Append one event, stamped with the current simulation time
    pub fn record(&self, car: CarId, connector: ConnectorId, action: Action) {
        let event = Event {
            car,
            connector,
            action,
            timestamp_ms: self.clock.now_millis(),
        };
        if self.echo {
            println!("{}", event);
        }
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of the history so far, in append order
    pub fn history(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of events recorded so far
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
