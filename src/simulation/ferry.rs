//! Ferry monitor
//!
//! A batch-departure resource. Cars accumulate at a dock until the boat is
//! full or the first of them has waited `max_wait_time`; the whole batch
//! then departs together. Each physical ferry serves both shores through
//! two docks with fully independent state — only the configured parameters
//! are shared.

use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use super::events::{Action, EventLog};
use super::types::{CarId, ConnectorId};

struct Dock {
    waiting: Mutex<usize>,
    departs: Condvar,
}

impl Dock {
    fn new() -> Self {
        Self {
            waiting: Mutex::new(0),
            departs: Condvar::new(),
        }
    }
}

/// A batch-loading ferry with one dock per direction of travel
pub struct Ferry {
    id: ConnectorId,
    travel_time: u64,
    max_wait_time: u64,
    capacity: usize,
    docks: [Dock; 2],
}

impl Ferry {
    pub fn new(id: ConnectorId, travel_time: u64, max_wait_time: u64, capacity: usize) -> Self {
        Self {
            id,
            travel_time,
            max_wait_time,
            capacity,
            docks: [Dock::new(), Dock::new()],
        }
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    /// Time one crossing takes, in milliseconds
    pub fn travel_time(&self) -> u64 {
        self.travel_time
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Block until the boat `car` boarded at dock `direction` departs.
    ///
    /// Arrival and boarding are both recorded here, under the dock lock.
    /// There is no release handshake; the caller records the end of the
    /// crossing after sleeping the travel time.
    pub fn pass(&self, direction: usize, car: CarId, log: &EventLog) {
        let dock = &self.docks[direction];
        let mut waiting = dock
            .waiting
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        log.record(car, self.id, Action::Arrive);
        *waiting += 1;

        if *waiting >= self.capacity {
            // This car fills the boat: everyone waiting departs with it
            log.record(car, self.id, Action::StartPassing);
            dock.departs.notify_all();
            *waiting -= 1;
        } else {
            let (guard, result) = dock
                .departs
                .wait_timeout(waiting, Duration::from_millis(self.max_wait_time))
                .unwrap_or_else(PoisonError::into_inner);
            waiting = guard;
            if result.timed_out() {
                // Depart under capacity rather than wait forever
                dock.departs.notify_all();
            }
            log.record(car, self.id, Action::StartPassing);
            *waiting -= 1;
        }
    }
}
