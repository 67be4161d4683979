//! Narrow bridge monitor
//!
//! A single-lane bidirectional bridge. Cars travelling the same direction
//! may be on the bridge concurrently; the two directions exclude each
//! other. Within a direction cars are admitted in request order, and a
//! direction kept waiting past `max_wait_time` forces the next
//! right-of-way switch.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::clock::sleep_millis;
use super::events::{Action, EventLog};
use super::types::{CarId, ConnectorId, PASS_DELAY_MS};

/// Mutable monitor state, only touched while holding the bridge's lock
#[derive(Debug)]
struct BridgeState {
    /// Direction currently holding right-of-way, if any
    active: Option<usize>,
    /// Cars currently on the bridge, per direction
    passing: [usize; 2],
    /// Waiting cars in request order, per direction
    waiting: [VecDeque<CarId>; 2],
    /// Set when a direction's timed wait expired; honored at the next switch
    starved: [bool; 2],
}

/// A single-lane bidirectional bridge
pub struct NarrowBridge {
    id: ConnectorId,
    travel_time: u64,
    max_wait_time: u64,
    state: Mutex<BridgeState>,
    /// One condition per direction so a wakeup only hits intended waiters
    available: [Condvar; 2],
}

impl NarrowBridge {
    pub fn new(id: ConnectorId, travel_time: u64, max_wait_time: u64) -> Self {
        Self {
            id,
            travel_time,
            max_wait_time,
            state: Mutex::new(BridgeState {
                active: None,
                passing: [0, 0],
                waiting: [VecDeque::new(), VecDeque::new()],
                starved: [false, false],
            }),
            available: [Condvar::new(), Condvar::new()],
        }
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    /// Time one car takes to cross, in milliseconds
    pub fn travel_time(&self) -> u64 {
        self.travel_time
    }

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `car` may cross from `direction`, then record the start
    /// of its crossing. The caller sleeps the crossing time afterwards and
    /// must pair this with a `leave` call.
    pub fn pass(&self, direction: usize, car: CarId, log: &EventLog) {
        let opposite = 1 - direction;
        let mut state = self.lock();
        // Set once this car has joined its direction's queue; the entry
        // stays in place across retries until the car admits itself.
        let mut queued = false;

        loop {
            if state.active == Some(direction) {
                if state.passing[opposite] > 0 {
                    // Opposing traffic still draining after a switch
                    if !queued {
                        state.waiting[direction].push_back(car);
                        queued = true;
                    }
                    state = self.wait(direction, state);
                    continue;
                }

                let at_head = state.waiting[direction].front() == Some(&car);
                if state.waiting[direction].is_empty() || at_head {
                    if at_head {
                        state.waiting[direction].pop_front();
                    }
                    if state.passing[direction] > 0 {
                        // Following gap behind a car already on the bridge
                        sleep_millis(PASS_DELAY_MS);
                    }
                    state.passing[direction] += 1;
                    log.record(car, self.id, Action::StartPassing);
                    self.available[direction].notify_one();
                    return;
                }

                // Not our turn yet; pass the wakeup on to the actual head
                if !queued {
                    state.waiting[direction].push_back(car);
                    queued = true;
                }
                self.available[direction].notify_one();
                state = self.wait(direction, state);
            } else if state.starved[direction] {
                // Our side timed out earlier: take the right-of-way now
                state.starved[direction] = false;
                state.active = Some(direction);
                self.available[opposite].notify_one();
            } else if state.passing[0] + state.passing[1] == 0 {
                // Bridge idle: take the right-of-way
                state.active = Some(direction);
                self.available[opposite].notify_one();
            } else {
                if !queued {
                    state.waiting[direction].push_back(car);
                    queued = true;
                }
                let (guard, timeout) = self.wait_timed(direction, state);
                state = guard;
                if timeout {
                    state.starved[direction] = true;
                }
            }
        }
    }

    /// Record the end of a crossing and hand the bridge over once this
    /// direction has drained.
    pub fn leave(&self, direction: usize, car: CarId, log: &EventLog) {
        let mut state = self.lock();
        state.passing[direction] -= 1;
        log.record(car, self.id, Action::FinishPassing);
        if state.passing[direction] == 0 {
            self.available[1 - direction].notify_one();
        }
    }

    fn wait<'a>(
        &self,
        direction: usize,
        state: MutexGuard<'a, BridgeState>,
    ) -> MutexGuard<'a, BridgeState> {
        self.available[direction]
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_timed<'a>(
        &self,
        direction: usize,
        state: MutexGuard<'a, BridgeState>,
    ) -> (MutexGuard<'a, BridgeState>, bool) {
        let (guard, result) = self.available[direction]
            .wait_timeout(state, Duration::from_millis(self.max_wait_time))
            .unwrap_or_else(PoisonError::into_inner);
        (guard, result.timed_out())
    }
}
