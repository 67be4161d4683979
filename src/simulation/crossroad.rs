//! Crossroad monitor
//!
//! A four-approach intersection. Cars from one approach may cross
//! concurrently; every other approach is fully excluded while they do.
//! The waiting protocol is the narrow bridge's, generalized: the conflict
//! check covers three opposing approaches instead of one, and hand-offs
//! walk the approaches in a fixed cyclic order.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::clock::sleep_millis;
use super::events::{Action, EventLog};
use super::types::{CarId, ConnectorId, PASS_DELAY_MS};

pub const APPROACHES: usize = 4;

/// Mutable monitor state, only touched while holding the crossroad's lock
#[derive(Debug)]
struct CrossRoadState {
    /// Approach currently holding right-of-way, if any
    active: Option<usize>,
    /// Cars currently in the intersection, per approach
    passing: [usize; APPROACHES],
    /// Waiting cars in request order, per approach
    waiting: [VecDeque<CarId>; APPROACHES],
    /// Set when an approach's timed wait expired; honored at the next switch
    starved: [bool; APPROACHES],
}

impl CrossRoadState {
    /// True while any approach other than `approach` has cars in flight
    fn conflicts(&self, approach: usize) -> bool {
        (0..APPROACHES).any(|other| other != approach && self.passing[other] > 0)
    }

    fn idle(&self) -> bool {
        self.passing.iter().sum::<usize>() == 0
    }
}

/// A four-approach intersection
pub struct CrossRoad {
    id: ConnectorId,
    travel_time: u64,
    max_wait_time: u64,
    state: Mutex<CrossRoadState>,
    /// One condition per approach so a wakeup only hits intended waiters
    available: [Condvar; APPROACHES],
}

impl CrossRoad {
    pub fn new(id: ConnectorId, travel_time: u64, max_wait_time: u64) -> Self {
        Self {
            id,
            travel_time,
            max_wait_time,
            state: Mutex::new(CrossRoadState {
                active: None,
                passing: [0; APPROACHES],
                waiting: std::array::from_fn(|_| VecDeque::new()),
                starved: [false; APPROACHES],
            }),
            available: std::array::from_fn(|_| Condvar::new()),
        }
    }

    pub fn id(&self) -> ConnectorId {
        self.id
    }

    /// Time one car takes to cross, in milliseconds
    pub fn travel_time(&self) -> u64 {
        self.travel_time
    }

    fn lock(&self) -> MutexGuard<'_, CrossRoadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until `car` may cross from `approach`, then record the start
    /// of its crossing. The caller sleeps the crossing time afterwards and
    /// must pair this with a `leave` call.
    pub fn pass(&self, approach: usize, car: CarId, log: &EventLog) {
        let mut state = self.lock();
        // Set once this car has joined its approach's queue; the entry
        // stays in place across retries until the car admits itself.
        let mut queued = false;

        loop {
            if state.active == Some(approach) {
                if state.conflicts(approach) {
                    // Other approaches still draining after a switch
                    if !queued {
                        state.waiting[approach].push_back(car);
                        queued = true;
                    }
                    state = self.wait(approach, state);
                    continue;
                }

                let at_head = state.waiting[approach].front() == Some(&car);
                if state.waiting[approach].is_empty() || at_head {
                    if at_head {
                        state.waiting[approach].pop_front();
                    }
                    if state.passing[approach] > 0 {
                        // Following gap behind a car already crossing
                        sleep_millis(PASS_DELAY_MS);
                    }
                    state.passing[approach] += 1;
                    log.record(car, self.id, Action::StartPassing);
                    self.available[approach].notify_one();
                    return;
                }

                // Not our turn yet; pass the wakeup on to the actual head
                if !queued {
                    state.waiting[approach].push_back(car);
                    queued = true;
                }
                self.available[approach].notify_one();
                state = self.wait(approach, state);
            } else if state.starved[approach] {
                // Our side timed out earlier: take the right-of-way now
                state.starved[approach] = false;
                state.active = Some(approach);
                self.notify_next(approach, &state);
            } else if state.idle() {
                // Intersection idle: take the right-of-way
                state.active = Some(approach);
                self.notify_next(approach, &state);
            } else {
                if !queued {
                    state.waiting[approach].push_back(car);
                    queued = true;
                }
                let (guard, timeout) = self.wait_timed(approach, state);
                state = guard;
                if timeout {
                    state.starved[approach] = true;
                }
            }
        }
    }

    /// Record the end of a crossing and hand the intersection over once
    /// this approach has drained.
    pub fn leave(&self, approach: usize, car: CarId, log: &EventLog) {
        let mut state = self.lock();
        state.passing[approach] -= 1;
        log.record(car, self.id, Action::FinishPassing);
        if state.passing[approach] == 0 {
            self.notify_next(approach, &state);
        }
    }

    /// Wake the cyclically-next approach after `approach` that has waiters.
    /// Falls back to the last approach in the rotation when all three
    /// queues are empty, so a recheck still happens.
    fn notify_next(&self, approach: usize, state: &CrossRoadState) {
        for step in 1..APPROACHES {
            let next = (approach + step) % APPROACHES;
            if !state.waiting[next].is_empty() {
                self.available[next].notify_one();
                return;
            }
        }
        self.available[(approach + APPROACHES - 1) % APPROACHES].notify_one();
    }

    fn wait<'a>(
        &self,
        approach: usize,
        state: MutexGuard<'a, CrossRoadState>,
    ) -> MutexGuard<'a, CrossRoadState> {
        self.available[approach]
            .wait(state)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_timed<'a>(
        &self,
        approach: usize,
        state: MutexGuard<'a, CrossRoadState>,
    ) -> (MutexGuard<'a, CrossRoadState>, bool) {
        let (guard, result) = self.available[approach]
            .wait_timeout(state, Duration::from_millis(self.max_wait_time))
            .unwrap_or_else(PoisonError::into_inner);
        (guard, result.timed_out())
    }
}
