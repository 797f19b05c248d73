//! Counting admission gate with first-come, first-served hand-off.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Bounds how many holders may be inside at once.
///
/// Blocked callers are admitted strictly in arrival order: each takes a
/// ticket and waits until its ticket is up and a slot is free.
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    state: Mutex<GateState>,
    turn: Condvar,
}

#[derive(Debug, Default)]
struct GateState {
    in_flight: usize,
    next_ticket: u64,
    now_serving: u64,
}

impl AdmissionGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(GateState::default()),
            turn: Condvar::new(),
        }
    }

    /// Take a slot, blocking until one is free and every earlier caller has
    /// been admitted.
    pub fn acquire(self: &Arc<Self>) -> Permit {
        let mut state = self.state.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;

        while ticket != state.now_serving || state.in_flight >= self.capacity {
            self.turn.wait(&mut state);
        }

        state.now_serving += 1;
        state.in_flight += 1;
        drop(state);

        // the next ticket holder may fit as well
        self.turn.notify_all();
        Permit { gate: self.clone() }
    }

    /// Take a slot only if that needs no waiting.
    pub fn try_acquire(self: &Arc<Self>) -> Option<Permit> {
        let mut state = self.state.lock();
        if state.next_ticket != state.now_serving || state.in_flight >= self.capacity {
            return None;
        }

        state.next_ticket += 1;
        state.now_serving += 1;
        state.in_flight += 1;
        Some(Permit { gate: self.clone() })
    }

    fn release(&self) {
        let mut state = self.state.lock();
        state.in_flight -= 1;
        drop(state);
        self.turn.notify_all();
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// Callers blocked in [`acquire`](Self::acquire).
    pub fn waiting(&self) -> usize {
        let state = self.state.lock();
        (state.next_ticket - state.now_serving) as usize
    }
}

/// A held slot; dropping it frees the slot.
#[derive(Debug)]
pub struct Permit {
    gate: Arc<AdmissionGate>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
