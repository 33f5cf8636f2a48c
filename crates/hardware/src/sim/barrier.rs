//! Clock barrier.
//!
//! Lock-steps every running core context: nobody starts cycle `K + 1` until all
//! still-active contexts have finished cycle `K`. The last context to arrive runs
//! the release callback while every other context is still parked, which is where
//! the cycle-boundary marker gets emitted.
//!
//! A context whose stream ends (or fails) leaves the barrier instead of arriving,
//! so the remaining contexts keep running without it.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct BarrierState {
    active: usize,
    arrived: usize,
    cycle: u64,
}

/// Reusable cycle barrier with a shrinking participant set.
#[derive(Debug)]
pub struct ClockBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl ClockBarrier {
    /// Creates a barrier for `participants` contexts at cycle 0.
    pub const fn new(participants: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                active: participants,
                arrived: 0,
                cycle: 0,
            }),
            released: Condvar::new(),
        }
    }

    /// Arrives at the barrier and blocks until the current cycle completes.
    ///
    /// The last arriving context calls `on_release` with the number of the
    /// completed cycle (1-based) before anyone is woken.
    ///
    /// # Returns
    ///
    /// The number of the completed cycle.
    pub fn wait(&self, on_release: impl FnOnce(u64)) -> u64 {
        let mut state = self.lock();
        state.arrived += 1;
        let cycle = state.cycle;
        if state.arrived >= state.active {
            return self.release(state, on_release);
        }
        while state.cycle == cycle {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        cycle + 1
    }

    /// Permanently removes one context from the barrier.
    ///
    /// If every remaining context has already arrived, the cycle completes here
    /// and `on_release` runs on the leaving context.
    pub fn leave(&self, on_release: impl FnOnce(u64)) {
        let mut state = self.lock();
        state.active = state.active.saturating_sub(1);
        if state.arrived > 0 && state.arrived >= state.active {
            let _ = self.release(state, on_release);
        }
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.lock().cycle
    }

    /// Number of contexts still taking part.
    pub fn active(&self) -> usize {
        self.lock().active
    }

    fn release(&self, mut state: MutexGuard<'_, BarrierState>, on_release: impl FnOnce(u64)) -> u64 {
        state.cycle += 1;
        state.arrived = 0;
        let cycle = state.cycle;
        on_release(cycle);
        self.released.notify_all();
        cycle
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
