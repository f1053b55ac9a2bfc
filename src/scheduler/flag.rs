//! A binary semaphore used for the release flag (in-order buffer hand-off)
//! and the ready flag (parallel producer/consumer hand-off).
//!
//! The original engine implements this with a raw `std::atomic_flag`
//! (`examples/original_source/src/Component.cpp`, `internal::AtomicFlag`):
//! `Set`/`Clear`/`WaitAndClear` with busy-yield spinning. Design Notes §9
//! explicitly allows the mutex+condvar alternative ("an atomic boolean plus
//! condition variable") and recommends it for the pause barrier specifically
//! "to avoid subtle races with workers already inside their tick loop" — we
//! use it uniformly here, since a spin-yield loop cannot be given a bounded
//! worst case and a condvar wait is the idiomatic blocking primitive the
//! standard library offers (the teacher's own thread coordination, e.g.
//! `circuit/schedule`, likewise favors blocking primitives over spinning).
//!
//! A circuit allocates one or two `Flag`s per component per buffer slot, and
//! a parallel circuit has every worker thread hammering its own slot's
//! flags independently of its neighbors' — exactly the false-sharing
//! scenario `crossbeam_utils::CachePadded` exists for, so each flag's state
//! is padded out to its own cache line.

use crossbeam_utils::CachePadded;
use std::sync::{Condvar, Mutex};

/// `false` ("cleared") means "owned / a waiter should block"; `true`
/// ("set") means "released / a waiter may proceed."
pub struct Flag {
    state: CachePadded<Mutex<bool>>,
    condvar: Condvar,
}

impl Flag {
    /// A flag that starts cleared (waiters block until `set`).
    pub fn new_cleared() -> Self {
        Self {
            state: CachePadded::new(Mutex::new(false)),
            condvar: Condvar::new(),
        }
    }

    /// A flag that starts set (the first waiter proceeds immediately).
    pub fn new_set() -> Self {
        Self {
            state: CachePadded::new(Mutex::new(true)),
            condvar: Condvar::new(),
        }
    }

    /// Block until the flag is set, without clearing it. Repeated calls
    /// return immediately as long as no one clears the flag in between —
    /// used where a caller just needs to observe "idle" rather than claim
    /// a one-shot hand-off (see `Circuit::sync` vs `sync_and_resume`).
    pub fn wait(&self) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while !*guard {
            guard = self
                .condvar
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Block until the flag is set, then atomically clear it and return.
    pub fn wait_and_clear(&self) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while !*guard {
            guard = self
                .condvar
                .wait(guard)
                .unwrap_or_else(|e| e.into_inner());
        }
        *guard = false;
    }

    /// Set the flag and wake any waiter.
    pub fn set(&self) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *guard = true;
        self.condvar.notify_all();
    }

    /// Clear the flag without waiting.
    pub fn clear(&self) {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        *guard = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn set_then_wait_proceeds_immediately() {
        let flag = Flag::new_set();
        flag.wait_and_clear();
    }

    #[test]
    fn wait_blocks_until_set() {
        let flag = Arc::new(Flag::new_cleared());
        let worker = {
            let flag = flag.clone();
            thread::spawn(move || {
                flag.wait_and_clear();
            })
        };
        thread::sleep(Duration::from_millis(20));
        flag.set();
        worker.join().unwrap();
    }
}
