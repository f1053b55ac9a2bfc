//! Tick scheduling: per-buffer worker threads and the auto-tick driver.
//!
//! Grounded on `internal::CircuitThread` / `internal::ParallelCircuitThread`
//! / `internal::AutoTickThread`
//! (`examples/original_source/src/internal/{CircuitThread,AutoTickThread}.cpp`).

pub mod auto_tick;
pub mod flag;
pub mod worker;
