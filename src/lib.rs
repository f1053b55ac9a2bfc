//! flowmesh: a push-based dataflow tick engine.
//!
//! A circuit is a directed graph of [`component::Component`]s wired output
//! to input. Ticking the circuit pulls each component's inputs from its
//! upstream wires, runs its [`component::Process`], and publishes whatever it
//! produced to its own outputs, in dependency order. Components may be
//! pipelined across several in-flight ticks (multi-buffering) and ticked by
//! a pool of worker threads (parallel scheduling); see [`circuit::Circuit`]
//! for the scheduling modes.
//!
//! # Glossary
//!
//! - **Component**: a node with a fixed number of named input and output
//!   ports and a [`component::Process`] implementation run once per tick.
//! - **Wire**: a directed edge from one component's output port to another's
//!   input port. At most one wire may feed a given input.
//! - **Signal bus**: the fixed-width array of [`value::Value`] cells a
//!   component reads its inputs from and writes its outputs to.
//! - **Tick**: one pass over a circuit's components in dependency order,
//!   each pulling its inputs and running its process.
//! - **Buffer slot**: one of a component's `buffer_count` independent copies
//!   of its input/output busses, enabling several ticks to be in flight at
//!   once (pipelining).
//! - **Series / parallel order**: the two derived orderings over a
//!   circuit's components — a single dependency-respecting sequence, or a
//!   sequence of independent layers — used by the series and parallel
//!   scheduling modes respectively.
//! - **Copy/move/swap rule**: an output with more than one destination is
//!   copied into every destination but the last, which instead receives it
//!   via a swap (so the producer's old allocation becomes available for
//!   reuse next tick).

mod error;

pub mod bus;
pub mod circuit;
pub mod component;
pub mod demos;
pub mod scheduler;
pub mod value;
pub mod wire;

#[cfg(feature = "plugins")]
pub mod plugin;

pub use circuit::Circuit;
pub use component::{Component, ComponentHandle, Process, ProcessOrder};
pub use error::ConnectError;

#[cfg(feature = "plugins")]
pub use error::PluginError;
#[cfg(feature = "plugins")]
pub use plugin::Plugin;
