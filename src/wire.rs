//! Wires: immutable edges from a source component's output to a
//! destination component's input.
//!
//! Mirrors `internal::Wire` (`examples/original_source/src/internal/Wire.h`
//! as referenced from `Component.cpp`): `{ fromComponent, fromOutput,
//! toInput }`, held only by the destination. Here the table is indexed
//! directly by input port rather than scanned linearly
//! (`std::find_if` over a `Vec<Wire>` in the original), since "at most one
//! incoming wire per input" lets us store it as `Vec<Option<Wire>>` sized to
//! the input count and address it in O(1) — a small idiomatic-Rust
//! simplification over the original's linear `find_if`/`erase` pattern that
//! preserves the same invariant.

use crate::component::ComponentHandle;

/// A directed edge from `source`'s `from_output` output port into some
/// destination's input port (the destination is implicit: the table this
/// wire lives in).
#[derive(Clone)]
pub struct Wire {
    pub source: ComponentHandle,
    pub from_output: usize,
}

/// Per-destination-component table of incoming wires, indexed by input port.
#[derive(Default, Clone)]
pub struct WireTable {
    inputs: Vec<Option<Wire>>,
}

impl WireTable {
    pub fn with_len(len: usize) -> Self {
        Self {
            inputs: vec![None; len],
        }
    }

    pub fn resize(&mut self, len: usize) {
        self.inputs.resize(len, None);
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn get(&self, to_input: usize) -> Option<&Wire> {
        self.inputs[to_input].as_ref()
    }

    /// Replace the wire at `to_input`, returning the wire that was there
    /// before (if any), so the caller can decrement its source's reference
    /// count.
    pub fn set(&mut self, to_input: usize, wire: Wire) -> Option<Wire> {
        self.inputs[to_input].replace(wire)
    }

    /// Remove the wire at `to_input`, returning it if present.
    pub fn remove(&mut self, to_input: usize) -> Option<Wire> {
        self.inputs[to_input].take()
    }

    /// Remove every wire sourced at `component`, returning the input
    /// indices they occupied (used when disconnecting all inputs from a
    /// particular source, e.g. before removing that source from the
    /// circuit).
    pub fn remove_from_source(&mut self, component: &ComponentHandle) -> Vec<usize> {
        let mut removed = Vec::new();
        for (to_input, slot) in self.inputs.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|w| w.source.id() == component.id()) {
                *slot = None;
                removed.push(to_input);
            }
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Wire)> {
        self.inputs
            .iter()
            .enumerate()
            .filter_map(|(i, w)| w.as_ref().map(|w| (i, w)))
    }
}
