//! Components: nodes that own per-buffer input/output buses, a wire table,
//! and a user-supplied process function.
//!
//! Grounded on `DSPatch::Component` / `internal::Component`
//! (`examples/original_source/include/dspatch/Component.h`,
//! `examples/original_source/src/Component.cpp`) for the tick/ref-count/scan
//! semantics, and on `dbsp`'s `NodeId` allocation idiom
//! (`circuit_builder.rs`, `Circuit::allocate_id`) for unique component ids —
//! generalized from a per-circuit `Rc<Cell<NodeId>>` counter to a process-wide
//! `AtomicU64`, since components here are constructed independently of any
//! particular circuit and only handed to one afterwards (spec §3
//! "Lifecycles").

use crate::bus::SignalBus;
use crate::error::ConnectError;
use crate::scheduler::flag::Flag;
use crate::wire::{Wire, WireTable};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

static NEXT_COMPONENT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique id assigned to a component when it is constructed.
pub type ComponentId = u64;

/// Shared handle to a component, cloned into wires and circuits alike.
/// A wire holds its source by this shared handle (see [`crate::wire::Wire`]);
/// components never hold a handle to their destination, which is how the
/// engine avoids reference cycles (spec §9, Design Notes).
pub type ComponentHandle = Arc<Component>;

/// Whether a component's buffer slots must be processed in strict circular
/// order, or may run out of order (concurrently) across buffer slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOrder {
    InOrder,
    OutOfOrder,
}

/// The user-supplied leaf behavior of a component.
///
/// Called with `&self` (not `&mut self`): the engine may invoke `process`
/// concurrently from different worker threads on different buffer slots
/// when the component's [`ProcessOrder`] is `OutOfOrder`, so any internal
/// mutable state must use interior mutability and be `Send + Sync` on its
/// own terms. This mirrors the original's plain virtual `Process_` method,
/// which carries the same "must be thread-safe in out-of-order mode"
/// obligation (see the performance tip on `Component` in
/// `examples/original_source/include/dspatch/Component.h`) and the
/// `dyn Fn() + Send + Sync` notify-callback convention `dbsp` uses for its
/// own cross-thread handlers (`operator/communication/exchange.rs`).
pub trait Process: Send + Sync {
    fn process(&self, inputs: &mut SignalBus, outputs: &mut SignalBus);
}

#[derive(Clone, Copy, Default)]
struct RefCount {
    count: u32,
    total: u32,
}

/// A buffer slot's output side: the published signals and their per-output
/// reference counts. Guarded by its own mutex, separate from the input
/// side, so that pulling a wire whose source is the destination itself
/// (a direct feedback loop, spec §4.2 "Feedback") only ever re-locks the
/// output side — never the input-side lock `tick_series`/`tick_parallel`
/// already hold for the duration of the pull phase.
struct OutputSlot {
    output_bus: SignalBus,
    ref_counts: Vec<RefCount>,
}

struct BufferSlot {
    input_bus: Mutex<SignalBus>,
    output: Mutex<OutputSlot>,
}

/// A node in the circuit: fixed input/output port counts, a wire table
/// recording its incoming edges, per-buffer-slot state, and the user's
/// [`Process`] implementation.
pub struct Component {
    id: ComponentId,
    process_order: ProcessOrder,
    process: Box<dyn Process>,
    input_names: Vec<String>,
    output_names: Vec<String>,
    wires: Mutex<WireTable>,
    buffers: RwLock<Vec<BufferSlot>>,
    release_flags: RwLock<Vec<Flag>>,
    ready_flags: RwLock<Vec<Vec<Flag>>>,
}

impl Component {
    fn build(
        process_order: ProcessOrder,
        input_names: Vec<String>,
        output_names: Vec<String>,
        process: impl Process + 'static,
    ) -> Component {
        let component = Component {
            id: NEXT_COMPONENT_ID.fetch_add(1, Ordering::Relaxed),
            process_order,
            process: Box::new(process),
            wires: Mutex::new(WireTable::with_len(input_names.len())),
            buffers: RwLock::new(Vec::new()),
            release_flags: RwLock::new(Vec::new()),
            ready_flags: RwLock::new(Vec::new()),
            input_names,
            output_names,
        };
        component.configure_buffers(1, 0);
        component
    }

    /// Build a new, unattached component with the given port counts and
    /// process behavior. Starts with a single buffer slot, matching the
    /// original constructor's implicit `SetBufferCount(1, 0)`.
    pub fn new(
        process_order: ProcessOrder,
        input_names: Vec<String>,
        output_names: Vec<String>,
        process: impl Process + 'static,
    ) -> ComponentHandle {
        Arc::new(Self::build(process_order, input_names, output_names, process))
    }

    /// Build a component as an owned, boxed value rather than wrapped in a
    /// [`ComponentHandle`]. A circuit only ever stores components behind an
    /// `Arc`; this exists so that a plugin library's factory function
    /// (`flowmesh_create_component`, see `crate::plugin`) has a legitimate
    /// way to construct the `*mut Component` that contract requires — the
    /// factory's caller reclaims it with `Box::from_raw` and wraps it back
    /// into a `ComponentHandle`.
    pub fn new_boxed(
        process_order: ProcessOrder,
        input_names: Vec<String>,
        output_names: Vec<String>,
        process: impl Process + 'static,
    ) -> Box<Component> {
        Box::new(Self::build(process_order, input_names, output_names, process))
    }

    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn process_order(&self) -> ProcessOrder {
        self.process_order
    }

    pub fn input_count(&self) -> usize {
        self.input_names.len()
    }

    pub fn output_count(&self) -> usize {
        self.output_names.len()
    }

    pub fn input_name(&self, index: usize) -> &str {
        self.input_names.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn output_name(&self, index: usize) -> &str {
        self.output_names.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Resize per-buffer state to `buffer_count` slots (minimum 1),
    /// preserving each output's current reference-count total across the
    /// resize, and mark `start_buffer` as the first in-order owner.
    ///
    /// Grounded on `internal::Component::SetBufferCount`
    /// (`examples/original_source/src/Component.cpp`).
    pub fn configure_buffers(&self, buffer_count: usize, start_buffer: usize) {
        let buffer_count = buffer_count.max(1);
        let start_buffer = if start_buffer >= buffer_count { 0 } else { start_buffer };

        let old_totals: Vec<u32> = {
            let buffers = self.buffers.read().unwrap_or_else(|e| e.into_inner());
            match buffers.first() {
                Some(slot) => slot
                    .output
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .ref_counts
                    .iter()
                    .map(|r| r.total)
                    .collect(),
                None => vec![0; self.output_count()],
            }
        };

        let mut new_buffers = Vec::with_capacity(buffer_count);
        for _ in 0..buffer_count {
            new_buffers.push(BufferSlot {
                input_bus: Mutex::new(SignalBus::with_len(self.input_count())),
                output: Mutex::new(OutputSlot {
                    output_bus: SignalBus::with_len(self.output_count()),
                    ref_counts: old_totals.iter().map(|&total| RefCount { count: 0, total }).collect(),
                }),
            });
        }
        *self.buffers.write().unwrap_or_else(|e| e.into_inner()) = new_buffers;

        *self.release_flags.write().unwrap_or_else(|e| e.into_inner()) = (0..buffer_count)
            .map(|i| if i == start_buffer { Flag::new_set() } else { Flag::new_cleared() })
            .collect();

        *self.ready_flags.write().unwrap_or_else(|e| e.into_inner()) = (0..buffer_count)
            .map(|_| (0..self.output_count()).map(|_| Flag::new_cleared()).collect())
            .collect();
    }

    /// Record a new incoming wire at `to_input`, replacing any wire already
    /// there. Fails if the indices are out of range or the exact same wire
    /// already exists there.
    pub fn connect_input(
        &self,
        from: &ComponentHandle,
        from_output: usize,
        to_input: usize,
    ) -> Result<(), ConnectError> {
        if from_output >= from.output_count() {
            return Err(ConnectError::OutputOutOfRange(from_output));
        }
        if to_input >= self.input_count() {
            return Err(ConnectError::InputOutOfRange(to_input));
        }

        let mut wires = self.wires.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(existing) = wires.get(to_input) {
            if existing.source.id() == from.id() && existing.from_output == from_output {
                return Err(ConnectError::DuplicateWire);
            }
        }
        let previous = wires.set(
            to_input,
            Wire {
                source: from.clone(),
                from_output,
            },
        );
        drop(wires);

        if let Some(previous) = previous {
            previous.source.dec_refs(previous.from_output);
        }
        from.inc_refs(from_output);
        Ok(())
    }

    pub fn disconnect_input(&self, to_input: usize) {
        let mut wires = self.wires.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(wire) = wires.remove(to_input) {
            drop(wires);
            wire.source.dec_refs(wire.from_output);
        }
    }

    pub fn disconnect_input_from(&self, from: &ComponentHandle) {
        let mut wires = self.wires.lock().unwrap_or_else(|e| e.into_inner());
        let removed: Vec<usize> = wires
            .iter()
            .filter(|(_, w)| w.source.id() == from.id())
            .map(|(_, w)| w.from_output)
            .collect();
        wires.remove_from_source(from);
        drop(wires);
        for from_output in removed {
            from.dec_refs(from_output);
        }
    }

    pub fn disconnect_all_inputs(&self) {
        let mut wires = self.wires.lock().unwrap_or_else(|e| e.into_inner());
        let all: Vec<(ComponentHandle, usize)> = wires
            .iter()
            .map(|(_, w)| (w.source.clone(), w.from_output))
            .collect();
        *wires = WireTable::with_len(wires.len());
        drop(wires);
        for (source, from_output) in all {
            source.dec_refs(from_output);
        }
    }

    fn inc_refs(&self, output: usize) {
        let buffers = self.buffers.read().unwrap_or_else(|e| e.into_inner());
        for slot in buffers.iter() {
            slot.output.lock().unwrap_or_else(|e| e.into_inner()).ref_counts[output].total += 1;
        }
    }

    fn dec_refs(&self, output: usize) {
        let buffers = self.buffers.read().unwrap_or_else(|e| e.into_inner());
        for slot in buffers.iter() {
            let mut out = slot.output.lock().unwrap_or_else(|e| e.into_inner());
            out.ref_counts[output].total = out.ref_counts[output].total.saturating_sub(1);
        }
    }

    /// Run one tick of buffer slot `buffer_no` in series (single-threaded
    /// or serial-buffered) mode. See spec §4.2 "Series tick".
    pub fn tick_series(&self, buffer_no: usize) {
        let buffers = self.buffers.read().unwrap_or_else(|e| e.into_inner());
        let slot = &buffers[buffer_no];
        let mut input_bus = slot.input_bus.lock().unwrap_or_else(|e| e.into_inner());

        input_bus.clear_all();
        {
            let wires = self.wires.lock().unwrap_or_else(|e| e.into_inner());
            for (to_input, wire) in wires.iter() {
                wire.source
                    .pull_output(buffer_no, wire.from_output, to_input, &mut input_bus, false);
            }
        }

        let mut output = slot.output.lock().unwrap_or_else(|e| e.into_inner());
        output.output_bus.clear_all();

        if self.buffer_count() != 1 && self.process_order == ProcessOrder::InOrder {
            let release_flags = self.release_flags.read().unwrap_or_else(|e| e.into_inner());
            release_flags[buffer_no].wait_and_clear();
            self.process.process(&mut input_bus, &mut output.output_bus);
            let next = (buffer_no + 1) % release_flags.len();
            release_flags[next].set();
        } else {
            self.process.process(&mut input_bus, &mut output.output_bus);
        }
    }

    /// Run one tick of buffer slot `buffer_no` in layered-parallel mode.
    /// See spec §4.2 "Parallel tick".
    pub fn tick_parallel(&self, buffer_no: usize) {
        let buffers = self.buffers.read().unwrap_or_else(|e| e.into_inner());
        let slot = &buffers[buffer_no];
        let mut input_bus = slot.input_bus.lock().unwrap_or_else(|e| e.into_inner());
        let mut output = slot.output.lock().unwrap_or_else(|e| e.into_inner());

        input_bus.clear_all();
        output.output_bus.clear_all();
        drop(output);
        {
            let wires = self.wires.lock().unwrap_or_else(|e| e.into_inner());
            for (to_input, wire) in wires.iter() {
                wire.source
                    .pull_output(buffer_no, wire.from_output, to_input, &mut input_bus, true);
            }
        }
        let mut output = slot.output.lock().unwrap_or_else(|e| e.into_inner());

        if self.buffer_count() != 1 && self.process_order == ProcessOrder::InOrder {
            let release_flags = self.release_flags.read().unwrap_or_else(|e| e.into_inner());
            release_flags[buffer_no].wait_and_clear();
            self.process.process(&mut input_bus, &mut output.output_bus);
            let next = (buffer_no + 1) % release_flags.len();
            release_flags[next].set();
        } else {
            self.process.process(&mut input_bus, &mut output.output_bus);
        }

        let ready_flags = self.ready_flags.read().unwrap_or_else(|e| e.into_inner());
        for (out_index, flag) in ready_flags[buffer_no].iter().enumerate() {
            if output.ref_counts[out_index].total != 0 {
                flag.set();
            }
        }
    }

    /// The copy/move/swap reference-counted signal transfer (spec §4.2).
    /// Called by a *destination* component on its wire's *source* component.
    fn pull_output(
        &self,
        buffer_no: usize,
        from_output: usize,
        to_input: usize,
        dest_bus: &mut SignalBus,
        parallel: bool,
    ) {
        let ready_flags = if parallel {
            Some(self.ready_flags.read().unwrap_or_else(|e| e.into_inner()))
        } else {
            None
        };
        if let Some(flags) = &ready_flags {
            flags[buffer_no][from_output].wait_and_clear();
        }

        let buffers = self.buffers.read().unwrap_or_else(|e| e.into_inner());
        let mut output = buffers[buffer_no].output.lock().unwrap_or_else(|e| e.into_inner());

        if output.output_bus.cell(from_output).is_empty() {
            return;
        }

        let total = output.ref_counts[from_output].total;
        if total == 1 {
            dest_bus.swap_cell(to_input, &mut output.output_bus, from_output);
            return;
        }

        output.ref_counts[from_output].count += 1;
        if output.ref_counts[from_output].count != total {
            dest_bus.copy_cell(to_input, &output.output_bus, from_output);
            if let Some(flags) = &ready_flags {
                flags[buffer_no][from_output].set();
            }
        } else {
            output.ref_counts[from_output].count = 0;
            dest_bus.swap_cell(to_input, &mut output.output_bus, from_output);
        }
    }

    /// Snapshot of this component's incoming wire sources, used by the
    /// circuit's series/parallel scans (spec §4.2 "Ordering scans" — kept
    /// here rather than recursing through `Component` itself, since the
    /// scan state lives externally per Design Notes §9).
    pub fn incoming_sources(&self) -> Vec<ComponentHandle> {
        self.wires
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, w)| w.source.clone())
            .collect()
    }
}
