//! Circuits: a managed set of components, their wiring, and the threads
//! that tick them.
//!
//! Grounded on `DSPatch::Circuit` / `internal::Circuit`
//! (`examples/original_source/include/dspatch/Circuit.h`,
//! `examples/original_source/src/Circuit.cpp`). The pause/resume bracket
//! around every mutating operation (`add`, `remove`, `connect`,
//! `disconnect*`, `set_buffer_count`, `set_thread_count`) is load-bearing:
//! it is what makes live re-wiring while an auto-tick driver or manual
//! `tick()` caller is running safe, by guaranteeing no worker is mid-tick
//! while the membership list or a component's wire table changes.

pub mod order;

use crate::component::{ComponentHandle, ComponentId};
use crate::error::ConnectError;
use crate::scheduler::auto_tick::AutoTick;
use crate::scheduler::worker::BufferWorker;
use arc_swap::ArcSwap;
use log::{debug, trace};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// A dataflow circuit: an owned set of components wired together, ticked
/// either manually (one `tick()` per call) or continuously by an
/// auto-tick driver thread.
pub struct Circuit {
    members: Mutex<Vec<ComponentHandle>>,
    component_set: Mutex<HashSet<ComponentId>>,
    series_order: Arc<ArcSwap<Vec<ComponentHandle>>>,
    parallel_order: Arc<ArcSwap<Vec<ComponentHandle>>>,
    dirty: AtomicBool,

    buffer_count: AtomicUsize,
    thread_count: AtomicUsize,
    current_buffer: AtomicUsize,

    series_workers: Mutex<Vec<BufferWorker>>,
    parallel_workers: Mutex<Vec<Vec<BufferWorker>>>,

    auto_tick: Mutex<Option<AutoTick>>,

    /// Populated with a weak reference to the circuit's own `Arc` right
    /// after construction, so `start_auto_tick` can hand the driver thread
    /// an owned `Arc<Circuit>` without requiring every circuit method to
    /// take an awkward `self: Arc<Self>` receiver.
    self_weak: Mutex<Weak<Circuit>>,
}

impl Circuit {
    pub fn new() -> Arc<Self> {
        let circuit = Arc::new(Circuit {
            members: Mutex::new(Vec::new()),
            component_set: Mutex::new(HashSet::new()),
            series_order: Arc::new(ArcSwap::from_pointee(Vec::new())),
            parallel_order: Arc::new(ArcSwap::from_pointee(Vec::new())),
            dirty: AtomicBool::new(false),
            buffer_count: AtomicUsize::new(0),
            thread_count: AtomicUsize::new(0),
            current_buffer: AtomicUsize::new(0),
            series_workers: Mutex::new(Vec::new()),
            parallel_workers: Mutex::new(Vec::new()),
            auto_tick: Mutex::new(None),
            self_weak: Mutex::new(Weak::new()),
        });
        *circuit.self_weak.lock().unwrap_or_else(|e| e.into_inner()) = Arc::downgrade(&circuit);
        circuit
    }

    /// Add a component to the circuit. Returns `false` if it is already a
    /// member.
    pub fn add_component(&self, component: ComponentHandle) -> bool {
        {
            let set = self.component_set.lock().unwrap_or_else(|e| e.into_inner());
            if set.contains(&component.id()) {
                return false;
            }
        }

        component.configure_buffers(
            self.buffer_count.load(Ordering::Acquire).max(1),
            self.current_buffer.load(Ordering::Acquire),
        );

        self.pause_auto_tick();
        self.members.lock().unwrap_or_else(|e| e.into_inner()).push(component.clone());
        self.dirty.store(true, Ordering::Release);
        self.resume_auto_tick();

        self.component_set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(component.id());
        debug!("component {} added to circuit", component.id());
        true
    }

    /// Remove a component, disconnecting it from every other member first.
    /// Returns `false` if it is not a member.
    pub fn remove_component(&self, component: &ComponentHandle) -> bool {
        if !self.component_set.lock().unwrap_or_else(|e| e.into_inner()).contains(&component.id()) {
            return false;
        }

        self.pause_auto_tick();
        self.disconnect_component_locked(component);
        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|c| c.id() != component.id());
        self.dirty.store(true, Ordering::Release);
        self.resume_auto_tick();

        self.component_set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&component.id());
        debug!("component {} removed from circuit", component.id());
        true
    }

    pub fn remove_all_components(&self) {
        self.pause_auto_tick();
        self.members.lock().unwrap_or_else(|e| e.into_inner()).clear();
        self.dirty.store(true, Ordering::Release);
        self.resume_auto_tick();
        self.component_set.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn component_count(&self) -> usize {
        self.members.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Wire `from`'s output `from_output` into `to`'s input `to_input`.
    /// Both components must already be members.
    pub fn connect(
        &self,
        from: &ComponentHandle,
        from_output: usize,
        to: &ComponentHandle,
        to_input: usize,
    ) -> Result<(), ConnectError> {
        {
            let set = self.component_set.lock().unwrap_or_else(|e| e.into_inner());
            if !set.contains(&from.id()) {
                return Err(ConnectError::SourceNotInCircuit);
            }
            if !set.contains(&to.id()) {
                return Err(ConnectError::DestNotInCircuit);
            }
        }

        self.pause_auto_tick();
        let result = to.connect_input(from, from_output, to_input);
        match &result {
            Ok(()) => {
                self.dirty.store(true, Ordering::Release);
                debug!(
                    "wired component {} output {} to component {} input {}",
                    from.id(),
                    from_output,
                    to.id(),
                    to_input
                );
            }
            Err(err) => debug!("rejected wire {}->{}: {err}", from.id(), to.id()),
        }
        self.resume_auto_tick();
        result
    }

    /// Disconnect every wire touching `component`, both its own inputs and
    /// any other member's wire sourced from it.
    pub fn disconnect_component(&self, component: &ComponentHandle) -> bool {
        if !self.component_set.lock().unwrap_or_else(|e| e.into_inner()).contains(&component.id()) {
            return false;
        }

        self.pause_auto_tick();
        self.disconnect_component_locked(component);
        self.resume_auto_tick();
        true
    }

    fn disconnect_component_locked(&self, component: &ComponentHandle) {
        component.disconnect_all_inputs();
        for member in self.members.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            member.disconnect_input_from(component);
        }
        self.dirty.store(true, Ordering::Release);
        debug!("disconnected every wire touching component {}", component.id());
    }

    pub fn disconnect_all_components(&self) {
        self.pause_auto_tick();
        for member in self.members.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            member.disconnect_all_inputs();
        }
        self.dirty.store(true, Ordering::Release);
        self.resume_auto_tick();
    }

    pub fn buffer_count(&self) -> usize {
        self.buffer_count.load(Ordering::Acquire)
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count.load(Ordering::Acquire)
    }

    /// Resize the pipeline depth. `0` means single-buffer, synchronous
    /// ticking with no dedicated worker thread.
    pub fn set_buffer_count(&self, buffer_count: usize) {
        debug!("setting buffer count to {buffer_count}");
        self.pause_auto_tick();

        self.buffer_count.store(buffer_count, Ordering::Release);

        for worker in self.series_workers.lock().unwrap_or_else(|e| e.into_inner()).drain(..) {
            worker.stop();
        }

        if self.thread_count.load(Ordering::Acquire) != 0 {
            let thread_count = self.thread_count.load(Ordering::Acquire);
            self.rebuild_parallel_workers(thread_count);
        } else if buffer_count != 0 {
            let mut workers = self.series_workers.lock().unwrap_or_else(|e| e.into_inner());
            for buffer_no in 0..buffer_count {
                workers.push(BufferWorker::spawn_series(self.series_order.clone(), buffer_no));
            }
        }

        if self.current_buffer.load(Ordering::Acquire) >= buffer_count.max(1) {
            self.current_buffer.store(0, Ordering::Release);
        }

        let effective = buffer_count.max(1);
        let current = self.current_buffer.load(Ordering::Acquire);
        for member in self.members.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            member.configure_buffers(effective, current);
        }

        self.resume_auto_tick();
    }

    /// Set the number of parallel tick workers per buffer row. `0` reverts
    /// to series (one worker thread per buffer slot, no sub-striding).
    pub fn set_thread_count(&self, thread_count: usize) {
        debug!("setting thread count to {thread_count}");
        self.pause_auto_tick();

        self.thread_count.store(thread_count, Ordering::Release);

        for row in self.parallel_workers.lock().unwrap_or_else(|e| e.into_inner()).drain(..) {
            for worker in row {
                worker.stop();
            }
        }

        if thread_count == 0 {
            let buffer_count = self.buffer_count.load(Ordering::Acquire);
            self.resume_auto_tick();
            self.set_buffer_count(buffer_count);
            return;
        }

        self.rebuild_parallel_workers(thread_count);
        self.resume_auto_tick();
    }

    fn rebuild_parallel_workers(&self, thread_count: usize) {
        let rows = self.buffer_count.load(Ordering::Acquire).max(1);
        let mut parallel_workers = self.parallel_workers.lock().unwrap_or_else(|e| e.into_inner());
        *parallel_workers = (0..rows)
            .map(|buffer_no| {
                (0..thread_count)
                    .map(|worker_index| {
                        BufferWorker::spawn_parallel(
                            self.parallel_order.clone(),
                            buffer_no,
                            worker_index,
                            thread_count,
                        )
                    })
                    .collect()
            })
            .collect();
    }

    /// Re-derive the series and parallel tick orders from the current
    /// wiring. Runs automatically on the next `tick()` after any wiring
    /// change; call directly to pre-warm the order ahead of time.
    pub fn optimize(&self) {
        if !self.dirty.load(Ordering::Acquire) {
            return;
        }
        self.pause_auto_tick();
        self.optimize_locked();
        self.resume_auto_tick();
    }

    fn optimize_locked(&self) {
        trace!("scanning tick order");
        let roots = self.members.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let series = order::scan_series(&roots);
        let layers = order::scan_parallel(&roots);
        let parallel = order::flatten_layers(layers);

        debug!(
            "scan finished: {} components in series order, {} parallel layers",
            series.len(),
            layers.len()
        );

        *self.members.lock().unwrap_or_else(|e| e.into_inner()) = series.clone();
        self.series_order.store(Arc::new(series));
        self.parallel_order.store(Arc::new(parallel));
        self.dirty.store(false, Ordering::Release);
    }

    /// Run one tick of the circuit. Optimizes the tick order first if the
    /// wiring has changed since the last tick.
    pub fn tick(&self) {
        if self.dirty.load(Ordering::Acquire) {
            self.optimize_locked();
        }

        let buffer_count = self.buffer_count.load(Ordering::Acquire);
        let thread_count = self.thread_count.load(Ordering::Acquire);

        if buffer_count == 0 && thread_count == 0 {
            for component in self.members.lock().unwrap_or_else(|e| e.into_inner()).iter() {
                component.tick_series(0);
            }
            return;
        }

        let current = self.current_buffer.load(Ordering::Acquire);

        if thread_count != 0 {
            let workers = self.parallel_workers.lock().unwrap_or_else(|e| e.into_inner());
            let row = &workers[current];
            for worker in row {
                worker.sync();
            }
            for worker in row {
                worker.resume_only();
            }
        } else {
            let workers = self.series_workers.lock().unwrap_or_else(|e| e.into_inner());
            workers[current].sync_and_resume();
        }

        if buffer_count != 0 {
            self.current_buffer.store((current + 1) % buffer_count, Ordering::Release);
        }
    }

    /// Block until every worker thread is idle.
    pub fn sync(&self) {
        for worker in self.series_workers.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            worker.sync();
        }
        for row in self.parallel_workers.lock().unwrap_or_else(|e| e.into_inner()).iter() {
            for worker in row {
                worker.sync();
            }
        }
    }

    /// Start a background thread that calls `tick()` continuously until
    /// `stop_auto_tick` or the circuit is dropped.
    pub fn start_auto_tick(&self) {
        let mut auto_tick = self.auto_tick.lock().unwrap_or_else(|e| e.into_inner());
        if auto_tick.is_some() {
            return;
        }
        let circuit = self
            .self_weak
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .upgrade()
            .expect("circuit is always held by an Arc once constructed via Circuit::new");
        *auto_tick = Some(AutoTick::spawn(move || circuit.tick()));
        debug!("auto-tick driver started");
    }

    pub fn stop_auto_tick(&self) {
        if self.auto_tick.lock().unwrap_or_else(|e| e.into_inner()).take().is_some() {
            debug!("auto-tick driver stopped");
        }
        self.sync();
    }

    /// Pause the auto-tick driver (if running) and wait for any in-flight
    /// tick to finish. Reentrant — see [`crate::scheduler::auto_tick::AutoTick`].
    pub fn pause_auto_tick(&self) {
        if let Some(auto_tick) = self.auto_tick.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            trace!("pausing auto-tick driver");
            auto_tick.pause();
        }
        self.sync();
    }

    pub fn resume_auto_tick(&self) {
        if let Some(auto_tick) = self.auto_tick.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            trace!("resuming auto-tick driver");
            auto_tick.resume();
        }
    }
}

impl Drop for Circuit {
    fn drop(&mut self) {
        self.stop_auto_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SignalBus;
    use crate::component::{Component, Process, ProcessOrder};
    use std::sync::atomic::AtomicI64;
    use std::sync::Mutex as StdMutex;

    struct Counter {
        value: AtomicI64,
    }
    impl Process for Counter {
        fn process(&self, _inputs: &mut SignalBus, outputs: &mut SignalBus) {
            let next = self.value.fetch_add(1, Ordering::SeqCst);
            outputs.set(0, next);
        }
    }

    struct Collect {
        seen: Arc<StdMutex<Vec<i64>>>,
    }
    impl Process for Collect {
        fn process(&self, inputs: &mut SignalBus, _outputs: &mut SignalBus) {
            if let Some(&v) = inputs.get::<i64>(0) {
                self.seen.lock().unwrap().push(v);
            }
        }
    }

    #[test]
    fn serial_chain_ticks_in_dependency_order() {
        let circuit = Circuit::new();
        let counter = Component::new(
            ProcessOrder::InOrder,
            vec![],
            vec!["out".into()],
            Counter { value: AtomicI64::new(0) },
        );
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let collect = Component::new(
            ProcessOrder::InOrder,
            vec!["in".into()],
            vec![],
            Collect { seen: seen.clone() },
        );

        assert!(circuit.add_component(counter.clone()));
        assert!(circuit.add_component(collect.clone()));
        circuit.connect(&counter, 0, &collect, 0).unwrap();

        for _ in 0..3 {
            circuit.tick();
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn duplicate_add_returns_false() {
        let circuit = Circuit::new();
        let c = Component::new(ProcessOrder::InOrder, vec![], vec![], Counter { value: AtomicI64::new(0) });
        assert!(circuit.add_component(c.clone()));
        assert!(!circuit.add_component(c));
    }

    #[test]
    fn connect_rejects_non_members() {
        let circuit = Circuit::new();
        let a = Component::new(ProcessOrder::InOrder, vec![], vec!["out".into()], Counter { value: AtomicI64::new(0) });
        let b = Component::new(
            ProcessOrder::InOrder,
            vec!["in".into()],
            vec![],
            Collect { seen: Arc::new(StdMutex::new(Vec::new())) },
        );
        circuit.add_component(b.clone());
        let err = circuit.connect(&a, 0, &b, 0).unwrap_err();
        assert_eq!(err, ConnectError::SourceNotInCircuit);
    }

    #[test]
    fn buffered_tick_runs_across_slots() {
        let circuit = Circuit::new();
        let counter = Component::new(
            ProcessOrder::InOrder,
            vec![],
            vec!["out".into()],
            Counter { value: AtomicI64::new(0) },
        );
        circuit.add_component(counter);
        circuit.set_buffer_count(2);
        for _ in 0..4 {
            circuit.tick();
        }
        circuit.sync();
    }
}
