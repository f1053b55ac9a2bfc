//! Per-buffer-slot tick worker threads.
//!
//! Grounded on `internal::CircuitThread` / `internal::ParallelCircuitThread`
//! (`examples/original_source/src/internal/CircuitThread.cpp`): a
//! persistent thread that idles between ticks, signaling "idle" (our
//! `sync` [`Flag`]) and waiting to be kicked off again (our `resume`
//! [`Flag`]). The original's `gotSync`/`gotResume` booleans guarded by one
//! mutex/condvar pair are exactly [`Flag`]'s cleared/set states, so the
//! worker and its controller (`Circuit`) share one `Flag` per direction
//! instead of hand-rolling the handshake again.

use crate::component::ComponentHandle;
use crate::scheduler::flag::Flag;
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One persistent thread dedicated to a single buffer slot, ticking either
/// the full series order (series mode) or a fixed stride of the flattened
/// parallel order (parallel mode, one of `thread_count` workers sharing a
/// buffer row).
pub struct BufferWorker {
    sync: Arc<Flag>,
    resume: Arc<Flag>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BufferWorker {
    /// Start a series worker: ticks every component in `order` in order,
    /// on buffer slot `buffer_no`.
    pub fn spawn_series(order: Arc<ArcSwap<Vec<ComponentHandle>>>, buffer_no: usize) -> Self {
        Self::spawn(move |sync, resume, stop| {
            run(sync, resume, stop, move || {
                for component in order.load().iter() {
                    component.tick_series(buffer_no);
                }
            })
        })
    }

    /// Start one of `thread_count` parallel workers servicing buffer slot
    /// `buffer_no`. `worker_index` selects this worker's stride over the
    /// flattened parallel order (`index % thread_count == worker_index`).
    pub fn spawn_parallel(
        order: Arc<ArcSwap<Vec<ComponentHandle>>>,
        buffer_no: usize,
        worker_index: usize,
        thread_count: usize,
    ) -> Self {
        Self::spawn(move |sync, resume, stop| {
            run(sync, resume, stop, move || {
                for (index, component) in order.load().iter().enumerate() {
                    if index % thread_count == worker_index {
                        component.tick_parallel(buffer_no);
                    }
                }
            })
        })
    }

    fn spawn(
        body: impl FnOnce(Arc<Flag>, Arc<Flag>, Arc<AtomicBool>) + Send + 'static,
    ) -> Self {
        let sync = Arc::new(Flag::new_cleared());
        let resume = Arc::new(Flag::new_cleared());
        let stop = Arc::new(AtomicBool::new(false));

        let thread = {
            let sync = sync.clone();
            let resume = resume.clone();
            let stop = stop.clone();
            std::thread::spawn(move || body(sync, resume, stop))
        };

        let worker = BufferWorker {
            sync,
            resume,
            stop,
            thread: Some(thread),
        };
        worker.sync.wait();
        worker
    }

    /// Block until this worker has finished its current tick and is idle.
    /// Safe to call repeatedly while idle.
    pub fn sync(&self) {
        self.sync.wait();
    }

    /// Wait for idle, then immediately kick off another tick.
    pub fn sync_and_resume(&self) {
        self.sync.wait();
        self.sync.clear();
        self.resume.set();
    }

    /// Kick off another tick without waiting first — used after a separate
    /// prior `sync()` phase has already confirmed every worker in a row is
    /// idle (`Circuit::tick`'s parallel-mode "sync all, then resume all").
    pub fn resume_only(&self) {
        self.sync.clear();
        self.resume.set();
    }

    /// Stop the worker thread, waiting for its current tick (if any) to
    /// finish first.
    pub fn stop(mut self) {
        self.sync.wait();
        self.stop.store(true, Ordering::Release);
        self.sync.clear();
        self.resume.set();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for BufferWorker {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.stop.store(true, Ordering::Release);
            self.resume.set();
            let _ = thread.join();
        }
    }
}

fn run(sync: Arc<Flag>, resume: Arc<Flag>, stop: Arc<AtomicBool>, mut tick: impl FnMut()) {
    loop {
        sync.set();
        resume.wait_and_clear();
        if stop.load(Ordering::Acquire) {
            return;
        }
        tick();
    }
}
