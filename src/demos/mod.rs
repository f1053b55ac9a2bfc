//! Small, self-contained [`Process`] implementations used by the
//! integration tests and the `demos/*.rs` examples.
//!
//! Grounded on the original's separate `example/` folder of components
//! (`examples/original_source/example/Dsp{Adder,Oscillator,...}.h`), which
//! exists purely to give the tutorial and test suite something concrete to
//! wire together. Renamed to `demos` here (see [`SPEC_FULL.md`] §1.1) since
//! `examples/` is reserved for the read-only retrieval pack at the
//! workspace root.

use crate::bus::SignalBus;
use crate::component::{Component, ComponentHandle, Process, ProcessOrder};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Zero inputs, one output: emits an increasing `i64` counter value every
/// tick, starting at 0.
pub struct Counter {
    next: AtomicI64,
}

impl Counter {
    pub fn new() -> ComponentHandle {
        Component::new(
            ProcessOrder::InOrder,
            vec![],
            vec!["count".into()],
            Counter { next: AtomicI64::new(0) },
        )
    }
}

impl Process for Counter {
    fn process(&self, _inputs: &mut SignalBus, outputs: &mut SignalBus) {
        let value = self.next.fetch_add(1, Ordering::SeqCst);
        outputs.set(0, value);
    }
}

/// One input, one output: adds a fixed offset `n` to every `i64` it
/// receives. Leaves its output empty on ticks where the input is empty.
pub struct Inc {
    n: i64,
}

impl Inc {
    pub fn new(n: i64) -> ComponentHandle {
        Component::new(ProcessOrder::InOrder, vec!["in".into()], vec!["out".into()], Inc { n })
    }
}

impl Process for Inc {
    fn process(&self, inputs: &mut SignalBus, outputs: &mut SignalBus) {
        if let Some(&value) = inputs.get::<i64>(0) {
            outputs.set(0, value + self.n);
        }
    }
}

/// One input, zero outputs: records every value it receives, in arrival
/// order, for a test or caller to inspect via the shared handle returned
/// alongside the component.
pub struct Probe {
    seen: std::sync::Arc<std::sync::Mutex<Vec<i64>>>,
}

impl Probe {
    /// Returns the component handle together with the shared log of
    /// observed values.
    pub fn new() -> (ComponentHandle, std::sync::Arc<std::sync::Mutex<Vec<i64>>>) {
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let component = Component::new(
            ProcessOrder::InOrder,
            vec!["in".into()],
            vec![],
            Probe { seen: seen.clone() },
        );
        (component, seen)
    }
}

impl Process for Probe {
    fn process(&self, inputs: &mut SignalBus, _outputs: &mut SignalBus) {
        if let Some(&value) = inputs.get::<i64>(0) {
            self.seen.lock().unwrap_or_else(|e| e.into_inner()).push(value);
        }
    }
}

/// Zero inputs, one output: emits a counter value only on every `period`th
/// tick, leaving its output cell empty the rest of the time. Demonstrates
/// that a fan-out consumer sees no value at all (not a stale one) on ticks
/// where the producer chose not to publish.
pub struct SporadicCounter {
    period: u64,
    tick: AtomicU64,
    next: AtomicI64,
}

impl SporadicCounter {
    pub fn new(period: u64) -> ComponentHandle {
        Component::new(
            ProcessOrder::InOrder,
            vec![],
            vec!["count".into()],
            SporadicCounter {
                period: period.max(1),
                tick: AtomicU64::new(0),
                next: AtomicI64::new(0),
            },
        )
    }
}

impl Process for SporadicCounter {
    fn process(&self, _inputs: &mut SignalBus, outputs: &mut SignalBus) {
        let tick = self.tick.fetch_add(1, Ordering::SeqCst);
        if tick % self.period == 0 {
            let value = self.next.fetch_add(1, Ordering::SeqCst);
            outputs.set(0, value);
        }
    }
}

/// One input, zero outputs, built with an explicitly empty output list —
/// a minimal pure-sink component that just counts its non-empty receives.
pub struct NoOutputProbe {
    count: std::sync::Arc<AtomicU64>,
}

impl NoOutputProbe {
    /// Returns the component handle together with the shared receive count.
    pub fn new() -> (ComponentHandle, std::sync::Arc<AtomicU64>) {
        let count = std::sync::Arc::new(AtomicU64::new(0));
        let component = Component::new(
            ProcessOrder::InOrder,
            vec!["in".into()],
            vec![],
            NoOutputProbe { count: count.clone() },
        );
        (component, count)
    }
}

impl Process for NoOutputProbe {
    fn process(&self, inputs: &mut SignalBus, _outputs: &mut SignalBus) {
        if !inputs.cell(0).is_empty() {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Two inputs, one output: sums both `i64` inputs. Treats a missing input
/// as `0`, so it still produces a value with only one side connected.
pub struct Adder;

impl Adder {
    pub fn new() -> ComponentHandle {
        Component::new(
            ProcessOrder::InOrder,
            vec!["in1".into(), "in2".into()],
            vec!["out".into()],
            Adder,
        )
    }
}

impl Process for Adder {
    fn process(&self, inputs: &mut SignalBus, outputs: &mut SignalBus) {
        let a = inputs.get::<i64>(0).copied().unwrap_or(0);
        let b = inputs.get::<i64>(1).copied().unwrap_or(0);
        outputs.set(0, a + b);
    }
}

/// Three inputs, one output: sums all three `i64` inputs, treating a
/// missing input as `0`.
pub struct Sum3;

impl Sum3 {
    pub fn new() -> ComponentHandle {
        Component::new(
            ProcessOrder::InOrder,
            vec!["in1".into(), "in2".into(), "in3".into()],
            vec!["out".into()],
            Sum3,
        )
    }
}

impl Process for Sum3 {
    fn process(&self, inputs: &mut SignalBus, outputs: &mut SignalBus) {
        let a = inputs.get::<i64>(0).copied().unwrap_or(0);
        let b = inputs.get::<i64>(1).copied().unwrap_or(0);
        let c = inputs.get::<i64>(2).copied().unwrap_or(0);
        outputs.set(0, a + b + c);
    }
}

/// One input, one output: forwards its input unchanged. Useful as a
/// branch point or a placeholder in a chain.
pub struct PassThrough;

impl PassThrough {
    pub fn new() -> ComponentHandle {
        Component::new(ProcessOrder::InOrder, vec!["in".into()], vec!["out".into()], PassThrough)
    }
}

impl Process for PassThrough {
    fn process(&self, inputs: &mut SignalBus, outputs: &mut SignalBus) {
        if let Some(&value) = inputs.get::<i64>(0) {
            outputs.set(0, value);
        }
    }
}

/// One input, one output: scales an `f64` input by a fixed factor.
pub struct Gain {
    factor: f64,
}

impl Gain {
    pub fn new(factor: f64) -> ComponentHandle {
        Component::new(ProcessOrder::InOrder, vec!["in".into()], vec!["out".into()], Gain { factor })
    }
}

impl Process for Gain {
    fn process(&self, inputs: &mut SignalBus, outputs: &mut SignalBus) {
        if let Some(&value) = inputs.get::<f64>(0) {
            outputs.set(0, value * self.factor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;

    #[test]
    fn adder_sums_both_inputs() {
        let circuit = Circuit::new();
        let a = Counter::new();
        let b = Inc::new(100);
        let adder = Adder::new();
        let (probe, seen) = Probe::new();

        circuit.add_component(a.clone());
        circuit.add_component(b.clone());
        circuit.add_component(adder.clone());
        circuit.add_component(probe);

        circuit.connect(&a, 0, &adder, 0).unwrap();
        circuit.connect(&a, 0, &b, 0).unwrap();
        circuit.connect(&b, 0, &adder, 1).unwrap();
        circuit.connect(&adder, 0, &probe, 0).unwrap();

        circuit.tick();
        circuit.tick();

        assert_eq!(*seen.lock().unwrap(), vec![100, 102]);
    }

    #[test]
    fn sporadic_counter_leaves_gaps() {
        let circuit = Circuit::new();
        let source = SporadicCounter::new(2);
        let (probe, seen) = Probe::new();
        circuit.add_component(source.clone());
        circuit.add_component(probe);
        circuit.connect(&source, 0, &probe, 0).unwrap();

        for _ in 0..4 {
            circuit.tick();
        }

        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    struct ConstF64(f64);
    impl Process for ConstF64 {
        fn process(&self, _inputs: &mut SignalBus, outputs: &mut SignalBus) {
            outputs.set(0, self.0);
        }
    }

    struct F64Probe(std::sync::Arc<std::sync::Mutex<Vec<f64>>>);
    impl Process for F64Probe {
        fn process(&self, inputs: &mut SignalBus, _outputs: &mut SignalBus) {
            if let Some(&v) = inputs.get::<f64>(0) {
                self.0.lock().unwrap().push(v);
            }
        }
    }

    #[test]
    fn gain_scales_floats() {
        let circuit = Circuit::new();
        let source = Component::new(ProcessOrder::InOrder, vec![], vec!["out".into()], ConstF64(3.0));
        let gain = Gain::new(2.0);
        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let probe = Component::new(ProcessOrder::InOrder, vec!["in".into()], vec![], F64Probe(seen.clone()));

        circuit.add_component(source.clone());
        circuit.add_component(gain.clone());
        circuit.add_component(probe.clone());
        circuit.connect(&source, 0, &gain, 0).unwrap();
        circuit.connect(&gain, 0, &probe, 0).unwrap();

        circuit.tick();
        assert_eq!(*seen.lock().unwrap(), vec![6.0]);
    }
}
