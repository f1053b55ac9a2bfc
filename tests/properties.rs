//! Property tests for the copy/move/swap fan-out rule (spec §4.2): every
//! consumer of a multi-destination output must see the exact value the
//! producer published that tick, regardless of fan-out width or how many
//! ticks have run.

use flowmesh::bus::SignalBus;
use flowmesh::component::{Component, Process, ProcessOrder};
use flowmesh::Circuit;
use proptest::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

struct Source {
    next: AtomicI64,
}
impl Process for Source {
    fn process(&self, _inputs: &mut SignalBus, outputs: &mut SignalBus) {
        outputs.set(0, self.next.fetch_add(1, Ordering::SeqCst));
    }
}

struct Sink {
    seen: Arc<Mutex<Vec<i64>>>,
}
impl Process for Sink {
    fn process(&self, inputs: &mut SignalBus, _outputs: &mut SignalBus) {
        if let Some(&v) = inputs.get::<i64>(0) {
            self.seen.lock().unwrap().push(v);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_fan_out_consumer_sees_the_same_tick_value(fan_out in 1usize..8, ticks in 1usize..6) {
        let circuit = Circuit::new();
        let source = Component::new(
            ProcessOrder::InOrder,
            vec![],
            vec!["out".into()],
            Source { next: AtomicI64::new(0) },
        );
        circuit.add_component(source.clone());

        let mut sinks = Vec::new();
        for _ in 0..fan_out {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Component::new(
                ProcessOrder::InOrder,
                vec!["in".into()],
                vec![],
                Sink { seen: seen.clone() },
            );
            circuit.add_component(sink.clone());
            circuit.connect(&source, 0, &sink, 0).unwrap();
            sinks.push(seen);
        }

        for _ in 0..ticks {
            circuit.tick();
        }

        let expected: Vec<i64> = (0..ticks as i64).collect();
        for seen in &sinks {
            prop_assert_eq!(&*seen.lock().unwrap(), &expected);
        }
    }
}
