//! End-to-end circuit scenarios, exercising whole tick sequences rather
//! than single units (see `src/**/*.rs` for the unit-level tests).

use flowmesh::demos::{Adder, Counter, Inc, PassThrough, Probe, SporadicCounter, Sum3};
use flowmesh::Circuit;

#[test]
fn serial_chain_propagates_in_order() {
    // A chain of five stages, each adding one: counter -> inc -> inc -> inc
    // -> inc -> inc -> probe.
    let circuit = Circuit::new();
    let counter = Counter::new();
    let stages: Vec<_> = (0..5).map(|_| Inc::new(1)).collect();
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    for stage in &stages {
        circuit.add_component(stage.clone());
    }
    circuit.add_component(probe.clone());

    circuit.connect(&counter, 0, &stages[0], 0).unwrap();
    for pair in stages.windows(2) {
        circuit.connect(&pair[0], 0, &pair[1], 0).unwrap();
    }
    circuit.connect(stages.last().unwrap(), 0, &probe, 0).unwrap();

    for _ in 0..3 {
        circuit.tick();
    }

    // counter emits 0, 1, 2; each of the five stages adds one, so the
    // probe sees the value plus five.
    assert_eq!(*seen.lock().unwrap(), vec![5, 6, 7]);
}

#[test]
fn fan_out_delivers_the_same_value_to_every_consumer() {
    let circuit = Circuit::new();
    let counter = Counter::new();
    let left = Inc::new(100);
    let right = Inc::new(200);
    let (left_probe, left_seen) = Probe::new();
    let (right_probe, right_seen) = Probe::new();

    circuit.add_component(counter.clone());
    circuit.add_component(left.clone());
    circuit.add_component(right.clone());
    circuit.add_component(left_probe.clone());
    circuit.add_component(right_probe.clone());

    circuit.connect(&counter, 0, &left, 0).unwrap();
    circuit.connect(&counter, 0, &right, 0).unwrap();
    circuit.connect(&left, 0, &left_probe, 0).unwrap();
    circuit.connect(&right, 0, &right_probe, 0).unwrap();

    circuit.tick();
    circuit.tick();

    assert_eq!(*left_seen.lock().unwrap(), vec![100, 101]);
    assert_eq!(*right_seen.lock().unwrap(), vec![200, 201]);
}

#[test]
fn fan_in_sums_branches_of_different_depth() {
    // counter feeds three branches of depth 4, 2 and 1 (each a chain of
    // PassThroughs that relays the value unchanged), converging on a
    // three-input sink.
    let circuit = Circuit::new();
    let counter = Counter::new();
    let deep: Vec<_> = (0..4).map(|_| PassThrough::new()).collect();
    let mid: Vec<_> = (0..2).map(|_| PassThrough::new()).collect();
    let shallow = PassThrough::new();
    let sink = Sum3::new();
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    for stage in deep.iter().chain(mid.iter()) {
        circuit.add_component(stage.clone());
    }
    circuit.add_component(shallow.clone());
    circuit.add_component(sink.clone());
    circuit.add_component(probe.clone());

    circuit.connect(&counter, 0, &deep[0], 0).unwrap();
    for pair in deep.windows(2) {
        circuit.connect(&pair[0], 0, &pair[1], 0).unwrap();
    }
    circuit.connect(&counter, 0, &mid[0], 0).unwrap();
    circuit.connect(&mid[0], 0, &mid[1], 0).unwrap();
    circuit.connect(&counter, 0, &shallow, 0).unwrap();

    circuit.connect(deep.last().unwrap(), 0, &sink, 0).unwrap();
    circuit.connect(mid.last().unwrap(), 0, &sink, 1).unwrap();
    circuit.connect(&shallow, 0, &sink, 2).unwrap();
    circuit.connect(&sink, 0, &probe, 0).unwrap();

    circuit.tick();
    circuit.tick();

    // counter = 0, 1 on the two ticks; every branch relays it unchanged,
    // so the sink sees the value tripled each tick.
    assert_eq!(*seen.lock().unwrap(), vec![0, 3]);
}

#[test]
fn feedback_loop_accumulates_with_one_tick_delay() {
    let circuit = Circuit::new();
    let counter = Counter::new();
    let adder = Adder::new();
    let delay = PassThrough::new();
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    circuit.add_component(adder.clone());
    circuit.add_component(delay.clone());
    circuit.add_component(probe.clone());

    circuit.connect(&counter, 0, &adder, 0).unwrap();
    circuit.connect(&adder, 0, &delay, 0).unwrap();
    circuit.connect(&delay, 0, &adder, 1).unwrap();
    circuit.connect(&adder, 0, &probe, 0).unwrap();

    for _ in 0..5 {
        circuit.tick();
    }

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 3, 6, 10]);
}

#[test]
fn direct_self_wire_feeds_back_without_deadlocking() {
    // The literal feedback shape from spec §4.2: a component wired
    // directly back into its own input (adder.out -> adder.in2), with no
    // intermediate stage in between. Accumulates the same running total as
    // `feedback_loop_accumulates_with_one_tick_delay`, one tick later than
    // a fresh value would otherwise appear, since the self-pull reads the
    // previous tick's still-held output before it is cleared.
    let circuit = Circuit::new();
    let counter = Counter::new();
    let adder = Adder::new();
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    circuit.add_component(adder.clone());
    circuit.add_component(probe.clone());

    circuit.connect(&counter, 0, &adder, 0).unwrap();
    circuit.connect(&adder, 0, &adder, 1).unwrap();
    circuit.connect(&adder, 0, &probe, 0).unwrap();

    for _ in 0..5 {
        circuit.tick();
    }

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 3, 6, 10]);
}

#[test]
fn five_parallel_consumers_wrap_around_a_three_thread_stride() {
    // One producer feeding five parallel consumers under three worker
    // threads: the flattened parallel order is [counter, 5 incs, 5
    // probes], so `index % thread_count` wraps twice over within the
    // five-wide consumer layer (indices 1..=5 against thread_count 3),
    // exactly the width spec §8's scenario 2 calls for.
    let circuit = Circuit::new();
    let counter = Counter::new();
    let consumers: Vec<_> = (0..5).map(|i| Inc::new(i as i64 * 10)).collect();
    let probes: Vec<_> = (0..5).map(|_| Probe::new()).collect();

    circuit.add_component(counter.clone());
    for consumer in &consumers {
        circuit.add_component(consumer.clone());
    }
    for (probe, _) in &probes {
        circuit.add_component(probe.clone());
    }

    for consumer in &consumers {
        circuit.connect(&counter, 0, consumer, 0).unwrap();
    }
    for (consumer, (probe, _)) in consumers.iter().zip(&probes) {
        circuit.connect(consumer, 0, probe, 0).unwrap();
    }

    circuit.set_thread_count(3);
    for _ in 0..4 {
        circuit.tick();
    }
    circuit.sync();

    for (i, (_, seen)) in probes.iter().enumerate() {
        let expected: Vec<i64> = (0..4).map(|tick| tick + i as i64 * 10).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
    }
}

#[test]
fn sporadic_producer_leaves_consumer_with_gaps() {
    let circuit = Circuit::new();
    let source = SporadicCounter::new(3);
    let (probe, seen) = Probe::new();

    circuit.add_component(source.clone());
    circuit.add_component(probe.clone());
    circuit.connect(&source, 0, &probe, 0).unwrap();

    for _ in 0..9 {
        circuit.tick();
    }

    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
}

#[test]
fn rewiring_and_thread_count_changes_while_running() {
    let circuit = Circuit::new();
    let counter = Counter::new();
    let inc = Inc::new(1);
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    circuit.add_component(inc.clone());
    circuit.add_component(probe.clone());
    circuit.connect(&counter, 0, &inc, 0).unwrap();
    circuit.connect(&inc, 0, &probe, 0).unwrap();

    circuit.tick();

    // Switch to a parallel scheduler with three worker threads mid-run.
    circuit.set_thread_count(3);
    circuit.tick();
    circuit.tick();

    // Rewire the chain (drop the Inc stage) while the parallel workers
    // are live, then tick again.
    circuit.connect(&counter, 0, &probe, 0).unwrap();
    circuit.tick();

    // Revert to synchronous, single-threaded ticking.
    circuit.set_thread_count(0);
    circuit.set_buffer_count(0);
    circuit.tick();

    let observed = seen.lock().unwrap().clone();
    assert_eq!(observed.len(), 5);
}

#[test]
fn buffered_pipeline_still_advances_every_slot() {
    let circuit = Circuit::new();
    let counter = Counter::new();
    let inc = Inc::new(10);
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    circuit.add_component(inc.clone());
    circuit.add_component(probe.clone());
    circuit.connect(&counter, 0, &inc, 0).unwrap();
    circuit.connect(&inc, 0, &probe, 0).unwrap();

    circuit.set_buffer_count(3);
    for _ in 0..6 {
        circuit.tick();
    }
    circuit.sync();

    assert_eq!(seen.lock().unwrap().len(), 6);
}
