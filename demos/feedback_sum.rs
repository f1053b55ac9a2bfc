//! A running-total loop: `Adder` sums a fresh `Counter` value with its own
//! previous tick's output, fed back through a `PassThrough` stage.
//!
//! The feedback wire (`adder -> delay -> adder`) makes `adder` its own
//! indirect dependency, so it necessarily reads one tick stale on that
//! input; this is the expected contract for cyclic wiring (spec §4.2
//! "Feedback"). Routing the loop through an intermediate stage here is
//! just a choice of topology, not a requirement: a component can equally
//! be wired directly back into its own input (see
//! `direct_self_wire_feeds_back_without_deadlocking` in
//! `tests/scenarios.rs`), with the same one-tick-delay semantics.

use flowmesh::demos::{Adder, Counter, PassThrough, Probe};
use flowmesh::Circuit;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let circuit = Circuit::new();
    let counter = Counter::new();
    let adder = Adder::new();
    let delay = PassThrough::new();
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    circuit.add_component(adder.clone());
    circuit.add_component(delay.clone());
    circuit.add_component(probe.clone());

    circuit.connect(&counter, 0, &adder, 0)?;
    circuit.connect(&adder, 0, &delay, 0)?;
    circuit.connect(&delay, 0, &adder, 1)?;
    circuit.connect(&adder, 0, &probe, 0)?;

    for _ in 0..5 {
        circuit.tick();
    }

    // counter emits 0, 1, 2, 3, 4; each tick's adder output is that plus
    // the previous tick's own output (0 on the first tick, since the
    // feedback input starts out empty): 0, 1, 3, 6, 10.
    println!("running total: {:?}", *seen.lock().unwrap());
    Ok(())
}
