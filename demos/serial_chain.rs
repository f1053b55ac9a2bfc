//! A three-stage serial chain: `Counter -> Inc(10) -> Probe`.
//!
//! Ticks the circuit a few times and prints what the probe observed,
//! demonstrating the default single-threaded, unbuffered scheduling mode
//! (`buffer_count == 0 && thread_count == 0`).

use flowmesh::demos::{Counter, Inc, Probe};
use flowmesh::Circuit;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let circuit = Circuit::new();
    let counter = Counter::new();
    let inc = Inc::new(10);
    let (probe, seen) = Probe::new();

    circuit.add_component(counter.clone());
    circuit.add_component(inc.clone());
    circuit.add_component(probe.clone());

    circuit.connect(&counter, 0, &inc, 0)?;
    circuit.connect(&inc, 0, &probe, 0)?;

    for _ in 0..5 {
        circuit.tick();
    }

    println!("observed: {:?}", *seen.lock().unwrap());
    Ok(())
}
