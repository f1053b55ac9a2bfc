//! Series and parallel tick order scans.
//!
//! Grounded on `Component::ScanSeries` / `ScanParallel` / `EndScan`
//! (`examples/original_source/src/Component.cpp`): a depth-first walk over
//! each component's incoming wires that produces a dependency-first order.
//! The original keeps scan state (`_scanPosition`) as a mutable field on
//! each component and resets it with a separate `EndScan` pass; Design Notes
//! §9 calls this out as state that belongs to the *scan*, not the
//! component, so here it lives in a local map keyed by [`ComponentId`] for
//! the duration of a single `Circuit::optimize` call instead.

use crate::component::{ComponentHandle, ComponentId};
use std::collections::HashMap;

/// Post-order DFS: every component's sources appear before it. Ticking
/// components in this order single-threaded guarantees every input is
/// already produced by the time a component runs.
pub fn scan_series(roots: &[ComponentHandle]) -> Vec<ComponentHandle> {
    let mut visited: HashMap<ComponentId, ()> = HashMap::new();
    let mut order = Vec::with_capacity(roots.len());
    for root in roots {
        visit_series(root, &mut visited, &mut order);
    }
    order
}

fn visit_series(
    component: &ComponentHandle,
    visited: &mut HashMap<ComponentId, ()>,
    order: &mut Vec<ComponentHandle>,
) {
    if visited.contains_key(&component.id()) {
        return;
    }
    visited.insert(component.id(), ());
    for source in component.incoming_sources() {
        visit_series(&source, visited, order);
    }
    order.push(component.clone());
}

/// Layered DFS: every component is placed in the layer one past the
/// deepest of its sources (sources with no wires land in layer 0). The
/// flattened, layer-major concatenation of this map is the order parallel
/// workers stride over — it preserves "produce before consume" the same
/// way [`scan_series`] does, while exposing components with no dependency
/// relationship to each other as schedulable concurrently.
pub fn scan_parallel(roots: &[ComponentHandle]) -> Vec<Vec<ComponentHandle>> {
    let mut layer_of: HashMap<ComponentId, usize> = HashMap::new();
    let mut layers: Vec<Vec<ComponentHandle>> = Vec::new();
    for root in roots {
        visit_parallel(root, &mut layer_of, &mut layers);
    }
    layers
}

fn visit_parallel(
    component: &ComponentHandle,
    layer_of: &mut HashMap<ComponentId, usize>,
    layers: &mut Vec<Vec<ComponentHandle>>,
) -> usize {
    if let Some(&layer) = layer_of.get(&component.id()) {
        return layer;
    }

    let mut layer = 0usize;
    for source in component.incoming_sources() {
        let source_layer = visit_parallel(&source, layer_of, layers);
        layer = layer.max(source_layer + 1);
    }

    layer_of.insert(component.id(), layer);
    if layer >= layers.len() {
        layers.resize(layer + 1, Vec::new());
    }
    layers[layer].push(component.clone());
    layer
}

/// Flatten a layer map into the stride-iterated parallel order (spec §4.3
/// "Parallel scheduling"): layer-major, so worker threads assigned disjoint
/// strides across the flattened vector still respect dependency order
/// across layer boundaries.
pub fn flatten_layers(layers: Vec<Vec<ComponentHandle>>) -> Vec<ComponentHandle> {
    layers.into_iter().flatten().collect()
}
