//! Crossing-minimization operators (pipeline step 2): reorder nodes within
//! each layer of a sugi-graph to reduce edge crossings.

mod optimal;
mod two_layer;

pub use optimal::{OptDecross, SizeGate};
pub use two_layer::TwoLayer;

use std::collections::HashMap;

use crate::error::LayoutError;
use crate::sugi::{SugiGraph, SugiNodeId};

/// A crossing-minimization algorithm operating on an already-built sugi-graph.
pub(crate) trait DecrossAlgorithm {
    fn reorder(&self, sugi: &mut SugiGraph) -> Result<(), LayoutError>;
}

/// Total edge crossings across every adjacent-layer transition, used for
/// diagnostic logging and by the property tests in `tests/layout.rs`.
pub(crate) fn count_crossings(sugi: &SugiGraph) -> usize {
    let mut position: HashMap<SugiNodeId, usize> = HashMap::with_capacity(sugi.node_count());
    for layer in sugi.layers() {
        for (i, &node) in layer.iter().enumerate() {
            position.insert(node, i);
        }
    }

    let mut by_top_layer: HashMap<usize, Vec<(usize, usize)>> = HashMap::new();
    for (from, to, _) in sugi.links() {
        by_top_layer
            .entry(sugi.layer_of(from))
            .or_default()
            .push((position[&from], position[&to]));
    }

    let mut total = 0usize;
    for edges in by_top_layer.values() {
        for i in 0..edges.len() {
            for j in (i + 1)..edges.len() {
                let (a_from, a_to) = edges[i];
                let (b_from, b_to) = edges[j];
                if (a_from < b_from && a_to > b_to) || (a_from > b_from && a_to < b_to) {
                    total += 1;
                }
            }
        }
    }
    total
}
