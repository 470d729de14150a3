//! Two-layer sweep decrossing: repeatedly reorders one layer at a time by
//! the median position of its neighbors in a fixed adjacent layer,
//! alternating downward and upward sweeps.

use std::collections::HashMap;

use super::{count_crossings, DecrossAlgorithm};
use crate::error::LayoutError;
use crate::sugi::{SugiGraph, SugiNodeId};

/// Median-heuristic two-layer sweep.
#[derive(Debug, Clone, Copy)]
pub struct TwoLayer {
    iterations: usize,
}

impl Default for TwoLayer {
    fn default() -> Self {
        Self { iterations: 4 }
    }
}

impl TwoLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of down+up sweep pairs; the sweep also stops early
    /// once no layer's order changes.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

fn position_map(layer: &[SugiNodeId]) -> HashMap<SugiNodeId, usize> {
    layer.iter().enumerate().map(|(i, &n)| (n, i)).collect()
}

/// The classic median-of-neighbors aggregation: the middle neighbor position
/// for an odd count, a weighted blend of the two middle positions for an
/// even count so ties split proportionally to how lopsided the neighbor set
/// is rather than always averaging evenly.
fn median_position(positions: &[usize]) -> f64 {
    let len = positions.len();
    let mid = len / 2;
    if len % 2 == 1 {
        positions[mid] as f64
    } else if len == 2 {
        (positions[0] + positions[1]) as f64 / 2.0
    } else {
        let left = positions[mid - 1] as f64 - positions[0] as f64;
        let right = positions[len - 1] as f64 - positions[mid] as f64;
        if left + right == 0.0 {
            (positions[mid - 1] + positions[mid]) as f64 / 2.0
        } else {
            (positions[mid - 1] as f64 * right + positions[mid] as f64 * left) / (left + right)
        }
    }
}

fn reorder_layer(sugi: &mut SugiGraph, layer_idx: usize, use_parents: bool) -> bool {
    let current = sugi.layers()[layer_idx].clone();
    let neighbor_layer_idx = if use_parents {
        layer_idx - 1
    } else {
        layer_idx + 1
    };
    let neighbor_positions = position_map(&sugi.layers()[neighbor_layer_idx]);

    let mut keyed: Vec<(SugiNodeId, f64)> = current
        .iter()
        .enumerate()
        .map(|(i, &node)| {
            let neighbors = if use_parents {
                sugi.parents(node)
            } else {
                sugi.children(node)
            };
            let mut positions: Vec<usize> = neighbors
                .iter()
                .filter_map(|&(nb, _)| neighbor_positions.get(&nb).copied())
                .collect();
            positions.sort_unstable();
            let key = if positions.is_empty() {
                i as f64
            } else {
                median_position(&positions)
            };
            (node, key)
        })
        .collect();

    // `sort_by` is stable: equal keys (including nodes with no neighbors,
    // which all key on their own prior index) keep their relative order.
    keyed.sort_by(|a, b| a.1.partial_cmp(&b.1).expect("layout keys are finite"));

    let reordered: Vec<SugiNodeId> = keyed.into_iter().map(|(n, _)| n).collect();
    let changed = reordered != current;
    sugi.layers_mut()[layer_idx] = reordered;
    changed
}

impl DecrossAlgorithm for TwoLayer {
    fn reorder(&self, sugi: &mut SugiGraph) -> Result<(), LayoutError> {
        let layer_count = sugi.layers().len();
        if layer_count < 2 {
            return Ok(());
        }

        let mut changed = true;
        let mut iteration = 0;
        while changed && iteration < self.iterations {
            changed = false;
            for layer_idx in 1..layer_count {
                changed |= reorder_layer(sugi, layer_idx, true);
            }
            for layer_idx in (0..layer_count - 1).rev() {
                changed |= reorder_layer(sugi, layer_idx, false);
            }
            iteration += 1;
            log::trace!(
                "two-layer sweep {} crossings={}",
                iteration,
                count_crossings(sugi)
            );
        }
        Ok(())
    }
}
