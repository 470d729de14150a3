//! Coordinate-assignment operators (pipeline step 3): assign a real-valued
//! x to every sugi-node within each layer.

mod center;
mod greedy;
mod quad;

pub use center::Center;
pub use greedy::Greedy;
pub use quad::Quad;

use crate::dag::Dag;
use crate::error::LayoutError;
use crate::sugi::{SugiGraph, SugiNodeId};

/// A coordinate-assignment algorithm. Returns the total drawing width.
/// Takes the source `Dag` alongside the sugi-graph since [`Quad`]'s weight
/// accessors are evaluated against the user's node/link payloads.
pub(crate) trait CoordAlgorithm<N, E> {
    fn assign_x(&self, dag: &Dag<N, E>, sugi: &mut SugiGraph) -> Result<f64, LayoutError>;
}

pub(crate) fn any_positive_width(sugi: &SugiGraph) -> bool {
    (0..sugi.node_count()).any(|i| sugi.width(SugiNodeId(i)) > 0.0)
}

/// Lays a layer's nodes left-to-right with centers
/// `(width(prev)+width(cur))/2` apart, i.e. touching with no extra gap.
pub(crate) fn natural_positions(sugi: &SugiGraph, layer: &[SugiNodeId]) -> Vec<f64> {
    let mut positions = Vec::with_capacity(layer.len());
    let mut x = 0.0;
    for (i, &node) in layer.iter().enumerate() {
        let width = sugi.width(node);
        if i == 0 {
            x = width / 2.0;
        } else {
            x += sugi.width(layer[i - 1]) / 2.0 + width / 2.0;
        }
        positions.push(x);
    }
    positions
}

pub(crate) fn layer_span(sugi: &SugiGraph, layer: &[SugiNodeId], positions: &[f64]) -> f64 {
    if layer.is_empty() {
        return 0.0;
    }
    let left = positions[0] - sugi.width(layer[0]) / 2.0;
    let last = layer.len() - 1;
    let right = positions[last] + sugi.width(layer[last]) / 2.0;
    right - left
}

/// Centers every layer's already-assigned positions around the widest
/// layer, writes the result into `sugi`, and returns the total width.
pub(crate) fn recenter_and_write(sugi: &mut SugiGraph, positions_by_layer: Vec<Vec<f64>>) -> f64 {
    let layers = sugi.layers().to_vec();
    let max_width = layers
        .iter()
        .zip(&positions_by_layer)
        .map(|(layer, positions)| layer_span(sugi, layer, positions))
        .fold(0.0_f64, f64::max);

    for (layer, positions) in layers.iter().zip(positions_by_layer.into_iter()) {
        if layer.is_empty() {
            continue;
        }
        let left = positions[0] - sugi.width(layer[0]) / 2.0;
        let width = layer_span(sugi, layer, &positions);
        let shift = (max_width - width) / 2.0 - left;
        for (&node, x) in layer.iter().zip(positions.into_iter()) {
            sugi.set_x(node, x + shift);
        }
    }
    max_width
}
