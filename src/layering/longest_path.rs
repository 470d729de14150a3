//! Longest-path layering: assigns every node the length of its longest
//! path from a root. A proper topological order is used so every parent's
//! layer is finalized before any child is visited, rather than a DFS
//! relaxation, which can under-count a diamond node reached by its shorter
//! parent path first.

use super::LayeringAlgorithm;
use crate::dag::Dag;
use crate::error::LayoutError;

/// Topological longest-path layering. Minimizes total height; layer widths
/// are not optimized (that is left to decrossing/coordinate assignment).
#[derive(Debug, Clone, Copy)]
pub struct LongestPath {
    top_down: bool,
}

impl Default for LongestPath {
    fn default() -> Self {
        Self { top_down: true }
    }
}

impl LongestPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` (the default): every root is assigned layer 0 and layers grow
    /// downward. `false`: every leaf is assigned the maximum layer and
    /// layers grow upward from there.
    pub fn with_top_down(mut self, top_down: bool) -> Self {
        self.top_down = top_down;
        self
    }
}

fn span(count: u32) -> usize {
    if count > 1 {
        2
    } else {
        1
    }
}

impl<N, E> LayeringAlgorithm<N, E> for LongestPath {
    fn assign_layers(&self, dag: &mut Dag<N, E>) -> Result<(), LayoutError> {
        dag.validate()?;
        let order = dag.topological_order()?;

        if self.top_down {
            for &node in &order {
                let layer = dag
                    .parents(node)
                    .map(|(parent, _, count)| dag.layer(parent) + span(count))
                    .max()
                    .unwrap_or(0);
                dag.set_layer(node, layer);
            }
        } else {
            for &node in order.iter().rev() {
                let layer = dag
                    .children(node)
                    .map(|(child, _, count)| dag.layer(child) + span(count))
                    .max()
                    .unwrap_or(0);
                dag.set_layer(node, layer);
            }
            let max_layer = order.iter().map(|&n| dag.layer(n)).max().unwrap_or(0);
            for &node in &order {
                dag.set_layer(node, max_layer - dag.layer(node));
            }
        }

        log::debug!(
            "longest-path layering ({}) assigned {} layers",
            if self.top_down { "top-down" } else { "bottom-up" },
            order
                .iter()
                .map(|&n| dag.layer(n))
                .max()
                .map_or(0, |m| m + 1)
        );
        Ok(())
    }
}
