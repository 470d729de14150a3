//! Greedy coordinate assignment: a one-pass variant of [`super::Center`]
//! that pulls each node toward the average position of its parents,
//! clamped to respect non-overlap with its left neighbor.

use std::collections::HashMap;

use super::{any_positive_width, natural_positions, recenter_and_write, CoordAlgorithm};
use crate::dag::Dag;
use crate::error::LayoutError;
use crate::sugi::{SugiGraph, SugiNodeId};

#[derive(Debug, Clone, Copy, Default)]
pub struct Greedy;

impl Greedy {
    pub fn new() -> Self {
        Self
    }
}

impl<N, E> CoordAlgorithm<N, E> for Greedy {
    fn assign_x(&self, _dag: &Dag<N, E>, sugi: &mut SugiGraph) -> Result<f64, LayoutError> {
        if sugi.node_count() > 0 && !any_positive_width(sugi) {
            return Err(LayoutError::ZeroWidth);
        }

        let layers = sugi.layers().to_vec();
        let mut positions_by_layer: Vec<Vec<f64>> = Vec::with_capacity(layers.len());
        let mut resolved: HashMap<SugiNodeId, f64> = HashMap::with_capacity(sugi.node_count());

        for (layer_idx, layer) in layers.iter().enumerate() {
            let base = natural_positions(sugi, layer);
            let mut desired = base;
            if layer_idx > 0 {
                for (i, &node) in layer.iter().enumerate() {
                    let parents = sugi.parents(node);
                    if !parents.is_empty() {
                        let sum: f64 = parents.iter().map(|&(p, _)| resolved[&p]).sum();
                        desired[i] = sum / parents.len() as f64;
                    }
                }
            }

            let mut clamped = Vec::with_capacity(layer.len());
            let mut prev_right: Option<f64> = None;
            for (i, &node) in layer.iter().enumerate() {
                let width = sugi.width(node);
                let mut x = desired[i];
                if let Some(right) = prev_right {
                    let min_x = right + width / 2.0;
                    if x < min_x {
                        x = min_x;
                    }
                }
                prev_right = Some(x + width / 2.0);
                clamped.push(x);
            }

            for (&node, &x) in layer.iter().zip(clamped.iter()) {
                resolved.insert(node, x);
            }
            positions_by_layer.push(clamped);
        }

        Ok(recenter_and_write(sugi, positions_by_layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Dag;
    use crate::sugi::build_sugi_graph;
    use crate::util::adjacent_pairs;

    #[test]
    fn respects_non_overlap_on_a_wide_layer() {
        let mut dag: Dag<(), ()> = Dag::new();
        let root = dag.add_node(());
        let children: Vec<_> = (0..5).map(|_| dag.add_node(())).collect();
        for &c in &children {
            dag.add_link(root, c, (), 1).unwrap();
        }
        dag.set_layer(root, 0);
        for &c in &children {
            dag.set_layer(c, 1);
        }

        let mut sugi = build_sugi_graph(&dag);
        for i in 0..sugi.node_count() {
            sugi.set_size(crate::sugi::SugiNodeId(i), 1.0, 1.0);
        }

        <Greedy as CoordAlgorithm<(), ()>>::assign_x(&Greedy::new(), &dag, &mut sugi).unwrap();
        for layer in sugi.layers().to_vec() {
            for (p, q) in adjacent_pairs(&layer) {
                let gap = sugi.x(q) - sugi.x(p);
                assert!(gap >= (sugi.width(p) + sugi.width(q)) / 2.0 - 1e-9);
            }
        }
    }
}
