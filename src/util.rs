//! Utility algorithms shared across the pipeline: connected-component
//! partitioning and small pair/triple iteration helpers built on
//! `itertools`, used by the decrossing and coordinate-assignment stages.

use std::collections::HashMap;

use itertools::Itertools;
use petgraph::graph::{NodeIndex, UnGraph};

use crate::dag::{Dag, NodeId};

/// Partitions every node of `dag` into weakly-connected components, returning
/// a map from node to a dense `0..num_components` component index.
///
/// The directed graph's skeleton is mirrored into a `petgraph` undirected
/// graph over the same node indices (cheap: same node count, one edge per
/// link), then labelled via a union-find pass so the returned index is keyed
/// by this crate's [`NodeId`] rather than `petgraph`'s.
pub(crate) fn connected_component_partition<N, E>(dag: &Dag<N, E>) -> HashMap<NodeId, usize> {
    let mut undirected: UnGraph<(), ()> = UnGraph::with_capacity(dag.node_count(), dag.link_count());
    let mut index_map: HashMap<NodeId, NodeIndex> = HashMap::with_capacity(dag.node_count());
    for id in dag.node_ids() {
        index_map.insert(id, undirected.add_node(()));
    }
    for link in dag.link_ids() {
        let (a, b) = dag.link_endpoints(link);
        undirected.add_edge(index_map[&a], index_map[&b], ());
    }

    let mut parent: Vec<usize> = (0..undirected.node_count()).collect();
    fn find(parent: &mut [usize], x: usize) -> usize {
        if parent[x] != x {
            parent[x] = find(parent, parent[x]);
        }
        parent[x]
    }
    for edge in undirected.raw_edges() {
        let a = edge.source().index();
        let b = edge.target().index();
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent[ra] = rb;
        }
    }

    let mut labels: HashMap<usize, usize> = HashMap::new();
    let mut result = HashMap::with_capacity(dag.node_count());
    for id in dag.node_ids() {
        let idx = index_map[&id].index();
        let root = find(&mut parent, idx);
        let next_label = labels.len();
        let label = *labels.entry(root).or_insert(next_label);
        result.insert(id, label);
    }
    result
}

/// Iterates over every adjacent pair `(slice[i], slice[i+1])`.
pub(crate) fn adjacent_pairs<T: Copy>(slice: &[T]) -> impl Iterator<Item = (T, T)> + '_ {
    slice.iter().copied().tuple_windows()
}

/// Iterates over every unordered pair of distinct elements of `slice`.
pub(crate) fn unordered_pairs<T: Copy>(slice: &[T]) -> impl Iterator<Item = (T, T)> + '_ {
    slice.iter().copied().tuple_combinations()
}

/// Iterates over every ordered triple `(slice[i], slice[j], slice[k])` with
/// `i < j < k`, used for triangle-inequality and curvature bookkeeping.
pub(crate) fn ordered_triples<T: Copy>(slice: &[T]) -> impl Iterator<Item = (T, T, T)> + '_ {
    slice.iter().copied().tuple_combinations()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_disconnected_components() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let c = dag.add_node(());
        dag.add_link(a, b, (), 1).unwrap();
        // c is isolated.
        let parts = connected_component_partition(&dag);
        assert_eq!(parts[&a], parts[&b]);
        assert_ne!(parts[&a], parts[&c]);
    }

    #[test]
    fn adjacent_pairs_covers_consecutive_elements() {
        let v = vec![1, 2, 3, 4];
        let pairs: Vec<_> = adjacent_pairs(&v).collect();
        assert_eq!(pairs, vec![(1, 2), (2, 3), (3, 4)]);
    }

    #[test]
    fn unordered_pairs_covers_all_combinations() {
        let v = vec![1, 2, 3];
        let pairs: Vec<_> = unordered_pairs(&v).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
    }
}
