//! The user-facing DAG model: nodes and links carrying arbitrary payloads,
//! plus the three fields the layout pipeline computes (`layer`, `x`, `y`).
//!
//! Internally a [`Dag`] wraps a `petgraph::graph::DiGraph`. Identity is
//! exposed through the crate's own [`NodeId`]/[`LinkId`] newtypes rather than
//! leaking `petgraph`'s index types, so swapping the internal representation
//! later would not be a breaking change.

use std::collections::HashSet;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::{Bfs, Dfs, DfsPostOrder, EdgeRef};
use petgraph::Direction;

use crate::error::LayoutError;

/// Identifies a node within one [`Dag`]. Not meaningful across different
/// `Dag` instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) NodeIndex);

/// Identifies a link within one [`Dag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) EdgeIndex);

#[derive(Clone)]
pub(crate) struct NodeData<N> {
    pub(crate) payload: N,
    pub(crate) layer: usize,
    pub(crate) x: f64,
    pub(crate) y: f64,
}

#[derive(Clone)]
pub(crate) struct LinkData<E> {
    pub(crate) payload: E,
    pub(crate) count: u32,
    pub(crate) points: Vec<(f64, f64)>,
}

/// A directed acyclic graph of user nodes and links.
///
/// Node and link payloads are generic (`N`, `E`); the three layout-computed
/// fields (`layer`, `x`, `y` on nodes, `points` on links) are meaningless
/// until a [`crate::layout::Layout::run`] call has returned successfully.
#[derive(Clone)]
pub struct Dag<N, E> {
    pub(crate) graph: DiGraph<NodeData<N>, LinkData<E>>,
}

impl<N, E> Default for Dag<N, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, E> Dag<N, E> {
    /// Creates an empty DAG.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
        }
    }

    /// Adds a node carrying `payload` and returns its id.
    pub fn add_node(&mut self, payload: N) -> NodeId {
        NodeId(self.graph.add_node(NodeData {
            payload,
            layer: 0,
            x: 0.0,
            y: 0.0,
        }))
    }

    /// Adds a link `source -> target` carrying `payload`, representing
    /// `count` parallel edges between the same pair of nodes.
    ///
    /// Fails with [`LayoutError::InvalidGraph`] for a self-loop, an unknown
    /// endpoint, or a duplicate link between the same ordered pair (parallel
    /// edges must be expressed via `count`, not via multiple links).
    pub fn add_link(
        &mut self,
        source: NodeId,
        target: NodeId,
        payload: E,
        count: u32,
    ) -> Result<LinkId, LayoutError> {
        if source == target {
            return Err(LayoutError::InvalidGraph(format!(
                "self-loop on node {:?}",
                source.0.index()
            )));
        }
        if self.graph.node_weight(source.0).is_none() || self.graph.node_weight(target.0).is_none() {
            return Err(LayoutError::InvalidGraph(
                "link references a node that does not belong to this graph".to_string(),
            ));
        }
        if count == 0 {
            return Err(LayoutError::InvalidGraph(
                "link count must be at least 1".to_string(),
            ));
        }
        if self.graph.find_edge(source.0, target.0).is_some() {
            return Err(LayoutError::InvalidGraph(format!(
                "duplicate link between {:?} and {:?}; use `count` for parallel edges",
                source.0.index(),
                target.0.index()
            )));
        }
        Ok(LinkId(self.graph.add_edge(
            source.0,
            target.0,
            LinkData {
                payload,
                count,
                points: Vec::new(),
            },
        )))
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Iterates over every node id, in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(NodeId)
    }

    /// Iterates over every link id, in insertion order.
    pub fn link_ids(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.graph.edge_indices().map(LinkId)
    }

    /// The endpoints of a link.
    pub fn link_endpoints(&self, id: LinkId) -> (NodeId, NodeId) {
        let (a, b) = self.graph.edge_endpoints(id.0).expect("valid link id");
        (NodeId(a), NodeId(b))
    }

    /// Shared reference to a node's payload.
    pub fn node(&self, id: NodeId) -> &N {
        &self.graph[id.0].payload
    }

    /// Mutable reference to a node's payload.
    pub fn node_mut(&mut self, id: NodeId) -> &mut N {
        &mut self.graph[id.0].payload
    }

    /// Shared reference to a link's payload.
    pub fn link(&self, id: LinkId) -> &E {
        &self.graph[id.0].payload
    }

    /// Mutable reference to a link's payload.
    pub fn link_mut(&mut self, id: LinkId) -> &mut E {
        &mut self.graph[id.0].payload
    }

    /// Parallel-edge multiplicity recorded on a link.
    pub fn link_count_of(&self, id: LinkId) -> u32 {
        self.graph[id.0].count
    }

    /// The layer assigned to a node by the most recent successful layout
    /// call (`0` before any layout has run).
    pub fn layer(&self, id: NodeId) -> usize {
        self.graph[id.0].layer
    }

    /// The x coordinate assigned to a node by the most recent successful
    /// layout call (`0.0` before any layout has run).
    pub fn x(&self, id: NodeId) -> f64 {
        self.graph[id.0].x
    }

    /// The y coordinate assigned to a node by the most recent successful
    /// layout call (`0.0` before any layout has run).
    pub fn y(&self, id: NodeId) -> f64 {
        self.graph[id.0].y
    }

    /// The polyline control points (source, through any dummy waypoints, to
    /// target) computed for a link by the most recent successful layout
    /// call. Empty before any layout has run.
    pub fn link_points(&self, id: LinkId) -> &[(f64, f64)] {
        &self.graph[id.0].points
    }

    /// Children of `id` together with the link connecting to each and its
    /// multiplicity.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = (NodeId, LinkId, u32)> + '_ {
        self.graph
            .edges_directed(id.0, Direction::Outgoing)
            .map(|e| (NodeId(e.target()), LinkId(e.id()), e.weight().count))
    }

    /// Parents of `id` together with the link connecting from each and its
    /// multiplicity.
    pub fn parents(&self, id: NodeId) -> impl Iterator<Item = (NodeId, LinkId, u32)> + '_ {
        self.graph
            .edges_directed(id.0, Direction::Incoming)
            .map(|e| (NodeId(e.source()), LinkId(e.id()), e.weight().count))
    }

    /// Nodes with no incoming links.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .node_indices()
            .filter(move |&n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(NodeId)
    }

    /// Nodes with no outgoing links.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph
            .node_indices()
            .filter(move |&n| {
                self.graph
                    .neighbors_directed(n, Direction::Outgoing)
                    .next()
                    .is_none()
            })
            .map(NodeId)
    }

    /// Visits every node in pre-order (parents before children), starting
    /// from every root and falling through to any node left unvisited
    /// afterwards (covers disconnected components and, defensively, graphs
    /// with no roots).
    pub fn pre_order(&self) -> Vec<NodeId> {
        self.traverse(|graph, start, order| {
            let mut dfs = Dfs::new(graph, start);
            while let Some(n) = dfs.next(graph) {
                order.push(NodeId(n));
            }
        })
    }

    /// Visits every node in post-order (children before parents).
    pub fn post_order(&self) -> Vec<NodeId> {
        self.traverse(|graph, start, order| {
            let mut dfs = DfsPostOrder::new(graph, start);
            while let Some(n) = dfs.next(graph) {
                order.push(NodeId(n));
            }
        })
    }

    /// Visits every node breadth-first.
    pub fn breadth_first(&self) -> Vec<NodeId> {
        self.traverse(|graph, start, order| {
            let mut bfs = Bfs::new(graph, start);
            while let Some(n) = bfs.next(graph) {
                order.push(NodeId(n));
            }
        })
    }

    /// A topological order over every node (parents before children).
    /// Fails with [`LayoutError::InvalidGraph`] if the graph is cyclic.
    pub(crate) fn topological_order(&self) -> Result<Vec<NodeId>, LayoutError> {
        petgraph::algo::toposort(&self.graph, None)
            .map(|order| order.into_iter().map(NodeId).collect())
            .map_err(|_| LayoutError::InvalidGraph("graph contains a cycle".to_string()))
    }

    fn traverse(
        &self,
        mut visit_from: impl FnMut(&DiGraph<NodeData<N>, LinkData<E>>, NodeIndex, &mut Vec<NodeId>),
    ) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.node_count());
        let mut seen = HashSet::with_capacity(self.node_count());
        let mut starts: Vec<NodeIndex> = self.roots().map(|n| n.0).collect();
        if starts.is_empty() {
            starts.extend(self.graph.node_indices());
        }
        for start in starts {
            if seen.contains(&start) {
                continue;
            }
            let before = order.len();
            visit_from(&self.graph, start, &mut order);
            for n in &order[before..] {
                seen.insert(n.0);
            }
        }
        for n in self.graph.node_indices() {
            if !seen.contains(&n) {
                let before = order.len();
                visit_from(&self.graph, n, &mut order);
                for id in &order[before..] {
                    seen.insert(id.0);
                }
            }
        }
        order
    }

    /// Validates that this is a legal DAG: acyclic (self-loops and duplicate
    /// parallel links are already rejected by [`Dag::add_link`]).
    pub fn validate(&self) -> Result<(), LayoutError> {
        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return Err(LayoutError::InvalidGraph(
                "graph contains a cycle".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn set_layer(&mut self, id: NodeId, layer: usize) {
        self.graph[id.0].layer = layer;
    }

    pub(crate) fn set_xy(&mut self, id: NodeId, x: f64, y: f64) {
        self.graph[id.0].x = x;
        self.graph[id.0].y = y;
    }

    pub(crate) fn set_link_points(&mut self, id: LinkId, points: Vec<(f64, f64)>) {
        self.graph[id.0].points = points;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_self_loop() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        assert!(matches!(
            dag.add_link(a, a, (), 1),
            Err(LayoutError::InvalidGraph(_))
        ));
    }

    #[test]
    fn rejects_duplicate_link() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        dag.add_link(a, b, (), 1).unwrap();
        assert!(matches!(
            dag.add_link(a, b, (), 1),
            Err(LayoutError::InvalidGraph(_))
        ));
    }

    #[test]
    fn rejects_zero_count() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        assert!(matches!(
            dag.add_link(a, b, (), 0),
            Err(LayoutError::InvalidGraph(_))
        ));
    }

    #[test]
    fn detects_cycle() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        dag.add_link(a, b, (), 1).unwrap();
        dag.add_link(b, a, (), 1).unwrap();
        assert!(matches!(dag.validate(), Err(LayoutError::InvalidGraph(_))));
    }

    #[test]
    fn pre_post_breadth_cover_all_nodes() {
        let mut dag: Dag<&str, ()> = Dag::new();
        let a = dag.add_node("a");
        let b = dag.add_node("b");
        let c = dag.add_node("c");
        dag.add_link(a, b, (), 1).unwrap();
        dag.add_link(b, c, (), 1).unwrap();

        let pre = dag.pre_order();
        let post = dag.post_order();
        let bfs = dag.breadth_first();
        for order in [&pre, &post, &bfs] {
            let mut ids: Vec<_> = order.clone();
            ids.sort();
            assert_eq!(ids, {
                let mut all: Vec<_> = dag.node_ids().collect();
                all.sort();
                all
            });
        }
        assert_eq!(pre, vec![a, b, c]);
        assert_eq!(post, vec![c, b, a]);
    }

    #[test]
    fn children_report_multiplicity() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        dag.add_link(a, b, (), 3).unwrap();
        let kids: Vec<_> = dag.children(a).collect();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].2, 3);
    }
}
