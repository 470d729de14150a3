//! The sugi-graph: the internal layered representation with one dummy node
//! inserted per intermediate layer for every link that spans more than one
//! layer, so crossing minimization and coordinate assignment only ever have
//! to reason about unit-length edges.
//!
//! Not part of the crate's public surface — it is built, mutated, and
//! collapsed back into the caller's [`crate::dag::Dag`] entirely within one
//! [`crate::layout::Layout::run`] call.

use std::collections::HashMap;

use crate::dag::{Dag, LinkId, NodeId};

/// Identifies a node of the sugi-graph (real or dummy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct SugiNodeId(pub(crate) usize);

/// A sugi-graph node is either a real user node or a waypoint dummy
/// standing in for one interior layer of a long link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SugiNodeKind {
    Real(NodeId),
    Dummy(LinkId),
}

pub(crate) struct SugiNodeData {
    pub(crate) kind: SugiNodeKind,
    pub(crate) layer: usize,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) x: f64,
    pub(crate) parents: Vec<(SugiNodeId, u32)>,
    pub(crate) children: Vec<(SugiNodeId, u32)>,
}

/// The layered graph with dummies inserted. Owns every dummy node outright;
/// real sugi-nodes only hold a [`NodeId`] back-reference into the `Dag`.
pub(crate) struct SugiGraph {
    nodes: Vec<SugiNodeData>,
    layers: Vec<Vec<SugiNodeId>>,
    /// For every originally long link, the ordered chain of dummy ids
    /// between its source and target (empty for links that span one layer).
    chains: HashMap<LinkId, Vec<SugiNodeId>>,
    real_index: HashMap<NodeId, SugiNodeId>,
}

impl SugiGraph {
    pub(crate) fn layers(&self) -> &[Vec<SugiNodeId>] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut Vec<Vec<SugiNodeId>> {
        &mut self.layers
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn kind(&self, id: SugiNodeId) -> SugiNodeKind {
        self.nodes[id.0].kind
    }

    pub(crate) fn is_real(&self, id: SugiNodeId) -> bool {
        matches!(self.nodes[id.0].kind, SugiNodeKind::Real(_))
    }

    pub(crate) fn real_node(&self, id: SugiNodeId) -> Option<NodeId> {
        match self.nodes[id.0].kind {
            SugiNodeKind::Real(n) => Some(n),
            SugiNodeKind::Dummy(_) => None,
        }
    }

    pub(crate) fn origin_link(&self, id: SugiNodeId) -> Option<LinkId> {
        match self.nodes[id.0].kind {
            SugiNodeKind::Real(_) => None,
            SugiNodeKind::Dummy(link) => Some(link),
        }
    }

    pub(crate) fn layer_of(&self, id: SugiNodeId) -> usize {
        self.nodes[id.0].layer
    }

    pub(crate) fn width(&self, id: SugiNodeId) -> f64 {
        self.nodes[id.0].width
    }

    pub(crate) fn height(&self, id: SugiNodeId) -> f64 {
        self.nodes[id.0].height
    }

    pub(crate) fn set_size(&mut self, id: SugiNodeId, width: f64, height: f64) {
        self.nodes[id.0].width = width;
        self.nodes[id.0].height = height;
    }

    pub(crate) fn x(&self, id: SugiNodeId) -> f64 {
        self.nodes[id.0].x
    }

    pub(crate) fn set_x(&mut self, id: SugiNodeId, x: f64) {
        self.nodes[id.0].x = x;
    }

    pub(crate) fn parents(&self, id: SugiNodeId) -> &[(SugiNodeId, u32)] {
        &self.nodes[id.0].parents
    }

    pub(crate) fn children(&self, id: SugiNodeId) -> &[(SugiNodeId, u32)] {
        &self.nodes[id.0].children
    }

    pub(crate) fn real_sugi_id(&self, node: NodeId) -> SugiNodeId {
        self.real_index[&node]
    }

    /// The ordered chain of dummy ids standing in for `link`'s interior
    /// layers (empty if the link spans exactly one layer).
    pub(crate) fn dummy_chain(&self, link: LinkId) -> &[SugiNodeId] {
        self.chains.get(&link).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterates over every unit-length sugi-link as `(from, to, weight)`.
    pub(crate) fn links(&self) -> impl Iterator<Item = (SugiNodeId, SugiNodeId, u32)> + '_ {
        self.nodes.iter().enumerate().flat_map(|(i, data)| {
            data.children
                .iter()
                .map(move |&(to, weight)| (SugiNodeId(i), to, weight))
        })
    }

    fn push_node(&mut self, kind: SugiNodeKind, layer: usize) -> SugiNodeId {
        let id = SugiNodeId(self.nodes.len());
        self.nodes.push(SugiNodeData {
            kind,
            layer,
            width: 0.0,
            height: 0.0,
            x: 0.0,
            parents: Vec::new(),
            children: Vec::new(),
        });
        while self.layers.len() <= layer {
            self.layers.push(Vec::new());
        }
        self.layers[layer].push(id);
        id
    }

    fn connect(&mut self, from: SugiNodeId, to: SugiNodeId, weight: u32) {
        self.nodes[from.0].children.push((to, weight));
        self.nodes[to.0].parents.push((from, weight));
    }
}

/// Builds a sugi-graph from a DAG whose nodes already carry a valid
/// layering. Every link spanning more than one layer is expanded into a
/// chain of dummy nodes, one per intermediate layer.
pub(crate) fn build_sugi_graph<N, E>(dag: &Dag<N, E>) -> SugiGraph {
    let mut graph = SugiGraph {
        nodes: Vec::with_capacity(dag.node_count()),
        layers: Vec::new(),
        chains: HashMap::new(),
        real_index: HashMap::with_capacity(dag.node_count()),
    };

    for node in dag.node_ids() {
        let layer = dag.layer(node);
        let id = graph.push_node(SugiNodeKind::Real(node), layer);
        graph.real_index.insert(node, id);
    }

    for link in dag.link_ids() {
        let (source, target) = dag.link_endpoints(link);
        let weight = dag.link_count_of(link);
        let source_layer = dag.layer(source);
        let target_layer = dag.layer(target);
        let source_id = graph.real_index[&source];
        let target_id = graph.real_index[&target];

        if target_layer == source_layer + 1 {
            graph.connect(source_id, target_id, weight);
            continue;
        }

        let mut chain = Vec::with_capacity(target_layer - source_layer - 1);
        let mut previous = source_id;
        for layer in (source_layer + 1)..target_layer {
            let dummy = graph.push_node(SugiNodeKind::Dummy(link), layer);
            graph.connect(previous, dummy, weight);
            chain.push(dummy);
            previous = dummy;
        }
        graph.connect(previous, target_id, weight);
        graph.chains.insert(link, chain);
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_link_has_no_dummies() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let link = dag.add_link(a, b, (), 1).unwrap();
        dag.set_layer(a, 0);
        dag.set_layer(b, 1);

        let sugi = build_sugi_graph(&dag);
        assert_eq!(sugi.node_count(), 2);
        assert!(sugi.dummy_chain(link).is_empty());
    }

    #[test]
    fn long_link_gets_one_dummy_per_intermediate_layer() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let link = dag.add_link(a, b, (), 2).unwrap();
        dag.set_layer(a, 0);
        dag.set_layer(b, 3);

        let sugi = build_sugi_graph(&dag);
        assert_eq!(sugi.node_count(), 2 + 2);
        let chain = sugi.dummy_chain(link);
        assert_eq!(chain.len(), 2);
        assert_eq!(sugi.layer_of(chain[0]), 1);
        assert_eq!(sugi.layer_of(chain[1]), 2);
        for &dummy in chain {
            assert!(!sugi.is_real(dummy));
        }
        let a_id = sugi.real_sugi_id(a);
        assert_eq!(sugi.children(a_id)[0].1, 2);
    }
}
