//! The pipeline orchestrator: wires layering, decrossing, and coordinate
//! assignment into one `Layout::run` call and writes the result back onto
//! the caller's [`Dag`].

use std::rc::Rc;

use crate::coord::{CoordAlgorithm, Quad};
use crate::dag::Dag;
use crate::decross::{count_crossings, DecrossAlgorithm, TwoLayer};
use crate::error::LayoutError;
use crate::layering::{LayeringAlgorithm, Simplex};
use crate::sugi::{build_sugi_graph, SugiNodeId, SugiNodeKind};
use crate::util::adjacent_pairs;

/// The width and height of the finished drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutResult {
    pub width: f64,
    pub height: f64,
}

/// Immutable pipeline configuration. Every `with_*` method returns an
/// independent value; `self` is never mutated.
pub struct Layout<N, E> {
    layering: Rc<dyn LayeringAlgorithm<N, E>>,
    decross: Rc<dyn DecrossAlgorithm>,
    coord: Rc<dyn CoordAlgorithm<N, E>>,
    node_size: Rc<dyn Fn(Option<&N>) -> (f64, f64)>,
    target_size: Option<(f64, f64)>,
}

impl<N, E> Clone for Layout<N, E> {
    fn clone(&self) -> Self {
        Self {
            layering: self.layering.clone(),
            decross: self.decross.clone(),
            coord: self.coord.clone(),
            node_size: self.node_size.clone(),
            target_size: self.target_size,
        }
    }
}

impl<N: 'static, E: 'static> Default for Layout<N, E> {
    fn default() -> Self {
        Self {
            layering: Rc::new(Simplex::<N>::new()),
            decross: Rc::new(TwoLayer::new()),
            coord: Rc::new(Quad::<N, E>::new()),
            node_size: Rc::new(|node: Option<&N>| {
                if node.is_some() {
                    (1.0, 1.0)
                } else {
                    (0.0, 0.0)
                }
            }),
            target_size: None,
        }
    }
}

impl<N: 'static, E: 'static> Layout<N, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layering(mut self, layering: impl LayeringAlgorithm<N, E> + 'static) -> Self {
        self.layering = Rc::new(layering);
        self
    }

    pub(crate) fn with_decross_internal(mut self, decross: impl DecrossAlgorithm + 'static) -> Self {
        self.decross = Rc::new(decross);
        self
    }

    pub(crate) fn with_coord_internal(mut self, coord: impl CoordAlgorithm<N, E> + 'static) -> Self {
        self.coord = Rc::new(coord);
        self
    }

    /// Widths/heights for real nodes (`Some(payload)`) and dummy waypoints
    /// (`None`); called exactly once per sugi-node for the duration of one
    /// `run` call.
    pub fn with_node_size(mut self, node_size: impl Fn(Option<&N>) -> (f64, f64) + 'static) -> Self {
        self.node_size = Rc::new(node_size);
        self
    }

    /// Scales the finished drawing into a `(width, height)` bounding box.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.target_size = Some((width, height));
        self
    }

    /// Runs the full pipeline and writes `layer`, `x`, `y`, and link control
    /// points back onto `dag`. On failure `dag` may already carry updated
    /// `layer` values from the layering step, but no `x`/`y`/points are
    /// written until every later step has succeeded.
    pub fn run(&self, dag: &mut Dag<N, E>) -> Result<LayoutResult, LayoutError> {
        dag.validate()?;

        self.layering.assign_layers(dag)?;

        let mut sugi = build_sugi_graph(dag);
        log::debug!(
            "sugi-graph built: {} nodes across {} layers",
            sugi.node_count(),
            sugi.layers().len()
        );

        for i in 0..sugi.node_count() {
            let id = SugiNodeId(i);
            let (width, height) = match sugi.kind(id) {
                SugiNodeKind::Real(node) => (self.node_size)(Some(dag.node(node))),
                SugiNodeKind::Dummy(_) => (self.node_size)(None),
            };
            if width < 0.0 || height < 0.0 {
                return Err(LayoutError::InvalidConfig(
                    "node size accessor returned a negative width or height".to_string(),
                ));
            }
            sugi.set_size(id, width, height);
        }

        let layer_height: Vec<f64> = sugi
            .layers()
            .iter()
            .map(|layer| layer.iter().map(|&n| sugi.height(n)).fold(0.0, f64::max))
            .collect();
        let mut layer_y = vec![0.0; layer_height.len()];
        let mut cursor = 0.0;
        for (idx, &height) in layer_height.iter().enumerate() {
            layer_y[idx] = cursor + height / 2.0;
            cursor += height;
        }
        let total_height = cursor;
        if total_height == 0.0 {
            return Err(LayoutError::ZeroHeight);
        }

        self.decross.reorder(&mut sugi)?;
        log::debug!(
            "decrossing complete: {} crossings remain",
            count_crossings(&sugi)
        );

        let total_width = self.coord.assign_x(dag, &mut sugi)?;

        for layer in sugi.layers() {
            for (p, q) in adjacent_pairs(layer) {
                let min_gap = (sugi.width(p) + sugi.width(q)) / 2.0;
                if sugi.x(q) - sugi.x(p) < min_gap - 1e-6 {
                    return Err(LayoutError::InvalidCoordAssignment(
                        "adjacent nodes overlap after coordinate assignment".to_string(),
                    ));
                }
            }
        }

        let (scale_x, scale_y) = match self.target_size {
            Some((w, h)) => (w / total_width, h / total_height),
            None => (1.0, 1.0),
        };

        let node_ids: Vec<_> = dag.node_ids().collect();
        for node in node_ids {
            let id = sugi.real_sugi_id(node);
            let layer = sugi.layer_of(id);
            dag.set_xy(node, sugi.x(id) * scale_x, layer_y[layer] * scale_y);
        }

        let link_ids: Vec<_> = dag.link_ids().collect();
        for link in link_ids {
            let (source, target) = dag.link_endpoints(link);
            let mut points = Vec::new();
            let source_id = sugi.real_sugi_id(source);
            points.push((
                sugi.x(source_id) * scale_x,
                layer_y[sugi.layer_of(source_id)] * scale_y,
            ));
            for &dummy in sugi.dummy_chain(link) {
                points.push((sugi.x(dummy) * scale_x, layer_y[sugi.layer_of(dummy)] * scale_y));
            }
            let target_id = sugi.real_sugi_id(target);
            points.push((
                sugi.x(target_id) * scale_x,
                layer_y[sugi.layer_of(target_id)] * scale_y,
            ));
            dag.set_link_points(link, points);
        }

        log::debug!(
            "layout complete: {:.3} x {:.3}",
            total_width * scale_x,
            total_height * scale_y
        );

        Ok(LayoutResult {
            width: total_width * scale_x,
            height: total_height * scale_y,
        })
    }
}

/// The decrossing and coordinate-assignment operators are chosen through
/// these concrete wrapper methods rather than a generic `impl Trait` bound:
/// `DecrossAlgorithm`/`CoordAlgorithm` both operate on the crate-internal
/// `SugiGraph`, so the traits themselves stay `pub(crate)` and cannot
/// appear in a public method's bounds.
impl<N: 'static, E: 'static> Layout<N, E> {
    pub fn with_two_layer_decross(self, decross: TwoLayer) -> Self {
        self.with_decross_internal(decross)
    }

    pub fn with_opt_decross(self, decross: crate::decross::OptDecross) -> Self {
        self.with_decross_internal(decross)
    }

    pub fn with_center_coord(self, coord: crate::coord::Center) -> Self {
        self.with_coord_internal(coord)
    }

    pub fn with_greedy_coord(self, coord: crate::coord::Greedy) -> Self {
        self.with_coord_internal(coord)
    }

    pub fn with_quad_coord(self, coord: Quad<N, E>) -> Self {
        self.with_coord_internal(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Center;
    use crate::decross::OptDecross;
    use crate::layering::LongestPath;

    #[test]
    fn simple_chain_gets_equal_x_and_unit_width() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let c = dag.add_node(());
        dag.add_link(a, b, (), 1).unwrap();
        dag.add_link(b, c, (), 1).unwrap();

        let result = Layout::new().run(&mut dag).unwrap();
        assert_eq!(dag.layer(a), 0);
        assert_eq!(dag.layer(b), 1);
        assert_eq!(dag.layer(c), 2);
        assert!((dag.x(a) - dag.x(b)).abs() < 1e-6);
        assert!((dag.x(b) - dag.x(c)).abs() < 1e-6);
        assert!((result.width - 1.0).abs() < 1e-6);
    }

    #[test]
    fn diamond_sink_is_centered_between_its_parents() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let c = dag.add_node(());
        let d = dag.add_node(());
        dag.add_link(a, b, (), 1).unwrap();
        dag.add_link(a, c, (), 1).unwrap();
        dag.add_link(b, d, (), 1).unwrap();
        dag.add_link(c, d, (), 1).unwrap();

        Layout::new().run(&mut dag).unwrap();
        assert_eq!(dag.layer(b), 1);
        assert_eq!(dag.layer(c), 1);
        assert_eq!(dag.layer(d), 2);
        assert!(dag.x(b) != dag.x(c));
        assert!((dag.x(d) - (dag.x(b) + dag.x(c)) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn long_edge_with_multiplicity_spans_two_layers() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let link = dag.add_link(a, b, (), 2).unwrap();

        Layout::new()
            .with_layering(LongestPath::new())
            .run(&mut dag)
            .unwrap();
        assert_eq!(dag.layer(b) - dag.layer(a), 2);
        assert_eq!(dag.link_points(link).len(), 3);
    }

    #[test]
    fn zero_width_node_fails_with_center_coord() {
        let mut dag: Dag<(), ()> = Dag::new();
        dag.add_node(());

        let err = Layout::new()
            .with_center_coord(Center::new())
            .with_node_size(|_| (0.0, 0.0))
            .run(&mut dag)
            .unwrap_err();
        assert!(matches!(err, LayoutError::ZeroWidth));
    }

    #[test]
    fn scaling_to_a_target_size_matches_post_hoc_scaling() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let c = dag.add_node(());
        dag.add_link(a, b, (), 1).unwrap();
        dag.add_link(b, c, (), 1).unwrap();

        let mut unscaled: Dag<(), ()> = Dag::new();
        let ua = unscaled.add_node(());
        let ub = unscaled.add_node(());
        let uc = unscaled.add_node(());
        unscaled.add_link(ua, ub, (), 1).unwrap();
        unscaled.add_link(ub, uc, (), 1).unwrap();

        let layout = Layout::new();
        let base = layout.clone().run(&mut unscaled).unwrap();
        let scaled = layout.with_size(20.0, 40.0).run(&mut dag).unwrap();

        let sx = 20.0 / base.width;
        let sy = 40.0 / base.height;
        assert!((dag.x(b) - unscaled.x(ub) * sx).abs() < 1e-6);
        assert!((dag.y(b) - unscaled.y(ub) * sy).abs() < 1e-6);
    }

    #[test]
    fn opt_decross_is_selectable() {
        let mut dag: Dag<(), ()> = Dag::new();
        let a = dag.add_node(());
        let b = dag.add_node(());
        let x = dag.add_node(());
        let y = dag.add_node(());
        dag.add_link(a, y, (), 1).unwrap();
        dag.add_link(b, x, (), 1).unwrap();

        Layout::new()
            .with_opt_decross(OptDecross::new())
            .run(&mut dag)
            .unwrap();
    }
}
