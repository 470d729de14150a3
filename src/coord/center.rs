//! Center coordinate assignment: lays each layer out touching
//! left-to-right, then centers every layer on the widest one.

use super::{any_positive_width, natural_positions, recenter_and_write, CoordAlgorithm};
use crate::dag::Dag;
use crate::error::LayoutError;
use crate::sugi::SugiGraph;

#[derive(Debug, Clone, Copy, Default)]
pub struct Center;

impl Center {
    pub fn new() -> Self {
        Self
    }
}

impl<N, E> CoordAlgorithm<N, E> for Center {
    fn assign_x(&self, _dag: &Dag<N, E>, sugi: &mut SugiGraph) -> Result<f64, LayoutError> {
        if sugi.node_count() > 0 && !any_positive_width(sugi) {
            return Err(LayoutError::ZeroWidth);
        }

        let positions_by_layer: Vec<Vec<f64>> = sugi
            .layers()
            .iter()
            .map(|layer| natural_positions(sugi, layer))
            .collect();
        Ok(recenter_and_write(sugi, positions_by_layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Dag;
    use crate::sugi::build_sugi_graph;

    #[test]
    fn center_square_matches_expected_coordinates() {
        let mut dag: Dag<(), ()> = Dag::new();
        let h = dag.add_node(());
        let l = dag.add_node(());
        let r = dag.add_node(());
        let t = dag.add_node(());
        dag.add_link(h, l, (), 1).unwrap();
        dag.add_link(h, r, (), 1).unwrap();
        dag.add_link(l, t, (), 1).unwrap();
        dag.add_link(r, t, (), 1).unwrap();
        dag.set_layer(h, 0);
        dag.set_layer(l, 1);
        dag.set_layer(r, 1);
        dag.set_layer(t, 2);

        let mut sugi = build_sugi_graph(&dag);
        for i in 0..sugi.node_count() {
            sugi.set_size(crate::sugi::SugiNodeId(i), 1.0, 1.0);
        }

        let width = <Center as CoordAlgorithm<(), ()>>::assign_x(&Center::new(), &dag, &mut sugi).unwrap();
        assert!((width - 2.0).abs() < 1e-7);
        assert!((sugi.x(sugi.real_sugi_id(h)) - 1.0).abs() < 1e-7);
        assert!((sugi.x(sugi.real_sugi_id(l)) - 0.5).abs() < 1e-7);
        assert!((sugi.x(sugi.real_sugi_id(r)) - 1.5).abs() < 1e-7);
        assert!((sugi.x(sugi.real_sugi_id(t)) - 1.0).abs() < 1e-7);
    }

    #[test]
    fn zero_width_everywhere_fails() {
        let mut dag: Dag<(), ()> = Dag::new();
        dag.add_node(());
        let mut sugi = build_sugi_graph(&dag);
        let err = <Center as CoordAlgorithm<(), ()>>::assign_x(&Center::new(), &dag, &mut sugi).unwrap_err();
        assert!(matches!(err, LayoutError::ZeroWidth));
    }
}
