//! Layering operators (pipeline step 1): assign every node a non-negative
//! integer layer such that every link goes from a lower to a strictly
//! higher layer.

mod longest_path;
mod simplex;

pub use longest_path::LongestPath;
pub use simplex::Simplex;

use crate::dag::Dag;
use crate::error::LayoutError;

/// A layering algorithm.
pub trait LayeringAlgorithm<N, E> {
    fn assign_layers(&self, dag: &mut Dag<N, E>) -> Result<(), LayoutError>;
}
