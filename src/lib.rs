//! Layered (Sugiyama-style) layout engine for directed acyclic graphs.
//!
//! The pipeline runs in three stages against an internal dummy-node
//! expansion of the caller's graph: layering assigns every node an integer
//! rank, decrossing reorders nodes within a rank to reduce edge crossings,
//! and coordinate assignment picks a final x for every node. Pick one
//! operator per stage on a [`Layout`] and call [`Layout::run`].
//!
//! ```
//! use sugiyama_layout::{Dag, Layout};
//!
//! let mut dag: Dag<(), ()> = Dag::new();
//! let a = dag.add_node(());
//! let b = dag.add_node(());
//! dag.add_link(a, b, (), 1).unwrap();
//!
//! let result = Layout::new().run(&mut dag).unwrap();
//! assert_eq!(dag.layer(b), 1);
//! assert!(result.width > 0.0);
//! ```

mod dag;
mod error;
mod layout;
mod sugi;
mod util;

pub mod coord;
pub mod decross;
pub mod layering;
pub mod solver;

pub use dag::{Dag, LinkId, NodeId};
pub use error::LayoutError;
pub use layout::{Layout, LayoutResult};
