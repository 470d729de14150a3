use thiserror::Error;

/// Every way a [`crate::layout::Layout::run`] call can fail.
///
/// All variants are fatal to the current call: the engine never retries and
/// never partially writes results back into the caller's [`crate::dag::Dag`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The input DAG is not a valid DAG: a cycle, a self-loop, or a duplicate
    /// parallel link between the same ordered pair of nodes was found.
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// A configuration value is out of range: a negative weight or size, a
    /// width of zero on every node, an argument passed to a zero-argument
    /// constructor, or a rank/group constraint that contradicts itself.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The optimal decrossing operator's size gate rejected the input.
    #[error("graph too large for exact decrossing: {pair_vars} ordering variables exceeds the {limit} limit")]
    GraphTooLarge {
        /// Number of pairwise ordering variables the layer would require.
        pair_vars: usize,
        /// The active gate's limit.
        limit: usize,
    },

    /// The simplex layering ILP was infeasible under the caller's rank/group
    /// constraints.
    #[error("ill-defined layering constraints: {0}")]
    IllDefinedConstraints(String),

    /// The quadratic coordinate assignment objective was not positive
    /// definite (too many zero weights).
    #[error("ill-defined quadratic objective: {0}")]
    IllDefinedObjective(String),

    /// The orchestrator's final non-overlap check failed; this indicates an
    /// internal invariant violation in a coordinate-assignment operator.
    #[error("invalid coordinate assignment: {0}")]
    InvalidCoordAssignment(String),

    /// Every layer has zero height (every node size is (_, 0)).
    #[error("total layout height is zero")]
    ZeroHeight,

    /// No node in a layer (or the whole graph, for `Center`/`Quad`) has
    /// positive width.
    #[error("total layout width is zero")]
    ZeroWidth,
}
