//! LP/QP solver adapters: abstract interfaces for the two numerical
//! collaborators the pipeline needs, plus one minimal built-in
//! implementation of each so the crate runs without an external solver
//! dependency.
//!
//! [`BranchAndBoundIlpSolver`] and [`ActiveSetQpSolver`] are small textbook
//! implementations rather than a production-grade numerical library. Both
//! traits are public so a caller can plug in a real solver without forking
//! the crate.

mod ilp;
mod qp;
mod simplex;

pub use ilp::BranchAndBoundIlpSolver;
pub use qp::ActiveSetQpSolver;

use std::collections::HashMap;

/// Index of a decision variable within one [`IlpProblem`] or [`QpProblem`].
pub type VarId = usize;

/// Optimization sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Min,
    Max,
}

/// One row of an [`IlpProblem`]: `min <= sum(coefficients[v] * x[v]) <= max`.
///
/// This is a row (constraint)-centric representation, easier to fold into
/// a dense simplex tableau than a variable-centric sparse-coefficient map.
#[derive(Debug, Clone, Default)]
pub struct Constraint {
    pub coefficients: HashMap<VarId, f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Constraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_coeff(mut self, var: VarId, coeff: f64) -> Self {
        self.coefficients.insert(var, coeff);
        self
    }
}

/// An integer-linear program: `num_vars` variables (implicitly bounded below
/// by zero, as is natural for layers and 0/1 ordering indicators), an
/// objective to minimize or maximize, a set of range constraints, and the
/// subset of variables required to take integer values.
#[derive(Debug, Clone)]
pub struct IlpProblem {
    pub sense: Sense,
    pub num_vars: usize,
    pub objective: Vec<f64>,
    pub constraints: Vec<Constraint>,
    pub integer_vars: Vec<VarId>,
}

impl IlpProblem {
    pub fn new(num_vars: usize, sense: Sense) -> Self {
        Self {
            sense,
            num_vars,
            objective: vec![0.0; num_vars],
            constraints: Vec::new(),
            integer_vars: Vec::new(),
        }
    }
}

/// Outcome of [`IlpSolver::solve`].
#[derive(Debug, Clone)]
pub enum IlpSolution {
    /// An optimal (or, for the built-in branch-and-bound solver under its
    /// node budget, best-found) assignment, one value per variable.
    Optimal(Vec<f64>),
    /// The problem has no feasible point.
    Infeasible,
}

/// Abstract integer-linear-program solver.
pub trait IlpSolver {
    fn solve(&self, problem: &IlpProblem) -> IlpSolution;
}

/// A quadratic program: minimize `1/2 x^T Q x + c^T x` subject to
/// `A x >= b`. `q` must be symmetric positive definite.
#[derive(Debug, Clone)]
pub struct QpProblem {
    pub q: Vec<Vec<f64>>,
    pub c: Vec<f64>,
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
}

impl QpProblem {
    pub fn num_vars(&self) -> usize {
        self.c.len()
    }
}

/// Outcome of [`QpSolver::solve`].
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum QpError {
    #[error("quadratic objective matrix is not positive definite")]
    NotPositiveDefinite,
}

/// Abstract quadratic-program solver.
pub trait QpSolver {
    fn solve(&self, problem: &QpProblem) -> Result<Vec<f64>, QpError>;
}
