//! [`BranchAndBoundIlpSolver`]: a depth-first branch-and-bound solver over
//! the Big-M simplex LP relaxation in [`super::simplex`].

use super::simplex::{solve_lp_relaxation, Row, RowKind};
use super::{IlpProblem, IlpSolution, IlpSolver, Sense};

const EPS: f64 = 1e-6;
const DEFAULT_MAX_NODES: usize = 200_000;

/// The crate's built-in [`IlpSolver`]: solves the LP relaxation with a dense
/// Big-M simplex tableau, then branches on fractional integer-constrained
/// variables depth-first, bounding on the relaxation's objective value.
///
/// If the search exhausts `max_nodes` before proving optimality, the best
/// integral solution found so far is returned and a `log::warn!` is emitted;
/// this is a soft safety valve against pathologically large models, not a
/// correctness guarantee.
pub struct BranchAndBoundIlpSolver {
    max_nodes: usize,
}

impl Default for BranchAndBoundIlpSolver {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl BranchAndBoundIlpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_nodes(max_nodes: usize) -> Self {
        Self { max_nodes }
    }
}

struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl IlpSolver for BranchAndBoundIlpSolver {
    fn solve(&self, problem: &IlpProblem) -> IlpSolution {
        let minimize_objective: Vec<f64> = match problem.sense {
            Sense::Min => problem.objective.clone(),
            Sense::Max => problem.objective.iter().map(|c| -c).collect(),
        };

        let base_rows = build_rows(problem);
        let bounds = Bounds {
            lower: vec![0.0; problem.num_vars],
            upper: vec![f64::INFINITY; problem.num_vars],
        };

        let mut best: Option<(Vec<f64>, f64)> = None;
        let mut stack = vec![bounds];
        let mut nodes_explored = 0usize;
        let mut budget_exhausted = false;

        while let Some(bounds) = stack.pop() {
            nodes_explored += 1;
            if nodes_explored > self.max_nodes {
                budget_exhausted = true;
                break;
            }

            let mut rows = base_rows.clone();
            for v in 0..problem.num_vars {
                if bounds.lower[v] > 0.0 {
                    rows.push(single_var_row(problem.num_vars, v, RowKind::Ge, bounds.lower[v]));
                }
                if bounds.upper[v].is_finite() {
                    rows.push(single_var_row(problem.num_vars, v, RowKind::Le, bounds.upper[v]));
                }
            }

            let Some(relaxed) = solve_lp_relaxation(problem.num_vars, &minimize_objective, &rows)
            else {
                continue;
            };

            let relaxed_obj: f64 = minimize_objective
                .iter()
                .zip(&relaxed.x)
                .map(|(c, x)| c * x)
                .sum();
            if let Some((_, best_obj)) = &best {
                if relaxed_obj >= *best_obj - EPS {
                    continue;
                }
            }

            let fractional = problem
                .integer_vars
                .iter()
                .copied()
                .find(|&v| (relaxed.x[v] - relaxed.x[v].round()).abs() > EPS);

            match fractional {
                None => {
                    best = Some((relaxed.x, relaxed_obj));
                }
                Some(v) => {
                    let floor = relaxed.x[v].floor();
                    let ceil = relaxed.x[v].ceil();

                    let mut lower_branch = Bounds {
                        lower: bounds.lower.clone(),
                        upper: bounds.upper.clone(),
                    };
                    lower_branch.upper[v] = lower_branch.upper[v].min(floor);

                    let mut upper_branch = Bounds {
                        lower: bounds.lower.clone(),
                        upper: bounds.upper.clone(),
                    };
                    upper_branch.lower[v] = upper_branch.lower[v].max(ceil);

                    if lower_branch.lower[v] <= lower_branch.upper[v] + EPS {
                        stack.push(lower_branch);
                    }
                    if upper_branch.lower[v] <= upper_branch.upper[v] + EPS {
                        stack.push(upper_branch);
                    }
                }
            }
        }

        if budget_exhausted {
            log::warn!(
                "branch-and-bound exhausted its {}-node budget without proving optimality",
                self.max_nodes
            );
        }

        match best {
            Some((mut x, _)) => {
                for v in &problem.integer_vars {
                    x[*v] = x[*v].round();
                }
                IlpSolution::Optimal(x)
            }
            None => IlpSolution::Infeasible,
        }
    }
}

fn build_rows(problem: &IlpProblem) -> Vec<Row> {
    let mut rows = Vec::new();
    for constraint in &problem.constraints {
        let mut coeffs = vec![0.0; problem.num_vars];
        for (&var, &coeff) in &constraint.coefficients {
            coeffs[var] = coeff;
        }
        if let Some(min) = constraint.min {
            rows.push(Row {
                coeffs: coeffs.clone(),
                kind: RowKind::Ge,
                rhs: min,
            });
        }
        if let Some(max) = constraint.max {
            rows.push(Row {
                coeffs: coeffs.clone(),
                kind: RowKind::Le,
                rhs: max,
            });
        }
    }
    rows
}

fn single_var_row(num_vars: usize, var: usize, kind: RowKind, rhs: f64) -> Row {
    let mut coeffs = vec![0.0; num_vars];
    coeffs[var] = 1.0;
    Row { coeffs, kind, rhs }
}
