//! Exact integer-program decrossing: one binary ordering variable per
//! unordered pair of nodes within a layer, transitivity enforced by
//! triangle inequalities, and a penalty slack variable per pair of
//! adjacent-layer edges that cross under a given ordering.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use super::DecrossAlgorithm;
use crate::error::LayoutError;
use crate::solver::{BranchAndBoundIlpSolver, Constraint, IlpProblem, IlpSolution, IlpSolver, Sense};
use crate::sugi::{SugiGraph, SugiNodeId};
use crate::util::ordered_triples;

/// Size gate on the total number of ordering variables (summed over every
/// layer), guarding against the ILP blowing up on large inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeGate {
    Small,
    Medium,
    Large,
}

impl Default for SizeGate {
    fn default() -> Self {
        SizeGate::Small
    }
}

impl SizeGate {
    fn limit(self) -> Option<usize> {
        match self {
            SizeGate::Small => Some(400),
            SizeGate::Medium => Some(1200),
            SizeGate::Large => None,
        }
    }
}

/// Exact pairwise-ordering IP decrossing.
pub struct OptDecross {
    solver: Rc<dyn IlpSolver>,
    size: SizeGate,
}

impl Clone for OptDecross {
    fn clone(&self) -> Self {
        Self {
            solver: self.solver.clone(),
            size: self.size,
        }
    }
}

impl Default for OptDecross {
    fn default() -> Self {
        Self {
            solver: Rc::new(BranchAndBoundIlpSolver::new()),
            size: SizeGate::default(),
        }
    }
}

impl OptDecross {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: impl IlpSolver + 'static) -> Self {
        self.solver = Rc::new(solver);
        self
    }

    pub fn with_size(mut self, size: SizeGate) -> Self {
        self.size = size;
        self
    }
}

/// The affine expression for "is `y` placed after `x`", expressed in terms
/// of the canonical (smaller-id-first) pairwise variable: `coeff * var +
/// const`. Avoids ever storing two variables for the same unordered pair.
fn after_expr(
    pair_var: &HashMap<(SugiNodeId, SugiNodeId), usize>,
    x: SugiNodeId,
    y: SugiNodeId,
) -> (usize, f64, f64) {
    if x < y {
        (pair_var[&(x, y)], 1.0, 0.0)
    } else {
        (pair_var[&(y, x)], -1.0, 1.0)
    }
}

fn is_after(
    values: &[f64],
    pair_var: &HashMap<(SugiNodeId, SugiNodeId), usize>,
    a: SugiNodeId,
    b: SugiNodeId,
) -> bool {
    let (var, coeff, constant) = after_expr(pair_var, a, b);
    coeff * values[var] + constant > 0.5
}

impl DecrossAlgorithm for OptDecross {
    fn reorder(&self, sugi: &mut SugiGraph) -> Result<(), LayoutError> {
        let layers: Vec<Vec<SugiNodeId>> = sugi.layers().to_vec();

        let mut original_pos: HashMap<SugiNodeId, usize> = HashMap::with_capacity(sugi.node_count());
        for layer in &layers {
            for (i, &node) in layer.iter().enumerate() {
                original_pos.insert(node, i);
            }
        }

        let mut pair_var: HashMap<(SugiNodeId, SugiNodeId), usize> = HashMap::new();
        for layer in &layers {
            for i in 0..layer.len() {
                for j in (i + 1)..layer.len() {
                    let (a, b) = (layer[i], layer[j]);
                    let key = if a < b { (a, b) } else { (b, a) };
                    let next_id = pair_var.len();
                    pair_var.entry(key).or_insert(next_id);
                }
            }
        }
        let num_ordering_vars = pair_var.len();

        if let Some(limit) = self.size.limit() {
            if num_ordering_vars > limit {
                return Err(LayoutError::GraphTooLarge {
                    pair_vars: num_ordering_vars,
                    limit,
                });
            }
        }

        if num_ordering_vars == 0 {
            return Ok(());
        }

        let mut slack_pairs: Vec<(SugiNodeId, SugiNodeId, SugiNodeId, SugiNodeId)> = Vec::new();
        for layer_idx in 0..layers.len().saturating_sub(1) {
            let edges: Vec<(SugiNodeId, SugiNodeId)> = sugi
                .links()
                .filter(|&(from, _, _)| sugi.layer_of(from) == layer_idx)
                .map(|(from, to, _)| (from, to))
                .collect();
            for i in 0..edges.len() {
                for j in (i + 1)..edges.len() {
                    let (p1, c1) = edges[i];
                    let (p2, c2) = edges[j];
                    if p1 == p2 || c1 == c2 {
                        continue;
                    }
                    slack_pairs.push((p1, c1, p2, c2));
                }
            }
        }

        let total_vars = num_ordering_vars + slack_pairs.len();
        let mut problem = IlpProblem::new(total_vars, Sense::Min);
        problem.integer_vars = (0..num_ordering_vars).collect();

        let epsilon = 1.0 / (num_ordering_vars as f64 + 1.0);
        for (&(a, b), &var) in &pair_var {
            // Nudge the solver toward the original relative order of a, b
            // when the objective is otherwise indifferent.
            let bias = if original_pos[&a] < original_pos[&b] {
                -epsilon
            } else {
                epsilon
            };
            problem.objective[var] += bias;
        }

        for layer in &layers {
            for (a, b, c) in ordered_triples(layer) {
                let (var_ab, coeff_ab, const_ab) = after_expr(&pair_var, a, b);
                let (var_ac, coeff_ac, const_ac) = after_expr(&pair_var, a, c);
                let (var_bc, coeff_bc, const_bc) = after_expr(&pair_var, b, c);
                let offset = const_ab - const_ac + const_bc;
                problem.constraints.push(
                    Constraint::new()
                        .with_coeff(var_ab, coeff_ab)
                        .with_coeff(var_ac, -coeff_ac)
                        .with_coeff(var_bc, coeff_bc)
                        .with_min(-offset)
                        .with_max(1.0 - offset),
                );
            }
        }

        for (idx, &(p1, c1, p2, c2)) in slack_pairs.iter().enumerate() {
            let slack = num_ordering_vars + idx;
            problem.objective[slack] += 1.0;

            let (var_top, coeff_top, const_top) = after_expr(&pair_var, p1, p2);
            let (var_bot, coeff_bot, const_bot) = after_expr(&pair_var, c1, c2);
            let offset = const_top - const_bot;

            // s >= after(p1,p2) - after(c1,c2)
            problem.constraints.push(
                Constraint::new()
                    .with_coeff(slack, 1.0)
                    .with_coeff(var_top, -coeff_top)
                    .with_coeff(var_bot, coeff_bot)
                    .with_min(offset),
            );
            // s >= after(c1,c2) - after(p1,p2)
            problem.constraints.push(
                Constraint::new()
                    .with_coeff(slack, 1.0)
                    .with_coeff(var_top, coeff_top)
                    .with_coeff(var_bot, -coeff_bot)
                    .with_min(-offset),
            );
        }

        let values = match self.solver.solve(&problem) {
            IlpSolution::Optimal(values) => values,
            IlpSolution::Infeasible => {
                return Err(LayoutError::IllDefinedConstraints(
                    "optimal decrossing ILP is infeasible; this should be unreachable since the \
                     original layer order is always a feasible ordering"
                        .to_string(),
                ));
            }
        };

        let mut new_layers = layers;
        for layer in &mut new_layers {
            layer.sort_by(|&x, &y| {
                if x == y {
                    Ordering::Equal
                } else if is_after(&values, &pair_var, x, y) {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            });
        }

        let crossings_before = super::count_crossings(sugi);
        *sugi.layers_mut() = new_layers;
        log::debug!(
            "optimal decrossing: {} -> {} crossings over {} ordering variables",
            crossings_before,
            super::count_crossings(sugi),
            num_ordering_vars
        );
        Ok(())
    }
}
