//! A small dense Big-M two-phase-in-one simplex tableau, used internally by
//! [`super::ilp::BranchAndBoundIlpSolver`] to solve each LP relaxation node.
//!
//! This is a textbook implementation (Bland's rule throughout, to guarantee
//! termination over speed) sized for the small dense models the layering and
//! decrossing stages build, not a general-purpose LP engine.

const EPS: f64 = 1e-9;
const MAX_ITERATIONS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RowKind {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone)]
pub(super) struct Row {
    pub coeffs: Vec<f64>,
    pub kind: RowKind,
    pub rhs: f64,
}

#[derive(Debug, Clone)]
pub(super) struct LpResult {
    pub x: Vec<f64>,
}

/// Minimizes `objective . x` subject to `rows` and `x >= 0`. Returns `None`
/// if the relaxation is infeasible (or, defensively, unbounded).
pub(super) fn solve_lp_relaxation(
    num_vars: usize,
    objective: &[f64],
    rows: &[Row],
) -> Option<LpResult> {
    debug_assert_eq!(objective.len(), num_vars);

    // Normalize every row to a non-negative RHS.
    let mut rows: Vec<Row> = rows
        .iter()
        .map(|row| {
            if row.rhs < 0.0 {
                let kind = match row.kind {
                    RowKind::Le => RowKind::Ge,
                    RowKind::Ge => RowKind::Le,
                    RowKind::Eq => RowKind::Eq,
                };
                Row {
                    coeffs: row.coeffs.iter().map(|c| -c).collect(),
                    kind,
                    rhs: -row.rhs,
                }
            } else {
                row.clone()
            }
        })
        .collect();
    // Rows whose every coefficient (and RHS) is zero are vacuous; keep them
    // for the Eq/Le case (trivially satisfied) but a zero-RHS `Ge` row with
    // zero coefficients is also trivially satisfied, never infeasible.
    rows.retain(|row| !(row.rhs.abs() < EPS && row.coeffs.iter().all(|c| c.abs() < EPS)));

    let num_rows = rows.len();
    let mut num_slack_like = 0usize;
    let mut num_artificial = 0usize;
    for row in &rows {
        match row.kind {
            RowKind::Le => num_slack_like += 1,
            RowKind::Ge => {
                num_slack_like += 1;
                num_artificial += 1;
            }
            RowKind::Eq => num_artificial += 1,
        }
    }
    let total_cols = num_vars + num_slack_like + num_artificial;

    let mut tableau = vec![vec![0.0; total_cols + 1]; num_rows];
    let mut basis = vec![0usize; num_rows];
    let mut cost = vec![0.0; total_cols];
    cost[..num_vars].copy_from_slice(objective);

    let max_abs_cost = objective.iter().fold(1.0_f64, |acc, c| acc.max(c.abs()));
    let big_m = 1e6 * max_abs_cost.max(1.0);

    let mut slack_cursor = num_vars;
    let mut artificial_cursor = num_vars + num_slack_like;
    for (i, row) in rows.iter().enumerate() {
        tableau[i][..num_vars].copy_from_slice(&row.coeffs);
        tableau[i][total_cols] = row.rhs;
        match row.kind {
            RowKind::Le => {
                tableau[i][slack_cursor] = 1.0;
                basis[i] = slack_cursor;
                slack_cursor += 1;
            }
            RowKind::Ge => {
                tableau[i][slack_cursor] = -1.0;
                slack_cursor += 1;
                tableau[i][artificial_cursor] = 1.0;
                cost[artificial_cursor] = big_m;
                basis[i] = artificial_cursor;
                artificial_cursor += 1;
            }
            RowKind::Eq => {
                tableau[i][artificial_cursor] = 1.0;
                cost[artificial_cursor] = big_m;
                basis[i] = artificial_cursor;
                artificial_cursor += 1;
            }
        }
    }

    if num_rows == 0 {
        return Some(LpResult {
            x: vec![0.0; num_vars],
        });
    }

    for _ in 0..MAX_ITERATIONS {
        let mut reduced = vec![0.0; total_cols];
        for j in 0..total_cols {
            let mut z = cost[j];
            for i in 0..num_rows {
                z -= cost[basis[i]] * tableau[i][j];
            }
            reduced[j] = z;
        }

        // Bland's rule: smallest index with a negative reduced cost enters.
        let entering = (0..total_cols).find(|&j| reduced[j] < -EPS);
        let Some(entering) = entering else {
            break;
        };

        let mut leaving: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for i in 0..num_rows {
            let coeff = tableau[i][entering];
            if coeff > EPS {
                let ratio = tableau[i][total_cols] / coeff;
                if ratio < best_ratio - EPS
                    || (ratio < best_ratio + EPS && leaving.map_or(true, |l| basis[i] < basis[l]))
                {
                    best_ratio = ratio;
                    leaving = Some(i);
                }
            }
        }
        let Some(leaving) = leaving else {
            // Unbounded direction; this model has no finite optimum.
            return None;
        };

        let pivot = tableau[leaving][entering];
        for v in tableau[leaving].iter_mut() {
            *v /= pivot;
        }
        for i in 0..num_rows {
            if i == leaving {
                continue;
            }
            let factor = tableau[i][entering];
            if factor.abs() > EPS {
                for j in 0..=total_cols {
                    tableau[i][j] -= factor * tableau[leaving][j];
                }
            }
        }
        basis[leaving] = entering;
    }

    // Any artificial variable left basic at a positive value means the
    // original (non-relaxed-by-artificials) problem is infeasible.
    for i in 0..num_rows {
        if basis[i] >= num_vars + num_slack_like && tableau[i][total_cols] > EPS {
            return None;
        }
    }

    let mut x = vec![0.0; num_vars];
    for i in 0..num_rows {
        if basis[i] < num_vars {
            x[basis[i]] = tableau[i][total_cols];
        }
    }
    Some(LpResult { x })
}
