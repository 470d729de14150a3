//! [`ActiveSetQpSolver`]: a primal active-set method for small dense convex
//! quadratic programs with inequality constraints (Nocedal & Wright,
//! *Numerical Optimization*, Algorithm 16.3), re-solving the
//! equality-constrained sub-problem by direct KKT elimination rather than a
//! warm-started factorization update. Sized for the per-component problems
//! [`crate::coord::quad`] builds, not for large-scale QP.

use super::{QpError, QpProblem, QpSolver};

const EPS: f64 = 1e-7;

/// The crate's built-in [`QpSolver`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ActiveSetQpSolver;

impl ActiveSetQpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl QpSolver for ActiveSetQpSolver {
    fn solve(&self, problem: &QpProblem) -> Result<Vec<f64>, QpError> {
        let n = problem.num_vars();
        if n == 0 {
            return Ok(Vec::new());
        }
        let neg_c: Vec<f64> = problem.c.iter().map(|v| -v).collect();
        let Some((mut x, _)) = solve_equality_qp(&problem.q, &neg_c, &[], &[]) else {
            return Err(QpError::NotPositiveDefinite);
        };

        let m = problem.a.len();
        let mut active: Vec<usize> = (0..m)
            .filter(|&i| dot(&problem.a[i], &x) < problem.b[i] - EPS)
            .collect();

        let max_iters = 100 * (n + m).max(1);
        for _ in 0..max_iters {
            let active_rows: Vec<Vec<f64>> = active.iter().map(|&i| problem.a[i].clone()).collect();
            let active_rhs: Vec<f64> = active.iter().map(|&i| problem.b[i]).collect();

            let Some((new_x, lambda)) = solve_equality_qp(&problem.q, &neg_c, &active_rows, &active_rhs)
            else {
                // The active set is redundant/degenerate; drop the most
                // recently added row and keep going.
                if active.pop().is_none() {
                    break;
                }
                continue;
            };
            x = new_x;

            let most_violated = (0..m)
                .filter(|i| !active.contains(i))
                .map(|i| (i, problem.b[i] - dot(&problem.a[i], &x)))
                .filter(|&(_, violation)| violation > EPS)
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap());

            if let Some((idx, _)) = most_violated {
                active.push(idx);
                continue;
            }

            let most_negative_multiplier = lambda
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l < -EPS)
                .min_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(pos, _)| pos);

            match most_negative_multiplier {
                Some(pos) => {
                    active.remove(pos);
                }
                None => return Ok(x),
            }
        }

        // The iteration budget ran out without certifying optimality; return
        // the best iterate found. `Layout::run`'s final non-overlap check
        // catches a genuine constraint violation.
        Ok(x)
    }
}

fn dot(a: &[f64], x: &[f64]) -> f64 {
    a.iter().zip(x).map(|(a, x)| a * x).sum()
}

/// Solves `minimize 1/2 x^T Q x + c^T x s.t. active_rows . x = active_rhs`
/// via the KKT system `[[Q, -A^T], [A, 0]] [x; lambda] = [-c; b]`. Returns
/// `None` if the KKT matrix is singular (redundant active constraints).
fn solve_equality_qp(
    q: &[Vec<f64>],
    neg_c: &[f64],
    active_rows: &[Vec<f64>],
    active_rhs: &[f64],
) -> Option<(Vec<f64>, Vec<f64>)> {
    let n = q.len();
    let k = active_rows.len();
    let size = n + k;
    let mut a = vec![vec![0.0; size + 1]; size];

    for i in 0..n {
        for j in 0..n {
            a[i][j] = q[i][j];
        }
        for (c, row) in active_rows.iter().enumerate() {
            a[i][n + c] = -row[i];
        }
        a[i][size] = neg_c[i];
    }
    for (c, row) in active_rows.iter().enumerate() {
        for j in 0..n {
            a[n + c][j] = row[j];
        }
        a[n + c][size] = active_rhs[c];
    }

    let solution = gaussian_eliminate(&mut a, size)?;
    Some((solution[..n].to_vec(), solution[n..].to_vec()))
}

/// Solves `a . x = rhs` (rhs in the last column of `a`, an `n x (n+1)`
/// augmented matrix) via Gaussian elimination with partial pivoting.
fn gaussian_eliminate(a: &mut [Vec<f64>], n: usize) -> Option<Vec<f64>> {
    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| {
            a[r1][col].abs().partial_cmp(&a[r2][col].abs()).unwrap()
        })?;
        if a[pivot_row][col].abs() < EPS {
            return None;
        }
        a.swap(col, pivot_row);

        let pivot = a[col][col];
        for j in col..=n {
            a[col][j] /= pivot;
        }
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor.abs() > EPS {
                for j in col..=n {
                    a[row][j] -= factor * a[col][j];
                }
            }
        }
    }
    Some(a.iter().map(|row| row[n]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_minimum_of_separable_quadratic() {
        // minimize (x0-1)^2 + (x1-2)^2 == 1/2*2*x0^2 - 2*x0 + 1/2*2*x1^2 - 4*x1 + const
        let problem = QpProblem {
            q: vec![vec![2.0, 0.0], vec![0.0, 2.0]],
            c: vec![-2.0, -4.0],
            a: vec![],
            b: vec![],
        };
        let x = ActiveSetQpSolver::new().solve(&problem).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-6);
        assert!((x[1] - 2.0).abs() < 1e-6);
    }

    #[test]
    fn respects_active_inequality_constraint() {
        // minimize x^2 s.t. x >= 1 -> optimum at x = 1.
        let problem = QpProblem {
            q: vec![vec![2.0]],
            c: vec![0.0],
            a: vec![vec![1.0]],
            b: vec![1.0],
        };
        let x = ActiveSetQpSolver::new().solve(&problem).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rejects_non_positive_definite_objective() {
        let problem = QpProblem {
            q: vec![vec![0.0, 0.0], vec![0.0, 0.0]],
            c: vec![1.0, 1.0],
            a: vec![],
            b: vec![],
        };
        assert_eq!(
            ActiveSetQpSolver::new().solve(&problem),
            Err(QpError::NotPositiveDefinite)
        );
    }
}
