//! Quadratic-program coordinate assignment: for each connected component,
//! minimizes a weighted sum of vertical edge straightness, waypoint
//! curvature, and inter-component spread, subject to non-overlap
//! constraints, then hands the result to the same per-layer centering step
//! as [`super::Center`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use super::{any_positive_width, recenter_and_write, CoordAlgorithm};
use crate::dag::Dag;
use crate::error::LayoutError;
use crate::solver::{ActiveSetQpSolver, QpProblem, QpSolver};
use crate::sugi::{SugiGraph, SugiNodeId, SugiNodeKind};
use crate::util::{adjacent_pairs, connected_component_partition};

/// Component-wise quadratic coordinate assigner.
pub struct Quad<N, E> {
    solver: Rc<dyn QpSolver>,
    vert_weak: Rc<dyn Fn(&N, &N) -> f64>,
    vert_strong: Rc<dyn Fn(&E) -> f64>,
    node_curve: Rc<dyn Fn(&N) -> f64>,
    link_curve: Rc<dyn Fn(&E) -> f64>,
    component_weight: f64,
}

impl<N, E> Clone for Quad<N, E> {
    fn clone(&self) -> Self {
        Self {
            solver: self.solver.clone(),
            vert_weak: self.vert_weak.clone(),
            vert_strong: self.vert_strong.clone(),
            node_curve: self.node_curve.clone(),
            link_curve: self.link_curve.clone(),
            component_weight: self.component_weight,
        }
    }
}

impl<N, E> Default for Quad<N, E> {
    fn default() -> Self {
        Self {
            solver: Rc::new(ActiveSetQpSolver::new()),
            vert_weak: Rc::new(|_, _| 1.0),
            vert_strong: Rc::new(|_| 0.0),
            node_curve: Rc::new(|_| 0.0),
            link_curve: Rc::new(|_| 1.0),
            component_weight: 1.0,
        }
    }
}

impl<N, E> Quad<N, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_solver(mut self, solver: impl QpSolver + 'static) -> Self {
        self.solver = Rc::new(solver);
        self
    }

    /// Sets the straightness weight for a real-to-real sugi-link
    /// (`vert_weak`, evaluated on the two user node payloads) and for any
    /// sugi-link touching a dummy (`vert_strong`, evaluated on the origin
    /// link's payload).
    pub fn with_vertical(
        mut self,
        vert_weak: impl Fn(&N, &N) -> f64 + 'static,
        vert_strong: impl Fn(&E) -> f64 + 'static,
    ) -> Self {
        self.vert_weak = Rc::new(vert_weak);
        self.vert_strong = Rc::new(vert_strong);
        self
    }

    /// Sets the curvature weight at a real waypoint (`node_curve`) versus a
    /// dummy waypoint (`link_curve`, evaluated on the origin link).
    pub fn with_curve(
        mut self,
        node_curve: impl Fn(&N) -> f64 + 'static,
        link_curve: impl Fn(&E) -> f64 + 'static,
    ) -> Self {
        self.node_curve = Rc::new(node_curve);
        self.link_curve = Rc::new(link_curve);
        self
    }

    /// Weight of the quadratic penalty pulling a component's boundary node
    /// toward the already-solved boundary of its unambiguous left-hand
    /// neighbor. Zero disables component spreading entirely.
    pub fn with_component_weight(mut self, weight: f64) -> Self {
        self.component_weight = weight;
        self
    }

    fn vertical_weight(&self, dag: &Dag<N, E>, sugi: &SugiGraph, a: SugiNodeId, b: SugiNodeId) -> f64 {
        match (sugi.kind(a), sugi.kind(b)) {
            (SugiNodeKind::Real(na), SugiNodeKind::Real(nb)) => (self.vert_weak)(dag.node(na), dag.node(nb)),
            (SugiNodeKind::Dummy(link), _) | (_, SugiNodeKind::Dummy(link)) => (self.vert_strong)(dag.link(link)),
        }
    }

    fn curvature_weight(&self, dag: &Dag<N, E>, sugi: &SugiGraph, waypoint: SugiNodeId) -> f64 {
        match sugi.kind(waypoint) {
            SugiNodeKind::Real(n) => (self.node_curve)(dag.node(n)),
            SugiNodeKind::Dummy(link) => (self.link_curve)(dag.link(link)),
        }
    }
}

/// A point at which one component's sugi-node sits immediately left of
/// another component's sugi-node within the same layer.
struct Boundary {
    from_comp: usize,
    to_comp: usize,
    p: SugiNodeId,
    q: SugiNodeId,
}

/// True if `to` is reachable from `from` via `edges`, via explicit DFS with
/// a visited set.
fn reaches(edges: &HashMap<usize, HashSet<usize>>, from: usize, to: usize) -> bool {
    let mut stack = vec![from];
    let mut visited = HashSet::new();
    while let Some(n) = stack.pop() {
        if n == to {
            return true;
        }
        if !visited.insert(n) {
            continue;
        }
        if let Some(next) = edges.get(&n) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// Solves `min 1/2 x^T Q x + c^T x s.t. A x >= b`, retrying once with a
/// small ridge on `Q`'s diagonal if the bare system is singular.
///
/// Every vertical/curvature penalty is a pairwise/triple *difference*, so a
/// component with no spread anchor is translation-invariant and never
/// strictly positive definite on its own; a component with at least one
/// already-solved incoming boundary breaks that invariance via a hard
/// constraint (and, when unambiguous, a soft term too) that prefers one
/// specific absolute position, but can still be rank-deficient the same way:
/// a node that sits between two dummy-adjacent links gets only a curvature
/// term (the default `vert_strong` is 0, so a dummy carries no straightness
/// penalty at all), and a single curvature equation in three unknowns pins
/// the waypoint relative to its neighbors without pinning their own
/// separation. The ridge picks the minimum-norm point among the
/// otherwise-equally-good solutions, which for a lone dummy link is the
/// straight vertical line any reasonable default should draw anyway. An
/// all-zero `Q` skips the ridge and fails outright: there is no shape
/// information to regularize, only to fabricate.
fn solve_with_ridge(
    solver: &dyn QpSolver,
    q: Vec<Vec<f64>>,
    c: Vec<f64>,
    a: Vec<Vec<f64>>,
    b: Vec<f64>,
) -> Result<Vec<f64>, LayoutError> {
    match solver.solve(&QpProblem { q: q.clone(), c: c.clone(), a: a.clone(), b: b.clone() }) {
        Ok(x) => Ok(x),
        Err(_) => {
            // A component whose weights are genuinely all zero carries no
            // shape information at all; a ridge term would fabricate a
            // positive-definite objective out of nothing and silently
            // accept a configuration the weight accessors made degenerate.
            // Surface it instead of guessing.
            if q.iter().all(|row| row.iter().all(|&v| v == 0.0)) {
                return Err(LayoutError::IllDefinedObjective(
                    "quadratic objective is not positive definite for this component".to_string(),
                ));
            }
            const RIDGE: f64 = 1e-4;
            let mut ridged_q = q;
            for (i, row) in ridged_q.iter_mut().enumerate() {
                row[i] += RIDGE;
            }
            solver.solve(&QpProblem { q: ridged_q, c, a, b }).map_err(|_| {
                LayoutError::IllDefinedObjective(
                    "quadratic objective is not positive definite for this component".to_string(),
                )
            })
        }
    }
}

impl<N, E> CoordAlgorithm<N, E> for Quad<N, E> {
    fn assign_x(&self, dag: &Dag<N, E>, sugi: &mut SugiGraph) -> Result<f64, LayoutError> {
        if sugi.node_count() == 0 {
            return Ok(0.0);
        }
        if !any_positive_width(sugi) {
            return Err(LayoutError::ZeroWidth);
        }
        if self.component_weight < 0.0 {
            return Err(LayoutError::InvalidConfig(
                "component weight must be non-negative".to_string(),
            ));
        }

        let node_component = connected_component_partition(dag);
        let component_of = |id: SugiNodeId| -> usize {
            match sugi.kind(id) {
                SugiNodeKind::Real(n) => node_component[&n],
                SugiNodeKind::Dummy(link) => {
                    let (source, _) = dag.link_endpoints(link);
                    node_component[&source]
                }
            }
        };

        let mut members: HashMap<usize, Vec<SugiNodeId>> = HashMap::new();
        for i in 0..sugi.node_count() {
            let id = SugiNodeId(i);
            members.entry(component_of(id)).or_default().push(id);
        }
        let mut component_ids: Vec<usize> = members.keys().copied().collect();
        component_ids.sort_unstable();

        // The "left-of" graph: scan every layer for adjacent pairs that
        // straddle a component boundary, recording both the raw component
        // adjacency (for cycle detection) and the specific anchor nodes of
        // each occurrence.
        let mut boundaries: Vec<Boundary> = Vec::new();
        let mut raw_edges: HashMap<usize, HashSet<usize>> = HashMap::new();
        for layer in sugi.layers() {
            for (p, q) in adjacent_pairs(layer) {
                let (a, b) = (component_of(p), component_of(q));
                if a != b {
                    raw_edges.entry(a).or_default().insert(b);
                    boundaries.push(Boundary { from_comp: a, to_comp: b, p, q });
                }
            }
        }

        // Only apply a spreading constraint A -> B if B cannot reach A back
        // via the raw graph, i.e. the pair is not part of a cycle.
        let mut distinct_pairs: HashSet<(usize, usize)> = HashSet::new();
        for b in &boundaries {
            distinct_pairs.insert((b.from_comp, b.to_comp));
        }
        let kept_pairs: HashSet<(usize, usize)> = distinct_pairs
            .into_iter()
            .filter(|&(a, b)| !reaches(&raw_edges, b, a))
            .collect();

        // `kept_pairs` is acyclic: a cycle A1 -> A2 -> ... -> Ak -> A1 among
        // kept edges would mean A2 reaches A1 via the very edges A2 -> ... ->
        // Ak -> A1 of the raw graph, which would have pruned A1 -> A2.
        // Topologically sort every component over this acyclic subgraph so
        // each component is solved only after every unambiguous left
        // neighbor that anchors it.
        let mut order_edges: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut indegree: HashMap<usize, usize> = component_ids.iter().map(|&c| (c, 0)).collect();
        for &(a, b) in &kept_pairs {
            order_edges.entry(a).or_default().push(b);
            *indegree.get_mut(&b).unwrap() += 1;
        }
        let mut ready: Vec<usize> = indegree.iter().filter(|&(_, &d)| d == 0).map(|(&c, _)| c).collect();
        ready.sort_unstable();
        let mut ready: VecDeque<usize> = ready.into();
        let mut topo_order = Vec::with_capacity(component_ids.len());
        while let Some(c) = ready.pop_front() {
            topo_order.push(c);
            if let Some(next) = order_edges.get(&c) {
                let mut newly_ready: Vec<usize> = Vec::new();
                for &n in next {
                    let d = indegree.get_mut(&n).unwrap();
                    *d -= 1;
                    if *d == 0 {
                        newly_ready.push(n);
                    }
                }
                newly_ready.sort_unstable();
                ready.extend(newly_ready);
            }
        }
        debug_assert_eq!(topo_order.len(), component_ids.len());

        // Incoming boundaries per component (both kept and pruned; each
        // component's solve step re-splits them once it knows which side is
        // already solved).
        let mut incoming: HashMap<usize, Vec<&Boundary>> = HashMap::new();
        for b in &boundaries {
            incoming.entry(b.to_comp).or_default().push(b);
        }

        let mut solved_x: HashMap<SugiNodeId, f64> = HashMap::with_capacity(sugi.node_count());

        for comp in topo_order {
            let nodes = &members[&comp];
            let col: HashMap<SugiNodeId, usize> = nodes.iter().enumerate().map(|(i, &n)| (n, i)).collect();
            let k = nodes.len();

            // Boundaries into this component whose left-hand side is
            // already solved, split into the subset that is also
            // cycle-unambiguous (gets the soft spread penalty) and the
            // rest (hard non-overlap only; see DESIGN.md for why a cyclic
            // pair cannot get a consistent penalty direction).
            let resolved_incoming: Vec<&Boundary> = incoming
                .get(&comp)
                .into_iter()
                .flatten()
                .filter(|b| solved_x.contains_key(&b.p))
                .copied()
                .collect();
            let unambiguous_incoming: Vec<&Boundary> = resolved_incoming
                .iter()
                .filter(|b| kept_pairs.contains(&(b.from_comp, b.to_comp)))
                .copied()
                .collect();
            // Any already-solved incoming boundary pins this component to an
            // absolute external coordinate (via the hard constraint below at
            // least), which the translation-pinned reduced system can't
            // express safely if the anchor node happens to land on the
            // pinned column; solve the full system whenever one exists.
            let has_anchor = !resolved_incoming.is_empty();

            if k == 1 && !has_anchor {
                // A single-node component with nothing pulling it has
                // nothing to optimize: any x is equally optimal, and there
                // is no other node in the component to overlap.
                solved_x.insert(nodes[0], 0.0);
                continue;
            }

            let mut q = vec![vec![0.0; k]; k];
            let mut c = vec![0.0; k];

            for (from, to, _weight) in sugi.links() {
                if component_of(from) != comp {
                    continue;
                }
                let w = self.vertical_weight(dag, sugi, from, to);
                if w < 0.0 {
                    return Err(LayoutError::InvalidConfig(
                        "vertical weight accessor returned a negative weight".to_string(),
                    ));
                }
                if w == 0.0 {
                    continue;
                }
                let (a, b) = (col[&from], col[&to]);
                q[a][a] += 2.0 * w;
                q[b][b] += 2.0 * w;
                q[a][b] -= 2.0 * w;
                q[b][a] -= 2.0 * w;
            }

            for &node in nodes {
                let parents = sugi.parents(node);
                let children = sugi.children(node);
                if parents.is_empty() || children.is_empty() {
                    continue;
                }
                let wc = self.curvature_weight(dag, sugi, node);
                if wc < 0.0 {
                    return Err(LayoutError::InvalidConfig(
                        "curvature weight accessor returned a negative weight".to_string(),
                    ));
                }
                if wc == 0.0 {
                    continue;
                }
                for &(p, _) in parents {
                    if component_of(p) != comp {
                        continue;
                    }
                    for &(ch, _) in children {
                        if component_of(ch) != comp {
                            continue;
                        }
                        let (a, b, cc) = (col[&p], col[&node], col[&ch]);
                        q[a][a] += 2.0 * wc;
                        q[b][b] += 8.0 * wc;
                        q[cc][cc] += 2.0 * wc;
                        q[a][b] -= 4.0 * wc;
                        q[b][a] -= 4.0 * wc;
                        q[a][cc] += 2.0 * wc;
                        q[cc][a] += 2.0 * wc;
                        q[b][cc] -= 4.0 * wc;
                        q[cc][b] -= 4.0 * wc;
                    }
                }
            }

            // Component spread: anchor this component's boundary node to its
            // already-solved left neighbor's boundary node with weight
            // `component_weight`, i.e. add `w * (x_q - k)^2` for the known
            // constant k = solved_x[p].
            for b in &unambiguous_incoming {
                let k_const = solved_x[&b.p];
                let qi = col[&b.q];
                q[qi][qi] += 2.0 * self.component_weight;
                c[qi] += -2.0 * self.component_weight * k_const;
            }

            let mut a_rows: Vec<Vec<f64>> = Vec::new();
            let mut b_rows: Vec<f64> = Vec::new();
            for layer in sugi.layers() {
                let in_component: Vec<SugiNodeId> =
                    layer.iter().copied().filter(|&n| component_of(n) == comp).collect();
                for (p, n) in adjacent_pairs(&in_component) {
                    let mut row = vec![0.0; k];
                    row[col[&n]] = 1.0;
                    row[col[&p]] = -1.0;
                    a_rows.push(row);
                    b_rows.push((sugi.width(p) + sugi.width(n)) / 2.0);
                }
            }
            // Per-layer non-overlap is unconditional, independent of
            // whether the component pair's relative order is ambiguous: the
            // specific anchor node `p` is, by construction, literally
            // immediately left of `q` in this occurrence's layer, so the
            // inequality direction is never in question, only whether `p`
            // has already been solved (the topological order guarantees
            // this for kept pairs; for pruned pairs it holds only when this
            // component happens to be processed after its neighbor).
            for b in &resolved_incoming {
                let k_const = solved_x[&b.p];
                let mut row = vec![0.0; k];
                row[col[&b.q]] = 1.0;
                a_rows.push(row);
                b_rows.push(k_const + (sugi.width(b.p) + sugi.width(b.q)) / 2.0);
            }

            let x = if has_anchor {
                // The spread term(s) above already fix the translation
                // direction the vertical/curvature terms alone leave free,
                // so the full (unreduced) system is the one to solve.
                solve_with_ridge(self.solver.as_ref(), q, c, a_rows, b_rows)?
            } else if k == 1 {
                vec![0.0]
            } else {
                // No anchor: pin column 0 to zero and solve the resulting
                // `(k-1)`-dimensional reduced system instead. This is exact
                // (not a numerical regularization) and invisible in the
                // final drawing, since `recenter_and_write` re-centers every
                // layer's absolute position afterward anyway.
                let reduced_q: Vec<Vec<f64>> = q[1..].iter().map(|row| row[1..].to_vec()).collect();
                let reduced_c: Vec<f64> = c[1..].to_vec();
                let reduced_a: Vec<Vec<f64>> = a_rows.iter().map(|row| row[1..].to_vec()).collect();
                let reduced_x = solve_with_ridge(self.solver.as_ref(), reduced_q, reduced_c, reduced_a, b_rows)?;
                let mut x = vec![0.0; k];
                x[1..].copy_from_slice(&reduced_x);
                x
            };

            for (&node, &idx) in &col {
                solved_x.insert(node, x[idx]);
            }
        }

        let positions_by_layer: Vec<Vec<f64>> = sugi
            .layers()
            .iter()
            .map(|layer| layer.iter().map(|&node| solved_x[&node]).collect())
            .collect();

        Ok(recenter_and_write(sugi, positions_by_layer))
    }
}
