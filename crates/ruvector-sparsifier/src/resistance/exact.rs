//! Exact effective resistance: one Laplacian solve per edge.
//!
//! For edge `i` with incidence row `b_i` the engine solves `L x = b_i` and
//! sets `er[i] = b_i . x`, which is exactly `b_i^T L^+ b_i` because `b_i`
//! lies in the range of `L`. Cost is `m` solves, so this is the reference
//! engine for small graphs and for validating the approximate one.

use tracing::{debug, trace, warn};

use crate::cg::ConjugateGradientSolver;
use crate::error::{Result, SolverError};
use crate::graph::Graph;
use crate::traits::{EffectiveResistance, LinearSystemSolver, ResistanceEstimate};
use crate::types::ComputeStatus;

/// Outcome of a single per-edge solve.
#[derive(Debug, Clone, Copy, PartialEq)]
enum EdgeSolve {
    Converged(f64),
    /// Iteration cap reached; carries the best-effort value.
    Capped(f64),
    Breakdown,
}

/// Exact per-edge effective resistance.
#[derive(Debug, Clone, Default)]
pub struct ExactResistance<S = ConjugateGradientSolver> {
    solver: S,
}

impl<S: LinearSystemSolver> ExactResistance<S> {
    /// Wrap a linear solver.
    pub fn new(solver: S) -> Self {
        Self { solver }
    }

    /// The underlying solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    fn solve_edge(
        &self,
        graph: &Graph,
        edge: usize,
    ) -> std::result::Result<EdgeSolve, SolverError> {
        let incidence = graph.incidence();
        let mut rhs = vec![0.0f64; graph.node_count()];
        for (col, &b) in incidence.row_entries(edge) {
            rhs[col] = b;
        }

        let result = match self.solver.solve(graph.laplacian(), &rhs) {
            Ok(result) => result,
            Err(SolverError::NumericalInstability { iteration, detail }) => {
                warn!(edge, iteration, %detail, "exact ER: solve broke down");
                return Ok(EdgeSolve::Breakdown);
            }
            Err(e) => return Err(e),
        };

        let mut er: f64 = incidence
            .row_entries(edge)
            .map(|(col, &b)| b * result.solution[col])
            .sum();
        if !er.is_finite() {
            warn!(edge, value = er, "exact ER: non-finite value flushed to zero");
            er = 0.0;
        }

        if result.converged {
            trace!(
                edge,
                iterations = result.iterations,
                wall_time = ?result.wall_time,
                "exact ER: edge solved"
            );
            Ok(EdgeSolve::Converged(er))
        } else {
            warn!(
                edge,
                iterations = result.iterations,
                residual = result.residual_norm,
                wall_time = ?result.wall_time,
                "exact ER: solve hit the iteration cap"
            );
            Ok(EdgeSolve::Capped(er))
        }
    }
}

impl<S: LinearSystemSolver> EffectiveResistance for ExactResistance<S> {
    fn calculate_er(&self, graph: &Graph) -> Result<ResistanceEstimate> {
        let m = graph.edge_count();

        #[cfg(feature = "parallel")]
        let outcomes: Vec<EdgeSolve> = {
            use rayon::prelude::*;
            (0..m)
                .into_par_iter()
                .map(|edge| self.solve_edge(graph, edge))
                .collect::<std::result::Result<_, _>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<EdgeSolve> = (0..m)
            .map(|edge| self.solve_edge(graph, edge))
            .collect::<std::result::Result<_, _>>()?;

        let mut values = Vec::with_capacity(m);
        let mut capped = 0usize;
        let mut broken = 0usize;
        for outcome in outcomes {
            match outcome {
                EdgeSolve::Converged(v) => values.push(v),
                EdgeSolve::Capped(v) => {
                    capped += 1;
                    values.push(v);
                }
                EdgeSolve::Breakdown => {
                    broken += 1;
                    values.push(0.0);
                }
            }
        }

        let status = if broken > 0 {
            ComputeStatus::NumericalIssue
        } else if capped > 0 {
            ComputeStatus::NotConverging
        } else {
            ComputeStatus::Successful
        };

        debug!(edges = m, capped, broken, %status, "exact ER finished");

        Ok(ResistanceEstimate {
            values,
            status,
            solves_attempted: m,
            solves_failed: capped + broken,
        })
    }
}
