//! Trait seams of the crate.
//!
//! [`LinearSystemSolver`] abstracts the Laplacian solve used by both
//! effective-resistance engines; [`EffectiveResistance`] is the common
//! interface of the exact and approximate engines. [`GraphReader`] and
//! [`GraphWriter`] are the I/O collaborators a [`Graph`] is loaded from and
//! persisted to.

use std::io;

use crate::error::{Result, SolverError};
use crate::graph::{Graph, GraphData};
use crate::types::{ComputeStatus, CsrMatrix, SolverResult};

/// Iterative solver for symmetric positive-semidefinite systems `L x = b`.
///
/// Implementations must be usable from several threads at once; the
/// approximate engine may issue solves in parallel.
pub trait LinearSystemSolver: Send + Sync {
    /// Solve `L x = b`.
    ///
    /// Hitting the iteration cap is reported through
    /// [`SolverResult::converged`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError`] on invalid input or numerical breakdown.
    fn solve(
        &self,
        laplacian: &CsrMatrix<f64>,
        rhs: &[f64],
    ) -> std::result::Result<SolverResult, SolverError>;

    /// Iteration cap applied to every solve.
    fn max_iterations(&self) -> usize;
}

/// Per-edge effective resistance together with a status.
#[derive(Debug, Clone)]
pub struct ResistanceEstimate {
    /// One non-negative value per edge, parallel to the graph's edge list.
    pub values: Vec<f64>,
    /// Outcome of the computation.
    pub status: ComputeStatus,
    /// Linear solves attempted.
    pub solves_attempted: usize,
    /// Solves whose result was discarded or only partially trusted.
    pub solves_failed: usize,
}

/// Computes the effective resistance of every edge of a graph.
pub trait EffectiveResistance {
    /// Compute `er[i] = b_i^T L^+ b_i` (exactly or approximately) for every
    /// edge `i`.
    ///
    /// Numerical problems are reported through
    /// [`ResistanceEstimate::status`]; non-finite values are flushed to zero.
    ///
    /// # Errors
    ///
    /// Returns an error only when the computation cannot be attempted at all
    /// (for example, invalid solver parameters).
    fn calculate_er(&self, graph: &Graph) -> Result<ResistanceEstimate>;
}

/// Source of raw graph data.
pub trait GraphReader {
    /// Read edge rows and (optionally) weights.
    ///
    /// # Errors
    ///
    /// Any I/O failure; it is propagated unchanged by
    /// [`Graph::from_reader`].
    fn read(&mut self) -> io::Result<GraphData>;
}

/// Sink for graph data. Writers never mutate the graph they persist.
pub trait GraphWriter {
    /// Persist an edge list with its weights.
    ///
    /// # Errors
    ///
    /// Any I/O failure.
    fn write_edges(&mut self, edges: &[(usize, usize)], weights: &[f64]) -> io::Result<()>;

    /// Persist a whole graph.
    ///
    /// # Errors
    ///
    /// Any I/O failure.
    fn write_graph(&mut self, graph: &Graph) -> io::Result<()> {
        self.write_edges(graph.edges(), graph.weights())
    }
}
