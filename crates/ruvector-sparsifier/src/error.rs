//! Error types for the sparsifier crate.
//!
//! Construction-time problems surface as [`ValidationError`] wrapped in
//! [`SparsifierError::InvalidArgument`]. Numerical trouble inside the
//! effective-resistance engines is reported through
//! [`ComputeStatus`](crate::types::ComputeStatus) instead of an error; only
//! structural failures (breakdown of a solve that callers invoke directly,
//! misuse of the state machine, I/O) become `Err`.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SparsifierError>;

/// Top-level error type for graph construction, ER computation and sampling.
#[derive(Debug, thiserror::Error)]
pub enum SparsifierError {
    /// Malformed graph input or out-of-range hyperparameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// `sparsified_graph` was called before any successful `compute`.
    #[error("sparsifier has not been computed; call compute() before sparsified_graph()")]
    NotComputed,

    /// A linear solve failed in a way that could not be absorbed.
    #[error("solver error: {0}")]
    Solver(#[from] SolverError),

    /// Every sampling weight is zero but samples were requested.
    #[error("degenerate sampling distribution: {0}")]
    DegenerateDistribution(String),

    /// A graph reader or writer failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`LinearSystemSolver`](crate::traits::LinearSystemSolver).
///
/// Running out of iterations is not an error: the solver hands back its last
/// iterate with `converged == false` so callers can decide what to do.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// A numerical breakdown was detected (NaN, Inf, or loss of positivity).
    #[error("numerical instability at iteration {iteration}: {detail}")]
    NumericalInstability {
        /// Iteration at which the instability was detected.
        iteration: usize,
        /// Human-readable explanation.
        detail: String,
    },

    /// The caller supplied invalid input (dimensions, parameters, etc.).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

/// Validation errors for graph and solver inputs.
///
/// These are raised eagerly before any computation begins so that callers get
/// clear diagnostics rather than mysterious numerical failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Two inputs that must agree in length do not.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An edge row does not have exactly two endpoints.
    #[error("edge row {row} has {found} columns (expected 2)")]
    EdgeArity {
        /// Offending row.
        row: usize,
        /// Number of columns found.
        found: usize,
    },

    /// An edge weight is zero or negative.
    #[error("weight at index {index} is {value} (weights must be > 0)")]
    NonPositiveWeight {
        /// Edge index.
        index: usize,
        /// The invalid weight.
        value: f64,
    },

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// Graph size exceeds the implementation limit.
    #[error("graph with {nodes} nodes and {edges} edges exceeds limits ({max_nodes} nodes, {max_edges} edges)")]
    GraphTooLarge {
        /// Derived node count.
        nodes: usize,
        /// Edge count.
        edges: usize,
        /// Maximum supported node count.
        max_nodes: usize,
        /// Maximum supported edge count.
        max_edges: usize,
    },
}
