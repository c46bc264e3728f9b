//! Input validation for graphs, hyperparameters and solver systems.
//!
//! Every check runs eagerly and unconditionally, in debug and release builds
//! alike. Functions return [`ValidationError`], which converts into
//! [`SparsifierError::InvalidArgument`](crate::error::SparsifierError) or
//! [`SolverError::InvalidInput`](crate::error::SolverError) via `From`.
//!
//! # Limits
//!
//! | Resource   | Limit         | Constant             |
//! |------------|---------------|----------------------|
//! | Nodes      | 10,000,000    | [`MAX_NODES`]        |
//! | Edges      | 100,000,000   | [`MAX_EDGES`]        |
//! | Iterations | 1,000,000     | [`MAX_ITERATIONS`]   |
//! | Draws      | 1,000,000,000 | [`MAX_SAMPLE_DRAWS`] |

use crate::error::ValidationError;
use crate::types::CsrMatrix;

// ---------------------------------------------------------------------------
// Resource limits
// ---------------------------------------------------------------------------

/// Maximum number of nodes in a graph.
pub const MAX_NODES: usize = 10_000_000;

/// Maximum number of edges in a graph.
pub const MAX_EDGES: usize = 100_000_000;

/// Maximum solver iterations to prevent runaway computation.
pub const MAX_ITERATIONS: usize = 1_000_000;

/// Maximum number of with-replacement draws for one sparsified graph.
pub const MAX_SAMPLE_DRAWS: usize = 1_000_000_000;

// ---------------------------------------------------------------------------
// Graph input validation
// ---------------------------------------------------------------------------

/// Validate an edge list and its parallel weight list.
///
/// Checks, in order:
///
/// 1. `edges.len() == weights.len()`.
/// 2. The edge count is within [`MAX_EDGES`].
/// 3. Every weight is finite and strictly positive.
/// 4. The derived node count (`max endpoint + 1`) is within [`MAX_NODES`].
///
/// Returns the derived node count (0 for an empty edge list).
///
/// # Errors
///
/// Returns [`ValidationError`] describing the first violation found.
///
/// # Examples
///
/// ```
/// use ruvector_sparsifier::validation::validate_graph_input;
///
/// let n = validate_graph_input(&[(0, 1), (1, 4)], &[1.0, 0.5]).unwrap();
/// assert_eq!(n, 5);
/// assert!(validate_graph_input(&[(0, 1)], &[0.0]).is_err());
/// ```
pub fn validate_graph_input(
    edges: &[(usize, usize)],
    weights: &[f64],
) -> Result<usize, ValidationError> {
    if edges.len() != weights.len() {
        return Err(ValidationError::DimensionMismatch(format!(
            "edge rows {} != weight rows {}",
            edges.len(),
            weights.len(),
        )));
    }

    if edges.len() > MAX_EDGES {
        return Err(ValidationError::GraphTooLarge {
            nodes: 0,
            edges: edges.len(),
            max_nodes: MAX_NODES,
            max_edges: MAX_EDGES,
        });
    }

    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue(format!(
                "weight[{index}] = {value}"
            )));
        }
        if value <= 0.0 {
            return Err(ValidationError::NonPositiveWeight { index, value });
        }
    }

    let node_count = edges
        .iter()
        .map(|&(u, v)| u.max(v).saturating_add(1))
        .max()
        .unwrap_or(0);

    if node_count > MAX_NODES {
        return Err(ValidationError::GraphTooLarge {
            nodes: node_count,
            edges: edges.len(),
            max_nodes: MAX_NODES,
            max_edges: MAX_EDGES,
        });
    }

    Ok(node_count)
}

/// Convert tabular edge rows into endpoint pairs.
///
/// Every row must hold exactly two node indices.
///
/// # Errors
///
/// Returns [`ValidationError::EdgeArity`] for the first row of the wrong width.
pub fn validate_edge_rows(rows: &[Vec<usize>]) -> Result<Vec<(usize, usize)>, ValidationError> {
    rows.iter()
        .enumerate()
        .map(|(row, cells)| match cells.as_slice() {
            [u, v] => Ok((*u, *v)),
            _ => Err(ValidationError::EdgeArity {
                row,
                found: cells.len(),
            }),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parameter validation
// ---------------------------------------------------------------------------

/// Require `value` to be finite and strictly positive.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise.
pub fn validate_positive(name: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected: "finite value > 0".into(),
        });
    }
    Ok(())
}

/// Require `value` to lie in `[0, 1]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] otherwise.
pub fn validate_probability(name: &str, value: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected: "[0.0, 1.0]".into(),
        });
    }
    Ok(())
}

/// Validate solver convergence parameters.
///
/// # Rules
///
/// - `tolerance` must be finite and in `(0.0, 1.0]`.
/// - `max_iterations` must be in `[1, MAX_ITERATIONS]`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] if either parameter is
/// outside its valid range.
pub fn validate_solver_params(tolerance: f64, max_iterations: usize) -> Result<(), ValidationError> {
    if !tolerance.is_finite() || tolerance <= 0.0 || tolerance > 1.0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "tolerance".into(),
            value: format!("{tolerance:.2e}"),
            expected: "(0.0, 1.0]".into(),
        });
    }

    if max_iterations == 0 || max_iterations > MAX_ITERATIONS {
        return Err(ValidationError::ParameterOutOfRange {
            name: "max_iterations".into(),
            value: max_iterations.to_string(),
            expected: format!("[1, {MAX_ITERATIONS}]"),
        });
    }

    Ok(())
}

/// Convert a raw draw count to `usize`, rejecting anything above
/// [`MAX_SAMPLE_DRAWS`] (including infinity and NaN).
///
/// Zero or negative counts become `0`.
///
/// # Errors
///
/// Returns [`ValidationError::ParameterOutOfRange`] naming `sample_count`.
pub fn validate_sample_count(count: f64) -> Result<usize, ValidationError> {
    if count.is_nan() || count > MAX_SAMPLE_DRAWS as f64 {
        return Err(ValidationError::ParameterOutOfRange {
            name: "sample_count".into(),
            value: format!("{count:.3e}"),
            expected: format!("<= {MAX_SAMPLE_DRAWS} (raise epsilon)"),
        });
    }
    if count <= 0.0 {
        return Ok(0);
    }
    Ok(count as usize)
}

// ---------------------------------------------------------------------------
// Linear system validation
// ---------------------------------------------------------------------------

/// Validate a square system `A x = b` before entering an iterative solve.
///
/// Checks that `A` is square, that `row_ptr` has `rows + 1` entries, that
/// `rhs` matches the row count and that `rhs` is finite. An all-zero `rhs`
/// is legal (zero-length incidence rows of self-loops produce one).
///
/// # Errors
///
/// Returns [`ValidationError`] on the first failing check.
pub fn validate_system(matrix: &CsrMatrix<f64>, rhs: &[f64]) -> Result<(), ValidationError> {
    if matrix.rows != matrix.cols {
        return Err(ValidationError::DimensionMismatch(format!(
            "solver requires a square matrix but got {}x{}",
            matrix.rows, matrix.cols,
        )));
    }

    if matrix.row_ptr.len() != matrix.rows + 1 {
        return Err(ValidationError::DimensionMismatch(format!(
            "row_ptr length {} does not equal rows + 1 = {}",
            matrix.row_ptr.len(),
            matrix.rows + 1,
        )));
    }

    if rhs.len() != matrix.rows {
        return Err(ValidationError::DimensionMismatch(format!(
            "rhs length {} does not match matrix rows {}",
            rhs.len(),
            matrix.rows,
        )));
    }

    if let Some((i, v)) = rhs.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ValidationError::NonFiniteValue(format!("rhs[{i}] = {v}")));
    }

    Ok(())
}
