//! Core types for graph matrices and sparsifier state.
//!
//! Provides [`CsrMatrix`] for compressed sparse row storage of the graph's
//! algebraic views, the [`ComputeStatus`] state machine value, and the
//! policy/strategy selectors shared by the engines and the sparsifier.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CsrMatrix<T>
// ---------------------------------------------------------------------------

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores only non-zero entries for efficient sparse matrix-vector
/// multiplication in O(nnz) time.
///
/// # Layout
///
/// For a matrix with `m` rows and `nnz` non-zeros:
/// - `row_ptr` has length `m + 1`
/// - `col_indices` and `values` each have length `nnz`
/// - Row `i` spans indices `row_ptr[i]..row_ptr[i+1]`, sorted by column
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix<T> {
    /// Row pointers: `row_ptr[i]` is the start index in `col_indices`/`values`
    /// for row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices for each non-zero entry.
    pub col_indices: Vec<usize>,
    /// Values for each non-zero entry.
    pub values: Vec<T>,
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
}

impl<T: Copy + Default + std::ops::Mul<Output = T> + std::ops::AddAssign> CsrMatrix<T> {
    /// Sparse matrix-vector multiply: `y = A * x`.
    ///
    /// # Panics
    ///
    /// Debug-asserts that `x.len() >= self.cols` and `y.len() >= self.rows`.
    #[inline]
    pub fn spmv(&self, x: &[T], y: &mut [T]) {
        debug_assert!(
            x.len() >= self.cols,
            "spmv: x.len()={} < cols={}",
            x.len(),
            self.cols,
        );
        debug_assert!(
            y.len() >= self.rows,
            "spmv: y.len()={} < rows={}",
            y.len(),
            self.rows,
        );

        for i in 0..self.rows {
            let mut sum = T::default();
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];

            for idx in start..end {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            y[i] = sum;
        }
    }
}

impl<T> CsrMatrix<T> {
    /// Number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Number of stored entries in a specific row.
    #[inline]
    pub fn row_degree(&self, row: usize) -> usize {
        self.row_ptr[row + 1] - self.row_ptr[row]
    }

    /// Iterate over `(col_index, &value)` pairs for the given row.
    #[inline]
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, &T)> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        self.col_indices[start..end]
            .iter()
            .copied()
            .zip(self.values[start..end].iter())
    }
}

impl<T: Copy + Default + std::ops::AddAssign> CsrMatrix<T> {
    /// Build a CSR matrix from COO (coordinate) triplets.
    ///
    /// Entries are sorted by (row, col) and duplicate positions are summed,
    /// matching triplet-assembly semantics: a self-loop pushed twice lands as
    /// one entry holding twice the weight.
    ///
    /// # Panics
    ///
    /// Panics if a row or column index is out of bounds. Callers in this crate
    /// only pass indices they derived the dimensions from.
    pub fn from_coo_generic(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, T)>,
    ) -> Self {
        let mut sorted: Vec<_> = entries.into_iter().collect();
        sorted.sort_by_key(|(r, c, _)| (*r, *c));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_indices = Vec::with_capacity(sorted.len());
        let mut values: Vec<T> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            assert!(r < rows, "row index {} out of bounds (rows={})", r, rows);
            assert!(c < cols, "col index {} out of bounds (cols={})", c, cols);

            if last == Some((r, c)) {
                if let Some(slot) = values.last_mut() {
                    *slot += v;
                }
                continue;
            }
            row_ptr[r + 1] += 1;
            col_indices.push(c);
            values.push(v);
            last = Some((r, c));
        }
        for i in 1..=rows {
            row_ptr[i] += row_ptr[i - 1];
        }

        Self {
            row_ptr,
            col_indices,
            values,
            rows,
            cols,
        }
    }

    /// Square diagonal matrix with `diag[i]` at `(i, i)`.
    pub fn from_diagonal(diag: &[T]) -> Self {
        let n = diag.len();
        Self {
            row_ptr: (0..=n).collect(),
            col_indices: (0..n).collect(),
            values: diag.to_vec(),
            rows: n,
            cols: n,
        }
    }

    /// Value stored at `(row, col)`, or `T::default()` when the position is
    /// structurally zero.
    pub fn get(&self, row: usize, col: usize) -> T {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_indices[start..end].binary_search(&col) {
            Ok(pos) => self.values[start + pos],
            Err(_) => T::default(),
        }
    }

    /// Main diagonal as a dense vector of length `min(rows, cols)`.
    pub fn diagonal(&self) -> Vec<T> {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).collect()
    }

    /// Dense row-major copy. Intended for small matrices and diagnostics.
    pub fn to_dense(&self) -> Vec<Vec<T>> {
        let mut dense = vec![vec![T::default(); self.cols]; self.rows];
        for (row, dense_row) in dense.iter_mut().enumerate() {
            for (col, &v) in self.row_entries(row) {
                dense_row[col] += v;
            }
        }
        dense
    }
}

impl CsrMatrix<f64> {
    /// Build a CSR matrix from COO (coordinate) triplets (f64 variant).
    ///
    /// Entries are sorted by (row, col); duplicate positions are summed.
    pub fn from_coo(
        rows: usize,
        cols: usize,
        entries: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        Self::from_coo_generic(rows, cols, entries)
    }

    /// Build a square identity matrix of dimension `n` in CSR format.
    pub fn identity(n: usize) -> Self {
        Self::from_diagonal(&vec![1.0f64; n])
    }

    /// Element-wise square root of every stored value.
    ///
    /// Used for `sqrt(W)` when projecting incidence rows.
    pub fn sqrt_values(&self) -> Self {
        Self {
            row_ptr: self.row_ptr.clone(),
            col_indices: self.col_indices.clone(),
            values: self.values.iter().map(|v| v.sqrt()).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Sum of the stored values in `row`.
    pub fn row_sum(&self, row: usize) -> f64 {
        self.row_entries(row).map(|(_, v)| *v).sum()
    }
}

// ---------------------------------------------------------------------------
// State machine and selectors
// ---------------------------------------------------------------------------

/// Status of an effective-resistance computation.
///
/// A sparsifier starts in [`NotComputed`](Self::NotComputed); every
/// `compute()` call resolves it to one of the other three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComputeStatus {
    /// No computation has been run yet.
    NotComputed,
    /// The ER vector is complete and trustworthy.
    Successful,
    /// At least one linear solve hit its iteration cap, or the result is
    /// structurally invalid.
    NotConverging,
    /// A linear solve broke down numerically.
    NumericalIssue,
}

impl ComputeStatus {
    /// `true` once a computation has been attempted.
    #[inline]
    pub fn is_computed(self) -> bool {
        self != ComputeStatus::NotComputed
    }
}

impl std::fmt::Display for ComputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeStatus::NotComputed => write!(f, "not-computed"),
            ComputeStatus::Successful => write!(f, "successful"),
            ComputeStatus::NotConverging => write!(f, "not-converging"),
            ComputeStatus::NumericalIssue => write!(f, "numerical-issue"),
        }
    }
}

/// Effective-resistance algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErPolicy {
    /// One Laplacian solve per edge: `er_i = b_i^T L^+ b_i`.
    Exact,
    /// Johnson-Lindenstrauss batched estimate using `O(log n)` solves.
    Approximate,
}

impl std::fmt::Display for ErPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErPolicy::Exact => write!(f, "exact"),
            ErPolicy::Approximate => write!(f, "approximate"),
        }
    }
}

/// How the sparsifier turns sampling weights into a reduced edge set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SamplingStrategy {
    /// Draw `ceil(n ln n / eps^2)` edges with replacement from the
    /// distribution proportional to the sampling weights.
    WithReplacement,
    /// Keep every edge independently with probability `p_i`.
    EveryEdge,
}

// ---------------------------------------------------------------------------
// Solver result
// ---------------------------------------------------------------------------

/// Outcome of a single linear solve.
///
/// Returned even when the iteration cap was hit; inspect
/// [`converged`](Self::converged) before trusting `solution`.
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// Last iterate of the solution vector x.
    pub solution: Vec<f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Final residual L2 norm.
    pub residual_norm: f64,
    /// Whether the residual reached the requested tolerance.
    pub converged: bool,
    /// Wall-clock time taken.
    pub wall_time: Duration,
}
