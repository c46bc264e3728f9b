//! Conjugate Gradient solver for graph Laplacian systems.
//!
//! Solves `L x = b` where `L` is a symmetric positive-semidefinite sparse
//! Laplacian in CSR format. For a Laplacian the system is singular (the
//! all-ones vector spans the kernel of each connected component), but CG
//! started from `x = 0` stays in the range of `L` whenever `b` does, which
//! holds for every incidence-derived right-hand side used by this crate.
//!
//! # Algorithm
//!
//! ```text
//! r = b - L*x            (x = 0, so r = b)
//! z = M^{-1} * r         (Jacobi preconditioner; z = r when disabled)
//! p = z
//! rz = r . z
//!
//! for k in 0..max_iterations:
//!     Lp = L * p
//!     alpha = rz / (p . Lp)
//!     x  = x + alpha * p
//!     r  = r - alpha * Lp
//!     if ||r||_2 < tolerance * ||b||_2:
//!         converged; break
//!     z  = M^{-1} * r
//!     rz_new = r . z
//!     beta = rz_new / rz
//!     p  = z + beta * p
//!     rz = rz_new
//! ```
//!
//! # Iteration cap
//!
//! When `max_iterations` is exhausted the last iterate is returned with
//! [`SolverResult::converged`] set to `false`. Callers decide whether a
//! best-effort answer is acceptable.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::traits::LinearSystemSolver;
use crate::types::{CsrMatrix, SolverResult};
use crate::validation::{validate_solver_params, validate_system};

// ═══════════════════════════════════════════════════════════════════════════
// Helper functions
// ═══════════════════════════════════════════════════════════════════════════

/// Dot product with 4-wide accumulation.
///
/// # Panics
///
/// Panics if `a.len() != b.len()`.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let n = a.len();
    let chunks = n / 4;
    let remainder = n % 4;

    let mut acc0: f64 = 0.0;
    let mut acc1: f64 = 0.0;
    let mut acc2: f64 = 0.0;
    let mut acc3: f64 = 0.0;

    for i in 0..chunks {
        let j = i * 4;
        acc0 += a[j] * b[j];
        acc1 += a[j + 1] * b[j + 1];
        acc2 += a[j + 2] * b[j + 2];
        acc3 += a[j + 3] * b[j + 3];
    }

    let base = chunks * 4;
    for i in 0..remainder {
        acc0 += a[base + i] * b[base + i];
    }

    (acc0 + acc1) + (acc2 + acc3)
}

/// Compute `y[i] += alpha * x[i]` for all `i`.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "axpy: length mismatch");

    let n = x.len();
    let chunks = n / 4;
    let base = chunks * 4;

    for i in 0..chunks {
        let j = i * 4;
        y[j] += alpha * x[j];
        y[j + 1] += alpha * x[j + 1];
        y[j + 2] += alpha * x[j + 2];
        y[j + 3] += alpha * x[j + 3];
    }
    for i in base..n {
        y[i] += alpha * x[i];
    }
}

/// L2 norm.
#[inline]
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

// ═══════════════════════════════════════════════════════════════════════════
// ConjugateGradientSolver
// ═══════════════════════════════════════════════════════════════════════════

/// Conjugate Gradient solver for Laplacian systems.
///
/// Stores the solver configuration only; the solve itself is stateless and
/// may be invoked concurrently from multiple threads.
#[derive(Debug, Clone)]
pub struct ConjugateGradientSolver {
    /// Relative residual convergence tolerance.
    ///
    /// The solver declares convergence when `||r||_2 < tolerance * ||b||_2`.
    tolerance: f64,

    /// Maximum number of CG iterations before giving up.
    max_iterations: usize,

    /// Whether to apply diagonal (Jacobi) preconditioning, `M = diag(L)`.
    use_preconditioner: bool,
}

impl Default for ConjugateGradientSolver {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl ConjugateGradientSolver {
    /// Create a new CG solver.
    ///
    /// # Arguments
    ///
    /// * `tolerance` -- Relative residual threshold for convergence, in
    ///   `(0, 1]`.
    /// * `max_iterations` -- Upper bound on CG iterations. Must be >= 1.
    /// * `use_preconditioner` -- Enable diagonal (Jacobi) preconditioning.
    pub fn new(tolerance: f64, max_iterations: usize, use_preconditioner: bool) -> Self {
        Self {
            tolerance,
            max_iterations,
            use_preconditioner,
        }
    }

    /// Build a solver from its configuration block.
    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(
            config.tolerance,
            config.max_iterations,
            config.use_preconditioner,
        )
    }

    /// Return the configured tolerance.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Return whether preconditioning is enabled.
    #[inline]
    pub fn use_preconditioner(&self) -> bool {
        self.use_preconditioner
    }

    /// Build the Jacobi preconditioner `inv_diag[i] = 1 / L_ii`.
    ///
    /// Zero diagonal entries (isolated node indices) are replaced with `1.0`.
    fn build_jacobi_preconditioner(matrix: &CsrMatrix<f64>) -> Vec<f64> {
        matrix
            .diagonal()
            .into_iter()
            .map(|d| if d.abs() > f64::EPSILON { 1.0 / d } else { 1.0 })
            .collect()
    }

    /// Apply the diagonal preconditioner: `z[i] = inv_diag[i] * r[i]`.
    #[inline]
    fn apply_preconditioner(inv_diag: &[f64], r: &[f64], z: &mut [f64]) {
        for ((zi, &ri), &di) in z.iter_mut().zip(r.iter()).zip(inv_diag.iter()) {
            *zi = di * ri;
        }
    }

    /// Core CG loop. Inputs are validated by the caller.
    fn solve_inner(
        &self,
        matrix: &CsrMatrix<f64>,
        rhs: &[f64],
    ) -> Result<SolverResult, SolverError> {
        let start_time = Instant::now();
        let n = matrix.rows;

        let mut x = vec![0.0f64; n];

        let b_norm = norm2(rhs);
        // Zero RHS (self-loop incidence rows, empty systems): x = 0 is exact.
        if n == 0 || b_norm < f64::EPSILON {
            return Ok(SolverResult {
                solution: x,
                iterations: 0,
                residual_norm: 0.0,
                converged: true,
                wall_time: start_time.elapsed(),
            });
        }

        let mut r = rhs.to_vec();
        let mut z = vec![0.0f64; n];
        let mut p = vec![0.0f64; n];
        let mut lp = vec![0.0f64; n];

        let inv_diag = if self.use_preconditioner {
            Some(Self::build_jacobi_preconditioner(matrix))
        } else {
            None
        };

        let abs_tolerance = self.tolerance * b_norm;

        match &inv_diag {
            Some(diag) => Self::apply_preconditioner(diag, &r, &mut z),
            None => z.copy_from_slice(&r),
        }
        p.copy_from_slice(&z);
        let mut rz = dot(&r, &z);

        debug!(
            "CG: n={}, nnz={}, tol={:.2e}, max_iter={}, precond={}",
            n,
            matrix.nnz(),
            self.tolerance,
            self.max_iterations,
            self.use_preconditioner,
        );

        let mut iterations = 0;
        let mut r_norm = b_norm;
        let mut converged = false;

        for k in 0..self.max_iterations {
            matrix.spmv(&p, &mut lp);

            let p_dot_lp = dot(&p, &lp);
            if p_dot_lp.is_nan() || p_dot_lp <= 0.0 {
                warn!("CG: non-positive p.Lp = {p_dot_lp:.4e} at iteration {k}");
                return Err(SolverError::NumericalInstability {
                    iteration: k,
                    detail: format!(
                        "p.Lp = {p_dot_lp:.6e} <= 0; rhs may not lie in the range of L",
                    ),
                });
            }

            let alpha = rz / p_dot_lp;
            axpy(alpha, &p, &mut x);
            axpy(-alpha, &lp, &mut r);

            iterations = k + 1;
            r_norm = norm2(&r);

            trace!(
                "CG iter {k}: ||r|| = {r_norm:.6e}, rel = {:.6e}",
                r_norm / b_norm,
            );

            if !r_norm.is_finite() {
                return Err(SolverError::NumericalInstability {
                    iteration: k,
                    detail: format!("residual norm became {r_norm}"),
                });
            }

            if r_norm < abs_tolerance {
                converged = true;
                debug!(
                    "CG converged at iteration {k}: ||r|| = {r_norm:.6e}, rel = {:.6e}",
                    r_norm / b_norm,
                );
                break;
            }

            match &inv_diag {
                Some(diag) => Self::apply_preconditioner(diag, &r, &mut z),
                None => z.copy_from_slice(&r),
            }

            let rz_new = dot(&r, &z);

            if rz.abs() < f64::EPSILON * f64::EPSILON {
                warn!("CG: rz near zero at iteration {k}, stagnation");
                return Err(SolverError::NumericalInstability {
                    iteration: k,
                    detail: format!("rz = {rz:.6e} is near zero; solver stagnated"),
                });
            }

            let beta = rz_new / rz;
            for (pi, &zi) in p.iter_mut().zip(z.iter()) {
                *pi = zi + beta * *pi;
            }
            rz = rz_new;
        }

        if !converged {
            debug!(
                "CG: iteration cap {} reached, ||r|| = {r_norm:.6e} (target {abs_tolerance:.6e})",
                self.max_iterations,
            );
        }

        Ok(SolverResult {
            solution: x,
            iterations,
            residual_norm: r_norm,
            converged,
            wall_time: start_time.elapsed(),
        })
    }
}

impl LinearSystemSolver for ConjugateGradientSolver {
    /// Solve `L x = b` using the Conjugate Gradient method.
    ///
    /// # Errors
    ///
    /// * [`SolverError::InvalidInput`] -- dimension mismatch or invalid params.
    /// * [`SolverError::NumericalInstability`] -- breakdown of the recurrence.
    fn solve(
        &self,
        laplacian: &CsrMatrix<f64>,
        rhs: &[f64],
    ) -> Result<SolverResult, SolverError> {
        validate_solver_params(self.tolerance, self.max_iterations)?;
        validate_system(laplacian, rhs)?;
        self.solve_inner(laplacian, rhs)
    }

    #[inline]
    fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
