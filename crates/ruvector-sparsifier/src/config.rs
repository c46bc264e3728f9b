//! Configuration for the sparsifier and its effective-resistance engines.
//!
//! All structs are serde-serialisable and carry `#[serde(default)]`, so a
//! partial document only needs to name the fields it overrides.
//!
//! ```
//! use ruvector_sparsifier::config::SparsifierConfig;
//! use ruvector_sparsifier::types::ErPolicy;
//!
//! let config = SparsifierConfig {
//!     epsilon: 0.5,
//!     policy: ErPolicy::Exact,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{ErPolicy, SamplingStrategy};
use crate::validation::{validate_positive, validate_probability, validate_solver_params};

// ---------------------------------------------------------------------------
// SolverConfig
// ---------------------------------------------------------------------------

/// Parameters of the Laplacian linear solve shared by both ER engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Relative residual tolerance, `||r|| < tolerance * ||b||`.
    ///
    /// Default: `1e-10`.
    pub tolerance: f64,

    /// Iteration cap per solve.
    ///
    /// Default: `300`.
    pub max_iterations: usize,

    /// Apply Jacobi (diagonal) preconditioning.
    ///
    /// Default: `true`.
    pub use_preconditioner: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 300,
            use_preconditioner: true,
        }
    }
}

impl SolverConfig {
    /// Check tolerance and iteration cap.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_solver_params(self.tolerance, self.max_iterations)
    }
}

// ---------------------------------------------------------------------------
// ApproximateConfig
// ---------------------------------------------------------------------------

/// Tuning of the Johnson-Lindenstrauss effective-resistance estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximateConfig {
    /// Accuracy knob. The number of projection rounds is
    /// `ceil(log2(n / solver_eps))`, so smaller values mean more rounds.
    ///
    /// Default: `1.0`.
    pub solver_eps: f64,

    /// Sign threshold of the projection: a uniform draw above it yields a
    /// positive entry. `0.5` gives balanced signs.
    ///
    /// Default: `0.5`.
    pub jl_tolerance: f64,
}

impl Default for ApproximateConfig {
    fn default() -> Self {
        Self {
            solver_eps: 1.0,
            jl_tolerance: 0.5,
        }
    }
}

impl ApproximateConfig {
    /// Check `solver_eps > 0` and `jl_tolerance` in `[0, 1]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive("solver_eps", self.solver_eps)?;
        validate_probability("jl_tolerance", self.jl_tolerance)
    }
}

// ---------------------------------------------------------------------------
// SparsifierConfig
// ---------------------------------------------------------------------------

/// Full configuration of a [`SpectralSparsifier`](crate::sparsifier::SpectralSparsifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SparsifierConfig {
    /// Oversampling constant `C` in `p_i = min(1, er_i w_i C ln(n) / eps^2)`.
    ///
    /// Default: `4.0`.
    pub c: f64,

    /// Target spectral approximation error.
    ///
    /// Default: `0.3`.
    pub epsilon: f64,

    /// Effective-resistance algorithm.
    ///
    /// Default: [`ErPolicy::Approximate`].
    pub policy: ErPolicy,

    /// How edges are drawn from the sampling distribution.
    ///
    /// Default: [`SamplingStrategy::WithReplacement`].
    pub strategy: SamplingStrategy,

    /// Linear solver parameters.
    pub solver: SolverConfig,

    /// Approximate-ER parameters; ignored under [`ErPolicy::Exact`].
    pub approximate: ApproximateConfig,

    /// Seed for every random draw. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SparsifierConfig {
    fn default() -> Self {
        Self {
            c: 4.0,
            epsilon: 0.3,
            policy: ErPolicy::Approximate,
            strategy: SamplingStrategy::WithReplacement,
            solver: SolverConfig::default(),
            approximate: ApproximateConfig::default(),
            seed: None,
        }
    }
}

impl SparsifierConfig {
    /// Apply every hyperparameter check.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive("c", self.c)?;
        validate_positive("epsilon", self.epsilon)?;
        self.solver.validate()?;
        self.approximate.validate()
    }
}
