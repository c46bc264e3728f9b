//! Johnson-Lindenstrauss random sign projection.
//!
//! Each entry is drawn uniformly from `[0, 1)` and mapped to
//! `+1/sqrt(scale)` when it exceeds the sign threshold and `-1/sqrt(scale)`
//! otherwise. A threshold of `0.5` yields balanced Rademacher signs; the
//! `1/sqrt(scale)` normalisation makes the sum of `scale` squared
//! projections an unbiased estimate of a squared norm.

use rand::Rng;

use crate::error::ValidationError;
use crate::validation::validate_probability;

/// Dense row-major projection matrix.
pub type ProjectionMatrix = Vec<Vec<f64>>;

/// Generator of random sign/scale projection matrices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomProjector {
    tol_prob: f64,
}

impl Default for RandomProjector {
    fn default() -> Self {
        Self { tol_prob: 0.5 }
    }
}

impl RandomProjector {
    /// Create a projector with sign threshold `tol_prob`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ParameterOutOfRange`] unless `tol_prob` is in
    /// `[0, 1]`.
    pub fn new(tol_prob: f64) -> Result<Self, ValidationError> {
        validate_probability("tol_prob", tol_prob)?;
        Ok(Self { tol_prob })
    }

    /// Sign threshold.
    #[inline]
    pub fn tol_prob(&self) -> f64 {
        self.tol_prob
    }

    /// Draw a `rows x cols` projection normalised by `1/sqrt(scale)`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::ParameterOutOfRange`] if `rows`, `cols` or `scale`
    /// is zero.
    pub fn project<R: Rng + ?Sized>(
        &self,
        rows: usize,
        cols: usize,
        scale: usize,
        rng: &mut R,
    ) -> Result<ProjectionMatrix, ValidationError> {
        check_nonzero("rows", rows)?;
        (0..rows).map(|_| self.project_row(cols, scale, rng)).collect()
    }

    /// Draw a single projection row of length `cols`.
    ///
    /// # Errors
    ///
    /// Same as [`project`](Self::project).
    pub fn project_row<R: Rng + ?Sized>(
        &self,
        cols: usize,
        scale: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>, ValidationError> {
        check_nonzero("cols", cols)?;
        check_nonzero("scale", scale)?;

        let magnitude = 1.0 / (scale as f64).sqrt();
        Ok((0..cols)
            .map(|_| {
                let r: f64 = rng.gen();
                if r > self.tol_prob {
                    magnitude
                } else {
                    -magnitude
                }
            })
            .collect())
    }
}

/// Draw a `rows x cols` projection in one call.
///
/// Equivalent to `RandomProjector::new(tol_prob)?.project(rows, cols, scale, rng)`.
pub fn random_projection_matrix<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    scale: usize,
    tol_prob: f64,
    rng: &mut R,
) -> Result<ProjectionMatrix, ValidationError> {
    RandomProjector::new(tol_prob)?.project(rows, cols, scale, rng)
}

fn check_nonzero(name: &str, value: usize) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::ParameterOutOfRange {
            name: name.into(),
            value: "0".into(),
            expected: ">= 1".into(),
        });
    }
    Ok(())
}
