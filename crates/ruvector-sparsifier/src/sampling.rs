//! Importance sampling of edges by effective resistance.
//!
//! Edge `i` gets the sampling weight
//!
//! ```text
//! p_i = min(1, er_i * w_i * C * ln(n) / eps^2)
//! ```
//!
//! and each kept copy of it is reweighted by `w_i / p_i`, so the expected
//! sparsified Laplacian equals the original one up to the overall number of
//! draws.

use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{Result, SparsifierError};
use crate::validation::validate_sample_count;

/// `ln(n)`, taken as zero for graphs with fewer than two nodes.
#[inline]
fn ln_nodes(node_count: usize) -> f64 {
    if node_count < 2 {
        0.0
    } else {
        (node_count as f64).ln()
    }
}

/// Per-edge sampling weights `p_i = min(1, er_i w_i C ln(n) / eps^2)`.
///
/// Negative or non-finite products are mapped to `0`.
pub fn sampling_probabilities(
    er: &[f64],
    weights: &[f64],
    c: f64,
    epsilon: f64,
    node_count: usize,
) -> Vec<f64> {
    let factor = c * ln_nodes(node_count) / (epsilon * epsilon);
    er.iter()
        .zip(weights.iter())
        .map(|(&r, &w)| {
            let p = r * w * factor;
            if p.is_finite() && p > 0.0 {
                p.min(1.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Number of draws `ceil(n ln(n) / eps^2)`.
///
/// # Errors
///
/// [`SparsifierError::InvalidArgument`] if the count exceeds
/// [`MAX_SAMPLE_DRAWS`](crate::validation::MAX_SAMPLE_DRAWS), which happens
/// for a very small `epsilon`.
pub fn sampling_count(node_count: usize, epsilon: f64) -> Result<usize> {
    let count = (node_count as f64 * ln_nodes(node_count) / (epsilon * epsilon)).ceil();
    Ok(validate_sample_count(count)?)
}

/// Discrete distribution over edge indices proportional to their weights.
#[derive(Debug, Clone)]
pub struct EdgeSampler {
    dist: WeightedIndex<f64>,
    len: usize,
}

impl EdgeSampler {
    /// Build a sampler over `weights`.
    ///
    /// # Errors
    ///
    /// [`SparsifierError::DegenerateDistribution`] if `weights` is empty,
    /// sums to zero, or holds a negative or non-finite entry.
    pub fn new(weights: &[f64]) -> Result<Self> {
        let dist = WeightedIndex::new(weights)
            .map_err(|e| SparsifierError::DegenerateDistribution(e.to_string()))?;
        Ok(Self {
            dist,
            len: weights.len(),
        })
    }

    /// Number of edges in the support.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when the support is empty (never, for a constructed sampler).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Draw one edge index.
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        self.dist.sample(rng)
    }
}

/// Sum the contributions `w_i / p_i` of every draw, keyed by edge index.
///
/// Duplicate draws of the same edge accumulate. Draws are consumed one at a
/// time, so memory is bounded by the number of distinct edges.
pub fn aggregate_draws<I: IntoIterator<Item = usize>>(
    draws: I,
    weights: &[f64],
    probabilities: &[f64],
) -> BTreeMap<usize, f64> {
    let mut acc = BTreeMap::new();
    for i in draws {
        *acc.entry(i).or_insert(0.0) += weights[i] / probabilities[i];
    }
    acc
}

/// Keep each edge independently with probability `p_i`, reweighted to
/// `w_i / p_i`.
pub fn bernoulli_keep<R: Rng + ?Sized>(
    weights: &[f64],
    probabilities: &[f64],
    rng: &mut R,
) -> BTreeMap<usize, f64> {
    weights
        .iter()
        .zip(probabilities.iter())
        .enumerate()
        .filter(|&(_, (_, &p))| p > 0.0 && rng.gen_bool(p))
        .map(|(i, (&w, &p))| (i, w / p))
        .collect()
}
