//! Spectral sparsification by effective-resistance sampling.
//!
//! [`SpectralSparsifier`] is a small state machine:
//!
//! ```text
//! NotComputed --compute()--> Successful | NotConverging | NumericalIssue
//!      ^                                   |
//!      +--------- compute() again ---------+   (re-resolves the status)
//! ```
//!
//! [`compute`](SpectralSparsifier::compute) runs the configured
//! effective-resistance engine over the source graph.
//! [`sparsified_graph`](SpectralSparsifier::sparsified_graph) turns the ER
//! vector into sampling probabilities, draws edges and returns a new,
//! reweighted [`Graph`]. Sampling uses fresh randomness on every call unless a
//! seed is configured.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

use crate::cg::ConjugateGradientSolver;
use crate::config::SparsifierConfig;
use crate::error::{Result, SparsifierError};
use crate::graph::Graph;
use crate::resistance::ResistanceEngine;
use crate::sampling::{
    aggregate_draws, bernoulli_keep, sampling_count, sampling_probabilities, EdgeSampler,
};
use crate::traits::{EffectiveResistance, ResistanceEstimate};
use crate::types::{ComputeStatus, ErPolicy, SamplingStrategy};
use crate::validation::validate_positive;

/// Effective-resistance based spectral sparsifier of a shared graph.
#[derive(Debug)]
pub struct SpectralSparsifier {
    graph: Arc<Graph>,
    config: SparsifierConfig,
    status: ComputeStatus,
    estimate: Option<ResistanceEstimate>,
}

impl SpectralSparsifier {
    /// Create a sparsifier with hyperparameters `c`, `epsilon` and an ER
    /// policy; everything else takes its default.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `c > 0` and `epsilon > 0`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use ruvector_sparsifier::graph::Graph;
    /// use ruvector_sparsifier::sparsifier::SpectralSparsifier;
    /// use ruvector_sparsifier::types::{ComputeStatus, ErPolicy};
    ///
    /// let g = Arc::new(Graph::unweighted(vec![(0, 1), (1, 2), (2, 0)]).unwrap());
    /// let mut s = SpectralSparsifier::new(g, 4.0, 0.5, ErPolicy::Exact).unwrap();
    /// assert_eq!(s.compute().unwrap(), ComputeStatus::Successful);
    /// let sparse = s.sparsified_graph().unwrap();
    /// assert!(sparse.edge_count() <= 3);
    /// ```
    pub fn new(graph: Arc<Graph>, c: f64, epsilon: f64, policy: ErPolicy) -> Result<Self> {
        Self::from_config(
            graph,
            SparsifierConfig {
                c,
                epsilon,
                policy,
                ..Default::default()
            },
        )
    }

    /// Create a sparsifier from a full configuration.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if [`SparsifierConfig::validate`] fails.
    pub fn from_config(graph: Arc<Graph>, config: SparsifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            graph,
            config,
            status: ComputeStatus::NotComputed,
            estimate: None,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Source graph.
    #[inline]
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }

    /// Current configuration.
    #[inline]
    pub fn config(&self) -> &SparsifierConfig {
        &self.config
    }

    /// Oversampling constant `C`.
    #[inline]
    pub fn c(&self) -> f64 {
        self.config.c
    }

    /// Target approximation error.
    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.config.epsilon
    }

    /// Selected ER policy.
    #[inline]
    pub fn policy(&self) -> ErPolicy {
        self.config.policy
    }

    /// Selected sampling strategy.
    #[inline]
    pub fn strategy(&self) -> SamplingStrategy {
        self.config.strategy
    }

    /// Outcome of the last [`compute`](Self::compute).
    #[inline]
    pub fn status(&self) -> ComputeStatus {
        self.status
    }

    /// ER vector of the last computation; empty before the first one.
    pub fn effective_resistance(&self) -> &[f64] {
        match &self.estimate {
            Some(estimate) => &estimate.values,
            None => &[],
        }
    }

    /// Full result of the last computation, including solve counts.
    pub fn last_estimate(&self) -> Option<&ResistanceEstimate> {
        self.estimate.as_ref()
    }

    // -----------------------------------------------------------------------
    // Setters
    // -----------------------------------------------------------------------

    /// Set `C`. Does not invalidate a previous computation.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `c > 0`; the old value is kept.
    pub fn set_c(&mut self, c: f64) -> Result<()> {
        validate_positive("c", c)?;
        self.config.c = c;
        Ok(())
    }

    /// Set `epsilon`. Does not invalidate a previous computation.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` unless `epsilon > 0`; the old value is kept.
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        validate_positive("epsilon", epsilon)?;
        self.config.epsilon = epsilon;
        Ok(())
    }

    /// Switch the ER policy used by the next [`compute`](Self::compute).
    pub fn set_policy(&mut self, policy: ErPolicy) {
        self.config.policy = policy;
    }

    /// Switch the sampling strategy.
    pub fn set_strategy(&mut self, strategy: SamplingStrategy) {
        self.config.strategy = strategy;
    }

    /// Fix (or clear) the seed of every random draw.
    pub fn set_seed(&mut self, seed: Option<u64>) {
        self.config.seed = seed;
    }

    // -----------------------------------------------------------------------
    // Computation
    // -----------------------------------------------------------------------

    fn engine(&self) -> Result<ResistanceEngine> {
        ResistanceEngine::from_policy(
            self.config.policy,
            ConjugateGradientSolver::from_config(&self.config.solver),
            &self.config.approximate,
            self.config.seed,
        )
    }

    /// Compute effective resistance for every edge and resolve the status.
    ///
    /// Numerical trouble is reported through the returned status, not as an
    /// error.
    ///
    /// # Errors
    ///
    /// Only if the computation cannot be attempted; the previous state is
    /// then left untouched.
    #[instrument(
        skip(self),
        fields(
            policy = %self.config.policy,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
        )
    )]
    pub fn compute(&mut self) -> Result<ComputeStatus> {
        let estimate = self.engine()?.calculate_er(&self.graph)?;
        Ok(self.store(estimate))
    }

    /// Like [`compute`](Self::compute) with randomness from `rng`.
    pub fn compute_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ComputeStatus> {
        let estimate = self.engine()?.calculate_er_with_rng(&self.graph, rng)?;
        Ok(self.store(estimate))
    }

    fn store(&mut self, estimate: ResistanceEstimate) -> ComputeStatus {
        if estimate.status != ComputeStatus::Successful {
            warn!(
                status = %estimate.status,
                failed = estimate.solves_failed,
                attempted = estimate.solves_attempted,
                "effective resistance computed with issues"
            );
        }
        info!(
            status = %estimate.status,
            solves = estimate.solves_attempted,
            "effective resistance computed"
        );
        self.status = estimate.status;
        self.estimate = Some(estimate);
        self.status
    }

    // -----------------------------------------------------------------------
    // Sampling
    // -----------------------------------------------------------------------

    /// Sampling weight `p_i` of every edge under the current `C` and
    /// `epsilon`.
    ///
    /// # Errors
    ///
    /// [`SparsifierError::NotComputed`] before the first `compute`.
    pub fn sampling_probabilities(&self) -> Result<Vec<f64>> {
        if !self.status.is_computed() {
            return Err(SparsifierError::NotComputed);
        }
        Ok(sampling_probabilities(
            self.effective_resistance(),
            self.graph.weights(),
            self.config.c,
            self.config.epsilon,
            self.graph.node_count(),
        ))
    }

    /// Draw a sparsified graph.
    ///
    /// Uses `StdRng::seed_from_u64(seed)` when a seed is configured and OS
    /// entropy otherwise.
    ///
    /// # Errors
    ///
    /// * [`SparsifierError::NotComputed`] before the first `compute`.
    /// * [`SparsifierError::DegenerateDistribution`] if samples are requested
    ///   but every sampling weight is zero.
    /// * [`SparsifierError::InvalidArgument`] if `epsilon` is so small that
    ///   the draw count exceeds
    ///   [`MAX_SAMPLE_DRAWS`](crate::validation::MAX_SAMPLE_DRAWS).
    pub fn sparsified_graph(&self) -> Result<Arc<Graph>> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.sparsified_graph_with_rng(&mut rng)
    }

    /// Draw a sparsified graph using a caller-owned generator.
    ///
    /// # Errors
    ///
    /// Same as [`sparsified_graph`](Self::sparsified_graph).
    pub fn sparsified_graph_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Arc<Graph>> {
        let probabilities = self.sampling_probabilities()?;
        let weights = self.graph.weights();

        let kept: BTreeMap<usize, f64> = match self.config.strategy {
            SamplingStrategy::WithReplacement => {
                let count = sampling_count(self.graph.node_count(), self.config.epsilon)?;
                if count == 0 || probabilities.is_empty() {
                    BTreeMap::new()
                } else {
                    let sampler = EdgeSampler::new(&probabilities)?;
                    let draws = (0..count).map(|_| sampler.sample(rng));
                    let acc = aggregate_draws(draws, weights, &probabilities);
                    debug!(draws = count, distinct = acc.len(), "edges drawn with replacement");
                    acc
                }
            }
            SamplingStrategy::EveryEdge => bernoulli_keep(weights, &probabilities, rng),
        };

        let (edges, new_weights): (Vec<_>, Vec<_>) = kept
            .into_iter()
            .map(|(i, w)| (self.graph.edges()[i], w))
            .unzip();

        let sparse = Graph::new(edges, new_weights)?;
        info!(
            strategy = ?self.config.strategy,
            original_edges = self.graph.edge_count(),
            kept_edges = sparse.edge_count(),
            "sparsified graph built"
        );
        Ok(Arc::new(sparse))
    }
}
