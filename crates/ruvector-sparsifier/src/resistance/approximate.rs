//! Johnson-Lindenstrauss estimate of effective resistance.
//!
//! With `Z = Q W^{1/2} B L^+` for a random `k x m` sign matrix `Q`,
//! `||Z (e_u - e_v)||^2` concentrates around `er(u, v)`. Each round draws one
//! row of `Q`, forms `y = Q W^{1/2} B` (a length-`n` vector), solves
//! `L x = y` and adds `(x_u - x_v)^2` to every edge. `k` rounds are run with
//! `k = ceil(log2(n / solver_eps))`, never fewer than one.
//!
//! A round whose solve does not converge or breaks down is skipped and
//! logged; the remaining rounds still form a valid, noisier estimate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace, warn};

use crate::cg::ConjugateGradientSolver;
use crate::config::ApproximateConfig;
use crate::error::{Result, SolverError};
use crate::graph::Graph;
use crate::jl::RandomProjector;
use crate::traits::{EffectiveResistance, LinearSystemSolver, ResistanceEstimate};
use crate::types::{ComputeStatus, CsrMatrix};

/// Stride between per-round seeds derived from one base seed.
const ROUND_SEED_STRIDE: u64 = 1_000_003;

/// Randomised effective-resistance engine.
#[derive(Debug, Clone)]
pub struct ApproximateResistance<S = ConjugateGradientSolver> {
    solver: S,
    solver_eps: f64,
    projector: RandomProjector,
    seed: Option<u64>,
}

impl Default for ApproximateResistance<ConjugateGradientSolver> {
    fn default() -> Self {
        Self {
            solver: ConjugateGradientSolver::default(),
            solver_eps: 1.0,
            projector: RandomProjector::default(),
            seed: None,
        }
    }
}

impl<S: LinearSystemSolver> ApproximateResistance<S> {
    /// Build an engine from a solver and its tuning block.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `solver_eps <= 0` or `jl_tolerance` is outside
    /// `[0, 1]`.
    pub fn new(solver: S, config: &ApproximateConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            solver,
            solver_eps: config.solver_eps,
            projector: RandomProjector::new(config.jl_tolerance)?,
            seed: None,
        })
    }

    /// Fix the base seed so repeated runs produce identical estimates.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The underlying solver.
    pub fn solver(&self) -> &S {
        &self.solver
    }

    /// Number of projection rounds for a graph with `node_count` nodes.
    pub fn rounds(&self, node_count: usize) -> usize {
        let k = (node_count as f64 / self.solver_eps).log2().ceil();
        if k.is_finite() && k >= 1.0 {
            k as usize
        } else {
            1
        }
    }

    /// Estimate effective resistance with rounds seeded from `rng`.
    ///
    /// Only one value is drawn from `rng`; it becomes the base seed of the
    /// per-round generators.
    pub fn calculate_er_with_rng<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        rng: &mut R,
    ) -> Result<ResistanceEstimate> {
        let base_seed: u64 = rng.gen();
        self.run(graph, base_seed)
    }

    fn run(&self, graph: &Graph, base_seed: u64) -> Result<ResistanceEstimate> {
        let m = graph.edge_count();
        if m == 0 {
            return Ok(ResistanceEstimate {
                values: Vec::new(),
                status: ComputeStatus::Successful,
                solves_attempted: 0,
                solves_failed: 0,
            });
        }

        let rounds = self.rounds(graph.node_count());
        let sqrt_w = graph.weight_matrix().sqrt_values();

        debug!(
            nodes = graph.node_count(),
            edges = m,
            rounds,
            solver_eps = self.solver_eps,
            "approximate ER: starting"
        );

        #[cfg(feature = "parallel")]
        let contributions: Vec<Option<Vec<f64>>> = {
            use rayon::prelude::*;
            (0..rounds)
                .into_par_iter()
                .map(|round| self.round(graph, &sqrt_w, rounds, round, base_seed))
                .collect::<std::result::Result<_, _>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let contributions: Vec<Option<Vec<f64>>> = (0..rounds)
            .map(|round| self.round(graph, &sqrt_w, rounds, round, base_seed))
            .collect::<std::result::Result<_, _>>()?;

        // Sum in round order so the result does not depend on scheduling.
        let mut values = vec![0.0f64; m];
        let mut skipped = 0usize;
        for contribution in contributions {
            match contribution {
                Some(c) => values.iter_mut().zip(c).for_each(|(v, c)| *v += c),
                None => skipped += 1,
            }
        }

        let mut flushed = 0usize;
        for v in values.iter_mut().filter(|v| !v.is_finite()) {
            *v = 0.0;
            flushed += 1;
        }
        if flushed > 0 {
            warn!(flushed, "approximate ER: non-finite values flushed to zero");
        }

        let status = if values.len() != m || skipped == rounds {
            ComputeStatus::NotConverging
        } else {
            ComputeStatus::Successful
        };

        debug!(rounds, skipped, %status, "approximate ER finished");

        Ok(ResistanceEstimate {
            values,
            status,
            solves_attempted: rounds,
            solves_failed: skipped,
        })
    }

    /// Run one projection round. `Ok(None)` means the round was skipped.
    fn round(
        &self,
        graph: &Graph,
        sqrt_w: &CsrMatrix<f64>,
        rounds: usize,
        round: usize,
        base_seed: u64,
    ) -> Result<Option<Vec<f64>>> {
        let seed = base_seed.wrapping_add(round as u64 * ROUND_SEED_STRIDE);
        let mut rng = StdRng::seed_from_u64(seed);

        let m = graph.edge_count();
        let q = self.projector.project_row(m, rounds, &mut rng)?;

        // y = q^T W^{1/2} B
        let incidence = graph.incidence();
        let mut y = vec![0.0f64; graph.node_count()];
        for (edge, &qe) in q.iter().enumerate() {
            let s = qe * sqrt_w.get(edge, edge);
            for (col, &b) in incidence.row_entries(edge) {
                y[col] += s * b;
            }
        }

        let x = match self.solver.solve(graph.laplacian(), &y) {
            Ok(result) if result.converged => {
                trace!(
                    round,
                    iterations = result.iterations,
                    wall_time = ?result.wall_time,
                    "approximate ER: round solved"
                );
                result.solution
            }
            Ok(result) => {
                warn!(
                    round,
                    iterations = result.iterations,
                    residual = result.residual_norm,
                    wall_time = ?result.wall_time,
                    "approximate ER: round did not converge, skipping"
                );
                return Ok(None);
            }
            Err(SolverError::NumericalInstability { iteration, detail }) => {
                warn!(round, iteration, %detail, "approximate ER: round broke down, skipping");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(
            graph
                .edges()
                .iter()
                .map(|&(u, v)| {
                    let d = x[u] - x[v];
                    d * d
                })
                .collect(),
        ))
    }
}

impl<S: LinearSystemSolver> EffectiveResistance for ApproximateResistance<S> {
    fn calculate_er(&self, graph: &Graph) -> Result<ResistanceEstimate> {
        let base_seed = match self.seed {
            Some(seed) => seed,
            None => StdRng::from_entropy().gen(),
        };
        self.run(graph, base_seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use approx::assert_relative_eq;

    use crate::types::SolverResult;

    /// CG that reports every other solve as unconverged and records the
    /// solutions it handed back.
    struct AlternatingSolver {
        inner: ConjugateGradientSolver,
        calls: Mutex<Vec<(bool, Vec<f64>)>>,
    }

    impl LinearSystemSolver for AlternatingSolver {
        fn solve(
            &self,
            laplacian: &CsrMatrix<f64>,
            rhs: &[f64],
        ) -> std::result::Result<SolverResult, SolverError> {
            let mut result = self.inner.solve(laplacian, rhs)?;
            let mut calls = self.calls.lock().unwrap();
            let accepted = calls.len() % 2 == 0;
            result.converged &= accepted;
            calls.push((accepted, result.solution.clone()));
            Ok(result)
        }

        fn max_iterations(&self) -> usize {
            self.inner.max_iterations()
        }
    }

    fn default_engine() -> ApproximateResistance {
        ApproximateResistance::default()
    }

    fn complete_graph(n: usize) -> Graph {
        let mut edges = Vec::new();
        for u in 0..n {
            for v in (u + 1)..n {
                edges.push((u, v));
            }
        }
        Graph::unweighted(edges).unwrap()
    }

    #[test]
    fn round_count_follows_log2() {
        let engine = default_engine();
        assert_eq!(engine.rounds(8), 3);
        assert_eq!(engine.rounds(9), 4);
        assert_eq!(engine.rounds(1), 1);
        assert_eq!(engine.rounds(0), 1);

        let fine = ApproximateResistance::new(
            ConjugateGradientSolver::default(),
            &ApproximateConfig {
                solver_eps: 0.01,
                jl_tolerance: 0.5,
            },
        )
        .unwrap();
        assert_eq!(fine.rounds(8), 10);
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let g = complete_graph(6);
        let engine = default_engine().with_seed(42);
        let a = engine.calculate_er(&g).unwrap();
        let b = engine.calculate_er(&g).unwrap();
        assert_eq!(a.values, b.values);
        assert_eq!(a.status, ComputeStatus::Successful);
    }

    #[test]
    fn values_are_non_negative_and_finite() {
        let g = complete_graph(10);
        let est = default_engine()
            .with_seed(3)
            .calculate_er(&g)
            .unwrap();
        assert_eq!(est.values.len(), g.edge_count());
        assert!(est.values.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert_eq!(est.solves_attempted, 4);
        assert_eq!(est.solves_failed, 0);
    }

    #[test]
    fn all_rounds_skipped_is_not_converging() {
        let edges: Vec<_> = (0..40).map(|i| (i, i + 1)).collect();
        let g = Graph::unweighted(edges).unwrap();
        let engine = ApproximateResistance::new(
            ConjugateGradientSolver::new(1e-14, 1, false),
            &ApproximateConfig::default(),
        )
        .unwrap()
        .with_seed(5);
        let est = engine.calculate_er(&g).unwrap();
        assert_eq!(est.status, ComputeStatus::NotConverging);
        assert_eq!(est.solves_failed, est.solves_attempted);
        assert!(est.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn skipped_rounds_do_not_contribute() {
        let g = complete_graph(8);
        let solver = AlternatingSolver {
            inner: ConjugateGradientSolver::default(),
            calls: Mutex::new(Vec::new()),
        };
        let engine = ApproximateResistance::new(solver, &ApproximateConfig::default())
            .unwrap()
            .with_seed(11);
        let est = engine.calculate_er(&g).unwrap();

        // log2(8) = 3 rounds; the second one is reported as unconverged.
        assert_eq!(est.status, ComputeStatus::Successful);
        assert_eq!(est.solves_attempted, 3);
        assert_eq!(est.solves_failed, 1);

        let calls = engine.solver().calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        let mut expected = vec![0.0f64; g.edge_count()];
        for (_, x) in calls.iter().filter(|(accepted, _)| *accepted) {
            for (e, &(u, v)) in g.edges().iter().enumerate() {
                expected[e] += (x[u] - x[v]).powi(2);
            }
        }
        assert!(expected.iter().any(|&v| v > 0.0));
        for (got, want) in est.values.iter().zip(&expected) {
            assert_relative_eq!(*got, *want, max_relative = 1e-12, epsilon = 1e-15);
        }
    }

    #[test]
    fn invalid_tuning_rejected() {
        let bad = ApproximateConfig {
            solver_eps: 0.0,
            jl_tolerance: 0.5,
        };
        assert!(ApproximateResistance::new(ConjugateGradientSolver::default(), &bad).is_err());
    }
}
