//! Integration tests for the spectral sparsifier state machine, sampling
//! strategies and configuration.

mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ruvector_sparsifier::config::{SolverConfig, SparsifierConfig};
use ruvector_sparsifier::error::{SparsifierError, ValidationError};
use ruvector_sparsifier::graph::Graph;
use ruvector_sparsifier::sampling::sampling_count;
use ruvector_sparsifier::sparsifier::SpectralSparsifier;
use ruvector_sparsifier::types::{ComputeStatus, ErPolicy, SamplingStrategy};

use helpers::{community_graph, complete_graph, path_graph, random_connected_graph};

fn seeded(graph: Graph, policy: ErPolicy, seed: u64) -> SpectralSparsifier {
    let config = SparsifierConfig {
        policy,
        seed: Some(seed),
        ..Default::default()
    };
    SpectralSparsifier::from_config(Arc::new(graph), config).unwrap()
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[test]
fn test_sparsified_graph_before_compute_fails() {
    let s = seeded(complete_graph(5), ErPolicy::Exact, 1);
    assert_eq!(s.status(), ComputeStatus::NotComputed);
    assert!(matches!(s.sparsified_graph(), Err(SparsifierError::NotComputed)));
    assert!(matches!(s.sampling_probabilities(), Err(SparsifierError::NotComputed)));
}

#[test]
fn test_compute_resolves_status() {
    for policy in [ErPolicy::Exact, ErPolicy::Approximate] {
        let mut s = seeded(community_graph(2, 6, 0.5, 3), policy, 4);
        assert_eq!(s.compute().unwrap(), ComputeStatus::Successful);
        assert_eq!(s.status(), ComputeStatus::Successful);
        assert_eq!(s.effective_resistance().len(), s.graph().edge_count());
    }
}

#[test]
fn test_exact_compute_twice_is_identical() {
    let mut s = seeded(random_connected_graph(15, 0.3, 6), ErPolicy::Exact, 0);
    s.compute().unwrap();
    let first = s.effective_resistance().to_vec();
    s.compute().unwrap();
    assert_eq!(first, s.effective_resistance());
}

#[test]
fn test_non_converging_solver_still_allows_sampling() {
    let config = SparsifierConfig {
        policy: ErPolicy::Exact,
        solver: SolverConfig {
            tolerance: 1e-14,
            max_iterations: 1,
            use_preconditioner: false,
        },
        seed: Some(2),
        ..Default::default()
    };
    let mut s = SpectralSparsifier::from_config(Arc::new(path_graph(30)), config).unwrap();
    assert_eq!(s.compute().unwrap(), ComputeStatus::NotConverging);
    assert!(s.sparsified_graph().is_ok());
}

#[test]
fn test_invalid_hyperparameters() {
    let g = Arc::new(complete_graph(4));
    let err = SpectralSparsifier::new(g.clone(), -1.0, 0.3, ErPolicy::Exact).unwrap_err();
    assert!(matches!(
        err,
        SparsifierError::InvalidArgument(ValidationError::ParameterOutOfRange { .. })
    ));
    assert!(SpectralSparsifier::new(g.clone(), 4.0, 0.0, ErPolicy::Exact).is_err());

    let mut s = SpectralSparsifier::new(g, 4.0, 0.3, ErPolicy::Exact).unwrap();
    assert!(s.set_epsilon(f64::INFINITY).is_err());
    assert!(s.set_c(0.0).is_err());
}

// ---------------------------------------------------------------------------
// Sampling with replacement
// ---------------------------------------------------------------------------

#[test]
fn test_sparsified_edges_are_a_reweighted_subset() {
    let g = complete_graph(30);
    let original: HashSet<(usize, usize)> = g.edges().iter().copied().collect();
    let mut s = seeded(g, ErPolicy::Exact, 11);
    s.set_epsilon(1.0).unwrap();
    s.compute().unwrap();

    let probabilities = s.sampling_probabilities().unwrap();
    let sparse = s.sparsified_graph().unwrap();
    let count = sampling_count(30, 1.0).unwrap();

    assert!(sparse.edge_count() <= count);
    assert!(sparse.edge_count() <= s.graph().edge_count());

    let mut seen = HashSet::new();
    for (&edge, &w) in sparse.edges().iter().zip(sparse.weights()) {
        assert!(original.contains(&edge));
        assert!(seen.insert(edge), "duplicate edge {edge:?}");

        // Accumulated weight is a whole number of w_i / p_i contributions.
        let i = s.graph().edges().iter().position(|&e| e == edge).unwrap();
        let unit = s.graph().weights()[i] / probabilities[i];
        let copies = w / unit;
        assert_relative_eq!(copies, copies.round(), epsilon = 1e-9);
        assert!(copies.round() >= 1.0);
    }
}

#[test]
fn test_sparsifier_reduces_dense_graph() {
    // K_60 has 1770 edges; ceil(60 ln 60 / 1) = 246 draws.
    let mut s = seeded(complete_graph(60), ErPolicy::Approximate, 5);
    s.set_epsilon(1.0).unwrap();
    s.compute().unwrap();
    let sparse = s.sparsified_graph().unwrap();
    assert!(sparse.edge_count() > 0);
    assert!(sparse.edge_count() <= 246);
    assert!(sparse.edge_count() < s.graph().edge_count());
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let build = || {
        let mut s = seeded(community_graph(3, 6, 0.7, 8), ErPolicy::Approximate, 99);
        s.compute().unwrap();
        s.sparsified_graph().unwrap()
    };
    let a = build();
    let b = build();
    assert_eq!(a.edges(), b.edges());
    assert_eq!(a.weights(), b.weights());
}

#[test]
fn test_caller_owned_rng() {
    let mut s = seeded(random_connected_graph(12, 0.4, 3), ErPolicy::Approximate, 0);
    s.set_seed(None);
    s.compute_with_rng(&mut StdRng::seed_from_u64(1)).unwrap();
    let a = s
        .sparsified_graph_with_rng(&mut StdRng::seed_from_u64(2))
        .unwrap();
    let b = s
        .sparsified_graph_with_rng(&mut StdRng::seed_from_u64(2))
        .unwrap();
    assert_eq!(a.edges(), b.edges());
}

#[test]
fn test_tiny_epsilon_fails_instead_of_allocating() {
    let mut s = seeded(complete_graph(10), ErPolicy::Exact, 1);
    s.set_epsilon(1e-9).unwrap();
    assert_eq!(s.compute().unwrap(), ComputeStatus::Successful);
    let err = s.sparsified_graph().unwrap_err();
    assert!(matches!(
        err,
        SparsifierError::InvalidArgument(ValidationError::ParameterOutOfRange { .. })
    ));
}

#[test]
fn test_single_node_graph_yields_empty_sparsifier() {
    let mut s = seeded(Graph::unweighted(vec![(0, 0)]).unwrap(), ErPolicy::Exact, 1);
    assert_eq!(s.compute().unwrap(), ComputeStatus::Successful);
    let sparse = s.sparsified_graph().unwrap();
    assert_eq!(sparse.edge_count(), 0);
    assert_eq!(sparse.node_count(), 0);
}

#[test]
fn test_all_zero_sampling_weights_are_degenerate() {
    // Only self-loops: every resistance is zero but n = 2 requests draws.
    let mut s = seeded(Graph::unweighted(vec![(1, 1)]).unwrap(), ErPolicy::Exact, 1);
    s.compute().unwrap();
    assert!(matches!(
        s.sparsified_graph(),
        Err(SparsifierError::DegenerateDistribution(_))
    ));
}

// ---------------------------------------------------------------------------
// Every-edge strategy
// ---------------------------------------------------------------------------

#[test]
fn test_every_edge_is_unbiased_in_total_weight() {
    let g = complete_graph(20);
    let total: f64 = g.weights().iter().sum();
    let mut s = SpectralSparsifier::new(Arc::new(g), 0.5, 1.0, ErPolicy::Exact).unwrap();
    s.set_strategy(SamplingStrategy::EveryEdge);
    s.compute().unwrap();

    let p = s.sampling_probabilities().unwrap();
    assert!(p.iter().all(|&p| p > 0.0 && p < 1.0));

    let mut rng = StdRng::seed_from_u64(2024);
    let trials = 200;
    let mean: f64 = (0..trials)
        .map(|_| {
            let sparse = s.sparsified_graph_with_rng(&mut rng).unwrap();
            sparse.weights().iter().sum::<f64>()
        })
        .sum::<f64>()
        / trials as f64;
    assert_relative_eq!(mean, total, max_relative = 0.05);
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_json_round_trip() {
    let config = SparsifierConfig {
        c: 2.5,
        policy: ErPolicy::Exact,
        strategy: SamplingStrategy::EveryEdge,
        seed: Some(7),
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: SparsifierConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, back);
}

#[test]
fn test_partial_config_uses_defaults() {
    let config: SparsifierConfig =
        serde_json::from_str(r#"{ "epsilon": 0.5, "solver": { "max_iterations": 50 } }"#).unwrap();
    assert_eq!(config.epsilon, 0.5);
    assert_eq!(config.c, 4.0);
    assert_eq!(config.solver.max_iterations, 50);
    assert_eq!(config.solver.tolerance, 1e-10);
    assert_eq!(config.policy, ErPolicy::Approximate);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = SparsifierConfig::default();
    config.approximate.solver_eps = -1.0;
    let err = SpectralSparsifier::from_config(Arc::new(complete_graph(3)), config).unwrap_err();
    assert!(matches!(err, SparsifierError::InvalidArgument(_)));
}
