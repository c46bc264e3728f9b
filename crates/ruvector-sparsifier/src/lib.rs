//! Effective-resistance spectral sparsification for the ruvector ecosystem.
//!
//! This crate shrinks a weighted undirected graph to a reweighted edge subset
//! whose Laplacian approximates the original within `(1 +/- eps)` with high
//! probability, using `O(n log n / eps^2)` edges.
//!
//! # Pipeline
//!
//! | Stage | Module | What it does |
//! |-------|--------|--------------|
//! | Graph model | [`graph`] | Edge list plus adjacency, degree, incidence, weight and Laplacian views |
//! | Linear solve | [`cg`] | Jacobi-preconditioned conjugate gradient on `L x = b` |
//! | Projection | [`jl`] | Random sign matrices for the Johnson-Lindenstrauss estimate |
//! | Resistance | [`resistance`] | Exact (one solve per edge) or approximate (`O(log n)` solves) |
//! | Sampling | [`sampling`] | Importance weights `p_i` and edge draws |
//! | Orchestration | [`sparsifier`] | `compute()` then `sparsified_graph()` |
//!
//! # Feature flags
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `parallel` | Runs per-edge exact solves and approximate rounds on rayon |
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ruvector_sparsifier::config::SparsifierConfig;
//! use ruvector_sparsifier::graph::Graph;
//! use ruvector_sparsifier::sparsifier::SpectralSparsifier;
//! use ruvector_sparsifier::types::ComputeStatus;
//!
//! // Complete graph on 8 nodes.
//! let mut edges = Vec::new();
//! for u in 0..8 {
//!     for v in (u + 1)..8 {
//!         edges.push((u, v));
//!     }
//! }
//! let graph = Arc::new(Graph::unweighted(edges).unwrap());
//!
//! let config = SparsifierConfig { epsilon: 0.8, seed: Some(42), ..Default::default() };
//! let mut sparsifier = SpectralSparsifier::from_config(graph.clone(), config).unwrap();
//! assert_eq!(sparsifier.compute().unwrap(), ComputeStatus::Successful);
//!
//! let sparse = sparsifier.sparsified_graph().unwrap();
//! assert!(sparse.edge_count() <= graph.edge_count());
//! ```

pub mod cg;
pub mod config;
pub mod error;
pub mod graph;
pub mod jl;
pub mod resistance;
pub mod sampling;
pub mod sparsifier;
pub mod traits;
pub mod types;
pub mod validation;

pub use config::SparsifierConfig;
pub use error::{Result, SparsifierError};
pub use graph::Graph;
pub use sparsifier::SpectralSparsifier;
pub use types::{ComputeStatus, ErPolicy, SamplingStrategy};
