//! Effective-resistance engines.
//!
//! Two interchangeable algorithms implement
//! [`EffectiveResistance`](crate::traits::EffectiveResistance):
//!
//! | Engine                   | Solves per call          | Result               |
//! |--------------------------|--------------------------|----------------------|
//! | [`ExactResistance`]      | `m`                      | exact                |
//! | [`ApproximateResistance`]| `ceil(log2(n / eps))`    | unbiased JL estimate |
//!
//! [`ResistanceEngine`] selects one at runtime from an [`ErPolicy`].

mod approximate;
mod exact;

pub use approximate::ApproximateResistance;
pub use exact::ExactResistance;

use rand::Rng;

use crate::cg::ConjugateGradientSolver;
use crate::config::ApproximateConfig;
use crate::error::Result;
use crate::graph::Graph;
use crate::traits::{EffectiveResistance, ResistanceEstimate};
use crate::types::ErPolicy;

/// Runtime-selected effective-resistance engine backed by CG.
#[derive(Debug, Clone)]
pub enum ResistanceEngine {
    /// One solve per edge.
    Exact(ExactResistance),
    /// Johnson-Lindenstrauss estimate.
    Approximate(ApproximateResistance),
}

impl ResistanceEngine {
    /// Build the engine for `policy`.
    ///
    /// `approximate` and `seed` are only used by the approximate engine.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `approximate` fails validation.
    pub fn from_policy(
        policy: ErPolicy,
        solver: ConjugateGradientSolver,
        approximate: &ApproximateConfig,
        seed: Option<u64>,
    ) -> Result<Self> {
        Ok(match policy {
            ErPolicy::Exact => Self::Exact(ExactResistance::new(solver)),
            ErPolicy::Approximate => {
                let engine = ApproximateResistance::new(solver, approximate)?;
                Self::Approximate(match seed {
                    Some(seed) => engine.with_seed(seed),
                    None => engine,
                })
            }
        })
    }

    /// Policy this engine implements.
    pub fn policy(&self) -> ErPolicy {
        match self {
            Self::Exact(_) => ErPolicy::Exact,
            Self::Approximate(_) => ErPolicy::Approximate,
        }
    }

    /// Like [`calculate_er`](EffectiveResistance::calculate_er) but drawing
    /// randomness from a caller-owned generator. The exact engine ignores it.
    pub fn calculate_er_with_rng<R: Rng + ?Sized>(
        &self,
        graph: &Graph,
        rng: &mut R,
    ) -> Result<ResistanceEstimate> {
        match self {
            Self::Exact(engine) => engine.calculate_er(graph),
            Self::Approximate(engine) => engine.calculate_er_with_rng(graph, rng),
        }
    }
}

impl EffectiveResistance for ResistanceEngine {
    fn calculate_er(&self, graph: &Graph) -> Result<ResistanceEstimate> {
        match self {
            Self::Exact(engine) => engine.calculate_er(graph),
            Self::Approximate(engine) => engine.calculate_er(graph),
        }
    }
}
