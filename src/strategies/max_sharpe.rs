//! Maximum Sharpe ratio by random search.
//!
//! Draws `max_iter` weight vectors by sampling `N` uniform numbers and
//! normalizing them to sum to one, and keeps the vector with the highest
//! Sharpe ratio. The result is an approximation whose quality depends on the
//! number of draws; seed the search for reproducible output.

use crate::strategy::{AllocationContext, AllocationStrategy};
use crate::types::{Allocation, AllocationWeights, FallbackReason, StrategyKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Default number of random draws.
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Random-search Sharpe maximizer.
#[derive(Debug, Clone, Copy)]
pub struct MaximumSharpe {
    /// Number of random weight vectors to evaluate.
    pub max_iter: usize,
    /// Seed for the random source; entropy when `None`.
    pub seed: Option<u64>,
}

impl Default for MaximumSharpe {
    fn default() -> Self {
        Self {
            max_iter: DEFAULT_MAX_ITER,
            seed: None,
        }
    }
}

impl MaximumSharpe {
    pub fn new(max_iter: usize) -> Self {
        Self {
            max_iter,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Run the search drawing from the given random source.
    pub fn search<R: Rng + ?Sized>(&self, ctx: &AllocationContext<'_>, rng: &mut R) -> Allocation {
        let kind = StrategyKind::MaximumSharpe;
        let n = ctx.n_assets();
        let mut best: Option<(f64, AllocationWeights)> = None;

        for _ in 0..self.max_iter {
            let draw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
            let weights = match AllocationWeights::normalized(ctx.symbols(), draw) {
                Some(w) => w,
                None => continue,
            };
            let sharpe = ctx.sharpe(weights.values());
            if best.as_ref().map_or(true, |(s, _)| sharpe > *s) {
                best = Some((sharpe, weights));
            }
        }

        match best {
            Some((sharpe, weights)) => {
                debug!(
                    "Best Sharpe {:.4} after {} draws",
                    sharpe, self.max_iter
                );
                Allocation::optimized(kind, weights)
            }
            None => Allocation::fallback(kind, ctx.symbols(), FallbackReason::NoValidSample),
        }
    }
}

impl AllocationStrategy for MaximumSharpe {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MaximumSharpe
    }

    fn allocate(&self, ctx: &AllocationContext<'_>) -> Allocation {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.search(ctx, &mut rng)
    }
}
