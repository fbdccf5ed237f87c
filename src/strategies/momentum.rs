//! Momentum weighted allocation.

use crate::strategy::{AllocationContext, AllocationStrategy};
use crate::types::{Allocation, AllocationWeights, FallbackReason, StrategyKind};
use tracing::debug;

/// Default trailing window, in periods.
pub const DEFAULT_LOOKBACK: usize = 90;

/// Weights proportional to positive trailing momentum.
///
/// Momentum is the sum of an asset's periodic returns over the last
/// `lookback` periods (or all periods if fewer exist). Only assets with
/// strictly positive momentum receive weight; if there are none the strategy
/// falls back to equal weight.
#[derive(Debug, Clone, Copy)]
pub struct MomentumWeighted {
    pub lookback: usize,
}

impl Default for MomentumWeighted {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

impl MomentumWeighted {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    /// Summed trailing returns for each asset, in column order.
    pub fn scores(&self, ctx: &AllocationContext<'_>) -> Vec<f64> {
        let window = ctx.returns.tail(self.lookback);
        (0..ctx.n_assets())
            .map(|j| window.iter().map(|row| row[j]).sum())
            .collect()
    }
}

impl AllocationStrategy for MomentumWeighted {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MomentumWeighted
    }

    fn allocate(&self, ctx: &AllocationContext<'_>) -> Allocation {
        let scores = self.scores(ctx);
        debug!("Momentum scores over {} periods: {:?}", self.lookback, scores);

        let positive: Vec<f64> = scores
            .into_iter()
            .map(|s| if s > 0.0 { s } else { 0.0 })
            .collect();
        match AllocationWeights::normalized(ctx.symbols(), positive) {
            Some(weights) => Allocation::optimized(StrategyKind::MomentumWeighted, weights),
            None => Allocation::fallback(
                StrategyKind::MomentumWeighted,
                ctx.symbols(),
                FallbackReason::NoPositiveMomentum,
            ),
        }
    }
}
