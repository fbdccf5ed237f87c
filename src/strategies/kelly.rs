//! Per-asset Kelly criterion sizing.
//!
//! Each asset is sized independently from its own return history; no joint
//! portfolio Kelly problem is solved. The capped fractions are then
//! normalized into a full allocation.

use crate::strategy::{AllocationContext, AllocationStrategy};
use crate::types::{Allocation, AllocationWeights, FallbackReason, StrategyKind};
use tracing::debug;

/// Default cap on any single Kelly fraction.
pub const DEFAULT_MAX_ALLOCATION: f64 = 0.25;

/// Kelly fraction for one return series, clipped to `[0, max_allocation]`.
///
/// Wins are returns above zero and losses are returns below zero; zero returns
/// count toward neither set but still count in the total used for the win
/// rate. Returns 0 when there are no wins, no losses, or the average loss is
/// zero.
pub fn kelly_fraction(returns: &[f64], max_allocation: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let wins: Vec<f64> = returns.iter().copied().filter(|r| *r > 0.0).collect();
    let losses: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    if wins.is_empty() || losses.is_empty() {
        return 0.0;
    }

    let p = wins.len() as f64 / returns.len() as f64;
    let q = 1.0 - p;
    let avg_win = wins.iter().sum::<f64>() / wins.len() as f64;
    let avg_loss = (losses.iter().sum::<f64>() / losses.len() as f64).abs();
    if avg_loss == 0.0 {
        return 0.0;
    }

    let b = avg_win / avg_loss;
    let f = (p * b - q) / b;
    f.clamp(0.0, max_allocation)
}

/// Normalized per-asset Kelly fractions.
#[derive(Debug, Clone, Copy)]
pub struct KellyCriterion {
    /// Cap applied to each asset's fraction before normalization.
    pub max_allocation: f64,
}

impl Default for KellyCriterion {
    fn default() -> Self {
        Self {
            max_allocation: DEFAULT_MAX_ALLOCATION,
        }
    }
}

impl KellyCriterion {
    pub fn new(max_allocation: f64) -> Self {
        Self { max_allocation }
    }
}

impl AllocationStrategy for KellyCriterion {
    fn kind(&self) -> StrategyKind {
        StrategyKind::KellyCriterion
    }

    fn allocate(&self, ctx: &AllocationContext<'_>) -> Allocation {
        let fractions: Vec<f64> = (0..ctx.n_assets())
            .map(|j| kelly_fraction(&ctx.returns.column(j), self.max_allocation))
            .collect();
        debug!("Kelly fractions: {:?}", fractions);

        match AllocationWeights::normalized(ctx.symbols(), fractions) {
            Some(weights) => Allocation::optimized(StrategyKind::KellyCriterion, weights),
            None => Allocation::fallback(
                StrategyKind::KellyCriterion,
                ctx.symbols(),
                FallbackReason::NoPositiveKelly,
            ),
        }
    }
}
