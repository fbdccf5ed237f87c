//! Equal weight allocation.

use crate::strategy::{AllocationContext, AllocationStrategy};
use crate::types::{Allocation, AllocationWeights, StrategyKind};

/// `1/N` in every asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeight;

impl AllocationStrategy for EqualWeight {
    fn kind(&self) -> StrategyKind {
        StrategyKind::EqualWeight
    }

    fn allocate(&self, ctx: &AllocationContext<'_>) -> Allocation {
        Allocation::optimized(StrategyKind::EqualWeight, AllocationWeights::equal(ctx.symbols()))
    }
}
