//! Allocation strategies.
//!
//! This module provides the six built-in allocation rules:
//!
//! - [`EqualWeight`]: `1/N` in every asset
//! - [`RiskParity`]: inverse-volatility weights
//! - [`MinimumVariance`]: closed-form `Σ⁺·1` with negative weights clipped
//! - [`MaximumSharpe`]: random search over the simplex
//! - [`MomentumWeighted`]: proportional to positive trailing momentum
//! - [`KellyCriterion`]: per-asset Kelly fractions, capped and normalized
//!
//! Use [`for_kind`] to build a strategy from a [`StrategyKind`] and an
//! [`OptimizerConfig`].

mod equal_weight;
mod kelly;
mod max_sharpe;
mod min_variance;
mod momentum;
mod risk_parity;

pub use equal_weight::EqualWeight;
pub use kelly::{kelly_fraction, KellyCriterion};
pub use max_sharpe::MaximumSharpe;
pub use min_variance::MinimumVariance;
pub use momentum::MomentumWeighted;
pub use risk_parity::RiskParity;

use crate::config::OptimizerConfig;
use crate::strategy::AllocationStrategy;
use crate::types::StrategyKind;

/// Build the strategy for `kind` with parameters from `config`.
pub fn for_kind(kind: StrategyKind, config: &OptimizerConfig) -> Box<dyn AllocationStrategy> {
    match kind {
        StrategyKind::EqualWeight => Box::new(EqualWeight),
        StrategyKind::RiskParity => Box::new(RiskParity),
        StrategyKind::MinimumVariance => Box::new(
            MinimumVariance::new().with_condition_warning(config.condition_number_warning),
        ),
        StrategyKind::MaximumSharpe => Box::new(MaximumSharpe {
            max_iter: config.max_sharpe_iterations,
            seed: config.seed,
        }),
        StrategyKind::MomentumWeighted => Box::new(MomentumWeighted {
            lookback: config.momentum_lookback,
        }),
        StrategyKind::KellyCriterion => Box::new(KellyCriterion {
            max_allocation: config.kelly_max_allocation,
        }),
    }
}
