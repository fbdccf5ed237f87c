//! Allocation strategy trait and related utilities.

use crate::analytics::sharpe_ratio;
use crate::data::ReturnMatrix;
use crate::risk::RiskModel;
use crate::types::{Allocation, StrategyKind};

/// Inputs shared by every strategy in one optimization run.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    /// Aligned periodic returns the risk model was fitted on.
    pub returns: &'a ReturnMatrix,
    /// Annualized mean and covariance snapshot.
    pub risk_model: &'a RiskModel,
    /// Annualized risk-free rate.
    pub risk_free_rate: f64,
}

impl<'a> AllocationContext<'a> {
    pub fn new(returns: &'a ReturnMatrix, risk_model: &'a RiskModel, risk_free_rate: f64) -> Self {
        Self {
            returns,
            risk_model,
            risk_free_rate,
        }
    }

    /// Asset symbols in column order.
    pub fn symbols(&self) -> &'a [String] {
        self.risk_model.symbols()
    }

    pub fn n_assets(&self) -> usize {
        self.risk_model.n_assets()
    }

    /// Sharpe ratio of weights given in column order; 0 when volatility is 0.
    pub fn sharpe(&self, weights: &[f64]) -> f64 {
        sharpe_ratio(
            self.risk_model.portfolio_return(weights),
            self.risk_model.portfolio_volatility(weights),
            self.risk_free_rate,
        )
    }
}

/// An allocation rule mapping a risk model and return history to weights.
///
/// Implementations must always return a full allocation. When the rule
/// cannot allocate positively to any asset it returns equal weights tagged
/// with a [`FallbackReason`](crate::types::FallbackReason).
pub trait AllocationStrategy: Send + Sync {
    /// Which of the built-in strategies this is.
    fn kind(&self) -> StrategyKind;

    /// Display name of the strategy.
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Compute weights for the assets in `ctx`.
    fn allocate(&self, ctx: &AllocationContext<'_>) -> Allocation;
}
