//! Inverse-volatility risk parity.
//!
//! Weights are proportional to `1/σ_i`, the annualized standard deviation of
//! each asset. This approximates equal risk contribution and ignores
//! correlations. Assets with zero volatility get weight 0; if every asset has
//! zero volatility the strategy falls back to equal weight.

use crate::strategy::{AllocationContext, AllocationStrategy};
use crate::types::{Allocation, AllocationWeights, FallbackReason, StrategyKind};

/// Inverse-volatility weighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskParity;

impl AllocationStrategy for RiskParity {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RiskParity
    }

    fn allocate(&self, ctx: &AllocationContext<'_>) -> Allocation {
        let inv_vols: Vec<f64> = ctx
            .risk_model
            .volatilities()
            .into_iter()
            .map(|vol| if vol > 0.0 { 1.0 / vol } else { 0.0 })
            .collect();

        match AllocationWeights::normalized(ctx.symbols(), inv_vols) {
            Some(weights) => Allocation::optimized(StrategyKind::RiskParity, weights),
            None => Allocation::fallback(
                StrategyKind::RiskParity,
                ctx.symbols(),
                FallbackReason::ZeroVolatility,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReturnMatrix;
    use crate::risk::RiskModel;

    #[test]
    fn test_double_volatility_gets_half_weight() {
        let base = vec![0.01, -0.01, 0.02, -0.02, 0.005];
        let doubled: Vec<f64> = base.iter().map(|r| r * 2.0).collect();
        let returns = ReturnMatrix::from_columns(vec![
            ("LOW".to_string(), base),
            ("HIGH".to_string(), doubled),
        ])
        .unwrap();
        let model = RiskModel::estimate(&returns, 252.0).unwrap();
        let alloc = RiskParity.allocate(&AllocationContext::new(&returns, &model, 0.06));

        assert!(!alloc.is_fallback());
        assert!((alloc.weights.get("LOW") - 2.0 / 3.0).abs() < 1e-12);
        assert!((alloc.weights.get("HIGH") - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_volatility_asset_gets_zero() {
        let returns = ReturnMatrix::from_columns(vec![
            ("FLAT".to_string(), vec![0.0, 0.0, 0.0]),
            ("MOVING".to_string(), vec![0.01, -0.01, 0.02]),
        ])
        .unwrap();
        let model = RiskModel::estimate(&returns, 252.0).unwrap();
        let alloc = RiskParity.allocate(&AllocationContext::new(&returns, &model, 0.06));
        assert_eq!(alloc.weights.get("FLAT"), 0.0);
        assert_eq!(alloc.weights.get("MOVING"), 1.0);
    }

    #[test]
    fn test_all_flat_falls_back() {
        let returns = ReturnMatrix::from_columns(vec![
            ("A".to_string(), vec![0.0, 0.0, 0.0]),
            ("B".to_string(), vec![0.0, 0.0, 0.0]),
        ])
        .unwrap();
        let model = RiskModel::estimate(&returns, 252.0).unwrap();
        let alloc = RiskParity.allocate(&AllocationContext::new(&returns, &model, 0.06));
        assert_eq!(alloc.fallback, Some(FallbackReason::ZeroVolatility));
        assert_eq!(alloc.weights.get("A"), 0.5);
    }
}
