//! Closed-form minimum variance approximation.
//!
//! Computes `w = Σ⁺ · 1` with the Moore-Penrose pseudo-inverse, normalizes it
//! to sum to one, clips negative weights to zero and renormalizes. This is the
//! unconstrained minimum-variance portfolio projected onto long-only weights,
//! not the solution of the long-only quadratic program, so the clipped result
//! can be suboptimal.

use crate::strategy::{AllocationContext, AllocationStrategy};
use crate::types::{Allocation, AllocationWeights, FallbackReason, StrategyKind};
use tracing::{debug, warn};

/// Default condition number above which the covariance is reported as
/// ill-conditioned.
pub const DEFAULT_CONDITION_WARNING: f64 = 1e10;

/// Pseudo-inverse minimum variance with negative weights clipped.
#[derive(Debug, Clone, Copy)]
pub struct MinimumVariance {
    condition_warning: f64,
}

impl MinimumVariance {
    pub fn new() -> Self {
        Self {
            condition_warning: DEFAULT_CONDITION_WARNING,
        }
    }

    /// Set the condition number threshold for the ill-conditioning warning.
    pub fn with_condition_warning(mut self, threshold: f64) -> Self {
        self.condition_warning = threshold;
        self
    }
}

impl Default for MinimumVariance {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStrategy for MinimumVariance {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MinimumVariance
    }

    fn allocate(&self, ctx: &AllocationContext<'_>) -> Allocation {
        let kind = StrategyKind::MinimumVariance;
        let symbols = ctx.symbols();

        let condition = ctx.risk_model.condition_number();
        if condition > self.condition_warning {
            warn!(
                "Covariance matrix is ill-conditioned (condition number {:.3e}); \
                 using pseudo-inverse",
                condition
            );
        }

        let pinv = match ctx.risk_model.pseudo_inverse() {
            Ok(m) => m,
            Err(e) => {
                warn!("{}", e);
                return Allocation::fallback(kind, symbols, FallbackReason::DegenerateCovariance);
            }
        };

        let raw: Vec<f64> = pinv.row_iter().map(|row| row.sum()).collect();
        let total: f64 = raw.iter().sum();
        if !total.is_finite() || total.abs() < f64::MIN_POSITIVE {
            return Allocation::fallback(kind, symbols, FallbackReason::DegenerateCovariance);
        }

        let clipped: Vec<f64> = raw.iter().map(|w| (w / total).max(0.0)).collect();
        let n_clipped = raw.iter().filter(|w| *w / total < 0.0).count();
        if n_clipped > 0 {
            debug!("Minimum variance clipped {} negative weights", n_clipped);
        }

        match AllocationWeights::normalized(symbols, clipped) {
            Some(weights) => Allocation::optimized(kind, weights),
            None => Allocation::fallback(kind, symbols, FallbackReason::DegenerateCovariance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReturnMatrix;
    use crate::risk::RiskModel;

    fn alloc(returns: &ReturnMatrix) -> (Allocation, RiskModel) {
        let model = RiskModel::estimate(returns, 252.0).unwrap();
        let a = MinimumVariance::new().allocate(&AllocationContext::new(returns, &model, 0.06));
        (a, model)
    }

    #[test]
    fn test_uncorrelated_inverse_variance() {
        // Orthogonal zero-mean columns, B with twice the volatility of A.
        let returns = ReturnMatrix::from_columns(vec![
            ("A".to_string(), vec![0.01, -0.01, 0.01, -0.01]),
            ("B".to_string(), vec![0.02, 0.02, -0.02, -0.02]),
        ])
        .unwrap();
        let (a, _) = alloc(&returns);
        assert!(!a.is_fallback());
        assert!((a.weights.get("A") - 0.8).abs() < 1e-9);
        assert!((a.weights.get("B") - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_condition_warning_threshold_does_not_change_weights() {
        let returns = ReturnMatrix::from_columns(vec![
            ("A".to_string(), vec![0.01, -0.01, 0.01, -0.01]),
            ("B".to_string(), vec![0.02, 0.02, -0.02, -0.02]),
        ])
        .unwrap();
        let model = RiskModel::estimate(&returns, 252.0).unwrap();
        // Variance ratio of 4 sits above a threshold of 1, so the warning fires.
        assert!((model.condition_number() - 4.0).abs() < 1e-9);

        let strict = MinimumVariance::new().with_condition_warning(1.0);
        let a = strict.allocate(&AllocationContext::new(&returns, &model, 0.06));
        assert!(!a.is_fallback());
        assert!((a.weights.get("A") - 0.8).abs() < 1e-9);
        assert!((a.weights.get("B") - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_negative_weight_clipped() {
        let b = vec![0.01, -0.01, 0.01, -0.01];
        let c = vec![0.01, 0.01, -0.01, -0.01];
        let a: Vec<f64> = b.iter().zip(&c).map(|(b, c)| 2.0 * b + 0.5 * c).collect();
        let returns =
            ReturnMatrix::from_columns(vec![("A".to_string(), a), ("B".to_string(), b)]).unwrap();
        let (alloc, model) = alloc(&returns);

        assert_eq!(alloc.weights.get("A"), 0.0);
        assert!((alloc.weights.get("B") - 1.0).abs() < 1e-12);
        let ew = model.portfolio_volatility(&[0.5, 0.5]);
        assert!(model.portfolio_volatility(alloc.weights.values()) <= ew);
    }

    #[test]
    fn test_singular_covariance_is_tolerated() {
        let b = vec![0.01, -0.02, 0.015, 0.0, -0.005];
        let a: Vec<f64> = b.iter().map(|r| r * 2.0).collect();
        let returns =
            ReturnMatrix::from_columns(vec![("A".to_string(), a), ("B".to_string(), b)]).unwrap();
        let (alloc, _) = alloc(&returns);
        assert!(alloc.weights.values().iter().all(|w| w.is_finite() && *w >= 0.0));
        assert!(alloc.weights.is_fully_allocated());
    }

    #[test]
    fn test_zero_covariance_falls_back() {
        let returns = ReturnMatrix::from_columns(vec![
            ("A".to_string(), vec![0.0, 0.0, 0.0]),
            ("B".to_string(), vec![0.0, 0.0, 0.0]),
        ])
        .unwrap();
        let (alloc, _) = alloc(&returns);
        assert_eq!(alloc.fallback, Some(FallbackReason::DegenerateCovariance));
        assert_eq!(alloc.weights.get("B"), 0.5);
    }
}
