//! Portfolio optimizer and strategy comparison.
//!
//! [`PortfolioOptimizer`] owns a return matrix and the [`RiskModel`] fitted
//! on it. Every strategy, metric and projection reads the same immutable
//! snapshot, so strategies can run sequentially or on the rayon pool with
//! identical results when the maximum Sharpe search is seeded.

use crate::analytics::PortfolioMetrics;
use crate::config::OptimizerConfig;
use crate::data::{PriceMatrix, ReturnMatrix};
use crate::error::Result;
use crate::projection::{GrowthProjection, InvestmentGoal};
use crate::risk::RiskModel;
use crate::strategies;
use crate::strategy::{AllocationContext, AllocationStrategy};
use crate::types::{Allocation, AllocationWeights, FallbackReason, StrategyKind};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Allocation optimizer over a fixed return history.
#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
    returns: ReturnMatrix,
    risk_model: RiskModel,
}

impl PortfolioOptimizer {
    /// Fit the risk model on `returns`.
    ///
    /// Fails with `InsufficientData` when fewer than two return periods or no
    /// assets are available.
    pub fn new(returns: ReturnMatrix, config: OptimizerConfig) -> Result<Self> {
        config.validate()?;
        let risk_model = RiskModel::estimate(&returns, config.periods_per_year)?;
        info!(
            "Optimizer ready: {} assets, {} return periods",
            returns.n_assets(),
            returns.n_periods()
        );
        Ok(Self {
            config,
            returns,
            risk_model,
        })
    }

    /// Build returns from prices, then fit the risk model.
    pub fn from_prices(prices: &PriceMatrix, config: OptimizerConfig) -> Result<Self> {
        Self::new(prices.to_returns(), config)
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn returns(&self) -> &ReturnMatrix {
        &self.returns
    }

    pub fn risk_model(&self) -> &RiskModel {
        &self.risk_model
    }

    pub fn symbols(&self) -> &[String] {
        self.risk_model.symbols()
    }

    /// Shared inputs for the strategies.
    pub fn context(&self) -> AllocationContext<'_> {
        AllocationContext::new(&self.returns, &self.risk_model, self.config.risk_free_rate)
    }

    /// Strategy for `kind` configured from this optimizer's parameters.
    pub fn strategy(&self, kind: StrategyKind) -> Box<dyn AllocationStrategy> {
        strategies::for_kind(kind, &self.config)
    }

    /// Run one strategy.
    pub fn allocate(&self, kind: StrategyKind) -> Allocation {
        self.allocate_with(self.strategy(kind).as_ref())
    }

    /// Run a caller-supplied strategy on this optimizer's data.
    pub fn allocate_with(&self, strategy: &dyn AllocationStrategy) -> Allocation {
        let allocation = strategy.allocate(&self.context());
        debug!(
            "{} weights: {:?}",
            strategy.name(),
            allocation.weights.to_map()
        );
        allocation
    }

    pub fn equal_weight(&self) -> Allocation {
        self.allocate(StrategyKind::EqualWeight)
    }

    pub fn risk_parity(&self) -> Allocation {
        self.allocate(StrategyKind::RiskParity)
    }

    pub fn minimum_variance(&self) -> Allocation {
        self.allocate(StrategyKind::MinimumVariance)
    }

    pub fn maximum_sharpe(&self) -> Allocation {
        self.allocate(StrategyKind::MaximumSharpe)
    }

    pub fn momentum_weighted(&self) -> Allocation {
        self.allocate(StrategyKind::MomentumWeighted)
    }

    pub fn kelly_criterion(&self) -> Allocation {
        self.allocate(StrategyKind::KellyCriterion)
    }

    /// Metrics for any weights over this optimizer's assets.
    pub fn metrics(&self, weights: &AllocationWeights) -> PortfolioMetrics {
        PortfolioMetrics::calculate(
            weights,
            &self.risk_model,
            &self.returns,
            self.config.risk_free_rate,
        )
    }

    /// Project `goal` forward at the annual return of `weights`.
    pub fn project_growth(
        &self,
        weights: &AllocationWeights,
        goal: &InvestmentGoal,
    ) -> Result<GrowthProjection> {
        GrowthProjection::project(goal, self.metrics(weights).annual_return)
    }

    /// Clip every weight to the configured position cap, if any.
    pub fn apply_position_cap(&self, allocation: Allocation) -> Result<Allocation> {
        match self.config.max_position {
            Some(max) => Ok(Allocation {
                weights: allocation.weights.cap_positions(max)?,
                ..allocation
            }),
            None => Ok(allocation),
        }
    }

    /// Allocation, metrics and projection for one strategy.
    ///
    /// The configured position cap is applied before metrics are computed.
    pub fn report(&self, kind: StrategyKind, goal: &InvestmentGoal) -> Result<StrategyReport> {
        let allocation = self.apply_position_cap(self.allocate(kind))?;
        let metrics = self.metrics(&allocation.weights);
        let projection = GrowthProjection::project(goal, metrics.annual_return)?;
        Ok(StrategyReport {
            allocation,
            metrics,
            projection,
        })
    }

    /// Compare the given strategies, in order.
    pub fn compare(
        &self,
        kinds: &[StrategyKind],
        goal: &InvestmentGoal,
    ) -> Result<StrategyComparison> {
        goal.validate()?;
        info!("Comparing {} strategies", kinds.len());
        let reports = kinds
            .iter()
            .map(|kind| self.report(*kind, goal))
            .collect::<Result<Vec<_>>>()?;
        Ok(StrategyComparison::new(*goal, reports))
    }

    /// Compare all six strategies.
    pub fn compare_all(&self, goal: &InvestmentGoal) -> Result<StrategyComparison> {
        self.compare(&StrategyKind::ALL, goal)
    }

    /// Compare the given strategies on the rayon thread pool, keeping order.
    pub fn compare_parallel(
        &self,
        kinds: &[StrategyKind],
        goal: &InvestmentGoal,
    ) -> Result<StrategyComparison> {
        goal.validate()?;
        info!("Comparing {} strategies in parallel", kinds.len());
        let reports = kinds
            .par_iter()
            .map(|kind| self.report(*kind, goal))
            .collect::<Result<Vec<_>>>()?;
        Ok(StrategyComparison::new(*goal, reports))
    }

    /// Compare all six strategies on the rayon thread pool.
    pub fn compare_all_parallel(&self, goal: &InvestmentGoal) -> Result<StrategyComparison> {
        self.compare_parallel(&StrategyKind::ALL, goal)
    }
}

/// Everything computed for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub allocation: Allocation,
    pub metrics: PortfolioMetrics,
    pub projection: GrowthProjection,
}

/// A row in the strategy comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    /// Strategy display name.
    pub strategy: String,
    pub kind: StrategyKind,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    /// Annual return divided by volatility.
    pub return_to_volatility: f64,
    /// Infinite when unreachable; serialized as `null`.
    #[serde(
        serialize_with = "crate::projection::serialize_years",
        deserialize_with = "crate::projection::deserialize_years"
    )]
    pub years_to_target: f64,
    /// Projected value at the horizon.
    pub final_value: f64,
    /// Set when the strategy used equal weights instead of its own rule.
    pub fallback: Option<FallbackReason>,
}

impl ComparisonRow {
    /// Create a comparison row from a strategy report.
    pub fn from_report(report: &StrategyReport) -> Self {
        Self {
            strategy: report.allocation.strategy.name().to_string(),
            kind: report.allocation.strategy,
            annual_return: report.metrics.annual_return,
            annual_volatility: report.metrics.annual_volatility,
            sharpe_ratio: report.metrics.sharpe_ratio,
            max_drawdown: report.metrics.max_drawdown,
            return_to_volatility: report.metrics.return_to_volatility(),
            years_to_target: report.projection.years_to_target,
            final_value: report.projection.final_value,
            fallback: report.allocation.fallback,
        }
    }
}

/// Side-by-side results for several strategies against one goal.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyComparison {
    pub goal: InvestmentGoal,
    pub required_cagr: f64,
    pub reports: Vec<StrategyReport>,
    rows: Vec<ComparisonRow>,
}

impl StrategyComparison {
    pub fn new(goal: InvestmentGoal, reports: Vec<StrategyReport>) -> Self {
        let rows = reports.iter().map(ComparisonRow::from_report).collect();
        Self {
            goal,
            required_cagr: goal.required_cagr(),
            reports,
            rows,
        }
    }

    /// One row per strategy, in run order.
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    /// Report for one strategy, if it was run.
    pub fn report(&self, kind: StrategyKind) -> Option<&StrategyReport> {
        self.reports.iter().find(|r| r.allocation.strategy == kind)
    }

    /// Get the best strategy by Sharpe ratio.
    pub fn best_by_sharpe(&self) -> Option<&ComparisonRow> {
        self.rows.iter().max_by(|a, b| {
            a.sharpe_ratio
                .partial_cmp(&b.sharpe_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Get the best strategy by annual return.
    pub fn best_by_return(&self) -> Option<&ComparisonRow> {
        self.rows.iter().max_by(|a, b| {
            a.annual_return
                .partial_cmp(&b.annual_return)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Strategies whose projection reaches the target within the horizon.
    pub fn meeting_target(&self) -> Vec<StrategyKind> {
        self.reports
            .iter()
            .filter(|r| r.projection.meets_target())
            .map(|r| r.allocation.strategy)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_returns() -> ReturnMatrix {
        let a = [0.012, -0.004, 0.009, 0.003, -0.006, 0.011, 0.002, -0.001];
        let b = [0.002, 0.001, -0.003, 0.004, 0.000, 0.001, -0.002, 0.003];
        let c = [-0.010, 0.006, -0.004, -0.008, 0.007, -0.003, 0.001, -0.005];
        ReturnMatrix::from_columns(vec![
            ("A".to_string(), a.to_vec()),
            ("B".to_string(), b.to_vec()),
            ("C".to_string(), c.to_vec()),
        ])
        .unwrap()
    }

    fn optimizer() -> PortfolioOptimizer {
        PortfolioOptimizer::new(sample_returns(), OptimizerConfig::default().with_seed(3)).unwrap()
    }

    #[test]
    fn test_compare_all_runs_six_strategies_in_order() {
        let comparison = optimizer().compare_all(&InvestmentGoal::default()).unwrap();
        let kinds: Vec<StrategyKind> = comparison.rows().iter().map(|r| r.kind).collect();
        assert_eq!(kinds, StrategyKind::ALL.to_vec());
        for report in &comparison.reports {
            assert!(report.allocation.weights.is_fully_allocated());
            assert_eq!(report.projection.points.len(), 11);
        }
        assert!((comparison.required_cagr - 0.174619).abs() < 1e-5);
    }

    #[test]
    fn test_parallel_matches_sequential_when_seeded() {
        let opt = optimizer();
        let goal = InvestmentGoal::default();
        let seq = opt.compare_all(&goal).unwrap();
        let par = opt.compare_all_parallel(&goal).unwrap();
        assert_eq!(seq.rows(), par.rows());
    }

    #[test]
    fn test_best_by_lookups_do_not_reorder() {
        let comparison = optimizer().compare_all(&InvestmentGoal::default()).unwrap();
        let best = comparison.best_by_sharpe().unwrap();
        assert!(comparison
            .rows()
            .iter()
            .all(|r| r.sharpe_ratio <= best.sharpe_ratio));
        let best_return = comparison.best_by_return().unwrap();
        assert!(comparison
            .rows()
            .iter()
            .all(|r| r.annual_return <= best_return.annual_return));
        assert_eq!(comparison.rows()[0].kind, StrategyKind::EqualWeight);
    }

    #[test]
    fn test_meeting_target_follows_projections() {
        let opt = optimizer();
        let easy = InvestmentGoal::new(100.0, 100.0, 1);
        let comparison = opt.compare_all(&easy).unwrap();
        let expected: Vec<StrategyKind> = comparison
            .reports
            .iter()
            .filter(|r| r.metrics.annual_return >= 0.0)
            .map(|r| r.allocation.strategy)
            .collect();
        assert_eq!(comparison.meeting_target(), expected);

        let impossible = InvestmentGoal::new(100.0, 1e12, 1);
        assert!(opt.compare_all(&impossible).unwrap().meeting_target().is_empty());
    }

    #[test]
    fn test_insufficient_data() {
        let returns = ReturnMatrix::from_columns(vec![("A".to_string(), vec![0.01])]).unwrap();
        let err = PortfolioOptimizer::new(returns, OptimizerConfig::default()).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_invalid_goal_rejected_before_strategies_run() {
        let goal = InvestmentGoal::new(1.0, 2.0, 0);
        assert!(optimizer().compare_all(&goal).is_err());
    }

    #[test]
    fn test_single_asset_is_fully_weighted() {
        let returns =
            ReturnMatrix::from_columns(vec![("ONLY".to_string(), vec![0.01, -0.02, 0.015, 0.004])])
                .unwrap();
        let opt =
            PortfolioOptimizer::new(returns, OptimizerConfig::default().with_seed(1)).unwrap();
        for kind in StrategyKind::ALL {
            assert_eq!(opt.allocate(kind).weights.get("ONLY"), 1.0, "{}", kind);
        }
    }

    #[test]
    fn test_position_cap_applied_to_reports() {
        let config = OptimizerConfig::default().with_seed(3).with_max_position(0.4);
        let opt = PortfolioOptimizer::new(sample_returns(), config).unwrap();
        let comparison = opt.compare_all(&InvestmentGoal::default()).unwrap();
        for report in &comparison.reports {
            let weights = &report.allocation.weights;
            let expected = opt
                .allocate(report.allocation.strategy)
                .weights
                .cap_positions(0.4)
                .unwrap();
            assert!(weights.is_fully_allocated());
            assert_eq!(weights, &expected);
        }
    }

    #[test]
    fn test_project_growth_uses_metrics_return() {
        let opt = optimizer();
        let weights = opt.equal_weight().weights;
        let goal = InvestmentGoal::default();
        let projection = opt.project_growth(&weights, &goal).unwrap();
        assert_eq!(projection.projected_cagr, opt.metrics(&weights).annual_return);
    }
}
