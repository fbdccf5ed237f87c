//! Nivesh - portfolio allocation optimizer and growth projector for equities.
//!
//! # Overview
//!
//! Nivesh takes a daily price history for a basket of stocks, estimates
//! annualized expected returns and covariance, and computes target weights
//! under six allocation strategies:
//!
//! - **Equal Weight**: 1/N in every asset
//! - **Risk Parity**: weights proportional to inverse volatility
//! - **Minimum Variance**: closed-form pseudo-inverse approximation
//! - **Maximum Sharpe**: random search over the simplex
//! - **Momentum Weighted**: trailing cumulative returns, losers excluded
//! - **Kelly Criterion**: capped per-asset Kelly fractions
//!
//! Every allocation is scored (return, volatility, Sharpe, max drawdown) and
//! projected forward against an investment goal, so strategies can be ranked
//! by how soon they are expected to reach the target.
//!
//! # Quick Start
//!
//! ```no_run
//! use nivesh::{
//!     config::OptimizerConfig,
//!     data::load_prices_csv,
//!     engine::PortfolioOptimizer,
//!     projection::InvestmentGoal,
//! };
//!
//! let prices = load_prices_csv("data/nifty.csv", &Default::default()).unwrap();
//! let config = OptimizerConfig::default().with_risk_free_rate(0.065).with_seed(42);
//! let optimizer = PortfolioOptimizer::from_prices(&prices, config).unwrap();
//!
//! let goal = InvestmentGoal::new(2_000_000.0, 10_000_000.0, 10);
//! let comparison = optimizer.compare_all(&goal).unwrap();
//! println!("{}", comparison);
//! ```
//!
//! # Custom Strategies
//!
//! Implement [`AllocationStrategy`] to plug a new rule into the optimizer:
//!
//! ```
//! use nivesh::strategy::{AllocationContext, AllocationStrategy};
//! use nivesh::types::{Allocation, AllocationWeights, StrategyKind};
//!
//! struct FirstAssetOnly;
//!
//! impl AllocationStrategy for FirstAssetOnly {
//!     fn kind(&self) -> StrategyKind {
//!         StrategyKind::EqualWeight
//!     }
//!
//!     fn name(&self) -> &str {
//!         "First Asset Only"
//!     }
//!
//!     fn allocate(&self, ctx: &AllocationContext) -> Allocation {
//!         let mut w = vec![0.0; ctx.n_assets()];
//!         w[0] = 1.0;
//!         let weights = AllocationWeights::new(ctx.symbols().to_vec(), w).unwrap();
//!         Allocation::optimized(self.kind(), weights)
//!     }
//! }
//! ```
//!
//! # Modules
//!
//! - [`types`]: Strategy identifiers, weights and allocations
//! - [`data`]: Price loading and return computation
//! - [`risk`]: Annualized mean and covariance estimation
//! - [`strategy`]: Allocation strategy trait and context
//! - [`strategies`]: The six built-in allocation strategies
//! - [`engine`]: Optimizer facade and strategy comparison
//! - [`analytics`]: Portfolio metrics and report formatting
//! - [`projection`]: Investment goals and growth projection
//! - [`config`]: TOML configuration file support
//! - [`viz`]: Terminal charts

pub mod analytics;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod projection;
pub mod risk;
pub mod strategies;
pub mod strategy;
pub mod types;
pub mod viz;

// Re-exports for convenience
pub use analytics::{
    format_inr, format_years, max_drawdown, sharpe_ratio, PortfolioMetrics, ResultFormatter,
};
pub use config::{NiveshFileConfig, OptimizerConfig};
pub use data::{load_prices_csv, DataConfig, DataSummary, PriceLayout, PriceMatrix, ReturnMatrix};
pub use engine::{ComparisonRow, PortfolioOptimizer, StrategyComparison, StrategyReport};
pub use error::{NiveshError, Result};
pub use projection::{required_cagr, years_to_target, GrowthProjection, InvestmentGoal};
pub use risk::RiskModel;
pub use strategy::{AllocationContext, AllocationStrategy};
pub use types::{Allocation, AllocationWeights, FallbackReason, PositionSize, StrategyKind};

// Visualization utilities
pub use viz::{allocation_bars, growth_chart, sparkline, sparkline_with_config, SparklineConfig};
