//! Property-based tests using proptest for invariant testing.
//!
//! These tests verify that:
//! 1. Every strategy returns a full, non-negative allocation
//! 2. Growth projections agree with years-to-target and required CAGR
//! 3. Drawdown and risk parity behave as expected on constructed inputs

use proptest::prelude::*;

use nivesh::analytics::max_drawdown;
use nivesh::config::OptimizerConfig;
use nivesh::data::ReturnMatrix;
use nivesh::engine::PortfolioOptimizer;
use nivesh::projection::{required_cagr, years_to_target, GrowthProjection, InvestmentGoal};
use nivesh::types::{AllocationWeights, FallbackReason, StrategyKind};

// ============================================================================
// Generators
// ============================================================================

/// Return matrix with 1-5 assets and 3-40 periods of daily-sized returns.
fn return_matrix_strategy() -> impl Strategy<Value = ReturnMatrix> {
    (1usize..=5, 3usize..=40).prop_flat_map(|(assets, periods)| {
        prop::collection::vec(
            prop::collection::vec(-0.05..0.05f64, assets),
            periods,
        )
        .prop_map(move |rows| {
            let symbols = (0..assets).map(|j| format!("NSE{}", j)).collect();
            ReturnMatrix::new(symbols, rows).unwrap()
        })
    })
}

/// Non-constant return column.
fn varying_column_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.05..0.05f64, 5..60).prop_filter("needs variation", |col| {
        col.iter().any(|r| (r - col[0]).abs() > 1e-6)
    })
}

fn weights_strategy() -> impl Strategy<Value = AllocationWeights> {
    prop::collection::vec(0.01..1.0f64, 1..8).prop_map(|raw| {
        let symbols: Vec<String> = (0..raw.len()).map(|j| format!("S{}", j)).collect();
        AllocationWeights::normalized(&symbols, raw).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // ========================================================================
    // Allocation Invariants
    // ========================================================================

    #[test]
    fn every_strategy_is_fully_allocated(
        returns in return_matrix_strategy(),
        seed in any::<u64>(),
    ) {
        let config = OptimizerConfig::default()
            .with_max_sharpe_iterations(50)
            .with_seed(seed);
        let opt = PortfolioOptimizer::new(returns, config).unwrap();

        for kind in StrategyKind::ALL {
            let allocation = opt.allocate(kind);
            prop_assert!(
                allocation.weights.is_fully_allocated(),
                "{} weights sum to {}",
                kind,
                allocation.weights.total()
            );
            prop_assert!(allocation.weights.values().iter().all(|w| *w >= 0.0 && w.is_finite()));
            prop_assert_eq!(allocation.weights.len(), opt.symbols().len());
        }
    }

    #[test]
    fn capped_weights_remain_fully_allocated(weights in weights_strategy(), cap in 0.05..1.0f64) {
        let capped = weights.cap_positions(cap).unwrap();
        prop_assert!(capped.is_fully_allocated());
        prop_assert!(capped.values().iter().all(|w| *w >= 0.0));
        prop_assert_eq!(capped.symbols(), weights.symbols());
    }

    #[test]
    fn risk_parity_halves_weight_for_double_volatility(col in varying_column_strategy()) {
        let doubled: Vec<f64> = col.iter().map(|r| r * 2.0).collect();
        let returns = ReturnMatrix::from_columns(vec![
            ("CALM".to_string(), col),
            ("WILD".to_string(), doubled),
        ])
        .unwrap();
        let opt = PortfolioOptimizer::new(returns, OptimizerConfig::default()).unwrap();
        let weights = opt.risk_parity().weights;

        prop_assert!((weights.get("CALM") - 2.0 / 3.0).abs() < 1e-9);
        prop_assert!((weights.get("WILD") - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn momentum_all_losers_falls_back_to_equal_weight(
        rows in prop::collection::vec(prop::collection::vec(-0.05..-0.001f64, 3), 3..30)
    ) {
        let symbols = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let returns = ReturnMatrix::new(symbols, rows).unwrap();
        let opt = PortfolioOptimizer::new(returns, OptimizerConfig::default()).unwrap();
        let allocation = opt.momentum_weighted();

        prop_assert_eq!(allocation.fallback, Some(FallbackReason::NoPositiveMomentum));
        prop_assert!(allocation.weights.values().iter().all(|w| (w - 1.0 / 3.0).abs() < 1e-12));
    }

    // ========================================================================
    // Drawdown
    // ========================================================================

    #[test]
    fn non_negative_returns_never_draw_down(
        returns in prop::collection::vec(0.0..0.05f64, 1..100),
    ) {
        prop_assert_eq!(max_drawdown(&returns), 0.0);
    }

    #[test]
    fn drawdown_is_non_positive(returns in prop::collection::vec(-0.05..0.05f64, 1..100)) {
        let mdd = max_drawdown(&returns);
        prop_assert!(mdd <= 0.0);
        prop_assert!(mdd.is_finite());
    }

    // ========================================================================
    // Projection
    // ========================================================================

    #[test]
    fn years_to_target_compounds_back_to_target(
        initial in 1_000.0..10_000_000.0f64,
        multiple in 1.01..20.0f64,
        rate in 0.01..0.5f64
    ) {
        let target = initial * multiple;
        let years = years_to_target(initial, target, rate);
        let reached = initial * (1.0 + rate).powf(years);
        prop_assert!(((reached - target) / target).abs() < 1e-9);
    }

    #[test]
    fn non_positive_return_never_reaches_target(
        initial in 1_000.0..10_000_000.0f64,
        multiple in 1.01..20.0f64,
        rate in -0.5..=0.0f64
    ) {
        prop_assert!(years_to_target(initial, initial * multiple, rate).is_infinite());
    }

    #[test]
    fn projection_at_required_cagr_hits_target(
        initial in 10_000.0..10_000_000.0f64,
        multiple in 1.1..10.0f64,
        years in 1u32..40
    ) {
        let goal = InvestmentGoal::new(initial, initial * multiple, years);
        let rate = required_cagr(goal.initial_capital, goal.target_capital, years);
        let projection = GrowthProjection::project(&goal, rate).unwrap();

        prop_assert_eq!(projection.points.len(), years as usize + 1);
        let relative_gap = (projection.final_value - goal.target_capital) / goal.target_capital;
        prop_assert!(relative_gap.abs() < 1e-9);
        prop_assert!(projection.projected_values().windows(2).all(|w| w[1] >= w[0]));
    }
}
