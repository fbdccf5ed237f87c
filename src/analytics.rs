//! Portfolio metrics and report formatting.

use crate::data::ReturnMatrix;
use crate::engine::{ComparisonRow, StrategyComparison};
use crate::error::Result;
use crate::projection::GrowthProjection;
use crate::risk::RiskModel;
use crate::types::{Allocation, AllocationWeights, PositionSize};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{builder::Builder, settings::Style};
use tracing::warn;

/// Minimum weight shown in allocation listings.
pub const DISPLAY_WEIGHT_THRESHOLD: f64 = 0.001;

/// `(annual_return − risk_free_rate) / annual_volatility`, 0 when volatility is 0.
pub fn sharpe_ratio(annual_return: f64, annual_volatility: f64, risk_free_rate: f64) -> f64 {
    if annual_volatility > 0.0 {
        (annual_return - risk_free_rate) / annual_volatility
    } else {
        0.0
    }
}

/// Most negative gap between cumulative return and its running maximum.
///
/// The cumulative series is the running sum of `returns`, and the running
/// maximum starts at its first element. Returns 0 for an empty series or one
/// that never falls.
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut cumulative = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0f64;
    for r in returns {
        cumulative += r;
        peak = peak.max(cumulative);
        worst = worst.min(cumulative - peak);
    }
    worst
}

/// Annualized return, volatility, Sharpe ratio and max drawdown of one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    /// Non-positive; 0 when the portfolio never draws down.
    pub max_drawdown: f64,
}

impl PortfolioMetrics {
    /// Compute metrics for `weights` against a fitted model and its returns.
    ///
    /// Assets the model does not know are ignored and assets without a weight
    /// count as 0.
    pub fn calculate(
        weights: &AllocationWeights,
        risk_model: &RiskModel,
        returns: &ReturnMatrix,
        risk_free_rate: f64,
    ) -> Self {
        let unknown: Vec<&str> = weights
            .symbols()
            .iter()
            .filter(|s| risk_model.index_of(s).is_none())
            .map(|s| s.as_str())
            .collect();
        if !unknown.is_empty() {
            warn!("Ignoring weights for unknown assets: {}", unknown.join(", "));
        }

        let w = weights.aligned(risk_model.symbols());
        let annual_return = risk_model.portfolio_return(&w);
        let annual_volatility = risk_model.portfolio_volatility(&w);

        Self {
            annual_return,
            annual_volatility,
            sharpe_ratio: sharpe_ratio(annual_return, annual_volatility, risk_free_rate),
            max_drawdown: max_drawdown(&returns.portfolio_returns(&w)),
        }
    }

    /// Annual return per unit of volatility, 0 when volatility is 0.
    pub fn return_to_volatility(&self) -> f64 {
        if self.annual_volatility > 0.0 {
            self.annual_return / self.annual_volatility
        } else {
            0.0
        }
    }
}

/// Format an amount in rupees with Indian digit grouping (lakh, crore).
pub fn format_inr(amount: f64) -> String {
    if !amount.is_finite() {
        return "-".to_string();
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", amount.abs());
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last3) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{}", groups.join(","), last3)
    };
    format!("{}₹{}", sign, grouped)
}

/// Years-to-target for display, "Never" when unreachable.
pub fn format_years(years: f64) -> String {
    if years.is_finite() {
        format!("{:.1}", years)
    } else {
        "Never".to_string()
    }
}

/// Format results for terminal display.
pub struct ResultFormatter;

impl ResultFormatter {
    /// Print the full strategy comparison report to stdout.
    pub fn print_comparison(comparison: &StrategyComparison) {
        let goal = &comparison.goal;

        println!();
        println!("{}", "═".repeat(60).blue());
        println!("{}", " STRATEGY COMPARISON ".bold().blue());
        println!("{}", "═".repeat(60).blue());
        println!();

        println!("{}", "Goal".bold().underline());
        println!("  Initial Capital: {:>16}", format_inr(goal.initial_capital));
        println!("  Target Capital:  {:>16}", format_inr(goal.target_capital));
        println!("  Multiple:        {:>15.2}x", goal.multiple());
        println!("  Horizon:         {:>13} yrs", goal.horizon_years);
        println!(
            "  Required CAGR:   {:>15.2}%",
            comparison.required_cagr * 100.0
        );
        println!();

        println!("{}", Self::comparison_table(comparison));
        println!();

        if let Some(best) = comparison.best_by_sharpe() {
            println!(
                "  Best Sharpe:     {} ({:.2})",
                best.strategy.green(),
                best.sharpe_ratio
            );
        }
        if let Some(best) = comparison.best_by_return() {
            println!(
                "  Best Return:     {} ({:.2}%)",
                best.strategy.green(),
                best.annual_return * 100.0
            );
        }
        let meeting: Vec<&str> = comparison
            .meeting_target()
            .into_iter()
            .map(|kind| kind.name())
            .collect();
        if meeting.is_empty() {
            println!("  Meets Target:    {}", "none within horizon".red());
        } else {
            println!("  Meets Target:    {}", meeting.join(", ").green());
        }
        for row in comparison.rows().iter().filter(|r| r.fallback.is_some()) {
            println!(
                "  {} {} used equal weight",
                "Note:".yellow(),
                row.strategy
            );
        }
        println!();
        println!("{}", "═".repeat(60).blue());
    }

    /// Render the comparison as a table.
    pub fn comparison_table(comparison: &StrategyComparison) -> String {
        let mut builder = Builder::new();
        builder.push_record([
            "Strategy",
            "Return %",
            "Volatility %",
            "Sharpe",
            "Max DD %",
            "Return/Vol",
            "Years to Target",
            "Final Value",
        ]);

        for row in comparison.rows() {
            builder.push_record([
                row.strategy.clone(),
                format!("{:.2}", row.annual_return * 100.0),
                format!("{:.2}", row.annual_volatility * 100.0),
                format!("{:.2}", row.sharpe_ratio),
                format!("{:.2}", row.max_drawdown * 100.0),
                format!("{:.2}", row.return_to_volatility),
                format_years(row.years_to_target),
                format_inr(row.final_value),
            ]);
        }

        builder.build().with(Style::rounded()).to_string()
    }

    /// Print one allocation with its metrics and optional position sizes.
    pub fn print_allocation(
        allocation: &Allocation,
        metrics: &PortfolioMetrics,
        positions: Option<&[PositionSize]>,
    ) {
        println!();
        println!("{}", "═".repeat(60).blue());
        println!(
            "{}",
            format!(" {} ", allocation.strategy.name().to_uppercase())
                .bold()
                .blue()
        );
        println!("{}", "═".repeat(60).blue());
        println!();

        if let Some(reason) = allocation.fallback {
            println!("  {} equal weight used: {}", "Note:".yellow(), reason);
            println!();
        }

        println!("{}", "Weights".bold().underline());
        for (symbol, weight) in allocation.weights.significant(DISPLAY_WEIGHT_THRESHOLD) {
            println!("  {:<16} {:>8.2}%", symbol, weight * 100.0);
        }
        println!();

        println!("{}", "Metrics".bold().underline());
        println!("  Annual Return:   {:>12.2}%", metrics.annual_return * 100.0);
        println!("  Volatility:      {:>12.2}%", metrics.annual_volatility * 100.0);
        println!("  Sharpe Ratio:    {:>12.2}", metrics.sharpe_ratio);
        println!("  Max Drawdown:    {:>12.2}%", metrics.max_drawdown * 100.0);
        println!();

        if let Some(positions) = positions {
            let mut builder = Builder::new();
            builder.push_record(["Symbol", "Weight %", "Capital", "Price", "Shares"]);
            for p in positions.iter().filter(|p| p.weight > DISPLAY_WEIGHT_THRESHOLD) {
                builder.push_record([
                    p.symbol.clone(),
                    format!("{:.2}", p.weight * 100.0),
                    format_inr(p.capital),
                    p.price.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string()),
                    p.shares.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{}", "Positions".bold().underline());
            println!("{}", builder.build().with(Style::rounded()));
            println!();
        }

        println!("{}", "═".repeat(60).blue());
    }

    /// Print a growth projection year by year.
    pub fn print_projection(projection: &GrowthProjection) {
        println!();
        println!("{}", "Growth Projection".bold().underline());
        println!(
            "  Projected CAGR:  {:>12.2}%  {}",
            projection.projected_cagr * 100.0,
            Self::format_gap(projection.projected_cagr - projection.required_cagr)
        );
        println!("  Required CAGR:   {:>12.2}%", projection.required_cagr * 100.0);
        println!(
            "  Years to Target: {:>12}",
            format_years(projection.years_to_target)
        );
        println!();

        let mut builder = Builder::new();
        builder.push_record(["Year", "Projected", "Required"]);
        for p in &projection.points {
            builder.push_record([
                p.year.to_string(),
                format_inr(p.projected_value),
                format_inr(p.required_value),
            ]);
        }
        println!("{}", builder.build().with(Style::rounded()));
    }

    /// Format a CAGR gap with color.
    fn format_gap(gap: f64) -> String {
        if gap >= 0.0 {
            format!("(+{:.2}% vs required)", gap * 100.0).green().to_string()
        } else {
            format!("({:.2}% vs required)", gap * 100.0).red().to_string()
        }
    }

    /// Export any report to pretty JSON.
    pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(value)?)
    }

    /// Export one comparison row to a CSV line.
    pub fn to_csv_line(row: &ComparisonRow) -> String {
        let years = if row.years_to_target.is_finite() {
            format!("{:.4}", row.years_to_target)
        } else {
            "inf".to_string()
        };
        format!(
            "{},{:.6},{:.6},{:.4},{:.6},{:.4},{},{:.2},{}",
            row.strategy,
            row.annual_return,
            row.annual_volatility,
            row.sharpe_ratio,
            row.max_drawdown,
            row.return_to_volatility,
            years,
            row.final_value,
            row.fallback.is_some()
        )
    }

    /// Get CSV header.
    pub fn csv_header() -> &'static str {
        "strategy,annual_return,annual_volatility,sharpe_ratio,max_drawdown,return_to_volatility,years_to_target,final_value,fallback"
    }
}
