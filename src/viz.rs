//! Terminal visualization of allocations and growth projections.
//!
//! This module provides terminal-friendly output:
//! - ASCII sparklines for growth paths
//! - Projected vs required growth charts
//! - Horizontal weight bars for allocations
//! - A plain-text strategy comparison table
//!
//! # Example
//!
//! ```ignore
//! use nivesh::viz::{growth_chart, allocation_bars};
//!
//! println!("{}", growth_chart(&report.projection, 40));
//! println!("{}", allocation_bars(&report.allocation.weights, 30));
//! ```

use crate::analytics::{format_inr, format_years, DISPLAY_WEIGHT_THRESHOLD};
use crate::engine::StrategyComparison;
use crate::projection::GrowthProjection;
use crate::types::AllocationWeights;
use std::fmt::Write;

/// Characters used for sparkline rendering, ordered from low to high.
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Configuration for sparkline generation.
#[derive(Debug, Clone)]
pub struct SparklineConfig {
    /// Maximum width in characters.
    pub width: usize,
    /// Custom minimum value (if not scaling from data).
    pub min_value: Option<f64>,
    /// Custom maximum value (if not scaling from data).
    pub max_value: Option<f64>,
}

impl Default for SparklineConfig {
    fn default() -> Self {
        Self {
            width: 40,
            min_value: None,
            max_value: None,
        }
    }
}

/// Generate an ASCII sparkline from a slice of values.
pub fn sparkline(values: &[f64], width: usize) -> String {
    sparkline_with_config(
        values,
        &SparklineConfig {
            width,
            ..Default::default()
        },
    )
}

/// Generate an ASCII sparkline with custom configuration.
pub fn sparkline_with_config(values: &[f64], config: &SparklineConfig) -> String {
    if values.is_empty() || config.width == 0 {
        return String::new();
    }

    let sampled = if values.len() > config.width {
        downsample(values, config.width)
    } else {
        values.to_vec()
    };

    let min_val = config
        .min_value
        .unwrap_or_else(|| sampled.iter().cloned().fold(f64::INFINITY, f64::min));
    let max_val = config
        .max_value
        .unwrap_or_else(|| sampled.iter().cloned().fold(f64::NEG_INFINITY, f64::max));
    let range = max_val - min_val;

    let mut result = String::with_capacity(sampled.len() * 4);
    for &val in &sampled {
        let normalized = if range > 0.0 {
            ((val - min_val) / range).clamp(0.0, 1.0)
        } else {
            0.5
        };
        let idx = ((normalized * 7.0).round() as usize).min(7);
        result.push(SPARKLINE_CHARS[idx]);
    }
    result
}

/// Downsample a slice of values to a target length using averaging.
fn downsample(values: &[f64], target_len: usize) -> Vec<f64> {
    if values.len() <= target_len {
        return values.to_vec();
    }

    let chunk_size = values.len() as f64 / target_len as f64;
    let mut result = Vec::with_capacity(target_len);
    for i in 0..target_len {
        let start = (i as f64 * chunk_size).floor() as usize;
        let end = (((i + 1) as f64 * chunk_size).ceil() as usize).min(values.len());
        if start < end {
            let sum: f64 = values[start..end].iter().sum();
            result.push(sum / (end - start) as f64);
        }
    }
    result
}

/// Projected and required growth paths drawn on a shared scale.
pub fn growth_chart(projection: &GrowthProjection, width: usize) -> String {
    let projected = projection.projected_values();
    let required = projection.required_values();

    let all = projected.iter().chain(required.iter());
    let min_value = all.clone().cloned().fold(f64::INFINITY, f64::min);
    let max_value = all.cloned().fold(f64::NEG_INFINITY, f64::max);
    let config = SparklineConfig {
        width,
        min_value: Some(min_value),
        max_value: Some(max_value),
    };

    let mut output = String::new();
    let _ = writeln!(
        output,
        "Projected {}  {}",
        sparkline_with_config(&projected, &config),
        format_inr(projection.final_value)
    );
    let _ = writeln!(
        output,
        "Required  {}  {}",
        sparkline_with_config(&required, &config),
        format_inr(projection.goal.target_capital)
    );
    let _ = write!(
        output,
        "Years to target: {}",
        format_years(projection.years_to_target)
    );
    output
}

/// Horizontal bars for each significant weight, largest first.
pub fn allocation_bars(weights: &AllocationWeights, width: usize) -> String {
    let significant = weights.significant(DISPLAY_WEIGHT_THRESHOLD);
    let label_width = significant.iter().map(|(s, _)| s.chars().count()).max().unwrap_or(0);

    let mut output = String::new();
    for (symbol, weight) in significant {
        let filled = ((weight * width as f64).round() as usize).min(width);
        let _ = writeln!(
            output,
            "{:<lw$} {}{} {:>6.2}%",
            symbol,
            "█".repeat(filled),
            " ".repeat(width - filled),
            weight * 100.0,
            lw = label_width
        );
    }
    output
}

/// Truncate a string to a maximum length, adding ellipsis if needed.
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// Format a fraction as a signed percentage.
fn format_pct(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.1}%", value * 100.0)
    } else {
        format!("{:.1}%", value * 100.0)
    }
}

impl StrategyComparison {
    /// Format as a plain-text table.
    pub fn format_table(&self) -> String {
        if self.rows().is_empty() {
            return "No strategies to compare.".to_string();
        }

        let mut output = String::new();
        let _ = writeln!(
            output,
            "Strategy Comparison (required CAGR {})",
            format_pct(self.required_cagr)
        );
        let _ = writeln!(output, "{}", "─".repeat(84));
        let _ = writeln!(
            output,
            "{:18} {:>9} {:>9} {:>7} {:>9} {:>10} {:>16}",
            "Strategy", "Return", "Vol", "Sharpe", "Max DD", "Years", "Final Value"
        );
        let _ = writeln!(output, "{}", "─".repeat(84));

        for row in self.rows() {
            let marker = if row.fallback.is_some() { "*" } else { "" };
            let _ = writeln!(
                output,
                "{:18} {:>9} {:>9} {:>7.2} {:>9} {:>10} {:>16}",
                truncate_str(&format!("{}{}", row.strategy, marker), 18),
                format_pct(row.annual_return),
                format!("{:.1}%", row.annual_volatility * 100.0),
                row.sharpe_ratio,
                format_pct(row.max_drawdown),
                format_years(row.years_to_target),
                format_inr(row.final_value)
            );
        }

        if self.rows().iter().any(|r| r.fallback.is_some()) {
            let _ = writeln!(output, "* fell back to equal weight");
        }
        output
    }
}

impl std::fmt::Display for StrategyComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_table())
    }
}
