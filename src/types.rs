//! Core data types shared by the allocation strategies.

use crate::error::{NiveshError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Tolerance used when checking that a full allocation sums to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Identifies one of the built-in allocation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    EqualWeight,
    RiskParity,
    MinimumVariance,
    MaximumSharpe,
    MomentumWeighted,
    KellyCriterion,
}

impl StrategyKind {
    /// All strategies in comparison order.
    pub const ALL: [StrategyKind; 6] = [
        StrategyKind::EqualWeight,
        StrategyKind::RiskParity,
        StrategyKind::MinimumVariance,
        StrategyKind::MaximumSharpe,
        StrategyKind::MomentumWeighted,
        StrategyKind::KellyCriterion,
    ];

    /// Display name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::EqualWeight => "Equal Weight",
            StrategyKind::RiskParity => "Risk Parity",
            StrategyKind::MinimumVariance => "Minimum Variance",
            StrategyKind::MaximumSharpe => "Maximum Sharpe",
            StrategyKind::MomentumWeighted => "Momentum Weighted",
            StrategyKind::KellyCriterion => "Kelly Criterion",
        }
    }

    /// Identifier used in configuration files and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            StrategyKind::EqualWeight => "equal-weight",
            StrategyKind::RiskParity => "risk-parity",
            StrategyKind::MinimumVariance => "minimum-variance",
            StrategyKind::MaximumSharpe => "maximum-sharpe",
            StrategyKind::MomentumWeighted => "momentum-weighted",
            StrategyKind::KellyCriterion => "kelly-criterion",
        }
    }

    /// One-line description of the allocation rule.
    pub fn description(&self) -> &'static str {
        match self {
            StrategyKind::EqualWeight => "1/N in every asset",
            StrategyKind::RiskParity => "Weights proportional to inverse annualized volatility",
            StrategyKind::MinimumVariance => {
                "Pseudo-inverse closed form, negatives clipped and renormalized"
            }
            StrategyKind::MaximumSharpe => "Best Sharpe ratio among random simplex samples",
            StrategyKind::MomentumWeighted => {
                "Proportional to positive trailing summed returns"
            }
            StrategyKind::KellyCriterion => "Per-asset Kelly fraction, capped and normalized",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = NiveshError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['_', ' '], "-");
        StrategyKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.slug() == wanted)
            .or(match wanted.as_str() {
                "equal" | "ew" => Some(StrategyKind::EqualWeight),
                "inverse-volatility" | "rp" => Some(StrategyKind::RiskParity),
                "min-variance" | "min-var" => Some(StrategyKind::MinimumVariance),
                "max-sharpe" => Some(StrategyKind::MaximumSharpe),
                "momentum" => Some(StrategyKind::MomentumWeighted),
                "kelly" => Some(StrategyKind::KellyCriterion),
                _ => None,
            })
            .ok_or_else(|| NiveshError::ConfigError(format!("Unknown strategy: {}", s)))
    }
}

/// Why a strategy gave up on its own rule and returned equal weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// No asset had strictly positive trailing momentum.
    NoPositiveMomentum,
    /// Every per-asset Kelly fraction was zero.
    NoPositiveKelly,
    /// Every asset had zero volatility.
    ZeroVolatility,
    /// The pseudo-inverse produced weights that cannot be normalized.
    DegenerateCovariance,
    /// The random search never produced a usable sample.
    NoValidSample,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FallbackReason::NoPositiveMomentum => "no asset has positive trailing momentum",
            FallbackReason::NoPositiveKelly => "all Kelly fractions are zero",
            FallbackReason::ZeroVolatility => "all assets have zero volatility",
            FallbackReason::DegenerateCovariance => "covariance pseudo-inverse weights sum to zero",
            FallbackReason::NoValidSample => "random search produced no valid sample",
        };
        f.write_str(msg)
    }
}

/// Mapping from asset symbol to non-negative weight, kept in asset order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationWeights {
    symbols: Vec<String>,
    weights: Vec<f64>,
}

impl AllocationWeights {
    /// Create weights after checking shape and sign.
    pub fn new(symbols: Vec<String>, weights: Vec<f64>) -> Result<Self> {
        if symbols.len() != weights.len() {
            return Err(NiveshError::InvalidInput(format!(
                "{} symbols but {} weights",
                symbols.len(),
                weights.len()
            )));
        }
        if let Some((s, w)) = symbols
            .iter()
            .zip(&weights)
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(NiveshError::InvalidInput(format!(
                "Weight for {} must be finite and non-negative, got {}",
                s, w
            )));
        }
        Ok(Self { symbols, weights })
    }

    /// Equal 1/N allocation.
    pub fn equal(symbols: &[String]) -> Self {
        let weight = 1.0 / symbols.len() as f64;
        Self {
            symbols: symbols.to_vec(),
            weights: vec![weight; symbols.len()],
        }
    }

    /// Scale raw non-negative scores so they sum to one.
    ///
    /// Returns `None` when the scores sum to zero or to a non-finite value.
    pub fn normalized(symbols: &[String], raw: Vec<f64>) -> Option<Self> {
        let total: f64 = raw.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        Some(Self {
            symbols: symbols.to_vec(),
            weights: raw.into_iter().map(|w| w / total).collect(),
        })
    }

    /// Weight for a symbol, zero when absent.
    pub fn get(&self, symbol: &str) -> f64 {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.weights[i])
            .unwrap_or(0.0)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn values(&self) -> &[f64] {
        &self.weights
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.symbols
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Whether the weights form a full allocation.
    pub fn is_fully_allocated(&self) -> bool {
        (self.total() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Weights laid out in the order of `symbols`, zero for anything missing.
    pub fn aligned(&self, symbols: &[String]) -> Vec<f64> {
        symbols.iter().map(|s| self.get(s)).collect()
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        self.iter().map(|(s, w)| (s.to_string(), w)).collect()
    }

    /// Clip every weight at `max_weight` and renormalize once.
    ///
    /// A single pass, so renormalizing can lift a clipped weight back above
    /// the cap when few assets are held.
    pub fn cap_positions(&self, max_weight: f64) -> Result<Self> {
        if !(max_weight > 0.0 && max_weight <= 1.0) {
            return Err(NiveshError::InvalidInput(format!(
                "Max position must be in (0, 1], got {}",
                max_weight
            )));
        }
        let capped: Vec<f64> = self.weights.iter().map(|w| w.min(max_weight)).collect();
        Self::normalized(&self.symbols, capped).ok_or_else(|| {
            NiveshError::InvalidInput("Cannot cap an allocation with no positive weight".into())
        })
    }

    /// Positions above `threshold`, largest first.
    pub fn significant(&self, threshold: f64) -> Vec<(&str, f64)> {
        let mut kept: Vec<(&str, f64)> = self.iter().filter(|(_, w)| *w > threshold).collect();
        kept.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        kept
    }

    /// Split `capital` across positions and convert to whole shares where a price is known.
    pub fn position_sizes(
        &self,
        capital: f64,
        latest_prices: &HashMap<String, f64>,
    ) -> Vec<PositionSize> {
        self.iter()
            .map(|(symbol, weight)| {
                let allocated = capital * weight;
                let price = latest_prices.get(symbol).copied().filter(|p| *p > 0.0);
                PositionSize {
                    symbol: symbol.to_string(),
                    weight,
                    capital: allocated,
                    price,
                    shares: price.map(|p| (allocated / p).floor() as u64),
                }
            })
            .collect()
    }
}

/// Capital and share count for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSize {
    pub symbol: String,
    pub weight: f64,
    pub capital: f64,
    pub price: Option<f64>,
    pub shares: Option<u64>,
}

/// Output of one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// Strategy that produced the weights.
    pub strategy: StrategyKind,
    /// The weights themselves.
    pub weights: AllocationWeights,
    /// Set when the strategy fell back to equal weight.
    pub fallback: Option<FallbackReason>,
}

impl Allocation {
    /// An allocation produced by the strategy's own rule.
    pub fn optimized(strategy: StrategyKind, weights: AllocationWeights) -> Self {
        Self {
            strategy,
            weights,
            fallback: None,
        }
    }

    /// Equal weights substituted for a degenerate result.
    pub fn fallback(strategy: StrategyKind, symbols: &[String], reason: FallbackReason) -> Self {
        warn!("{} fell back to equal weight: {}", strategy, reason);
        Self {
            strategy,
            weights: AllocationWeights::equal(symbols),
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}
