//! Optimizer parameters and configuration file support.
//!
//! [`OptimizerConfig`] holds every tunable of the optimizer. [`NiveshFileConfig`]
//! loads a full run (optimizer, goal, data and allocation settings) from TOML
//! for reproducibility.

use crate::data::{DataConfig, PriceLayout};
use crate::error::{NiveshError, Result};
use crate::projection::InvestmentGoal;
use crate::types::StrategyKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Parameters shared by the risk model and the allocation strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Annualized risk-free rate used in Sharpe ratios.
    pub risk_free_rate: f64,
    /// Return periods per year used to annualize mean and covariance.
    pub periods_per_year: f64,
    /// Random draws for the maximum Sharpe search.
    pub max_sharpe_iterations: usize,
    /// Trailing periods summed for momentum scores.
    pub momentum_lookback: usize,
    /// Cap on each per-asset Kelly fraction.
    pub kelly_max_allocation: f64,
    /// Seed for the maximum Sharpe search.
    pub seed: Option<u64>,
    /// Covariance condition number above which a warning is logged.
    pub condition_number_warning: f64,
    /// Cap on any single position, applied after each strategy.
    pub max_position: Option<f64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.06,
            periods_per_year: 252.0,
            max_sharpe_iterations: 1000,
            momentum_lookback: 90,
            kelly_max_allocation: 0.25,
            seed: None,
            condition_number_warning: 1e10,
            max_position: None,
        }
    }
}

impl OptimizerConfig {
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_periods_per_year(mut self, periods: f64) -> Self {
        self.periods_per_year = periods;
        self
    }

    pub fn with_max_sharpe_iterations(mut self, iterations: usize) -> Self {
        self.max_sharpe_iterations = iterations;
        self
    }

    pub fn with_momentum_lookback(mut self, lookback: usize) -> Self {
        self.momentum_lookback = lookback;
        self
    }

    pub fn with_kelly_max_allocation(mut self, cap: f64) -> Self {
        self.kelly_max_allocation = cap;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_condition_number_warning(mut self, threshold: f64) -> Self {
        self.condition_number_warning = threshold;
        self
    }

    pub fn with_max_position(mut self, max_weight: f64) -> Self {
        self.max_position = Some(max_weight);
        self
    }

    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() {
            return Err(NiveshError::ConfigError(format!(
                "risk_free_rate must be finite, got {}",
                self.risk_free_rate
            )));
        }
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(NiveshError::ConfigError(format!(
                "periods_per_year must be positive, got {}",
                self.periods_per_year
            )));
        }
        if self.momentum_lookback == 0 {
            return Err(NiveshError::ConfigError(
                "momentum_lookback must be at least 1".to_string(),
            ));
        }
        if !(self.kelly_max_allocation > 0.0 && self.kelly_max_allocation <= 1.0) {
            return Err(NiveshError::ConfigError(format!(
                "kelly_max_allocation must be in (0, 1], got {}",
                self.kelly_max_allocation
            )));
        }
        if self.condition_number_warning.is_nan() || self.condition_number_warning <= 0.0 {
            return Err(NiveshError::ConfigError(format!(
                "condition_number_warning must be positive, got {}",
                self.condition_number_warning
            )));
        }
        if let Some(max) = self.max_position {
            if !(max > 0.0 && max <= 1.0) {
                return Err(NiveshError::ConfigError(format!(
                    "max_position must be in (0, 1], got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}

/// Complete run configuration loaded from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NiveshFileConfig {
    /// Optimizer parameters.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// Investment goal for growth projections.
    #[serde(default)]
    pub goal: InvestmentGoal,
    /// Price data settings.
    #[serde(default)]
    pub data: DataSettings,
    /// Strategy selection.
    #[serde(default)]
    pub allocation: AllocationSettings,
}

/// Price data settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSettings {
    /// Path to the price CSV.
    pub path: Option<String>,
    /// Date format in the CSV.
    pub date_format: Option<String>,
    /// CSV delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// File layout: "auto", "wide" or "long".
    #[serde(default)]
    pub layout: PriceLayout,
    /// Treat unparseable rows and cells as gaps.
    #[serde(default = "default_true")]
    pub skip_invalid: bool,
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            path: None,
            date_format: None,
            delimiter: ',',
            layout: PriceLayout::Auto,
            skip_invalid: true,
        }
    }
}

/// Strategy selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSettings {
    /// Strategies to compare, by name or slug.
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,
    /// Run strategies on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_strategies() -> Vec<String> {
    StrategyKind::ALL.iter().map(|k| k.slug().to_string()).collect()
}

impl Default for AllocationSettings {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            parallel: false,
        }
    }
}

impl NiveshFileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = fs::read_to_string(path)?;
        let config: NiveshFileConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NiveshError::ConfigError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check optimizer, goal and allocation settings.
    pub fn validate(&self) -> Result<()> {
        self.optimizer.validate()?;
        self.goal
            .validate()
            .map_err(|e| NiveshError::ConfigError(e.to_string()))?;
        self.strategies().map(|_| ())
    }

    /// Strategies selected in the `[allocation]` section, in listed order.
    pub fn strategies(&self) -> Result<Vec<StrategyKind>> {
        if self.allocation.strategies.is_empty() {
            return Err(NiveshError::ConfigError(
                "At least one strategy must be selected".to_string(),
            ));
        }
        self.allocation
            .strategies
            .iter()
            .map(|s| s.parse::<StrategyKind>())
            .collect()
    }

    /// Convert the `[data]` section into loader settings.
    pub fn to_data_config(&self) -> Result<DataConfig> {
        if !self.data.delimiter.is_ascii() {
            return Err(NiveshError::ConfigError(format!(
                "Delimiter must be a single ASCII character, got {:?}",
                self.data.delimiter
            )));
        }
        Ok(DataConfig {
            date_format: self.data.date_format.clone(),
            delimiter: Some(self.data.delimiter as u8),
            layout: self.data.layout,
            skip_invalid: self.data.skip_invalid,
        })
    }

    /// Generate an example configuration file content.
    pub fn example() -> String {
        r#"# Nivesh Configuration File
# Compares allocation strategies on a price history and projects growth
# toward an investment goal.

[optimizer]
risk_free_rate = 0.065          # 6.5% annual
periods_per_year = 252.0        # daily data
max_sharpe_iterations = 1000
momentum_lookback = 90
kelly_max_allocation = 0.25
# seed = 42                     # reproducible maximum Sharpe search
condition_number_warning = 1e10
# max_position = 0.3            # cap any single holding at 30%

[goal]
initial_capital = 2000000.0     # ₹20 lakh
target_capital = 10000000.0     # ₹1 crore
horizon_years = 10

[data]
path = "data/prices.csv"
# date_format = "%Y-%m-%d"
delimiter = ","
layout = "auto"                 # "wide": date,TCS.NS,INFY.NS,...  "long": date,ticker,close_price
skip_invalid = true

[allocation]
strategies = ["equal-weight", "risk-parity", "minimum-variance", "maximum-sharpe", "momentum-weighted", "kelly-criterion"]
parallel = false
"#.to_string()
    }
}
