//! Annualized risk model.
//!
//! A [`RiskModel`] is an immutable snapshot of the annualized mean-return
//! vector and covariance matrix of a [`ReturnMatrix`]. It is computed once and
//! shared by reference across every allocation strategy.

use crate::data::{ReturnMatrix, MIN_RETURN_PERIODS};
use crate::error::{NiveshError, Result};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Relative cutoff for small singular values in the pseudo-inverse.
pub const PINV_RCOND: f64 = 1e-15;

/// Annualized mean returns and covariance for a set of assets.
#[derive(Debug, Clone)]
pub struct RiskModel {
    symbols: Vec<String>,
    mean: DVector<f64>,
    covariance: DMatrix<f64>,
    periods_per_year: f64,
    n_periods: usize,
}

impl RiskModel {
    /// Estimate the model from periodic returns.
    ///
    /// The mean is the arithmetic mean of each column scaled by
    /// `periods_per_year`; the covariance is the sample covariance
    /// (denominator `n - 1`) scaled the same way.
    pub fn estimate(returns: &ReturnMatrix, periods_per_year: f64) -> Result<Self> {
        if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
            return Err(NiveshError::InvalidInput(format!(
                "periods_per_year must be positive, got {}",
                periods_per_year
            )));
        }
        let n_assets = returns.n_assets();
        let n_periods = returns.n_periods();
        if n_assets == 0 {
            return Err(NiveshError::InsufficientData(
                "Need at least one asset".to_string(),
            ));
        }
        if n_periods < MIN_RETURN_PERIODS {
            return Err(NiveshError::InsufficientData(format!(
                "Need at least {} aligned return periods, have {}",
                MIN_RETURN_PERIODS, n_periods
            )));
        }

        let rows = returns.rows();
        let n = n_periods as f64;
        let means: Vec<f64> = (0..n_assets)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n)
            .collect();

        let mut cov = DMatrix::<f64>::zeros(n_assets, n_assets);
        for i in 0..n_assets {
            for j in i..n_assets {
                let c = rows
                    .iter()
                    .map(|r| (r[i] - means[i]) * (r[j] - means[j]))
                    .sum::<f64>()
                    / (n - 1.0);
                cov[(i, j)] = c * periods_per_year;
                cov[(j, i)] = c * periods_per_year;
            }
        }

        let mean = DVector::from_iterator(n_assets, means.iter().map(|m| m * periods_per_year));

        debug!(
            "Estimated risk model: {} assets over {} periods",
            n_assets, n_periods
        );

        Ok(Self {
            symbols: returns.symbols().to_vec(),
            mean,
            covariance: cov,
            periods_per_year,
            n_periods,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Number of return periods the model was fitted on.
    pub fn n_periods(&self) -> usize {
        self.n_periods
    }

    pub fn periods_per_year(&self) -> f64 {
        self.periods_per_year
    }

    /// Column position of an asset.
    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Annualized mean returns, in column order.
    pub fn expected_returns(&self) -> &DVector<f64> {
        &self.mean
    }

    /// Annualized covariance matrix.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Annualized standard deviation of each asset.
    pub fn volatilities(&self) -> Vec<f64> {
        self.covariance
            .diagonal()
            .iter()
            .map(|v| v.max(0.0).sqrt())
            .collect()
    }

    /// `w · mean` for weights in column order.
    pub fn portfolio_return(&self, weights: &[f64]) -> f64 {
        weights.iter().zip(self.mean.iter()).map(|(w, m)| w * m).sum()
    }

    /// `w · Cov · w` for weights in column order.
    pub fn portfolio_variance(&self, weights: &[f64]) -> f64 {
        let n = self.n_assets().min(weights.len());
        let mut variance = 0.0;
        for i in 0..n {
            for j in 0..n {
                variance += weights[i] * weights[j] * self.covariance[(i, j)];
            }
        }
        variance
    }

    /// `sqrt(w · Cov · w)`, clamped at zero against rounding.
    pub fn portfolio_volatility(&self, weights: &[f64]) -> f64 {
        self.portfolio_variance(weights).max(0.0).sqrt()
    }

    /// Moore-Penrose pseudo-inverse of the covariance matrix.
    ///
    /// Singular values below `PINV_RCOND` times the largest singular value are
    /// treated as zero, so singular and rank-deficient matrices are tolerated.
    pub fn pseudo_inverse(&self) -> Result<DMatrix<f64>> {
        let svd = self.covariance.clone().svd(true, true);
        let max_sv = svd.singular_values.iter().cloned().fold(0.0, f64::max);
        svd.pseudo_inverse(max_sv * PINV_RCOND)
            .map_err(|e| NiveshError::DataError(format!("Pseudo-inverse failed: {}", e)))
    }

    /// Ratio of the largest to the smallest singular value of the covariance.
    ///
    /// Infinite for a singular matrix.
    pub fn condition_number(&self) -> f64 {
        let sv = self.covariance.singular_values();
        let max = sv.iter().cloned().fold(0.0, f64::max);
        let min = sv.iter().cloned().fold(f64::INFINITY, f64::min);
        if min > 0.0 {
            max / min
        } else {
            f64::INFINITY
        }
    }
}
