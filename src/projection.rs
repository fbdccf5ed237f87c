//! Multi-year growth projection against an investment goal.
//!
//! A projection compounds an allocation's annual return from the initial
//! capital, one point per year from 0 through the horizon, and pairs each
//! point with the value the required CAGR would reach that year.

use crate::error::{NiveshError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Initial capital, target capital and horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentGoal {
    pub initial_capital: f64,
    pub target_capital: f64,
    pub horizon_years: u32,
}

impl Default for InvestmentGoal {
    fn default() -> Self {
        Self {
            initial_capital: 2_000_000.0,
            target_capital: 10_000_000.0,
            horizon_years: 10,
        }
    }
}

impl InvestmentGoal {
    pub fn new(initial_capital: f64, target_capital: f64, horizon_years: u32) -> Self {
        Self {
            initial_capital,
            target_capital,
            horizon_years,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(NiveshError::InvalidInput(format!(
                "Initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !(self.target_capital.is_finite() && self.target_capital > 0.0) {
            return Err(NiveshError::InvalidInput(format!(
                "Target capital must be positive, got {}",
                self.target_capital
            )));
        }
        if self.horizon_years == 0 {
            return Err(NiveshError::InvalidInput(
                "Horizon must be at least one year".to_string(),
            ));
        }
        Ok(())
    }

    /// Constant annual rate that turns the initial into the target capital.
    pub fn required_cagr(&self) -> f64 {
        required_cagr(self.initial_capital, self.target_capital, self.horizon_years)
    }

    /// Target as a multiple of the initial capital.
    pub fn multiple(&self) -> f64 {
        self.target_capital / self.initial_capital
    }
}

/// `(target/initial)^(1/years) − 1`.
pub fn required_cagr(initial_capital: f64, target_capital: f64, years: u32) -> f64 {
    (target_capital / initial_capital).powf(1.0 / years as f64) - 1.0
}

/// Years needed to reach the target compounding at `annual_return`.
///
/// `ln(target/initial) / ln(1 + annual_return)` for a positive return, so a
/// target below the initial capital gives a negative count. Infinite when
/// `annual_return <= 0`, whatever the target.
pub fn years_to_target(initial_capital: f64, target_capital: f64, annual_return: f64) -> f64 {
    if annual_return > 0.0 {
        (target_capital / initial_capital).ln() / (1.0 + annual_return).ln()
    } else {
        f64::INFINITY
    }
}

/// One year of a projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: u32,
    pub projected_value: f64,
    pub required_value: f64,
}

/// Year-by-year growth path of an allocation against the required path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthProjection {
    pub goal: InvestmentGoal,
    /// Points for years `0..=horizon_years`.
    pub points: Vec<ProjectionPoint>,
    /// Infinite when the target is unreachable; serialized as `null`.
    #[serde(
        serialize_with = "serialize_years",
        deserialize_with = "deserialize_years"
    )]
    pub years_to_target: f64,
    /// Projected value at the horizon.
    pub final_value: f64,
    pub required_cagr: f64,
    /// The allocation's annual return.
    pub projected_cagr: f64,
}

impl GrowthProjection {
    /// Project `goal` forward at a constant `annual_return`.
    pub fn project(goal: &InvestmentGoal, annual_return: f64) -> Result<Self> {
        goal.validate()?;
        if !annual_return.is_finite() {
            return Err(NiveshError::InvalidInput(format!(
                "Annual return must be finite, got {}",
                annual_return
            )));
        }

        let required = goal.required_cagr();
        let growth = (1.0 + annual_return).max(0.0);
        let mut value = goal.initial_capital;
        let mut points = Vec::with_capacity(goal.horizon_years as usize + 1);
        for year in 0..=goal.horizon_years {
            points.push(ProjectionPoint {
                year,
                projected_value: value,
                required_value: goal.initial_capital * (1.0 + required).powi(year as i32),
            });
            value *= growth;
        }
        let final_value = points
            .last()
            .map(|p| p.projected_value)
            .unwrap_or(goal.initial_capital);

        Ok(Self {
            goal: *goal,
            points,
            years_to_target: years_to_target(
                goal.initial_capital,
                goal.target_capital,
                annual_return,
            ),
            final_value,
            required_cagr: required,
            projected_cagr: annual_return,
        })
    }

    /// Whether the target is reached at any finite time.
    pub fn is_reachable(&self) -> bool {
        self.years_to_target.is_finite()
    }

    /// Whether the target is reached within the horizon.
    pub fn meets_target(&self) -> bool {
        self.final_value >= self.goal.target_capital
    }

    /// Projected values in year order.
    pub fn projected_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.projected_value).collect()
    }

    /// Required-path values in year order.
    pub fn required_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.required_value).collect()
    }
}

pub(crate) fn serialize_years<S: Serializer>(
    years: &f64,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    if years.is_finite() {
        serializer.serialize_some(years)
    } else {
        serializer.serialize_none()
    }
}

pub(crate) fn deserialize_years<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_cagr_five_x_in_ten_years() {
        let goal = InvestmentGoal::default();
        let cagr = goal.required_cagr();
        assert!((cagr - 0.174619).abs() < 1e-5);
        assert!((5.0f64.powf(0.1) - 1.0 - cagr).abs() < 1e-12);
        assert_eq!(goal.multiple(), 5.0);
        assert!(((1.0 + cagr).powi(10) - goal.multiple()).abs() < 1e-9);
    }

    #[test]
    fn test_projection_path() {
        let goal = InvestmentGoal::new(100.0, 200.0, 3);
        let p = GrowthProjection::project(&goal, 0.10).unwrap();

        assert_eq!(p.points.len(), 4);
        assert_eq!(p.points[0].projected_value, 100.0);
        assert_eq!(p.points[0].required_value, 100.0);
        assert!((p.points[3].projected_value - 133.1).abs() < 1e-9);
        assert!((p.final_value - 133.1).abs() < 1e-9);
        assert!((p.points[3].required_value - 200.0).abs() < 1e-9);
        assert!(!p.meets_target());
        assert_eq!(p.projected_cagr, 0.10);
    }

    #[test]
    fn test_years_to_target_round_trip() {
        let years = years_to_target(2_000_000.0, 10_000_000.0, 0.12);
        let reached = 2_000_000.0 * 1.12f64.powf(years);
        assert!((reached - 10_000_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_unreachable_target() {
        let goal = InvestmentGoal::default();
        for r in [0.0, -0.05] {
            let p = GrowthProjection::project(&goal, r).unwrap();
            assert!(p.years_to_target.is_infinite());
            assert!(!p.is_reachable());
        }
    }

    #[test]
    fn test_target_at_or_below_initial() {
        assert_eq!(years_to_target(100.0, 100.0, 0.1), 0.0);
        let years = years_to_target(100.0, 50.0, 0.1);
        assert!((years - 0.5f64.ln() / 1.1f64.ln()).abs() < 1e-12);
        assert!((years + 7.2725).abs() < 1e-4);

        // A non-positive return never compounds toward any target.
        assert!(years_to_target(100.0, 50.0, -0.1).is_infinite());
        assert!(years_to_target(100.0, 100.0, 0.0).is_infinite());

        let goal = InvestmentGoal::new(100.0, 50.0, 5);
        let p = GrowthProjection::project(&goal, -0.2).unwrap();
        assert!(p.years_to_target.is_infinite());
        assert!(!p.is_reachable());
    }

    #[test]
    fn test_total_loss_floors_at_zero() {
        let goal = InvestmentGoal::new(100.0, 200.0, 2);
        let p = GrowthProjection::project(&goal, -1.5).unwrap();
        assert_eq!(p.final_value, 0.0);
    }

    #[test]
    fn test_invalid_goal() {
        assert!(GrowthProjection::project(&InvestmentGoal::new(0.0, 10.0, 5), 0.1).is_err());
        assert!(GrowthProjection::project(&InvestmentGoal::new(10.0, -1.0, 5), 0.1).is_err());
        assert!(GrowthProjection::project(&InvestmentGoal::new(10.0, 20.0, 0), 0.1).is_err());
        assert!(GrowthProjection::project(&InvestmentGoal::default(), f64::NAN).is_err());
    }

    #[test]
    fn test_infinite_years_serialize_as_null() {
        let p = GrowthProjection::project(&InvestmentGoal::default(), -0.01).unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"years_to_target\":null"));
        let back: GrowthProjection = serde_json::from_str(&json).unwrap();
        assert!(back.years_to_target.is_infinite());
    }
}
