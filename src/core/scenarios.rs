use serde::{Deserialize, Serialize};

use super::engine::{percent_of, simulate_at_rate};
use super::rates::{RateCatalog, resolve_annual_rate};
use super::types::{PeriodUnit, RiskBand, ScenarioLabel, ScenarioVariant, SimulationInput};

pub const PESSIMISTIC_WEIGHT: f64 = 20.0;
pub const REALISTIC_WEIGHT: f64 = 60.0;
pub const OPTIMISTIC_WEIGHT: f64 = 20.0;

pub const SENSITIVITY_SHIFTS: [f64; 4] = [-20.0, -10.0, 10.0, 20.0];

/// Relative shifts, in percent, applied to one scenario's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioShift {
    pub rate_shift_percent: f64,
    pub inflation_shift_percent: Option<f64>,
    pub contribution_shift_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioShifts {
    pub pessimistic: ScenarioShift,
    pub realistic: ScenarioShift,
    pub optimistic: ScenarioShift,
}

impl Default for ScenarioShifts {
    fn default() -> Self {
        Self {
            pessimistic: ScenarioShift {
                rate_shift_percent: -20.0,
                inflation_shift_percent: Some(20.0),
                contribution_shift_percent: Some(-10.0),
            },
            realistic: ScenarioShift::default(),
            optimistic: ScenarioShift {
                rate_shift_percent: 20.0,
                inflation_shift_percent: Some(-20.0),
                contribution_shift_percent: Some(10.0),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStatistics {
    pub min_final_balance: f64,
    pub max_final_balance: f64,
    pub mean_final_balance: f64,
    pub expected_value: f64,
    pub standard_deviation: f64,
    pub coefficient_of_variation: f64,
    pub risk: RiskBand,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioAnalysis {
    pub variants: Vec<ScenarioVariant>,
    pub statistics: ScenarioStatistics,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityParameter {
    Rate,
    Contribution,
    Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub parameter: SensitivityParameter,
    pub shift_percent: f64,
    pub final_balance: f64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityReport {
    pub base_final_balance: f64,
    pub points: Vec<SensitivityPoint>,
}

fn scale(value: f64, shift_percent: f64) -> f64 {
    (value * (1.0 + shift_percent / 100.0)).max(0.0)
}

fn run_variant(
    base: &SimulationInput,
    base_rate: f64,
    label: ScenarioLabel,
    probability_weight: f64,
    shift: &ScenarioShift,
) -> ScenarioVariant {
    let mut input = base.clone();
    if let Some(pct) = shift.contribution_shift_percent {
        input.monthly_contribution = scale(input.monthly_contribution, pct);
    }
    if let (Some(pct), Some(setting)) = (shift.inflation_shift_percent, input.inflation.as_mut()) {
        setting.annual_rate = scale(setting.annual_rate, pct);
    }
    let rate = scale(base_rate, shift.rate_shift_percent);

    ScenarioVariant {
        label,
        probability_weight,
        rate_shift_percent: shift.rate_shift_percent,
        inflation_shift_percent: shift.inflation_shift_percent,
        contribution_shift_percent: shift.contribution_shift_percent,
        result: simulate_at_rate(&input, rate),
    }
}

/// Pessimistic, realistic and optimistic re-runs of `base` with fixed
/// 20/60/20 probability weights.
pub fn run_scenarios(
    base: &SimulationInput,
    catalog: &RateCatalog,
    shifts: &ScenarioShifts,
) -> ScenarioAnalysis {
    let base_rate = resolve_annual_rate(base, catalog);
    let variants = vec![
        run_variant(
            base,
            base_rate,
            ScenarioLabel::Pessimistic,
            PESSIMISTIC_WEIGHT,
            &shifts.pessimistic,
        ),
        run_variant(
            base,
            base_rate,
            ScenarioLabel::Realistic,
            REALISTIC_WEIGHT,
            &shifts.realistic,
        ),
        run_variant(
            base,
            base_rate,
            ScenarioLabel::Optimistic,
            OPTIMISTIC_WEIGHT,
            &shifts.optimistic,
        ),
    ];
    let statistics = scenario_statistics(&variants);
    ScenarioAnalysis {
        variants,
        statistics,
    }
}

fn scenario_statistics(variants: &[ScenarioVariant]) -> ScenarioStatistics {
    let finals: Vec<f64> = variants.iter().map(|v| v.result.final_balance).collect();
    let min_final_balance = finals.iter().copied().fold(f64::INFINITY, f64::min);
    let max_final_balance = finals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_final_balance = finals.iter().sum::<f64>() / finals.len() as f64;

    let expected_value = variants
        .iter()
        .map(|v| v.probability_weight / 100.0 * v.result.final_balance)
        .sum::<f64>();
    let variance = variants
        .iter()
        .map(|v| v.probability_weight / 100.0 * (v.result.final_balance - expected_value).powi(2))
        .sum::<f64>();
    let standard_deviation = variance.sqrt();
    let coefficient_of_variation = percent_of(standard_deviation, expected_value);

    ScenarioStatistics {
        min_final_balance,
        max_final_balance,
        mean_final_balance,
        expected_value,
        standard_deviation,
        coefficient_of_variation,
        risk: risk_band(coefficient_of_variation),
    }
}

pub fn risk_band(coefficient_of_variation: f64) -> RiskBand {
    if coefficient_of_variation < 10.0 {
        RiskBand::Low
    } else if coefficient_of_variation < 25.0 {
        RiskBand::Moderate
    } else if coefficient_of_variation < 50.0 {
        RiskBand::High
    } else {
        RiskBand::VeryHigh
    }
}

/// One-at-a-time shifts of rate, contribution and period around `base`.
pub fn sensitivity_analysis(base: &SimulationInput, catalog: &RateCatalog) -> SensitivityReport {
    let base_rate = resolve_annual_rate(base, catalog);
    let base_final_balance = simulate_at_rate(base, base_rate).final_balance;

    let mut points = Vec::with_capacity(SENSITIVITY_SHIFTS.len() * 3);
    for parameter in [
        SensitivityParameter::Rate,
        SensitivityParameter::Contribution,
        SensitivityParameter::Period,
    ] {
        for shift in SENSITIVITY_SHIFTS {
            let mut input = base.clone();
            let mut rate = base_rate;
            match parameter {
                SensitivityParameter::Rate => rate = scale(base_rate, shift),
                SensitivityParameter::Contribution => {
                    input.monthly_contribution = scale(base.monthly_contribution, shift);
                }
                SensitivityParameter::Period => {
                    input.period_count = scale(base.period_months() as f64, shift).round() as i32;
                    input.period_unit = PeriodUnit::Months;
                }
            }
            let final_balance = simulate_at_rate(&input, rate).final_balance;
            points.push(SensitivityPoint {
                parameter,
                shift_percent: shift,
                final_balance,
                change_percent: percent_of(final_balance - base_final_balance, base_final_balance),
            });
        }
    }

    SensitivityReport {
        base_final_balance,
        points,
    }
}
