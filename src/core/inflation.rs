use serde::Serialize;

use super::engine::{bounded_months, monthly_rate_from_annual, percent_of, real_annual_rate};
use super::types::MonthlyRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InflationParams {
    pub initial_value: f64,
    pub monthly_contribution: f64,
    pub annual_rate: f64,
    pub inflation_rate: f64,
    pub period_months: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationReport {
    pub nominal_trajectory: Vec<MonthlyRecord>,
    pub real_trajectory: Vec<MonthlyRecord>,
    pub total_contributed: f64,
    pub final_nominal: f64,
    /// Balance compounded at the Fisher real rate.
    pub final_real: f64,
    /// Nominal balance discounted by cumulative inflation.
    pub final_deflated: f64,
    pub total_loss: f64,
    pub loss_percent: f64,
    pub real_annual_rate: f64,
    /// `None` when there is no monthly contribution to recover with.
    pub months_to_recover_loss: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationComparison {
    pub without_inflation: f64,
    pub with_inflation: f64,
    pub absolute_difference: f64,
    pub percent_difference: f64,
}

/// Nominal and real growth of the same contribution schedule.
///
/// Contributions are made at the end of every month, including the first.
pub fn simulate_inflation(params: &InflationParams) -> InflationReport {
    let months = bounded_months(params.period_months);
    let nominal_rate = monthly_rate_from_annual(params.annual_rate);
    let monthly_inflation = monthly_rate_from_annual(params.inflation_rate);
    let real_rate_annual = real_annual_rate(params.annual_rate, params.inflation_rate);
    let real_rate = monthly_rate_from_annual(real_rate_annual);

    let mut nominal_trajectory = Vec::with_capacity(months as usize);
    let mut real_trajectory = Vec::with_capacity(months as usize);
    let mut nominal = params.initial_value;
    let mut real = params.initial_value;
    let mut contributed = params.initial_value;

    for month in 1..=months {
        let nominal_interest = nominal * nominal_rate;
        nominal += nominal_interest + params.monthly_contribution;

        let real_interest = real * real_rate;
        real += real_interest + params.monthly_contribution;
        contributed += params.monthly_contribution;

        let deflated = nominal / (1.0 + monthly_inflation).powi(month);
        let loss = nominal * monthly_inflation;

        nominal_trajectory.push(MonthlyRecord {
            month_index: month as u32,
            contribution: params.monthly_contribution,
            interest_accrued: nominal_interest,
            cumulative_balance: nominal,
            real_balance: Some(deflated),
            inflation_loss: Some(loss),
            real_gain_this_month: Some(nominal_interest - loss),
        });
        real_trajectory.push(MonthlyRecord {
            month_index: month as u32,
            contribution: params.monthly_contribution,
            interest_accrued: real_interest,
            cumulative_balance: real,
            ..MonthlyRecord::default()
        });
    }

    let final_deflated = nominal / (1.0 + monthly_inflation).powi(months);
    let total_loss = nominal - final_deflated;
    let months_to_recover_loss = if params.monthly_contribution > 0.0 {
        Some((total_loss.max(0.0) / params.monthly_contribution).ceil() as u32)
    } else {
        None
    };

    InflationReport {
        nominal_trajectory,
        real_trajectory,
        total_contributed: contributed,
        final_nominal: nominal,
        final_real: real,
        final_deflated,
        total_loss,
        loss_percent: percent_of(total_loss, nominal),
        real_annual_rate: real_rate_annual,
        months_to_recover_loss,
    }
}

pub fn compare_inflation(params: &InflationParams) -> InflationComparison {
    let with = simulate_inflation(params);
    let without = simulate_inflation(&InflationParams {
        inflation_rate: 0.0,
        ..*params
    });

    let absolute_difference = without.final_nominal - with.final_deflated;
    InflationComparison {
        without_inflation: without.final_nominal,
        with_inflation: with.final_deflated,
        absolute_difference,
        percent_difference: percent_of(absolute_difference, without.final_nominal),
    }
}
