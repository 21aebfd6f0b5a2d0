use tracing::debug;

use super::rates::{RateCatalog, resolve_annual_rate};
use super::types::{MonthlyRecord, SimulationInput, SimulationResult};

const RATE_EPS: f64 = 1e-12;

/// Longest horizon any monthly loop runs for.
pub const MAX_PERIOD_MONTHS: i32 = 1_200;

/// Compounding conversion of an annual percent rate into a monthly fraction.
pub fn monthly_rate_from_annual(annual_percent: f64) -> f64 {
    (1.0 + annual_percent / 100.0).powf(1.0 / 12.0) - 1.0
}

pub fn daily_rate_from_annual(annual_percent: f64) -> f64 {
    (1.0 + annual_percent / 100.0).powf(1.0 / 365.0) - 1.0
}

pub fn annuity_future_value_factor(monthly_rate: f64, months: i32) -> f64 {
    if monthly_rate.abs() <= RATE_EPS {
        return months as f64;
    }
    ((1.0 + monthly_rate).powi(months) - 1.0) / monthly_rate
}

pub fn annuity_present_value_factor(monthly_rate: f64, months: i32) -> f64 {
    if monthly_rate.abs() <= RATE_EPS {
        return months as f64;
    }
    (1.0 - (1.0 + monthly_rate).powi(-months)) / monthly_rate
}

pub fn real_annual_rate(nominal_percent: f64, inflation_percent: f64) -> f64 {
    ((1.0 + nominal_percent / 100.0) / (1.0 + inflation_percent / 100.0) - 1.0) * 100.0
}

/// Contribution for a given month as `(recorded, added_to_balance)`.
///
/// With a positive initial value, month 1 records the initial deposit and
/// skips the monthly contribution. Without one, every month contributes.
fn month_contribution(month: i32, initial_value: f64, monthly_contribution: f64) -> (f64, f64) {
    if month == 1 && initial_value > 0.0 {
        (initial_value, 0.0)
    } else {
        (monthly_contribution, monthly_contribution)
    }
}

pub(crate) fn total_contributed(initial_value: f64, monthly_contribution: f64, months: i32) -> f64 {
    if months <= 0 {
        return initial_value;
    }
    if initial_value > 0.0 {
        initial_value + monthly_contribution * (months - 1) as f64
    } else {
        monthly_contribution * months as f64
    }
}

pub(crate) fn bounded_months(months: i32) -> i32 {
    if months > MAX_PERIOD_MONTHS {
        debug!(months, cap = MAX_PERIOD_MONTHS, "period truncated");
    }
    months.clamp(0, MAX_PERIOD_MONTHS)
}

/// Final balance of the monthly loop without building a trajectory.
pub(crate) fn accumulate_final_balance(
    initial_value: f64,
    monthly_contribution: f64,
    monthly_rate: f64,
    months: i32,
) -> f64 {
    let mut balance = initial_value;
    for month in 1..=bounded_months(months) {
        let interest = balance * monthly_rate;
        let (_, added) = month_contribution(month, initial_value, monthly_contribution);
        balance += interest + added;
    }
    balance
}

pub fn simulate(input: &SimulationInput, catalog: &RateCatalog) -> SimulationResult {
    let annual_rate = resolve_annual_rate(input, catalog);
    simulate_at_rate(input, annual_rate)
}

pub fn simulate_at_rate(input: &SimulationInput, annual_rate: f64) -> SimulationResult {
    let has_principal = input.initial_value > 0.0;
    let has_contribution = input.monthly_contribution > 0.0;
    if !has_principal && !has_contribution {
        return SimulationResult::default();
    }

    let monthly_rate = monthly_rate_from_annual(annual_rate);
    let daily_rate = daily_rate_from_annual(annual_rate);

    let months = input.period_months();
    if months <= 0 {
        return SimulationResult {
            total_contributed: input.initial_value,
            final_balance: input.initial_value,
            effective_monthly_rate: monthly_rate * 100.0,
            effective_daily_rate: daily_rate * 100.0,
            ..SimulationResult::default()
        };
    }

    let months = bounded_months(months);
    let inflation = input.inflation_rate();
    let monthly_inflation = inflation.map(monthly_rate_from_annual);

    let mut trajectory = Vec::with_capacity(months as usize);
    let mut balance = input.initial_value;
    let mut contributed = input.initial_value;
    let mut running_inflation_loss = 0.0;

    for month in 1..=months {
        let interest = balance * monthly_rate;
        let (recorded, added) =
            month_contribution(month, input.initial_value, input.monthly_contribution);
        balance += interest + added;
        contributed += added;

        let mut record = MonthlyRecord {
            month_index: month as u32,
            contribution: recorded,
            interest_accrued: interest,
            cumulative_balance: balance,
            ..MonthlyRecord::default()
        };

        if let Some(mi) = monthly_inflation {
            let loss = balance * mi;
            running_inflation_loss += loss;
            record.real_balance = Some(balance / (1.0 + mi).powi(month));
            record.inflation_loss = Some(loss);
            record.real_gain_this_month = Some(interest - loss);
        }

        trajectory.push(record);
    }

    let final_balance = balance;
    let total_contributed = contributed;
    let total_interest = final_balance - total_contributed;
    let total_return_percent = percent_of(total_interest, total_contributed);

    let mut result = SimulationResult {
        total_contributed,
        total_interest,
        final_balance,
        daily_gain: final_balance * daily_rate,
        monthly_gain: final_balance * monthly_rate,
        annual_gain: final_balance * annual_rate / 100.0,
        trajectory,
        effective_monthly_rate: monthly_rate * 100.0,
        effective_daily_rate: daily_rate * 100.0,
        total_return_percent,
        ..SimulationResult::default()
    };

    if let (Some(inflation), Some(mi)) = (inflation, monthly_inflation) {
        let real_final = final_balance / (1.0 + mi).powi(months);
        let real_interest = real_final - total_contributed;
        result.real_final_balance = Some(real_final);
        result.real_total_interest = Some(real_interest);
        result.real_return_percent = Some(percent_of(real_interest, total_contributed));
        result.real_annual_rate = Some(real_annual_rate(annual_rate, inflation));
        result.total_inflation_loss = Some(running_inflation_loss);
    }

    debug!(
        months,
        annual_rate,
        final_balance = result.final_balance,
        "compound simulation finished"
    );
    result
}

pub(crate) fn percent_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 { 0.0 } else { part / whole * 100.0 }
}
