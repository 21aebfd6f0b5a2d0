use tracing::debug;

use super::engine::{
    annuity_future_value_factor, annuity_present_value_factor, bounded_months,
    monthly_rate_from_annual,
};
use super::types::{MonthlyRecord, RetirementPlan, WithdrawalPlan};

pub const MAX_WITHDRAWAL_MONTHS: i32 = 360;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetirementInputs {
    pub current_age: i32,
    pub retirement_age: i32,
    pub life_expectancy: i32,
    /// Desired monthly income at retirement, in today's money.
    pub desired_monthly_income: f64,
    pub current_assets: f64,
    pub monthly_contribution: f64,
    pub annual_rate: f64,
    pub inflation_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WithdrawalInputs {
    pub initial_corpus: f64,
    pub monthly_withdrawal: f64,
    pub annual_rate: f64,
    pub inflation_rate: f64,
    pub horizon_years: i32,
    pub index_to_inflation: bool,
}

/// The required corpus discounts the retirement income at the real monthly
/// rate `monthly_rate - monthly_inflation`. A zero real rate falls back to the
/// annuity limit `income * months`; negative real rates go through the same
/// closed form, which stays finite and positive above -100%.
pub fn plan_retirement(inputs: &RetirementInputs) -> RetirementPlan {
    let years_accumulating = inputs.retirement_age - inputs.current_age;
    let years_retired = inputs.life_expectancy - inputs.retirement_age;
    let contribution_months = bounded_months(years_accumulating.max(0).saturating_mul(12));
    let retirement_months = years_retired.max(0).saturating_mul(12);

    let monthly_rate = monthly_rate_from_annual(inputs.annual_rate);
    let monthly_inflation = monthly_rate_from_annual(inputs.inflation_rate);

    let adjusted_income = inputs.desired_monthly_income
        * (1.0 + inputs.inflation_rate / 100.0).powi(years_accumulating.max(0));

    let real_monthly_rate = monthly_rate - monthly_inflation;
    let required_corpus =
        adjusted_income * annuity_present_value_factor(real_monthly_rate, retirement_months);

    let growth = (1.0 + monthly_rate).powi(contribution_months);
    let contribution_factor = annuity_future_value_factor(monthly_rate, contribution_months);
    let projected_corpus =
        inputs.current_assets * growth + inputs.monthly_contribution * contribution_factor;

    let shortfall = (required_corpus - projected_corpus).max(0.0);
    let suggested_contribution = if shortfall > 0.0 && contribution_factor > 0.0 {
        shortfall / contribution_factor
    } else {
        0.0
    };

    let accumulation_trajectory = accumulation_path(
        inputs.current_assets,
        inputs.monthly_contribution,
        monthly_rate,
        contribution_months,
    );
    let withdrawal_trajectory = withdrawal_path(
        projected_corpus,
        adjusted_income,
        monthly_rate,
        monthly_inflation,
        retirement_months.min(MAX_WITHDRAWAL_MONTHS),
    );

    debug!(
        required_corpus,
        projected_corpus, shortfall, "retirement plan computed"
    );

    RetirementPlan {
        required_corpus,
        projected_corpus,
        shortfall,
        suggested_contribution,
        adjusted_monthly_income: adjusted_income,
        years_accumulating,
        years_retired,
        accumulation_trajectory,
        withdrawal_trajectory,
    }
}

fn accumulation_path(
    assets: f64,
    contribution: f64,
    monthly_rate: f64,
    months: i32,
) -> Vec<MonthlyRecord> {
    let mut balance = assets;
    (1..=months)
        .map(|month| {
            let interest = balance * monthly_rate;
            balance += interest + contribution;
            MonthlyRecord {
                month_index: month as u32,
                contribution,
                interest_accrued: interest,
                cumulative_balance: balance,
                ..MonthlyRecord::default()
            }
        })
        .collect()
}

fn withdrawal_path(
    corpus: f64,
    first_withdrawal: f64,
    monthly_rate: f64,
    monthly_inflation: f64,
    months: i32,
) -> Vec<MonthlyRecord> {
    let mut trajectory = Vec::with_capacity(months.max(0) as usize);
    let mut balance = corpus;
    for month in 1..=months {
        if balance <= 0.0 {
            break;
        }
        let interest = balance * monthly_rate;
        let wanted = first_withdrawal * (1.0 + monthly_inflation).powi(month - 1);
        let paid = wanted.min(balance + interest).max(0.0);
        balance = (balance + interest - paid).max(0.0);
        trajectory.push(MonthlyRecord {
            month_index: month as u32,
            contribution: -paid,
            interest_accrued: interest,
            cumulative_balance: balance,
            ..MonthlyRecord::default()
        });
    }
    trajectory
}

/// Stops at the first month the balance runs out.
pub fn plan_withdrawals(inputs: &WithdrawalInputs) -> WithdrawalPlan {
    let months = bounded_months(inputs.horizon_years.max(0).saturating_mul(12));
    let monthly_rate = monthly_rate_from_annual(inputs.annual_rate);
    let monthly_inflation = monthly_rate_from_annual(inputs.inflation_rate);

    let mut balance = inputs.initial_corpus;
    let mut total_withdrawn = 0.0;
    let mut duration_months = 0;
    let mut trajectory = Vec::with_capacity(months as usize);

    for month in 1..=months {
        let interest = balance * monthly_rate;
        let withdrawal = if inputs.index_to_inflation {
            inputs.monthly_withdrawal * (1.0 + monthly_inflation).powi(month - 1)
        } else {
            inputs.monthly_withdrawal
        };
        let paid = withdrawal.min(balance + interest).max(0.0);
        balance = balance + interest - withdrawal;
        total_withdrawn += paid;

        trajectory.push(MonthlyRecord {
            month_index: month as u32,
            contribution: -paid,
            interest_accrued: interest,
            cumulative_balance: balance.max(0.0),
            ..MonthlyRecord::default()
        });

        // A NaN balance counts as depleted.
        if !(balance > 0.0) {
            break;
        }
        duration_months = month as u32;
    }

    WithdrawalPlan {
        sustainable: balance > 0.0,
        duration_months,
        final_balance: balance.max(0.0),
        total_withdrawn,
        trajectory,
    }
}
