use serde::Serialize;

use super::engine::{annuity_future_value_factor, monthly_rate_from_annual};

pub const DIFFICULT_CONTRIBUTION: f64 = 5_000.0;
pub const DIFFICULT_LUMP_SUM: f64 = 50_000.0;
pub const DIFFICULT_MIN_MONTHS: i32 = 12;
pub const INFEASIBLE_CONTRIBUTION: f64 = 10_000.0;
pub const INFEASIBLE_LUMP_SUM: f64 = 100_000.0;
pub const INFEASIBLE_TARGET: f64 = 1_000_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Viability {
    Viable,
    Difficult,
    Infeasible,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalInputs {
    pub target_amount: f64,
    pub period_months: i32,
    /// Annual rate, percent.
    pub annual_rate: f64,
    pub initial_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalAnalysis {
    pub target_amount: f64,
    pub period_months: i32,
    pub required_monthly_contribution: f64,
    pub required_lump_sum: f64,
    pub viability: Viability,
    pub suggestions: Vec<String>,
}

/// Level monthly contribution that grows `initial` into `target`.
///
/// Returns 0 when the period or rate is not positive, or when the initial
/// amount alone already reaches the target.
pub fn required_contribution(
    target: f64,
    period_months: i32,
    annual_rate: f64,
    initial: f64,
) -> f64 {
    if period_months <= 0 || annual_rate <= 0.0 {
        return 0.0;
    }

    let r = monthly_rate_from_annual(annual_rate);
    let remaining = target - initial * (1.0 + r).powi(period_months);
    if remaining <= 0.0 {
        return 0.0;
    }
    remaining / annuity_future_value_factor(r, period_months)
}

/// Single deposit today that grows into `target`, ignoring contributions.
///
/// Returns the target itself when the period or rate is not positive.
pub fn required_initial_lump_sum(target: f64, period_months: i32, annual_rate: f64) -> f64 {
    if period_months <= 0 || annual_rate <= 0.0 {
        return target;
    }
    let r = monthly_rate_from_annual(annual_rate);
    target / (1.0 + r).powi(period_months)
}

pub fn analyze_goal(inputs: &GoalInputs) -> GoalAnalysis {
    let contribution = required_contribution(
        inputs.target_amount,
        inputs.period_months,
        inputs.annual_rate,
        inputs.initial_amount,
    );
    let lump_sum =
        required_initial_lump_sum(inputs.target_amount, inputs.period_months, inputs.annual_rate);

    let (viability, suggestions) = classify(
        contribution,
        lump_sum,
        inputs.target_amount,
        inputs.period_months,
    );

    GoalAnalysis {
        target_amount: inputs.target_amount,
        period_months: inputs.period_months,
        required_monthly_contribution: contribution,
        required_lump_sum: lump_sum,
        viability,
        suggestions,
    }
}

fn classify(contribution: f64, lump_sum: f64, target: f64, months: i32) -> (Viability, Vec<String>) {
    let mut infeasible = Vec::new();
    if contribution > INFEASIBLE_CONTRIBUTION {
        infeasible.push(
            "Monthly contribution above 10,000: extend the deadline or lower the target."
                .to_string(),
        );
    }
    if lump_sum > INFEASIBLE_LUMP_SUM {
        infeasible.push(
            "Initial deposit above 100,000: combine a smaller deposit with monthly contributions."
                .to_string(),
        );
    }
    if target > INFEASIBLE_TARGET {
        infeasible.push(
            "Target above 1,000,000: split the goal into intermediate milestones.".to_string(),
        );
    }
    if !infeasible.is_empty() {
        return (Viability::Infeasible, infeasible);
    }

    let mut difficult = Vec::new();
    if contribution > DIFFICULT_CONTRIBUTION {
        difficult.push(
            "Monthly contribution above 5,000: a longer period lowers the monthly effort."
                .to_string(),
        );
    }
    if lump_sum > DIFFICULT_LUMP_SUM {
        difficult.push(
            "Initial deposit above 50,000: consider reaching the goal through contributions."
                .to_string(),
        );
    }
    if months < DIFFICULT_MIN_MONTHS {
        difficult.push(
            "Period shorter than 12 months: little time for interest to compound.".to_string(),
        );
    }
    if !difficult.is_empty() {
        return (Viability::Difficult, difficult);
    }

    (
        Viability::Viable,
        vec!["Goal is reachable with the computed contribution.".to_string()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::simulate_at_rate;
    use crate::core::types::{PeriodUnit, SimulationInput};
    use proptest::prelude::{prop_assert, proptest};

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn contribution_matches_closed_form() {
        let r = 1.12_f64.powf(1.0 / 12.0) - 1.0;
        let growth = (1.0 + r).powi(60);
        let expected = (100_000.0 - 5_000.0 * growth) / ((growth - 1.0) / r);
        assert_close(
            required_contribution(100_000.0, 60, 12.0, 5_000.0),
            expected,
            1e-9,
        );
    }

    #[test]
    fn initial_amount_covering_target_needs_nothing() {
        assert_eq!(required_contribution(10_000.0, 120, 10.0, 10_000.0), 0.0);
    }

    #[test]
    fn degenerate_inputs_return_sentinels() {
        assert_eq!(required_contribution(50_000.0, 0, 10.0, 0.0), 0.0);
        assert_eq!(required_contribution(50_000.0, -3, 10.0, 0.0), 0.0);
        assert_eq!(required_contribution(50_000.0, 24, 0.0, 0.0), 0.0);
        assert_eq!(required_initial_lump_sum(50_000.0, 0, 10.0), 50_000.0);
        assert_eq!(required_initial_lump_sum(50_000.0, 24, -1.0), 50_000.0);
    }

    #[test]
    fn lump_sum_is_present_value() {
        assert_close(required_initial_lump_sum(11_000.0, 12, 10.0), 10_000.0, 1e-6);
    }

    #[test]
    fn modest_goal_is_viable() {
        let analysis = analyze_goal(&GoalInputs {
            target_amount: 20_000.0,
            period_months: 36,
            annual_rate: 10.0,
            initial_amount: 0.0,
        });
        assert_eq!(analysis.viability, Viability::Viable);
        assert_eq!(analysis.suggestions.len(), 1);
    }

    #[test]
    fn short_period_is_difficult() {
        let analysis = analyze_goal(&GoalInputs {
            target_amount: 5_000.0,
            period_months: 6,
            annual_rate: 10.0,
            initial_amount: 0.0,
        });
        assert_eq!(analysis.viability, Viability::Difficult);
        assert!(analysis.suggestions.iter().any(|s| s.contains("12 months")));
    }

    #[test]
    fn large_monthly_effort_is_difficult() {
        let analysis = analyze_goal(&GoalInputs {
            target_amount: 90_000.0,
            period_months: 12,
            annual_rate: 10.0,
            initial_amount: 0.0,
        });
        assert!(analysis.required_monthly_contribution > DIFFICULT_CONTRIBUTION);
        assert!(analysis.required_monthly_contribution < INFEASIBLE_CONTRIBUTION);
        assert_eq!(analysis.viability, Viability::Difficult);
    }

    #[test]
    fn huge_target_is_infeasible() {
        let analysis = analyze_goal(&GoalInputs {
            target_amount: 2_000_000.0,
            period_months: 600,
            annual_rate: 10.0,
            initial_amount: 0.0,
        });
        assert_eq!(analysis.viability, Viability::Infeasible);
        assert!(analysis.suggestions.iter().any(|s| s.contains("milestones")));
    }

    proptest! {
        #[test]
        fn prop_required_contribution_reproduces_target(
            target in 1_000.0f64..1_000_000.0,
            months in 1i32..480,
            rate in 0.5f64..25.0,
        ) {
            let pmt = required_contribution(target, months, rate, 0.0);
            let input = SimulationInput::custom(0.0, pmt, rate, months, PeriodUnit::Months);
            let result = simulate_at_rate(&input, rate);
            prop_assert!((result.final_balance - target).abs() <= target * 1e-9);
        }
    }
}
