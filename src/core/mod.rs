mod engine;
mod inflation;
mod monte_carlo;
mod rates;
mod retirement;
mod scenarios;
mod solver;
mod types;

pub use engine::{
    MAX_PERIOD_MONTHS, annuity_future_value_factor, annuity_present_value_factor,
    daily_rate_from_annual, monthly_rate_from_annual, real_annual_rate, simulate, simulate_at_rate,
};
pub use inflation::{
    InflationComparison, InflationParams, InflationReport, compare_inflation, simulate_inflation,
};
pub use monte_carlo::{MonteCarloConfig, MonteCarloSummary, nearest_rank, run_monte_carlo};
pub use rates::{
    DEFAULT_REFERENCE_RATE, DigitalBank, Product, ProductCategory, RateCatalog,
    resolve_annual_rate,
};
pub use retirement::{
    MAX_WITHDRAWAL_MONTHS, RetirementInputs, WithdrawalInputs, plan_retirement, plan_withdrawals,
};
pub use scenarios::{
    OPTIMISTIC_WEIGHT, PESSIMISTIC_WEIGHT, REALISTIC_WEIGHT, SENSITIVITY_SHIFTS, ScenarioAnalysis,
    ScenarioShift, ScenarioShifts, ScenarioStatistics, SensitivityParameter, SensitivityPoint, SensitivityReport,
    risk_band, run_scenarios, sensitivity_analysis,
};
pub use solver::{
    GoalAnalysis, GoalInputs, Viability, analyze_goal, required_contribution,
    required_initial_lump_sum,
};
pub use types::{
    DigitalBankRef, FixedProductRef, InflationSetting, MonteCarloTrial, MonthlyRecord, PeriodUnit,
    RateMode, RetirementPlan, RiskBand, ScenarioLabel, ScenarioVariant, SimulationInput,
    SimulationResult, WithdrawalPlan,
};
