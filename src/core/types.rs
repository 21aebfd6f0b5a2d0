use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateMode {
    FixedProduct,
    DigitalBankProduct,
    IndexPercentage,
    #[default]
    Custom,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    #[default]
    Months,
    Years,
}

/// A fixed-income product, either quoted directly or looked up in the catalog.
/// A stated rate takes precedence over the catalog id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixedProductRef {
    pub product_id: Option<String>,
    pub annual_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalBankRef {
    pub bank_id: String,
    pub product_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InflationSetting {
    pub enabled: bool,
    pub annual_rate: f64,
}

impl InflationSetting {
    /// Annual inflation in percent when enabled.
    pub fn active_rate(setting: Option<&Self>) -> Option<f64> {
        setting.filter(|s| s.enabled).map(|s| s.annual_rate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationInput {
    pub initial_value: f64,
    pub monthly_contribution: f64,
    pub rate_mode: RateMode,
    pub fixed_product: Option<FixedProductRef>,
    pub digital_bank_ref: Option<DigitalBankRef>,
    pub index_value: Option<f64>,
    pub index_percentage: Option<f64>,
    pub custom_rate: Option<f64>,
    pub period_count: i32,
    pub period_unit: PeriodUnit,
    pub inflation: Option<InflationSetting>,
}

impl SimulationInput {
    /// Plain custom-rate input, the shape most callers and tests start from.
    pub fn custom(
        initial_value: f64,
        monthly_contribution: f64,
        annual_rate: f64,
        period_count: i32,
        period_unit: PeriodUnit,
    ) -> Self {
        Self {
            initial_value,
            monthly_contribution,
            rate_mode: RateMode::Custom,
            fixed_product: None,
            digital_bank_ref: None,
            index_value: None,
            index_percentage: None,
            custom_rate: Some(annual_rate),
            period_count,
            period_unit,
            inflation: None,
        }
    }

    pub fn with_inflation(mut self, annual_rate: f64) -> Self {
        self.inflation = Some(InflationSetting {
            enabled: true,
            annual_rate,
        });
        self
    }

    pub fn period_months(&self) -> i32 {
        match self.period_unit {
            PeriodUnit::Months => self.period_count,
            PeriodUnit::Years => self.period_count.saturating_mul(12),
        }
    }

    pub fn inflation_rate(&self) -> Option<f64> {
        InflationSetting::active_rate(self.inflation.as_ref())
    }
}

/// One month of a trajectory. Withdrawal trajectories store the amount
/// withdrawn as a negative `contribution`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRecord {
    pub month_index: u32,
    pub contribution: f64,
    pub interest_accrued: f64,
    pub cumulative_balance: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_loss: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_gain_this_month: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub total_contributed: f64,
    pub total_interest: f64,
    pub final_balance: f64,
    pub daily_gain: f64,
    pub monthly_gain: f64,
    pub annual_gain: f64,
    pub trajectory: Vec<MonthlyRecord>,
    /// Effective rates are in percent.
    pub effective_monthly_rate: f64,
    pub effective_daily_rate: f64,
    pub total_return_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_final_balance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_total_interest: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_return_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_annual_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_inflation_loss: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioLabel {
    Pessimistic,
    Realistic,
    Optimistic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioVariant {
    pub label: ScenarioLabel,
    pub probability_weight: f64,
    pub rate_shift_percent: f64,
    pub inflation_shift_percent: Option<f64>,
    pub contribution_shift_percent: Option<f64>,
    pub result: SimulationResult,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloTrial {
    pub trial_index: u32,
    pub final_value: f64,
    pub return_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetirementPlan {
    pub required_corpus: f64,
    pub projected_corpus: f64,
    pub shortfall: f64,
    pub suggested_contribution: f64,
    pub adjusted_monthly_income: f64,
    pub years_accumulating: i32,
    pub years_retired: i32,
    pub accumulation_trajectory: Vec<MonthlyRecord>,
    pub withdrawal_trajectory: Vec<MonthlyRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalPlan {
    pub sustainable: bool,
    pub duration_months: u32,
    pub final_balance: f64,
    pub total_withdrawn: f64,
    pub trajectory: Vec<MonthlyRecord>,
}
