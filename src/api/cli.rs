use clap::{Args, ValueEnum};

use crate::core::{
    DigitalBankRef, FixedProductRef, InflationSetting, MAX_PERIOD_MONTHS, MonteCarloConfig,
    PeriodUnit, RateMode, SimulationInput,
};
use crate::error::RequestError;

pub const MAX_TRIALS: u32 = 50_000;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliRateMode {
    FixedProduct,
    DigitalBankProduct,
    IndexPercentage,
    Custom,
}

impl From<CliRateMode> for RateMode {
    fn from(value: CliRateMode) -> Self {
        match value {
            CliRateMode::FixedProduct => RateMode::FixedProduct,
            CliRateMode::DigitalBankProduct => RateMode::DigitalBankProduct,
            CliRateMode::IndexPercentage => RateMode::IndexPercentage,
            CliRateMode::Custom => RateMode::Custom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliPeriodUnit {
    Months,
    Years,
}

impl From<CliPeriodUnit> for PeriodUnit {
    fn from(value: CliPeriodUnit) -> Self {
        match value {
            CliPeriodUnit::Months => PeriodUnit::Months,
            CliPeriodUnit::Years => PeriodUnit::Years,
        }
    }
}

/// Flags describing one simulation. The same struct holds API defaults.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = 1_000.0)]
    pub initial_value: f64,
    #[arg(long, default_value_t = 100.0)]
    pub monthly_contribution: f64,
    #[arg(long, value_enum, default_value_t = CliRateMode::Custom)]
    pub rate_mode: CliRateMode,
    #[arg(long, help = "Catalog product id for fixed-product mode")]
    pub product_id: Option<String>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Stated annual rate in percent for fixed-product mode; wins over --product-id"
    )]
    pub product_rate: Option<f64>,
    #[arg(long)]
    pub bank_id: Option<String>,
    #[arg(long)]
    pub bank_product_id: Option<String>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Reference index in percent a year; defaults to the catalog rate"
    )]
    pub index_value: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Share of the index in percent; defaults to 100"
    )]
    pub index_percentage: Option<f64>,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual rate in percent for custom mode"
    )]
    pub custom_rate: Option<f64>,
    #[arg(long, default_value_t = 12)]
    pub period_count: i32,
    #[arg(long, value_enum, default_value_t = CliPeriodUnit::Months)]
    pub period_unit: CliPeriodUnit,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual inflation in percent; enables real figures when set"
    )]
    pub inflation_rate: Option<f64>,
}

impl SimulateArgs {
    pub fn default_for_api() -> Self {
        Self {
            initial_value: 1_000.0,
            monthly_contribution: 100.0,
            rate_mode: CliRateMode::Custom,
            product_id: None,
            product_rate: None,
            bank_id: None,
            bank_product_id: None,
            index_value: None,
            index_percentage: None,
            custom_rate: None,
            period_count: 12,
            period_unit: CliPeriodUnit::Months,
            inflation_rate: None,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct MonteCarloArgs {
    #[arg(long, default_value_t = 1_000)]
    pub trials: u32,
    #[arg(
        long,
        default_value_t = 0.15,
        help = "Fraction of the base rate a full market shock moves it by, 0..=1"
    )]
    pub volatility: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub trend: f64,
    #[arg(
        long,
        default_value_t = 0.3,
        help = "Weight of the market shock in the inflation shock, 0..=1"
    )]
    pub correlation: f64,
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl MonteCarloArgs {
    pub fn default_for_api() -> Self {
        let config = MonteCarloConfig::default();
        Self {
            trials: config.trials,
            volatility: config.volatility,
            trend: config.trend,
            correlation: config.correlation,
            seed: config.seed,
        }
    }
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<f64, RequestError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RequestError::field(field, "must be a finite number"))
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<f64, RequestError> {
    if require_finite(field, value)? < 0.0 {
        return Err(RequestError::field(field, "must be >= 0"));
    }
    Ok(value)
}

/// Annual rates in percent must stay above -100, where compounding is undefined.
pub(crate) fn require_rate(field: &'static str, value: f64) -> Result<f64, RequestError> {
    if require_finite(field, value)? <= -100.0 {
        return Err(RequestError::field(field, "must be greater than -100"));
    }
    Ok(value)
}

pub(crate) fn require_period(field: &'static str, months: i32) -> Result<i32, RequestError> {
    if months > MAX_PERIOD_MONTHS {
        return Err(RequestError::field(
            field,
            format!("must cover at most {MAX_PERIOD_MONTHS} months"),
        ));
    }
    Ok(months)
}

fn optional_finite(field: &'static str, value: Option<f64>) -> Result<Option<f64>, RequestError> {
    value.map(|v| require_finite(field, v)).transpose()
}

pub fn build_simulation_input(args: &SimulateArgs) -> Result<SimulationInput, RequestError> {
    let initial_value = require_non_negative("initialValue", args.initial_value)?;
    let monthly_contribution =
        require_non_negative("monthlyContribution", args.monthly_contribution)?;
    let product_rate = optional_finite("fixedProduct.annualRate", args.product_rate)?;
    let index_value = optional_finite("indexValue", args.index_value)?;
    let index_percentage = optional_finite("indexPercentage", args.index_percentage)?;
    let custom_rate = optional_finite("customRate", args.custom_rate)?;
    let inflation_rate = args
        .inflation_rate
        .map(|v| require_rate("inflation.annualRate", v))
        .transpose()?;

    let fixed_product = (args.product_id.is_some() || product_rate.is_some()).then(|| {
        FixedProductRef {
            product_id: args.product_id.clone(),
            annual_rate: product_rate,
        }
    });
    let digital_bank_ref = match (&args.bank_id, &args.bank_product_id) {
        (Some(bank_id), Some(product_id)) => Some(DigitalBankRef {
            bank_id: bank_id.clone(),
            product_id: product_id.clone(),
        }),
        _ => None,
    };

    let input = SimulationInput {
        initial_value,
        monthly_contribution,
        rate_mode: args.rate_mode.into(),
        fixed_product,
        digital_bank_ref,
        index_value,
        index_percentage,
        custom_rate,
        period_count: args.period_count,
        period_unit: args.period_unit.into(),
        inflation: inflation_rate.map(|annual_rate| InflationSetting {
            enabled: true,
            annual_rate,
        }),
    };
    require_period("periodCount", input.period_months())?;
    Ok(input)
}

pub fn build_monte_carlo_config(args: &MonteCarloArgs) -> Result<MonteCarloConfig, RequestError> {
    if !(1..=MAX_TRIALS).contains(&args.trials) {
        return Err(RequestError::field(
            "trials",
            format!("must be between 1 and {MAX_TRIALS}"),
        ));
    }
    if !(0.0..=1.0).contains(&args.volatility) {
        return Err(RequestError::field("volatility", "must be between 0 and 1"));
    }
    if !(0.0..=1.0).contains(&args.correlation) {
        return Err(RequestError::field(
            "correlation",
            "must be between 0 and 1",
        ));
    }
    let trend = require_finite("trend", args.trend)?;

    Ok(MonteCarloConfig {
        trials: args.trials,
        volatility: args.volatility,
        trend,
        correlation: args.correlation,
        seed: args.seed,
    })
}
