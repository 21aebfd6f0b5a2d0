pub mod cli;

use axum::{
    Router,
    body::Bytes,
    extract::{Json, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    DEFAULT_REFERENCE_RATE, DigitalBankRef, FixedProductRef, GoalInputs, InflationParams,
    InflationSetting, MonteCarloConfig, RateCatalog, RetirementInputs, ScenarioShift,
    ScenarioShifts, SimulationInput, WithdrawalInputs, analyze_goal, compare_inflation,
    plan_retirement, plan_withdrawals, run_monte_carlo, run_scenarios, sensitivity_analysis,
    simulate, simulate_inflation,
};
use crate::error::RequestError;
use cli::{
    CliPeriodUnit, CliRateMode, MonteCarloArgs, SimulateArgs, build_monte_carlo_config,
    build_simulation_input, require_finite, require_non_negative, require_period, require_rate,
};

type SharedCatalog = Arc<RateCatalog>;

const MAX_AGE: i32 = 150;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRateMode {
    #[serde(alias = "fixedProduct", alias = "fixed_product", alias = "fixed")]
    FixedProduct,
    #[serde(
        alias = "digitalBankProduct",
        alias = "digital_bank_product",
        alias = "digital-bank"
    )]
    DigitalBankProduct,
    #[serde(alias = "indexPercentage", alias = "index_percentage", alias = "index")]
    IndexPercentage,
    Custom,
}

impl From<ApiRateMode> for CliRateMode {
    fn from(value: ApiRateMode) -> Self {
        match value {
            ApiRateMode::FixedProduct => CliRateMode::FixedProduct,
            ApiRateMode::DigitalBankProduct => CliRateMode::DigitalBankProduct,
            ApiRateMode::IndexPercentage => CliRateMode::IndexPercentage,
            ApiRateMode::Custom => CliRateMode::Custom,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiPeriodUnit {
    #[serde(alias = "month", alias = "meses")]
    Months,
    #[serde(alias = "year", alias = "anos")]
    Years,
}

impl From<ApiPeriodUnit> for CliPeriodUnit {
    fn from(value: ApiPeriodUnit) -> Self {
        match value {
            ApiPeriodUnit::Months => CliPeriodUnit::Months,
            ApiPeriodUnit::Years => CliPeriodUnit::Years,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    initial_value: Option<f64>,
    monthly_contribution: Option<f64>,
    rate_mode: Option<ApiRateMode>,
    fixed_product: Option<FixedProductRef>,
    #[serde(alias = "digitalBank")]
    digital_bank_ref: Option<DigitalBankRef>,
    index_value: Option<f64>,
    index_percentage: Option<f64>,
    custom_rate: Option<f64>,
    period_count: Option<i32>,
    period_unit: Option<ApiPeriodUnit>,
    inflation: Option<InflationSetting>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenariosPayload {
    #[serde(flatten)]
    simulation: SimulatePayload,
    shifts: Option<ScenarioShifts>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MonteCarloPayload {
    #[serde(flatten)]
    simulation: SimulatePayload,
    #[serde(alias = "simulations")]
    trials: Option<u32>,
    volatility: Option<f64>,
    trend: Option<f64>,
    correlation: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InflationPayload {
    initial_value: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_rate: Option<f64>,
    inflation_rate: Option<f64>,
    period_months: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RetirementPayload {
    current_age: Option<i32>,
    retirement_age: Option<i32>,
    life_expectancy: Option<i32>,
    desired_monthly_income: Option<f64>,
    current_assets: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_rate: Option<f64>,
    inflation_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WithdrawalPayload {
    #[serde(alias = "patrimonioInicial")]
    initial_corpus: Option<f64>,
    #[serde(alias = "valorRetiradaMensal")]
    monthly_withdrawal: Option<f64>,
    #[serde(alias = "taxaJuros")]
    annual_rate: Option<f64>,
    #[serde(alias = "inflacao")]
    inflation_rate: Option<f64>,
    #[serde(alias = "periodoRetiradas")]
    horizon_years: Option<i32>,
    #[serde(alias = "ajustarInflacao")]
    index_to_inflation: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GoalPayload {
    target_amount: Option<f64>,
    period_months: Option<i32>,
    annual_rate: Option<f64>,
    initial_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn router(catalog: SharedCatalog) -> Router {
    Router::new()
        .route("/api/products", get(products_handler))
        .route("/api/simulate", post(simulate_handler))
        .route("/api/inflation", post(inflation_handler))
        .route("/api/inflation/compare", post(inflation_compare_handler))
        .route("/api/retirement", post(retirement_handler))
        .route("/api/withdrawal", post(withdrawal_handler))
        .route("/api/goal", post(goal_handler))
        .route("/api/scenarios", post(scenarios_handler))
        .route("/api/sensitivity", post(sensitivity_handler))
        .route("/api/monte-carlo", post(monte_carlo_handler))
        .fallback(not_found_handler)
        .with_state(catalog)
}

pub async fn run_http_server(port: u16, catalog: RateCatalog) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(
        products = catalog.products.len(),
        digital_banks = catalog.digital_banks.len(),
        "rate catalog ready"
    );
    let app = router(Arc::new(catalog));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "finsim HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/products");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn products_handler(State(catalog): State<SharedCatalog>) -> Response {
    json_response(StatusCode::OK, catalog.as_ref())
}

async fn simulate_handler(State(catalog): State<SharedCatalog>, body: Bytes) -> Response {
    respond(
        parse_payload::<SimulatePayload>(&body)
            .and_then(simulation_input_from_payload)
            .map(|input| simulate(&input, &catalog)),
    )
}

async fn inflation_handler(body: Bytes) -> Response {
    respond(
        parse_payload::<InflationPayload>(&body)
            .and_then(inflation_params_from_payload)
            .map(|params| simulate_inflation(&params)),
    )
}

async fn inflation_compare_handler(body: Bytes) -> Response {
    respond(
        parse_payload::<InflationPayload>(&body)
            .and_then(inflation_params_from_payload)
            .map(|params| compare_inflation(&params)),
    )
}

async fn retirement_handler(body: Bytes) -> Response {
    respond(
        parse_payload::<RetirementPayload>(&body)
            .and_then(retirement_inputs_from_payload)
            .map(|inputs| plan_retirement(&inputs)),
    )
}

async fn withdrawal_handler(body: Bytes) -> Response {
    respond(
        parse_payload::<WithdrawalPayload>(&body)
            .and_then(withdrawal_inputs_from_payload)
            .map(|inputs| plan_withdrawals(&inputs)),
    )
}

async fn goal_handler(body: Bytes) -> Response {
    respond(
        parse_payload::<GoalPayload>(&body)
            .and_then(goal_inputs_from_payload)
            .map(|inputs| analyze_goal(&inputs)),
    )
}

async fn scenarios_handler(State(catalog): State<SharedCatalog>, body: Bytes) -> Response {
    respond(parse_payload::<ScenariosPayload>(&body).and_then(|payload| {
        let shifts = scenario_shifts_from_payload(payload.shifts)?;
        let input = simulation_input_from_payload(payload.simulation)?;
        Ok(run_scenarios(&input, &catalog, &shifts))
    }))
}

async fn sensitivity_handler(State(catalog): State<SharedCatalog>, body: Bytes) -> Response {
    respond(
        parse_payload::<SimulatePayload>(&body)
            .and_then(simulation_input_from_payload)
            .map(|input| sensitivity_analysis(&input, &catalog)),
    )
}

async fn monte_carlo_handler(State(catalog): State<SharedCatalog>, body: Bytes) -> Response {
    respond(parse_payload::<MonteCarloPayload>(&body).and_then(|payload| {
        let config = monte_carlo_config_from_payload(&payload)?;
        let input = simulation_input_from_payload(payload.simulation)?;
        Ok(run_monte_carlo(&input, &catalog, &config))
    }))
}

fn respond<T: Serialize>(result: Result<T, RequestError>) -> Response {
    match result {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => {
            warn!(error = %err, "rejected request");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

/// An empty body means "all defaults".
fn parse_payload<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, RequestError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| RequestError::InvalidJson(e.to_string()))
}

fn simulate_args_from_payload(payload: SimulatePayload) -> SimulateArgs {
    let mut args = SimulateArgs::default_for_api();

    if let Some(v) = payload.initial_value {
        args.initial_value = v;
    }
    if let Some(v) = payload.monthly_contribution {
        args.monthly_contribution = v;
    }
    if let Some(v) = payload.rate_mode {
        args.rate_mode = v.into();
    }
    if let Some(fixed) = payload.fixed_product {
        args.product_id = fixed.product_id;
        args.product_rate = fixed.annual_rate;
    }
    if let Some(bank) = payload.digital_bank_ref {
        args.bank_id = Some(bank.bank_id);
        args.bank_product_id = Some(bank.product_id);
    }
    if let Some(v) = payload.index_value {
        args.index_value = Some(v);
    }
    if let Some(v) = payload.index_percentage {
        args.index_percentage = Some(v);
    }
    if let Some(v) = payload.custom_rate {
        args.custom_rate = Some(v);
    }
    if let Some(v) = payload.period_count {
        args.period_count = v;
    }
    if let Some(v) = payload.period_unit {
        args.period_unit = v.into();
    }
    if let Some(setting) = payload.inflation {
        args.inflation_rate = setting.enabled.then_some(setting.annual_rate);
    }

    args
}

fn simulation_input_from_payload(
    payload: SimulatePayload,
) -> Result<SimulationInput, RequestError> {
    build_simulation_input(&simulate_args_from_payload(payload))
}

fn monte_carlo_config_from_payload(
    payload: &MonteCarloPayload,
) -> Result<MonteCarloConfig, RequestError> {
    let mut args = MonteCarloArgs::default_for_api();
    if let Some(v) = payload.trials {
        args.trials = v;
    }
    if let Some(v) = payload.volatility {
        args.volatility = v;
    }
    if let Some(v) = payload.trend {
        args.trend = v;
    }
    if let Some(v) = payload.correlation {
        args.correlation = v;
    }
    if let Some(v) = payload.seed {
        args.seed = v;
    }
    build_monte_carlo_config(&args)
}

fn scenario_shifts_from_payload(
    shifts: Option<ScenarioShifts>,
) -> Result<ScenarioShifts, RequestError> {
    let shifts = shifts.unwrap_or_default();
    for shift in [&shifts.pessimistic, &shifts.realistic, &shifts.optimistic] {
        check_shift(shift)?;
    }
    Ok(shifts)
}

fn check_shift(shift: &ScenarioShift) -> Result<(), RequestError> {
    require_finite("rateShiftPercent", shift.rate_shift_percent)?;
    if let Some(v) = shift.inflation_shift_percent {
        require_finite("inflationShiftPercent", v)?;
    }
    if let Some(v) = shift.contribution_shift_percent {
        require_finite("contributionShiftPercent", v)?;
    }
    Ok(())
}

fn default_inflation_params() -> InflationParams {
    InflationParams {
        initial_value: 10_000.0,
        monthly_contribution: 500.0,
        annual_rate: DEFAULT_REFERENCE_RATE,
        inflation_rate: 4.5,
        period_months: 120,
    }
}

fn inflation_params_from_payload(
    payload: InflationPayload,
) -> Result<InflationParams, RequestError> {
    let mut params = default_inflation_params();
    if let Some(v) = payload.initial_value {
        params.initial_value = v;
    }
    if let Some(v) = payload.monthly_contribution {
        params.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_rate {
        params.annual_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        params.inflation_rate = v;
    }
    if let Some(v) = payload.period_months {
        params.period_months = v;
    }

    require_non_negative("initialValue", params.initial_value)?;
    require_non_negative("monthlyContribution", params.monthly_contribution)?;
    require_rate("annualRate", params.annual_rate)?;
    require_rate("inflationRate", params.inflation_rate)?;
    require_period("periodMonths", params.period_months)?;
    Ok(params)
}

fn default_retirement_inputs() -> RetirementInputs {
    RetirementInputs {
        current_age: 30,
        retirement_age: 65,
        life_expectancy: 85,
        desired_monthly_income: 5_000.0,
        current_assets: 50_000.0,
        monthly_contribution: 1_000.0,
        annual_rate: DEFAULT_REFERENCE_RATE,
        inflation_rate: 4.5,
    }
}

fn retirement_inputs_from_payload(
    payload: RetirementPayload,
) -> Result<RetirementInputs, RequestError> {
    let mut inputs = default_retirement_inputs();
    if let Some(v) = payload.current_age {
        inputs.current_age = v;
    }
    if let Some(v) = payload.retirement_age {
        inputs.retirement_age = v;
    }
    if let Some(v) = payload.life_expectancy {
        inputs.life_expectancy = v;
    }
    if let Some(v) = payload.desired_monthly_income {
        inputs.desired_monthly_income = v;
    }
    if let Some(v) = payload.current_assets {
        inputs.current_assets = v;
    }
    if let Some(v) = payload.monthly_contribution {
        inputs.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_rate {
        inputs.annual_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        inputs.inflation_rate = v;
    }

    for (field, age) in [
        ("currentAge", inputs.current_age),
        ("retirementAge", inputs.retirement_age),
        ("lifeExpectancy", inputs.life_expectancy),
    ] {
        if !(0..=MAX_AGE).contains(&age) {
            return Err(RequestError::field(
                field,
                format!("must be between 0 and {MAX_AGE}"),
            ));
        }
    }
    if inputs.retirement_age < inputs.current_age {
        return Err(RequestError::field("retirementAge", "must be >= currentAge"));
    }
    require_period(
        "retirementAge",
        (inputs.retirement_age - inputs.current_age) * 12,
    )?;
    if inputs.life_expectancy < inputs.retirement_age {
        return Err(RequestError::field(
            "lifeExpectancy",
            "must be >= retirementAge",
        ));
    }
    require_non_negative("desiredMonthlyIncome", inputs.desired_monthly_income)?;
    require_non_negative("currentAssets", inputs.current_assets)?;
    require_non_negative("monthlyContribution", inputs.monthly_contribution)?;
    require_rate("annualRate", inputs.annual_rate)?;
    require_rate("inflationRate", inputs.inflation_rate)?;
    Ok(inputs)
}

fn default_withdrawal_inputs() -> WithdrawalInputs {
    WithdrawalInputs {
        initial_corpus: 1_000_000.0,
        monthly_withdrawal: 8_000.0,
        annual_rate: 8.0,
        inflation_rate: 4.0,
        horizon_years: 30,
        index_to_inflation: true,
    }
}

fn withdrawal_inputs_from_payload(
    payload: WithdrawalPayload,
) -> Result<WithdrawalInputs, RequestError> {
    let mut inputs = default_withdrawal_inputs();
    if let Some(v) = payload.initial_corpus {
        inputs.initial_corpus = v;
    }
    if let Some(v) = payload.monthly_withdrawal {
        inputs.monthly_withdrawal = v;
    }
    if let Some(v) = payload.annual_rate {
        inputs.annual_rate = v;
    }
    if let Some(v) = payload.inflation_rate {
        inputs.inflation_rate = v;
    }
    if let Some(v) = payload.horizon_years {
        inputs.horizon_years = v;
    }
    if let Some(v) = payload.index_to_inflation {
        inputs.index_to_inflation = v;
    }

    require_non_negative("initialCorpus", inputs.initial_corpus)?;
    require_non_negative("monthlyWithdrawal", inputs.monthly_withdrawal)?;
    require_rate("annualRate", inputs.annual_rate)?;
    require_rate("inflationRate", inputs.inflation_rate)?;
    if inputs.horizon_years < 0 {
        return Err(RequestError::field("horizonYears", "must be >= 0"));
    }
    require_period("horizonYears", inputs.horizon_years.saturating_mul(12))?;
    Ok(inputs)
}

fn default_goal_inputs() -> GoalInputs {
    GoalInputs {
        target_amount: 100_000.0,
        period_months: 60,
        annual_rate: DEFAULT_REFERENCE_RATE,
        initial_amount: 0.0,
    }
}

fn goal_inputs_from_payload(payload: GoalPayload) -> Result<GoalInputs, RequestError> {
    let mut inputs = default_goal_inputs();
    if let Some(v) = payload.target_amount {
        inputs.target_amount = v;
    }
    if let Some(v) = payload.period_months {
        inputs.period_months = v;
    }
    if let Some(v) = payload.annual_rate {
        inputs.annual_rate = v;
    }
    if let Some(v) = payload.initial_amount {
        inputs.initial_amount = v;
    }

    require_non_negative("targetAmount", inputs.target_amount)?;
    require_non_negative("initialAmount", inputs.initial_amount)?;
    require_rate("annualRate", inputs.annual_rate)?;
    require_period("periodMonths", inputs.period_months)?;
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PeriodUnit, RateMode, simulate_at_rate};
    use serde_json::Value;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn shared_catalog() -> SharedCatalog {
        Arc::new(RateCatalog::default())
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("JSON body")
    }

    fn simulation_input_from_json(json: &str) -> Result<SimulationInput, RequestError> {
        parse_payload::<SimulatePayload>(json.as_bytes()).and_then(simulation_input_from_payload)
    }

    #[test]
    fn empty_body_uses_api_defaults() {
        let input = simulation_input_from_json("  ").expect("defaults are valid");
        let expected =
            build_simulation_input(&SimulateArgs::default_for_api()).expect("defaults are valid");
        assert_eq!(input, expected);
    }

    #[test]
    fn payload_fields_override_defaults() {
        let input = simulation_input_from_json(
            r#"{
                "initialValue": 10000,
                "monthlyContribution": 0,
                "rateMode": "fixedProduct",
                "fixedProduct": { "productId": "lci" },
                "periodCount": 3,
                "periodUnit": "years",
                "inflation": { "enabled": true, "annualRate": 4.5 }
            }"#,
        )
        .expect("valid payload");

        assert_eq!(input.initial_value, 10_000.0);
        assert_eq!(input.monthly_contribution, 0.0);
        assert_eq!(input.rate_mode, RateMode::FixedProduct);
        assert_eq!(
            input.fixed_product,
            Some(FixedProductRef {
                product_id: Some("lci".to_string()),
                annual_rate: None,
            })
        );
        assert_eq!(input.period_months(), 36);
        assert_eq!(input.inflation_rate(), Some(4.5));
    }

    #[test]
    fn disabled_inflation_is_dropped() {
        let input =
            simulation_input_from_json(r#"{ "inflation": { "enabled": false, "annualRate": 9 } }"#)
                .expect("valid payload");
        assert_eq!(input.inflation, None);
    }

    #[test]
    fn rate_mode_aliases_are_accepted() {
        for (raw, mode) in [
            ("digital-bank-product", RateMode::DigitalBankProduct),
            ("digitalBankProduct", RateMode::DigitalBankProduct),
            ("index", RateMode::IndexPercentage),
            ("index_percentage", RateMode::IndexPercentage),
            ("custom", RateMode::Custom),
        ] {
            let json = format!(r#"{{ "rateMode": "{raw}" }}"#);
            let input = simulation_input_from_json(&json).expect("valid payload");
            assert_eq!(input.rate_mode, mode, "rate mode {raw}");
        }
    }

    #[test]
    fn malformed_json_is_an_invalid_json_error() {
        let err = simulation_input_from_json("{ not json").expect_err("must reject");
        assert!(matches!(err, RequestError::InvalidJson(_)));

        let err = simulation_input_from_json(r#"{ "rateMode": "lottery" }"#)
            .expect_err("must reject unknown rate mode");
        assert!(matches!(err, RequestError::InvalidJson(_)));
    }

    #[test]
    fn negative_contribution_is_rejected() {
        let err = simulation_input_from_json(r#"{ "monthlyContribution": -10 }"#)
            .expect_err("must reject");
        assert_eq!(
            err,
            RequestError::field("monthlyContribution", "must be >= 0")
        );
    }

    #[test]
    fn withdrawal_payload_accepts_portuguese_field_names() {
        let payload = parse_payload::<WithdrawalPayload>(
            br#"{
                "patrimonioInicial": 500000,
                "valorRetiradaMensal": 3000,
                "taxaJuros": 9,
                "inflacao": 3.5,
                "periodoRetiradas": 20,
                "ajustarInflacao": false
            }"#,
        )
        .expect("valid payload");
        let inputs = withdrawal_inputs_from_payload(payload).expect("valid inputs");

        assert_eq!(
            inputs,
            WithdrawalInputs {
                initial_corpus: 500_000.0,
                monthly_withdrawal: 3_000.0,
                annual_rate: 9.0,
                inflation_rate: 3.5,
                horizon_years: 20,
                index_to_inflation: false,
            }
        );
    }

    #[test]
    fn rates_at_or_below_minus_one_hundred_are_rejected() {
        let payload = parse_payload::<RetirementPayload>(br#"{ "annualRate": -150 }"#)
            .expect("valid payload");
        let err = retirement_inputs_from_payload(payload).expect_err("must reject");
        assert_eq!(
            err,
            RequestError::field("annualRate", "must be greater than -100")
        );

        let payload = parse_payload::<WithdrawalPayload>(br#"{ "taxaJuros": -150 }"#)
            .expect("valid payload");
        assert!(withdrawal_inputs_from_payload(payload).is_err());

        let payload = parse_payload::<InflationPayload>(br#"{ "inflationRate": -100 }"#)
            .expect("valid payload");
        let err = inflation_params_from_payload(payload).expect_err("must reject");
        assert!(err.to_string().starts_with("inflationRate"));

        let payload = parse_payload::<GoalPayload>(br#"{ "annualRate": -100 }"#)
            .expect("valid payload");
        assert!(goal_inputs_from_payload(payload).is_err());

        let payload = parse_payload::<InflationPayload>(br#"{ "inflationRate": -3 }"#)
            .expect("valid payload");
        assert!(inflation_params_from_payload(payload).is_ok());
    }

    #[test]
    fn retirement_rejects_ages_out_of_range() {
        let payload = parse_payload::<RetirementPayload>(
            br#"{ "currentAge": 30, "retirementAge": 2000000000, "lifeExpectancy": 2000000001 }"#,
        )
        .expect("valid payload");
        let err = retirement_inputs_from_payload(payload).expect_err("must reject");
        assert!(err.to_string().starts_with("retirementAge"));

        let payload = parse_payload::<RetirementPayload>(
            br#"{ "currentAge": 20, "retirementAge": 130, "lifeExpectancy": 140 }"#,
        )
        .expect("valid payload");
        let err = retirement_inputs_from_payload(payload).expect_err("must reject");
        assert_eq!(
            err,
            RequestError::field("retirementAge", "must cover at most 1200 months")
        );
    }

    #[test]
    fn retirement_rejects_inverted_ages() {
        let payload = parse_payload::<RetirementPayload>(br#"{ "currentAge": 70 }"#)
            .expect("valid payload");
        let err = retirement_inputs_from_payload(payload).expect_err("must reject");
        assert!(err.to_string().starts_with("retirementAge"));

        let payload = parse_payload::<RetirementPayload>(br#"{ "lifeExpectancy": 60 }"#)
            .expect("valid payload");
        let err = retirement_inputs_from_payload(payload).expect_err("must reject");
        assert!(err.to_string().starts_with("lifeExpectancy"));
    }

    #[test]
    fn goal_and_inflation_defaults_are_valid() {
        let goal = goal_inputs_from_payload(GoalPayload::default()).expect("valid goal");
        assert_eq!(goal, default_goal_inputs());

        let params =
            inflation_params_from_payload(InflationPayload::default()).expect("valid params");
        assert_eq!(params, default_inflation_params());

        let payload = parse_payload::<InflationPayload>(br#"{ "initialValue": -1 }"#)
            .expect("valid payload");
        assert!(inflation_params_from_payload(payload).is_err());
    }

    #[test]
    fn monte_carlo_payload_flattens_simulation_fields() {
        let payload = parse_payload::<MonteCarloPayload>(
            br#"{ "initialValue": 2000, "customRate": 12, "trials": 250, "seed": 7 }"#,
        )
        .expect("valid payload");
        let config = monte_carlo_config_from_payload(&payload).expect("valid config");
        let input = simulation_input_from_payload(payload.simulation).expect("valid input");

        assert_eq!(config.trials, 250);
        assert_eq!(config.seed, 7);
        assert_eq!(config.volatility, MonteCarloConfig::default().volatility);
        assert_eq!(input.initial_value, 2_000.0);
        assert_eq!(input.custom_rate, Some(12.0));
    }

    #[test]
    fn monte_carlo_payload_rejects_out_of_range_options() {
        for json in [
            r#"{ "trials": 0 }"#,
            r#"{ "trials": 50001 }"#,
            r#"{ "volatility": 2 }"#,
            r#"{ "correlation": 1.5 }"#,
        ] {
            let payload = parse_payload::<MonteCarloPayload>(json.as_bytes()).expect("valid JSON");
            assert!(
                monte_carlo_config_from_payload(&payload).is_err(),
                "expected rejection for {json}"
            );
        }
    }

    #[test]
    fn partial_scenario_shifts_fill_from_defaults() {
        let payload = parse_payload::<ScenariosPayload>(
            br#"{ "customRate": 10, "shifts": { "pessimistic": { "rateShiftPercent": -50 } } }"#,
        )
        .expect("valid payload");
        let shifts = scenario_shifts_from_payload(payload.shifts).expect("valid shifts");

        assert_eq!(shifts.pessimistic.rate_shift_percent, -50.0);
        assert_eq!(shifts.pessimistic.contribution_shift_percent, None);
        assert_eq!(shifts.optimistic, ScenarioShifts::default().optimistic);
    }

    #[tokio::test]
    async fn simulate_route_returns_camel_case_result_without_caching() {
        let body = Bytes::from_static(
            br#"{ "initialValue": 1000, "monthlyContribution": 100, "customRate": 12, "periodCount": 12 }"#,
        );
        let response = simulate_handler(State(shared_catalog()), body).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );

        let json = body_json(response).await;
        let expected = simulate_at_rate(
            &SimulationInput::custom(1_000.0, 100.0, 12.0, 12, PeriodUnit::Months),
            12.0,
        );
        assert_approx(
            json["finalBalance"].as_f64().expect("finalBalance"),
            expected.final_balance,
        );
        assert_eq!(json["trajectory"].as_array().map(Vec::len), Some(12));
        assert!(json.get("realFinalBalance").is_none());
    }

    #[tokio::test]
    async fn bad_request_carries_error_message() {
        let response = withdrawal_handler(Bytes::from_static(br#"{ "horizonYears": -1 }"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "horizonYears must be >= 0");
    }

    #[tokio::test]
    async fn oversized_period_is_rejected_before_simulating() {
        let body = Bytes::from_static(br#"{ "periodCount": 200000000, "periodUnit": "years" }"#);
        let response = simulate_handler(State(shared_catalog()), body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "periodCount must cover at most 1200 months"
        );

        let response =
            withdrawal_handler(Bytes::from_static(br#"{ "horizonYears": 200000000 }"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            inflation_handler(Bytes::from_static(br#"{ "periodMonths": 2147483647 }"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = goal_handler(Bytes::from_static(br#"{ "periodMonths": 5000 }"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }

    #[tokio::test]
    async fn products_route_serves_the_catalog() {
        let response = products_handler(State(shared_catalog())).await;
        let json = body_json(response).await;
        assert_eq!(json["defaultReferenceRate"], DEFAULT_REFERENCE_RATE);
        assert!(
            json["digitalBanks"]
                .as_array()
                .is_some_and(|banks| !banks.is_empty())
        );
    }

    #[tokio::test]
    async fn scenarios_route_returns_three_weighted_variants() {
        let body = Bytes::from_static(br#"{ "customRate": 10, "periodCount": 24 }"#);
        let json = body_json(scenarios_handler(State(shared_catalog()), body).await).await;

        let variants = json["variants"].as_array().expect("variants");
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0]["label"], "pessimistic");
        let weights: f64 = variants
            .iter()
            .filter_map(|v| v["probabilityWeight"].as_f64())
            .sum();
        assert_approx(weights, 100.0);
        assert!(json["statistics"]["risk"].is_string());
    }

    #[tokio::test]
    async fn monte_carlo_route_is_reproducible() {
        let body = br#"{ "initialValue": 5000, "customRate": 10, "periodCount": 36, "trials": 200 }"#;
        let first =
            body_json(monte_carlo_handler(State(shared_catalog()), Bytes::from_static(body)).await)
                .await;
        let second =
            body_json(monte_carlo_handler(State(shared_catalog()), Bytes::from_static(body)).await)
                .await;
        assert_eq!(first, second);
        assert_eq!(first["trials"], 200);
    }

    #[tokio::test]
    async fn goal_and_retirement_routes_respond() {
        let goal = body_json(goal_handler(Bytes::new()).await).await;
        assert!(goal["requiredMonthlyContribution"].as_f64().is_some_and(|v| v > 0.0));

        let plan = body_json(retirement_handler(Bytes::new()).await).await;
        assert_eq!(plan["yearsAccumulating"], 35);
        assert_eq!(plan["yearsRetired"], 20);

        let report = body_json(inflation_handler(Bytes::new()).await).await;
        assert_eq!(report["nominalTrajectory"].as_array().map(Vec::len), Some(120));

        let comparison = body_json(inflation_compare_handler(Bytes::new()).await).await;
        assert!(comparison["absoluteDifference"].as_f64().is_some_and(|v| v > 0.0));

        let sensitivity =
            body_json(sensitivity_handler(State(shared_catalog()), Bytes::new()).await).await;
        assert_eq!(sensitivity["points"].as_array().map(Vec::len), Some(12));
    }
}
