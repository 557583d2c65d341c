pub mod cli;
pub mod report;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::core::{
    BreakevenPoint, BreakevenSolveResult, MarketDefaults, ParameterSweep, RentOutVsSellCalculator,
    RentOutVsSellInputs, RentOutVsSellParameter, RentVsBuyCalculator, RentVsBuyInputs,
    RentVsBuyParameter, ScenarioError, SensitivityAnalysis, SensitivityRank, SweepableScenario,
    TerminalOutcome, rank_sensitivities,
};
use cli::{
    ApiFilingStatus, RentOutVsSellArgs, RentVsBuyArgs, SweepArgs, SweepRequest,
    build_rent_out_vs_sell_inputs, build_rent_vs_buy_inputs, build_sweep_request,
};

pub use cli::{Cli, run_cli};

type SharedMarket = Arc<MarketDefaults>;

// Every field is optional and, like the command line, uses percent for rates.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RentVsBuyPayload {
    purchase_price: Option<f64>,
    down_payment_pct: Option<f64>,
    mortgage_rate: Option<f64>,
    amortization_years: Option<u32>,
    property_tax_rate: Option<f64>,
    maintenance_cost_pct: Option<f64>,
    home_insurance_monthly: Option<f64>,
    hoa_monthly: Option<f64>,
    home_appreciation_rate: Option<f64>,
    selling_cost_pct: Option<f64>,
    primary_home_exclusion: Option<f64>,
    monthly_rent: Option<f64>,
    renters_insurance_monthly: Option<f64>,
    rent_increase_rate: Option<f64>,
    starting_net_worth: Option<f64>,
    income: Option<f64>,
    income_growth_rate: Option<f64>,
    annual_non_housing_spending: Option<f64>,
    time_horizon_years: Option<u32>,
    investment_tax_enabled: Option<bool>,
    filing_status: Option<ApiFilingStatus>,
    inflation_rate: Option<f64>,
    investment_return_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RentOutVsSellPayload {
    property_value: Option<f64>,
    monthly_rental_income: Option<f64>,
    rental_income_growth_rate: Option<f64>,
    property_management_fee_pct: Option<f64>,
    vacancy_rate: Option<f64>,
    rental_property_tax_rate: Option<f64>,
    rental_maintenance_cost_pct: Option<f64>,
    rental_insurance_monthly: Option<f64>,
    rental_appreciation_rate: Option<f64>,
    selling_cost_pct: Option<f64>,
    capital_gains_exclusion: Option<f64>,
    original_purchase_price: Option<f64>,
    new_monthly_rent: Option<f64>,
    new_rent_increase_rate: Option<f64>,
    new_renters_insurance_monthly: Option<f64>,
    starting_net_worth: Option<f64>,
    income: Option<f64>,
    income_growth_rate: Option<f64>,
    annual_non_housing_spending: Option<f64>,
    time_horizon_years: Option<u32>,
    investment_tax_enabled: Option<bool>,
    filing_status: Option<ApiFilingStatus>,
    inflation_rate: Option<f64>,
    investment_return_rate: Option<f64>,
}

// Household fields are repeated on each payload since query strings cannot
// carry numbers through `#[serde(flatten)]`.
struct HouseholdPayload {
    income: Option<f64>,
    income_growth_rate: Option<f64>,
    annual_non_housing_spending: Option<f64>,
    time_horizon_years: Option<u32>,
    investment_tax_enabled: Option<bool>,
    filing_status: Option<ApiFilingStatus>,
    inflation_rate: Option<f64>,
    investment_return_rate: Option<f64>,
}

macro_rules! household_payload {
    ($payload:expr) => {
        HouseholdPayload {
            income: $payload.income,
            income_growth_rate: $payload.income_growth_rate,
            annual_non_housing_spending: $payload.annual_non_housing_spending,
            time_horizon_years: $payload.time_horizon_years,
            investment_tax_enabled: $payload.investment_tax_enabled,
            filing_status: $payload.filing_status,
            inflation_rate: $payload.inflation_rate,
            investment_return_rate: $payload.investment_return_rate,
        }
    };
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiComparison {
    #[serde(alias = "rentVsBuy", alias = "rent_vs_buy")]
    RentVsBuy,
    #[serde(alias = "rentOutVsSell", alias = "rent_out_vs_sell")]
    RentOutVsSell,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SensitivityPayload {
    comparison: ApiComparison,
    #[serde(default)]
    rent_vs_buy: RentVsBuyPayload,
    #[serde(default)]
    rent_out_vs_sell: RentOutVsSellPayload,
    #[serde(default)]
    parameter: Option<String>,
    #[serde(default)]
    values: Vec<f64>,
    #[serde(default)]
    solve_min: Option<f64>,
    #[serde(default)]
    solve_max: Option<f64>,
    #[serde(default)]
    solve_tolerance: Option<f64>,
    #[serde(default)]
    solve_max_iterations: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
enum SensitivityResponse<P> {
    Comprehensive {
        base_outcome: TerminalOutcome,
        sweeps: Vec<ParameterSweep<P>>,
        ranking: Vec<SensitivityRank<P>>,
        breakeven_points: Vec<BreakevenPoint<P>>,
    },
    Sweep {
        base_outcome: TerminalOutcome,
        sweep: ParameterSweep<P>,
    },
    Solve {
        base_outcome: TerminalOutcome,
        result: BreakevenSolveResult<P>,
    },
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn apply_household(payload: HouseholdPayload, h: &mut cli::HouseholdArgs) {
    if let Some(v) = payload.income {
        h.income = v;
    }
    if let Some(v) = payload.income_growth_rate {
        h.income_growth_rate = v;
    }
    if let Some(v) = payload.annual_non_housing_spending {
        h.annual_non_housing_spending = v;
    }
    if let Some(v) = payload.time_horizon_years {
        h.time_horizon_years = v;
    }
    if let Some(v) = payload.investment_tax_enabled {
        h.no_investment_tax = !v;
    }
    if let Some(v) = payload.filing_status {
        h.filing_status = v.into();
    }
    if let Some(v) = payload.inflation_rate {
        h.inflation_rate = v;
    }
    if let Some(v) = payload.investment_return_rate {
        h.investment_return_rate = v;
    }
}

fn rent_vs_buy_args_from_payload(payload: RentVsBuyPayload) -> RentVsBuyArgs {
    let mut args = RentVsBuyArgs::default();
    if let Some(v) = payload.purchase_price {
        args.purchase_price = v;
    }
    if let Some(v) = payload.down_payment_pct {
        args.down_payment_pct = v;
    }
    if let Some(v) = payload.mortgage_rate {
        args.mortgage_rate = v;
    }
    if let Some(v) = payload.amortization_years {
        args.amortization_years = v;
    }
    if payload.property_tax_rate.is_some() {
        args.property_tax_rate = payload.property_tax_rate;
    }
    if payload.maintenance_cost_pct.is_some() {
        args.maintenance_cost_pct = payload.maintenance_cost_pct;
    }
    if payload.home_insurance_monthly.is_some() {
        args.home_insurance_monthly = payload.home_insurance_monthly;
    }
    if let Some(v) = payload.hoa_monthly {
        args.hoa_monthly = v;
    }
    if payload.home_appreciation_rate.is_some() {
        args.home_appreciation_rate = payload.home_appreciation_rate;
    }
    if let Some(v) = payload.selling_cost_pct {
        args.selling_cost_pct = v;
    }
    if let Some(v) = payload.primary_home_exclusion {
        args.primary_home_exclusion = v;
    }
    if let Some(v) = payload.monthly_rent {
        args.monthly_rent = v;
    }
    if payload.renters_insurance_monthly.is_some() {
        args.renters_insurance_monthly = payload.renters_insurance_monthly;
    }
    if payload.rent_increase_rate.is_some() {
        args.rent_increase_rate = payload.rent_increase_rate;
    }
    if let Some(v) = payload.starting_net_worth {
        args.starting_net_worth = v;
    }
    apply_household(household_payload!(payload), &mut args.household);
    args
}

fn rent_out_vs_sell_args_from_payload(payload: RentOutVsSellPayload) -> RentOutVsSellArgs {
    let mut args = RentOutVsSellArgs::default();
    if let Some(v) = payload.property_value {
        args.property_value = v;
    }
    if let Some(v) = payload.monthly_rental_income {
        args.monthly_rental_income = v;
    }
    if let Some(v) = payload.rental_income_growth_rate {
        args.rental_income_growth_rate = v;
    }
    if let Some(v) = payload.property_management_fee_pct {
        args.property_management_fee_pct = v;
    }
    if let Some(v) = payload.vacancy_rate {
        args.vacancy_rate = v;
    }
    if payload.rental_property_tax_rate.is_some() {
        args.rental_property_tax_rate = payload.rental_property_tax_rate;
    }
    if let Some(v) = payload.rental_maintenance_cost_pct {
        args.rental_maintenance_cost_pct = v;
    }
    if let Some(v) = payload.rental_insurance_monthly {
        args.rental_insurance_monthly = v;
    }
    if payload.rental_appreciation_rate.is_some() {
        args.rental_appreciation_rate = payload.rental_appreciation_rate;
    }
    if let Some(v) = payload.selling_cost_pct {
        args.selling_cost_pct = v;
    }
    if let Some(v) = payload.capital_gains_exclusion {
        args.capital_gains_exclusion = v;
    }
    if let Some(v) = payload.original_purchase_price {
        args.original_purchase_price = v;
    }
    if let Some(v) = payload.new_monthly_rent {
        args.new_monthly_rent = v;
    }
    if let Some(v) = payload.new_rent_increase_rate {
        args.new_rent_increase_rate = v;
    }
    if let Some(v) = payload.new_renters_insurance_monthly {
        args.new_renters_insurance_monthly = v;
    }
    if let Some(v) = payload.starting_net_worth {
        args.starting_net_worth = v;
    }
    apply_household(household_payload!(payload), &mut args.household);
    args
}

fn sweep_args_from_payload(payload: &SensitivityPayload) -> SweepArgs {
    SweepArgs {
        parameter: payload.parameter.clone(),
        values: payload.values.clone(),
        solve_min: payload.solve_min,
        solve_max: payload.solve_max,
        solve_tolerance: payload.solve_tolerance.unwrap_or(0.01),
        solve_max_iterations: payload.solve_max_iterations.unwrap_or(64),
        json: true,
    }
}

fn rent_vs_buy_inputs_from_payload(
    payload: RentVsBuyPayload,
    market: &MarketDefaults,
) -> Result<RentVsBuyInputs, String> {
    build_rent_vs_buy_inputs(&rent_vs_buy_args_from_payload(payload), market)
}

fn rent_out_vs_sell_inputs_from_payload(
    payload: RentOutVsSellPayload,
    market: &MarketDefaults,
) -> Result<RentOutVsSellInputs, String> {
    build_rent_out_vs_sell_inputs(&rent_out_vs_sell_args_from_payload(payload), market)
}

fn router(market: MarketDefaults) -> Router {
    Router::new()
        .route(
            "/api/rent-vs-buy",
            get(rent_vs_buy_get_handler).post(rent_vs_buy_post_handler),
        )
        .route(
            "/api/rent-out-vs-sell",
            get(rent_out_vs_sell_get_handler).post(rent_out_vs_sell_post_handler),
        )
        .route("/api/sensitivity", post(sensitivity_handler))
        .fallback(not_found_handler)
        .with_state(Arc::new(market))
}

pub async fn run_http_server(port: u16, market: MarketDefaults) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(market);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "tenure HTTP API listening");
    info!("Local access: http://127.0.0.1:{port}/api/rent-vs-buy");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn rent_vs_buy_get_handler(
    State(market): State<SharedMarket>,
    Query(payload): Query<RentVsBuyPayload>,
) -> Response {
    rent_vs_buy_handler_impl(&market, payload)
}

async fn rent_vs_buy_post_handler(
    State(market): State<SharedMarket>,
    Json(payload): Json<RentVsBuyPayload>,
) -> Response {
    rent_vs_buy_handler_impl(&market, payload)
}

fn rent_vs_buy_handler_impl(market: &MarketDefaults, payload: RentVsBuyPayload) -> Response {
    let inputs = match rent_vs_buy_inputs_from_payload(payload, market) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    match RentVsBuyCalculator::from_inputs(inputs) {
        Ok(calculator) => json_response(StatusCode::OK, calculator.run_analysis()),
        Err(err) => scenario_error_response(&err),
    }
}

async fn rent_out_vs_sell_get_handler(
    State(market): State<SharedMarket>,
    Query(payload): Query<RentOutVsSellPayload>,
) -> Response {
    rent_out_vs_sell_handler_impl(&market, payload)
}

async fn rent_out_vs_sell_post_handler(
    State(market): State<SharedMarket>,
    Json(payload): Json<RentOutVsSellPayload>,
) -> Response {
    rent_out_vs_sell_handler_impl(&market, payload)
}

fn rent_out_vs_sell_handler_impl(
    market: &MarketDefaults,
    payload: RentOutVsSellPayload,
) -> Response {
    let inputs = match rent_out_vs_sell_inputs_from_payload(payload, market) {
        Ok(inputs) => inputs,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    match RentOutVsSellCalculator::from_inputs(inputs) {
        Ok(calculator) => json_response(StatusCode::OK, calculator.run_analysis()),
        Err(err) => scenario_error_response(&err),
    }
}

async fn sensitivity_handler(
    State(market): State<SharedMarket>,
    Json(payload): Json<SensitivityPayload>,
) -> Response {
    let sweep = sweep_args_from_payload(&payload);
    match payload.comparison {
        ApiComparison::RentVsBuy => {
            let inputs = match rent_vs_buy_inputs_from_payload(payload.rent_vs_buy, &market) {
                Ok(inputs) => inputs,
                Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
            };
            match build_sweep_request::<RentVsBuyParameter>(&sweep) {
                Ok(request) => sensitivity_response(inputs, request),
                Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
            }
        }
        ApiComparison::RentOutVsSell => {
            let inputs =
                match rent_out_vs_sell_inputs_from_payload(payload.rent_out_vs_sell, &market) {
                    Ok(inputs) => inputs,
                    Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
                };
            match build_sweep_request::<RentOutVsSellParameter>(&sweep) {
                Ok(request) => sensitivity_response(inputs, request),
                Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
            }
        }
    }
}

fn sensitivity_response<S: SweepableScenario>(
    base: S,
    request: SweepRequest<S::Parameter>,
) -> Response {
    match build_sensitivity_response(base, request) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => scenario_error_response(&err),
    }
}

fn build_sensitivity_response<S: SweepableScenario>(
    base: S,
    request: SweepRequest<S::Parameter>,
) -> Result<SensitivityResponse<S::Parameter>, ScenarioError> {
    let analysis = SensitivityAnalysis::new(base)?;
    let base_outcome = *analysis.base_outcome();
    Ok(match request {
        SweepRequest::Comprehensive => {
            let sweeps = analysis.comprehensive_analysis();
            let ranking = rank_sensitivities(&sweeps);
            SensitivityResponse::Comprehensive {
                base_outcome,
                sweeps,
                ranking,
                breakeven_points: analysis.default_breakeven_points(),
            }
        }
        SweepRequest::Single { parameter, values } => SensitivityResponse::Sweep {
            base_outcome,
            sweep: analysis.analyze_parameter(parameter, &values),
        },
        SweepRequest::Solve(config) => SensitivityResponse::Solve {
            base_outcome,
            result: analysis.solve_breakeven(config)?,
        },
    })
}

fn scenario_error_response(err: &ScenarioError) -> Response {
    warn!(error = %err, "rejected scenario");
    let status = if err.is_insufficient_capital() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_REQUEST
    };
    error_response(status, &err.to_string())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
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
