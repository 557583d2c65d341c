use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;

use super::report;
use crate::core::{
    Assumptions, BreakevenSolveConfig, BuyScenario, FilingStatus, MAX_HORIZON_YEARS, MarketDefaults,
    RentOutScenario, RentOutVsSellAssumptions, RentOutVsSellCalculator, RentOutVsSellInputs,
    RentOutVsSellParameter, RentScenario, RentVsBuyCalculator, RentVsBuyInputs,
    RentVsBuyParameter, SellScenario, SensitivityAnalysis, SweepParameter, SweepableScenario,
    rank_sensitivities,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliFilingStatus {
    Single,
    MarriedFilingJointly,
}

impl From<CliFilingStatus> for FilingStatus {
    fn from(value: CliFilingStatus) -> Self {
        match value {
            CliFilingStatus::Single => FilingStatus::Single,
            CliFilingStatus::MarriedFilingJointly => FilingStatus::MarriedFilingJointly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum ApiFilingStatus {
    Single,
    #[serde(
        alias = "marriedFilingJointly",
        alias = "married_filing_jointly",
        alias = "mfj"
    )]
    MarriedFilingJointly,
}

impl From<ApiFilingStatus> for CliFilingStatus {
    fn from(value: ApiFilingStatus) -> Self {
        match value {
            ApiFilingStatus::Single => CliFilingStatus::Single,
            ApiFilingStatus::MarriedFilingJointly => CliFilingStatus::MarriedFilingJointly,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tenure",
    about = "Month-by-month net worth comparison of renting, buying, letting out and selling a home"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON file of regional market defaults (fractions, not percent)"
    )]
    pub market_defaults: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Buy a home with a mortgage, or rent and invest the difference.
    RentVsBuy {
        #[command(flatten)]
        scenario: RentVsBuyArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Keep an owned property and let it out, or sell it and invest the proceeds.
    RentOutVsSell {
        #[command(flatten)]
        scenario: RentOutVsSellArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Sweep inputs one at a time and report how the outcome moves.
    Sensitivity {
        #[command(subcommand)]
        target: SensitivityTarget,
    },
    /// Serve the comparisons over HTTP.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Debug, Subcommand)]
pub enum SensitivityTarget {
    RentVsBuy {
        #[command(flatten)]
        scenario: RentVsBuyArgs,
        #[command(flatten)]
        sweep: SweepArgs,
    },
    RentOutVsSell {
        #[command(flatten)]
        scenario: RentOutVsSellArgs,
        #[command(flatten)]
        sweep: SweepArgs,
    },
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct OutputArgs {
    #[arg(long, help = "Print the full analysis as JSON instead of the report")]
    pub json: bool,
    #[arg(
        long,
        default_value = ".",
        help = "Directory the monthly CSV files are written to"
    )]
    pub csv_dir: PathBuf,
    #[arg(long, help = "Skip writing monthly CSV files")]
    pub no_csv: bool,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct SweepArgs {
    #[arg(long, help = "Parameter to vary; omit for the full default plan")]
    pub parameter: Option<String>,
    #[arg(
        long,
        value_delimiter = ',',
        help = "Comma-separated values to try (percent for rates)"
    )]
    pub values: Vec<f64>,
    #[arg(long, help = "Lower bound for a bisection breakeven solve (percent for rates)")]
    pub solve_min: Option<f64>,
    #[arg(long, help = "Upper bound for a bisection breakeven solve (percent for rates)")]
    pub solve_max: Option<f64>,
    #[arg(long, default_value_t = 0.01, help = "Bisection tolerance (percent for rates)")]
    pub solve_tolerance: f64,
    #[arg(long, default_value_t = 64)]
    pub solve_max_iterations: u32,
    #[arg(long, help = "Print results as JSON")]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct HouseholdArgs {
    #[arg(long, default_value_t = 350_000.0, help = "Annual gross household income")]
    pub income: f64,
    #[arg(long, default_value_t = 5.0, help = "Annual income growth in percent")]
    pub income_growth_rate: f64,
    #[arg(long, default_value_t = 73_000.0)]
    pub annual_non_housing_spending: f64,
    #[arg(long, default_value_t = 10)]
    pub time_horizon_years: u32,
    #[arg(long, help = "Do not tax investment gains at the end of the horizon")]
    pub no_investment_tax: bool,
    #[arg(long, value_enum, default_value_t = CliFilingStatus::MarriedFilingJointly)]
    pub filing_status: CliFilingStatus,
    #[arg(long, default_value_t = 2.5, help = "Annual inflation in percent")]
    pub inflation_rate: f64,
    #[arg(long, default_value_t = 9.0, help = "Expected annual investment return in percent")]
    pub investment_return_rate: f64,
}

impl Default for HouseholdArgs {
    fn default() -> Self {
        Self {
            income: 350_000.0,
            income_growth_rate: 5.0,
            annual_non_housing_spending: 73_000.0,
            time_horizon_years: 10,
            no_investment_tax: false,
            filing_status: CliFilingStatus::MarriedFilingJointly,
            inflation_rate: 2.5,
            investment_return_rate: 9.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct RentVsBuyArgs {
    #[arg(long, default_value_t = 700_000.0)]
    pub purchase_price: f64,
    #[arg(long, default_value_t = 20.0, help = "Down payment in percent of price")]
    pub down_payment_pct: f64,
    #[arg(long, default_value_t = 4.25, help = "Annual mortgage rate in percent")]
    pub mortgage_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub amortization_years: u32,
    #[arg(long, help = "Annual property tax in percent of value; market default if omitted")]
    pub property_tax_rate: Option<f64>,
    #[arg(long, help = "Annual maintenance in percent of price; market default if omitted")]
    pub maintenance_cost_pct: Option<f64>,
    #[arg(long, help = "Monthly home insurance; market default if omitted")]
    pub home_insurance_monthly: Option<f64>,
    #[arg(long, default_value_t = 550.0)]
    pub hoa_monthly: f64,
    #[arg(long, help = "Annual home appreciation in percent; market default if omitted")]
    pub home_appreciation_rate: Option<f64>,
    #[arg(long, default_value_t = 6.0, help = "Cost of selling in percent of sale price")]
    pub selling_cost_pct: f64,
    #[arg(long, default_value_t = 500_000.0)]
    pub primary_home_exclusion: f64,
    #[arg(long, default_value_t = 2_500.0)]
    pub monthly_rent: f64,
    #[arg(long, help = "Monthly renters insurance; market default if omitted")]
    pub renters_insurance_monthly: Option<f64>,
    #[arg(long, help = "Annual rent increase in percent; market default if omitted")]
    pub rent_increase_rate: Option<f64>,
    #[arg(long, default_value_t = 300_000.0, help = "Starting net worth, including the down payment")]
    pub starting_net_worth: f64,
    #[command(flatten)]
    pub household: HouseholdArgs,
}

impl Default for RentVsBuyArgs {
    fn default() -> Self {
        Self {
            purchase_price: 700_000.0,
            down_payment_pct: 20.0,
            mortgage_rate: 4.25,
            amortization_years: 30,
            property_tax_rate: None,
            maintenance_cost_pct: None,
            home_insurance_monthly: None,
            hoa_monthly: 550.0,
            home_appreciation_rate: None,
            selling_cost_pct: 6.0,
            primary_home_exclusion: 500_000.0,
            monthly_rent: 2_500.0,
            renters_insurance_monthly: None,
            rent_increase_rate: None,
            starting_net_worth: 300_000.0,
            household: HouseholdArgs::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Args)]
pub struct RentOutVsSellArgs {
    #[arg(long, default_value_t = 800_000.0)]
    pub property_value: f64,
    #[arg(long, default_value_t = 4_000.0)]
    pub monthly_rental_income: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual rental income growth in percent")]
    pub rental_income_growth_rate: f64,
    #[arg(long, default_value_t = 8.0, help = "Management fee in percent of collected rent")]
    pub property_management_fee_pct: f64,
    #[arg(long, default_value_t = 5.0, help = "Vacancy in percent")]
    pub vacancy_rate: f64,
    #[arg(long, help = "Annual property tax in percent of value; market default if omitted")]
    pub rental_property_tax_rate: Option<f64>,
    #[arg(long, default_value_t = 1.0, help = "Annual maintenance in percent of value")]
    pub rental_maintenance_cost_pct: f64,
    #[arg(long, default_value_t = 200.0)]
    pub rental_insurance_monthly: f64,
    #[arg(long, help = "Annual appreciation in percent; market default if omitted")]
    pub rental_appreciation_rate: Option<f64>,
    #[arg(long, default_value_t = 6.0, help = "Cost of selling in percent of sale price")]
    pub selling_cost_pct: f64,
    #[arg(long, default_value_t = 500_000.0)]
    pub capital_gains_exclusion: f64,
    #[arg(long, default_value_t = 600_000.0)]
    pub original_purchase_price: f64,
    #[arg(long, default_value_t = 3_500.0, help = "Rent for the new place to live")]
    pub new_monthly_rent: f64,
    #[arg(long, default_value_t = 3.0, help = "Annual increase of the new rent in percent")]
    pub new_rent_increase_rate: f64,
    #[arg(long, default_value_t = 25.0)]
    pub new_renters_insurance_monthly: f64,
    #[arg(long, default_value_t = 200_000.0, help = "Starting net worth, excluding the property")]
    pub starting_net_worth: f64,
    #[command(flatten)]
    pub household: HouseholdArgs,
}

impl Default for RentOutVsSellArgs {
    fn default() -> Self {
        Self {
            property_value: 800_000.0,
            monthly_rental_income: 4_000.0,
            rental_income_growth_rate: 3.0,
            property_management_fee_pct: 8.0,
            vacancy_rate: 5.0,
            rental_property_tax_rate: None,
            rental_maintenance_cost_pct: 1.0,
            rental_insurance_monthly: 200.0,
            rental_appreciation_rate: None,
            selling_cost_pct: 6.0,
            capital_gains_exclusion: 500_000.0,
            original_purchase_price: 600_000.0,
            new_monthly_rent: 3_500.0,
            new_rent_increase_rate: 3.0,
            new_renters_insurance_monthly: 25.0,
            starting_net_worth: 200_000.0,
            household: HouseholdArgs::default(),
        }
    }
}

// Figures for a Seattle-area condo market, used when no defaults file is given.
pub fn builtin_market_defaults() -> MarketDefaults {
    MarketDefaults {
        property_tax_rate: 0.0085,
        maintenance_cost_pct: 0.002,
        home_insurance_monthly: 0.0,
        renters_insurance_monthly: 0.0,
        home_appreciation_rate: 0.04,
        rent_increase_rate: 0.025,
    }
}

pub fn load_market_defaults(path: Option<&Path>) -> Result<MarketDefaults, String> {
    let Some(path) = path else {
        return Ok(builtin_market_defaults());
    };
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("--market-defaults {}: {e}", path.display()))?;
    parse_market_defaults(&raw).map_err(|e| format!("--market-defaults {}: {e}", path.display()))
}

fn parse_market_defaults(raw: &str) -> Result<MarketDefaults, String> {
    let market = serde_json::from_str::<MarketDefaults>(raw).map_err(|e| e.to_string())?;
    let fields = [
        ("property_tax_rate", market.property_tax_rate),
        ("maintenance_cost_pct", market.maintenance_cost_pct),
        ("home_insurance_monthly", market.home_insurance_monthly),
        ("renters_insurance_monthly", market.renters_insurance_monthly),
        ("home_appreciation_rate", market.home_appreciation_rate),
        ("rent_increase_rate", market.rent_increase_rate),
    ];
    for (name, value) in fields {
        if !value.is_finite() {
            return Err(format!("{name} must be finite"));
        }
    }
    Ok(market)
}

fn check_finite(flag: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("--{flag} must be a finite number"))
    }
}

fn check_non_negative(flag: &str, value: f64) -> Result<(), String> {
    check_finite(flag, value)?;
    if value < 0.0 {
        return Err(format!("--{flag} must be >= 0"));
    }
    Ok(())
}

fn check_percent(flag: &str, value: f64) -> Result<(), String> {
    check_finite(flag, value)?;
    if !(0.0..=100.0).contains(&value) {
        return Err(format!("--{flag} must be between 0 and 100"));
    }
    Ok(())
}

fn check_household(h: &HouseholdArgs) -> Result<(), String> {
    check_non_negative("income", h.income)?;
    check_finite("income-growth-rate", h.income_growth_rate)?;
    check_non_negative("annual-non-housing-spending", h.annual_non_housing_spending)?;
    check_finite("inflation-rate", h.inflation_rate)?;
    check_finite("investment-return-rate", h.investment_return_rate)?;
    if h.investment_return_rate <= -100.0 {
        return Err("--investment-return-rate must be > -100".to_string());
    }
    if h.time_horizon_years > MAX_HORIZON_YEARS {
        return Err(format!("--time-horizon-years must be <= {MAX_HORIZON_YEARS}"));
    }
    Ok(())
}

pub fn build_rent_vs_buy_inputs(
    args: &RentVsBuyArgs,
    market: &MarketDefaults,
) -> Result<RentVsBuyInputs, String> {
    let h = &args.household;
    check_household(h)?;

    check_non_negative("purchase-price", args.purchase_price)?;
    check_percent("down-payment-pct", args.down_payment_pct)?;
    check_non_negative("mortgage-rate", args.mortgage_rate)?;
    if args.amortization_years == 0 {
        return Err("--amortization-years must be > 0".to_string());
    }
    check_non_negative("hoa-monthly", args.hoa_monthly)?;
    check_percent("selling-cost-pct", args.selling_cost_pct)?;
    check_non_negative("primary-home-exclusion", args.primary_home_exclusion)?;
    check_non_negative("monthly-rent", args.monthly_rent)?;
    check_finite("starting-net-worth", args.starting_net_worth)?;

    let property_tax_rate = args
        .property_tax_rate
        .map(|v| v / 100.0)
        .unwrap_or(market.property_tax_rate);
    let maintenance_cost_pct = args
        .maintenance_cost_pct
        .map(|v| v / 100.0)
        .unwrap_or(market.maintenance_cost_pct);
    let home_insurance_monthly = args
        .home_insurance_monthly
        .unwrap_or(market.home_insurance_monthly);
    let home_appreciation_rate = args
        .home_appreciation_rate
        .map(|v| v / 100.0)
        .unwrap_or(market.home_appreciation_rate);
    let renters_insurance_monthly = args
        .renters_insurance_monthly
        .unwrap_or(market.renters_insurance_monthly);
    let rent_increase_rate = args
        .rent_increase_rate
        .map(|v| v / 100.0)
        .unwrap_or(market.rent_increase_rate);

    check_non_negative("property-tax-rate", property_tax_rate)?;
    check_non_negative("maintenance-cost-pct", maintenance_cost_pct)?;
    check_non_negative("home-insurance-monthly", home_insurance_monthly)?;
    check_finite("home-appreciation-rate", home_appreciation_rate)?;
    check_non_negative("renters-insurance-monthly", renters_insurance_monthly)?;
    check_finite("rent-increase-rate", rent_increase_rate)?;

    Ok(RentVsBuyInputs {
        buy: BuyScenario {
            purchase_price: args.purchase_price,
            down_payment_pct: args.down_payment_pct / 100.0,
            mortgage_rate: args.mortgage_rate / 100.0,
            amortization_years: args.amortization_years,
            property_tax_rate,
            maintenance_cost_pct,
            home_insurance_monthly,
            hoa_monthly: args.hoa_monthly,
            home_appreciation_rate,
            selling_cost_pct: args.selling_cost_pct / 100.0,
            primary_home_exclusion_dollars: args.primary_home_exclusion,
        },
        rent: RentScenario {
            monthly_rent: args.monthly_rent,
            renters_insurance_monthly,
            rent_increase_rate,
        },
        assumptions: Assumptions {
            income: h.income,
            time_horizon_years: h.time_horizon_years,
            investment_tax_enabled: !h.no_investment_tax,
            filing_status: h.filing_status.into(),
            inflation_rate: h.inflation_rate / 100.0,
            investment_return_rate: h.investment_return_rate / 100.0,
            income_growth_rate: h.income_growth_rate / 100.0,
            starting_net_worth: args.starting_net_worth,
            annual_non_housing_spending: h.annual_non_housing_spending,
        },
    })
}

pub fn build_rent_out_vs_sell_inputs(
    args: &RentOutVsSellArgs,
    market: &MarketDefaults,
) -> Result<RentOutVsSellInputs, String> {
    let h = &args.household;
    check_household(h)?;
    if h.time_horizon_years == 0 {
        return Err("--time-horizon-years must be > 0".to_string());
    }

    check_non_negative("property-value", args.property_value)?;
    check_non_negative("monthly-rental-income", args.monthly_rental_income)?;
    check_finite("rental-income-growth-rate", args.rental_income_growth_rate)?;
    check_percent("property-management-fee-pct", args.property_management_fee_pct)?;
    check_percent("vacancy-rate", args.vacancy_rate)?;
    check_non_negative("rental-maintenance-cost-pct", args.rental_maintenance_cost_pct)?;
    check_non_negative("rental-insurance-monthly", args.rental_insurance_monthly)?;
    check_percent("selling-cost-pct", args.selling_cost_pct)?;
    check_non_negative("capital-gains-exclusion", args.capital_gains_exclusion)?;
    check_non_negative("original-purchase-price", args.original_purchase_price)?;
    check_non_negative("new-monthly-rent", args.new_monthly_rent)?;
    check_finite("new-rent-increase-rate", args.new_rent_increase_rate)?;
    check_non_negative("new-renters-insurance-monthly", args.new_renters_insurance_monthly)?;
    check_finite("starting-net-worth", args.starting_net_worth)?;

    let rental_property_tax_rate = args
        .rental_property_tax_rate
        .map(|v| v / 100.0)
        .unwrap_or(market.property_tax_rate);
    let rental_appreciation_rate = args
        .rental_appreciation_rate
        .map(|v| v / 100.0)
        .unwrap_or(market.home_appreciation_rate);
    check_non_negative("rental-property-tax-rate", rental_property_tax_rate)?;
    check_finite("rental-appreciation-rate", rental_appreciation_rate)?;

    Ok(RentOutVsSellInputs {
        rent_out: RentOutScenario {
            current_property_value: args.property_value,
            monthly_rental_income: args.monthly_rental_income,
            rental_income_growth_rate: args.rental_income_growth_rate / 100.0,
            property_management_fee_pct: args.property_management_fee_pct / 100.0,
            vacancy_rate: args.vacancy_rate / 100.0,
            rental_property_tax_rate,
            rental_maintenance_cost_pct: args.rental_maintenance_cost_pct / 100.0,
            rental_insurance_monthly: args.rental_insurance_monthly,
            rental_appreciation_rate,
        },
        sell: SellScenario {
            current_property_value: args.property_value,
            selling_cost_pct: args.selling_cost_pct / 100.0,
            capital_gains_exclusion: args.capital_gains_exclusion,
            original_purchase_price: args.original_purchase_price,
        },
        assumptions: RentOutVsSellAssumptions {
            income: h.income,
            time_horizon_years: h.time_horizon_years,
            investment_tax_enabled: !h.no_investment_tax,
            filing_status: h.filing_status.into(),
            inflation_rate: h.inflation_rate / 100.0,
            investment_return_rate: h.investment_return_rate / 100.0,
            income_growth_rate: h.income_growth_rate / 100.0,
            starting_net_worth: args.starting_net_worth,
            annual_non_housing_spending: h.annual_non_housing_spending,
            new_monthly_rent: args.new_monthly_rent,
            new_rent_increase_rate: args.new_rent_increase_rate / 100.0,
            new_renters_insurance_monthly: args.new_renters_insurance_monthly,
        },
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum SweepRequest<P> {
    Comprehensive,
    Single { parameter: P, values: Vec<f64> },
    Solve(BreakevenSolveConfig<P>),
}

// Rates on the command line are percent; the core works in fractions.
fn to_core_value<P: SweepParameter>(parameter: P, value: f64) -> f64 {
    if parameter.is_rate() {
        value / 100.0
    } else {
        value
    }
}

pub fn build_sweep_request<P>(sweep: &SweepArgs) -> Result<SweepRequest<P>, String>
where
    P: SweepParameter + std::str::FromStr<Err = String>,
{
    let Some(name) = sweep.parameter.as_deref() else {
        if !sweep.values.is_empty() || sweep.solve_min.is_some() || sweep.solve_max.is_some() {
            return Err("--values and --solve-min/--solve-max require --parameter".to_string());
        }
        return Ok(SweepRequest::Comprehensive);
    };
    let parameter: P = name.parse().map_err(|e| format!("--parameter: {e}"))?;

    match (sweep.solve_min, sweep.solve_max) {
        (Some(min), Some(max)) => {
            if !sweep.values.is_empty() {
                return Err("--values cannot be combined with --solve-min/--solve-max".to_string());
            }
            if sweep.solve_tolerance <= 0.0 || !sweep.solve_tolerance.is_finite() {
                return Err("--solve-tolerance must be > 0".to_string());
            }
            if sweep.solve_max_iterations == 0 {
                return Err("--solve-max-iterations must be > 0".to_string());
            }
            if !min.is_finite() || !max.is_finite() || max <= min {
                return Err("--solve-max must be greater than --solve-min".to_string());
            }
            Ok(SweepRequest::Solve(BreakevenSolveConfig {
                parameter,
                search_min: to_core_value(parameter, min),
                search_max: to_core_value(parameter, max),
                tolerance: to_core_value(parameter, sweep.solve_tolerance),
                max_iterations: sweep.solve_max_iterations,
            }))
        }
        (None, None) => {
            if sweep.values.is_empty() {
                return Err("--values is required when --parameter is given".to_string());
            }
            if let Some(bad) = sweep.values.iter().find(|v| !v.is_finite()) {
                return Err(format!("--values contains a non-finite value ({bad})"));
            }
            Ok(SweepRequest::Single {
                parameter,
                values: sweep
                    .values
                    .iter()
                    .map(|&v| to_core_value(parameter, v))
                    .collect(),
            })
        }
        _ => Err("--solve-min and --solve-max must be given together".to_string()),
    }
}

pub async fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let market = load_market_defaults(cli.market_defaults.as_deref()).map_err(|e| anyhow!(e))?;

    match cli.command {
        Command::RentVsBuy { scenario, output } => {
            let inputs = build_rent_vs_buy_inputs(&scenario, &market).map_err(|e| anyhow!(e))?;
            let analysis = RentVsBuyCalculator::from_inputs(inputs.clone())?.run_analysis();
            if output.json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                report::print_rent_vs_buy(&inputs, &analysis);
            }
            if !output.no_csv {
                let written = report::write_rent_vs_buy_csv(&output.csv_dir, &analysis)
                    .with_context(|| format!("writing CSV files to {}", output.csv_dir.display()))?;
                for path in written {
                    info!(path = %path.display(), "wrote monthly analysis");
                }
            }
        }
        Command::RentOutVsSell { scenario, output } => {
            let inputs =
                build_rent_out_vs_sell_inputs(&scenario, &market).map_err(|e| anyhow!(e))?;
            let analysis = RentOutVsSellCalculator::from_inputs(inputs.clone())?.run_analysis();
            if output.json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            } else {
                report::print_rent_out_vs_sell(&inputs, &analysis);
            }
            if !output.no_csv {
                let written = report::write_rent_out_vs_sell_csv(&output.csv_dir, &analysis)
                    .with_context(|| format!("writing CSV files to {}", output.csv_dir.display()))?;
                for path in written {
                    info!(path = %path.display(), "wrote monthly analysis");
                }
            }
        }
        Command::Sensitivity { target } => match target {
            SensitivityTarget::RentVsBuy { scenario, sweep } => {
                let inputs =
                    build_rent_vs_buy_inputs(&scenario, &market).map_err(|e| anyhow!(e))?;
                let request = build_sweep_request::<RentVsBuyParameter>(&sweep)
                    .map_err(|e| anyhow!(e))?;
                run_sensitivity(inputs, request, sweep.json)?;
            }
            SensitivityTarget::RentOutVsSell { scenario, sweep } => {
                let inputs =
                    build_rent_out_vs_sell_inputs(&scenario, &market).map_err(|e| anyhow!(e))?;
                let request = build_sweep_request::<RentOutVsSellParameter>(&sweep)
                    .map_err(|e| anyhow!(e))?;
                run_sensitivity(inputs, request, sweep.json)?;
            }
        },
        Command::Serve { port } => {
            super::run_http_server(port, market).await?;
        }
    }
    Ok(())
}

fn run_sensitivity<S: SweepableScenario>(
    base: S,
    request: SweepRequest<S::Parameter>,
    json: bool,
) -> anyhow::Result<()> {
    let analysis = SensitivityAnalysis::new(base)?;
    match request {
        SweepRequest::Comprehensive => {
            let sweeps = analysis.comprehensive_analysis();
            let ranking = rank_sensitivities(&sweeps);
            let breakevens = analysis.default_breakeven_points();
            if json {
                let body = serde_json::json!({
                    "baseOutcome": analysis.base_outcome(),
                    "sweeps": sweeps,
                    "ranking": ranking,
                    "breakevenPoints": breakevens,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                report::print_sensitivity_summary(analysis.base_outcome(), &ranking, &breakevens);
                report::print_sweep_details(&sweeps);
            }
        }
        SweepRequest::Single { parameter, values } => {
            let sweep = analysis.analyze_parameter(parameter, &values);
            if json {
                println!("{}", serde_json::to_string_pretty(&sweep)?);
            } else {
                report::print_sweep_details(std::slice::from_ref(&sweep));
            }
        }
        SweepRequest::Solve(config) => {
            let result = analysis.solve_breakeven(config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                report::print_breakeven_solve(&result);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["tenure"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("arguments parse")
    }

    #[test]
    fn clap_defaults_match_api_defaults() {
        match parse(&["rent-vs-buy"]).command {
            Command::RentVsBuy { scenario, output } => {
                assert_eq!(scenario, RentVsBuyArgs::default());
                assert!(!output.json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        match parse(&["rent-out-vs-sell"]).command {
            Command::RentOutVsSell { scenario, .. } => {
                assert_eq!(scenario, RentOutVsSellArgs::default());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn percent_flags_become_fractions() {
        let inputs = build_rent_vs_buy_inputs(&RentVsBuyArgs::default(), &builtin_market_defaults())
            .expect("defaults are valid");
        assert_approx(inputs.buy.down_payment_pct, 0.20);
        assert_approx(inputs.buy.mortgage_rate, 0.0425);
        assert_approx(inputs.buy.selling_cost_pct, 0.06);
        assert_approx(inputs.assumptions.investment_return_rate, 0.09);
        assert_approx(inputs.assumptions.inflation_rate, 0.025);
        assert!(inputs.assumptions.investment_tax_enabled);
        assert_eq!(inputs.assumptions.filing_status, FilingStatus::MarriedFilingJointly);
    }

    #[test]
    fn omitted_market_flags_fall_back_to_market_defaults() {
        let market = MarketDefaults {
            property_tax_rate: 0.011,
            maintenance_cost_pct: 0.01,
            home_insurance_monthly: 120.0,
            renters_insurance_monthly: 18.0,
            home_appreciation_rate: 0.03,
            rent_increase_rate: 0.035,
        };
        let mut args = RentVsBuyArgs::default();
        args.property_tax_rate = Some(1.5);

        let inputs = build_rent_vs_buy_inputs(&args, &market).expect("valid");
        assert_approx(inputs.buy.property_tax_rate, 0.015);
        assert_approx(inputs.buy.maintenance_cost_pct, 0.01);
        assert_approx(inputs.buy.home_insurance_monthly, 120.0);
        assert_approx(inputs.buy.home_appreciation_rate, 0.03);
        assert_approx(inputs.rent.renters_insurance_monthly, 18.0);
        assert_approx(inputs.rent.rent_increase_rate, 0.035);

        let rent_out = build_rent_out_vs_sell_inputs(&RentOutVsSellArgs::default(), &market)
            .expect("valid");
        assert_approx(rent_out.rent_out.rental_property_tax_rate, 0.011);
        assert_approx(rent_out.rent_out.rental_appreciation_rate, 0.03);
    }

    #[test]
    fn property_value_is_shared_by_both_sides() {
        let inputs = build_rent_out_vs_sell_inputs(
            &RentOutVsSellArgs::default(),
            &builtin_market_defaults(),
        )
        .expect("valid");
        assert_eq!(
            inputs.rent_out.current_property_value,
            inputs.sell.current_property_value
        );
        assert_approx(inputs.rent_out.vacancy_rate, 0.05);
        assert_approx(inputs.assumptions.new_rent_increase_rate, 0.03);
    }

    #[test]
    fn build_rejects_out_of_range_down_payment() {
        let mut args = RentVsBuyArgs::default();
        args.down_payment_pct = 120.0;
        let err = build_rent_vs_buy_inputs(&args, &builtin_market_defaults())
            .expect_err("must reject");
        assert!(err.contains("--down-payment-pct"), "{err}");
    }

    #[test]
    fn build_rejects_zero_amortization_term() {
        let mut args = RentVsBuyArgs::default();
        args.amortization_years = 0;
        let err = build_rent_vs_buy_inputs(&args, &builtin_market_defaults())
            .expect_err("must reject");
        assert!(err.contains("--amortization-years"), "{err}");
    }

    #[test]
    fn build_rejects_zero_horizon_for_rent_out() {
        let mut args = RentOutVsSellArgs::default();
        args.household.time_horizon_years = 0;
        let err = build_rent_out_vs_sell_inputs(&args, &builtin_market_defaults())
            .expect_err("must reject");
        assert!(err.contains("--time-horizon-years"), "{err}");
    }

    #[test]
    fn market_defaults_parse_from_json() {
        let market = parse_market_defaults(
            r#"{
                "property_tax_rate": 0.012,
                "maintenance_cost_pct": 0.01,
                "home_insurance_monthly": 150,
                "renters_insurance_monthly": 20,
                "home_appreciation_rate": 0.035,
                "rent_increase_rate": 0.03
            }"#,
        )
        .expect("valid json");
        assert_approx(market.home_insurance_monthly, 150.0);
        assert!(parse_market_defaults(r#"{"property_tax_rate": 0.01}"#).is_err());
    }

    #[test]
    fn missing_market_file_names_the_flag() {
        let err = load_market_defaults(Some(Path::new("/nonexistent/market.json")))
            .expect_err("missing file");
        assert!(err.starts_with("--market-defaults"), "{err}");
    }

    #[test]
    fn sweep_without_parameter_is_comprehensive() {
        let request = build_sweep_request::<RentVsBuyParameter>(&SweepArgs {
            parameter: None,
            values: vec![],
            solve_min: None,
            solve_max: None,
            solve_tolerance: 0.01,
            solve_max_iterations: 64,
            json: false,
        })
        .expect("valid");
        assert_eq!(request, SweepRequest::Comprehensive);
    }

    #[test]
    fn sweep_values_for_rates_are_converted_from_percent() {
        match parse(&[
            "sensitivity",
            "rent-vs-buy",
            "--parameter",
            "mortgage-rate",
            "--values",
            "3,4.5,6",
        ])
        .command
        {
            Command::Sensitivity {
                target: SensitivityTarget::RentVsBuy { sweep, .. },
            } => {
                let request = build_sweep_request::<RentVsBuyParameter>(&sweep).expect("valid");
                let SweepRequest::Single { parameter, values } = request else {
                    panic!("expected a single sweep");
                };
                assert_eq!(parameter, RentVsBuyParameter::MortgageRate);
                assert_eq!(values.len(), 3);
                assert_approx(values[1], 0.045);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn sweep_values_for_dollars_are_unchanged() {
        let request = build_sweep_request::<RentVsBuyParameter>(&SweepArgs {
            parameter: Some("monthly_rent".to_string()),
            values: vec![2_000.0, 3_000.0],
            solve_min: None,
            solve_max: None,
            solve_tolerance: 0.01,
            solve_max_iterations: 64,
            json: false,
        })
        .expect("valid");
        assert_eq!(
            request,
            SweepRequest::Single {
                parameter: RentVsBuyParameter::MonthlyRent,
                values: vec![2_000.0, 3_000.0],
            }
        );
    }

    #[test]
    fn solve_requires_both_bounds() {
        let err = build_sweep_request::<RentOutVsSellParameter>(&SweepArgs {
            parameter: Some("vacancy-rate".to_string()),
            values: vec![],
            solve_min: Some(0.0),
            solve_max: None,
            solve_tolerance: 0.01,
            solve_max_iterations: 64,
            json: false,
        })
        .expect_err("must reject");
        assert!(err.contains("--solve-min"), "{err}");
    }

    #[test]
    fn unknown_parameter_is_reported_against_its_flag() {
        let err = build_sweep_request::<RentVsBuyParameter>(&SweepArgs {
            parameter: Some("garden_size".to_string()),
            values: vec![1.0],
            solve_min: None,
            solve_max: None,
            solve_tolerance: 0.01,
            solve_max_iterations: 64,
            json: false,
        })
        .expect_err("must reject");
        assert!(err.starts_with("--parameter"), "{err}");
    }
}
