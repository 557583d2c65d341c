use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::{
    BreakevenPoint, BreakevenSolveResult, HomeownerMonth, ParameterSweep, RentOutMonth,
    RentOutVsSellAnalysis, RentOutVsSellInputs, RentVsBuyAnalysis, RentVsBuyInputs, RenterMonth,
    SellMonth, SensitivityRank, SweepParameter, TerminalOutcome,
};

pub const HOMEOWNER_CSV: &str = "homeowner_monthly_analysis.csv";
pub const RENTER_CSV: &str = "renter_monthly_analysis.csv";
pub const RENT_OUT_CSV: &str = "rent_out_monthly_analysis.csv";
pub const SELL_CSV: &str = "sell_monthly_analysis.csv";

const TOP_SENSITIVITIES: usize = 10;

fn cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// Whole dollars with thousands separators, e.g. `$1,234,567` or `-$950`.
pub fn money(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn percent(fraction: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, fraction * 100.0)
}

fn parameter_value<P: SweepParameter>(parameter: P, value: f64) -> String {
    if parameter.is_rate() {
        percent(value, 2)
    } else if parameter.is_years() {
        format!("{value:.0} years")
    } else {
        money(value)
    }
}

fn title(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn line(label: &str, value: impl std::fmt::Display) {
    println!("{:<32}{value}", format!("{label}:"));
}

pub fn print_rent_vs_buy(inputs: &RentVsBuyInputs, analysis: &RentVsBuyAnalysis) {
    let buy = &inputs.buy;
    let rent = &inputs.rent;
    let a = &inputs.assumptions;
    let s = &analysis.summary;

    println!("=== RENT VS BUY ANALYSIS ===");
    println!();
    println!("=== BUY SCENARIO ===");
    line("Purchase Price", money(buy.purchase_price));
    line(
        "Down Payment",
        format!("{} ({})", percent(buy.down_payment_pct, 1), money(buy.down_payment())),
    );
    line("Mortgage Rate", percent(buy.mortgage_rate, 2));
    line("Amortization", format!("{} years", buy.amortization_years));
    line("Monthly Mortgage Payment", money(s.mortgage_payment));
    line("Property Tax Rate", percent(buy.property_tax_rate, 2));
    line("Maintenance Cost", percent(buy.maintenance_cost_pct, 2));
    line("Home Insurance", format!("{}/month", money(buy.home_insurance_monthly)));
    line("HOA Fees", format!("{}/month", money(buy.hoa_monthly)));
    line("Home Appreciation Rate", percent(buy.home_appreciation_rate, 2));
    line("Selling Cost", percent(buy.selling_cost_pct, 1));
    line("Primary Home Exclusion", money(buy.primary_home_exclusion_dollars));
    println!();
    println!("=== RENT SCENARIO ===");
    line("Monthly Rent", money(rent.monthly_rent));
    line("Renters Insurance", format!("{}/month", money(rent.renters_insurance_monthly)));
    line("Rent Increase Rate", percent(rent.rent_increase_rate, 2));
    println!();
    println!("=== ASSUMPTIONS ===");
    line("Annual Income", money(a.income));
    line("Annual Non-Housing Spending", money(a.annual_non_housing_spending));
    line("Time Horizon", format!("{} years", a.time_horizon_years));
    line("Investment Tax Enabled", a.investment_tax_enabled);
    line("Filing Status", a.filing_status);
    line("Inflation Rate", percent(a.inflation_rate, 2));
    line("Investment Return Rate", percent(a.investment_return_rate, 1));
    line("Income Growth Rate", percent(a.income_growth_rate, 1));
    line("Starting Net Worth", money(a.starting_net_worth));
    println!();
    println!("=== RESULTS ===");
    line("Final Winner", s.final_winner);
    line("Homeowner Net Worth", money(s.final_homeowner_net_worth));
    line("Renter Net Worth", money(s.final_renter_net_worth));
    line("Net Worth Difference", money(s.final_net_worth_difference));
    line("Avg Monthly Ownership Cost", money(s.avg_monthly_ownership_cost));
    line("Avg Monthly Rent Cost", money(s.avg_monthly_rent_cost));
    line("Monthly Cash Flow Difference", money(s.monthly_cash_flow_difference));
    println!();
    println!("=== HOMEOWNER BREAKDOWN ===");
    line("Final Portfolio Value", money(s.homeowner_final_portfolio_value));
    line("Final Home Equity", money(s.homeowner_final_home_equity));
    line("Total Net Worth", money(s.final_homeowner_net_worth));
    line("Selling Costs", money(s.homeowner_selling_costs));
    line("Capital Gains Tax on Portfolio", money(s.homeowner_capital_gains_tax_portfolio));
    line("Capital Gains Tax on Home Sale", money(s.homeowner_capital_gains_tax_home));
    println!();
    println!("=== RENTER BREAKDOWN ===");
    line("Final Portfolio Value", money(s.final_renter_net_worth));
    line("Capital Gains Tax on Portfolio", money(s.renter_capital_gains_tax_paid));
    println!();
    println!("Total months analyzed: {}", analysis.monthly_comparison.len());
}

pub fn print_rent_out_vs_sell(inputs: &RentOutVsSellInputs, analysis: &RentOutVsSellAnalysis) {
    let r = &inputs.rent_out;
    let sell = &inputs.sell;
    let a = &inputs.assumptions;
    let s = &analysis.summary;

    println!("=== RENT OUT VS SELL ANALYSIS ===");
    println!();
    println!("=== RENT OUT SCENARIO ===");
    line("Current Property Value", money(r.current_property_value));
    line("Monthly Rental Income", money(r.monthly_rental_income));
    line("Rental Income Growth Rate", percent(r.rental_income_growth_rate, 2));
    line("Property Management Fee", percent(r.property_management_fee_pct, 1));
    line("Vacancy Rate", percent(r.vacancy_rate, 1));
    line("Property Tax Rate", percent(r.rental_property_tax_rate, 2));
    line("Maintenance Cost", percent(r.rental_maintenance_cost_pct, 2));
    line("Landlord Insurance", format!("{}/month", money(r.rental_insurance_monthly)));
    line("Property Appreciation Rate", percent(r.rental_appreciation_rate, 2));
    println!();
    println!("=== SELL SCENARIO ===");
    line("Current Property Value", money(sell.current_property_value));
    line("Selling Cost", percent(sell.selling_cost_pct, 1));
    line("Capital Gains Exclusion", money(sell.capital_gains_exclusion));
    line("Original Purchase Price", money(sell.original_purchase_price));
    println!();
    println!("=== ASSUMPTIONS ===");
    line("Annual Income", money(a.income));
    line("Annual Non-Housing Spending", money(a.annual_non_housing_spending));
    line("New Monthly Rent", money(a.new_monthly_rent));
    line("New Rent Increase Rate", percent(a.new_rent_increase_rate, 2));
    line("Time Horizon", format!("{} years", a.time_horizon_years));
    line("Investment Tax Enabled", a.investment_tax_enabled);
    line("Filing Status", a.filing_status);
    line("Inflation Rate", percent(a.inflation_rate, 2));
    line("Investment Return Rate", percent(a.investment_return_rate, 1));
    line("Income Growth Rate", percent(a.income_growth_rate, 1));
    line("Starting Net Worth", money(a.starting_net_worth));
    println!();
    println!("=== RESULTS ===");
    line("Final Winner", s.final_winner);
    line("Rent Out Net Worth", money(s.final_rent_out_net_worth));
    line("Sell Net Worth", money(s.final_sell_net_worth));
    line("Net Worth Difference", money(s.final_net_worth_difference));
    if let Some(pct) = s.final_net_worth_difference_pct {
        line("Net Worth Difference (%)", format!("{pct:+.1}%"));
    }
    println!();
    println!("=== RENT OUT BREAKDOWN ===");
    line("Final Portfolio Value", money(s.rent_out_final_portfolio_value));
    line("Final Property Value", money(s.rent_out_final_property_value));
    line("Total Net Worth", money(s.final_rent_out_net_worth));
    line("Portfolio Capital Gains Tax", money(s.rent_out_portfolio_capital_gains_tax));
    println!();
    println!("=== SELL BREAKDOWN ===");
    line("Net Sale Proceeds", money(s.sell_net_proceeds));
    line("Selling Costs", money(s.sell_selling_costs));
    line("Final Portfolio Value", money(s.sell_final_portfolio_value));
    line("Total Net Worth", money(s.final_sell_net_worth));
    line("Portfolio Capital Gains Tax", money(s.sell_portfolio_capital_gains_tax));
    line("Property Capital Gains Tax", money(s.sell_property_capital_gains_tax));
    println!();
    println!(
        "Analysis complete for {} year time horizon",
        s.time_horizon_years
    );
}

pub fn print_sensitivity_summary<P: SweepParameter>(
    base: &TerminalOutcome,
    ranking: &[SensitivityRank<P>],
    breakevens: &[BreakevenPoint<P>],
) {
    println!("=== SENSITIVITY ANALYSIS SUMMARY ===");
    line("Base Case Net Worth Difference", money(base.net_worth_difference));
    line("Base Case Winner", base.winner);
    println!();
    println!("Most Sensitive Parameters (by net worth impact):");
    for (i, rank) in ranking.iter().take(TOP_SENSITIVITIES).enumerate() {
        println!(
            "{:2}. {}: {} range",
            i + 1,
            title(&rank.parameter.to_string()),
            money(rank.spread)
        );
        if rank.winner_changes() {
            let winners: Vec<String> = rank.winners.iter().map(|w| w.to_string()).collect();
            println!("    Winner changes across range: {}", winners.join(", "));
        }
    }
    if !breakevens.is_empty() {
        println!();
        println!("Breakeven Points:");
        for point in breakevens {
            println!(
                "  {}: {} ({} difference)",
                title(&point.parameter.to_string()),
                parameter_value(point.parameter, point.value),
                money(point.net_worth_difference)
            );
        }
    }
}

pub fn print_sweep_details<P: SweepParameter>(sweeps: &[ParameterSweep<P>]) {
    println!();
    println!("=== DETAILED SENSITIVITY RESULTS ===");
    for sweep in sweeps {
        println!();
        println!("{} Impact:", title(&sweep.parameter.to_string()));
        println!(
            "Base value: {}",
            parameter_value(sweep.parameter, sweep.base_value)
        );
        for point in &sweep.points {
            println!(
                "  {}: {} difference ({} wins)",
                parameter_value(sweep.parameter, point.parameter_value),
                money(point.outcome.net_worth_difference),
                point.outcome.winner
            );
        }
        if sweep.skipped > 0 {
            println!("  ({} values skipped as infeasible)", sweep.skipped);
        }
    }
}

pub fn print_breakeven_solve<P: SweepParameter>(result: &BreakevenSolveResult<P>) {
    println!("=== BREAKEVEN SOLVE ===");
    line("Parameter", title(&result.parameter.to_string()));
    line(
        "Search Range",
        format!(
            "{} to {}",
            parameter_value(result.parameter, result.search_min),
            parameter_value(result.parameter, result.search_max)
        ),
    );
    line("Iterations", result.iterations.len());
    if let Some(value) = result.solved_value {
        line("Breakeven Value", parameter_value(result.parameter, value));
    }
    if let Some(diff) = result.net_worth_difference {
        line("Net Worth Difference", money(diff));
    }
    println!("{}", result.message);
}

#[derive(Serialize)]
struct HomeownerCsvRow {
    month: u32,
    year: u32,
    networth: f64,
    gross_income: f64,
    after_tax_income: f64,
    portfolio_value: f64,
    portfolio_gain: f64,
    home_equity: f64,
    home_value: f64,
    remaining_mortgage_balance: f64,
    cost_mortgage: f64,
    monthly_property_tax: f64,
    monthly_maintenance: f64,
    home_insurance: f64,
    hoa_fees: f64,
    non_housing_cost: f64,
}

impl From<&HomeownerMonth> for HomeownerCsvRow {
    fn from(m: &HomeownerMonth) -> Self {
        Self {
            month: m.month,
            year: m.year,
            networth: cents(m.total_net_worth),
            gross_income: cents(m.gross_income),
            after_tax_income: cents(m.after_tax_income),
            portfolio_value: cents(m.portfolio_value),
            portfolio_gain: cents(m.portfolio_gain),
            home_equity: cents(m.home_equity),
            home_value: cents(m.home_value),
            remaining_mortgage_balance: cents(m.remaining_mortgage_balance),
            cost_mortgage: cents(m.cost_mortgage),
            monthly_property_tax: cents(m.monthly_property_tax),
            monthly_maintenance: cents(m.monthly_maintenance),
            home_insurance: cents(m.home_insurance),
            hoa_fees: cents(m.hoa_fees),
            non_housing_cost: cents(m.non_housing_cost),
        }
    }
}

#[derive(Serialize)]
struct RenterCsvRow {
    month: u32,
    year: u32,
    networth: f64,
    gross_income: f64,
    after_tax_income: f64,
    portfolio_value: f64,
    portfolio_gain: f64,
    cost_rent: f64,
    cost_insurance: f64,
    non_housing_cost: f64,
}

impl From<&RenterMonth> for RenterCsvRow {
    fn from(m: &RenterMonth) -> Self {
        Self {
            month: m.month,
            year: m.year,
            networth: cents(m.total_net_worth),
            gross_income: cents(m.gross_income),
            after_tax_income: cents(m.after_tax_income),
            portfolio_value: cents(m.portfolio_value),
            portfolio_gain: cents(m.portfolio_gain),
            cost_rent: cents(m.cost_rent),
            cost_insurance: cents(m.cost_insurance),
            non_housing_cost: cents(m.non_housing_cost),
        }
    }
}

#[derive(Serialize)]
struct RentOutCsvRow {
    month: u32,
    year: u32,
    networth: f64,
    gross_income: f64,
    after_tax_income: f64,
    portfolio_value: f64,
    property_value: f64,
    net_rental_income: f64,
    new_rent_costs: f64,
    non_housing_cost: f64,
    excess_cash_flow: f64,
}

impl From<&RentOutMonth> for RentOutCsvRow {
    fn from(m: &RentOutMonth) -> Self {
        Self {
            month: m.month,
            year: m.year,
            networth: cents(m.total_net_worth),
            gross_income: cents(m.gross_income),
            after_tax_income: cents(m.after_tax_income),
            portfolio_value: cents(m.portfolio_value),
            property_value: cents(m.property_value),
            net_rental_income: cents(m.net_rental_income),
            new_rent_costs: cents(m.new_rent_costs),
            non_housing_cost: cents(m.non_housing_cost),
            excess_cash_flow: cents(m.excess_cash_flow),
        }
    }
}

#[derive(Serialize)]
struct SellCsvRow {
    month: u32,
    year: u32,
    networth: f64,
    gross_income: f64,
    after_tax_income: f64,
    portfolio_value: f64,
    new_rent_costs: f64,
    non_housing_cost: f64,
    excess_cash_flow: f64,
}

impl From<&SellMonth> for SellCsvRow {
    fn from(m: &SellMonth) -> Self {
        Self {
            month: m.month,
            year: m.year,
            networth: cents(m.total_net_worth),
            gross_income: cents(m.gross_income),
            after_tax_income: cents(m.after_tax_income),
            portfolio_value: cents(m.portfolio_value),
            new_rent_costs: cents(m.new_rent_costs),
            non_housing_cost: cents(m.non_housing_cost),
            excess_cash_flow: cents(m.excess_cash_flow),
        }
    }
}

fn write_rows<'a, M: 'a, R>(path: &Path, months: &'a [M]) -> Result<(), csv::Error>
where
    R: Serialize + From<&'a M>,
{
    let mut writer = csv::Writer::from_path(path)?;
    for month in months {
        writer.serialize(R::from(month))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_rent_vs_buy_csv(
    dir: &Path,
    analysis: &RentVsBuyAnalysis,
) -> Result<Vec<PathBuf>, csv::Error> {
    let homeowner = dir.join(HOMEOWNER_CSV);
    let renter = dir.join(RENTER_CSV);
    write_rows::<_, HomeownerCsvRow>(&homeowner, &analysis.homeowner)?;
    write_rows::<_, RenterCsvRow>(&renter, &analysis.renter)?;
    Ok(vec![homeowner, renter])
}

pub fn write_rent_out_vs_sell_csv(
    dir: &Path,
    analysis: &RentOutVsSellAnalysis,
) -> Result<Vec<PathBuf>, csv::Error> {
    let rent_out = dir.join(RENT_OUT_CSV);
    let sell = dir.join(SELL_CSV);
    write_rows::<_, RentOutCsvRow>(&rent_out, &analysis.rent_out)?;
    write_rows::<_, SellCsvRow>(&sell, &analysis.sell)?;
    Ok(vec![rent_out, sell])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        Assumptions, BuyScenario, FilingStatus, RentScenario, RentVsBuyCalculator,
        RentVsBuyParameter,
    };
    use std::fs;

    fn sample_analysis() -> RentVsBuyAnalysis {
        let calculator = RentVsBuyCalculator::new(
            BuyScenario {
                purchase_price: 700_000.0,
                down_payment_pct: 0.20,
                mortgage_rate: 0.0425,
                amortization_years: 30,
                property_tax_rate: 0.0085,
                maintenance_cost_pct: 0.002,
                home_insurance_monthly: 0.0,
                hoa_monthly: 550.0,
                home_appreciation_rate: 0.04,
                selling_cost_pct: 0.06,
                primary_home_exclusion_dollars: 500_000.0,
            },
            RentScenario {
                monthly_rent: 2_500.0,
                renters_insurance_monthly: 0.0,
                rent_increase_rate: 0.025,
            },
            Assumptions {
                income: 350_000.0,
                time_horizon_years: 2,
                investment_tax_enabled: true,
                filing_status: FilingStatus::MarriedFilingJointly,
                inflation_rate: 0.025,
                investment_return_rate: 0.09,
                income_growth_rate: 0.05,
                starting_net_worth: 300_000.0,
                annual_non_housing_spending: 73_000.0,
            },
        )
        .expect("valid scenario");
        calculator.run_analysis()
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tenure-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn money_groups_thousands_and_keeps_sign() {
        assert_eq!(money(0.0), "$0");
        assert_eq!(money(999.4), "$999");
        assert_eq!(money(1_234_567.8), "$1,234,568");
        assert_eq!(money(-950.0), "-$950");
        assert_eq!(money(-12_000.0), "-$12,000");
    }

    #[test]
    fn percent_scales_fractions() {
        assert_eq!(percent(0.0425, 2), "4.25%");
        assert_eq!(percent(0.2, 1), "20.0%");
    }

    #[test]
    fn parameter_titles_read_as_words() {
        assert_eq!(
            title(&RentVsBuyParameter::HomeAppreciationRate.to_string()),
            "Home Appreciation Rate"
        );
        assert_eq!(parameter_value(RentVsBuyParameter::MortgageRate, 0.05), "5.00%");
        assert_eq!(parameter_value(RentVsBuyParameter::TimeHorizonYears, 15.0), "15 years");
        assert_eq!(parameter_value(RentVsBuyParameter::MonthlyRent, 2_500.0), "$2,500");
    }

    #[test]
    fn csv_rows_are_rounded_to_cents() {
        let m = RenterMonth {
            month: 3,
            year: 0,
            portfolio_value: 1_234.5678,
            total_net_worth: 1_234.5678,
            portfolio_gain: 0.004,
            gross_income: 10.0,
            after_tax_income: 7.0,
            cost_rent: 2_500.125,
            cost_insurance: 0.0,
            non_housing_cost: 6_083.3333,
        };
        let row = RenterCsvRow::from(&m);
        assert_eq!(row.portfolio_value, 1_234.57);
        assert_eq!(row.portfolio_gain, 0.0);
        assert_eq!(row.non_housing_cost, 6_083.33);
    }

    #[test]
    fn rent_vs_buy_csv_has_one_row_per_record() {
        let analysis = sample_analysis();
        let dir = scratch_dir("rent-vs-buy");
        let written = write_rent_vs_buy_csv(&dir, &analysis).expect("csv written");
        assert_eq!(written.len(), 2);

        let homeowner = fs::read_to_string(dir.join(HOMEOWNER_CSV)).expect("read homeowner csv");
        let mut lines = homeowner.lines();
        let header = lines.next().expect("header");
        assert!(header.starts_with("month,year,networth,gross_income"), "{header}");
        assert_eq!(lines.count(), analysis.homeowner.len());

        let renter = fs::read_to_string(dir.join(RENTER_CSV)).expect("read renter csv");
        assert_eq!(renter.lines().count(), analysis.renter.len() + 1);
        assert!(renter.lines().next().unwrap_or_default().contains("cost_rent"));

        fs::remove_dir_all(&dir).ok();
    }
}
