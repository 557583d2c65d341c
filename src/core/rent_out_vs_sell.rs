use tracing::debug;

use super::costs::{IncomeModel, RentalCosts, RentalProperty, SpendingModel};
use super::engine::{HouseholdCashFlow, PortfolioTrajectory, grow_portfolio};
use super::error::ScenarioError;
use super::tax::{
    capital_gains_tax, home_capital_gains_tax, monthly_investment_return_rate, years_elapsed,
};
use super::types::{
    MAX_HORIZON_YEARS, RentOutMonth, RentOutScenario, RentOutVsSellAnalysis, RentOutVsSellAssumptions,
    RentOutVsSellInputs, RentOutVsSellMonth, RentOutVsSellSummary, SellMonth, SellScenario, Winner,
};

const PROPERTY_VALUE_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct RentOutProjection {
    pub months: Vec<RentOutMonth>,
    pub portfolio_capital_gains_tax: f64,
    // The property is never sold on this side, so no gain is recognised.
    pub property_capital_gains_tax: f64,
}

#[derive(Debug, Clone)]
pub struct SellProjection {
    pub months: Vec<SellMonth>,
    pub portfolio_capital_gains_tax: f64,
    pub property_capital_gains_tax: f64,
    pub sale: SaleProceeds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleProceeds {
    pub sale_price: f64,
    pub selling_costs: f64,
    pub capital_gains_tax: f64,
}

impl SaleProceeds {
    pub fn net(&self) -> f64 {
        self.sale_price - self.selling_costs - self.capital_gains_tax
    }
}

#[derive(Debug, Clone)]
pub struct RentOutVsSellCalculator {
    rent_out: RentOutScenario,
    sell: SellScenario,
    assumptions: RentOutVsSellAssumptions,
}

impl RentOutVsSellCalculator {
    pub fn new(
        rent_out: RentOutScenario,
        sell: SellScenario,
        assumptions: RentOutVsSellAssumptions,
    ) -> Result<Self, ScenarioError> {
        validate(&rent_out, &sell, &assumptions)?;
        if (rent_out.current_property_value - sell.current_property_value).abs()
            > PROPERTY_VALUE_TOLERANCE
        {
            return Err(ScenarioError::InconsistentScenario {
                rent_out_value: rent_out.current_property_value,
                sell_value: sell.current_property_value,
            });
        }

        Ok(Self {
            rent_out,
            sell,
            assumptions,
        })
    }

    pub fn from_inputs(inputs: RentOutVsSellInputs) -> Result<Self, ScenarioError> {
        Self::new(inputs.rent_out, inputs.sell, inputs.assumptions)
    }

    pub fn rent_out(&self) -> &RentOutScenario {
        &self.rent_out
    }

    pub fn sell(&self) -> &SellScenario {
        &self.sell
    }

    pub fn assumptions(&self) -> &RentOutVsSellAssumptions {
        &self.assumptions
    }

    fn income(&self) -> IncomeModel {
        IncomeModel {
            base_annual_income: self.assumptions.income,
            annual_growth_rate: self.assumptions.income_growth_rate,
        }
    }

    fn spending(&self) -> SpendingModel {
        SpendingModel {
            annual_spending: self.assumptions.annual_non_housing_spending,
            inflation_rate: self.assumptions.inflation_rate,
        }
    }

    fn monthly_return(&self) -> f64 {
        monthly_investment_return_rate(self.assumptions.investment_return_rate)
    }

    pub fn new_rent_costs(&self) -> RentalCosts {
        RentalCosts {
            monthly_rent: self.assumptions.new_monthly_rent,
            rent_increase_rate: self.assumptions.new_rent_increase_rate,
            insurance_monthly: self.assumptions.new_renters_insurance_monthly,
            inflation_rate: self.assumptions.inflation_rate,
        }
    }

    pub fn rental_property(&self) -> RentalProperty<'_> {
        RentalProperty {
            scenario: &self.rent_out,
            inflation_rate: self.assumptions.inflation_rate,
        }
    }

    // Sale at the start of the horizon, taxed against the original purchase
    // price after the exclusion.
    pub fn sale_proceeds(&self) -> SaleProceeds {
        let sale_price = self.sell.current_property_value;
        SaleProceeds {
            sale_price,
            selling_costs: sale_price * self.sell.selling_cost_pct,
            capital_gains_tax: home_capital_gains_tax(
                sale_price,
                self.sell.original_purchase_price,
                self.sell.capital_gains_exclusion,
                self.assumptions.investment_tax_enabled,
                self.assumptions.filing_status,
            ),
        }
    }

    pub fn rent_out_portfolio(&self) -> PortfolioTrajectory {
        let rent = self.new_rent_costs();
        let property = self.rental_property();
        let household = HouseholdCashFlow {
            income: self.income(),
            spending: self.spending(),
            housing: &rent,
            secondary: Some(&property),
        };
        grow_portfolio(
            self.assumptions.starting_net_worth,
            self.monthly_return(),
            self.assumptions.horizon_months(),
            &household,
        )
    }

    pub fn sell_portfolio(&self) -> PortfolioTrajectory {
        let rent = self.new_rent_costs();
        let household = HouseholdCashFlow {
            income: self.income(),
            spending: self.spending(),
            housing: &rent,
            secondary: None,
        };
        grow_portfolio(
            self.assumptions.starting_net_worth + self.sale_proceeds().net(),
            self.monthly_return(),
            self.assumptions.horizon_months(),
            &household,
        )
    }

    // One record per simulated month, holding the balance after that
    // month's cash flow.
    pub fn rent_out_net_worth(&self) -> RentOutProjection {
        let portfolio = self.rent_out_portfolio();
        let property = self.rental_property();
        let income = self.income();
        let final_month = portfolio.months().saturating_sub(1);

        let mut months = Vec::with_capacity(portfolio.months());
        let mut portfolio_capital_gains_tax = 0.0;

        for (idx, flow) in portfolio.cash_flows.iter().enumerate() {
            let month = idx as u32;
            let raw_value = portfolio.values[idx + 1];
            let property_value = property.property_value(month);
            let mut portfolio_value = raw_value;

            if idx == final_month {
                portfolio_capital_gains_tax = capital_gains_tax(
                    raw_value,
                    portfolio.initial(),
                    self.assumptions.investment_tax_enabled,
                    self.assumptions.filing_status,
                );
                portfolio_value -= portfolio_capital_gains_tax;
            }

            months.push(RentOutMonth {
                month,
                year: years_elapsed(month),
                portfolio_value,
                property_value,
                total_net_worth: portfolio_value + property_value,
                gross_income: income.gross(month),
                after_tax_income: flow.after_tax_income,
                net_rental_income: flow.secondary_income,
                new_rent_costs: flow.housing_cost,
                non_housing_cost: flow.non_housing_spending,
                excess_cash_flow: flow.net(),
            });
        }

        RentOutProjection {
            months,
            portfolio_capital_gains_tax,
            property_capital_gains_tax: 0.0,
        }
    }

    pub fn sell_net_worth(&self) -> SellProjection {
        let sale = self.sale_proceeds();
        let portfolio = self.sell_portfolio();
        let income = self.income();
        let final_month = portfolio.months().saturating_sub(1);

        let mut months = Vec::with_capacity(portfolio.months());
        let mut portfolio_capital_gains_tax = 0.0;

        for (idx, flow) in portfolio.cash_flows.iter().enumerate() {
            let month = idx as u32;
            let raw_value = portfolio.values[idx + 1];
            let mut portfolio_value = raw_value;

            if idx == final_month {
                portfolio_capital_gains_tax = capital_gains_tax(
                    raw_value,
                    portfolio.initial(),
                    self.assumptions.investment_tax_enabled,
                    self.assumptions.filing_status,
                );
                portfolio_value -= portfolio_capital_gains_tax;
            }

            months.push(SellMonth {
                month,
                year: years_elapsed(month),
                portfolio_value,
                total_net_worth: portfolio_value,
                gross_income: income.gross(month),
                after_tax_income: flow.after_tax_income,
                new_rent_costs: flow.housing_cost,
                non_housing_cost: flow.non_housing_spending,
                excess_cash_flow: flow.net(),
            });
        }

        SellProjection {
            months,
            portfolio_capital_gains_tax,
            property_capital_gains_tax: sale.capital_gains_tax,
            sale,
        }
    }

    pub fn run_analysis(&self) -> RentOutVsSellAnalysis {
        let (rent_out, sell) = rayon::join(|| self.rent_out_net_worth(), || self.sell_net_worth());

        let monthly_comparison = compare_months(&rent_out.months, &sell.months);
        let summary = self.summarize(&rent_out, &sell, &monthly_comparison);
        debug!(
            rent_out = summary.final_rent_out_net_worth,
            sell = summary.final_sell_net_worth,
            winner = %summary.final_winner,
            "rent out vs sell analysis complete"
        );

        RentOutVsSellAnalysis {
            rent_out: rent_out.months,
            sell: sell.months,
            monthly_comparison,
            summary,
        }
    }

    fn summarize(
        &self,
        rent_out: &RentOutProjection,
        sell: &SellProjection,
        comparison: &[RentOutVsSellMonth],
    ) -> RentOutVsSellSummary {
        let last = &comparison[comparison.len() - 1];
        let final_net_worth_difference_pct = (last.sell_net_worth != 0.0)
            .then(|| last.net_worth_difference / last.sell_net_worth * 100.0);

        RentOutVsSellSummary {
            time_horizon_years: self.assumptions.time_horizon_years,
            final_rent_out_net_worth: last.rent_out_net_worth,
            final_sell_net_worth: last.sell_net_worth,
            final_net_worth_difference: last.net_worth_difference,
            final_net_worth_difference_pct,
            final_winner: last.winner,
            rent_out_portfolio_capital_gains_tax: rent_out.portfolio_capital_gains_tax,
            rent_out_property_capital_gains_tax: rent_out.property_capital_gains_tax,
            sell_portfolio_capital_gains_tax: sell.portfolio_capital_gains_tax,
            sell_property_capital_gains_tax: sell.property_capital_gains_tax,
            rent_out_final_portfolio_value: last.rent_out_portfolio_value,
            rent_out_final_property_value: last.rent_out_property_value,
            sell_final_portfolio_value: last.sell_portfolio_value,
            sell_selling_costs: sell.sale.selling_costs,
            sell_net_proceeds: sell.sale.net(),
        }
    }
}

fn validate(
    rent_out: &RentOutScenario,
    sell: &SellScenario,
    assumptions: &RentOutVsSellAssumptions,
) -> Result<(), ScenarioError> {
    if assumptions.time_horizon_years == 0 {
        return Err(ScenarioError::InvalidInput(
            "time_horizon_years must be > 0".to_string(),
        ));
    }
    if assumptions.time_horizon_years > MAX_HORIZON_YEARS {
        return Err(ScenarioError::InvalidInput(format!(
            "time_horizon_years must be <= {MAX_HORIZON_YEARS}"
        )));
    }

    let values = [
        ("rent_out_current_property_value", rent_out.current_property_value),
        ("sell_current_property_value", sell.current_property_value),
        ("monthly_rental_income", rent_out.monthly_rental_income),
        ("rental_income_growth_rate", rent_out.rental_income_growth_rate),
        ("property_management_fee_pct", rent_out.property_management_fee_pct),
        ("vacancy_rate", rent_out.vacancy_rate),
        ("rental_property_tax_rate", rent_out.rental_property_tax_rate),
        ("rental_maintenance_cost_pct", rent_out.rental_maintenance_cost_pct),
        ("rental_insurance_monthly", rent_out.rental_insurance_monthly),
        ("rental_appreciation_rate", rent_out.rental_appreciation_rate),
        ("selling_cost_pct", sell.selling_cost_pct),
        ("capital_gains_exclusion", sell.capital_gains_exclusion),
        ("original_purchase_price", sell.original_purchase_price),
        ("income", assumptions.income),
        ("inflation_rate", assumptions.inflation_rate),
        ("investment_return_rate", assumptions.investment_return_rate),
        ("income_growth_rate", assumptions.income_growth_rate),
        ("starting_net_worth", assumptions.starting_net_worth),
        ("annual_non_housing_spending", assumptions.annual_non_housing_spending),
        ("new_monthly_rent", assumptions.new_monthly_rent),
        ("new_rent_increase_rate", assumptions.new_rent_increase_rate),
        ("new_renters_insurance_monthly", assumptions.new_renters_insurance_monthly),
    ];
    for (name, value) in values {
        if !value.is_finite() {
            return Err(ScenarioError::InvalidInput(format!("{name} must be finite")));
        }
    }

    if assumptions.investment_return_rate <= -1.0 {
        return Err(ScenarioError::InvalidInput(
            "investment_return_rate must be > -100%".to_string(),
        ));
    }
    Ok(())
}

fn compare_months(rent_out: &[RentOutMonth], sell: &[SellMonth]) -> Vec<RentOutVsSellMonth> {
    rent_out
        .iter()
        .zip(sell)
        .map(|(owner, other)| {
            let difference = owner.total_net_worth - other.total_net_worth;
            RentOutVsSellMonth {
                month: owner.month,
                rent_out_portfolio_value: owner.portfolio_value,
                rent_out_property_value: owner.property_value,
                rent_out_net_worth: owner.total_net_worth,
                sell_portfolio_value: other.portfolio_value,
                sell_net_worth: other.total_net_worth,
                net_worth_difference: difference,
                winner: if difference > 0.0 {
                    Winner::RentOut
                } else {
                    Winner::Sell
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FilingStatus;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_rent_out() -> RentOutScenario {
        RentOutScenario {
            current_property_value: 800_000.0,
            monthly_rental_income: 4_000.0,
            rental_income_growth_rate: 0.03,
            property_management_fee_pct: 0.08,
            vacancy_rate: 0.05,
            rental_property_tax_rate: 0.0085,
            rental_maintenance_cost_pct: 0.01,
            rental_insurance_monthly: 200.0,
            rental_appreciation_rate: 0.04,
        }
    }

    fn sample_sell() -> SellScenario {
        SellScenario {
            current_property_value: 800_000.0,
            selling_cost_pct: 0.06,
            capital_gains_exclusion: 500_000.0,
            original_purchase_price: 600_000.0,
        }
    }

    fn sample_assumptions() -> RentOutVsSellAssumptions {
        RentOutVsSellAssumptions {
            income: 350_000.0,
            time_horizon_years: 10,
            investment_tax_enabled: true,
            filing_status: FilingStatus::MarriedFilingJointly,
            inflation_rate: 0.025,
            investment_return_rate: 0.09,
            income_growth_rate: 0.05,
            starting_net_worth: 200_000.0,
            annual_non_housing_spending: 73_000.0,
            new_monthly_rent: 3_500.0,
            new_rent_increase_rate: 0.03,
            new_renters_insurance_monthly: 25.0,
        }
    }

    fn sample_calculator() -> RentOutVsSellCalculator {
        RentOutVsSellCalculator::new(sample_rent_out(), sample_sell(), sample_assumptions())
            .expect("valid scenario")
    }

    #[test]
    fn rejects_mismatched_property_values() {
        let mut sell = sample_sell();
        sell.current_property_value = 801_500.0;
        let err = RentOutVsSellCalculator::new(sample_rent_out(), sell, sample_assumptions())
            .expect_err("values differ by more than a dollar");
        assert!(matches!(err, ScenarioError::InconsistentScenario { .. }));
    }

    #[test]
    fn tolerates_sub_dollar_property_value_difference() {
        let mut sell = sample_sell();
        sell.current_property_value = 800_000.75;
        assert!(RentOutVsSellCalculator::new(sample_rent_out(), sell, sample_assumptions()).is_ok());
    }

    #[test]
    fn rejects_non_finite_sell_property_value() {
        let mut sell = sample_sell();
        sell.current_property_value = f64::NAN;
        let err = RentOutVsSellCalculator::new(sample_rent_out(), sell, sample_assumptions())
            .expect_err("NaN sale value");
        assert!(matches!(err, ScenarioError::InvalidInput(_)), "{err}");
    }

    #[test]
    fn rejects_horizon_beyond_cap() {
        let mut assumptions = sample_assumptions();
        assumptions.time_horizon_years = u32::MAX;
        let err = RentOutVsSellCalculator::new(sample_rent_out(), sample_sell(), assumptions)
            .expect_err("horizon too long");
        assert!(matches!(err, ScenarioError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_horizon() {
        let mut assumptions = sample_assumptions();
        assumptions.time_horizon_years = 0;
        let err = RentOutVsSellCalculator::new(sample_rent_out(), sample_sell(), assumptions)
            .expect_err("nothing to simulate");
        assert!(matches!(err, ScenarioError::InvalidInput(_)));
    }

    #[test]
    fn sale_proceeds_fold_into_sell_side_portfolio() {
        let calculator = sample_calculator();
        let sale = calculator.sale_proceeds();
        // 200k gain is fully covered by the 500k exclusion.
        assert_approx(sale.capital_gains_tax, 0.0);
        assert_approx(sale.selling_costs, 48_000.0);
        assert_approx(calculator.sell_portfolio().initial(), 200_000.0 + 752_000.0);
        assert_approx(calculator.rent_out_portfolio().initial(), 200_000.0);
    }

    #[test]
    fn sale_gain_above_exclusion_is_taxed_at_month_zero() {
        let mut sell = sample_sell();
        sell.capital_gains_exclusion = 0.0;
        sell.original_purchase_price = 400_000.0;
        let calculator =
            RentOutVsSellCalculator::new(sample_rent_out(), sell, sample_assumptions())
                .expect("valid scenario");
        let analysis = calculator.run_analysis();
        assert_approx(analysis.summary.sell_property_capital_gains_tax, 400_000.0 * 0.15);
        assert_approx(analysis.summary.rent_out_property_capital_gains_tax, 0.0);
        assert_approx(
            analysis.summary.sell_net_proceeds,
            800_000.0 - 48_000.0 - 60_000.0,
        );
    }

    #[test]
    fn records_cover_each_simulated_month() {
        let analysis = sample_calculator().run_analysis();
        assert_eq!(analysis.rent_out.len(), 120);
        assert_eq!(analysis.sell.len(), 120);
        assert_eq!(analysis.monthly_comparison.len(), 120);
        assert_eq!(analysis.rent_out[119].month, 119);
        assert_eq!(analysis.rent_out[119].year, 9);
    }

    #[test]
    fn rent_out_records_hold_post_transition_balances() {
        let calculator = sample_calculator();
        let raw = calculator.rent_out_portfolio();
        let projection = calculator.rent_out_net_worth();
        for (idx, row) in projection.months.iter().enumerate().take(119) {
            assert_approx(row.portfolio_value, raw.values[idx + 1]);
            assert_approx(row.total_net_worth, row.portfolio_value + row.property_value);
            assert_approx(
                row.excess_cash_flow,
                row.after_tax_income + row.net_rental_income - row.new_rent_costs - row.non_housing_cost,
            );
        }
        assert_approx(
            projection.months[119].portfolio_value,
            raw.terminal() - projection.portfolio_capital_gains_tax,
        );
        assert_approx(projection.months[0].property_value, 800_000.0);
        assert_approx(projection.months[12].property_value, 832_000.0);
    }

    #[test]
    fn net_rental_income_matches_property_model() {
        let calculator = sample_calculator();
        let property = calculator.rental_property();
        let projection = calculator.rent_out_net_worth();
        for row in projection.months.iter().step_by(13) {
            assert_approx(row.net_rental_income, property.net_rental_income(row.month));
        }
    }

    #[test]
    fn summary_percentage_is_relative_to_sell_side() {
        let analysis = sample_calculator().run_analysis();
        let summary = &analysis.summary;
        let pct = summary
            .final_net_worth_difference_pct
            .expect("sell side is non-zero");
        assert_approx(
            pct,
            summary.final_net_worth_difference / summary.final_sell_net_worth * 100.0,
        );
        assert_approx(
            summary.final_net_worth_difference,
            summary.final_rent_out_net_worth - summary.final_sell_net_worth,
        );
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_winner_is_strictly_rent_out_when_ahead(
            rental_income in 0u32..10_000,
            appreciation_bp in -200i32..900,
            return_bp in -300i32..1_400,
            years in 1u32..21
        ) {
            let mut rent_out = sample_rent_out();
            rent_out.monthly_rental_income = rental_income as f64;
            rent_out.rental_appreciation_rate = appreciation_bp as f64 / 10_000.0;
            let mut assumptions = sample_assumptions();
            assumptions.investment_return_rate = return_bp as f64 / 10_000.0;
            assumptions.time_horizon_years = years;

            let calculator = RentOutVsSellCalculator::new(rent_out, sample_sell(), assumptions)
                .expect("valid scenario");
            let analysis = calculator.run_analysis();
            prop_assert!(analysis.monthly_comparison.len() == (years * 12) as usize);
            for row in &analysis.monthly_comparison {
                let expected = if row.net_worth_difference > 0.0 { Winner::RentOut } else { Winner::Sell };
                prop_assert!(row.winner == expected);
            }
            let last = analysis.sell.len() - 1;
            for (idx, row) in analysis.sell.iter().enumerate().take(last) {
                let raw = calculator.sell_portfolio().values[idx + 1];
                prop_assert!((row.portfolio_value - raw).abs() < 1e-6);
            }
        }
    }
}
