use tracing::debug;

use super::costs::{IncomeModel, OwnershipCosts, RentalCosts, SpendingModel};
use super::engine::{HouseholdCashFlow, PortfolioTrajectory, grow_portfolio};
use super::error::ScenarioError;
use super::mortgage::Mortgage;
use super::tax::{
    capital_gains_tax, home_capital_gains_tax, monthly_investment_return_rate, portfolio_gain,
    years_elapsed,
};
use super::types::{
    Assumptions, BuyScenario, HomeownerMonth, MAX_HORIZON_YEARS, RentScenario, RentVsBuyAnalysis,
    RentVsBuyInputs, RentVsBuyMonth, RentVsBuySummary, RenterMonth, Winner,
};

#[derive(Debug, Clone)]
pub struct HomeownerProjection {
    pub months: Vec<HomeownerMonth>,
    pub portfolio_capital_gains_tax: f64,
    pub home_capital_gains_tax: f64,
    pub selling_costs: f64,
}

#[derive(Debug, Clone)]
pub struct RenterProjection {
    pub months: Vec<RenterMonth>,
    pub capital_gains_tax: f64,
}

#[derive(Debug, Clone)]
pub struct RentVsBuyCalculator {
    buy: BuyScenario,
    rent: RentScenario,
    assumptions: Assumptions,
    mortgage: Mortgage,
}

impl RentVsBuyCalculator {
    pub fn new(
        buy: BuyScenario,
        rent: RentScenario,
        assumptions: Assumptions,
    ) -> Result<Self, ScenarioError> {
        validate(&buy, &rent, &assumptions)?;

        let down_payment = buy.down_payment();
        if assumptions.starting_net_worth < down_payment {
            return Err(ScenarioError::InsufficientCapital {
                starting_net_worth: assumptions.starting_net_worth,
                required: down_payment,
            });
        }

        let mortgage = Mortgage::originate(
            buy.loan_principal(),
            buy.mortgage_rate,
            buy.amortization_years,
            assumptions.horizon_months(),
        );
        debug!(
            principal = mortgage.principal(),
            payment = mortgage.payment(),
            "originated mortgage"
        );

        Ok(Self {
            buy,
            rent,
            assumptions,
            mortgage,
        })
    }

    pub fn from_inputs(inputs: RentVsBuyInputs) -> Result<Self, ScenarioError> {
        Self::new(inputs.buy, inputs.rent, inputs.assumptions)
    }

    pub fn buy(&self) -> &BuyScenario {
        &self.buy
    }

    pub fn rent(&self) -> &RentScenario {
        &self.rent
    }

    pub fn assumptions(&self) -> &Assumptions {
        &self.assumptions
    }

    pub fn mortgage(&self) -> &Mortgage {
        &self.mortgage
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

    pub fn ownership_costs(&self) -> OwnershipCosts<'_> {
        OwnershipCosts {
            buy: &self.buy,
            mortgage_payment: self.mortgage.payment(),
            inflation_rate: self.assumptions.inflation_rate,
        }
    }

    pub fn rental_costs(&self) -> RentalCosts {
        RentalCosts {
            monthly_rent: self.rent.monthly_rent,
            rent_increase_rate: self.rent.rent_increase_rate,
            insurance_monthly: self.rent.renters_insurance_monthly,
            inflation_rate: self.assumptions.inflation_rate,
        }
    }

    pub fn homeowner_portfolio(&self) -> PortfolioTrajectory {
        let costs = self.ownership_costs();
        let household = HouseholdCashFlow {
            income: self.income(),
            spending: self.spending(),
            housing: &costs,
            secondary: None,
        };
        grow_portfolio(
            self.assumptions.starting_net_worth - self.buy.down_payment(),
            self.monthly_return(),
            self.assumptions.horizon_months(),
            &household,
        )
    }

    pub fn renter_portfolio(&self) -> PortfolioTrajectory {
        let costs = self.rental_costs();
        let household = HouseholdCashFlow {
            income: self.income(),
            spending: self.spending(),
            housing: &costs,
            secondary: None,
        };
        grow_portfolio(
            self.assumptions.starting_net_worth,
            self.monthly_return(),
            self.assumptions.horizon_months(),
            &household,
        )
    }

    pub fn homeowner_net_worth(&self) -> HomeownerProjection {
        let portfolio = self.homeowner_portfolio();
        let costs = self.ownership_costs();
        let income = self.income();
        let spending = self.spending();
        let final_month = portfolio.values.len() - 1;

        let mut months = Vec::with_capacity(portfolio.values.len());
        let mut portfolio_capital_gains_tax = 0.0;
        let mut home_capital_gains_tax_paid = 0.0;
        let mut selling_costs = 0.0;

        for (idx, &raw_value) in portfolio.values.iter().enumerate() {
            let month = idx as u32;
            let breakdown = costs.breakdown(month);
            let remaining_mortgage_balance = self.mortgage.balance_at(month);
            let mut home_equity = breakdown.home_value - remaining_mortgage_balance;
            let mut portfolio_value = raw_value;

            if idx == final_month {
                selling_costs = breakdown.home_value * self.buy.selling_cost_pct;
                home_capital_gains_tax_paid = home_capital_gains_tax(
                    breakdown.home_value,
                    self.buy.purchase_price,
                    self.buy.primary_home_exclusion_dollars,
                    self.assumptions.investment_tax_enabled,
                    self.assumptions.filing_status,
                );
                home_equity -= selling_costs + home_capital_gains_tax_paid;

                portfolio_capital_gains_tax = capital_gains_tax(
                    raw_value,
                    portfolio.initial(),
                    self.assumptions.investment_tax_enabled,
                    self.assumptions.filing_status,
                );
                portfolio_value -= portfolio_capital_gains_tax;
            }

            months.push(HomeownerMonth {
                month,
                year: years_elapsed(month),
                portfolio_value,
                home_equity,
                total_net_worth: portfolio_value + home_equity,
                portfolio_gain: portfolio_gain(month, &portfolio.values, portfolio.monthly_return),
                gross_income: income.gross(month),
                after_tax_income: income.after_tax(month),
                cost_mortgage: breakdown.mortgage_payment,
                monthly_property_tax: breakdown.property_tax,
                monthly_maintenance: breakdown.maintenance,
                home_insurance: breakdown.insurance,
                hoa_fees: breakdown.hoa,
                non_housing_cost: spending.monthly(month),
                home_value: breakdown.home_value,
                remaining_mortgage_balance,
            });
        }

        HomeownerProjection {
            months,
            portfolio_capital_gains_tax,
            home_capital_gains_tax: home_capital_gains_tax_paid,
            selling_costs,
        }
    }

    pub fn renter_net_worth(&self) -> RenterProjection {
        let portfolio = self.renter_portfolio();
        let costs = self.rental_costs();
        let income = self.income();
        let spending = self.spending();
        let final_month = portfolio.values.len() - 1;

        let mut months = Vec::with_capacity(portfolio.values.len());
        let mut capital_gains_tax_paid = 0.0;

        for (idx, &raw_value) in portfolio.values.iter().enumerate() {
            let month = idx as u32;
            let breakdown = costs.breakdown(month);
            let mut portfolio_value = raw_value;

            if idx == final_month {
                capital_gains_tax_paid = capital_gains_tax(
                    raw_value,
                    portfolio.initial(),
                    self.assumptions.investment_tax_enabled,
                    self.assumptions.filing_status,
                );
                portfolio_value -= capital_gains_tax_paid;
            }

            months.push(RenterMonth {
                month,
                year: years_elapsed(month),
                portfolio_value,
                total_net_worth: portfolio_value,
                portfolio_gain: portfolio_gain(month, &portfolio.values, portfolio.monthly_return),
                gross_income: income.gross(month),
                after_tax_income: income.after_tax(month),
                cost_rent: breakdown.rent,
                cost_insurance: breakdown.insurance,
                non_housing_cost: spending.monthly(month),
            });
        }

        RenterProjection {
            months,
            capital_gains_tax: capital_gains_tax_paid,
        }
    }

    pub fn run_analysis(&self) -> RentVsBuyAnalysis {
        let (homeowner, renter) =
            rayon::join(|| self.homeowner_net_worth(), || self.renter_net_worth());

        let monthly_comparison = compare_months(&homeowner.months, &renter.months);
        let summary = self.summarize(&homeowner, &renter, &monthly_comparison);
        debug!(
            homeowner = summary.final_homeowner_net_worth,
            renter = summary.final_renter_net_worth,
            winner = %summary.final_winner,
            "rent vs buy analysis complete"
        );

        RentVsBuyAnalysis {
            homeowner: homeowner.months,
            renter: renter.months,
            monthly_comparison,
            summary,
        }
    }

    fn summarize(
        &self,
        homeowner: &HomeownerProjection,
        renter: &RenterProjection,
        comparison: &[RentVsBuyMonth],
    ) -> RentVsBuySummary {
        let last = &comparison[comparison.len() - 1];
        let avg_monthly_ownership_cost = average_monthly_cost(&homeowner.months, |m| {
            m.cost_mortgage + m.monthly_property_tax + m.monthly_maintenance + m.home_insurance + m.hoa_fees
        });
        let avg_monthly_rent_cost =
            average_monthly_cost(&renter.months, |m| m.cost_rent + m.cost_insurance);

        RentVsBuySummary {
            time_horizon_years: self.assumptions.time_horizon_years,
            final_homeowner_net_worth: last.homeowner_net_worth,
            final_renter_net_worth: last.renter_net_worth,
            final_net_worth_difference: last.net_worth_difference,
            final_winner: last.winner,
            renter_capital_gains_tax_paid: renter.capital_gains_tax,
            homeowner_capital_gains_tax_portfolio: homeowner.portfolio_capital_gains_tax,
            homeowner_capital_gains_tax_home: homeowner.home_capital_gains_tax,
            homeowner_selling_costs: homeowner.selling_costs,
            homeowner_final_portfolio_value: last.homeowner_portfolio_value,
            homeowner_final_home_equity: last.homeowner_home_equity,
            down_payment: self.buy.down_payment(),
            mortgage_payment: self.mortgage.payment(),
            avg_monthly_ownership_cost,
            avg_monthly_rent_cost,
            monthly_cash_flow_difference: avg_monthly_ownership_cost - avg_monthly_rent_cost,
        }
    }
}

fn validate(
    buy: &BuyScenario,
    rent: &RentScenario,
    assumptions: &Assumptions,
) -> Result<(), ScenarioError> {
    if assumptions.time_horizon_years > MAX_HORIZON_YEARS {
        return Err(ScenarioError::InvalidInput(format!(
            "time_horizon_years must be <= {MAX_HORIZON_YEARS}"
        )));
    }
    if buy.amortization_years == 0 {
        return Err(ScenarioError::InvalidInput(
            "amortization_years must be > 0".to_string(),
        ));
    }

    let values = [
        ("purchase_price", buy.purchase_price),
        ("down_payment_pct", buy.down_payment_pct),
        ("mortgage_rate", buy.mortgage_rate),
        ("property_tax_rate", buy.property_tax_rate),
        ("maintenance_cost_pct", buy.maintenance_cost_pct),
        ("home_insurance_monthly", buy.home_insurance_monthly),
        ("hoa_monthly", buy.hoa_monthly),
        ("home_appreciation_rate", buy.home_appreciation_rate),
        ("selling_cost_pct", buy.selling_cost_pct),
        ("primary_home_exclusion_dollars", buy.primary_home_exclusion_dollars),
        ("monthly_rent", rent.monthly_rent),
        ("renters_insurance_monthly", rent.renters_insurance_monthly),
        ("rent_increase_rate", rent.rent_increase_rate),
        ("income", assumptions.income),
        ("inflation_rate", assumptions.inflation_rate),
        ("investment_return_rate", assumptions.investment_return_rate),
        ("income_growth_rate", assumptions.income_growth_rate),
        ("starting_net_worth", assumptions.starting_net_worth),
        ("annual_non_housing_spending", assumptions.annual_non_housing_spending),
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

fn compare_months(homeowner: &[HomeownerMonth], renter: &[RenterMonth]) -> Vec<RentVsBuyMonth> {
    homeowner
        .iter()
        .zip(renter)
        .map(|(owner, other)| {
            let difference = owner.total_net_worth - other.total_net_worth;
            RentVsBuyMonth {
                month: owner.month,
                homeowner_portfolio_value: owner.portfolio_value,
                homeowner_home_equity: owner.home_equity,
                homeowner_net_worth: owner.total_net_worth,
                renter_portfolio_value: other.portfolio_value,
                renter_net_worth: other.total_net_worth,
                net_worth_difference: difference,
                winner: if difference > 0.0 {
                    Winner::Homeowner
                } else {
                    Winner::Renter
                },
            }
        })
        .collect()
}

// Mean housing outflow over the simulated months (the starting state is
// not a month of spending).
fn average_monthly_cost<T>(months: &[T], cost: impl Fn(&T) -> f64) -> f64 {
    let simulated = &months[..months.len().saturating_sub(1)];
    if simulated.is_empty() {
        return 0.0;
    }
    simulated.iter().map(cost).sum::<f64>() / simulated.len() as f64
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

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn sample_buy() -> BuyScenario {
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
        }
    }

    fn sample_rent() -> RentScenario {
        RentScenario {
            monthly_rent: 2_500.0,
            renters_insurance_monthly: 0.0,
            rent_increase_rate: 0.025,
        }
    }

    fn sample_assumptions() -> Assumptions {
        Assumptions {
            income: 350_000.0,
            time_horizon_years: 10,
            investment_tax_enabled: true,
            filing_status: FilingStatus::MarriedFilingJointly,
            inflation_rate: 0.025,
            investment_return_rate: 0.09,
            income_growth_rate: 0.05,
            starting_net_worth: 300_000.0,
            annual_non_housing_spending: 73_000.0,
        }
    }

    fn sample_calculator() -> RentVsBuyCalculator {
        RentVsBuyCalculator::new(sample_buy(), sample_rent(), sample_assumptions())
            .expect("valid scenario")
    }

    #[test]
    fn rejects_down_payment_above_starting_net_worth() {
        let mut assumptions = sample_assumptions();
        assumptions.starting_net_worth = 100_000.0;
        let err = RentVsBuyCalculator::new(sample_buy(), sample_rent(), assumptions)
            .expect_err("must reject insufficient capital");
        assert!(err.is_insufficient_capital());
        assert_eq!(
            err,
            ScenarioError::InsufficientCapital {
                starting_net_worth: 100_000.0,
                required: 140_000.0,
            }
        );
    }

    #[test]
    fn rejects_horizon_beyond_cap() {
        let mut assumptions = sample_assumptions();
        assumptions.time_horizon_years = MAX_HORIZON_YEARS + 1;
        let err = RentVsBuyCalculator::new(sample_buy(), sample_rent(), assumptions)
            .expect_err("horizon too long");
        assert!(matches!(err, ScenarioError::InvalidInput(_)));
    }

    #[test]
    fn accepts_net_worth_exactly_equal_to_down_payment() {
        let mut assumptions = sample_assumptions();
        assumptions.starting_net_worth = 140_000.0;
        let calculator = RentVsBuyCalculator::new(sample_buy(), sample_rent(), assumptions)
            .expect("equal is sufficient");
        assert_approx(calculator.homeowner_portfolio().initial(), 0.0);
    }

    #[test]
    fn rejects_zero_amortization_term() {
        let mut buy = sample_buy();
        buy.amortization_years = 0;
        let err = RentVsBuyCalculator::new(buy, sample_rent(), sample_assumptions())
            .expect_err("zero term is invalid");
        assert!(matches!(err, ScenarioError::InvalidInput(_)));
    }

    #[test]
    fn mortgage_payment_matches_reference_scenario() {
        let calculator = sample_calculator();
        assert_approx_tol(calculator.mortgage().payment(), 3_443.53, 0.01);
    }

    #[test]
    fn records_include_starting_month() {
        let analysis = sample_calculator().run_analysis();
        assert_eq!(analysis.homeowner.len(), 121);
        assert_eq!(analysis.renter.len(), 121);
        assert_eq!(analysis.monthly_comparison.len(), 121);
        for (idx, row) in analysis.homeowner.iter().enumerate() {
            assert_eq!(row.month as usize, idx);
            assert_eq!(row.year as usize, idx / 12);
        }
    }

    #[test]
    fn first_month_has_no_portfolio_gain_and_full_loan_balance() {
        let analysis = sample_calculator().run_analysis();
        let owner = &analysis.homeowner[0];
        assert_approx(owner.portfolio_gain, 0.0);
        assert_approx(analysis.renter[0].portfolio_gain, 0.0);
        assert_approx(owner.remaining_mortgage_balance, 560_000.0);
        assert_approx(owner.home_equity, 140_000.0);
        assert_approx(owner.portfolio_value, 160_000.0);
        assert_approx(analysis.renter[0].portfolio_value, 300_000.0);
    }

    #[test]
    fn home_equity_uses_previous_month_balance() {
        let calculator = sample_calculator();
        let projection = calculator.homeowner_net_worth();
        let schedule = calculator.mortgage().schedule();
        for month in 1..projection.months.len() - 1 {
            let row = &projection.months[month];
            assert_approx(row.remaining_mortgage_balance, schedule[month - 1]);
            assert_approx(row.home_equity, row.home_value - schedule[month - 1]);
        }
    }

    #[test]
    fn only_final_month_is_settled() {
        let calculator = sample_calculator();
        let raw_owner = calculator.homeowner_portfolio();
        let raw_renter = calculator.renter_portfolio();
        let analysis = calculator.run_analysis();
        let last = analysis.homeowner.len() - 1;

        for month in 0..last {
            assert_approx(analysis.homeowner[month].portfolio_value, raw_owner.values[month]);
            assert_approx(analysis.renter[month].portfolio_value, raw_renter.values[month]);
            let owner = &analysis.homeowner[month];
            assert_approx(
                owner.home_equity,
                owner.home_value - owner.remaining_mortgage_balance,
            );
        }

        let summary = &analysis.summary;
        let final_owner = &analysis.homeowner[last];
        assert_approx(
            final_owner.portfolio_value,
            raw_owner.terminal() - summary.homeowner_capital_gains_tax_portfolio,
        );
        assert_approx(
            final_owner.home_equity,
            final_owner.home_value
                - final_owner.remaining_mortgage_balance
                - summary.homeowner_selling_costs
                - summary.homeowner_capital_gains_tax_home,
        );
        assert_approx(summary.homeowner_selling_costs, final_owner.home_value * 0.06);
        assert_approx(
            analysis.renter[last].portfolio_value,
            raw_renter.terminal() - summary.renter_capital_gains_tax_paid,
        );
        assert!(summary.renter_capital_gains_tax_paid > 0.0);
    }

    #[test]
    fn disabling_investment_tax_removes_all_capital_gains_tax() {
        let mut assumptions = sample_assumptions();
        assumptions.investment_tax_enabled = false;
        let analysis = RentVsBuyCalculator::new(sample_buy(), sample_rent(), assumptions)
            .expect("valid scenario")
            .run_analysis();
        assert_approx(analysis.summary.renter_capital_gains_tax_paid, 0.0);
        assert_approx(analysis.summary.homeowner_capital_gains_tax_portfolio, 0.0);
        assert_approx(analysis.summary.homeowner_capital_gains_tax_home, 0.0);
    }

    #[test]
    fn comparison_ties_go_to_renter() {
        let mut buy = sample_buy();
        buy.purchase_price = 0.0;
        buy.down_payment_pct = 0.0;
        buy.hoa_monthly = 0.0;
        buy.selling_cost_pct = 0.0;
        let mut rent = sample_rent();
        rent.monthly_rent = 0.0;
        let analysis = RentVsBuyCalculator::new(buy, rent, sample_assumptions())
            .expect("valid scenario")
            .run_analysis();
        for row in &analysis.monthly_comparison {
            assert_approx(row.net_worth_difference, 0.0);
            assert_eq!(row.winner, Winner::Renter);
        }
    }

    #[test]
    fn summary_reflects_final_comparison_row() {
        let analysis = sample_calculator().run_analysis();
        let last = analysis.monthly_comparison.last().expect("non-empty");
        let summary = &analysis.summary;
        assert_approx(summary.final_homeowner_net_worth, last.homeowner_net_worth);
        assert_approx(summary.final_renter_net_worth, last.renter_net_worth);
        assert_approx(
            summary.final_net_worth_difference,
            summary.final_homeowner_net_worth - summary.final_renter_net_worth,
        );
        let expected = if summary.final_net_worth_difference > 0.0 {
            Winner::Homeowner
        } else {
            Winner::Renter
        };
        assert_eq!(summary.final_winner, expected);
        assert_approx(summary.down_payment, 140_000.0);
        assert_approx(
            summary.monthly_cash_flow_difference,
            summary.avg_monthly_ownership_cost - summary.avg_monthly_rent_cost,
        );
    }

    #[test]
    fn zero_year_horizon_settles_the_starting_state() {
        let mut assumptions = sample_assumptions();
        assumptions.time_horizon_years = 0;
        let analysis = RentVsBuyCalculator::new(sample_buy(), sample_rent(), assumptions)
            .expect("valid scenario")
            .run_analysis();
        assert_eq!(analysis.homeowner.len(), 1);
        let owner = &analysis.homeowner[0];
        assert_approx(owner.home_equity, 140_000.0 - 700_000.0 * 0.06);
        assert_approx(analysis.summary.avg_monthly_rent_cost, 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(24))]

        #[test]
        fn prop_portfolio_obeys_cash_flow_identity(
            price in 200_000u32..1_500_000,
            down_bp in 500u32..5_000,
            mortgage_bp in 0u32..900,
            return_bp in -300i32..1_400,
            income in 40_000u32..600_000,
            rent in 500u32..8_000,
            years in 1u32..16
        ) {
            let mut buy = sample_buy();
            buy.purchase_price = price as f64;
            buy.down_payment_pct = down_bp as f64 / 10_000.0;
            buy.mortgage_rate = mortgage_bp as f64 / 10_000.0;
            let mut rent_scenario = sample_rent();
            rent_scenario.monthly_rent = rent as f64;
            let mut assumptions = sample_assumptions();
            assumptions.investment_return_rate = return_bp as f64 / 10_000.0;
            assumptions.income = income as f64;
            assumptions.time_horizon_years = years;
            assumptions.starting_net_worth = buy.down_payment() + 50_000.0;

            let calculator = RentVsBuyCalculator::new(buy, rent_scenario, assumptions)
                .expect("capital covers down payment");
            for trajectory in [calculator.homeowner_portfolio(), calculator.renter_portfolio()] {
                prop_assert!(trajectory.values.len() == (years * 12 + 1) as usize);
                for m in 1..trajectory.values.len() {
                    let expected = trajectory.values[m - 1] * (1.0 + trajectory.monthly_return)
                        + trajectory.cash_flows[m - 1].net();
                    prop_assert!((trajectory.values[m] - expected).abs() < 1.0);
                }
            }

            let analysis = calculator.run_analysis();
            prop_assert!(analysis.homeowner[0].portfolio_gain == 0.0);
            prop_assert!(analysis.renter[0].portfolio_gain == 0.0);
            for row in &analysis.monthly_comparison {
                let expected = if row.net_worth_difference > 0.0 { Winner::Homeowner } else { Winner::Renter };
                prop_assert!(row.winner == expected);
            }
        }
    }
}
