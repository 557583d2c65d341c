use super::costs::{IncomeModel, IncomeStream, MonthlyCostModel, SpendingModel};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyCashFlow {
    pub after_tax_income: f64,
    pub secondary_income: f64,
    pub housing_cost: f64,
    pub non_housing_spending: f64,
}

impl MonthlyCashFlow {
    pub fn net(&self) -> f64 {
        self.after_tax_income + self.secondary_income - self.housing_cost - self.non_housing_spending
    }
}

pub trait CashFlowModel {
    fn cash_flow(&self, month: u32) -> MonthlyCashFlow;
}

pub struct HouseholdCashFlow<'a> {
    pub income: IncomeModel,
    pub spending: SpendingModel,
    pub housing: &'a dyn MonthlyCostModel,
    pub secondary: Option<&'a dyn IncomeStream>,
}

impl CashFlowModel for HouseholdCashFlow<'_> {
    fn cash_flow(&self, month: u32) -> MonthlyCashFlow {
        MonthlyCashFlow {
            after_tax_income: self.income.after_tax(month),
            secondary_income: self
                .secondary
                .map(|stream| stream.monthly_income(month))
                .unwrap_or(0.0),
            housing_cost: self.housing.monthly_cost(month),
            non_housing_spending: self.spending.monthly(month),
        }
    }
}

// `values[0]` is the starting balance and `values[m]` the balance after `m`
// months; `cash_flows[m]` is the flow applied in the transition to
// `values[m + 1]`.
#[derive(Debug, Clone)]
pub struct PortfolioTrajectory {
    pub monthly_return: f64,
    pub values: Vec<f64>,
    pub cash_flows: Vec<MonthlyCashFlow>,
}

impl PortfolioTrajectory {
    pub fn initial(&self) -> f64 {
        self.values[0]
    }

    pub fn terminal(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    pub fn months(&self) -> usize {
        self.cash_flows.len()
    }
}

// Runs `months` transitions of
// `balance[m] = balance[m-1] * (1 + monthly_return) + net_cash_flow`.
pub fn grow_portfolio(
    initial_balance: f64,
    monthly_return: f64,
    months: u32,
    model: &dyn CashFlowModel,
) -> PortfolioTrajectory {
    let mut values = Vec::with_capacity(months as usize + 1);
    let mut cash_flows = Vec::with_capacity(months as usize);
    values.push(initial_balance);

    let mut balance = initial_balance;
    for month in 0..months {
        let flow = model.cash_flow(month);
        balance = balance * (1.0 + monthly_return) + flow.net();
        values.push(balance);
        cash_flows.push(flow);
    }

    PortfolioTrajectory {
        monthly_return,
        values,
        cash_flows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::costs::RentalCosts;
    use crate::core::tax::monthly_investment_return_rate;
    use proptest::prelude::{prop_assert, proptest};

    struct FlatFlow(f64);

    impl CashFlowModel for FlatFlow {
        fn cash_flow(&self, _month: u32) -> MonthlyCashFlow {
            MonthlyCashFlow {
                after_tax_income: self.0,
                ..MonthlyCashFlow::default()
            }
        }
    }

    struct FixedStream(f64);

    impl IncomeStream for FixedStream {
        fn monthly_income(&self, _month: u32) -> f64 {
            self.0
        }
    }

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn zero_return_accumulates_cash_flow_linearly() {
        let trajectory = grow_portfolio(1_000.0, 0.0, 24, &FlatFlow(100.0));
        assert_eq!(trajectory.values.len(), 25);
        assert_eq!(trajectory.months(), 24);
        assert_approx_tol(trajectory.initial(), 1_000.0, 1e-12);
        assert_approx_tol(trajectory.terminal(), 3_400.0, 1e-9);
    }

    #[test]
    fn no_cash_flow_compounds_to_annual_rate() {
        let monthly = monthly_investment_return_rate(0.09);
        let trajectory = grow_portfolio(100_000.0, monthly, 12, &FlatFlow(0.0));
        assert_approx_tol(trajectory.terminal(), 109_000.0, 1e-6);
    }

    #[test]
    fn household_cash_flow_nets_all_components() {
        let rent = RentalCosts {
            monthly_rent: 1_500.0,
            rent_increase_rate: 0.0,
            insurance_monthly: 0.0,
            inflation_rate: 0.0,
        };
        let stream = FixedStream(250.0);
        let household = HouseholdCashFlow {
            income: IncomeModel {
                base_annual_income: 120_000.0,
                annual_growth_rate: 0.0,
            },
            spending: SpendingModel {
                annual_spending: 24_000.0,
                inflation_rate: 0.0,
            },
            housing: &rent,
            secondary: Some(&stream),
        };
        let flow = household.cash_flow(0);
        assert_approx_tol(flow.after_tax_income, 120_000.0 * 0.72 / 12.0, 1e-9);
        assert_approx_tol(flow.net(), 7_200.0 + 250.0 - 1_500.0 - 2_000.0, 1e-9);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_every_transition_satisfies_cash_flow_identity(
            initial in -50_000i32..2_000_000,
            rate_bp in -500i32..1_500,
            flow in -8_000i32..8_000,
            years in 1u32..31
        ) {
            let monthly = monthly_investment_return_rate(rate_bp as f64 / 10_000.0);
            let trajectory = grow_portfolio(initial as f64, monthly, years * 12, &FlatFlow(flow as f64));
            for m in 1..trajectory.values.len() {
                let expected = trajectory.values[m - 1] * (1.0 + monthly)
                    + trajectory.cash_flows[m - 1].net();
                prop_assert!((trajectory.values[m] - expected).abs() < 1.0);
            }
        }
    }
}
