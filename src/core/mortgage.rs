#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmortizationEntry {
    pub interest_payment: f64,
    pub principal_payment: f64,
    pub remaining_balance: f64,
}

pub fn monthly_payment(principal: f64, annual_rate: f64, term_years: u32) -> f64 {
    let monthly_rate = annual_rate / 12.0;
    let num_payments = term_years * 12;

    if monthly_rate == 0.0 {
        return principal / num_payments as f64;
    }

    let growth = (1.0 + monthly_rate).powi(num_payments as i32);
    principal * (monthly_rate * growth) / (growth - 1.0)
}

// Month-by-month breakdown of a loan. Balances are floored at zero and the
// table stops at the first month the loan is paid off, so it may be shorter
// than `num_months`.
pub fn amortization_table(
    principal: f64,
    payment: f64,
    annual_rate: f64,
    num_months: u32,
) -> Vec<AmortizationEntry> {
    let monthly_rate = annual_rate / 12.0;
    let mut table = Vec::with_capacity(num_months as usize);
    let mut balance = principal;

    for _ in 0..num_months {
        let interest_payment = balance * monthly_rate;
        let principal_payment = payment - interest_payment;
        balance -= principal_payment;

        table.push(AmortizationEntry {
            interest_payment,
            principal_payment,
            remaining_balance: balance.max(0.0),
        });

        if balance <= 0.0 {
            break;
        }
    }

    table
}

pub fn amortization_schedule(
    principal: f64,
    payment: f64,
    annual_rate: f64,
    num_months: u32,
) -> Vec<f64> {
    amortization_table(principal, payment, annual_rate, num_months)
        .into_iter()
        .map(|entry| entry.remaining_balance)
        .collect()
}

#[derive(Debug, Clone)]
pub struct Mortgage {
    principal: f64,
    payment: f64,
    schedule: Vec<f64>,
}

impl Mortgage {
    pub fn originate(principal: f64, annual_rate: f64, term_years: u32, horizon_months: u32) -> Self {
        let payment = monthly_payment(principal, annual_rate, term_years);
        let schedule = amortization_schedule(principal, payment, annual_rate, horizon_months);
        Self {
            principal,
            payment,
            schedule,
        }
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn payment(&self) -> f64 {
        self.payment
    }

    pub fn schedule(&self) -> &[f64] {
        &self.schedule
    }

    // Outstanding balance at the start of `month`: the full principal at
    // month 0, then the balance after payment `month - 1`, zero once paid off.
    pub fn balance_at(&self, month: u32) -> f64 {
        if month == 0 {
            return self.principal;
        }
        self.schedule
            .get(month as usize - 1)
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assume, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    #[test]
    fn thirty_year_payment_matches_reference_value() {
        let payment = monthly_payment(560_000.0, 0.0425, 30);
        assert_approx_tol(payment, 3_443.53, 0.01);
    }

    #[test]
    fn zero_rate_payment_is_straight_line() {
        let payment = monthly_payment(120_000.0, 0.0, 10);
        assert_approx_tol(payment, 1_000.0, 1e-9);

        let schedule = amortization_schedule(120_000.0, payment, 0.0, 120);
        assert_approx_tol(schedule[0], 119_000.0, 1e-6);
        assert_approx_tol(schedule[59], 60_000.0, 1e-6);
    }

    #[test]
    fn schedule_terminates_at_payoff() {
        let payment = monthly_payment(100_000.0, 0.06, 5);
        let schedule = amortization_schedule(100_000.0, payment, 0.06, 120);
        assert!(schedule.len() <= 61, "len {}", schedule.len());
        assert!(schedule.len() >= 59, "len {}", schedule.len());
        assert_approx_tol(*schedule.last().unwrap_or(&f64::NAN), 0.0, 1e-3);
        assert!(schedule.iter().all(|b| *b >= 0.0));
    }

    #[test]
    fn balance_lookup_uses_previous_month() {
        let mortgage = Mortgage::originate(200_000.0, 0.05, 30, 24);
        assert_approx_tol(mortgage.balance_at(0), 200_000.0, 1e-9);
        assert_approx_tol(mortgage.balance_at(1), mortgage.schedule()[0], 1e-9);
        assert_approx_tol(mortgage.balance_at(24), mortgage.schedule()[23], 1e-9);
        assert_approx_tol(mortgage.balance_at(500), 0.0, 1e-9);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_amortization_conserves_each_payment(
            principal in 10_000u32..2_000_000,
            rate_bp in 0u32..1_200,
            term_years in 1u32..41,
            horizon_years in 1u32..51
        ) {
            let principal = principal as f64;
            let rate = rate_bp as f64 / 10_000.0;
            let payment = monthly_payment(principal, rate, term_years);
            prop_assume!(payment.is_finite());

            let table = amortization_table(principal, payment, rate, horizon_years * 12);
            let mut prev = principal;
            for entry in &table {
                prop_assert!(
                    (entry.interest_payment + entry.principal_payment - payment).abs() < 1e-6
                );
                let expected = (prev - entry.principal_payment).max(0.0);
                prop_assert!((entry.remaining_balance - expected).abs() < 1e-6);
                prop_assert!(entry.remaining_balance <= prev + 1e-9);
                prev = entry.remaining_balance;
            }
            prop_assert!(table.len() <= (horizon_years * 12) as usize);
        }
    }
}
