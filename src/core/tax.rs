use super::types::FilingStatus;

const MONTHS_PER_YEAR: u32 = 12;

pub fn years_elapsed(month: u32) -> u32 {
    month / MONTHS_PER_YEAR
}

pub fn step_growth(base: f64, annual_rate: f64, month: u32) -> f64 {
    base * (1.0 + annual_rate).powi(years_elapsed(month) as i32)
}

// Flat within a calendar year, jumps at every 12-month boundary.
pub fn inflation_factor(month: u32, annual_rate: f64) -> f64 {
    step_growth(1.0, annual_rate, month)
}

// Combined federal + payroll approximation.
pub fn effective_income_tax_rate(annual_income: f64) -> f64 {
    if annual_income <= 100_000.0 {
        0.22
    } else if annual_income <= 300_000.0 {
        0.28
    } else {
        0.32
    }
}

// Bracket ceilings are inclusive.
pub fn effective_cap_gains_rate(gains: f64, filing_status: FilingStatus) -> f64 {
    let (zero_ceiling, fifteen_ceiling) = match filing_status {
        FilingStatus::Single => (50_000.0, 500_000.0),
        FilingStatus::MarriedFilingJointly => (100_000.0, 600_000.0),
    };

    if gains <= zero_ceiling {
        0.0
    } else if gains <= fifteen_ceiling {
        0.15
    } else {
        0.20
    }
}

pub fn after_tax_annual_income(gross: f64) -> f64 {
    gross * (1.0 - effective_income_tax_rate(gross))
}

pub fn monthly_gross_income(month: u32, base_annual_income: f64, annual_growth_rate: f64) -> f64 {
    step_growth(base_annual_income, annual_growth_rate, month) / MONTHS_PER_YEAR as f64
}

// The bracket is chosen from the grown annual figure, not the monthly one.
pub fn monthly_after_tax_income(
    month: u32,
    base_annual_income: f64,
    annual_growth_rate: f64,
) -> f64 {
    let annual_gross = step_growth(base_annual_income, annual_growth_rate, month);
    after_tax_annual_income(annual_gross) / MONTHS_PER_YEAR as f64
}

pub fn monthly_investment_return_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / MONTHS_PER_YEAR as f64) - 1.0
}

// Month 0 is the starting state and never has a gain.
pub fn portfolio_gain(month: u32, portfolio_values: &[f64], monthly_return: f64) -> f64 {
    if month == 0 {
        return 0.0;
    }
    portfolio_values
        .get(month as usize - 1)
        .map(|prev| prev * monthly_return)
        .unwrap_or(0.0)
}

pub fn capital_gains_tax(
    final_value: f64,
    initial_value: f64,
    enabled: bool,
    filing_status: FilingStatus,
) -> f64 {
    if !enabled {
        return 0.0;
    }

    let gains = final_value - initial_value;
    if gains <= 0.0 {
        return 0.0;
    }
    gains * effective_cap_gains_rate(gains, filing_status)
}

pub fn home_capital_gains_tax(
    final_value: f64,
    initial_value: f64,
    exclusion_dollars: f64,
    enabled: bool,
    filing_status: FilingStatus,
) -> f64 {
    if !enabled {
        return 0.0;
    }

    let taxable_gains = (final_value - initial_value - exclusion_dollars).max(0.0);
    taxable_gains * effective_cap_gains_rate(taxable_gains, filing_status)
}
