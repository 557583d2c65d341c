use super::tax::{
    inflation_factor, monthly_after_tax_income, monthly_gross_income, step_growth,
};
use super::types::{BuyScenario, RentOutScenario};

pub trait MonthlyCostModel {
    fn monthly_cost(&self, month: u32) -> f64;
}

pub trait IncomeStream {
    fn monthly_income(&self, month: u32) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct IncomeModel {
    pub base_annual_income: f64,
    pub annual_growth_rate: f64,
}

impl IncomeModel {
    pub fn gross(&self, month: u32) -> f64 {
        monthly_gross_income(month, self.base_annual_income, self.annual_growth_rate)
    }

    pub fn after_tax(&self, month: u32) -> f64 {
        monthly_after_tax_income(month, self.base_annual_income, self.annual_growth_rate)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SpendingModel {
    pub annual_spending: f64,
    pub inflation_rate: f64,
}

impl SpendingModel {
    pub fn monthly(&self, month: u32) -> f64 {
        self.annual_spending / 12.0 * inflation_factor(month, self.inflation_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnershipCostBreakdown {
    pub home_value: f64,
    pub mortgage_payment: f64,
    pub property_tax: f64,
    pub maintenance: f64,
    pub insurance: f64,
    pub hoa: f64,
}

impl OwnershipCostBreakdown {
    pub fn total(&self) -> f64 {
        self.mortgage_payment + self.property_tax + self.maintenance + self.insurance + self.hoa
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OwnershipCosts<'a> {
    pub buy: &'a BuyScenario,
    pub mortgage_payment: f64,
    pub inflation_rate: f64,
}

impl OwnershipCosts<'_> {
    pub fn home_value(&self, month: u32) -> f64 {
        step_growth(self.buy.purchase_price, self.buy.home_appreciation_rate, month)
    }

    // Property tax follows the appreciated value; maintenance stays keyed to
    // the purchase price. Both are then inflated.
    pub fn breakdown(&self, month: u32) -> OwnershipCostBreakdown {
        let home_value = self.home_value(month);
        let inflation = inflation_factor(month, self.inflation_rate);

        OwnershipCostBreakdown {
            home_value,
            mortgage_payment: self.mortgage_payment,
            property_tax: home_value * self.buy.property_tax_rate / 12.0 * inflation,
            maintenance: self.buy.purchase_price * self.buy.maintenance_cost_pct / 12.0 * inflation,
            insurance: self.buy.home_insurance_monthly * inflation,
            hoa: self.buy.hoa_monthly * inflation,
        }
    }
}

impl MonthlyCostModel for OwnershipCosts<'_> {
    fn monthly_cost(&self, month: u32) -> f64 {
        self.breakdown(month).total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentCostBreakdown {
    pub rent: f64,
    pub insurance: f64,
}

impl RentCostBreakdown {
    pub fn total(&self) -> f64 {
        self.rent + self.insurance
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RentalCosts {
    pub monthly_rent: f64,
    pub rent_increase_rate: f64,
    pub insurance_monthly: f64,
    pub inflation_rate: f64,
}

impl RentalCosts {
    pub fn breakdown(&self, month: u32) -> RentCostBreakdown {
        RentCostBreakdown {
            rent: step_growth(self.monthly_rent, self.rent_increase_rate, month),
            insurance: self.insurance_monthly * inflation_factor(month, self.inflation_rate),
        }
    }
}

impl MonthlyCostModel for RentalCosts {
    fn monthly_cost(&self, month: u32) -> f64 {
        self.breakdown(month).total()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentalPropertyBreakdown {
    pub property_value: f64,
    pub gross_rent: f64,
    pub effective_rent: f64,
    pub management_fees: f64,
    pub property_tax: f64,
    pub maintenance: f64,
    pub insurance: f64,
}

impl RentalPropertyBreakdown {
    pub fn operating_cost(&self) -> f64 {
        self.property_tax + self.maintenance + self.insurance
    }

    pub fn net_income(&self) -> f64 {
        self.effective_rent - self.management_fees - self.operating_cost()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RentalProperty<'a> {
    pub scenario: &'a RentOutScenario,
    pub inflation_rate: f64,
}

impl RentalProperty<'_> {
    pub fn property_value(&self, month: u32) -> f64 {
        step_growth(
            self.scenario.current_property_value,
            self.scenario.rental_appreciation_rate,
            month,
        )
    }

    // Vacancy is applied first; the management fee is charged on what the
    // tenants actually pay. Tax and maintenance follow the appreciated value.
    pub fn breakdown(&self, month: u32) -> RentalPropertyBreakdown {
        let s = self.scenario;
        let property_value = self.property_value(month);
        let inflation = inflation_factor(month, self.inflation_rate);

        let gross_rent = step_growth(s.monthly_rental_income, s.rental_income_growth_rate, month);
        let effective_rent = gross_rent * (1.0 - s.vacancy_rate);
        let management_fees = effective_rent * s.property_management_fee_pct;

        RentalPropertyBreakdown {
            property_value,
            gross_rent,
            effective_rent,
            management_fees,
            property_tax: property_value * s.rental_property_tax_rate / 12.0 * inflation,
            maintenance: property_value * s.rental_maintenance_cost_pct / 12.0 * inflation,
            insurance: s.rental_insurance_monthly * inflation,
        }
    }

    pub fn operating_cost(&self, month: u32) -> f64 {
        self.breakdown(month).operating_cost()
    }

    pub fn net_rental_income(&self, month: u32) -> f64 {
        self.breakdown(month).net_income()
    }
}

impl IncomeStream for RentalProperty<'_> {
    fn monthly_income(&self, month: u32) -> f64 {
        self.net_rental_income(month)
    }
}
