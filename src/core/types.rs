use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedFilingJointly,
}

impl fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilingStatus::Single => f.write_str("single"),
            FilingStatus::MarriedFilingJointly => f.write_str("married_filing_jointly"),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Winner {
    Homeowner,
    Renter,
    #[serde(rename = "Rent Out")]
    RentOut,
    Sell,
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Winner::Homeowner => f.write_str("Homeowner"),
            Winner::Renter => f.write_str("Renter"),
            Winner::RentOut => f.write_str("Rent Out"),
            Winner::Sell => f.write_str("Sell"),
        }
    }
}

// Regional market figures a caller supplies when it does not want to spell
// out every rate. Only the input layer reads these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDefaults {
    pub property_tax_rate: f64,
    pub maintenance_cost_pct: f64,
    pub home_insurance_monthly: f64,
    pub renters_insurance_monthly: f64,
    pub home_appreciation_rate: f64,
    pub rent_increase_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyScenario {
    pub purchase_price: f64,
    pub down_payment_pct: f64,
    pub mortgage_rate: f64,
    pub amortization_years: u32,
    pub property_tax_rate: f64,
    pub maintenance_cost_pct: f64,
    pub home_insurance_monthly: f64,
    pub hoa_monthly: f64,
    pub home_appreciation_rate: f64,
    pub selling_cost_pct: f64,
    pub primary_home_exclusion_dollars: f64,
}

impl BuyScenario {
    pub fn down_payment(&self) -> f64 {
        self.purchase_price * self.down_payment_pct
    }

    pub fn loan_principal(&self) -> f64 {
        self.purchase_price * (1.0 - self.down_payment_pct)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentScenario {
    pub monthly_rent: f64,
    pub renters_insurance_monthly: f64,
    pub rent_increase_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub income: f64,
    pub time_horizon_years: u32,
    pub investment_tax_enabled: bool,
    pub filing_status: FilingStatus,
    pub inflation_rate: f64,
    pub investment_return_rate: f64,
    pub income_growth_rate: f64,
    pub starting_net_worth: f64,
    pub annual_non_housing_spending: f64,
}

pub const MAX_HORIZON_YEARS: u32 = 100;

impl Assumptions {
    pub fn horizon_months(&self) -> u32 {
        self.time_horizon_years * 12
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentOutScenario {
    pub current_property_value: f64,
    pub monthly_rental_income: f64,
    pub rental_income_growth_rate: f64,
    pub property_management_fee_pct: f64,
    pub vacancy_rate: f64,
    pub rental_property_tax_rate: f64,
    pub rental_maintenance_cost_pct: f64,
    pub rental_insurance_monthly: f64,
    pub rental_appreciation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellScenario {
    pub current_property_value: f64,
    pub selling_cost_pct: f64,
    pub capital_gains_exclusion: f64,
    pub original_purchase_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentOutVsSellAssumptions {
    pub income: f64,
    pub time_horizon_years: u32,
    pub investment_tax_enabled: bool,
    pub filing_status: FilingStatus,
    pub inflation_rate: f64,
    pub investment_return_rate: f64,
    pub income_growth_rate: f64,
    // Net worth excluding the property being decided on.
    pub starting_net_worth: f64,
    pub annual_non_housing_spending: f64,
    pub new_monthly_rent: f64,
    pub new_rent_increase_rate: f64,
    pub new_renters_insurance_monthly: f64,
}

impl RentOutVsSellAssumptions {
    pub fn horizon_months(&self) -> u32 {
        self.time_horizon_years * 12
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentVsBuyInputs {
    pub buy: BuyScenario,
    pub rent: RentScenario,
    pub assumptions: Assumptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentOutVsSellInputs {
    pub rent_out: RentOutScenario,
    pub sell: SellScenario,
    pub assumptions: RentOutVsSellAssumptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeownerMonth {
    pub month: u32,
    pub year: u32,
    pub portfolio_value: f64,
    pub home_equity: f64,
    pub total_net_worth: f64,
    pub portfolio_gain: f64,
    pub gross_income: f64,
    pub after_tax_income: f64,
    pub cost_mortgage: f64,
    pub monthly_property_tax: f64,
    pub monthly_maintenance: f64,
    pub home_insurance: f64,
    pub hoa_fees: f64,
    pub non_housing_cost: f64,
    pub home_value: f64,
    pub remaining_mortgage_balance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenterMonth {
    pub month: u32,
    pub year: u32,
    pub portfolio_value: f64,
    pub total_net_worth: f64,
    pub portfolio_gain: f64,
    pub gross_income: f64,
    pub after_tax_income: f64,
    pub cost_rent: f64,
    pub cost_insurance: f64,
    pub non_housing_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentOutMonth {
    pub month: u32,
    pub year: u32,
    pub portfolio_value: f64,
    pub property_value: f64,
    pub total_net_worth: f64,
    pub gross_income: f64,
    pub after_tax_income: f64,
    pub net_rental_income: f64,
    pub new_rent_costs: f64,
    pub non_housing_cost: f64,
    pub excess_cash_flow: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SellMonth {
    pub month: u32,
    pub year: u32,
    pub portfolio_value: f64,
    pub total_net_worth: f64,
    pub gross_income: f64,
    pub after_tax_income: f64,
    pub new_rent_costs: f64,
    pub non_housing_cost: f64,
    pub excess_cash_flow: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentVsBuyMonth {
    pub month: u32,
    pub homeowner_portfolio_value: f64,
    pub homeowner_home_equity: f64,
    pub homeowner_net_worth: f64,
    pub renter_portfolio_value: f64,
    pub renter_net_worth: f64,
    pub net_worth_difference: f64,
    pub winner: Winner,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentOutVsSellMonth {
    pub month: u32,
    pub rent_out_portfolio_value: f64,
    pub rent_out_property_value: f64,
    pub rent_out_net_worth: f64,
    pub sell_portfolio_value: f64,
    pub sell_net_worth: f64,
    pub net_worth_difference: f64,
    pub winner: Winner,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentVsBuySummary {
    pub time_horizon_years: u32,
    pub final_homeowner_net_worth: f64,
    pub final_renter_net_worth: f64,
    pub final_net_worth_difference: f64,
    pub final_winner: Winner,
    pub renter_capital_gains_tax_paid: f64,
    pub homeowner_capital_gains_tax_portfolio: f64,
    pub homeowner_capital_gains_tax_home: f64,
    pub homeowner_selling_costs: f64,
    pub homeowner_final_portfolio_value: f64,
    pub homeowner_final_home_equity: f64,
    pub down_payment: f64,
    pub mortgage_payment: f64,
    pub avg_monthly_ownership_cost: f64,
    pub avg_monthly_rent_cost: f64,
    pub monthly_cash_flow_difference: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentOutVsSellSummary {
    pub time_horizon_years: u32,
    pub final_rent_out_net_worth: f64,
    pub final_sell_net_worth: f64,
    pub final_net_worth_difference: f64,
    pub final_net_worth_difference_pct: Option<f64>,
    pub final_winner: Winner,
    pub rent_out_portfolio_capital_gains_tax: f64,
    pub rent_out_property_capital_gains_tax: f64,
    pub sell_portfolio_capital_gains_tax: f64,
    pub sell_property_capital_gains_tax: f64,
    pub rent_out_final_portfolio_value: f64,
    pub rent_out_final_property_value: f64,
    pub sell_final_portfolio_value: f64,
    pub sell_selling_costs: f64,
    pub sell_net_proceeds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentVsBuyAnalysis {
    pub homeowner: Vec<HomeownerMonth>,
    pub renter: Vec<RenterMonth>,
    pub monthly_comparison: Vec<RentVsBuyMonth>,
    pub summary: RentVsBuySummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RentOutVsSellAnalysis {
    pub rent_out: Vec<RentOutMonth>,
    pub sell: Vec<SellMonth>,
    pub monthly_comparison: Vec<RentOutVsSellMonth>,
    pub summary: RentOutVsSellSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerminalOutcome {
    pub owner_net_worth: f64,
    pub other_net_worth: f64,
    pub net_worth_difference: f64,
    pub winner: Winner,
}

impl From<&RentVsBuySummary> for TerminalOutcome {
    fn from(summary: &RentVsBuySummary) -> Self {
        Self {
            owner_net_worth: summary.final_homeowner_net_worth,
            other_net_worth: summary.final_renter_net_worth,
            net_worth_difference: summary.final_net_worth_difference,
            winner: summary.final_winner,
        }
    }
}

impl From<&RentOutVsSellSummary> for TerminalOutcome {
    fn from(summary: &RentOutVsSellSummary) -> Self {
        Self {
            owner_net_worth: summary.final_rent_out_net_worth,
            other_net_worth: summary.final_sell_net_worth,
            net_worth_difference: summary.final_net_worth_difference,
            winner: summary.final_winner,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentVsBuyParameter {
    InvestmentReturnRate,
    InflationRate,
    TimeHorizonYears,
    StartingNetWorth,
    Income,
    IncomeGrowthRate,
    AnnualNonHousingSpending,
    PurchasePrice,
    DownPaymentPct,
    MortgageRate,
    HomeAppreciationRate,
    PropertyTaxRate,
    MaintenanceCostPct,
    HoaMonthly,
    SellingCostPct,
    MonthlyRent,
    RentIncreaseRate,
}

impl RentVsBuyParameter {
    pub const ALL: [Self; 17] = [
        Self::InvestmentReturnRate,
        Self::InflationRate,
        Self::TimeHorizonYears,
        Self::StartingNetWorth,
        Self::Income,
        Self::IncomeGrowthRate,
        Self::AnnualNonHousingSpending,
        Self::PurchasePrice,
        Self::DownPaymentPct,
        Self::MortgageRate,
        Self::HomeAppreciationRate,
        Self::PropertyTaxRate,
        Self::MaintenanceCostPct,
        Self::HoaMonthly,
        Self::SellingCostPct,
        Self::MonthlyRent,
        Self::RentIncreaseRate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvestmentReturnRate => "investment_return_rate",
            Self::InflationRate => "inflation_rate",
            Self::TimeHorizonYears => "time_horizon_years",
            Self::StartingNetWorth => "starting_net_worth",
            Self::Income => "income",
            Self::IncomeGrowthRate => "income_growth_rate",
            Self::AnnualNonHousingSpending => "annual_non_housing_spending",
            Self::PurchasePrice => "purchase_price",
            Self::DownPaymentPct => "down_payment_pct",
            Self::MortgageRate => "mortgage_rate",
            Self::HomeAppreciationRate => "home_appreciation_rate",
            Self::PropertyTaxRate => "property_tax_rate",
            Self::MaintenanceCostPct => "maintenance_cost_pct",
            Self::HoaMonthly => "hoa_monthly",
            Self::SellingCostPct => "selling_cost_pct",
            Self::MonthlyRent => "monthly_rent",
            Self::RentIncreaseRate => "rent_increase_rate",
        }
    }

    pub fn is_rate(self) -> bool {
        !matches!(
            self,
            Self::TimeHorizonYears
                | Self::StartingNetWorth
                | Self::Income
                | Self::AnnualNonHousingSpending
                | Self::PurchasePrice
                | Self::HoaMonthly
                | Self::MonthlyRent
        )
    }
}

impl fmt::Display for RentVsBuyParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentVsBuyParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown rent-vs-buy parameter '{s}', expected one of: {}", names.join(", "))
            })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentOutVsSellParameter {
    InvestmentReturnRate,
    InflationRate,
    TimeHorizonYears,
    StartingNetWorth,
    Income,
    AnnualNonHousingSpending,
    // Moves both sides together so they stay consistent.
    PropertyValue,
    MonthlyRentalIncome,
    RentalIncomeGrowthRate,
    PropertyManagementFeePct,
    VacancyRate,
    RentalAppreciationRate,
    RentalPropertyTaxRate,
    SellingCostPct,
    OriginalPurchasePrice,
    NewMonthlyRent,
}

impl RentOutVsSellParameter {
    pub const ALL: [Self; 16] = [
        Self::InvestmentReturnRate,
        Self::InflationRate,
        Self::TimeHorizonYears,
        Self::StartingNetWorth,
        Self::Income,
        Self::AnnualNonHousingSpending,
        Self::PropertyValue,
        Self::MonthlyRentalIncome,
        Self::RentalIncomeGrowthRate,
        Self::PropertyManagementFeePct,
        Self::VacancyRate,
        Self::RentalAppreciationRate,
        Self::RentalPropertyTaxRate,
        Self::SellingCostPct,
        Self::OriginalPurchasePrice,
        Self::NewMonthlyRent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvestmentReturnRate => "investment_return_rate",
            Self::InflationRate => "inflation_rate",
            Self::TimeHorizonYears => "time_horizon_years",
            Self::StartingNetWorth => "starting_net_worth",
            Self::Income => "income",
            Self::AnnualNonHousingSpending => "annual_non_housing_spending",
            Self::PropertyValue => "property_value",
            Self::MonthlyRentalIncome => "monthly_rental_income",
            Self::RentalIncomeGrowthRate => "rental_income_growth_rate",
            Self::PropertyManagementFeePct => "property_management_fee_pct",
            Self::VacancyRate => "vacancy_rate",
            Self::RentalAppreciationRate => "rental_appreciation_rate",
            Self::RentalPropertyTaxRate => "rental_property_tax_rate",
            Self::SellingCostPct => "selling_cost_pct",
            Self::OriginalPurchasePrice => "original_purchase_price",
            Self::NewMonthlyRent => "new_monthly_rent",
        }
    }

    pub fn is_rate(self) -> bool {
        !matches!(
            self,
            Self::TimeHorizonYears
                | Self::StartingNetWorth
                | Self::Income
                | Self::AnnualNonHousingSpending
                | Self::PropertyValue
                | Self::MonthlyRentalIncome
                | Self::OriginalPurchasePrice
                | Self::NewMonthlyRent
        )
    }
}

impl fmt::Display for RentOutVsSellParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RentOutVsSellParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                format!(
                    "unknown rent-out-vs-sell parameter '{s}', expected one of: {}",
                    names.join(", ")
                )
            })
    }
}

fn horizon_years(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

impl RentVsBuyInputs {
    pub fn parameter(&self, parameter: RentVsBuyParameter) -> f64 {
        use RentVsBuyParameter as P;
        match parameter {
            P::InvestmentReturnRate => self.assumptions.investment_return_rate,
            P::InflationRate => self.assumptions.inflation_rate,
            P::TimeHorizonYears => self.assumptions.time_horizon_years as f64,
            P::StartingNetWorth => self.assumptions.starting_net_worth,
            P::Income => self.assumptions.income,
            P::IncomeGrowthRate => self.assumptions.income_growth_rate,
            P::AnnualNonHousingSpending => self.assumptions.annual_non_housing_spending,
            P::PurchasePrice => self.buy.purchase_price,
            P::DownPaymentPct => self.buy.down_payment_pct,
            P::MortgageRate => self.buy.mortgage_rate,
            P::HomeAppreciationRate => self.buy.home_appreciation_rate,
            P::PropertyTaxRate => self.buy.property_tax_rate,
            P::MaintenanceCostPct => self.buy.maintenance_cost_pct,
            P::HoaMonthly => self.buy.hoa_monthly,
            P::SellingCostPct => self.buy.selling_cost_pct,
            P::MonthlyRent => self.rent.monthly_rent,
            P::RentIncreaseRate => self.rent.rent_increase_rate,
        }
    }

    // A copy with one input replaced. Horizons are rounded to whole years.
    pub fn with_override(&self, parameter: RentVsBuyParameter, value: f64) -> Self {
        use RentVsBuyParameter as P;
        let mut next = self.clone();
        match parameter {
            P::InvestmentReturnRate => next.assumptions.investment_return_rate = value,
            P::InflationRate => next.assumptions.inflation_rate = value,
            P::TimeHorizonYears => next.assumptions.time_horizon_years = horizon_years(value),
            P::StartingNetWorth => next.assumptions.starting_net_worth = value,
            P::Income => next.assumptions.income = value,
            P::IncomeGrowthRate => next.assumptions.income_growth_rate = value,
            P::AnnualNonHousingSpending => next.assumptions.annual_non_housing_spending = value,
            P::PurchasePrice => next.buy.purchase_price = value,
            P::DownPaymentPct => next.buy.down_payment_pct = value,
            P::MortgageRate => next.buy.mortgage_rate = value,
            P::HomeAppreciationRate => next.buy.home_appreciation_rate = value,
            P::PropertyTaxRate => next.buy.property_tax_rate = value,
            P::MaintenanceCostPct => next.buy.maintenance_cost_pct = value,
            P::HoaMonthly => next.buy.hoa_monthly = value,
            P::SellingCostPct => next.buy.selling_cost_pct = value,
            P::MonthlyRent => next.rent.monthly_rent = value,
            P::RentIncreaseRate => next.rent.rent_increase_rate = value,
        }
        next
    }
}

impl RentOutVsSellInputs {
    pub fn parameter(&self, parameter: RentOutVsSellParameter) -> f64 {
        use RentOutVsSellParameter as P;
        match parameter {
            P::InvestmentReturnRate => self.assumptions.investment_return_rate,
            P::InflationRate => self.assumptions.inflation_rate,
            P::TimeHorizonYears => self.assumptions.time_horizon_years as f64,
            P::StartingNetWorth => self.assumptions.starting_net_worth,
            P::Income => self.assumptions.income,
            P::AnnualNonHousingSpending => self.assumptions.annual_non_housing_spending,
            P::PropertyValue => self.rent_out.current_property_value,
            P::MonthlyRentalIncome => self.rent_out.monthly_rental_income,
            P::RentalIncomeGrowthRate => self.rent_out.rental_income_growth_rate,
            P::PropertyManagementFeePct => self.rent_out.property_management_fee_pct,
            P::VacancyRate => self.rent_out.vacancy_rate,
            P::RentalAppreciationRate => self.rent_out.rental_appreciation_rate,
            P::RentalPropertyTaxRate => self.rent_out.rental_property_tax_rate,
            P::SellingCostPct => self.sell.selling_cost_pct,
            P::OriginalPurchasePrice => self.sell.original_purchase_price,
            P::NewMonthlyRent => self.assumptions.new_monthly_rent,
        }
    }

    pub fn with_override(&self, parameter: RentOutVsSellParameter, value: f64) -> Self {
        use RentOutVsSellParameter as P;
        let mut next = self.clone();
        match parameter {
            P::InvestmentReturnRate => next.assumptions.investment_return_rate = value,
            P::InflationRate => next.assumptions.inflation_rate = value,
            P::TimeHorizonYears => next.assumptions.time_horizon_years = horizon_years(value),
            P::StartingNetWorth => next.assumptions.starting_net_worth = value,
            P::Income => next.assumptions.income = value,
            P::AnnualNonHousingSpending => next.assumptions.annual_non_housing_spending = value,
            P::PropertyValue => {
                next.rent_out.current_property_value = value;
                next.sell.current_property_value = value;
            }
            P::MonthlyRentalIncome => next.rent_out.monthly_rental_income = value,
            P::RentalIncomeGrowthRate => next.rent_out.rental_income_growth_rate = value,
            P::PropertyManagementFeePct => next.rent_out.property_management_fee_pct = value,
            P::VacancyRate => next.rent_out.vacancy_rate = value,
            P::RentalAppreciationRate => next.rent_out.rental_appreciation_rate = value,
            P::RentalPropertyTaxRate => next.rent_out.rental_property_tax_rate = value,
            P::SellingCostPct => next.sell.selling_cost_pct = value,
            P::OriginalPurchasePrice => next.sell.original_purchase_price = value,
            P::NewMonthlyRent => next.assumptions.new_monthly_rent = value,
        }
        next
    }
}
