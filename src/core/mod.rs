pub mod costs;
pub mod engine;
pub mod error;
pub mod mortgage;
pub mod rent_out_vs_sell;
pub mod rent_vs_buy;
pub mod sensitivity;
pub mod tax;
mod types;

pub use error::ScenarioError;
pub use rent_out_vs_sell::RentOutVsSellCalculator;
pub use rent_vs_buy::RentVsBuyCalculator;
pub use sensitivity::{
    BreakevenPoint, BreakevenSolveConfig, BreakevenSolveResult, DEFAULT_BREAKEVEN_TOLERANCE,
    ParameterSweep, SensitivityAnalysis, SensitivityRank, SweepParameter, SweepPoint,
    SweepableScenario, rank_sensitivities,
};
pub use types::{
    Assumptions, BuyScenario, FilingStatus, HomeownerMonth, MAX_HORIZON_YEARS, MarketDefaults, RentOutMonth,
    RentOutScenario, RentOutVsSellAnalysis, RentOutVsSellAssumptions, RentOutVsSellInputs,
    RentOutVsSellMonth, RentOutVsSellParameter, RentOutVsSellSummary, RentScenario,
    RentVsBuyAnalysis, RentVsBuyInputs, RentVsBuyMonth, RentVsBuyParameter, RentVsBuySummary,
    RenterMonth, SellMonth, SellScenario, TerminalOutcome, Winner,
};
