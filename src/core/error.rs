use thiserror::Error;

// Every variant is raised before any month is simulated; the monthly
// arithmetic itself cannot fail once a calculator exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error(
        "rent-out and sell scenarios must use the same current property value \
         (rent-out ${rent_out_value:.0}, sell ${sell_value:.0})"
    )]
    InconsistentScenario { rent_out_value: f64, sell_value: f64 },
    #[error(
        "starting net worth (${starting_net_worth:.0}) is insufficient for down payment (${required:.0})"
    )]
    InsufficientCapital { starting_net_worth: f64, required: f64 },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ScenarioError {
    pub fn is_insufficient_capital(&self) -> bool {
        matches!(self, ScenarioError::InsufficientCapital { .. })
    }
}
