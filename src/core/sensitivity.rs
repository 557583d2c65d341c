use std::fmt;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::ScenarioError;
use super::rent_out_vs_sell::RentOutVsSellCalculator;
use super::rent_vs_buy::RentVsBuyCalculator;
use super::types::{
    RentOutVsSellInputs, RentOutVsSellParameter, RentVsBuyInputs, RentVsBuyParameter,
    TerminalOutcome, Winner,
};

pub const DEFAULT_BREAKEVEN_TOLERANCE: f64 = 10_000.0;

pub trait SweepParameter: Copy + PartialEq + fmt::Debug + fmt::Display + Serialize + Send + Sync {
    // Rates and percentages are stored as fractions; everything else is
    // dollars or years.
    fn is_rate(self) -> bool;
    fn is_years(self) -> bool;
}

impl SweepParameter for RentVsBuyParameter {
    fn is_rate(self) -> bool {
        RentVsBuyParameter::is_rate(self)
    }

    fn is_years(self) -> bool {
        self == RentVsBuyParameter::TimeHorizonYears
    }
}

impl SweepParameter for RentOutVsSellParameter {
    fn is_rate(self) -> bool {
        RentOutVsSellParameter::is_rate(self)
    }

    fn is_years(self) -> bool {
        self == RentOutVsSellParameter::TimeHorizonYears
    }
}

pub trait SweepableScenario: Clone + Send + Sync {
    type Parameter: SweepParameter;

    fn base_value(&self, parameter: Self::Parameter) -> f64;
    fn with_override(&self, parameter: Self::Parameter, value: f64) -> Self;
    fn evaluate(&self) -> Result<TerminalOutcome, ScenarioError>;

    fn default_plan() -> Vec<(Self::Parameter, Vec<f64>)>;

    fn breakeven_plan() -> Vec<(Self::Parameter, Vec<f64>)>;
}

fn stepped(start: f64, end: f64, step: f64) -> Vec<f64> {
    let count = ((end - start) / step).round() as usize;
    (0..=count).map(|i| start + step * i as f64).collect()
}

impl SweepableScenario for RentVsBuyInputs {
    type Parameter = RentVsBuyParameter;

    fn base_value(&self, parameter: Self::Parameter) -> f64 {
        self.parameter(parameter)
    }

    fn with_override(&self, parameter: Self::Parameter, value: f64) -> Self {
        RentVsBuyInputs::with_override(self, parameter, value)
    }

    fn evaluate(&self) -> Result<TerminalOutcome, ScenarioError> {
        let calculator = RentVsBuyCalculator::from_inputs(self.clone())?;
        Ok(TerminalOutcome::from(&calculator.run_analysis().summary))
    }

    fn default_plan() -> Vec<(Self::Parameter, Vec<f64>)> {
        use RentVsBuyParameter as P;
        vec![
            (
                P::InvestmentReturnRate,
                vec![0.04, 0.06, 0.07, 0.08, 0.09, 0.10, 0.12],
            ),
            (P::InflationRate, vec![0.01, 0.02, 0.025, 0.03, 0.04]),
            (
                P::TimeHorizonYears,
                vec![5.0, 7.0, 10.0, 15.0, 20.0, 25.0, 30.0],
            ),
            (
                P::StartingNetWorth,
                vec![140_000.0, 200_000.0, 300_000.0, 500_000.0, 750_000.0],
            ),
            (
                P::PurchasePrice,
                vec![
                    500_000.0, 600_000.0, 700_000.0, 800_000.0, 900_000.0, 1_000_000.0,
                ],
            ),
            (P::DownPaymentPct, vec![0.05, 0.10, 0.15, 0.20, 0.25, 0.30]),
            (
                P::MortgageRate,
                vec![0.03, 0.035, 0.04, 0.045, 0.05, 0.055, 0.06, 0.07],
            ),
            (
                P::HomeAppreciationRate,
                vec![0.02, 0.03, 0.04, 0.0495, 0.05, 0.06, 0.07],
            ),
            (
                P::PropertyTaxRate,
                vec![0.005, 0.01, 0.015, 0.02, 0.025, 0.03],
            ),
            (
                P::HoaMonthly,
                vec![0.0, 200.0, 400.0, 550.0, 700.0, 1_000.0],
            ),
            (
                P::MonthlyRent,
                vec![1_500.0, 2_000.0, 2_500.0, 3_000.0, 3_500.0, 4_000.0, 4_500.0],
            ),
        ]
    }

    fn breakeven_plan() -> Vec<(Self::Parameter, Vec<f64>)> {
        use RentVsBuyParameter as P;
        vec![
            (P::InvestmentReturnRate, stepped(0.030, 0.145, 0.005)),
            (P::HomeAppreciationRate, stepped(0.010, 0.095, 0.005)),
            (P::MonthlyRent, stepped(1_000.0, 4_900.0, 100.0)),
        ]
    }
}

impl SweepableScenario for RentOutVsSellInputs {
    type Parameter = RentOutVsSellParameter;

    fn base_value(&self, parameter: Self::Parameter) -> f64 {
        self.parameter(parameter)
    }

    fn with_override(&self, parameter: Self::Parameter, value: f64) -> Self {
        RentOutVsSellInputs::with_override(self, parameter, value)
    }

    fn evaluate(&self) -> Result<TerminalOutcome, ScenarioError> {
        let calculator = RentOutVsSellCalculator::from_inputs(self.clone())?;
        Ok(TerminalOutcome::from(&calculator.run_analysis().summary))
    }

    fn default_plan() -> Vec<(Self::Parameter, Vec<f64>)> {
        use RentOutVsSellParameter as P;
        vec![
            (
                P::InvestmentReturnRate,
                vec![0.04, 0.06, 0.07, 0.08, 0.09, 0.10, 0.12],
            ),
            (P::InflationRate, vec![0.01, 0.02, 0.025, 0.03, 0.04]),
            (
                P::TimeHorizonYears,
                vec![5.0, 7.0, 10.0, 15.0, 20.0, 25.0, 30.0],
            ),
            (
                P::PropertyValue,
                vec![
                    500_000.0, 600_000.0, 700_000.0, 800_000.0, 900_000.0, 1_000_000.0,
                ],
            ),
            (
                P::MonthlyRentalIncome,
                vec![2_000.0, 2_500.0, 3_000.0, 3_500.0, 4_000.0, 5_000.0, 6_000.0],
            ),
            (
                P::RentalAppreciationRate,
                vec![0.02, 0.03, 0.04, 0.05, 0.06, 0.07],
            ),
            (P::VacancyRate, vec![0.0, 0.05, 0.10, 0.15]),
            (
                P::PropertyManagementFeePct,
                vec![0.0, 0.05, 0.08, 0.10, 0.12],
            ),
            (
                P::RentalPropertyTaxRate,
                vec![0.005, 0.01, 0.015, 0.02, 0.025, 0.03],
            ),
            (
                P::NewMonthlyRent,
                vec![1_500.0, 2_000.0, 2_500.0, 3_000.0, 3_500.0, 4_000.0, 4_500.0],
            ),
        ]
    }

    fn breakeven_plan() -> Vec<(Self::Parameter, Vec<f64>)> {
        use RentOutVsSellParameter as P;
        vec![
            (P::InvestmentReturnRate, stepped(0.030, 0.145, 0.005)),
            (P::RentalAppreciationRate, stepped(0.010, 0.095, 0.005)),
            (P::MonthlyRentalIncome, stepped(1_000.0, 4_900.0, 100.0)),
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepPoint {
    pub parameter_value: f64,
    #[serde(flatten)]
    pub outcome: TerminalOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterSweep<P> {
    pub parameter: P,
    pub base_value: f64,
    pub base_net_worth_difference: f64,
    pub points: Vec<SweepPoint>,
    // Values whose scenario could not be built, e.g. a down payment above
    // the starting net worth.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BreakevenPoint<P> {
    pub parameter: P,
    pub value: f64,
    pub net_worth_difference: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensitivityRank<P> {
    pub parameter: P,
    pub spread: f64,
    pub min_difference: f64,
    pub max_difference: f64,
    pub winners: Vec<Winner>,
}

impl<P> SensitivityRank<P> {
    pub fn winner_changes(&self) -> bool {
        self.winners.len() > 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakevenSolveConfig<P> {
    pub parameter: P,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BreakevenIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_value: f64,
    pub net_worth_difference: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakevenSolveResult<P> {
    pub parameter: P,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub solved_value: Option<f64>,
    pub net_worth_difference: Option<f64>,
    pub iterations: Vec<BreakevenIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SensitivityAnalysis<S: SweepableScenario> {
    base: S,
    base_outcome: TerminalOutcome,
}

impl<S: SweepableScenario> SensitivityAnalysis<S> {
    pub fn new(base: S) -> Result<Self, ScenarioError> {
        let base_outcome = base.evaluate()?;
        Ok(Self { base, base_outcome })
    }

    pub fn base(&self) -> &S {
        &self.base
    }

    pub fn base_outcome(&self) -> &TerminalOutcome {
        &self.base_outcome
    }

    fn evaluate_at(&self, parameter: S::Parameter, value: f64) -> Result<TerminalOutcome, ScenarioError> {
        self.base.with_override(parameter, value).evaluate()
    }

    pub fn analyze_parameter(&self, parameter: S::Parameter, values: &[f64]) -> ParameterSweep<S::Parameter> {
        let evaluated: Vec<(f64, Result<TerminalOutcome, ScenarioError>)> = values
            .par_iter()
            .map(|&value| (value, self.evaluate_at(parameter, value)))
            .collect();

        let mut points = Vec::with_capacity(evaluated.len());
        let mut skipped = 0;
        for (value, result) in evaluated {
            match result {
                Ok(outcome) => points.push(SweepPoint {
                    parameter_value: value,
                    outcome,
                }),
                Err(err) => {
                    warn!(%parameter, value, error = %err, "skipping sweep point");
                    skipped += 1;
                }
            }
        }

        debug!(%parameter, points = points.len(), skipped, "parameter sweep complete");
        ParameterSweep {
            parameter,
            base_value: self.base.base_value(parameter),
            base_net_worth_difference: self.base_outcome.net_worth_difference,
            points,
            skipped,
        }
    }

    pub fn comprehensive_analysis(&self) -> Vec<ParameterSweep<S::Parameter>> {
        let sweeps: Vec<_> = S::default_plan()
            .iter()
            .map(|(parameter, values)| self.analyze_parameter(*parameter, values))
            .collect();
        info!(parameters = sweeps.len(), "sensitivity analysis complete");
        sweeps
    }

    // First candidate, in order, whose outcome is within `tolerance` of a
    // tie. Candidates that cannot be built are passed over.
    pub fn find_breakeven(
        &self,
        parameter: S::Parameter,
        candidates: &[f64],
        tolerance: f64,
    ) -> Option<BreakevenPoint<S::Parameter>> {
        candidates
            .par_iter()
            .filter_map(|&value| {
                let outcome = self.evaluate_at(parameter, value).ok()?;
                (outcome.net_worth_difference.abs() < tolerance).then_some(BreakevenPoint {
                    parameter,
                    value,
                    net_worth_difference: outcome.net_worth_difference,
                })
            })
            .find_first(|_| true)
    }

    pub fn default_breakeven_points(&self) -> Vec<BreakevenPoint<S::Parameter>> {
        S::breakeven_plan()
            .iter()
            .filter_map(|(parameter, candidates)| {
                self.find_breakeven(*parameter, candidates, DEFAULT_BREAKEVEN_TOLERANCE)
            })
            .collect()
    }

    pub fn solve_breakeven(
        &self,
        config: BreakevenSolveConfig<S::Parameter>,
    ) -> Result<BreakevenSolveResult<S::Parameter>, ScenarioError> {
        validate_config(&config)?;

        let mut lo = config.search_min;
        let mut hi = config.search_max;
        let mut lo_diff = self.evaluate_at(config.parameter, lo)?.net_worth_difference;
        let hi_diff = self.evaluate_at(config.parameter, hi)?.net_worth_difference;

        let mut iterations = Vec::with_capacity(config.max_iterations as usize);
        let mut solved_value = None;
        let mut converged = false;
        let feasible;
        let message;

        if lo_diff == 0.0 {
            solved_value = Some(lo);
            converged = true;
            feasible = true;
            message = "Lower bound is already a tie.".to_string();
        } else if hi_diff == 0.0 {
            solved_value = Some(hi);
            converged = true;
            feasible = true;
            message = "Upper bound is already a tie.".to_string();
        } else if lo_diff.signum() == hi_diff.signum() {
            feasible = false;
            message = "Net worth difference does not change sign within the search bounds."
                .to_string();
        } else {
            let mut it = 0;
            while it < config.max_iterations {
                it += 1;
                let mid = (lo + hi) * 0.5;
                let mid_diff = self.evaluate_at(config.parameter, mid)?.net_worth_difference;
                iterations.push(BreakevenIteration {
                    iteration: it,
                    lower_bound: lo,
                    upper_bound: hi,
                    candidate_value: mid,
                    net_worth_difference: mid_diff,
                });

                if mid_diff.signum() == lo_diff.signum() {
                    lo = mid;
                    lo_diff = mid_diff;
                } else {
                    hi = mid;
                }

                if (hi - lo).abs() <= config.tolerance {
                    converged = true;
                    break;
                }
            }
            solved_value = Some((lo + hi) * 0.5);
            feasible = true;
            message = if converged {
                "Solved breakeven value.".to_string()
            } else {
                "Reached max iterations before tolerance was met; returning best estimate."
                    .to_string()
            };
        }

        let net_worth_difference = match solved_value {
            Some(value) => Some(self.evaluate_at(config.parameter, value)?.net_worth_difference),
            None => None,
        };

        Ok(BreakevenSolveResult {
            parameter: config.parameter,
            search_min: config.search_min,
            search_max: config.search_max,
            tolerance: config.tolerance,
            solved_value,
            net_worth_difference,
            iterations,
            converged,
            feasible,
            message,
        })
    }
}

fn validate_config<P>(config: &BreakevenSolveConfig<P>) -> Result<(), ScenarioError> {
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(ScenarioError::InvalidInput(
            "search bounds must be finite".to_string(),
        ));
    }
    if config.search_max <= config.search_min {
        return Err(ScenarioError::InvalidInput(
            "search_max must be greater than search_min".to_string(),
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(ScenarioError::InvalidInput("tolerance must be > 0".to_string()));
    }
    if config.max_iterations == 0 {
        return Err(ScenarioError::InvalidInput(
            "max_iterations must be > 0".to_string(),
        ));
    }
    Ok(())
}

// Orders sweeps by how far the net worth difference moves across them,
// widest first. Sweeps with fewer than two points are left out.
pub fn rank_sensitivities<P: Copy>(sweeps: &[ParameterSweep<P>]) -> Vec<SensitivityRank<P>> {
    let mut ranks: Vec<SensitivityRank<P>> = sweeps
        .iter()
        .filter(|sweep| sweep.points.len() > 1)
        .map(|sweep| {
            let diffs = sweep.points.iter().map(|p| p.outcome.net_worth_difference);
            let min_difference = diffs.clone().fold(f64::INFINITY, f64::min);
            let max_difference = diffs.fold(f64::NEG_INFINITY, f64::max);

            let mut winners = Vec::new();
            for point in &sweep.points {
                if !winners.contains(&point.outcome.winner) {
                    winners.push(point.outcome.winner);
                }
            }

            SensitivityRank {
                parameter: sweep.parameter,
                spread: max_difference - min_difference,
                min_difference,
                max_difference,
                winners,
            }
        })
        .collect();

    ranks.sort_by(|a, b| b.spread.total_cmp(&a.spread));
    ranks
}
