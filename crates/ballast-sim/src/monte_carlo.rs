//! Monte Carlo simulation of portfolio value
//!
//! Each scenario compounds daily returns
//!
//! r_t = μ/D + σ/√D · z_t,  z_t ~ N(0, 1)
//!
//! where D is the number of trading days per year, tracking the running peak
//! and the worst drawdown along the way. Scenarios are independent and run on
//! the rayon pool; each draws from its own stream so a seeded run is
//! reproducible bit for bit.

use crate::distribution::DistributionSummary;
use crate::error::{Result, SimulationError};
use crate::rng::{SeededStreams, StreamFactory, UniformSource, standard_normal};
use ballast_core::{Completion, RunControl};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of scenarios (default: 10,000)
    pub num_scenarios: usize,

    /// Trading days to simulate (default: 252)
    pub horizon_days: usize,

    /// Trading days per year used to de-annualize μ and σ (default: 252)
    pub trading_days_per_year: usize,

    /// Full paths retained for display (default: 10)
    pub sample_paths: usize,

    /// Base seed; a fresh one is drawn and reported when absent
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            num_scenarios: 10_000,
            horizon_days: 252,
            trading_days_per_year: 252,
            sample_paths: 10,
            seed: None,
        }
    }
}

/// Annualized drift and volatility of the simulated portfolio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GbmParameters {
    /// Starting portfolio value (> 0)
    pub initial_capital: f64,
    /// Annualized expected return μ
    pub expected_return: f64,
    /// Annualized volatility σ (≥ 0)
    pub volatility: f64,
}

impl GbmParameters {
    fn validate(&self) -> Result<()> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(SimulationError::InvalidInput(format!(
                "initial capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !self.expected_return.is_finite() {
            return Err(SimulationError::InvalidInput(format!(
                "expected return must be finite, got {}",
                self.expected_return
            )));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(SimulationError::InvalidInput(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        Ok(())
    }
}

/// One simulated path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloScenario {
    /// Scenario index
    pub index: usize,
    /// Portfolio value at each day, starting with the initial capital
    pub path: Vec<f64>,
    /// Value after the last day
    pub final_value: f64,
    /// Worst peak-to-trough decline along the path (≤ 0)
    pub max_drawdown: f64,
}

/// Aggregated simulation output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloResult {
    /// Starting portfolio value
    pub initial_capital: f64,
    /// Final value distribution
    pub distribution: DistributionSummary,
    /// Mean of per-scenario max drawdowns
    pub mean_max_drawdown: f64,
    /// Worst per-scenario max drawdown
    pub worst_max_drawdown: f64,
    /// Retained sample paths (lowest scenario indices)
    pub sample_scenarios: Vec<MonteCarloScenario>,
    /// Seed the run used
    pub seed: u64,
    /// Scenarios that finished
    pub scenarios_completed: usize,
    /// Whether every requested scenario finished
    pub completion: Completion,
}

struct Outcome {
    final_value: f64,
    max_drawdown: f64,
    path: Option<Vec<f64>>,
}

/// Parallel Monte Carlo simulator
#[derive(Debug, Clone, Default)]
pub struct MonteCarloSimulator {
    config: MonteCarloConfig,
}

impl MonteCarloSimulator {
    /// Create a simulator, validating the configuration.
    pub fn new(config: MonteCarloConfig) -> Result<Self> {
        if config.num_scenarios == 0 {
            return Err(SimulationError::InvalidInput(
                "at least one scenario is required".into(),
            ));
        }
        if config.horizon_days == 0 {
            return Err(SimulationError::InvalidInput(
                "horizon must be at least one day".into(),
            ));
        }
        if config.trading_days_per_year == 0 {
            return Err(SimulationError::InvalidInput(
                "trading days per year must be positive".into(),
            ));
        }
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    /// Simulate with `StdRng` streams from the configured seed (or a fresh one).
    pub fn simulate(&self, params: &GbmParameters, control: &RunControl) -> Result<MonteCarloResult> {
        let streams = self
            .config
            .seed
            .map_or_else(SeededStreams::from_entropy, SeededStreams::new);
        self.simulate_with(params, &streams, streams.seed(), control)
    }

    /// Simulate with caller-supplied streams. `seed` is only reported.
    ///
    /// # Errors
    /// * `InvalidInput` for non-positive capital, negative volatility or non-finite drift
    /// * `DataQuality` when a scenario ends at NaN or infinity
    /// * `Timeout` when `control` stops the run before any scenario finishes
    pub fn simulate_with<F: StreamFactory>(
        &self,
        params: &GbmParameters,
        streams: &F,
        seed: u64,
        control: &RunControl,
    ) -> Result<MonteCarloResult> {
        params.validate()?;
        let requested = self.config.num_scenarios;
        let days_per_year = self.config.trading_days_per_year as f64;
        let drift = params.expected_return / days_per_year;
        let shock = params.volatility / days_per_year.sqrt();

        let outcomes: Vec<Option<Outcome>> = (0..requested)
            .into_par_iter()
            .map(|index| {
                if control.should_stop() {
                    return None;
                }
                let mut stream = streams.stream(index as u64);
                let keep_path = index < self.config.sample_paths;
                let outcome = self.run_scenario(params.initial_capital, drift, shock, &mut stream, keep_path);
                control.tick();
                Some(outcome)
            })
            .collect();

        let mut finals = Vec::with_capacity(requested);
        let mut drawdowns = Vec::with_capacity(requested);
        let mut sample_scenarios = Vec::new();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let Some(outcome) = outcome else { continue };
            if !outcome.final_value.is_finite() {
                return Err(SimulationError::DataQuality(format!(
                    "scenario {index} ended at {}",
                    outcome.final_value
                )));
            }
            finals.push(outcome.final_value);
            drawdowns.push(outcome.max_drawdown);
            if let Some(path) = outcome.path {
                sample_scenarios.push(MonteCarloScenario {
                    index,
                    path,
                    final_value: outcome.final_value,
                    max_drawdown: outcome.max_drawdown,
                });
            }
        }

        let completed = finals.len();
        let completion = control.completion(completed, requested);
        if let Completion::Incomplete { reason, .. } = completion {
            if completed == 0 {
                return Err(SimulationError::Timeout { reason });
            }
            warn!(completed, requested, ?reason, "simulation stopped early");
        }

        let distribution = DistributionSummary::from_final_values(params.initial_capital, &finals)?;
        debug!(
            var_95 = distribution.var_95,
            cvar_95 = distribution.cvar_95,
            probability_of_loss = distribution.probability_of_loss,
            "aggregated final values"
        );
        let mean_max_drawdown = drawdowns.iter().sum::<f64>() / completed as f64;
        let worst_max_drawdown = drawdowns.iter().copied().fold(0.0, f64::min);

        info!(
            scenarios = completed,
            horizon_days = self.config.horizon_days,
            seed,
            median = distribution.percentiles.p50,
            "Monte Carlo simulation finished"
        );

        Ok(MonteCarloResult {
            initial_capital: params.initial_capital,
            distribution,
            mean_max_drawdown,
            worst_max_drawdown,
            sample_scenarios,
            seed,
            scenarios_completed: completed,
            completion,
        })
    }

    fn run_scenario<U: UniformSource>(
        &self,
        initial: f64,
        drift: f64,
        shock: f64,
        stream: &mut U,
        keep_path: bool,
    ) -> Outcome {
        let horizon = self.config.horizon_days;
        let mut path = keep_path.then(|| {
            let mut p = Vec::with_capacity(horizon + 1);
            p.push(initial);
            p
        });

        let mut value = initial;
        let mut peak = initial;
        let mut max_drawdown: f64 = 0.0;
        for _ in 0..horizon {
            let daily_return = drift + shock * standard_normal(stream);
            value *= 1.0 + daily_return;
            peak = peak.max(value);
            if peak > 0.0 {
                max_drawdown = max_drawdown.min((value - peak) / peak);
            }
            if let Some(p) = path.as_mut() {
                p.push(value);
            }
        }
        Outcome {
            final_value: value,
            max_drawdown,
            path,
        }
    }
}
