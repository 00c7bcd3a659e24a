//! Request/response facade over the component crates.
//!
//! [`RiskEngine`] holds validated component instances built once from an
//! [`EngineConfig`]. Every method takes plain data and returns a serializable
//! result; the engine keeps no state between calls.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use ballast_core::{
    AssetId, CovarianceEstimator, MarketStatistics, PortfolioWeights, ReturnSeries, RunControl,
    StatsError,
};
use ballast_risk::{
    DrawdownAnalysis, DrawdownAssessment, PortfolioSnapshot, RiskAggregator, RiskMetricsSnapshot,
    analyze_drawdown,
};
use ballast_sim::{GbmParameters, MonteCarloConfig, MonteCarloResult, MonteCarloSimulator};
use ballast_sizing::{
    Frontier, KellyCalculator, KellyInput, KellyResult, MeanVarianceOptimizer,
    PortfolioOptimization, RiskParityAllocation, RiskParityAllocator, efficient_frontier,
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

/// Monte Carlo request
///
/// `horizon_days`, `num_scenarios` and `seed` fall back to the engine's
/// [`MonteCarloConfig`] when omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Starting portfolio value
    pub initial_capital: f64,
    /// Annualized expected return μ
    pub expected_return: f64,
    /// Annualized volatility σ
    pub volatility: f64,
    /// Trading days to simulate
    #[serde(default)]
    pub horizon_days: Option<usize>,
    /// Number of scenarios
    #[serde(default)]
    pub num_scenarios: Option<usize>,
    /// Seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationRequest {
    /// Request with the configured horizon, scenario count and seed.
    pub const fn new(initial_capital: f64, expected_return: f64, volatility: f64) -> Self {
        Self {
            initial_capital,
            expected_return,
            volatility,
            horizon_days: None,
            num_scenarios: None,
            seed: None,
        }
    }

    /// Override the horizon.
    pub const fn with_horizon_days(mut self, horizon_days: usize) -> Self {
        self.horizon_days = Some(horizon_days);
        self
    }

    /// Override the scenario count.
    pub const fn with_scenarios(mut self, num_scenarios: usize) -> Self {
        self.num_scenarios = Some(num_scenarios);
        self
    }

    /// Fix the seed.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Drawdown statistics together with the policy's verdict on the latest value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownReport {
    /// Path statistics
    pub analysis: DrawdownAnalysis,
    /// Action for the current drawdown
    pub assessment: DrawdownAssessment,
}

/// Stateless risk and allocation engine
pub struct RiskEngine {
    config: EngineConfig,
    estimator: Box<dyn CovarianceEstimator + Send + Sync>,
    kelly: KellyCalculator,
    optimizer: MeanVarianceOptimizer,
    parity: RiskParityAllocator,
    aggregator: RiskAggregator,
}

impl fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiskEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RiskEngine {
    /// Build an engine, validating every component configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let estimator = config.covariance.estimator()?;
        let kelly = KellyCalculator::new(config.kelly.clone())?;
        let optimizer = MeanVarianceOptimizer::new(config.optimizer.clone())?;
        let parity = RiskParityAllocator::new(config.risk_parity.clone())?;
        let aggregator = RiskAggregator::new(config.aggregator.clone())?;
        config.frontier.grid()?;
        config.drawdown.validate()?;
        MonteCarloSimulator::new(config.monte_carlo.clone())?;

        Ok(Self {
            config,
            estimator,
            kelly,
            optimizer,
            parity,
            aggregator,
        })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Kelly position size from win rate and average win/loss magnitudes.
    ///
    /// `confidence_factor` scales full Kelly (1.0 when omitted).
    pub fn compute_kelly(
        &self,
        win_rate: f64,
        avg_win: f64,
        avg_loss: f64,
        confidence_factor: Option<f64>,
    ) -> Result<KellyResult> {
        let input = KellyInput::new(win_rate, avg_win, avg_loss);
        let input = confidence_factor.map_or(input, |c| input.with_confidence(c));
        Ok(self.kelly.compute(&input)?)
    }

    /// Kelly position size estimated from a per-trade return history.
    pub fn compute_kelly_from_trades(
        &self,
        trades: &[f64],
        confidence_factor: Option<f64>,
    ) -> Result<KellyResult> {
        let input = KellyInput::from_trade_returns(trades)?;
        let input = confidence_factor.map_or(input, |c| input.with_confidence(c));
        debug!(
            trades = trades.len(),
            win_probability = input.win_probability,
            "estimated Kelly inputs from trades"
        );
        Ok(self.kelly.compute(&input)?)
    }

    /// Annualized market statistics from return histories with the configured
    /// covariance estimator.
    ///
    /// `expected_returns` replaces the historical means when given.
    pub fn market_statistics(
        &self,
        histories: &[ReturnSeries],
        expected_returns: Option<&[f64]>,
    ) -> Result<MarketStatistics> {
        let market = MarketStatistics::from_return_series(histories, self.estimator.as_ref())?;
        let market = match expected_returns {
            Some(mu) => market.with_expected_returns(Array1::from(mu.to_vec()))?,
            None => market,
        };
        debug!(
            assets = market.len(),
            observations = market.observations(),
            "estimated market statistics"
        );
        Ok(market)
    }

    /// Mean-variance weights for `assets` at one risk tolerance.
    ///
    /// `expected_returns` is aligned with `assets`; histories are looked up by
    /// asset id, so their order does not matter.
    pub fn optimize_portfolio(
        &self,
        assets: &[AssetId],
        expected_returns: &[f64],
        histories: &[ReturnSeries],
        risk_tolerance: f64,
        control: &RunControl,
    ) -> Result<PortfolioOptimization> {
        if expected_returns.len() != assets.len() {
            return Err(StatsError::DimensionMismatch {
                expected: assets.len(),
                actual: expected_returns.len(),
            }
            .into());
        }
        let selected = select_histories(assets, histories)?;
        let market = self.market_statistics(&selected, Some(expected_returns))?;
        let result = self.optimizer.optimize(&market, risk_tolerance, control)?;
        info!(
            assets = assets.len(),
            risk_tolerance,
            expected_return = result.expected_return,
            volatility = result.expected_volatility,
            complete = result.completion.is_complete(),
            "optimized portfolio"
        );
        Ok(result)
    }

    /// Efficient frontier over the configured risk-tolerance grid, sorted by risk.
    pub fn efficient_frontier(
        &self,
        histories: &[ReturnSeries],
        expected_returns: Option<&[f64]>,
        control: &RunControl,
    ) -> Result<Frontier> {
        let market = self.market_statistics(histories, expected_returns)?;
        let frontier =
            efficient_frontier(&self.optimizer, &market, &self.config.frontier, control)?;
        info!(
            points = frontier.len(),
            assets = market.len(),
            complete = frontier.completion.is_complete(),
            "traced efficient frontier"
        );
        Ok(frontier)
    }

    /// Risk-parity allocation for `assets`.
    ///
    /// Without `current_weights` the inverse-volatility portfolio is reported
    /// as the current allocation.
    pub fn compute_risk_parity(
        &self,
        assets: &[AssetId],
        histories: &[ReturnSeries],
        current_weights: Option<&PortfolioWeights>,
    ) -> Result<Vec<RiskParityAllocation>> {
        let selected = select_histories(assets, histories)?;
        let market = self.market_statistics(&selected, None)?;
        let allocations = self.parity.allocate(&market, current_weights)?;
        info!(
            assets = allocations.len(),
            method = %self.config.risk_parity.method,
            "computed risk parity allocation"
        );
        Ok(allocations)
    }

    /// Simulate portfolio value paths under geometric Brownian motion.
    pub fn run_monte_carlo(
        &self,
        request: &SimulationRequest,
        control: &RunControl,
    ) -> Result<MonteCarloResult> {
        let defaults = &self.config.monte_carlo;
        let simulator = MonteCarloSimulator::new(MonteCarloConfig {
            num_scenarios: request.num_scenarios.unwrap_or(defaults.num_scenarios),
            horizon_days: request.horizon_days.unwrap_or(defaults.horizon_days),
            seed: request.seed.or(defaults.seed),
            ..defaults.clone()
        })?;
        let params = GbmParameters {
            initial_capital: request.initial_capital,
            expected_return: request.expected_return,
            volatility: request.volatility,
        };
        Ok(simulator.simulate(&params, control)?)
    }

    /// Drawdown statistics of a value series.
    pub fn analyze_drawdown(&self, values: &[f64]) -> Result<DrawdownAnalysis> {
        let analysis = analyze_drawdown(values)?;
        debug!(
            observations = values.len(),
            max_drawdown = analysis.max_drawdown,
            current_drawdown = analysis.current_drawdown,
            "analyzed drawdown"
        );
        Ok(analysis)
    }

    /// Drawdown statistics plus the configured policy's action for the
    /// current drawdown.
    pub fn drawdown_report(&self, values: &[f64]) -> Result<DrawdownReport> {
        let analysis = self.analyze_drawdown(values)?;
        let assessment = self.config.drawdown.assess(analysis.current_drawdown);
        Ok(DrawdownReport {
            analysis,
            assessment,
        })
    }

    /// Composite risk report for a portfolio snapshot.
    pub fn compute_risk_metrics(&self, snapshot: &PortfolioSnapshot) -> Result<RiskMetricsSnapshot> {
        let report = self.aggregator.assess(snapshot)?;
        info!(
            composite = report.composite_score,
            classification = %report.classification,
            "computed risk metrics"
        );
        Ok(report)
    }
}

fn select_histories(assets: &[AssetId], histories: &[ReturnSeries]) -> Result<Vec<ReturnSeries>> {
    if assets.is_empty() {
        return Err(EngineError::invalid("at least one asset is required"));
    }
    assets
        .iter()
        .map(|asset| {
            histories
                .iter()
                .find(|s| s.asset_id() == asset)
                .cloned()
                .ok_or_else(|| EngineError::invalid(format!("no return history for {asset}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CovarianceConfig;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;
    use ballast_core::{CancellationToken, EwmaConfig};
    use ballast_risk::DrawdownAction;

    fn histories() -> Vec<ReturnSeries> {
        let make = |id: &str, scale: f64, phase: f64| {
            let values = (0..60)
                .map(|t| scale * ((t as f64) * 0.7 + phase).sin() + 0.0004)
                .collect();
            ReturnSeries::daily(id, values).unwrap()
        };
        vec![
            make("AAA", 0.010, 0.0),
            make("BBB", 0.020, 1.3),
            make("CCC", 0.015, 2.1),
        ]
    }

    fn ids(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|n| AssetId::new(*n)).collect()
    }

    #[test]
    fn test_kelly_default_confidence() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let full = engine.compute_kelly(0.6, 1.0, 1.0, None).unwrap();
        assert_relative_eq!(full.raw_fraction, 0.2, epsilon = 1e-12);
        assert_relative_eq!(full.optimal_fraction, 0.2, epsilon = 1e-12);

        let half = engine.compute_kelly(0.6, 1.0, 1.0, Some(0.5)).unwrap();
        assert_relative_eq!(half.optimal_fraction, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_kelly_from_trades() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let result = engine
            .compute_kelly_from_trades(&[0.02, -0.01, 0.02, -0.01, 0.0], None)
            .unwrap();
        assert_relative_eq!(result.win_probability, 0.5, epsilon = 1e-12);
        assert_relative_eq!(result.payoff_ratio, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_optimize_looks_up_histories_by_id() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let assets = ids(&["CCC", "AAA"]);
        let result = engine
            .optimize_portfolio(&assets, &[0.08, 0.05], &histories(), 1.0, &RunControl::default())
            .unwrap();
        let names: Vec<&str> = result
            .weights
            .entries()
            .iter()
            .map(|w| w.asset.as_str())
            .collect();
        assert_eq!(names, ["CCC", "AAA"]);
        assert_relative_eq!(result.weights.to_array().sum(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_optimize_rejects_bad_requests() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let control = RunControl::default();

        let mismatch = engine
            .optimize_portfolio(&ids(&["AAA", "BBB"]), &[0.05], &histories(), 1.0, &control)
            .unwrap_err();
        assert_eq!(mismatch.kind(), ErrorKind::InvalidInput);

        let unknown = engine
            .optimize_portfolio(&ids(&["ZZZ"]), &[0.05], &histories(), 1.0, &control)
            .unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::InvalidInput);

        let empty = engine
            .optimize_portfolio(&[], &[], &histories(), 1.0, &control)
            .unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_cancelled_optimization_is_timeout() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let control = RunControl::default().with_cancellation(token);
        let err = engine
            .optimize_portfolio(&ids(&["AAA", "BBB"]), &[0.05, 0.07], &histories(), 1.0, &control)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ComputationTimeout);
    }

    #[test]
    fn test_short_history_is_insufficient_data() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let short = vec![
            ReturnSeries::daily("AAA", vec![0.01]).unwrap(),
            ReturnSeries::daily("BBB", vec![0.02]).unwrap(),
        ];
        let err = engine
            .compute_risk_parity(&ids(&["AAA", "BBB"]), &short, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn test_ewma_estimator_is_used() {
        let sample = RiskEngine::new(EngineConfig::default()).unwrap();
        let ewma = RiskEngine::new(EngineConfig {
            covariance: CovarianceConfig::Ewma(EwmaConfig::default()),
            ..EngineConfig::default()
        })
        .unwrap();

        let a = sample.market_statistics(&histories(), None).unwrap();
        let b = ewma.market_statistics(&histories(), None).unwrap();
        assert_ne!(a.volatilities(), b.volatilities());
    }

    #[test]
    fn test_simulation_request_overrides() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let request = SimulationRequest::new(1_000.0, 0.08, 0.2)
            .with_horizon_days(20)
            .with_scenarios(200)
            .with_seed(11);
        let result = engine.run_monte_carlo(&request, &RunControl::default()).unwrap();
        assert_eq!(result.scenarios_completed, 200);
        assert_eq!(result.seed, 11);
        assert!(result.completion.is_complete());

        let again = engine.run_monte_carlo(&request, &RunControl::default()).unwrap();
        assert_eq!(result.distribution, again.distribution);
    }

    #[test]
    fn test_drawdown_report_applies_policy() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let report = engine.drawdown_report(&[100.0, 110.0, 95.0, 90.0]).unwrap();
        assert_relative_eq!(report.analysis.current_drawdown, 90.0 / 110.0 - 1.0, epsilon = 1e-12);
        assert_eq!(report.assessment.action, DrawdownAction::ReduceExposure);
        assert_relative_eq!(report.assessment.exposure_scale, 0.5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.drawdown.warn_at = -0.5;
        assert!(RiskEngine::new(config).is_err());

        let mut config = EngineConfig::default();
        config.monte_carlo.num_scenarios = 0;
        assert!(RiskEngine::new(config).is_err());
    }
}
