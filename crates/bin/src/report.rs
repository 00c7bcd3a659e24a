//! Text and JSON rendering of engine results.

use crate::error::CliError;
use ballast::DrawdownReport;
use ballast::core::{Completion, PortfolioWeights};
use ballast::risk::RiskMetricsSnapshot;
use ballast::sim::MonteCarloResult;
use ballast::sizing::{Frontier, KellyResult, PortfolioOptimization, RiskParityAllocation};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt::Write;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

/// A result that can be shown as a text report.
pub(crate) trait Report: Serialize {
    fn render_text(&self, out: &mut String);
}

pub(crate) fn render<T: Report>(value: &T, format: OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => {
            let mut out = String::new();
            value.render_text(&mut out);
            Ok(out)
        }
    }
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n╔══════════════════════════════════════════════════════════════╗");
    let _ = writeln!(out, "║{title:^62}║");
    let _ = writeln!(out, "╚══════════════════════════════════════════════════════════════╝\n");
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{RULE}\n{title}\n{RULE}\n");
}

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

fn completion(out: &mut String, completion: &Completion) {
    if let Completion::Incomplete {
        completed,
        requested,
        reason,
    } = completion
    {
        let _ = writeln!(
            out,
            "\nINCOMPLETE: {completed}/{requested} finished before stop ({reason:?})"
        );
    }
}

fn weights_table(out: &mut String, weights: &PortfolioWeights) {
    for entry in weights.entries() {
        let _ = writeln!(out, "  {:<15} {:>8}", entry.asset.as_str(), pct(entry.weight));
    }
}

impl Report for KellyResult {
    fn render_text(&self, out: &mut String) {
        banner(out, "KELLY POSITION SIZING");
        let _ = writeln!(out, "Win Probability:        {}", pct(self.win_probability));
        let _ = writeln!(out, "Average Win / Loss:     {:.4} / {:.4}", self.avg_win, self.avg_loss);
        let _ = writeln!(out, "Payoff Ratio:           {:.3}", self.payoff_ratio);
        let _ = writeln!(out, "Edge per Unit Staked:   {:.5}", self.expected_return);
        let _ = writeln!(out, "Full Kelly:             {}", pct(self.raw_fraction));
        let _ = writeln!(out, "Recommended Fraction:   {}", pct(self.optimal_fraction));
        let _ = writeln!(out, "Risk Level:             {}", self.risk_level);
        let _ = writeln!(out, "Streak Drawdown Est.:   {}", pct(self.max_drawdown_estimate));
    }
}

impl Report for PortfolioOptimization {
    fn render_text(&self, out: &mut String) {
        banner(out, "MEAN-VARIANCE OPTIMIZATION");
        section(out, "WEIGHTS");
        weights_table(out, &self.weights);
        let _ = writeln!(out);
        let _ = writeln!(out, "Expected Return:        {}", pct(self.expected_return));
        let _ = writeln!(out, "Expected Volatility:    {}", pct(self.expected_volatility));
        let _ = writeln!(out, "Sharpe Ratio:           {}", optional(self.sharpe_ratio));
        let _ = writeln!(out, "Risk Tolerance:         {:.2}", self.risk_tolerance);
        let _ = writeln!(out, "Utility:                {:.6}", self.utility);
        let _ = writeln!(
            out,
            "Iterations:             {} ({})",
            self.iterations,
            if self.converged { "converged" } else { "budget exhausted" }
        );
        completion(out, &self.completion);
    }
}

impl Report for Frontier {
    fn render_text(&self, out: &mut String) {
        banner(out, "EFFICIENT FRONTIER");
        let _ = writeln!(
            out,
            "{:>8} {:>10} {:>10} {:>8}",
            "lambda", "risk", "return", "sharpe"
        );
        for point in &self.points {
            let _ = writeln!(
                out,
                "{:>8.2} {:>10} {:>10} {:>8}",
                point.risk_tolerance,
                pct(point.risk),
                pct(point.expected_return),
                optional(point.sharpe_ratio)
            );
        }
        completion(out, &self.completion);
    }
}

impl Report for Vec<RiskParityAllocation> {
    fn render_text(&self, out: &mut String) {
        banner(out, "RISK PARITY ALLOCATION");
        let _ = writeln!(
            out,
            "{:<12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
            "asset", "vol", "current", "adjusted", "contrib", "target", "avg corr"
        );
        for a in self {
            let _ = writeln!(
                out,
                "{:<12} {:>9} {:>9} {:>9} {:>9} {:>9} {:>9}",
                a.asset.as_str(),
                pct(a.volatility),
                pct(a.current_weight),
                pct(a.adjusted_weight),
                pct(a.risk_contribution),
                pct(a.target_contribution),
                optional(a.average_correlation)
            );
        }
    }
}

impl Report for MonteCarloResult {
    fn render_text(&self, out: &mut String) {
        let d = &self.distribution;
        banner(out, "MONTE CARLO SIMULATION");
        let _ = writeln!(out, "Scenarios:              {}", self.scenarios_completed);
        let _ = writeln!(out, "Seed:                   {}", self.seed);
        let _ = writeln!(out, "Initial Capital:        {:.2}\n", self.initial_capital);

        section(out, "FINAL VALUE DISTRIBUTION");
        let p = &d.percentiles;
        let _ = writeln!(out, "  5th percentile        {:.2}", p.p5);
        let _ = writeln!(out, "  25th percentile       {:.2}", p.p25);
        let _ = writeln!(out, "  Median                {:.2}", p.p50);
        let _ = writeln!(out, "  75th percentile       {:.2}", p.p75);
        let _ = writeln!(out, "  95th percentile       {:.2}", p.p95);
        let _ = writeln!(out, "  Mean                  {:.2}", d.expected_value);
        let _ = writeln!(out, "  Std Dev               {:.2}\n", d.std_dev);

        section(out, "RISK");
        let _ = writeln!(out, "Probability of Loss:    {}", pct(d.probability_of_loss));
        let _ = writeln!(out, "VaR (95%):              {:.2}", d.var_95);
        let _ = writeln!(out, "CVaR (95%):             {:.2}", d.cvar_95);
        let _ = writeln!(out, "Skewness:               {}", optional(d.skewness));
        let _ = writeln!(out, "Excess Kurtosis:        {}", optional(d.excess_kurtosis));
        let _ = writeln!(out, "Mean Max Drawdown:      {}", pct(self.mean_max_drawdown));
        let _ = writeln!(out, "Worst Max Drawdown:     {}", pct(self.worst_max_drawdown));
        completion(out, &self.completion);
    }
}

impl Report for DrawdownReport {
    fn render_text(&self, out: &mut String) {
        let a = &self.analysis;
        banner(out, "DRAWDOWN ANALYSIS");
        let _ = writeln!(out, "Observations:           {}", a.records.len());
        let _ = writeln!(out, "Current Drawdown:       {}", pct(a.current_drawdown));
        let _ = writeln!(out, "Max Drawdown:           {}", pct(a.max_drawdown));
        let _ = writeln!(out, "Peak -> Trough:         {} -> {}", a.peak_index, a.trough_index);
        let _ = writeln!(out, "Periods Since Peak:     {}", a.drawdown_duration);
        let _ = writeln!(out, "Longest Drawdown:       {}", a.max_drawdown_duration);
        let recovery = a
            .recovery_time
            .map_or_else(|| "not recovered".to_string(), |t| format!("{t} periods"));
        let _ = writeln!(out, "Recovery Time:          {recovery}\n");

        section(out, "POLICY");
        let _ = writeln!(out, "Action:                 {:?}", self.assessment.action);
        let _ = writeln!(
            out,
            "Exposure Scale:         {:.2}",
            self.assessment.exposure_scale
        );
    }
}

impl Report for RiskMetricsSnapshot {
    fn render_text(&self, out: &mut String) {
        banner(out, "PORTFOLIO RISK REPORT");
        let _ = writeln!(
            out,
            "Composite Score:        {:.3} ({})\n",
            self.composite_score, self.classification
        );

        section(out, "COMPONENT SCORES");
        let s = &self.scores;
        let _ = writeln!(out, "  Concentration         {:.3}", s.concentration);
        let _ = writeln!(out, "  Liquidity             {:.3}", s.liquidity);
        let _ = writeln!(out, "  Market                {:.3}", s.market);
        let _ = writeln!(out, "  Operational           {:.3}\n", s.operational);

        section(out, "PERFORMANCE");
        let r = &self.ratios;
        let _ = writeln!(out, "Annualized Return:      {}", pct(self.annualized_return));
        let _ = writeln!(out, "Annualized Volatility:  {}", pct(self.annualized_volatility));
        let _ = writeln!(out, "Max Drawdown:           {}", pct(self.max_drawdown));
        let _ = writeln!(out, "Sharpe:                 {}", optional(r.sharpe));
        let _ = writeln!(out, "Sortino:                {}", optional(r.sortino));
        let _ = writeln!(out, "Calmar:                 {}", optional(r.calmar));
        let _ = writeln!(out, "Treynor:                {}", optional(r.treynor));
        let _ = writeln!(out, "Information:            {}\n", optional(r.information));

        section(out, "TAIL RISK");
        for t in &self.tail_risk {
            let _ = writeln!(
                out,
                "  {:>5}  VaR {:>8}  CVaR {:>8}",
                pct(t.confidence),
                pct(t.value_at_risk),
                pct(t.conditional_value_at_risk)
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballast::core::StopReason;
    use ballast::{EngineConfig, RiskEngine};

    #[test]
    fn test_kelly_text_and_json() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let result = engine.compute_kelly(0.6, 1.0, 1.0, None).unwrap();

        let text = render(&result, OutputFormat::Text).unwrap();
        assert!(text.contains("KELLY POSITION SIZING"));
        assert!(text.contains("20.00%"));
        assert!(text.contains("aggressive"));

        let json = render(&result, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["risk_level"], "aggressive");
    }

    #[test]
    fn test_drawdown_text_mentions_policy() {
        let engine = RiskEngine::new(EngineConfig::default()).unwrap();
        let report = engine.drawdown_report(&[100.0, 75.0]).unwrap();
        let text = render(&report, OutputFormat::Text).unwrap();
        assert!(text.contains("-25.00%"));
        assert!(text.contains("Halt"));
        assert!(text.contains("not recovered"));
    }

    #[test]
    fn test_incomplete_frontier_is_flagged() {
        let frontier = Frontier {
            points: Vec::new(),
            completion: Completion::Incomplete {
                completed: 3,
                requested: 20,
                reason: StopReason::DeadlineExceeded,
            },
        };
        let text = render(&frontier, OutputFormat::Text).unwrap();
        assert!(text.contains("EFFICIENT FRONTIER"));
        assert!(text.contains("INCOMPLETE: 3/20"));

        let json = render(&frontier, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["completion"]["status"], "incomplete");
        assert_eq!(parsed["completion"]["reason"], "deadline_exceeded");
    }
}
