//! Risk report over a realistic return history.

use ballast_core::Periodicity;
use ballast_risk::{
    DrawdownAction, DrawdownPolicy, PortfolioSnapshot, Position, RiskAggregator,
    RiskClassification, analyze_drawdown, compounded_path, tail_risk,
};

/// A year of daily returns with a sharp sell-off in the middle.
fn returns() -> Vec<f64> {
    (0..252)
        .map(|t| {
            let base = 0.0004 + 0.008 * ((t as f64) * 0.45).sin();
            if (120..140).contains(&t) { base - 0.012 } else { base }
        })
        .collect()
}

#[test]
fn test_sell_off_triggers_policy() {
    let path = compounded_path(&returns()).unwrap();
    let analysis = analyze_drawdown(&path).unwrap();

    assert!(analysis.max_drawdown < -0.15);
    assert!(analysis.trough_index > analysis.peak_index);
    assert!(analysis.trough_index >= 120);

    let policy = DrawdownPolicy::default();
    let worst = policy.assess(analysis.max_drawdown);
    assert!(worst.action >= DrawdownAction::ReduceExposure);
    assert!(worst.exposure_scale <= 0.5);
}

#[test]
fn test_report_is_consistent_with_components() {
    let snapshot = PortfolioSnapshot {
        positions: vec![
            Position {
                asset: "CORE".into(),
                weight: 0.8,
                illiquidity: 0.05,
            },
            Position {
                asset: "ALT".into(),
                weight: 0.2,
                illiquidity: 0.9,
            },
        ],
        returns: returns(),
        periodicity: Periodicity::Daily,
        benchmark_returns: Some(returns().iter().map(|r| r * 0.8).collect()),
        operational_score: 0.1,
    };
    let report = RiskAggregator::default().assess(&snapshot).unwrap();

    assert!(report.classification >= RiskClassification::Medium);
    assert!((0.0..=1.0).contains(&report.composite_score));

    let direct = tail_risk(&snapshot.returns, 0.95).unwrap();
    assert_eq!(report.tail_risk[0], direct);
    assert!(report.tail_risk[1].value_at_risk >= report.tail_risk[0].value_at_risk);

    // Portfolio is an exact 1.25x multiple of the benchmark
    assert!(report.ratios.treynor.is_some());
    assert!(report.ratios.information.is_some());

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"classification\""));
}
