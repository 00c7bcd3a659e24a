//! Integration tests for building market statistics from return histories.

use ballast_core::{
    CovarianceEstimator, EwmaConfig, EwmaCovarianceEstimator, MarketStatistics, Periodicity,
    ReturnSeries, SampleCovarianceEstimator, StatsError, stats,
};

fn histories() -> Vec<ReturnSeries> {
    let equity: Vec<f64> = (0..60).map(|t| 0.01 * ((t as f64) * 0.7).sin()).collect();
    let bonds: Vec<f64> = (0..60).map(|t| 0.004 * ((t as f64) * 1.3).cos()).collect();
    let gold: Vec<f64> = (0..60)
        .map(|t| 0.006 * ((t as f64) * 0.31).sin() - 0.002 * ((t as f64) * 2.1).cos())
        .collect();
    vec![
        ReturnSeries::new("EQ", Periodicity::Weekly, equity).unwrap(),
        ReturnSeries::new("BD", Periodicity::Weekly, bonds).unwrap(),
        ReturnSeries::new("AU", Periodicity::Weekly, gold).unwrap(),
    ]
}

#[test]
fn test_sample_statistics_are_annualized_consistently() {
    let series = histories();
    let market = MarketStatistics::from_return_series(&series, &SampleCovarianceEstimator).unwrap();

    assert_eq!(market.periodicity(), Periodicity::Weekly);
    for (i, s) in series.iter().enumerate() {
        let vol = stats::annualized_volatility(s.values(), 52.0).unwrap();
        assert!((market.volatilities()[i] - vol).abs() < 1e-12);
    }

    let cov = market.covariance().matrix();
    let expected = stats::covariance(series[0].values(), series[2].values()).unwrap() * 52.0;
    assert!((cov[[0, 2]] - expected).abs() < 1e-12);

    let corr = market.correlation();
    let expected_corr = stats::correlation(series[0].values(), series[2].values()).unwrap();
    assert!((corr[[0, 2]] - expected_corr).abs() < 1e-9);
}

#[test]
fn test_estimators_are_interchangeable() {
    let series = histories();
    let estimators: Vec<Box<dyn CovarianceEstimator>> = vec![
        Box::new(SampleCovarianceEstimator),
        Box::new(EwmaCovarianceEstimator::new(EwmaConfig::default()).unwrap()),
    ];
    for estimator in &estimators {
        let market = MarketStatistics::from_return_series(&series, estimator.as_ref()).unwrap();
        assert_eq!(market.covariance().len(), 3);
        assert!(market.volatilities().iter().all(|v| *v > 0.0));
    }
}

#[test]
fn test_empty_universe_rejected() {
    assert!(matches!(
        MarketStatistics::from_return_series(&[], &SampleCovarianceEstimator),
        Err(StatsError::InvalidInput(_))
    ));
}
