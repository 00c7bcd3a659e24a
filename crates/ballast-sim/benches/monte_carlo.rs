//! Benchmarks for Monte Carlo simulation.

use ballast_core::RunControl;
use ballast_sim::{GbmParameters, MonteCarloConfig, MonteCarloSimulator};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn bench_simulate(c: &mut Criterion) {
    let params = GbmParameters {
        initial_capital: 100_000.0,
        expected_return: 0.08,
        volatility: 0.2,
    };
    let control = RunControl::unbounded();
    let mut group = c.benchmark_group("monte_carlo");
    group.sample_size(10);

    for scenarios in [1_000, 10_000] {
        let simulator = MonteCarloSimulator::new(MonteCarloConfig {
            num_scenarios: scenarios,
            seed: Some(42),
            ..Default::default()
        })
        .expect("valid config");
        group.bench_with_input(
            BenchmarkId::from_parameter(scenarios),
            &simulator,
            |b, simulator| b.iter(|| simulator.simulate(black_box(&params), &control)),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_simulate);
criterion_main!(benches);
