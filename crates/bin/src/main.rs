//! Ballast CLI binary.
//!
//! Command-line interface for position sizing, allocation, simulation and
//! portfolio risk reports.

mod error;
mod input;
mod report;

use ballast::core::{AssetId, Periodicity, Progress, ReturnSeries, RunControl};
use ballast::{EngineConfig, RiskEngine, SimulationRequest};
use clap::{Args, Parser, Subcommand, ValueEnum};
use error::CliError;
use indicatif::{ProgressBar, ProgressStyle};
use report::{OutputFormat, Report, render};
use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ballast")]
#[command(about = "Ballast: quantitative risk and capital allocation", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON engine configuration (omitted sections use defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Stop long computations after this many milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Kelly position size from win statistics or a trade history
    Kelly {
        /// Probability of a winning trade
        #[arg(long, required_unless_present = "trades")]
        win_rate: Option<f64>,

        /// Average winning return
        #[arg(long, required_unless_present = "trades")]
        avg_win: Option<f64>,

        /// Average losing return (magnitude)
        #[arg(long, required_unless_present = "trades")]
        avg_loss: Option<f64>,

        /// CSV of per-trade returns (column `return`)
        #[arg(long, conflicts_with_all = ["win_rate", "avg_win", "avg_loss"])]
        trades: Option<PathBuf>,

        /// Fraction of full Kelly to stake
        #[arg(long)]
        confidence: Option<f64>,
    },

    /// Mean-variance optimal weights
    Optimize {
        #[command(flatten)]
        histories: HistoryArgs,

        /// Annualized expected returns, aligned with the selected assets
        #[arg(long, value_delimiter = ',')]
        expected: Vec<f64>,

        /// Risk tolerance λ
        #[arg(long, default_value = "1.0")]
        risk_tolerance: f64,

        /// Trace the efficient frontier instead of a single portfolio
        #[arg(long)]
        frontier: bool,
    },

    /// Risk parity allocation
    Parity {
        #[command(flatten)]
        histories: HistoryArgs,

        /// JSON list of current weights ({"asset", "weight"} objects)
        #[arg(long)]
        current: Option<PathBuf>,
    },

    /// Monte Carlo simulation of portfolio value
    Simulate {
        /// Starting capital
        #[arg(long, default_value = "100000")]
        capital: f64,

        /// Annualized expected return
        #[arg(long)]
        expected_return: f64,

        /// Annualized volatility
        #[arg(long)]
        volatility: f64,

        /// Trading days to simulate
        #[arg(long)]
        horizon: Option<usize>,

        /// Number of scenarios
        #[arg(long)]
        scenarios: Option<usize>,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Drawdown statistics and policy action for a value series
    Drawdown {
        /// CSV of portfolio values (column `value`)
        values: PathBuf,
    },

    /// Composite risk report for a portfolio snapshot
    Risk {
        /// JSON portfolio snapshot
        snapshot: PathBuf,
    },
}

#[derive(Args)]
struct HistoryArgs {
    /// CSV of periodic returns, one column per asset
    #[arg(long)]
    returns: PathBuf,

    /// Sampling frequency of the returns
    #[arg(long, value_enum, default_value_t = Frequency::Daily)]
    periodicity: Frequency,

    /// Restrict to these assets (default: every column)
    #[arg(long, value_delimiter = ',')]
    assets: Vec<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl From<Frequency> for Periodicity {
    fn from(frequency: Frequency) -> Self {
        match frequency {
            Frequency::Daily => Self::Daily,
            Frequency::Weekly => Self::Weekly,
            Frequency::Monthly => Self::Monthly,
            Frequency::Quarterly => Self::Quarterly,
            Frequency::Annual => Self::Annual,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let engine = RiskEngine::new(config)?;
    debug!(config = ?cli.config, timeout_ms = ?cli.timeout_ms, "engine ready");
    let control = cli
        .timeout_ms
        .map_or_else(RunControl::default, |ms| {
            RunControl::default().with_timeout(Duration::from_millis(ms))
        });
    let format = cli.format;

    match cli.command {
        Commands::Kelly {
            win_rate,
            avg_win,
            avg_loss,
            trades,
            confidence,
        } => {
            let result = match (trades, win_rate, avg_win, avg_loss) {
                (Some(path), ..) => {
                    let trades = input::read_series(input::open(&path)?, "return")?;
                    engine.compute_kelly_from_trades(&trades, confidence)?
                }
                (None, Some(p), Some(win), Some(loss)) => {
                    engine.compute_kelly(p, win, loss, confidence)?
                }
                _ => {
                    return Err(CliError::Input(
                        "pass --trades or all of --win-rate, --avg-win, --avg-loss".into(),
                    ));
                }
            };
            emit(&result, format)
        }
        Commands::Optimize {
            histories,
            expected,
            risk_tolerance,
            frontier,
        } => {
            let (assets, series) = load_histories(&histories)?;
            debug!(
                assets = assets.len(),
                observations = series.first().map_or(0, ReturnSeries::len),
                "loaded returns"
            );
            if frontier {
                let selected = assets
                    .iter()
                    .map(|a| {
                        series
                            .iter()
                            .find(|s| s.asset_id() == a)
                            .cloned()
                            .ok_or_else(|| CliError::Input(format!("no return history for {a}")))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let expected = (!expected.is_empty()).then_some(expected.as_slice());
                let frontier = engine.efficient_frontier(&selected, expected, &control)?;
                emit(&frontier, format)
            } else {
                let expected = if expected.is_empty() {
                    let market = engine.market_statistics(&series, None)?;
                    assets
                        .iter()
                        .map(|a| {
                            market
                                .index_of(a)
                                .map(|i| market.expected_returns()[i])
                                .ok_or_else(|| {
                                    CliError::Input(format!("no return history for {a}"))
                                })
                        })
                        .collect::<Result<Vec<_>, _>>()?
                } else {
                    expected
                };
                let result = engine.optimize_portfolio(
                    &assets,
                    &expected,
                    &series,
                    risk_tolerance,
                    &control,
                )?;
                emit(&result, format)
            }
        }
        Commands::Parity { histories, current } => {
            let (assets, series) = load_histories(&histories)?;
            let current = current.as_deref().map(input::read_weights).transpose()?;
            let allocations = engine.compute_risk_parity(&assets, &series, current.as_ref())?;
            emit(&allocations, format)
        }
        Commands::Simulate {
            capital,
            expected_return,
            volatility,
            horizon,
            scenarios,
            seed,
        } => {
            let request = SimulationRequest {
                initial_capital: capital,
                expected_return,
                volatility,
                horizon_days: horizon,
                num_scenarios: scenarios,
                seed,
            };
            let total = scenarios.unwrap_or(engine.config().monte_carlo.num_scenarios);
            let progress = Progress::new();
            let control = control.with_progress(progress.clone());

            let pb = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("█▓░"));
            }
            pb.set_message("Simulating scenarios...");

            let result = thread::scope(|scope| {
                let worker = scope.spawn(|| engine.run_monte_carlo(&request, &control));
                while !worker.is_finished() {
                    pb.set_position(progress.completed() as u64);
                    thread::sleep(Duration::from_millis(50));
                }
                worker.join()
            });
            pb.finish_and_clear();

            let result = result.map_err(|_| CliError::Input("simulation worker panicked".into()))??;
            emit(&result, format)
        }
        Commands::Drawdown { values } => {
            let values = input::read_series(input::open(&values)?, "value")?;
            let report = engine.drawdown_report(&values)?;
            emit(&report, format)
        }
        Commands::Risk { snapshot } => {
            let snapshot = input::read_snapshot(&snapshot)?;
            let report = engine.compute_risk_metrics(&snapshot)?;
            emit(&report, format)
        }
    }
}

fn load_histories(args: &HistoryArgs) -> Result<(Vec<AssetId>, Vec<ReturnSeries>), CliError> {
    let series =
        input::read_return_histories(input::open(&args.returns)?, args.periodicity.into())?;
    let assets = input::asset_selection(&args.assets, &series);
    Ok((assets, series))
}

fn emit<T: Report>(value: &T, format: OutputFormat) -> Result<(), CliError> {
    println!("{}", render(value, format)?);
    Ok(())
}
