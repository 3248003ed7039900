//! Command-line interface for the simulator and optimizer.

use fgi_dca::config::DcaFileConfig;
use fgi_dca::data::{load_observations, summarize, DataConfig};
use fgi_dca::engine::{simulate_plain_dca, simulate_with_history};
use fgi_dca::error::{DcaError, Result};
use fgi_dca::export::{export_history_csv, export_json, export_trials_csv, trials_to_csv_string};
use fgi_dca::metadata::compute_file_checksum;
use fgi_dca::optimizer::{
    optimize_with, OptimizationReport, ParameterGrid, SweepConfig, ThresholdRange,
};
use fgi_dca::report::ResultFormatter;
use fgi_dca::types::{DailyObservation, StrategyParameters};

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Fear & Greed gated dollar-cost-averaging backtester.
#[derive(Parser)]
#[command(name = "fgi-dca")]
#[command(version)]
#[command(about = "Backtest and optimize an FGI-gated BTC dollar-cost-averaging strategy")]
#[command(long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single simulation
    Simulate {
        /// Path to the price / FGI CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Amount deposited and invested per day
        #[arg(short, long, default_value = "10")]
        investment: f64,

        /// Buy when FGI is below this value, sell otherwise
        #[arg(short, long, default_value = "60")]
        threshold: i32,

        /// Cash value of BTC sold on a sell day
        #[arg(short, long, default_value = "10")]
        sell_amount: f64,

        /// Write the daily history to this CSV file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Write the full report as JSON to this file
        #[arg(long)]
        json_out: Option<PathBuf>,
    },

    /// Sweep thresholds and sell amounts for the best final value
    Optimize {
        /// Path to the price / FGI CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Amount deposited per day, fixed across the sweep
        #[arg(short, long, default_value = "10")]
        investment: f64,

        /// First FGI threshold
        #[arg(long, default_value = "10")]
        threshold_start: i32,

        /// Last FGI threshold (inclusive)
        #[arg(long, default_value = "90")]
        threshold_end: i32,

        /// Threshold increment
        #[arg(long, default_value = "5")]
        threshold_step: i32,

        /// Comma-separated sell amounts
        #[arg(long, value_delimiter = ',', default_value = "10,20,30")]
        sell_amounts: Vec<f64>,

        /// Evaluate trials in parallel
        #[arg(long)]
        parallel: bool,

        /// Rows shown in the ranked table (0 = all)
        #[arg(long, default_value = "20")]
        top: usize,

        /// Write the trial log to this CSV file
        #[arg(long)]
        trials_out: Option<PathBuf>,

        /// Write the full report as JSON to this file
        #[arg(long)]
        json_out: Option<PathBuf>,
    },

    /// Plain DCA benchmark: buy every day, never sell
    Baseline {
        /// Path to the price / FGI CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Amount invested per day
        #[arg(short, long, default_value = "10")]
        investment: f64,
    },

    /// Validate a data file
    Validate {
        /// Path to the price / FGI CSV file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Generate an example configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "fgi-dca.toml")]
        output: PathBuf,
    },

    /// Run a sweep, or the single `[strategy]` run, from a configuration file
    RunConfig {
        /// Path to TOML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Run the `[strategy]` parameters once instead of sweeping
        #[arg(long)]
        simulate: bool,

        /// Write the daily history to this CSV file (with --simulate)
        #[arg(long, requires = "simulate")]
        history: Option<PathBuf>,

        /// Write the trial log to this CSV file
        #[arg(long, conflicts_with = "simulate")]
        trials_out: Option<PathBuf>,

        /// Write the full report as JSON to this file
        #[arg(long)]
        json_out: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Cli {
    /// Initialize logging based on verbosity level.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Failed to set tracing subscriber: {}", e);
        }
    }
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();

    match &cli.command {
        Commands::Simulate {
            data,
            investment,
            threshold,
            sell_amount,
            history,
            json_out,
        } => {
            let observations = load_observations(data, &DataConfig::default())?;
            run_simulation(
                &observations,
                StrategyParameters::new(*investment, *threshold, *sell_amount),
                Outputs {
                    history: history.as_deref(),
                    trials: None,
                    json: json_out.as_deref(),
                },
                cli.output,
            )
        }

        Commands::Optimize {
            data,
            investment,
            threshold_start,
            threshold_end,
            threshold_step,
            sell_amounts,
            parallel,
            top,
            trials_out,
            json_out,
        } => {
            let range = ThresholdRange::new(*threshold_start, *threshold_end, *threshold_step);
            let grid = ParameterGrid::from_range(*investment, range, sell_amounts.clone())?;
            let sweep = SweepConfig {
                parallel: *parallel,
                show_progress: cli.output == OutputFormat::Text,
            };
            let observations = load_observations(data, &DataConfig::default())?;
            run_optimization(
                &observations,
                &grid,
                &sweep,
                *top,
                Outputs {
                    history: None,
                    trials: trials_out.as_deref(),
                    json: json_out.as_deref(),
                },
                cli.output,
            )
        }

        Commands::Baseline { data, investment } => run_baseline(data, *investment, cli.output),

        Commands::Validate { data } => validate_data(data),

        Commands::Init { output } => init_config(output),

        Commands::RunConfig {
            config,
            simulate,
            history,
            trials_out,
            json_out,
        } => run_from_config(
            config,
            *simulate,
            Outputs {
                history: history.as_deref(),
                trials: trials_out.as_deref(),
                json: json_out.as_deref(),
            },
            cli.output,
        ),
    }
}

/// Optional files written next to the terminal output.
#[derive(Clone, Copy)]
struct Outputs<'a> {
    history: Option<&'a Path>,
    trials: Option<&'a Path>,
    json: Option<&'a Path>,
}

fn run_simulation(
    observations: &[DailyObservation],
    params: StrategyParameters,
    outputs: Outputs<'_>,
    output: OutputFormat,
) -> Result<()> {
    let report = simulate_with_history(observations, &params)?;

    if let Some(path) = outputs.history {
        export_history_csv(&report, path)?;
    }
    if let Some(path) = outputs.json {
        export_json(&report, path)?;
    }

    match output {
        OutputFormat::Text => ResultFormatter::print_report(&report),
        OutputFormat::Json => println!("{}", ResultFormatter::to_json(&report)),
        OutputFormat::Csv => {
            println!("{}", ResultFormatter::csv_header());
            println!("{}", ResultFormatter::to_csv_line(&report));
        }
    }

    Ok(())
}

fn run_optimization(
    observations: &[DailyObservation],
    grid: &ParameterGrid,
    sweep: &SweepConfig,
    top: usize,
    outputs: Outputs<'_>,
    output: OutputFormat,
) -> Result<()> {
    info!("Running parameter sweep over {} combinations", grid.len());
    let report: OptimizationReport = optimize_with(observations, grid, sweep);

    if let Some(path) = outputs.trials {
        export_trials_csv(&report, path)?;
    }
    if let Some(path) = outputs.json {
        export_json(&report, path)?;
    }

    match output {
        OutputFormat::Text => ResultFormatter::print_optimization(&report, top),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Csv => print!("{}", trials_to_csv_string(&report)?),
    }

    if report.best.is_none() {
        return Err(DcaError::InvalidInput(format!(
            "no trial succeeded out of {} combinations",
            report.total_combinations()
        )));
    }

    Ok(())
}

fn run_baseline(data_path: &Path, investment: f64, output: OutputFormat) -> Result<()> {
    let observations = load_observations(data_path, &DataConfig::default())?;
    let result = simulate_plain_dca(&observations, investment)?;

    match output {
        OutputFormat::Text => {
            println!("\nPlain DCA ({:.2}/day over {} days)\n", investment, observations.len());
            ResultFormatter::print_result_block(&result);
        }
        OutputFormat::Json => println!("{}", ResultFormatter::to_json(&result)),
        OutputFormat::Csv => {
            println!("final_portfolio_value,cash_invested,profit");
            println!(
                "{:.2},{:.2},{:.2}",
                result.final_portfolio_value, result.cash_invested, result.profit
            );
        }
    }

    Ok(())
}

fn validate_data(data_path: &Path) -> Result<()> {
    println!("Validating data file: {}", data_path.display());

    let observations = load_observations(data_path, &DataConfig::default())?;
    if let Some(summary) = summarize(&observations) {
        ResultFormatter::print_summary(&summary);
    }
    println!("SHA-256: {}", compute_file_checksum(data_path)?);

    println!("\nValidation: PASSED");
    Ok(())
}

fn init_config(output: &Path) -> Result<()> {
    fs::write(output, DcaFileConfig::example())?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to customize the sweep, then run:");
    println!("  fgi-dca run-config -c {}", output.display());
    println!("  fgi-dca run-config -c {} --simulate", output.display());
    Ok(())
}

fn run_from_config(
    config_path: &Path,
    single_run: bool,
    outputs: Outputs<'_>,
    output: OutputFormat,
) -> Result<()> {
    let file_config = DcaFileConfig::load(config_path)?;

    let data_path = file_config.data.path.clone().ok_or_else(|| {
        DcaError::ConfigError("No data path specified in config".to_string())
    })?;
    let data_config = file_config.to_data_config()?;

    if single_run {
        let params = file_config.to_strategy_params()?;
        let observations = load_observations(&data_path, &data_config)?;
        return run_simulation(&observations, params, outputs, output);
    }

    let grid = file_config.to_grid()?;
    let mut sweep = file_config.to_sweep_config();
    sweep.show_progress = output == OutputFormat::Text;

    let observations = load_observations(&data_path, &data_config)?;
    run_optimization(&observations, &grid, &sweep, 20, outputs, output)
}
