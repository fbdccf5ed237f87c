//! Command-line interface for the allocation optimizer.

use nivesh::analytics::ResultFormatter;
use nivesh::config::{NiveshFileConfig, OptimizerConfig};
use nivesh::data::{load_prices_csv, DataConfig, PriceLayout, PriceMatrix};
use nivesh::engine::{PortfolioOptimizer, StrategyComparison, StrategyReport};
use nivesh::error::{NiveshError, Result};
use nivesh::projection::{GrowthProjection, InvestmentGoal};
use nivesh::types::{PositionSize, StrategyKind};
use nivesh::viz::{allocation_bars, growth_chart};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Nivesh - portfolio allocation optimizer and growth projector.
#[derive(Parser)]
#[command(name = "nivesh")]
#[command(version)]
#[command(about = "Compare portfolio allocation strategies and project growth toward a goal")]
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
    /// Compare all allocation strategies on a price history
    Compare {
        #[command(flatten)]
        data: DataArgs,

        #[command(flatten)]
        optimizer: OptimizerArgs,

        #[command(flatten)]
        goal: GoalArgs,

        /// Run strategies in parallel
        #[arg(long)]
        parallel: bool,

        /// Show growth charts for each strategy
        #[arg(long)]
        chart: bool,
    },

    /// Compute one allocation with metrics and position sizes
    Allocate {
        #[command(flatten)]
        data: DataArgs,

        /// Strategy (e.g. equal-weight, risk-parity, max-sharpe, kelly)
        #[arg(short = 'S', long, default_value = "maximum-sharpe")]
        strategy: StrategyKind,

        #[command(flatten)]
        optimizer: OptimizerArgs,

        #[command(flatten)]
        goal: GoalArgs,

        /// Split the initial capital into whole shares at the latest prices
        #[arg(long)]
        shares: bool,
    },

    /// Project growth of capital at a given annual return
    Project {
        /// Annual return as a fraction (e.g. 0.12 for 12%)
        #[arg(short, long, allow_hyphen_values = true)]
        annual_return: f64,

        #[command(flatten)]
        goal: GoalArgs,
    },

    /// List available strategies
    Strategies,

    /// Validate a price file
    Validate {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Create an example configuration file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "nivesh.toml")]
        output: PathBuf,
    },

    /// Run a comparison from a configuration file
    RunConfig {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Price file options.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Path to price CSV
    #[arg(short, long)]
    pub data: PathBuf,

    /// File layout
    #[arg(long, value_enum, default_value = "auto")]
    pub layout: LayoutArg,

    /// Date format (e.g. %d-%m-%Y)
    #[arg(long)]
    pub date_format: Option<String>,

    /// Fail on unparseable rows instead of skipping them
    #[arg(long)]
    pub strict: bool,
}

impl DataArgs {
    fn to_config(&self) -> DataConfig {
        DataConfig {
            date_format: self.date_format.clone(),
            delimiter: None,
            layout: self.layout.into(),
            skip_invalid: !self.strict,
        }
    }
}

/// Optimizer parameters.
#[derive(Args, Debug, Clone)]
pub struct OptimizerArgs {
    /// Annual risk-free rate (e.g. 0.065 for 6.5%)
    #[arg(long, default_value = "0.06")]
    pub risk_free_rate: f64,

    /// Return periods per year
    #[arg(long, default_value = "252")]
    pub periods_per_year: f64,

    /// Random draws for the maximum Sharpe search
    #[arg(long, default_value = "1000")]
    pub iterations: usize,

    /// Momentum lookback in periods
    #[arg(long, default_value = "90")]
    pub lookback: usize,

    /// Cap on each per-asset Kelly fraction
    #[arg(long, default_value = "0.25")]
    pub kelly_cap: f64,

    /// Cap on any single position (0-1)
    #[arg(long)]
    pub max_position: Option<f64>,

    /// Random seed for reproducible maximum Sharpe search
    #[arg(long)]
    pub seed: Option<u64>,
}

impl OptimizerArgs {
    fn to_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            risk_free_rate: self.risk_free_rate,
            periods_per_year: self.periods_per_year,
            max_sharpe_iterations: self.iterations,
            momentum_lookback: self.lookback,
            kelly_max_allocation: self.kelly_cap,
            seed: self.seed,
            max_position: self.max_position,
            ..Default::default()
        }
    }
}

/// Investment goal.
#[derive(Args, Debug, Clone)]
pub struct GoalArgs {
    /// Initial capital in rupees
    #[arg(short, long, default_value = "2000000")]
    pub initial: f64,

    /// Target capital in rupees
    #[arg(short, long, default_value = "10000000")]
    pub target: f64,

    /// Horizon in years
    #[arg(short = 'y', long, default_value = "10")]
    pub years: u32,
}

impl GoalArgs {
    fn to_goal(&self) -> InvestmentGoal {
        InvestmentGoal::new(self.initial, self.target, self.years)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// Long if a ticker column is present, wide otherwise
    Auto,
    /// date,SYM1,SYM2,...
    Wide,
    /// date,ticker,close
    Long,
}

impl From<LayoutArg> for PriceLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Auto => PriceLayout::Auto,
            LayoutArg::Wide => PriceLayout::Wide,
            LayoutArg::Long => PriceLayout::Long,
        }
    }
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
        Commands::Compare {
            data,
            optimizer,
            goal,
            parallel,
            chart,
        } => run_compare(
            data,
            optimizer.to_config(),
            &goal.to_goal(),
            *parallel,
            *chart,
            cli.output,
        ),

        Commands::Allocate {
            data,
            strategy,
            optimizer,
            goal,
            shares,
        } => run_allocate(
            data,
            *strategy,
            optimizer.to_config(),
            &goal.to_goal(),
            *shares,
            cli.output,
        ),

        Commands::Project {
            annual_return,
            goal,
        } => run_project(*annual_return, &goal.to_goal(), cli.output),

        Commands::Strategies => {
            print_strategies();
            Ok(())
        }

        Commands::Validate { data } => validate_data(data),

        Commands::Init { output } => init_config(output),

        Commands::RunConfig { config } => run_from_config(config, cli.output),
    }
}

fn load_prices(data: &DataArgs) -> Result<PriceMatrix> {
    load_prices_csv(&data.data, &data.to_config())
}

fn run_compare(
    data: &DataArgs,
    config: OptimizerConfig,
    goal: &InvestmentGoal,
    parallel: bool,
    chart: bool,
    output: OutputFormat,
) -> Result<()> {
    let prices = load_prices(data)?;
    let optimizer = PortfolioOptimizer::from_prices(&prices, config)?;
    let comparison = if parallel {
        optimizer.compare_all_parallel(goal)?
    } else {
        optimizer.compare_all(goal)?
    };
    print_comparison(&comparison, chart, output)
}

fn print_comparison(
    comparison: &StrategyComparison,
    chart: bool,
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Text => {
            ResultFormatter::print_comparison(comparison);
            if chart {
                for report in &comparison.reports {
                    println!();
                    println!("{}", report.allocation.strategy.name());
                    println!("{}", growth_chart(&report.projection, 40));
                }
            }
        }
        OutputFormat::Json => println!("{}", ResultFormatter::to_json(comparison)?),
        OutputFormat::Csv => {
            println!("{}", ResultFormatter::csv_header());
            for row in comparison.rows() {
                println!("{}", ResultFormatter::to_csv_line(row));
            }
        }
    }
    Ok(())
}

/// JSON shape of the `allocate` command.
#[derive(Serialize)]
struct AllocationOutput<'a> {
    #[serde(flatten)]
    report: &'a StrategyReport,
    positions: Option<&'a [PositionSize]>,
}

fn run_allocate(
    data: &DataArgs,
    kind: StrategyKind,
    config: OptimizerConfig,
    goal: &InvestmentGoal,
    shares: bool,
    output: OutputFormat,
) -> Result<()> {
    let prices = load_prices(data)?;
    let optimizer = PortfolioOptimizer::from_prices(&prices, config)?;
    goal.validate()?;
    let report = optimizer.report(kind, goal)?;

    let positions = shares.then(|| {
        report
            .allocation
            .weights
            .position_sizes(goal.initial_capital, &prices.latest_prices())
    });

    match output {
        OutputFormat::Text => {
            ResultFormatter::print_allocation(
                &report.allocation,
                &report.metrics,
                positions.as_deref(),
            );
            println!();
            print!("{}", allocation_bars(&report.allocation.weights, 30));
            ResultFormatter::print_projection(&report.projection);
        }
        OutputFormat::Json => {
            let value = AllocationOutput {
                report: &report,
                positions: positions.as_deref(),
            };
            println!("{}", ResultFormatter::to_json(&value)?);
        }
        OutputFormat::Csv => {
            println!("symbol,weight,capital,price,shares");
            let sizes = positions.unwrap_or_else(|| {
                report
                    .allocation
                    .weights
                    .position_sizes(goal.initial_capital, &Default::default())
            });
            for p in sizes {
                println!(
                    "{},{:.6},{:.2},{},{}",
                    p.symbol,
                    p.weight,
                    p.capital,
                    p.price.map(|v| format!("{:.2}", v)).unwrap_or_default(),
                    p.shares.map(|v| v.to_string()).unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn run_project(annual_return: f64, goal: &InvestmentGoal, output: OutputFormat) -> Result<()> {
    let projection = GrowthProjection::project(goal, annual_return)?;

    match output {
        OutputFormat::Text => {
            ResultFormatter::print_projection(&projection);
            println!();
            println!("{}", growth_chart(&projection, 40));
        }
        OutputFormat::Json => println!("{}", ResultFormatter::to_json(&projection)?),
        OutputFormat::Csv => {
            println!("year,projected_value,required_value");
            for p in &projection.points {
                println!("{},{:.2},{:.2}", p.year, p.projected_value, p.required_value);
            }
        }
    }
    Ok(())
}

fn print_strategies() {
    println!("\nAvailable Strategies:\n");

    for kind in StrategyKind::ALL {
        println!("  {}", kind.slug());
        println!("    {}", kind.description());
        println!();
    }

    println!("Parameters:");
    println!("  --risk-free-rate (default: 0.06)  Sharpe ratio hurdle");
    println!("  --iterations (default: 1000)      maximum-sharpe random draws");
    println!("  --seed                            reproducible maximum-sharpe search");
    println!("  --lookback (default: 90)          momentum-weighted trailing periods");
    println!("  --kelly-cap (default: 0.25)       kelly-criterion per-asset cap");
    println!("  --max-position                    cap any single holding");
    println!();
}

fn init_config(output: &PathBuf) -> Result<()> {
    let example = NiveshFileConfig::example();
    fs::write(output, example)?;
    println!("Created example configuration file: {}", output.display());
    println!("\nEdit this file to point at your price history, then run:");
    println!("  nivesh run-config -c {}", output.display());
    Ok(())
}

fn run_from_config(config_path: &PathBuf, output: OutputFormat) -> Result<()> {
    let file_config = NiveshFileConfig::load(config_path)?;
    file_config.validate()?;

    let data_path = file_config
        .data
        .path
        .clone()
        .ok_or_else(|| NiveshError::ConfigError("No data path specified in config".to_string()))?;

    let prices = load_prices_csv(&data_path, &file_config.to_data_config()?)?;
    let optimizer = PortfolioOptimizer::from_prices(&prices, file_config.optimizer.clone())?;

    let kinds = file_config.strategies()?;
    let comparison = if file_config.allocation.parallel {
        optimizer.compare_parallel(&kinds, &file_config.goal)?
    } else {
        optimizer.compare(&kinds, &file_config.goal)?
    };

    print_comparison(&comparison, false, output)
}

fn validate_data(data: &DataArgs) -> Result<()> {
    println!("Validating price file: {}", data.data.display());

    let prices = load_prices(data)?;
    let summary = prices.summary();

    println!("\nData Summary:");
    println!("  Assets: {} ({})", summary.symbols.len(), summary.symbols.join(", "));
    println!("  Price Rows: {}", summary.price_rows);
    println!("  Missing Prices: {}", summary.missing_prices);
    println!("  Return Periods: {}", summary.return_periods);
    println!("  Dropped Periods: {}", summary.dropped_periods);
    if let (Some(start), Some(end)) = (summary.start, summary.end) {
        println!("  Start: {}", start);
        println!("  End: {}", end);
    }

    if !summary.is_usable() {
        println!("\nValidation: FAILED");
        return Err(NiveshError::InsufficientData(format!(
            "{} aligned return periods after dropping gaps",
            summary.return_periods
        )));
    }

    println!("\nValidation: PASSED");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from([
            "nivesh",
            "compare",
            "-d",
            "prices.csv",
            "--risk-free-rate",
            "0.065",
            "--seed",
            "42",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_allocate_parses_strategy_alias() {
        let cli =
            Cli::try_parse_from(["nivesh", "allocate", "-d", "p.csv", "-S", "kelly"]).unwrap();
        match cli.command {
            Commands::Allocate { strategy, .. } => {
                assert_eq!(strategy, StrategyKind::KellyCriterion)
            }
            _ => panic!("expected allocate"),
        }
        let unknown = Cli::try_parse_from(["nivesh", "allocate", "-d", "p.csv", "-S", "astrology"]);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_project_accepts_negative_return() {
        let cli = Cli::try_parse_from(["nivesh", "-o", "json", "project", "-a", "-0.05"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Commands::Project { annual_return, goal } => {
                assert_eq!(annual_return, -0.05);
                assert_eq!(goal.years, 10);
            }
            _ => panic!("expected project"),
        }
    }

    #[test]
    fn test_optimizer_args_to_config() {
        let cli = Cli::try_parse_from([
            "nivesh",
            "compare",
            "-d",
            "p.csv",
            "--lookback",
            "30",
            "--max-position",
            "0.3",
        ])
        .unwrap();
        match cli.command {
            Commands::Compare { optimizer, .. } => {
                let config = optimizer.to_config();
                assert_eq!(config.momentum_lookback, 30);
                assert_eq!(config.max_position, Some(0.3));
                assert_eq!(config.periods_per_year, 252.0);
                assert!(config.validate().is_ok());
            }
            _ => panic!("expected compare"),
        }
    }

    #[test]
    fn test_strategies_command() {
        let cli = Cli::try_parse_from(["nivesh", "strategies"]);
        assert!(cli.is_ok());
    }
}
