use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tyrion::backtest::BacktestRunner;
use tyrion::config::{BacktestWindow, DataKind, Settings};
use tyrion::market_data::MarketScenario;
use tyrion::strategy::parameters::parse_override;
use tyrion::strategy::{ParameterValue, Strategy, TyrionStrategy};

/// Backtest the Tyrion strategy over the months ending yesterday
#[derive(Parser, Debug)]
#[command(name = "tyrion", version)]
struct Args {
    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Instrument to load, default FDAX
    #[arg(long)]
    symbol: Option<String>,

    /// Months of history ending yesterday
    #[arg(long)]
    months: Option<u32>,

    /// Bar length in minutes
    #[arg(long)]
    bar_minutes: Option<u32>,

    /// Load bars from a JSON file instead of generating them
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Seed for synthetic bars
    #[arg(long)]
    seed: Option<u64>,

    /// Synthetic scenario: uptrend, downtrend, sideways or volatile
    #[arg(long)]
    scenario: Option<MarketScenario>,

    /// Strategy parameter override, repeatable
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Print the declared strategy parameters and exit
    #[arg(long)]
    list_params: bool,

    /// Print metrics as JSON instead of the report
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    let mut strategy = TyrionStrategy::new();

    if args.list_params {
        print_parameters(&strategy);
        return Ok(());
    }

    let settings = load_settings(&args)?;
    let overrides = settings
        .parameter_overrides()
        .context("invalid parameter override in settings")?;

    let today = Utc::now().date_naive();
    let window = BacktestWindow::ending_yesterday(today, settings.lookback_months)
        .context("backtest window is out of range")?;
    let request = settings.history_request(&window);
    let source = settings
        .data
        .build_source()
        .map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "🚀 {} on {} ({}-minute bars) from {} to {}",
        strategy.name(),
        request.symbol,
        request.bar_period_minutes,
        window.start,
        window.end
    );
    for line in settings.connection_summary() {
        tracing::info!("{}", line);
    }
    if !settings.has_credentials() {
        tracing::warn!("No broker credentials configured");
    }
    tracing::info!("History comes from {}", source.describe());

    let bars = source
        .load_bars(&request)
        .with_context(|| format!("failed to load bars from {}", source.describe()))?;

    let runner = BacktestRunner::new(settings.initial_capital, settings.execution_costs())
        .with_sessions(settings.session_calendar())
        .with_parameters(overrides);

    if args.json {
        let metrics = runner.run(&mut strategy, &bars)?;
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        let label = format!(
            "{} {}m, {} to {}",
            request.symbol,
            request.bar_period_minutes,
            window.start.date_naive(),
            window.end.date_naive()
        );
        runner.run_and_report(&mut strategy, &bars, &label)?;
    }

    Ok(())
}

/// Settings file and environment, then command-line flags on top
fn load_settings(args: &Args) -> Result<Settings> {
    let mut settings =
        Settings::load(args.config.as_deref()).context("failed to load settings")?;

    if let Some(symbol) = &args.symbol {
        settings.symbol = symbol.clone();
    }
    if let Some(months) = args.months {
        settings.lookback_months = months;
    }
    if let Some(minutes) = args.bar_minutes {
        settings.bar_period_minutes = minutes;
    }
    if let Some(path) = &args.data_file {
        settings.data.kind = DataKind::JsonFile;
        settings.data.path = Some(path.clone());
    }
    if let Some(seed) = args.seed {
        settings.data.seed = seed;
    }
    if let Some(scenario) = args.scenario {
        settings.data.scenario = scenario;
    }

    // Validate flags early so a typo fails before any data is loaded
    for raw in &args.params {
        parse_override(raw)?;
    }
    settings.parameters.extend(args.params.iter().cloned());

    Ok(settings)
}

fn print_parameters(strategy: &TyrionStrategy) {
    println!("Parameters of {}:", strategy.name());
    for param in strategy.declare_parameters().iter() {
        match param.default {
            ParameterValue::Integer(v) => println!("  {:<42} {:>8}  (integer)", param.name, v),
            ParameterValue::Decimal(v) => println!("  {:<42} {:>8.2}  (decimal)", param.name, v),
        }
    }
    println!(
        "Force close intraday: {}, max open position: {}, advanced order management: {}",
        strategy.force_close_intraday(),
        strategy.max_open_position(),
        strategy.uses_advanced_order_management()
    );
}

fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tyrion=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
