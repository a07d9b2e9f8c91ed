//! Rota - Schedule intelligence for residency on-call rosters
//!
//! The main entry point for the `rota` binary, handling:
//! - Anomaly detection over schedule entry batches
//! - Call-load forecasting and forecast model training
//! - Recommendation bundles for a schedule snapshot
//! - Configuration inspection and validation

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use rota_common::{Error, OutputFormat, ScheduleEntry, StructuredError};
use rota_core::anomaly::{AnomalyDetector, HealthReport};
use rota_core::config::{load_config, ResolvedConfig};
use rota_core::exit_codes::ExitCode;
use rota_core::forecast::{
    training_table_from_store, LoadForecaster, TrainingSummary, TrainingTable,
};
use rota_core::log_event;
use rota_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, Stage,
};
use rota_core::recommend::{
    ForecastDemandPredictor, RecommendationBundle, RecommendationEngine, ScheduleSnapshot,
};
use rota_core::source::InMemoryDataSource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Rota - Anomaly detection, call-load forecasting and recommendations for on-call schedules
#[derive(Parser)]
#[command(name = "rota")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Pipeline configuration file (overrides ROTA_CONFIG and config directories)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a batch of schedule entries and report anomalies
    Detect(DetectArgs),

    /// Forecast per-resident call probability over a horizon
    Forecast(ForecastArgs),

    /// Train the forecast model and overwrite its artifact
    Train(TrainArgs),

    /// Generate recommendations for a schedule snapshot
    Recommend(RecommendArgs),

    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// JSON array of schedule entries
    #[arg(long)]
    entries: PathBuf,
}

#[derive(Args, Debug)]
struct ForecastArgs {
    /// Scheduling store export (residents, call assignments, holidays, leave)
    #[arg(long)]
    data: PathBuf,

    /// First forecast day (YYYY-MM-DD)
    #[arg(long)]
    start: NaiveDate,

    /// Number of days to forecast
    #[arg(long, default_value_t = 7)]
    days: u32,

    /// Model artifact path (overrides forecast.model_path)
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Labelled training table (columns + rows)
    #[arg(long, conflicts_with = "data", required_unless_present = "data")]
    dataset: Option<PathBuf>,

    /// Scheduling store export; one training row per historical call
    #[arg(long)]
    data: Option<PathBuf>,

    /// Model artifact path (overrides forecast.model_path)
    #[arg(long)]
    model: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Schedule snapshot
    #[arg(long)]
    snapshot: PathBuf,

    /// Schedule entries to score alongside the snapshot
    #[arg(long)]
    entries: Option<PathBuf>,

    /// Scheduling store export used for demand prediction
    #[arg(long)]
    data: Option<PathBuf>,

    /// First day of the demand forecast (defaults to the day after the snapshot period)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Demand forecast horizon in days
    #[arg(long, default_value_t = 14)]
    days: u32,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration
    Show,

    /// Validate the configuration file
    Validate,
}

#[derive(Serialize)]
struct TrainOutput {
    #[serde(flatten)]
    summary: TrainingSummary,
    model_path: PathBuf,
}

#[derive(Serialize)]
struct RecommendOutput {
    #[serde(flatten)]
    bundle: RecommendationBundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    health: Option<HealthReport>,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    init_logging(&LogConfig::from_cli(
        cli.global.verbose,
        cli.global.quiet,
        cli.global.log_format,
    ));

    let ctx = LogContext::new(generate_run_id());
    log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "rota run started");

    let result = match &cli.command {
        Commands::Detect(args) => run_detect(&cli.global, args),
        Commands::Forecast(args) => run_forecast(&cli.global, args),
        Commands::Train(args) => run_train(&cli.global, args),
        Commands::Recommend(args) => run_recommend(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
    };
    let exit_code = result.unwrap_or_else(|err| output_error(&cli.global, &err));

    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Init,
        "rota run finished",
        exit_code = %exit_code
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_detect(global: &GlobalOpts, args: &DetectArgs) -> Result<ExitCode, Error> {
    let resolved = load(global)?;
    let entries: Vec<ScheduleEntry> = read_json(&args.entries)?;
    let report = AnomalyDetector::new(resolved.config.anomaly).detect(&entries)?;

    emit(
        global,
        &report,
        format!(
            "{} anomalies in {} entries, health {:.1}",
            report.total_anomalies,
            entries.len(),
            report.health_score
        ),
    );
    Ok(if report.total_anomalies > 0 {
        ExitCode::Findings
    } else {
        ExitCode::Clean
    })
}

fn run_forecast(global: &GlobalOpts, args: &ForecastArgs) -> Result<ExitCode, Error> {
    let resolved = load(global)?;
    let mut config = resolved.config.forecast;
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    let source = InMemoryDataSource::from_file(&args.data)?;
    let forecaster = LoadForecaster::open(source, config);
    let window = forecaster.predict_call_load(args.start, args.days)?;

    let recommended = window.assignments().filter(|a| a.recommended).count();
    emit(
        global,
        &window,
        format!(
            "{}..{}: {} recommended assignments, confidence {:.2}",
            window.period_start, window.period_end, recommended, window.confidence
        ),
    );
    Ok(ExitCode::Clean)
}

fn run_train(global: &GlobalOpts, args: &TrainArgs) -> Result<ExitCode, Error> {
    let resolved = load(global)?;
    let mut config = resolved.config.forecast;
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }

    let (source, table) = match (&args.dataset, &args.data) {
        (Some(path), _) => (InMemoryDataSource::default(), TrainingTable::from_file(path)?),
        (None, Some(path)) => {
            let store = InMemoryDataSource::from_file(path)?;
            let table = training_table_from_store(&store, &config)?;
            (store, table)
        }
        (None, None) => {
            return Err(Error::InvalidDataset(
                "either --dataset or --data is required".to_string(),
            ))
        }
    };

    let model_path = config.model_path.clone();
    let mut forecaster = LoadForecaster::untrained(source, config);
    let summary = forecaster.train(&table)?;

    let line = format!(
        "trained on {} rows, R² {:.3}, saved to {}",
        table.rows.len(),
        summary.accuracy,
        model_path.display()
    );
    emit(global, &TrainOutput { summary, model_path }, line);
    Ok(ExitCode::Clean)
}

fn run_recommend(global: &GlobalOpts, args: &RecommendArgs) -> Result<ExitCode, Error> {
    let resolved = load(global)?;
    let config = resolved.config;
    let snapshot = ScheduleSnapshot::from_file(&args.snapshot)?;

    let health = match &args.entries {
        Some(path) => {
            let entries: Vec<ScheduleEntry> = read_json(path)?;
            Some(AnomalyDetector::new(config.anomaly.clone()).detect(&entries)?)
        }
        None => None,
    };

    let mut engine = RecommendationEngine::new(config.recommend.clone());
    if let Some(path) = &args.data {
        let source = InMemoryDataSource::from_file(path)?;
        let forecaster = LoadForecaster::open(source, config.forecast.clone());
        if forecaster.is_trained() {
            let start = args
                .start
                .or_else(|| snapshot.period.and_then(|p| p.end.succ_opt()))
                .unwrap_or_else(|| Local::now().date_naive());
            let window = forecaster.predict_call_load(start, args.days)?;
            engine = engine.with_demand_predictor(ForecastDemandPredictor::new(window));
        } else {
            tracing::warn!(
                event = event_names::MODEL_FALLBACK_USED,
                stage = %Stage::Recommend,
                "no trained forecast model; skipping demand prediction"
            );
        }
    }

    let bundle = engine.generate(&snapshot, &config.recommend.rules);
    let code = if bundle.priority_actions.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::Findings
    };
    let line = format!(
        "{} recommendations, {} priority actions, imbalance {:.2}, fairness {:.2}",
        bundle.recommendations.len(),
        bundle.priority_actions.len(),
        bundle.analysis.workload_imbalance,
        bundle.analysis.fairness_score
    );
    emit(global, &RecommendOutput { bundle, health }, line);
    Ok(code)
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> Result<ExitCode, Error> {
    let resolved = load(global)?;
    match args.action {
        ConfigCommands::Show => {
            let line = format!("config from {}", describe_source(&resolved));
            emit(global, &resolved, line);
        }
        ConfigCommands::Validate => {
            let response = serde_json::json!({
                "status": "valid",
                "source": resolved.source.to_string(),
                "path": resolved.path,
                "hash": resolved.hash,
                "schema_version": resolved.config.schema_version,
            });
            let line = format!("valid: {}", describe_source(&resolved));
            emit(global, &response, line);
        }
    }
    Ok(ExitCode::Clean)
}

// ============================================================================
// Helpers
// ============================================================================

fn load(global: &GlobalOpts) -> Result<ResolvedConfig, Error> {
    let resolved = load_config(global.config.as_deref())?;
    match &resolved.path {
        Some(path) => tracing::info!(
            event = event_names::CONFIG_LOADED,
            stage = %Stage::Init,
            source = %resolved.source,
            path = %path.display(),
            "configuration loaded"
        ),
        None => tracing::debug!(
            event = event_names::CONFIG_DEFAULT_USED,
            stage = %Stage::Init,
            "using built-in configuration defaults"
        ),
    }
    Ok(resolved)
}

fn describe_source(resolved: &ResolvedConfig) -> String {
    match &resolved.path {
        Some(path) => format!("{} ({})", path.display(), resolved.source),
        None => resolved.source.to_string(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Write `value` to stdout in the selected format.
fn emit<T: Serialize>(global: &GlobalOpts, value: &T, summary: String) {
    let rendered = match global.format {
        OutputFormat::Json => serde_json::to_string_pretty(value),
        OutputFormat::Jsonl => serde_json::to_string(value),
        OutputFormat::Summary => {
            println!("{}", summary);
            return;
        }
    };
    match rendered {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("failed to serialize output: {}", err),
    }
}

/// Output an error in the appropriate format.
fn output_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    let structured = StructuredError::from(error);
    match global.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&structured) {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", structured.to_json()),
        },
        OutputFormat::Jsonl => eprintln!("{}", structured.to_json()),
        OutputFormat::Summary => {
            eprintln!("[{}] {}: {}", error.code(), error.headline(), error);
            eprintln!("hint: {}", error.remediation());
        }
    }
    ExitCode::from(error)
}
