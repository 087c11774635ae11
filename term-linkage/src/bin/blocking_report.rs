//! Blocking report
//!
//! Loads a CSV or Parquet file into DataFusion and reports how well a set of
//! blocking rules would reduce the comparisons of a linkage run on it.
//!
//! ```text
//! blocking-report people.csv -r "l.surname = r.surname" -r "l.city = r.city"
//! blocking-report people.parquet --request request.json --output json
//! blocking-report people.csv --profile
//! ```
//!
//! Exit status is 0 when the analysis completes, 2 when the statistics
//! provider failed part way through, and 1 on any other error.

use clap::{Parser, ValueEnum};
use datafusion::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use term_linkage::analysis::{AnalysisRequest, BlockingAnalyzer, BlockingReport};
use term_linkage::config::AnalyzerConfig;
use term_linkage::error::{LinkageError, Result};
use term_linkage::formatters::{
    FormatterConfig, HumanFormatter, JsonFormatter, MarkdownFormatter, ReportFormatter,
};
use term_linkage::logging::setup::{init_logging, LoggingConfig};
use term_linkage::profile::profile_table;
use term_linkage::rules::retain_valid_rules;
use term_linkage::statistics::{CachedStatistics, DataFusionStatistics};
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV or Parquet file holding the records
    data: PathBuf,

    /// Name to register the data under
    #[arg(long, default_value = "records")]
    table: String,

    /// Blocking rule, in order; repeat for several rules
    #[arg(short, long = "rule")]
    rules: Vec<String>,

    /// JSON analysis request with table, row_count and predicates
    #[arg(long, conflicts_with = "rules")]
    request: Option<PathBuf>,

    /// JSON scoring configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drop rules that reference columns missing from the data
    #[arg(long)]
    retain_valid: bool,

    /// Print column statistics and suggested rules instead of analysing
    #[arg(long)]
    profile: bool,

    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    output: OutputFormat,

    /// Disable ANSI colours in human output
    #[arg(long)]
    no_color: bool,

    /// Debug logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default().with_level(Level::WARN).with_linkage_level(Level::WARN)
    };
    if let Err(e) = init_logging(logging.with_json_format(args.json_logs)) {
        eprintln!("warning: logging not initialised: {e}");
    }

    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the analysis ran to completion.
async fn run(args: &Args) -> Result<bool> {
    let config = match &args.config {
        Some(path) => AnalyzerConfig::from_json_file(path)?,
        None => AnalyzerConfig::default(),
    };

    let request = match &args.request {
        Some(path) => Some(AnalysisRequest::from_json_file(path)?),
        None => None,
    };
    let table = request.as_ref().map_or(args.table.as_str(), |r| r.table.as_str());

    let ctx = SessionContext::new();
    register(&ctx, table, &args.data).await?;

    if args.profile {
        let profile = profile_table(&ctx, table).await?;
        match args.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&profile)?),
            _ => {
                println!("{} rows in '{}'", profile.row_count, profile.table);
                for column in &profile.columns {
                    println!(
                        "  {:<24} {:<12} {:>10} distinct {:>6.1}% null",
                        column.column, column.data_type, column.distinct_count, column.null_percentage
                    );
                }
                println!("Suggested rules:");
                for rule in profile.suggested_rules(config.recommendations.min_cardinality) {
                    println!("  {rule}");
                }
            }
        }
        return Ok(true);
    }

    let statistics = DataFusionStatistics::new(ctx);
    let mut predicates = match &request {
        Some(request) => request.predicates.clone(),
        None => args.rules.clone(),
    };
    if predicates.is_empty() {
        return Err(LinkageError::invalid_input(
            "no blocking rules given; use --rule or --request",
        ));
    }

    if args.retain_valid {
        let columns = statistics.column_names(table).await?;
        let kept = retain_valid_rules(&predicates, &columns);
        if kept.len() < predicates.len() {
            warn!(
                dropped = predicates.len() - kept.len(),
                "Dropped rules referencing missing columns"
            );
        }
        predicates = kept;
    }

    let row_count = match &request {
        Some(request) => request.row_count()?,
        None => statistics.row_count(table).await?,
    };
    info!(table, row_count, rules = predicates.len(), "Analysing blocking rules");

    let analyzer = BlockingAnalyzer::new(CachedStatistics::new(statistics)).with_config(config);
    let outcome = match &request {
        Some(request) => {
            let request = AnalysisRequest::new(table, request.row_count, predicates.clone());
            analyzer.analyze_request(&request).await?
        }
        None => analyzer.analyze(table, &predicates, row_count).await?,
    };
    let report = BlockingReport::build(&outcome, &predicates, analyzer.config());

    let formatter_config = FormatterConfig::detailed().with_colors(!args.no_color);
    let rendered = match args.output {
        OutputFormat::Human => HumanFormatter::with_config(formatter_config).format(&report)?,
        OutputFormat::Json => JsonFormatter::with_config(formatter_config).format(&report)?,
        OutputFormat::Markdown => MarkdownFormatter::with_config(formatter_config).format(&report)?,
    };
    println!("{rendered}");

    Ok(report.is_complete())
}

async fn register(ctx: &SessionContext, table: &str, path: &Path) -> Result<()> {
    let location = path
        .to_str()
        .ok_or_else(|| LinkageError::invalid_input("data path is not valid UTF-8"))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("parquet") => {
            ctx.register_parquet(table, location, ParquetReadOptions::default())
                .await?
        }
        Some("csv") => ctx.register_csv(table, location, CsvReadOptions::new()).await?,
        _ => {
            return Err(LinkageError::invalid_input(format!(
                "unsupported data file '{}': expected .csv or .parquet",
                path.display()
            )))
        }
    }
    Ok(())
}
