//! Investment advisor CLI
//!
//! Runs the news → financials → synthesis → recommendation pipeline for one or
//! more ticker symbols and writes Markdown reports.
//!
//! # Usage
//!
//! ```bash
//! export GROQ_API_KEY="..."
//!
//! cargo run --bin advisor -- analyze AAPL --company-name "Apple Inc."
//! cargo run --bin advisor -- batch AAPL MSFT NVDA
//! cargo run --bin advisor -- status AAPL
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use investment_advisor::pipeline::StageResult;
use investment_advisor::{
    AdvisorConfig, MarkdownReportAssembler, PipelineOrchestrator, PipelineRun, ReportAssembler,
    RunRequest, find_reports, normalize_symbol,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "advisor")]
#[command(about = "AI-assisted equity research: news, financials, synthesis and a recommendation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log to the console instead of a file
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory for reports and logs (overrides ADVISOR_OUTPUT_DIR)
    #[arg(short, long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one symbol and write its reports
    Analyze {
        /// Ticker symbol, e.g. AAPL
        symbol: String,

        /// Company name used in searches and prompts (defaults to the symbol)
        #[arg(short, long)]
        company_name: Option<String>,

        /// Print the full run as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Analyze several symbols concurrently
    Batch {
        /// Ticker symbols
        #[arg(required = true, num_args = 1..)]
        symbols: Vec<String>,
    },
    /// List the reports already written for a symbol
    Status {
        /// Ticker symbol
        symbol: String,
    },
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AdvisorConfig::from_env()?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    match cli.command {
        Commands::Version => {
            println!(
                "{} {}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION")
            );
            Ok(())
        }
        Commands::Status { symbol } => status(&config, &symbol),
        Commands::Analyze {
            symbol,
            company_name,
            json,
        } => {
            init_logging(&config, cli.verbose)?;
            analyze(&config, &symbol, company_name.as_deref(), json).await
        }
        Commands::Batch { symbols } => {
            init_logging(&config, cli.verbose)?;
            batch(&config, &symbols).await
        }
    }
}

fn init_logging(config: &AdvisorConfig, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        advisor_utils::init_tracing();
        return Ok(());
    }

    let path = advisor_utils::init_file_tracing(&config.logs_dir(), &config.log_level)
        .context("failed to initialize file logging")?;
    eprintln!("Logging to {}", path.display());
    Ok(())
}

fn prepare(config: &AdvisorConfig) -> anyhow::Result<PipelineOrchestrator> {
    config.validate()?;
    config.create_directories()?;
    info!("Using model {} at {}", config.model, config.api_base);
    Ok(PipelineOrchestrator::from_config(config)?)
}

async fn analyze(
    config: &AdvisorConfig,
    symbol: &str,
    company_name: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let symbol = normalize_symbol(symbol)?;
    let orchestrator = prepare(config)?;

    println!("Analyzing {symbol}...");
    let run = orchestrator.run(&symbol, company_name).await;
    let reports = MarkdownReportAssembler::from_config(config).assemble(&run)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!("{}", summary_table(std::slice::from_ref(&run)));
        println!("{}", timing_table(&run));
    }

    for path in reports.paths() {
        println!("Report: {}", path.display());
    }

    match run.failure_message() {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

async fn batch(config: &AdvisorConfig, symbols: &[String]) -> anyhow::Result<()> {
    let requests = symbols
        .iter()
        .map(|s| normalize_symbol(s).map(RunRequest::new))
        .collect::<Result<Vec<_>, _>>()?;
    let orchestrator = prepare(config)?;

    println!("Analyzing {} symbols...", requests.len());
    let runs = orchestrator.run_batch(&requests).await;

    let assembler = MarkdownReportAssembler::from_config(config);
    for run in &runs {
        assembler.assemble(run)?;
    }

    println!("{}", summary_table(&runs));

    let failed: Vec<String> = runs.iter().filter_map(PipelineRun::failure_message).collect();
    if !failed.is_empty() {
        bail!("{} of {} runs failed:\n{}", failed.len(), runs.len(), failed.join("\n"));
    }
    Ok(())
}

fn status(config: &AdvisorConfig, symbol: &str) -> anyhow::Result<()> {
    let symbol = normalize_symbol(symbol)?;
    let listing = find_reports(config, &symbol)?;

    if listing.is_empty() {
        println!("No reports found for {symbol} in {}", config.output_dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Kind", "Report"]);
    for path in &listing.analysis {
        table.add_row(vec!["Analysis".to_string(), path.display().to_string()]);
    }
    for path in &listing.recommendation {
        table.add_row(vec!["Recommendation".to_string(), path.display().to_string()]);
    }

    println!("{table}");
    Ok(())
}

fn summary_table(runs: &[PipelineRun]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Symbol",
            "Status",
            "Recommendation",
            "Confidence",
            "Target Price",
            "Time Horizon",
            "Elapsed",
        ]);

    for run in runs {
        let [label, confidence, target, horizon] = run
            .state
            .recommendation()
            .and_then(StageResult::output)
            .map_or_else(
                || ["-".to_string(), "-".to_string(), "-".to_string(), "-".to_string()],
                |r| {
                    [
                        r.recommendation.to_string(),
                        r.confidence.to_string(),
                        r.target_price.clone(),
                        r.time_horizon.clone(),
                    ]
                },
            );

        table.add_row(vec![
            run.state.symbol().to_string(),
            run.status.to_string(),
            label,
            confidence,
            target,
            horizon,
            format!("{:.1?}", run.elapsed),
        ]);
    }

    table
}

fn timing_table(run: &PipelineRun) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Stage", "Result", "Elapsed"]);

    for timing in &run.stage_timings {
        table.add_row(vec![
            timing.stage.to_string(),
            if timing.success { "ok" } else { "failed" }.to_string(),
            format!("{:.1?}", timing.elapsed),
        ]);
    }

    table
}
