use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tickprep_analytics::Pipeline;
use tickprep_core::Config;
use tickprep_ingestion::{StaticSplitSource, TickReader};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "tickprep-report")]
#[command(about = "Split-adjust tick data and report daily return statistics")]
#[command(version)]
struct Cli {
    /// Directory of tick files
    #[arg(short, long)]
    data_dir: PathBuf,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured symbol; explicit splits for another symbol are dropped
    #[arg(short, long)]
    symbol: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(symbol) = cli.symbol {
        config.set_symbol(symbol);
    }

    let ingest = TickReader::new(config.ingest.clone())
        .read_directory(&cli.data_dir)
        .with_context(|| format!("reading ticks from {}", cli.data_dir.display()))?;

    let splits =
        StaticSplitSource::new().with_splits(config.instrument.symbol.clone(), config.split_events());
    let pipeline = Pipeline::new(config)?;
    let output = pipeline.run(&ingest.records, &splits)?;
    let symbol = &pipeline.config().instrument.symbol;
    let report = output
        .report
        .ok_or_else(|| anyhow::anyhow!("no defined daily returns for {}", symbol))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.to_map())?);
    } else {
        println!("Returns report for {}", symbol);
        println!("{}", report);
    }

    Ok(())
}
