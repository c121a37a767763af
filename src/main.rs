use anyhow::{Context, Result};
use clap::Parser;
use retail_qa::intent::SynonymMatching;
use retail_qa::{AppConfig, DispatchEngine};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "retail-qa")]
#[command(about = "Answer questions about the retail datasets in plain English")]
struct Args {
    /// Directory holding the processed CSV datasets
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for charts and exported transaction slices
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Execution log file (CSV)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Only accept synonym hits on word boundaries
    #[arg(long)]
    word_boundary: bool,

    /// Answer a single question and exit
    #[arg(short, long)]
    query: Option<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("retail_qa=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    let mut engine = DispatchEngine::new(config).context("Failed to start the dispatch engine")?;

    if let Some(query) = &args.query {
        println!("{}", engine.ask(query).text);
        return Ok(());
    }

    info!("Interactive session started");
    println!("Ask a question about the retail data ('exit' to quit).");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit(query) {
            break;
        }

        let answer = engine.ask(query);
        println!("{}", answer.text);
        if let Some(chart) = &answer.chart {
            println!("(chart: {})", chart.display());
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Session-ending sentinels typed at the prompt.
fn is_exit(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

/// Defaults, then the JSON file, then the environment, then CLI flags.
fn load_config(args: &Args) -> Result<AppConfig> {
    let base = match &args.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AppConfig::default(),
    };
    let mut config = base.with_env()?;

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(file) = &args.log_file {
        config.log_file = file.clone();
    }
    if args.word_boundary {
        config.synonym_matching = SynonymMatching::WordBoundary;
    }
    Ok(config)
}
