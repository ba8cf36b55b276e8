mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use examiner_engine::Engine;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "examiner-cli")]
#[command(about = "Examiner CLI - Check toolchains, run and score exam submissions", long_about = None)]
struct Cli {
    /// Engine config file (defaults to config/engine.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true, default_value = "false")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether compilers/interpreters are installed
    Check {
        /// Language to check (e.g., java, c, cpp, python); all when omitted
        language: Option<String>,
    },

    /// Run a source file once against the given input
    Run {
        /// Language name (e.g., java, c++, python3)
        #[arg(short, long)]
        language: String,

        /// Source file
        #[arg(short, long)]
        source: PathBuf,

        /// File to feed on stdin ("-" reads this process's stdin)
        #[arg(long)]
        stdin: Option<PathBuf>,

        /// Wall-clock limit for the run
        #[arg(short, long)]
        time_limit_ms: Option<u64>,
    },

    /// Score a source file against a JSON list of {"input", "output"} cases
    Evaluate {
        /// Language name (e.g., java, c++, python3)
        #[arg(short, long)]
        language: String,

        /// Source file
        #[arg(short, long)]
        source: PathBuf,

        /// Test case file
        #[arg(short, long)]
        cases: PathBuf,

        /// Wall-clock limit per case
        #[arg(short, long)]
        time_limit_ms: Option<u64>,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout carries the JSON results; logs go to stderr
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = commands::load_config(cli.config.as_deref())?;
    let engine = Engine::new(config)?;
    info!("Examiner engine initialized");

    match cli.command {
        Commands::Check { language } => {
            let all_available = commands::check(&engine, language.as_deref()).await?;
            if !all_available {
                std::process::exit(1);
            }
        }
        Commands::Run {
            language,
            source,
            stdin,
            time_limit_ms,
        } => {
            commands::run(&engine, &language, &source, stdin.as_deref(), time_limit_ms).await?;
        }
        Commands::Evaluate {
            language,
            source,
            cases,
            time_limit_ms,
        } => {
            commands::evaluate(&engine, &language, &source, &cases, time_limit_ms).await?;
        }
    }

    Ok(())
}
