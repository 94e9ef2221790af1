use std::io::{self, Cursor};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use tokio::io::{AsyncReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use text_mutator_client::cli::Args;
use text_mutator_client::error::Result;
use text_mutator_client::{
    ui, CacheConfig, HealthMonitor, HttpMutatorClient, MutationQueryCache, SessionController,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("text_mutator_client=info,text_mutator=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = args.resolve_config()?;
    let api = Arc::new(HttpMutatorClient::from_config(&config));

    let monitor = HealthMonitor::new(Arc::clone(&api), config.health_interval());

    if args.health {
        let status = monitor.check_once().await;
        println!("{status}");
        return Ok(if status.is_alive() { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let health = monitor.subscribe();
    tokio::spawn(monitor.run());

    let cache = MutationQueryCache::new(api, CacheConfig::from(&config));
    let mut session = SessionController::new(cache);
    session.on_options_changed(args.options());

    eprintln!(
        "{}",
        format!("  Mutation service: {}", config.base_url).bright_green()
    );
    eprintln!("{}", "  Type text, then :mutate. :f marks a find, :d reveals, :q quits.".bright_blue());

    let stdin = tokio::io::stdin();
    let mut stdout = io::stdout();
    match args.text {
        // Seed the buffer and submit straight away, then continue interactively.
        Some(text) => {
            let scripted = Cursor::new(format!(":text {}\n:mutate\n", text.replace('\n', " ")));
            let input = BufReader::new(scripted.chain(stdin));
            ui::run(&mut session, input, &mut stdout, Some(health)).await?;
        }
        None => ui::run(&mut session, BufReader::new(stdin), &mut stdout, Some(health)).await?,
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format!("error: {e}").red());
            ExitCode::FAILURE
        }
    }
}
