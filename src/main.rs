use std::fs::File;
use std::io::{stderr, stdout, BufWriter, Write};
use std::process::exit;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use metro_ticketing::engine::AsyncEngine;
use metro_ticketing::storage::DocumentStore;
use metro_ticketing::{BalanceLedger, FareTableDocument, MemoryStore, SessionHub};

#[tokio::main]
async fn main() -> Result<()> {
    //NOTE: Three positional arguments do not justify pulling in a full argument parser
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: metro-ticketing [fares].csv [commands].csv [log_level:optional] > [output].csv");
        eprintln!("Available log levels: error, warn, info, debug, trace (default: error)");
        exit(1);
    }

    let fares_path = &args[1];
    let commands_path = &args[2];
    let log_level = args.get(3)
        .map(|s| parse_log_level(s)).unwrap_or(LevelFilter::ERROR);

    setup_logging(log_level);

    let fares = File::open(fares_path).with_context(|| format!("Error opening fare table at path: {fares_path}"))?;
    let store = Arc::new(MemoryStore::new().with_fare_table(FareTableDocument::from_csv(fares)?));
    let ledger = Arc::new(BalanceLedger::new(store.clone()));
    let engine = AsyncEngine::new(ledger, Arc::new(SessionHub::new()));

    let timer = Instant::now();
    engine.run(commands_path).await?;
    let duration = timer.elapsed();

    info!("Processed commands in: {duration:?}");

    write_results_to_stdout(&store)?;

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("Unknown log level '{level}', using 'error'");
        LevelFilter::ERROR
    })
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the balance report, so log lines go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(stderr).with_filter(level))
        .init();
}

fn write_results_to_stdout(store: &MemoryStore) -> Result<()> {
    let mut output = BufWriter::new(stdout().lock());

    writeln!(output, "user,balance,tickets")?;

    for account in store.accounts() {
        let tickets = store.list_tickets(&account.user_id)?;

        writeln!(output, "{},{},{}", account.user_id, account.balance, tickets.len())?;
    }

    output.flush()?;

    Ok(())
}
