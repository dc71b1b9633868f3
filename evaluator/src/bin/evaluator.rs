use clap::Parser;
use evaluator::{build_trackers, Evaluator};
use harness_config::CommonArgs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = CommonArgs::parse();
    let _guard = env_tracing_logger::initiate_logging(args.log_file.as_ref(), false)?;
    let config = args.load_config()?;

    let table = db_writer::resolve_table_name(&config.postgres);
    let trackers = build_trackers(&table, &config.evaluation.monitors)?;
    info!(count = trackers.len(), "registered trackers");

    let evaluator = Evaluator::connect(&config.postgres, table, trackers).await?;

    let running = Arc::new(AtomicBool::new(true));
    let signal_running = running.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        signal_running.store(false, Ordering::Relaxed);
    });

    evaluator.run(running).await;
    Ok(())
}
