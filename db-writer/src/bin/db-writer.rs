use capture_aggregator::{CaptureAggregator, ObservationArena, StatePayload, StatePostProcessor};
use clap::Parser;
use db_writer::DatabaseWriter;
use harness_config::CommonArgs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = CommonArgs::parse();
    let _guard = env_tracing_logger::initiate_logging(args.log_file.as_ref(), false)?;
    let config = args.load_config()?;

    let schema = harness_types::physics_graphics_schema();
    let table = db_writer::resolve_table_name(&config.postgres);
    let mut writer = DatabaseWriter::connect(&config.postgres, schema.clone(), table).await?;

    let shape = capture_aggregator::image_shape_from_config(&config.capture);
    let (image_len, state_len) = capture_aggregator::arena_sizes(&config.capture, &schema);
    let arena = ObservationArena::open(
        &config.capture.shared_memory.observation_arena_path,
        image_len,
        state_len,
    )?;
    let mut aggregator =
        CaptureAggregator::new(arena, shape, StatePostProcessor::identity(schema));

    let running = Arc::new(AtomicBool::new(true));
    let loop_running = running.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        loop_running.store(false, Ordering::Relaxed);
    });

    info!("Starting database logging");
    while running.load(Ordering::Relaxed) {
        let capture = tokio::task::block_in_place(|| aggregator.capture())?;
        let state = match capture.state {
            StatePayload::Raw(bytes) => bytes,
            _ => unreachable!("db-writer always configures the identity post-processor"),
        };
        writer.insert(&state).await?;
    }
    info!(rows = writer.rows_inserted(), "Finished database logging");
    Ok(())
}
