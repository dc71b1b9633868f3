use capture_aggregator::{CaptureAggregator, ObservationArena, StatePayload, StatePostProcessor};
use clap::Parser;
use harness_config::CommonArgs;
use recorder::Recorder;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = CommonArgs::parse();
    let _guard = env_tracing_logger::initiate_logging(args.log_file.as_ref(), false)?;
    let config = args.load_config()?;

    let schema = harness_types::physics_graphics_schema();
    let shape = capture_aggregator::image_shape_from_config(&config.capture);
    let (image_len, state_len) = capture_aggregator::arena_sizes(&config.capture, &schema);
    let arena = ObservationArena::open(
        &config.capture.shared_memory.observation_arena_path,
        image_len,
        state_len,
    )?;
    let aggregator = CaptureAggregator::new(arena, shape, StatePostProcessor::identity(schema));
    let writer = Recorder::new(&config.recording.save_path)?;

    let running = Arc::new(AtomicBool::new(true));
    let loop_running = running.clone();
    let handle = tokio::task::spawn_blocking(move || record_loop(aggregator, writer, loop_running));

    tokio::signal::ctrl_c().await?;
    running.store(false, Ordering::Relaxed);
    handle.await??;
    Ok(())
}

fn record_loop(
    mut aggregator: CaptureAggregator,
    mut writer: Recorder,
    running: Arc<AtomicBool>,
) -> eyre::Result<()> {
    info!("Starting to record game session");
    while running.load(Ordering::Relaxed) {
        let capture = aggregator.capture()?;
        let state = match capture.state {
            StatePayload::Raw(bytes) => bytes,
            _ => unreachable!("recorder always configures the identity post-processor"),
        };
        writer.write(capture.shape, &capture.image, &state)?;
    }
    info!(frames = writer.frame_count(), "Finished recording");
    Ok(())
}
