use clap::Parser;
use harness_config::CommonArgs;
use std::sync::{Arc, RwLock};
use tracing::info;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = CommonArgs::parse();
    let _guard = env_tracing_logger::initiate_logging(args.log_file.as_ref(), false)?;
    let config = args.load_config()?;
    let shm = &config.capture.shared_memory;

    let reader = state_server::StateReader::open(
        &shm.physics_path,
        shm.physics_payload_len,
        &shm.graphics_path,
        shm.graphics_payload_len,
    )?;

    let slot = Arc::new(RwLock::new(None));
    let _running = state_server::spawn_reader_thread(reader, slot.clone());

    let listener = state_server::bind(shm.state_server_port).await?;
    info!(port = shm.state_server_port, "state-server listening");
    state_server::run(listener, slot).await?;
    Ok(())
}
