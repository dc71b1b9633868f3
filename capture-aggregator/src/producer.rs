//! The producer tick loop (SPEC_FULL.md §4.5): merges FrameStream's latest
//! frame and StateClient's latest state into the shared arena. Grounded on
//! `GameCapture.__update_loop` in `original_source/src/aci/game_capture/inference.py`.

use crate::arena::ObservationArena;
use frame_stream::FrameSlot;
use harness_types::ImageShape;
use state_client::StateClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Runs forever, pacing each tick on a new state snapshot arriving (the
/// higher-frequency source) and opportunistically picking up whatever frame
/// FrameStream most recently published.
pub async fn run(
    mut arena: ObservationArena,
    frame_slot: Arc<FrameSlot>,
    state_client: StateClient,
    expected_image_shape: ImageShape,
) -> ! {
    loop {
        let snapshot = state_client.new_state().await;

        if frame_slot.is_fresh() {
            if let Some((shape, data)) = frame_slot.latest() {
                if shape == expected_image_shape {
                    arena.write_image(&data);
                } else {
                    warn!(
                        ?shape,
                        ?expected_image_shape,
                        "frame shape does not match the configured arena, dropping frame"
                    );
                }
            }
            frame_slot.mark_consumed();
        }

        arena.write_state(&snapshot.payload);
        arena.publish();

        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
