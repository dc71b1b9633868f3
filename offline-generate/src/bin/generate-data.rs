use clap::Parser;
use harness_config::CommonArgs;
use offline_generate::{load_track_mesh, run, PipelineConfig};
use tracing::info;

fn main() -> eyre::Result<()> {
    let args = CommonArgs::parse();
    let _guard = env_tracing_logger::initiate_logging(args.log_file.as_ref(), false)?;
    let config = args.load_config()?;

    info!(path = ?config.generate.track_mesh_path, "loading track collision mesh");
    let loaded = load_track_mesh(&config.generate.track_mesh_path, &config.generate.track_data)?;

    let pipeline_cfg = PipelineConfig {
        recording_dir: config.recording.save_path,
        output_dir: config.generate.output_path,
        width: config.image_size.0,
        height: config.image_size.1,
        fov_v_degrees: config.vertical_fov,
        want_depth: config.generate.depth,
        want_normals: config.generate.normals,
        want_segmentation_visuals: config.generate.segmentation.visuals,
        want_segmentation_data: config.generate.segmentation.data,
        start_at_sample: config.start_at_sample,
        finish_at_sample: config.finish_at_sample,
        sample_every: config.sample_every,
        n_ray_casting_workers: config.n_ray_casting_workers,
        n_generation_workers: config.n_generation_workers,
    };

    let processed = run(
        &pipeline_cfg,
        loaded.collision_mesh,
        loaded.data,
        config.generate.track_data,
    )?;
    info!(processed, "offline ground-truth generation complete");
    Ok(())
}
