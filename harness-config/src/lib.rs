//! Hierarchical configuration for every binary in this workspace
//! (SPEC_FULL.md §6, §10.3).
//!
//! Configuration is plain `serde`-derived structs loaded from TOML, with a
//! small two-tier merge (a base file plus an optional override fragment)
//! mirroring the defaults-plus-dynamic-override merge the capture process
//! performs upstream, without attempting the simulator default-file merge
//! that is explicitly out of scope for this system.

use harness_types::TrackDataDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("reading config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("merging override fragment: {0}")]
    Merge(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureImagesConfig {
    pub width: u32,
    pub height: u32,
    pub image_format: String,
    pub window_location: Option<String>,
    pub wait_for_new_frames: bool,
}

impl Default for CaptureImagesConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            image_format: "bgrx".to_string(),
            window_location: None,
            wait_for_new_frames: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureStateConfig {
    pub use_dicts: bool,
    pub simulate_ins: bool,
}

impl Default for CaptureStateConfig {
    fn default() -> Self {
        Self {
            use_dicts: true,
            simulate_ins: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub framerate: u32,
    pub codec: String,
    pub extra_args: Vec<String>,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            framerate: 30,
            codec: "h264".to_string(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedMemoryConfig {
    pub physics_path: PathBuf,
    pub physics_payload_len: usize,
    pub graphics_path: PathBuf,
    pub graphics_payload_len: usize,
    /// Fixed local port `state-client` connects to (SPEC_FULL.md §6).
    pub state_server_port: u16,
    /// Backing file for `capture-aggregator`'s shared observation arena
    /// (SPEC_FULL.md §4.5); producer and every consumer process map this
    /// same path.
    pub observation_arena_path: PathBuf,
}

impl Default for SharedMemoryConfig {
    fn default() -> Self {
        Self {
            physics_path: PathBuf::from("/dev/shm/acpmf_physics"),
            physics_payload_len: 0,
            graphics_path: PathBuf::from("/dev/shm/acpmf_graphics"),
            graphics_payload_len: 0,
            state_server_port: 6000,
            observation_arena_path: PathBuf::from("/dev/shm/aci_observation_arena"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub images: CaptureImagesConfig,
    pub state: CaptureStateConfig,
    pub ffmpeg: FfmpegConfig,
    pub shared_memory: SharedMemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    /// Check every N steps; -1 disables the termination check entirely.
    pub check_every_n: i64,
    pub max_consecutive_failures: u32,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            check_every_n: 10,
            max_consecutive_failures: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub save_path: PathBuf,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("recordings"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub table_name: Option<String>,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            dbname: "telemetry".to_string(),
            table_name: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntervalMonitorConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub column: String,
    pub interval_column: String,
    pub intervals: HashMap<String, (f64, f64)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub monitors: Vec<IntervalMonitorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub visuals: bool,
    pub data: bool,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            visuals: true,
            data: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub depth: bool,
    pub normals: bool,
    pub segmentation: SegmentationConfig,
    /// Track collision mesh to ray-cast against (SPEC_FULL.md §3 TrackMesh).
    pub track_mesh_path: PathBuf,
    /// Per-track geometry/material table (SPEC_FULL.md §4.11).
    pub track_data: TrackDataDescriptor,
    /// Directory offline-generate writes rasters and copied frames into.
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub capture: CaptureConfig,
    pub termination: TerminationConfig,
    pub recording: RecordingConfig,
    pub postgres: PostgresConfig,
    pub evaluation: EvaluationConfig,
    pub generate: GenerateConfig,
    pub vertical_fov: f64,
    pub image_size: (u32, u32),
    pub sample_every: usize,
    pub start_at_sample: usize,
    pub finish_at_sample: Option<usize>,
    pub n_ray_casting_workers: usize,
    pub n_generation_workers: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            termination: TerminationConfig::default(),
            recording: RecordingConfig::default(),
            postgres: PostgresConfig::default(),
            evaluation: EvaluationConfig::default(),
            generate: GenerateConfig::default(),
            vertical_fov: 90.0,
            image_size: (1280, 720),
            sample_every: 1,
            start_at_sample: 0,
            finish_at_sample: None,
            n_ray_casting_workers: 4,
            n_generation_workers: 4,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merges an override TOML fragment on top of this configuration,
    /// key-by-key at the top level of each table (the override fragment need
    /// only contain the keys it changes).
    pub fn merge_override(self, override_toml: &str) -> Result<Self> {
        let base_text = toml::to_string(&self).expect("HarnessConfig always serialises");
        let base: toml::Value = toml::from_str(&base_text)?;
        let over: toml::Value = toml::from_str(override_toml)?;
        let merged = merge_toml_tables(base, over);
        let merged_text = toml::to_string(&merged).expect("merged table always serialises");
        Ok(toml::from_str(&merged_text)?)
    }
}

fn merge_toml_tables(base: toml::Value, over: toml::Value) -> toml::Value {
    match (base, over) {
        (toml::Value::Table(mut base_table), toml::Value::Table(over_table)) => {
            for (key, over_value) in over_table {
                let merged = match base_table.remove(&key) {
                    Some(base_value) => merge_toml_tables(base_value, over_value),
                    None => over_value,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, over_value) => over_value,
    }
}

/// The common CLI surface every binary in this workspace shares: a path to
/// its configuration file and log verbosity, via an optional override
/// fragment (SPEC_FULL.md §10.3).
#[derive(Debug, Clone, clap::Parser)]
pub struct CommonArgs {
    /// Path to the base TOML configuration file.
    #[arg(long, env = "HARNESS_CONFIG")]
    pub config: PathBuf,

    /// Path to an optional TOML fragment overriding keys in `config`.
    #[arg(long)]
    pub config_override: Option<PathBuf>,

    /// Path to write logs to, in addition to the console.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl CommonArgs {
    pub fn load_config(&self) -> Result<HarnessConfig> {
        let base = HarnessConfig::load(&self.config)?;
        match &self.config_override {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
                    path: path.clone(),
                    source,
                })?;
                base.merge_override(&text)
            }
            None => Ok(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let cfg = HarnessConfig::default();
        let text = toml::to_string(&cfg).unwrap();
        let parsed: HarnessConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.image_size, cfg.image_size);
        assert_eq!(parsed.n_ray_casting_workers, cfg.n_ray_casting_workers);
    }

    #[test]
    fn override_fragment_changes_only_named_keys() {
        let cfg = HarnessConfig::default();
        let merged = cfg
            .merge_override("n_ray_casting_workers = 16\n[postgres]\nhost = \"db.internal\"\n")
            .unwrap();
        assert_eq!(merged.n_ray_casting_workers, 16);
        assert_eq!(merged.postgres.host, "db.internal");
        assert_eq!(merged.postgres.port, 5432);
        assert_eq!(merged.n_generation_workers, 4);
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "vertical_fov = 75.0\n").unwrap();
        let cfg = HarnessConfig::load(&path).unwrap();
        assert_eq!(cfg.vertical_fov, 75.0);
    }
}
