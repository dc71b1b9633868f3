//! Shared data model and wire types for the capture/recording/ground-truth
//! harness: the vocabulary every other crate in this workspace builds on.

mod decoder;
mod error;
mod ins;
mod mesh;
mod observation;
mod payload;
mod schema;
mod snapshot;
mod telemetry;
mod tracker;

pub use decoder::{DecodedState, FieldValue, StateDecoder};
pub use error::{Error, Result};
pub use ins::{simulate_ins, OdometerState, SimulatedIns};
pub use mesh::{MaterialId, SemanticId, TrackDataDescriptor, TrackMeshData};
pub use observation::{ImageShape, Observation, PixelLayout};
pub use payload::IntersectionPayload;
pub use schema::{physics_graphics_schema, FieldKind, SchemaField, StateSchema};
pub use snapshot::StateSnapshot;
pub use telemetry::CumulativeTimeTracker;
pub use tracker::{Interval, Tracker, TrackerKind};
