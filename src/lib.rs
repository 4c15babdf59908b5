//! lodview is a level-of-detail render pipeline for panning and zooming
//! across very long numeric series.
//! The crate turns raw series plus the current view window into short
//! screen-space polylines, with an immediate coarse pass and a debounced
//! fine pass.

#![forbid(unsafe_code)]

pub mod config;
pub mod datasource;
pub mod error;
pub mod geom;
pub mod interaction;
pub mod lod;
pub mod metrics;
pub mod pipeline;
pub mod render;
pub mod resample;
pub mod scheduler;
pub mod simplify;
pub mod transform;
pub mod view;
pub mod viewport;

pub use config::{PipelineConfig, WorkerMode};
pub use datasource::{Aggregation, Series, SeriesId, SeriesStore, aggregate_buckets};
pub use error::{PipelineError, Result};
pub use geom::{ChannelBand, ScreenPoint};
pub use interaction::{zoom_factor_from_drag, zoom_factor_from_wheel};
pub use lod::{LevelKey, LodCache, LodLevel, LodStep};
pub use metrics::RenderMetrics;
pub use pipeline::{FineResults, Pipeline, PipelineBuilder};
pub use render::{
    DebugEntry, DebugOverlay, PassJob, PassKind, RenderRequest, RenderResult, SeriesPolyline,
};
pub use resample::{ResampleParams, Resampled, resample};
pub use scheduler::{RenderScheduler, RenderWorker, TaskHandle, TaskId, TaskTimer};
pub use simplify::{Simplifier, simplify};
pub use transform::Transform;
pub use view::Range;
pub use viewport::{GestureState, ViewEvent, ViewportModel};
