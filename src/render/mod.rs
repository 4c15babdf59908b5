//! Render pass inputs and outputs.
//!
//! These types are backend-agnostic: a pass produces ordered screen-space
//! polylines per series and leaves stroking them to the caller.

mod pass;

pub(crate) use pass::{PassSettings, plan_pass};
pub use pass::{PassJob, SeriesJob};

use crate::datasource::{Aggregation, SeriesId};
use crate::geom::{ChannelBand, ScreenPoint};
use crate::lod::LodStep;
use crate::view::Range;

/// Which of the two render passes produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// Immediate pass over the whole world at the coarsest level.
    Coarse,
    /// Debounced pass over the current view at the matching level.
    Fine,
}

/// One series to compute in a draw pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Series to render.
    pub series: SeriesId,
    /// View window in world units.
    pub window: Range,
    /// Maximum number of points to emit.
    pub resolution: usize,
    /// Reduction policy for this request.
    pub aggregation: Aggregation,
}

/// Screen-space polyline for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPolyline {
    /// Series the points belong to.
    pub series: SeriesId,
    /// Points ordered by X. Y is relative to the top of `band`.
    pub points: Vec<ScreenPoint>,
    /// Channel band the series is drawn in.
    pub band: ChannelBand,
}

impl SeriesPolyline {
    /// Points with Y shifted into absolute screen coordinates.
    pub fn absolute_points(&self) -> impl Iterator<Item = ScreenPoint> + '_ {
        let offset = self.band.y_offset as f32;
        self.points
            .iter()
            .map(move |point| ScreenPoint::new(point.x, point.y + offset))
    }

    /// Consecutive point pairs, ready to stroke as segments.
    pub fn segments(&self) -> impl Iterator<Item = (ScreenPoint, ScreenPoint)> + '_ {
        self.points.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Per-series diagnostics attached when the debug overlay is enabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugEntry {
    /// Series the entry describes.
    pub series: SeriesId,
    /// LOD step the pass read from.
    pub step: LodStep,
    /// Raw samples per value of that level.
    pub level_bucket: usize,
    /// Level values folded into each emitted point.
    pub resample_bucket: usize,
    /// True when simplification was discarded as too sparse.
    pub simplify_fallback: bool,
}

/// Diagnostics for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DebugOverlay {
    /// World window the pass actually computed, buffer included.
    pub data_window: Range,
    /// One entry per series.
    pub entries: Vec<DebugEntry>,
}

/// Output of one draw pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    /// Pass that produced the result.
    pub pass: PassKind,
    /// Sequence number of the request this answers.
    pub sequence: u64,
    /// View window the pass was computed for.
    pub window: Range,
    /// One polyline per series, in channel order.
    pub polylines: Vec<SeriesPolyline>,
    /// Total number of points across all polylines.
    pub point_count: usize,
    /// Present when the debug overlay is enabled.
    pub debug: Option<DebugOverlay>,
}

impl RenderResult {
    /// Polyline for a series, if the pass covered it.
    pub fn polyline(&self, series: SeriesId) -> Option<&SeriesPolyline> {
        self.polylines.iter().find(|polyline| polyline.series == series)
    }

    /// Check if no points were produced.
    pub fn is_empty(&self) -> bool {
        self.point_count == 0
    }
}
