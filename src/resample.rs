//! View-driven resampling of a level of detail into screen points.

use crate::datasource::{Aggregation, aggregate_buckets, bucket_count};
use crate::geom::ScreenPoint;
use crate::transform::Transform;
use crate::view::Range;

/// Inputs for one series resample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleParams {
    /// Window to compute, in world units, before buffering.
    pub window: Range,
    /// World bounds the level spans.
    pub world: Range,
    /// Extra margin on each side, as a fraction of the window span.
    pub buffer_frac: f64,
    /// Maximum number of points to emit.
    pub resolution: usize,
    /// Channel height in pixels.
    pub channel_height: f64,
    /// Global value range of the series.
    pub value_range: Range,
    /// Reduction used when re-aggregating to pixel density.
    pub aggregation: Aggregation,
}

/// Output of a resample pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    /// Points in screen space, ordered by X.
    pub points: Vec<ScreenPoint>,
    /// World window the points actually cover.
    pub data_window: Range,
    /// Level values folded into each emitted point.
    pub bucket_size: usize,
}

impl Resampled {
    fn empty(data_window: Range) -> Self {
        Self {
            points: Vec::new(),
            data_window,
            bucket_size: 0,
        }
    }
}

/// Expand `window` by `buffer_frac` on each side and clamp it to `world`.
///
/// Returns `None` when nothing of the window lies inside the world.
pub fn buffered_window(window: Range, world: Range, buffer_frac: f64) -> Option<Range> {
    let expanded = window.expanded(buffer_frac);
    expanded
        .intersect(world)
        .filter(|clamped| clamped.span() > 0.0)
}

/// Scale a point budget for `window` so the buffered margins get the same
/// density as the window itself.
pub fn buffered_resolution(resolution: usize, window: Range, world: Range, buffer_frac: f64) -> usize {
    let Some(buffered) = buffered_window(window, world, buffer_frac) else {
        return resolution;
    };
    if window.span() <= 0.0 || buffered.span() <= window.span() {
        return resolution;
    }
    let scaled = (resolution as f64 * buffered.span() / window.span()).ceil();
    if scaled.is_finite() {
        scaled as usize
    } else {
        resolution
    }
}

/// Index range of a `len` element array spread evenly over `world`.
pub fn index_range(window: Range, world: Range, len: usize) -> std::ops::Range<usize> {
    if len == 0 || !world.is_valid() {
        return 0..0;
    }
    let scale = len as f64 / world.span();
    let start = ((window.min - world.min) * scale).floor().clamp(0.0, len as f64) as usize;
    let end = ((window.max - world.min) * scale).ceil().clamp(0.0, len as f64) as usize;
    start.min(end)..end
}

/// Map a value into channel-local screen Y (0 at the top).
///
/// A flat value range maps every value to the bottom of the channel.
pub fn value_to_y(value: f64, value_range: Range, channel_height: f64) -> f64 {
    let span = value_range.span();
    let percent = if span > 0.0 {
        (value - value_range.min) / span
    } else {
        0.0
    };
    (1.0 - percent) * channel_height
}

/// Resample one level into at most `params.resolution` screen points.
///
/// `level` is the aggregated series spread evenly across `params.world`;
/// `transform` maps world X into the screen of the current view.
pub fn resample(level: &[f64], params: &ResampleParams, transform: &Transform) -> Resampled {
    if level.is_empty() || params.resolution == 0 {
        return Resampled::empty(params.window);
    }
    let Some(window) = buffered_window(params.window, params.world, params.buffer_frac) else {
        return Resampled::empty(params.window);
    };

    let indices = index_range(window, params.world, level.len());
    if indices.is_empty() {
        return Resampled::empty(window);
    }
    let per_index = params.world.span() / level.len() as f64;
    let covered = Range::new(
        params.world.min + indices.start as f64 * per_index,
        params.world.min + indices.end as f64 * per_index,
    );

    let slice = &level[indices];
    let bucket_size = if slice.len() > params.resolution {
        slice.len().div_ceil(params.resolution)
    } else {
        1
    };
    let values = if bucket_size > 1 {
        aggregate_buckets(slice, bucket_size, params.aggregation)
    } else {
        slice.to_vec()
    };
    debug_assert!(values.len() <= params.resolution);
    debug_assert_eq!(values.len(), bucket_count(slice.len(), bucket_size));

    let step = covered.span() / values.len() as f64;
    let points = values
        .iter()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .map(|(index, &value)| {
            let world_x = covered.min + index as f64 * step;
            ScreenPoint::new(
                transform.to_screen(world_x) as f32,
                value_to_y(value, params.value_range, params.channel_height) as f32,
            )
        })
        .collect();

    Resampled {
        points,
        data_window: covered,
        bucket_size,
    }
}
