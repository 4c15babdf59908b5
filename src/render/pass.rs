//! Planning and executing a single draw pass.
//!
//! Planning resolves every series to its cached level on the control thread.
//! The resulting [`PassJob`] only holds shared, read-only data, so it can run
//! anywhere and always produces the same output for the same inputs.

use std::sync::Arc;

use log::trace;

use crate::datasource::{Aggregation, SeriesId, SeriesStore};
use crate::error::Result;
use crate::geom::ChannelBand;
use crate::lod::{LevelKey, LodCache, LodStep};
use crate::render::{DebugEntry, DebugOverlay, PassKind, RenderResult, SeriesPolyline};
use crate::resample::{ResampleParams, buffered_window, resample};
use crate::simplify::Simplifier;
use crate::transform::Transform;
use crate::view::Range;

/// Settings shared by every series of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PassSettings {
    pub(crate) world: Range,
    pub(crate) buffer_frac: f64,
    pub(crate) aggregation: Aggregation,
    pub(crate) simplifier: Simplifier,
    pub(crate) debug: bool,
}

/// One series resolved to its level.
#[derive(Debug, Clone)]
pub struct SeriesJob {
    series: SeriesId,
    band: ChannelBand,
    step: LodStep,
    level_bucket: usize,
    values: Arc<[f64]>,
    params: ResampleParams,
}

impl SeriesJob {
    /// Series this job renders.
    pub fn series(&self) -> SeriesId {
        self.series
    }

    /// Level step the job reads from.
    pub fn step(&self) -> LodStep {
        self.step
    }
}

/// A fully planned pass, independent of the store and cache.
#[derive(Debug, Clone)]
pub struct PassJob {
    kind: PassKind,
    sequence: u64,
    window: Range,
    data_window: Range,
    view_length: f64,
    transform: Transform,
    simplifier: Simplifier,
    debug: bool,
    series: Vec<SeriesJob>,
}

impl PassJob {
    /// Pass kind.
    pub fn kind(&self) -> PassKind {
        self.kind
    }

    /// Sequence number the result will carry.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// View window the pass was planned for.
    pub fn window(&self) -> Range {
        self.window
    }

    /// Per-series jobs in channel order.
    pub fn series(&self) -> &[SeriesJob] {
        &self.series
    }

    /// Resample and simplify every series.
    pub fn run(&self) -> RenderResult {
        let mut polylines = Vec::with_capacity(self.series.len());
        let mut entries = Vec::new();
        let mut point_count = 0;

        for job in &self.series {
            let resampled = resample(&job.values, &job.params, &self.transform);
            let resample_bucket = resampled.bucket_size;
            let simplified = self
                .simplifier
                .apply(resampled.points, job.band.height, self.view_length);
            point_count += simplified.points.len();
            if self.debug {
                entries.push(DebugEntry {
                    series: job.series,
                    step: job.step,
                    level_bucket: job.level_bucket,
                    resample_bucket,
                    simplify_fallback: simplified.fell_back,
                });
            }
            polylines.push(SeriesPolyline {
                series: job.series,
                points: simplified.points,
                band: job.band,
            });
        }

        trace!(
            "{:?} pass #{} produced {point_count} points for {} series",
            self.kind,
            self.sequence,
            polylines.len()
        );

        RenderResult {
            pass: self.kind,
            sequence: self.sequence,
            window: self.window,
            polylines,
            point_count,
            debug: self.debug.then(|| DebugOverlay {
                data_window: self.data_window,
                entries,
            }),
        }
    }
}

/// Resolve a pass against the store and cache.
///
/// A coarse pass always covers the whole world at the coarsest level; a fine
/// pass covers the buffered view at the level matching the view width. Both
/// map X through the transform of the current view.
#[allow(clippy::too_many_arguments)]
pub(crate) fn plan_pass(
    kind: PassKind,
    sequence: u64,
    view: Range,
    transform: Transform,
    resolution: usize,
    settings: &PassSettings,
    layout: &[(SeriesId, ChannelBand)],
    store: &SeriesStore,
    cache: &mut LodCache,
) -> Result<PassJob> {
    let (window, step, buffer_frac) = match kind {
        PassKind::Coarse => (settings.world, LodStep::COARSEST, 0.0),
        PassKind::Fine => (
            view,
            LodStep::for_view(view.span(), cache.world_width()),
            settings.buffer_frac,
        ),
    };
    let data_window = buffered_window(window, settings.world, buffer_frac).unwrap_or(window);
    let key = LevelKey::new(step, settings.aggregation);

    let mut series = Vec::with_capacity(layout.len());
    for &(id, band) in layout {
        let level = cache.level(store, id, key)?;
        let value_range = store
            .require(id)?
            .value_range()
            .unwrap_or(Range::new(0.0, 0.0));
        series.push(SeriesJob {
            series: id,
            band,
            step,
            level_bucket: level.bucket_size(),
            values: level.shared_values(),
            params: ResampleParams {
                window,
                world: settings.world,
                buffer_frac,
                resolution,
                channel_height: band.height,
                value_range,
                aggregation: settings.aggregation,
            },
        });
    }

    Ok(PassJob {
        kind,
        sequence,
        window,
        data_window,
        view_length: window.span(),
        transform,
        simplifier: settings.simplifier,
        debug: settings.debug,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::Series;

    fn settings(world: Range) -> PassSettings {
        PassSettings {
            world,
            buffer_frac: 0.2,
            aggregation: Aggregation::Max,
            simplifier: Simplifier {
                enabled: false,
                ..Simplifier::default()
            },
            debug: true,
        }
    }

    #[test]
    fn fine_pass_reads_matching_level() {
        let mut store = SeriesStore::new();
        let id = store.insert(Series::from_values(
            "s",
            (0..10_000).map(|i| (i % 100) as f64).collect::<Vec<_>>(),
        ));
        let world = Range::new(0.0, 200.0);
        let mut cache = LodCache::new(world.span());
        let view = Range::new(50.0, 90.0);
        let transform = Transform::new(view, 100.0).unwrap();
        let layout = [(id, ChannelBand::new(0.0, 100.0))];

        let job = plan_pass(
            PassKind::Fine,
            3,
            view,
            transform,
            100,
            &settings(world),
            &layout,
            &store,
            &mut cache,
        )
        .unwrap();
        assert_eq!(job.series()[0].step().index(), 1);

        let result = job.run();
        assert_eq!(result.pass, PassKind::Fine);
        assert_eq!(result.sequence, 3);
        assert!(result.point_count <= 100);
        let debug = result.debug.expect("debug overlay requested");
        assert_eq!(debug.data_window, Range::new(42.0, 98.0));
        assert_eq!(debug.entries[0].level_bucket, 10);
    }

    #[test]
    fn coarse_pass_covers_world() {
        let mut store = SeriesStore::new();
        let id = store.insert(Series::from_values("s", vec![1.0; 400]));
        let world = Range::new(0.0, 40.0);
        let mut cache = LodCache::new(world.span());
        let view = Range::new(10.0, 20.0);
        let transform = Transform::new(view, 10.0).unwrap();
        let layout = [(id, ChannelBand::new(0.0, 50.0))];

        let job = plan_pass(
            PassKind::Coarse,
            1,
            view,
            transform,
            20,
            &settings(world),
            &layout,
            &store,
            &mut cache,
        )
        .unwrap();
        assert_eq!(job.window(), world);
        assert_eq!(job.series()[0].step(), LodStep::COARSEST);

        let result = job.run();
        let points = &result.polyline(id).unwrap().points;
        assert_eq!(points.len(), 20);
        assert_eq!(points[0].x, -10.0);
    }

    #[test]
    fn running_twice_is_bit_identical() {
        let mut store = SeriesStore::new();
        let id = store.insert(Series::from_values(
            "s",
            (0..5000).map(|i| (i as f64 * 0.013).sin()).collect::<Vec<_>>(),
        ));
        let world = Range::new(0.0, 1000.0);
        let mut cache = LodCache::new(world.span());
        let view = Range::new(123.0, 456.0);
        let transform = Transform::new(view, 500.0).unwrap();
        let mut settings = settings(world);
        settings.simplifier.enabled = true;
        let layout = [(id, ChannelBand::new(0.0, 80.0))];

        let job = plan_pass(
            PassKind::Fine,
            1,
            view,
            transform,
            500,
            &settings,
            &layout,
            &store,
            &mut cache,
        )
        .unwrap();
        let first: Vec<_> = job.run().polylines[0].points.iter().map(|p| p.to_bits()).collect();
        let second: Vec<_> = job.run().polylines[0].points.iter().map(|p| p.to_bits()).collect();
        assert_eq!(first, second);
    }
}
