//! Level-of-detail cache keyed by series and discretized zoom step.
//!
//! A level at step `p` aggregates the raw series with a bucket size of
//! `max(N / W * p, 1)` samples, where `N` is the series length and `W` the
//! world width. Step 0 is the raw series itself. Levels are built on first
//! use and stay valid until the series values are replaced; panning and
//! zooming never invalidate them.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::datasource::{Aggregation, SeriesId, SeriesStore, aggregate_buckets};
use crate::error::{PipelineError, Result};

/// Number of discrete zoom steps.
pub const STEP_COUNT: u8 = 6;

const STEP_WIDTH: f64 = 0.2;

/// Discretized fraction of the world visible in the view.
///
/// Step `i` stands for a view covering `i * 0.2` of the world width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LodStep(u8);

impl LodStep {
    /// Raw samples.
    pub const FINEST: Self = Self(0);
    /// Whole-world overview.
    pub const COARSEST: Self = Self(STEP_COUNT - 1);

    /// Create a step from its index.
    pub fn new(index: u8) -> Option<Self> {
        (index < STEP_COUNT).then_some(Self(index))
    }

    /// Step index, `0..STEP_COUNT`.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Visible-world fraction this step represents.
    pub fn fraction(self) -> f64 {
        self.0 as f64 * STEP_WIDTH
    }

    /// All steps from finest to coarsest.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..STEP_COUNT).map(Self)
    }

    /// Select the step for a view of `view_width` world units.
    ///
    /// The visible fraction is rounded to the nearest 0.2 so continuous
    /// zooming maps onto a handful of cached levels.
    pub fn for_view(view_width: f64, world_width: f64) -> Self {
        if world_width <= 0.0 || world_width.is_nan() || !view_width.is_finite() {
            return Self::COARSEST;
        }
        let view_percent = (view_width / world_width).clamp(0.0, 1.0);
        let index = (view_percent / STEP_WIDTH).round() as u8;
        Self(index.min(Self::COARSEST.0))
    }

    /// Bucket size used to build this step for a series of `len` samples.
    pub fn bucket_size(self, len: usize, world_width: f64) -> usize {
        if world_width <= 0.0 || world_width.is_nan() {
            return 1;
        }
        let size = (len as f64 / world_width * self.fraction()).floor();
        if size.is_finite() && size >= 1.0 {
            size as usize
        } else {
            1
        }
    }
}

/// Key of a cached level within one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelKey {
    /// Zoom step.
    pub step: LodStep,
    /// Bucket reduction.
    pub aggregation: Aggregation,
}

impl LevelKey {
    /// Create a level key.
    pub fn new(step: LodStep, aggregation: Aggregation) -> Self {
        Self { step, aggregation }
    }
}

/// One aggregated version of a series. Read-only once built.
#[derive(Debug)]
pub struct LodLevel {
    key: LevelKey,
    bucket_size: usize,
    generation: u64,
    values: Arc<[f64]>,
}

impl LodLevel {
    /// Key this level was built for.
    pub fn key(&self) -> LevelKey {
        self.key
    }

    /// Zoom step of this level.
    pub fn step(&self) -> LodStep {
        self.key.step
    }

    /// Raw samples per aggregated value.
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Series generation the level was built from.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Aggregated values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Shared handle to the aggregated values.
    pub fn shared_values(&self) -> Arc<[f64]> {
        Arc::clone(&self.values)
    }

    /// Number of aggregated values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the level holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Memoized levels for every series, keyed by `(series, level key)`.
#[derive(Debug, Clone)]
pub struct LodCache {
    world_width: f64,
    levels: HashMap<(SeriesId, LevelKey), Arc<LodLevel>>,
}

impl LodCache {
    /// Create an empty cache for a world of the given width.
    pub fn new(world_width: f64) -> Self {
        Self {
            world_width,
            levels: HashMap::new(),
        }
    }

    /// World width the bucket sizes are derived from.
    pub fn world_width(&self) -> f64 {
        self.world_width
    }

    /// Fetch a level, building it on a miss or when the series changed.
    pub fn level(
        &mut self,
        store: &SeriesStore,
        id: SeriesId,
        key: LevelKey,
    ) -> Result<Arc<LodLevel>> {
        let series = store.require(id)?;
        let generation = store.generation(id).ok_or(PipelineError::UnknownSeries(id))?;
        if let Some(level) = self.levels.get(&(id, key)) {
            if level.generation == generation {
                return Ok(Arc::clone(level));
            }
        }

        let bucket_size = key.step.bucket_size(series.len(), self.world_width);
        let values = if bucket_size == 1 {
            series.shared_values()
        } else {
            Arc::from(aggregate_buckets(series.values(), bucket_size, key.aggregation))
        };
        debug!(
            "built LOD level for series {id}: step {} ({:?}), bucket {bucket_size}, {} -> {} values",
            key.step.index(),
            key.aggregation,
            series.len(),
            values.len()
        );
        let level = Arc::new(LodLevel {
            key,
            bucket_size,
            generation,
            values,
        });
        self.levels.insert((id, key), Arc::clone(&level));
        Ok(level)
    }

    /// Select and fetch the level matching a view of `view_width` world units.
    pub fn select(
        &mut self,
        store: &SeriesStore,
        id: SeriesId,
        view_width: f64,
        aggregation: Aggregation,
    ) -> Result<Arc<LodLevel>> {
        let step = LodStep::for_view(view_width, self.world_width);
        self.level(store, id, LevelKey::new(step, aggregation))
    }

    /// Build every step of a series up front.
    pub fn warm(
        &mut self,
        store: &SeriesStore,
        id: SeriesId,
        aggregation: Aggregation,
    ) -> Result<()> {
        for step in LodStep::all() {
            self.level(store, id, LevelKey::new(step, aggregation))?;
        }
        Ok(())
    }

    /// Drop every level of a series. Returns the number removed.
    pub fn invalidate(&mut self, id: SeriesId) -> usize {
        let before = self.levels.len();
        self.levels.retain(|(series, _), _| *series != id);
        let removed = before - self.levels.len();
        if removed > 0 {
            debug!("invalidated {removed} LOD levels for series {id}");
        }
        removed
    }

    /// Number of cached levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if no level is cached.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::Series;

    fn store_with(values: Vec<f64>) -> (SeriesStore, SeriesId) {
        let mut store = SeriesStore::new();
        let id = store.insert(Series::from_values("s", values));
        (store, id)
    }

    #[test]
    fn step_selection_rounds_to_nearest_fifth() {
        assert_eq!(LodStep::for_view(100.0, 100.0), LodStep::COARSEST);
        assert_eq!(LodStep::for_view(0.0, 100.0), LodStep::FINEST);
        assert_eq!(LodStep::for_view(45.0, 100.0).index(), 2);
        assert_eq!(LodStep::for_view(9.0, 100.0).index(), 0);
        assert_eq!(LodStep::for_view(250.0, 100.0), LodStep::COARSEST);
        assert_eq!(LodStep::for_view(50.0, f64::NAN), LodStep::COARSEST);
    }

    #[test]
    fn step_selection_is_monotonic_while_zooming_in() {
        let world = 2000.0;
        let mut previous = LodStep::for_view(world, world);
        let mut view = world;
        while view > 0.5 {
            view *= 0.97;
            let step = LodStep::for_view(view, world);
            assert!(step <= previous, "view {view}: {step:?} > {previous:?}");
            previous = step;
        }
    }

    #[test]
    fn bucket_size_scales_with_step() {
        assert_eq!(LodStep::FINEST.bucket_size(10_000, 100.0), 1);
        assert_eq!(LodStep::COARSEST.bucket_size(10_000, 100.0), 100);
        assert_eq!(LodStep::new(1).unwrap().bucket_size(10_000, 100.0), 20);
        assert_eq!(LodStep::COARSEST.bucket_size(50, 100.0), 1);
        assert_eq!(LodStep::COARSEST.bucket_size(50, f64::NAN), 1);
    }

    #[test]
    fn level_is_built_once_and_reused() {
        let (store, id) = store_with((0..1000).map(|i| i as f64).collect());
        let mut cache = LodCache::new(100.0);
        let key = LevelKey::new(LodStep::COARSEST, Aggregation::Max);
        let first = cache.level(&store, id, key).unwrap();
        let second = cache.level(&store, id, key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.bucket_size(), 10);
        assert_eq!(first.len(), 100);
        assert_eq!(first.values()[0], 9.0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn finest_level_shares_raw_values() {
        let (store, id) = store_with(vec![1.0, 2.0, 3.0]);
        let mut cache = LodCache::new(3.0);
        let level = cache
            .level(&store, id, LevelKey::new(LodStep::FINEST, Aggregation::Max))
            .unwrap();
        let raw = store.get(id).unwrap().shared_values();
        assert!(Arc::ptr_eq(&level.shared_values(), &raw));
    }

    #[test]
    fn replacing_series_rebuilds_level() {
        let (mut store, id) = store_with(vec![1.0; 100]);
        let mut cache = LodCache::new(10.0);
        let key = LevelKey::new(LodStep::COARSEST, Aggregation::Max);
        let before = cache.level(&store, id, key).unwrap();
        store.replace_values(id, Arc::from(vec![5.0; 100])).unwrap();
        let after = cache.level(&store, id, key).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.values()[0], 5.0);
        assert_eq!(after.generation(), 1);
    }

    #[test]
    fn levels_stay_inside_series_bounds() {
        let values: Vec<f64> = (0..5000).map(|i| ((i as f64) * 0.37).sin() * 40.0).collect();
        let (store, id) = store_with(values);
        let bounds = store.get(id).unwrap().value_range().unwrap();
        let mut cache = LodCache::new(300.0);
        cache.warm(&store, id, Aggregation::Max).unwrap();
        for step in LodStep::all() {
            let level = cache
                .level(&store, id, LevelKey::new(step, Aggregation::Max))
                .unwrap();
            assert!(level.values().iter().all(|value| bounds.contains(*value)));
        }
        assert_eq!(cache.len(), STEP_COUNT as usize);
    }

    #[test]
    fn unknown_series_is_an_error() {
        let store = SeriesStore::new();
        let orphan = Series::from_values("orphan", [1.0]);
        let mut cache = LodCache::new(10.0);
        let result = cache.select(&store, orphan.id(), 5.0, Aggregation::Max);
        assert!(matches!(result, Err(PipelineError::UnknownSeries(_))));
    }

    #[test]
    fn invalidate_drops_only_that_series() {
        let mut store = SeriesStore::new();
        let id = store.insert(Series::from_values("a", vec![1.0; 64]));
        let other = store.insert(Series::from_values("b", vec![2.0; 64]));
        let mut cache = LodCache::new(8.0);
        cache.warm(&store, id, Aggregation::Mean).unwrap();
        cache.warm(&store, other, Aggregation::Mean).unwrap();
        assert_eq!(cache.invalidate(id), STEP_COUNT as usize);
        assert_eq!(cache.len(), STEP_COUNT as usize);
        assert_eq!(cache.invalidate(id), 0);
    }
}
