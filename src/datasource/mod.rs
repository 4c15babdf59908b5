//! Data sources: immutable series, their store and bucket aggregation.
//!
//! Series are addressed purely by index position. Values are kept behind an
//! `Arc<[f64]>` so derived levels and background passes can share them
//! without copying.

mod store;
mod summary;

pub use store::SeriesStore;
pub use summary::{Aggregation, aggregate_buckets, bucket_count};

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::view::Range;

static SERIES_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(u64);

impl SeriesId {
    fn next() -> Self {
        Self(SERIES_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value of the id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable numeric series with cached value bounds.
#[derive(Debug, Clone)]
pub struct Series {
    id: SeriesId,
    name: String,
    values: Arc<[f64]>,
    value_range: Option<Range>,
}

impl Series {
    /// Build a series from an iterator of values.
    pub fn from_values<I, T>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<f64>,
    {
        let values: Arc<[f64]> = values.into_iter().map(Into::into).collect();
        Self::from_shared(name, values)
    }

    /// Build a series from already shared values.
    pub fn from_shared(name: impl Into<String>, values: Arc<[f64]>) -> Self {
        let value_range = value_bounds(&values);
        Self {
            id: SeriesId::next(),
            name: name.into(),
            values,
            value_range,
        }
    }

    /// Access the series identifier.
    pub fn id(&self) -> SeriesId {
        self.id
    }

    /// Access the series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access the raw values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Shared handle to the raw values.
    pub fn shared_values(&self) -> Arc<[f64]> {
        Arc::clone(&self.values)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series has no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Global minimum and maximum of the finite samples.
    ///
    /// `None` for an empty series or one without finite samples.
    pub fn value_range(&self) -> Option<Range> {
        self.value_range
    }

    pub(crate) fn with_values(&self, values: Arc<[f64]>) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            value_range: value_bounds(&values),
            values,
        }
    }
}

fn value_bounds(values: &[f64]) -> Option<Range> {
    let mut bounds: Option<Range> = None;
    for &value in values {
        if !value.is_finite() {
            continue;
        }
        match bounds.as_mut() {
            None => bounds = Some(Range::new(value, value)),
            Some(range) => range.expand_to_include(value),
        }
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_track_min_and_max() {
        let series = Series::from_values("a", [3.0, -2.0, 7.5, 1.0]);
        assert_eq!(series.value_range(), Some(Range::new(-2.0, 7.5)));
        assert_eq!(series.len(), 4);
    }

    #[test]
    fn bounds_skip_non_finite_samples() {
        let series = Series::from_values("a", [f64::NAN, 1.0, f64::INFINITY, 4.0]);
        assert_eq!(series.value_range(), Some(Range::new(1.0, 4.0)));
    }

    #[test]
    fn empty_series_has_no_bounds() {
        let series = Series::from_values("empty", Vec::<f64>::new());
        assert!(series.is_empty());
        assert_eq!(series.value_range(), None);
    }

    #[test]
    fn ids_are_unique() {
        let a = Series::from_values("a", [1.0]);
        let b = Series::from_values("b", [1.0]);
        assert_ne!(a.id(), b.id());
    }
}
