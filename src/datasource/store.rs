//! Series storage with generation tracking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::datasource::{Series, SeriesId};
use crate::error::{PipelineError, Result};

#[derive(Debug, Clone)]
struct StoredSeries {
    series: Series,
    generation: u64,
}

/// Owner of all raw series.
///
/// Each series carries a generation that increments whenever its values are
/// replaced, so derived caches can tell stale entries apart.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    entries: HashMap<SeriesId, StoredSeries>,
    order: Vec<SeriesId>,
}

impl SeriesStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series and return its id.
    pub fn insert(&mut self, series: Series) -> SeriesId {
        let id = series.id();
        if self
            .entries
            .insert(id, StoredSeries { series, generation: 0 })
            .is_none()
        {
            self.order.push(id);
        }
        id
    }

    /// Replace the values of an existing series.
    ///
    /// Returns the new generation.
    pub fn replace_values(&mut self, id: SeriesId, values: Arc<[f64]>) -> Result<u64> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(PipelineError::UnknownSeries(id))?;
        entry.series = entry.series.with_values(values);
        entry.generation = entry.generation.wrapping_add(1);
        Ok(entry.generation)
    }

    /// Remove a series from the store.
    pub fn remove(&mut self, id: SeriesId) -> Option<Series> {
        let removed = self.entries.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(removed.series)
    }

    /// Look up a series.
    pub fn get(&self, id: SeriesId) -> Option<&Series> {
        self.entries.get(&id).map(|entry| &entry.series)
    }

    /// Look up a series, failing on unknown ids.
    pub fn require(&self, id: SeriesId) -> Result<&Series> {
        self.get(id).ok_or(PipelineError::UnknownSeries(id))
    }

    /// Access the generation of a series.
    pub fn generation(&self, id: SeriesId) -> Option<u64> {
        self.entries.get(&id).map(|entry| entry.generation)
    }

    /// Series ids in insertion order.
    pub fn ids(&self) -> &[SeriesId] {
        &self.order
    }

    /// Iterate series in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| &entry.series))
    }

    /// Number of series.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the store has no series.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Length of the longest series, which defines the world extent.
    pub fn longest_len(&self) -> usize {
        self.iter().map(Series::len).max().unwrap_or(0)
    }
}
