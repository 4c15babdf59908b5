//! Pipeline configuration.
//!
//! All settings are passed explicitly when the pipeline is built. The struct
//! deserializes from partial JSON, missing fields taking their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::datasource::Aggregation;
use crate::error::{PipelineError, Result};
use crate::simplify::Simplifier;

/// Where the fine pass is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerMode {
    /// On the runtime task that fired the debounce timer.
    Inline,
    /// On a dedicated worker task using the blocking pool.
    #[default]
    Background,
}

/// Tunables for aggregation, simplification and scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Simplification strength `k`; higher keeps more points.
    pub simplify_strength: f64,
    /// Run the simplifier at all.
    pub simplify_enabled: bool,
    /// Skip the radial-distance pre-pass.
    pub simplify_high_quality: bool,
    /// Simplified output below this count falls back to the input.
    pub min_simplified_points: usize,
    /// Bucket reduction for levels and pixel-density passes.
    pub aggregation: Aggregation,
    /// Fine-pass margin on each side, as a fraction of the view span.
    pub buffer_frac: f64,
    /// Quiet period after the last view change before the fine pass runs.
    pub debounce_ms: u64,
    /// Coarse-pass resolution as a multiple of the screen width.
    pub coarse_resolution_factor: f64,
    /// Fine-pass resolution as a multiple of the screen width. The buffered
    /// margins get extra points at the same density.
    pub fine_resolution_factor: f64,
    /// World width in world units. Defaults to twice the screen width.
    pub world_width: Option<f64>,
    /// Maximum zoom in screen pixels per world unit.
    pub max_zoom_scale: f64,
    /// Where fine passes run.
    pub worker: WorkerMode,
    /// Attach LOD diagnostics to every result.
    pub debug_overlay: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            simplify_strength: 13.0,
            simplify_enabled: true,
            simplify_high_quality: false,
            min_simplified_points: 100,
            aggregation: Aggregation::Max,
            buffer_frac: 0.2,
            debounce_ms: 100,
            coarse_resolution_factor: 2.0,
            fine_resolution_factor: 1.0,
            world_width: None,
            max_zoom_scale: 64.0,
            worker: WorkerMode::Background,
            debug_overlay: false,
        }
    }
}

impl PipelineConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| PipelineError::ConfigParse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.simplify_strength <= 0.0 || !self.simplify_strength.is_finite() {
            return Err(invalid(
                "simplify_strength",
                format!("must be positive and finite, got {}", self.simplify_strength),
            ));
        }
        if self.buffer_frac < 0.0 || self.buffer_frac.is_nan() || self.buffer_frac > 10.0 {
            return Err(invalid(
                "buffer_frac",
                format!("must be within 0..=10, got {}", self.buffer_frac),
            ));
        }
        if self.debounce_ms > 60_000 {
            return Err(invalid(
                "debounce_ms",
                format!("must be at most 60000, got {}", self.debounce_ms),
            ));
        }
        for (field, factor) in [
            ("coarse_resolution_factor", self.coarse_resolution_factor),
            ("fine_resolution_factor", self.fine_resolution_factor),
        ] {
            if factor <= 0.0 || factor.is_nan() || factor > 16.0 {
                return Err(invalid(field, format!("must be within (0, 16], got {factor}")));
            }
        }
        if let Some(width) = self.world_width {
            if width <= 0.0 || !width.is_finite() {
                return Err(invalid(
                    "world_width",
                    format!("must be positive and finite, got {width}"),
                ));
            }
        }
        if self.max_zoom_scale <= 0.0 || !self.max_zoom_scale.is_finite() {
            return Err(invalid(
                "max_zoom_scale",
                format!("must be positive and finite, got {}", self.max_zoom_scale),
            ));
        }
        Ok(())
    }

    /// Debounce interval.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Simplifier described by this configuration.
    pub fn simplifier(&self) -> Simplifier {
        Simplifier {
            strength: self.simplify_strength,
            min_points: self.min_simplified_points,
            high_quality: self.simplify_high_quality,
            enabled: self.simplify_enabled,
        }
    }

    /// World width for a screen of the given width.
    pub fn world_width_for(&self, screen_width: f64) -> f64 {
        self.world_width.unwrap_or(screen_width * 2.0)
    }

    /// Point budget of a pass given the screen width and a resolution factor.
    pub(crate) fn resolution(screen_width: f64, factor: f64) -> usize {
        let points = (screen_width * factor).round();
        if points.is_finite() && points >= 1.0 {
            points as usize
        } else {
            1
        }
    }
}

fn invalid(field: &'static str, reason: String) -> PipelineError {
    PipelineError::InvalidConfig { field, reason }
}
