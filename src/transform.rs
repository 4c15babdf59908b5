//! Coordinate transforms between world space and screen space.

use crate::view::Range;

const MIN_SPAN: f64 = 1e-12;

/// Affine transform from world X into screen X for one view window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    window: Range,
    screen_width: f64,
}

impl Transform {
    /// Create a transform for the given view window and screen width.
    ///
    /// Returns `None` when the width is not positive or the window is not finite.
    pub fn new(window: Range, screen_width: f64) -> Option<Self> {
        if !window.is_finite() || screen_width <= 0.0 || !screen_width.is_finite() {
            return None;
        }
        Some(Self {
            window: window.with_min_span(MIN_SPAN),
            screen_width,
        })
    }

    /// Build a transform from a window and width already known to be valid.
    pub(crate) fn for_valid(window: Range, screen_width: f64) -> Self {
        debug_assert!(window.is_finite() && screen_width > 0.0);
        Self {
            window: window.with_min_span(MIN_SPAN),
            screen_width,
        }
    }

    /// Access the view window.
    pub fn window(&self) -> Range {
        self.window
    }

    /// Access the screen width in pixels.
    pub fn screen_width(&self) -> f64 {
        self.screen_width
    }

    /// Map a world X value into screen pixels.
    pub fn to_screen(&self, world_x: f64) -> f64 {
        (world_x - self.window.min) / self.window.span() * self.screen_width
    }

    /// Map a screen X pixel into world units.
    pub fn to_world(&self, screen_x: f64) -> f64 {
        self.window.min + screen_x / self.screen_width * self.window.span()
    }

    /// World units covered by a single screen pixel.
    pub fn world_per_pixel(&self) -> f64 {
        self.window.span() / self.screen_width
    }
}
