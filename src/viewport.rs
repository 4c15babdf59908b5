//! Viewport model: world bounds, view window and gesture state.
//!
//! The model is the only owner of the view window. Every mutation clamps the
//! window into the world and reports a [`ViewEvent`] only when the window
//! actually differs from the last one reported.

use log::trace;

use crate::error::{PipelineError, Result};
use crate::interaction::{clamp_window, pan_window, slide_into, zoom_window};
use crate::transform::Transform;
use crate::view::Range;

/// Gesture lifecycle: `Idle -> Panning/Zooming -> Settling -> Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GestureState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// The window is being dragged.
    Panning,
    /// The window is being rescaled.
    Zooming,
    /// The gesture ended and the fine pass is pending.
    Settling,
}

/// View change notification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    /// The window was shifted or replaced.
    Moved(Range),
    /// The window was rescaled.
    Zoomed(Range),
    /// The gesture finished on this window.
    MoveEnd(Range),
}

impl ViewEvent {
    /// Window carried by the event.
    pub fn window(&self) -> Range {
        match *self {
            Self::Moved(window) | Self::Zoomed(window) | Self::MoveEnd(window) => window,
        }
    }
}

/// World bounds, current view window and screen geometry.
#[derive(Debug, Clone)]
pub struct ViewportModel {
    world: Range,
    window: Range,
    last_emitted: Range,
    screen_width: f64,
    screen_height: f64,
    max_scale: f64,
    state: GestureState,
}

impl ViewportModel {
    /// Create a model showing the whole world.
    ///
    /// `max_scale` is the largest zoom allowed, in screen pixels per world unit.
    pub fn new(world: Range, screen_width: f64, screen_height: f64, max_scale: f64) -> Result<Self> {
        if !world.is_valid() {
            return Err(PipelineError::InvalidWorld {
                min: world.min,
                max: world.max,
            });
        }
        validate_screen(screen_width, screen_height)?;
        Ok(Self {
            world,
            window: world,
            last_emitted: world,
            screen_width,
            screen_height,
            max_scale,
            state: GestureState::Idle,
        })
    }

    /// World bounds.
    pub fn world(&self) -> Range {
        self.world
    }

    /// Current view window.
    pub fn window(&self) -> Range {
        self.window
    }

    /// Screen width in pixels.
    pub fn screen_width(&self) -> f64 {
        self.screen_width
    }

    /// Screen height in pixels.
    pub fn screen_height(&self) -> f64 {
        self.screen_height
    }

    /// Current gesture state.
    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Smallest scale, showing the whole world.
    pub fn min_scale(&self) -> f64 {
        self.screen_width / self.world.span()
    }

    /// Largest scale in pixels per world unit.
    pub fn max_scale(&self) -> f64 {
        self.max_scale.max(self.min_scale())
    }

    /// Current scale in pixels per world unit.
    pub fn scale(&self) -> f64 {
        self.screen_width / self.window.span()
    }

    /// Narrowest window the zoom limit allows.
    pub fn min_span(&self) -> f64 {
        self.screen_width / self.max_scale()
    }

    /// Transform for the current window.
    pub fn transform(&self) -> Transform {
        Transform::for_valid(self.window, self.screen_width)
    }

    /// Map a screen pixel into world units.
    pub fn to_world(&self, screen_x: f64) -> f64 {
        self.transform().to_world(screen_x)
    }

    /// Map a world position into screen pixels.
    pub fn to_screen(&self, world_x: f64) -> f64 {
        self.transform().to_screen(world_x)
    }

    /// World units per screen pixel, for constant stroke widths.
    pub fn world_per_pixel(&self) -> f64 {
        self.window.span() / self.screen_width
    }

    /// Shift the window by `delta` world units.
    pub fn pan(&mut self, delta: f64) -> Option<ViewEvent> {
        self.state = GestureState::Panning;
        let next = pan_window(self.window, delta, self.world);
        self.apply(next, ViewEvent::Moved)
    }

    /// Shift the window by a screen-space delta.
    pub fn pan_pixels(&mut self, delta_pixels: f64) -> Option<ViewEvent> {
        self.pan(delta_pixels * self.world_per_pixel())
    }

    /// Rescale around a world anchor. A factor above 1 zooms in.
    pub fn zoom(&mut self, factor: f64, anchor: f64) -> Option<ViewEvent> {
        self.state = GestureState::Zooming;
        let next = zoom_window(self.window, anchor, factor, self.min_span(), self.world);
        self.apply(next, ViewEvent::Zoomed)
    }

    /// Rescale around a screen pixel.
    pub fn zoom_at_pixel(&mut self, factor: f64, screen_x: f64) -> Option<ViewEvent> {
        let anchor = self.to_world(screen_x);
        self.zoom(factor, anchor)
    }

    /// Replace the window, clamped into the world.
    pub fn set_window(&mut self, window: Range) -> Option<ViewEvent> {
        if !window.is_finite() {
            return None;
        }
        let next = clamp_window(window, self.world, self.min_span());
        self.apply(next, ViewEvent::Moved)
    }

    /// Recenter the window on a world position, keeping its span.
    pub fn center_on(&mut self, world_x: f64) -> Option<ViewEvent> {
        if !world_x.is_finite() {
            return None;
        }
        let half = self.window.span() * 0.5;
        let next = slide_into(Range::new(world_x - half, world_x + half), self.world);
        self.apply(next, ViewEvent::Moved)
    }

    /// Finish the current gesture.
    pub fn move_end(&mut self) -> ViewEvent {
        self.state = GestureState::Settling;
        self.last_emitted = self.window;
        ViewEvent::MoveEnd(self.window)
    }

    /// Return to idle once the fine pass is scheduled.
    pub fn settle(&mut self) {
        self.state = GestureState::Idle;
    }

    /// Update screen geometry and re-clamp the window.
    pub fn resize(&mut self, screen_width: f64, screen_height: f64) -> Result<Option<ViewEvent>> {
        validate_screen(screen_width, screen_height)?;
        self.screen_width = screen_width;
        self.screen_height = screen_height;
        let next = clamp_window(self.window, self.world, self.min_span());
        Ok(self.apply(next, ViewEvent::Moved))
    }

    fn apply(&mut self, next: Range, event: fn(Range) -> ViewEvent) -> Option<ViewEvent> {
        self.window = next;
        let epsilon = self.world.span() * 1e-12;
        if next.approx_eq(self.last_emitted, epsilon) {
            return None;
        }
        self.last_emitted = next;
        let event = event(next);
        trace!("view event {event:?}");
        Some(event)
    }
}

fn validate_screen(width: f64, height: f64) -> Result<()> {
    if width > 0.0 && width.is_finite() && height > 0.0 && height.is_finite() {
        Ok(())
    } else {
        Err(PipelineError::InvalidScreen { width, height })
    }
}
