//! Interaction helpers for panning, zooming and clamping view windows.
//!
//! These helpers are pure functions over [`Range`]; the viewport model wraps
//! them with state and event emission.

use crate::view::Range;

/// Slide a window inside the world, keeping its span when it fits.
///
/// A window wider than the world becomes the world.
pub(crate) fn slide_into(window: Range, world: Range) -> Range {
    let window = Range::new(window.min, window.max);
    let span = window.span().min(world.span());
    if window.min < world.min {
        Range::new(world.min, world.min + span)
    } else if window.max > world.max {
        Range::new(world.max - span, world.max)
    } else {
        Range::new(window.min, window.min + span)
    }
}

/// Pan a window by a world-space delta, clamped to the world.
pub(crate) fn pan_window(window: Range, delta: f64, world: Range) -> Range {
    if !delta.is_finite() {
        return window;
    }
    slide_into(window.shifted(delta), world)
}

/// Zoom a window around an anchor.
///
/// A factor above 1 zooms in. The resulting span is clamped to
/// `[min_span, world.span()]` and the anchor keeps its relative position
/// unless the window has to slide back inside the world.
pub(crate) fn zoom_window(
    window: Range,
    anchor: f64,
    factor: f64,
    min_span: f64,
    world: Range,
) -> Range {
    if factor <= 0.0 || !factor.is_finite() || !anchor.is_finite() {
        return window;
    }
    let max_span = world.span();
    let span = (window.span() / factor).clamp(min_span.min(max_span), max_span);
    let ratio = if window.span() > 0.0 {
        ((anchor - window.min) / window.span()).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let min = anchor - ratio * span;
    slide_into(Range::new(min, min + span), world)
}

/// Clamp an arbitrary window into the world.
///
/// The overlap with the world is kept; a window entirely outside the world
/// slides back in with its span. The result is at least `min_span` wide.
/// Inverted bounds are swapped first.
pub(crate) fn clamp_window(window: Range, world: Range, min_span: f64) -> Range {
    let window = Range::new(window.min, window.max);
    let clamped = window
        .intersect(world)
        .unwrap_or_else(|| slide_into(window, world));
    let min_span = min_span.min(world.span());
    if clamped.span() >= min_span {
        return clamped;
    }
    slide_into(clamped.with_min_span(min_span), world)
}

/// Compute a zoom factor from a drag delta and axis length.
///
/// Dragging by a full axis length in the positive direction zooms in by 10x.
pub fn zoom_factor_from_drag(delta_pixels: f64, axis_pixels: f64) -> f64 {
    if axis_pixels <= 0.0 || axis_pixels.is_nan() {
        return 1.0;
    }
    let normalized = delta_pixels / axis_pixels;
    (1.0 / (1.0 - normalized).clamp(0.1, 10.0)).clamp(0.1, 10.0)
}

/// Compute a zoom factor from wheel steps; positive steps zoom in.
pub fn zoom_factor_from_wheel(steps: f64) -> f64 {
    if !steps.is_finite() {
        return 1.0;
    }
    1.1_f64.powf(steps)
}
