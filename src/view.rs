//! World-space ranges used for world bounds and view windows.

use serde::{Deserialize, Serialize};

/// Closed numeric range in world units.
///
/// Used both for the fixed world bounds and for the current view window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
}

impl Range {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut min: f64, mut max: f64) -> Self {
        if min > max {
            std::mem::swap(&mut min, &mut max);
        }
        Self { min, max }
    }

    /// Span of the range.
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Midpoint of the range.
    pub fn center(&self) -> f64 {
        (self.min + self.max) * 0.5
    }

    /// Check whether both bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    /// Check whether the range has positive span and finite bounds.
    pub fn is_valid(&self) -> bool {
        self.is_finite() && self.span() > 0.0
    }

    /// Check whether a value lies inside the range.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Check whether `other` lies entirely inside this range.
    pub fn contains_range(&self, other: Range) -> bool {
        other.min >= self.min && other.max <= self.max
    }

    /// Expand the range to include a value. Non-finite values are ignored.
    pub fn expand_to_include(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    /// Clamp a value into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// Shift both bounds by `delta`.
    pub fn shifted(&self, delta: f64) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Grow the range by `frac` of its span on each side.
    pub fn expanded(&self, frac: f64) -> Self {
        let margin = self.span() * frac;
        Self::new(self.min - margin, self.max + margin)
    }

    /// Overlap of two ranges, if any.
    pub fn intersect(&self, other: Range) -> Option<Self> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Ensure the range has at least the given span.
    pub fn with_min_span(&self, min_span: f64) -> Self {
        let span = self.span();
        if span >= min_span {
            return *self;
        }
        let center = self.center();
        let half = min_span * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Approximate equality used to suppress redundant view events.
    pub fn approx_eq(&self, other: Range, epsilon: f64) -> bool {
        (self.min - other.min).abs() <= epsilon && (self.max - other.max).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_with_min_span_expands() {
        let range = Range::new(2.0, 2.0);
        let expanded = range.with_min_span(1.0);
        assert!(expanded.span() >= 1.0);
        assert!(((expanded.min + expanded.max) * 0.5 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn new_swaps_reversed_bounds() {
        let range = Range::new(5.0, -1.0);
        assert_eq!(range.min, -1.0);
        assert_eq!(range.max, 5.0);
    }

    #[test]
    fn expanded_adds_margin_on_both_sides() {
        let range = Range::new(10.0, 20.0).expanded(0.2);
        assert_eq!(range, Range::new(8.0, 22.0));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = Range::new(0.0, 1.0);
        assert!(a.intersect(Range::new(2.0, 3.0)).is_none());
        assert_eq!(
            a.intersect(Range::new(0.5, 3.0)),
            Some(Range::new(0.5, 1.0))
        );
    }
}
