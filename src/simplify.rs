//! Polyline simplification with view-relative tolerance.
//!
//! A cheap radial-distance pass drops points that sit closer than the
//! tolerance to their predecessor, then Douglas-Peucker removes points whose
//! perpendicular deviation from the kept chord stays under the tolerance.

use crate::geom::ScreenPoint;

/// Tolerance for a channel of `channel_height` pixels showing `view_length`
/// world units: `channel_height * view_length * strength^-5`.
///
/// Higher strength means less simplification.
pub fn relative_tolerance(channel_height: f64, view_length: f64, strength: f64) -> f64 {
    if strength <= 0.0 || strength.is_nan() {
        return 0.0;
    }
    let tolerance = channel_height * view_length * strength.powi(-5);
    if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        0.0
    }
}

/// Simplify a polyline so no removed point deviates more than `tolerance`.
///
/// Output is a subsequence of the input that always keeps both endpoints. A
/// tolerance of zero (or less) returns the input unchanged.
pub fn simplify(points: &[ScreenPoint], tolerance: f64, high_quality: bool) -> Vec<ScreenPoint> {
    if points.len() <= 2 || tolerance <= 0.0 || tolerance.is_nan() {
        return points.to_vec();
    }
    let sq_tolerance = tolerance * tolerance;
    if high_quality {
        douglas_peucker(points, sq_tolerance)
    } else {
        let reduced = radial_distance(points, sq_tolerance);
        douglas_peucker(&reduced, sq_tolerance)
    }
}

fn radial_distance(points: &[ScreenPoint], sq_tolerance: f64) -> Vec<ScreenPoint> {
    let mut prev = points[0];
    let mut out = Vec::with_capacity(points.len());
    out.push(prev);
    for &point in &points[1..] {
        if point.distance_sq(prev) > sq_tolerance {
            out.push(point);
            prev = point;
        }
    }
    let last = points[points.len() - 1];
    if prev != last {
        out.push(last);
    }
    out
}

fn douglas_peucker(points: &[ScreenPoint], sq_tolerance: f64) -> Vec<ScreenPoint> {
    let len = points.len();
    if len <= 2 {
        return points.to_vec();
    }
    let mut keep = vec![false; len];
    keep[0] = true;
    keep[len - 1] = true;

    let mut stack = vec![(0usize, len - 1)];
    while let Some((first, last)) = stack.pop() {
        let mut max_sq = sq_tolerance;
        let mut index = None;
        for (offset, point) in points[first + 1..last].iter().enumerate() {
            let sq = segment_distance_sq(*point, points[first], points[last]);
            if sq > max_sq {
                max_sq = sq;
                index = Some(first + 1 + offset);
            }
        }
        if let Some(index) = index {
            keep[index] = true;
            if index - first > 1 {
                stack.push((first, index));
            }
            if last - index > 1 {
                stack.push((index, last));
            }
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(point, keep)| keep.then_some(*point))
        .collect()
}

fn segment_distance_sq(point: ScreenPoint, start: ScreenPoint, end: ScreenPoint) -> f64 {
    let (px, py) = (point.x as f64, point.y as f64);
    let (mut x, mut y) = (start.x as f64, start.y as f64);
    let mut dx = end.x as f64 - x;
    let mut dy = end.y as f64 - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((px - x) * dx + (py - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = end.x as f64;
            y = end.y as f64;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    dx = px - x;
    dy = py - y;
    dx * dx + dy * dy
}

/// Output of [`Simplifier::apply`].
#[derive(Debug, Clone, PartialEq)]
pub struct Simplified {
    /// Points to draw.
    pub points: Vec<ScreenPoint>,
    /// True when the simplified result was too sparse and the input was kept.
    pub fell_back: bool,
}

/// Simplification policy applied to every resampled polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplifier {
    /// Strength constant `k`; higher keeps more points.
    pub strength: f64,
    /// Below this many simplified points the input is used instead.
    pub min_points: usize,
    /// Skip the radial-distance pre-pass.
    pub high_quality: bool,
    /// Disable simplification entirely.
    pub enabled: bool,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self {
            strength: 13.0,
            min_points: 100,
            high_quality: false,
            enabled: true,
        }
    }
}

impl Simplifier {
    /// Tolerance for the given channel height and view length.
    pub fn tolerance(&self, channel_height: f64, view_length: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        relative_tolerance(channel_height, view_length, self.strength)
    }

    /// Simplify `points`, falling back to them when the result is too sparse.
    pub fn apply(&self, points: Vec<ScreenPoint>, channel_height: f64, view_length: f64) -> Simplified {
        let tolerance = self.tolerance(channel_height, view_length);
        if tolerance <= 0.0 || points.len() <= 2 {
            return Simplified {
                points,
                fell_back: false,
            };
        }
        let simplified = simplify(&points, tolerance, self.high_quality);
        if simplified.len() < self.min_points {
            Simplified {
                points,
                fell_back: true,
            }
        } else {
            Simplified {
                points: simplified,
                fell_back: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag(len: usize, amplitude: f32) -> Vec<ScreenPoint> {
        (0..len)
            .map(|i| {
                let y = if i % 2 == 0 { 0.0 } else { amplitude };
                ScreenPoint::new(i as f32, y + (i as f32 * 0.37).sin() * 3.0)
            })
            .collect()
    }

    #[test]
    fn zero_tolerance_is_identity() {
        let points = zigzag(257, 4.0);
        assert_eq!(simplify(&points, 0.0, false), points);
        assert_eq!(simplify(&points, 0.0, true), points);
        assert_eq!(simplify(&points, f64::NAN, false), points);
    }

    #[test]
    fn output_never_grows() {
        let points = zigzag(500, 2.5);
        for tolerance in [0.01, 0.5, 1.0, 3.0, 10.0, 1000.0] {
            for high_quality in [false, true] {
                let out = simplify(&points, tolerance, high_quality);
                assert!(out.len() <= points.len());
                assert_eq!(out.first(), points.first());
                assert_eq!(out.last(), points.last());
            }
        }
    }

    #[test]
    fn collinear_points_collapse_to_endpoints() {
        let points: Vec<ScreenPoint> = (0..50)
            .map(|i| ScreenPoint::new(i as f32, i as f32 * 2.0))
            .collect();
        let out = simplify(&points, 0.1, true);
        assert_eq!(out, vec![points[0], points[49]]);
    }

    #[test]
    fn spikes_survive_simplification() {
        let mut points: Vec<ScreenPoint> = (0..100).map(|i| ScreenPoint::new(i as f32, 50.0)).collect();
        points[40].y = 0.0;
        let out = simplify(&points, 1.0, false);
        assert!(out.iter().any(|point| point.y == 0.0));
        assert!(out.len() < 10);
    }

    #[test]
    fn tolerance_scales_with_view_length() {
        let near = relative_tolerance(100.0, 50.0, 13.0);
        let far = relative_tolerance(100.0, 500.0, 13.0);
        assert!((far / near - 10.0).abs() < 1e-9);
        assert_eq!(relative_tolerance(100.0, 50.0, 0.0), 0.0);
        assert_eq!(relative_tolerance(100.0, 50.0, f64::NAN), 0.0);
    }

    #[test]
    fn sparse_result_falls_back_to_input() {
        let points: Vec<ScreenPoint> = (0..40).map(|i| ScreenPoint::new(i as f32, 10.0)).collect();
        let simplifier = Simplifier {
            strength: 1.0,
            ..Simplifier::default()
        };
        let out = simplifier.apply(points.clone(), 100.0, 100.0);
        assert!(out.fell_back);
        assert_eq!(out.points, points);
    }

    #[test]
    fn disabled_simplifier_passes_through() {
        let points = zigzag(300, 8.0);
        let simplifier = Simplifier {
            enabled: false,
            ..Simplifier::default()
        };
        let out = simplifier.apply(points.clone(), 100.0, 1_000_000.0);
        assert_eq!(out.points, points);
        assert!(!out.fell_back);
    }
}
