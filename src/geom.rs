//! Geometric primitives produced by the resampling pipeline.

/// A point in screen space (pixel coordinates).
///
/// X grows to the right from the left edge of the view, Y grows downward from
/// the top of the channel band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    /// X value in screen pixels.
    pub x: f32,
    /// Y value in screen pixels.
    pub y: f32,
}

impl ScreenPoint {
    /// Create a new screen point.
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Squared distance to another point, computed in f64.
    pub(crate) fn distance_sq(&self, other: ScreenPoint) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        dx * dx + dy * dy
    }

    /// Bit pattern of both coordinates, for exact comparisons.
    pub fn to_bits(&self) -> (u32, u32) {
        (self.x.to_bits(), self.y.to_bits())
    }
}

/// Vertical band of the screen assigned to one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelBand {
    /// Top edge of the band in screen pixels.
    pub y_offset: f64,
    /// Band height in screen pixels.
    pub height: f64,
}

impl ChannelBand {
    /// Create a band from its top edge and height.
    pub fn new(y_offset: f64, height: f64) -> Self {
        Self { y_offset, height }
    }

    /// Split a screen of the given height into `count` equal bands.
    pub fn split(screen_height: f64, count: usize) -> Vec<Self> {
        if count == 0 || screen_height <= 0.0 || screen_height.is_nan() {
            return Vec::new();
        }
        let height = screen_height / count as f64;
        (0..count)
            .map(|index| Self::new(index as f64 * height, height))
            .collect()
    }
}
