//! Planar node coordinates.
//!
//! Radio range models work in local metres, so positions are a flat `f64`
//! (x, y) pair on a Euclidean plane rather than geographic coordinates.
//! Deployment areas of interest (hundreds of metres to a few kilometres) are
//! far below the scale where Earth curvature matters.

/// A planar coordinate in metres.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in metres.
    #[inline]
    pub fn distance_m(self, other: Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Axis-aligned box check — cheaper than `distance_m` for quick rejection.
    #[inline]
    pub fn within_box(self, center: Position, half_m: f64) -> bool {
        (self.x - center.x).abs() <= half_m && (self.y - center.y).abs() <= half_m
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}
