//! Geographic bounds with directional edges.

use serde::{Deserialize, Serialize};

use crate::geo::LatLng;

/// A geographic extent in degrees.
///
/// `north`/`south` are latitudes, `east`/`west` longitudes. `north >= south`
/// and `east >= west` are assumed but not enforced; degenerate bounds behave
/// as empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoBounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Smallest bounds covering all points. `None` for an empty input.
    pub fn covering(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut bounds: Option<GeoBounds> = None;
        for p in points {
            bounds = Some(match bounds {
                None => GeoBounds::new(p.lat, p.lat, p.lng, p.lng),
                Some(b) => GeoBounds::new(
                    b.north.max(p.lat),
                    b.south.min(p.lat),
                    b.east.max(p.lng),
                    b.west.min(p.lng),
                ),
            });
        }
        bounds
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Expand by `dx` degrees of longitude and `dy` degrees of latitude on
    /// every side.
    pub fn expanded(&self, dx: f64, dy: f64) -> Self {
        Self {
            north: self.north + dy,
            south: self.south - dy,
            east: self.east + dx,
            west: self.west - dx,
        }
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    pub fn intersects(&self, other: &GeoBounds) -> bool {
        self.west < other.east
            && self.east > other.west
            && self.south < other.north
            && self.north > other.south
    }

    pub fn intersection(&self, other: &GeoBounds) -> Option<GeoBounds> {
        if !self.intersects(other) {
            return None;
        }
        Some(GeoBounds {
            north: self.north.min(other.north),
            south: self.south.max(other.south),
            east: self.east.min(other.east),
            west: self.west.max(other.west),
        })
    }

    /// North-west corner, the index origin for row-major fields.
    pub fn north_west(&self) -> LatLng {
        LatLng::new(self.north, self.west)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_height() {
        let b = GeoBounds::new(50.0, 24.0, -66.0, -125.0);
        assert_eq!(b.width(), 59.0);
        assert_eq!(b.height(), 26.0);
    }

    #[test]
    fn test_covering() {
        let b = GeoBounds::covering(vec![
            LatLng::new(10.0, 0.0),
            LatLng::new(-5.0, 20.0),
            LatLng::new(3.0, -7.0),
        ])
        .unwrap();
        assert_eq!(b.north, 10.0);
        assert_eq!(b.south, -5.0);
        assert_eq!(b.east, 20.0);
        assert_eq!(b.west, -7.0);

        assert!(GeoBounds::covering(Vec::new()).is_none());
    }

    #[test]
    fn test_expanded_contains() {
        let b = GeoBounds::new(10.0, 0.0, 10.0, 0.0);
        assert!(!b.contains(LatLng::new(-0.5, 5.0)));
        assert!(b.expanded(0.0, 1.0).contains(LatLng::new(-0.5, 5.0)));
    }

    #[test]
    fn test_intersection() {
        let a = GeoBounds::new(10.0, 0.0, 10.0, 0.0);
        let b = GeoBounds::new(15.0, 5.0, 15.0, 5.0);
        let c = GeoBounds::new(30.0, 20.0, 30.0, 20.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));

        let i = a.intersection(&b).unwrap();
        assert_eq!(i, GeoBounds::new(10.0, 5.0, 10.0, 5.0));
    }
}
