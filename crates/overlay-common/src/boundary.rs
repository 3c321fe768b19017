//! Geographic clip boundaries.

use serde::{Deserialize, Serialize};

use crate::bounds::GeoBounds;
use crate::geo::LatLng;

/// A polygon with an outer ring and optional holes, vertices in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryPolygon {
    pub outer: Vec<LatLng>,
    #[serde(default)]
    pub holes: Vec<Vec<LatLng>>,
}

impl BoundaryPolygon {
    pub fn new(outer: Vec<LatLng>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// All rings, outer first.
    pub fn rings(&self) -> impl Iterator<Item = &[LatLng]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(|h| h.as_slice()))
    }

    /// Even-odd point-in-polygon test across outer ring and holes.
    pub fn contains(&self, p: LatLng) -> bool {
        let mut inside = false;
        for ring in self.rings() {
            if ring_crossings_odd(ring, p) {
                inside = !inside;
            }
        }
        inside
    }
}

/// A clip boundary made of one or more polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    pub polygons: Vec<BoundaryPolygon>,
}

impl Boundary {
    pub fn new(polygons: Vec<BoundaryPolygon>) -> Self {
        Self { polygons }
    }

    /// Single-polygon boundary without holes.
    pub fn from_ring(outer: Vec<LatLng>) -> Self {
        Self::new(vec![BoundaryPolygon::new(outer)])
    }

    /// Bounding box over every ring vertex. `None` for an empty boundary.
    pub fn bbox(&self) -> Option<GeoBounds> {
        GeoBounds::covering(
            self.polygons
                .iter()
                .flat_map(|poly| poly.rings().flatten().copied())
                .collect::<Vec<_>>(),
        )
    }

    /// True when the point falls inside any polygon.
    pub fn contains(&self, p: LatLng) -> bool {
        self.polygons.iter().any(|poly| poly.contains(p))
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.iter().all(|p| p.outer.len() < 3)
    }
}

/// Ray-cast along +lng; odd crossing count means the ring encloses `p`.
fn ring_crossings_odd(ring: &[LatLng], p: LatLng) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut odd = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[j];
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let cross = (b.lng - a.lng) * (p.lat - a.lat) / (b.lat - a.lat) + a.lng;
            if p.lng < cross {
                odd = !odd;
            }
        }
        j = i;
    }
    odd
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(n: f64, s: f64, e: f64, w: f64) -> Vec<LatLng> {
        vec![
            LatLng::new(n, w),
            LatLng::new(n, e),
            LatLng::new(s, e),
            LatLng::new(s, w),
        ]
    }

    #[test]
    fn test_contains_simple_square() {
        let boundary = Boundary::from_ring(square(10.0, 0.0, 10.0, 0.0));
        assert!(boundary.contains(LatLng::new(5.0, 5.0)));
        assert!(!boundary.contains(LatLng::new(15.0, 5.0)));
        assert!(!boundary.contains(LatLng::new(5.0, -1.0)));
    }

    #[test]
    fn test_contains_with_hole() {
        let mut poly = BoundaryPolygon::new(square(10.0, 0.0, 10.0, 0.0));
        poly.holes.push(square(7.0, 3.0, 7.0, 3.0));
        let boundary = Boundary::new(vec![poly]);

        assert!(boundary.contains(LatLng::new(1.0, 1.0)));
        // Inside the hole is outside the boundary.
        assert!(!boundary.contains(LatLng::new(5.0, 5.0)));
    }

    #[test]
    fn test_bbox() {
        let boundary = Boundary::from_ring(square(10.0, -2.0, 8.0, 1.0));
        let bbox = boundary.bbox().unwrap();
        assert_eq!(bbox, GeoBounds::new(10.0, -2.0, 8.0, 1.0));

        assert!(Boundary::new(Vec::new()).bbox().is_none());
    }

    #[test]
    fn test_degenerate_ring_never_contains() {
        let boundary = Boundary::from_ring(vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]);
        assert!(boundary.is_empty());
        assert!(!boundary.contains(LatLng::new(0.5, 0.5)));
    }

    #[test]
    fn test_json_roundtrip() {
        let boundary = Boundary::from_ring(square(10.0, 0.0, 10.0, 0.0));
        let json = serde_json::to_string(&boundary).unwrap();
        let back: Boundary = serde_json::from_str(&json).unwrap();
        assert_eq!(boundary, back);
    }
}
