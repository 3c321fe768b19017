//! Geographic and screen-space point types.

use serde::{Deserialize, Serialize};

use crate::style::Color;

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A point in container (screen) pixel space.
///
/// The origin is the top-left corner of the viewport; y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Anything with a geographic position.
///
/// Decimation and spatial indexing are generic over this trait so point
/// markers and wind samples share the same pipeline.
pub trait Located {
    fn latlng(&self) -> LatLng;

    /// Per-item marker size override in pixels, if any.
    fn size_override(&self) -> Option<[f64; 2]> {
        None
    }
}

impl Located for LatLng {
    fn latlng(&self) -> LatLng {
        *self
    }
}

/// Marker shape for the point layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Circle,
    Rect,
}

/// A scattered data point with optional per-point rendering overrides.
///
/// Immutable once produced by decimation; owned by the layer that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    /// Numeric value driving value-keyed colors and labels.
    #[serde(default)]
    pub value: Option<f64>,
    /// Free-form label; takes precedence over the formatted value.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<Color>,
    /// Width/height in pixels, overriding the layer default.
    #[serde(default)]
    pub size: Option<[f64; 2]>,
    #[serde(default)]
    pub shape: Option<MarkerShape>,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            value: None,
            label: None,
            color: None,
            size: None,
            shape: None,
        }
    }

    pub fn with_value(lat: f64, lng: f64, value: f64) -> Self {
        Self {
            value: Some(value),
            ..Self::new(lat, lng)
        }
    }
}

impl Located for GeoPoint {
    fn latlng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    fn size_override(&self) -> Option<[f64; 2]> {
        self.size
    }
}

/// Wind observation, either as U/V components or speed/direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindVector {
    /// Eastward (u) and northward (v) components in m/s.
    Uv { u: f64, v: f64 },
    /// Speed in m/s and meteorological direction in degrees (0 = from north).
    SpeedDir { speed: f64, dir_deg: f64 },
}

/// Fully resolved wind vector with both representations available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedWind {
    pub u: f64,
    pub v: f64,
    pub speed: f64,
    /// Direction in radians, meteorological convention.
    pub dir_rad: f64,
}

impl WindVector {
    /// Resolve to the complete `(u, v, speed, direction)` tuple.
    pub fn resolve(&self) -> ResolvedWind {
        match *self {
            WindVector::Uv { u, v } => {
                let speed = (u * u + v * v).sqrt();
                let dir_rad = if speed > 0.0 { u.atan2(v) } else { 0.0 };
                ResolvedWind {
                    u,
                    v,
                    speed,
                    dir_rad,
                }
            }
            WindVector::SpeedDir { speed, dir_deg } => {
                let dir_rad = dir_deg.to_radians();
                ResolvedWind {
                    u: dir_rad.sin() * speed,
                    v: dir_rad.cos() * speed,
                    speed,
                    dir_rad,
                }
            }
        }
    }
}

/// A directional glyph sample for the wind layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub lat: f64,
    pub lng: f64,
    pub vector: WindVector,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub size: Option<[f64; 2]>,
}

impl WindSample {
    pub fn from_uv(lat: f64, lng: f64, u: f64, v: f64) -> Self {
        Self {
            lat,
            lng,
            vector: WindVector::Uv { u, v },
            color: None,
            size: None,
        }
    }

    pub fn from_speed_dir(lat: f64, lng: f64, speed: f64, dir_deg: f64) -> Self {
        Self {
            lat,
            lng,
            vector: WindVector::SpeedDir { speed, dir_deg },
            color: None,
            size: None,
        }
    }
}

impl Located for WindSample {
    fn latlng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    fn size_override(&self) -> Option<[f64; 2]> {
        self.size
    }
}
