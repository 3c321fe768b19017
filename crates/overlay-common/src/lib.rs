//! Common types shared across the geo-overlay crates.

pub mod boundary;
pub mod bounds;
pub mod error;
pub mod field;
pub mod geo;
pub mod style;

pub use boundary::{Boundary, BoundaryPolygon};
pub use bounds::GeoBounds;
pub use error::{OverlayError, OverlayResult};
pub use field::ScalarField;
pub use geo::{GeoPoint, LatLng, Located, MarkerShape, ResolvedWind, ScreenPoint, WindSample, WindVector};
pub use style::{Color, ColorSpec};
