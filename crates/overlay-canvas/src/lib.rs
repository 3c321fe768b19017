//! Drawing surface and host-map boundary for the geo-overlay layers.
//!
//! - [`Viewport`] is the consumed host-map interface (bounds, zoom,
//!   coordinate conversion); [`FlatViewport`] is a linear reference
//!   implementation for tests and demos.
//! - [`RasterCanvas`] wraps a tiny-skia pixmap with the path, text and
//!   compositing operations the layers draw through.

pub mod canvas;
pub mod events;
pub mod viewport;

pub use canvas::{Composite, FillStyle, RasterCanvas, StrokeStyle};
pub use events::{PointerEvent, ViewEvent};
pub use viewport::{FlatViewport, Viewport};
