//! The four overlay layer renderers.

pub mod grid;
pub mod iso;
pub mod points;
pub mod wind;

pub use grid::{GridColor, GridLayer, GridOptions};
pub use iso::{IsoLayer, IsoOptions};
pub use points::{PointLayer, PointOptions};
pub use wind::{WindLayer, WindOptions};
