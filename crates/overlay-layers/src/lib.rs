//! Map overlay layers for geophysical data.
//!
//! Four layer renderers built on four shared pieces:
//! - spatial decimation of dense point sets ([`decimate`])
//! - a rebuildable bucket index for pointer hit-testing ([`spatial_index`])
//! - a redraw scheduler with event coalescing ([`scheduler`])
//! - a polygon-clip compositor with cached and exact strategies ([`clip`])

pub mod clip;
pub mod contour;
pub mod decimate;
pub mod glyph;
pub mod layer;
pub mod layers;
pub mod scheduler;
pub mod spatial_index;

pub use clip::{CachedMaskClip, ClipMode, ClipStrategy, LivePathClip};
pub use contour::{extract_isolines, generate_levels, Isoline};
pub use decimate::{decimate_grid, decimate_pairwise, DecimationMethod};
pub use glyph::{wind_level, BarbGlyphs};
pub use layer::{
    LayerCore, MoveTrigger, PointerHit, SubscriptionId, Subscribers, Thinout, ValueHit,
    VisualTransform,
};
pub use layers::{GridLayer, IsoLayer, PointLayer, WindLayer};
pub use scheduler::{DrawState, RedrawDecision, RedrawScheduler};
pub use spatial_index::{HitOptions, SpatialIndex};
