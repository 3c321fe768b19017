//! Error types for the geo-overlay crates.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for overlay construction and configuration.
///
/// Draw paths never surface these: malformed state degrades to "nothing
/// drawn" so a host event loop is never halted by a layer.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Field dimensions or steps are inconsistent.
    #[error("invalid scalar field: {0}")]
    InvalidField(String),

    /// A dataset was empty where content is required.
    #[error("empty dataset: {0}")]
    EmptyDataset(String),

    /// A drawing surface could not be allocated.
    #[error("surface allocation failed: {width}x{height}")]
    SurfaceAllocation { width: u32, height: u32 },

    /// Configuration value out of range.
    #[error("invalid option '{option}': {message}")]
    InvalidOption { option: String, message: String },
}
