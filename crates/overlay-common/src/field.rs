//! Regular lat/lon scalar fields.

use serde::{Deserialize, Serialize};

use crate::bounds::GeoBounds;
use crate::error::{OverlayError, OverlayResult};
use crate::geo::LatLng;
use crate::style::Color;

/// A regular lattice of scalar values with a known geographic origin.
///
/// Values are stored row-major starting at the north-west corner of
/// `bounds`; `lon_step`/`lat_step` are the per-cell strides in degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarField {
    pub values: Vec<f64>,
    /// Optional fill colors keyed by `thresholds`.
    #[serde(default)]
    pub colors: Option<Vec<Color>>,
    /// Optional contour/classification thresholds, ascending.
    #[serde(default)]
    pub thresholds: Option<Vec<f64>>,
    /// Number of columns (longitude direction).
    pub cols: usize,
    /// Number of rows (latitude direction).
    pub rows: usize,
    /// Grid stride in degrees of longitude.
    pub lon_step: f64,
    /// Grid stride in degrees of latitude.
    pub lat_step: f64,
    pub bounds: GeoBounds,
}

impl ScalarField {
    /// Build a field, validating the size invariant up front.
    pub fn new(
        values: Vec<f64>,
        cols: usize,
        rows: usize,
        lon_step: f64,
        lat_step: f64,
        bounds: GeoBounds,
    ) -> OverlayResult<Self> {
        let field = Self {
            values,
            colors: None,
            thresholds: None,
            cols,
            rows,
            lon_step,
            lat_step,
            bounds,
        };
        field.validate()?;
        Ok(field)
    }

    pub fn with_scale(mut self, thresholds: Vec<f64>, colors: Vec<Color>) -> Self {
        self.thresholds = Some(thresholds);
        self.colors = Some(colors);
        self
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> OverlayResult<()> {
        if self.values.len() != self.cols * self.rows {
            return Err(OverlayError::InvalidField(format!(
                "value count {} does not match {}x{} grid",
                self.values.len(),
                self.cols,
                self.rows
            )));
        }
        if self.lon_step <= 0.0 || self.lat_step <= 0.0 {
            return Err(OverlayError::InvalidField(format!(
                "grid steps must be positive, got lon {} lat {}",
                self.lon_step, self.lat_step
            )));
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at the grid cell nearest to a geographic position.
    ///
    /// Resolves against the full-resolution field regardless of any
    /// rendering decimation. Out-of-range positions yield `None`.
    pub fn value_at(&self, p: LatLng) -> Option<f64> {
        let i = ((self.bounds.north - p.lat) / self.lat_step).round();
        let j = ((p.lng - self.bounds.west) / self.lon_step).round();
        let index = i * self.cols as f64 + j;
        if !index.is_finite() || index < 0.0 || index >= self.values.len() as f64 {
            return None;
        }
        self.values.get(index as usize).copied()
    }

    /// Minimum and maximum finite values. `None` when no finite value exists.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for &v in &self.values {
            if !v.is_finite() {
                continue;
            }
            range = Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
        range
    }
}
