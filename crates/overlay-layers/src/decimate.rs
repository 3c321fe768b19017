//! Spatial decimation of dense point sets.
//!
//! Two interchangeable algorithms reduce a point set under a minimum
//! spacing derived from the viewport. Inputs of three points or fewer are
//! returned unchanged; neither algorithm ever panics.

use overlay_common::Located;
use serde::{Deserialize, Serialize};

/// Which decimation algorithm a layer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecimationMethod {
    /// Pairwise box test, O(n²) worst case, spatially even output.
    #[default]
    Pairwise,
    /// Bucket grid, O(n), suited to very large inputs; less even at cell
    /// boundaries.
    Grid,
}

impl DecimationMethod {
    pub fn apply<T: Located + Clone>(&self, points: &[T], spacing: [f64; 2]) -> Vec<T> {
        match self {
            DecimationMethod::Pairwise => decimate_pairwise(points, spacing),
            DecimationMethod::Grid => decimate_grid(points, spacing),
        }
    }
}

/// Bucket decimation: lay a virtual grid of `spacing`-sized cells over the
/// input's bounding box and keep the first point encountered per cell.
///
/// Deterministic given input order. Output is ordered by cell index, not by
/// input order. Two points in adjacent cells can still be closer than the
/// spacing. A second pass over an already-sparse output is a no-op.
pub fn decimate_grid<T: Located + Clone>(points: &[T], [lon_step, lat_step]: [f64; 2]) -> Vec<T> {
    if points.len() <= 3 {
        return points.to_vec();
    }
    if !(lon_step > 0.0 && lat_step > 0.0) {
        return points.to_vec();
    }

    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for p in points {
        let ll = p.latlng();
        x_min = x_min.min(ll.lng);
        x_max = x_max.max(ll.lng);
        y_min = y_min.min(ll.lat);
        y_max = y_max.max(ll.lat);
    }
    if !(x_min.is_finite() && x_max.is_finite() && y_min.is_finite() && y_max.is_finite()) {
        return points.to_vec();
    }

    // Coincident inputs collapse to a single cell rather than an empty grid.
    let cols = (((x_max - x_min) / lon_step).ceil() as usize).max(1);
    let rows = (((y_max - y_min) / lat_step).ceil() as usize).max(1);

    // Both axes bin from the bounding-box minimum; the row index is flipped
    // at storage time so the output still comes back north-first.
    let mut cells: Vec<Option<T>> = vec![None; cols * rows];
    let mut empty = cells.len();
    for p in points {
        let ll = p.latlng();
        let i = (((ll.lng - x_min) / lon_step) as usize).min(cols - 1);
        let j = (((ll.lat - y_min) / lat_step) as usize).min(rows - 1);
        let cell = &mut cells[(rows - 1 - j) * cols + i];
        if cell.is_none() {
            *cell = Some(p.clone());
            empty -= 1;
            if empty == 0 {
                break;
            }
        }
    }

    cells.into_iter().flatten().collect()
}

/// Pairwise decimation: for each retained pivot, discard every later point
/// within the spacing box (`|Δlng| <= dx && |Δlat| <= dy`, a Chebyshev-style
/// test, not Euclidean).
///
/// Removed points are skipped as pivots but are not re-linked: two points
/// can each sit within the buffer of a removed pivot yet both survive
/// because they were never compared directly. The check is deliberately not
/// transitive.
pub fn decimate_pairwise<T: Located + Clone>(points: &[T], [dx, dy]: [f64; 2]) -> Vec<T> {
    if points.len() <= 3 {
        return points.to_vec();
    }

    let mut removed = vec![false; points.len()];
    for i in 0..points.len() {
        if removed[i] {
            continue;
        }
        let a = points[i].latlng();
        for k in (i + 1)..points.len() {
            if removed[k] {
                continue;
            }
            let b = points[k].latlng();
            if (a.lng - b.lng).abs() <= dx && (a.lat - b.lat).abs() <= dy {
                removed[k] = true;
            }
        }
    }

    points
        .iter()
        .zip(&removed)
        .filter(|(_, &r)| !r)
        .map(|(p, _)| p.clone())
        .collect()
}
