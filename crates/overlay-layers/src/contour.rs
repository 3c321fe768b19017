//! Isoline extraction with marching squares.
//!
//! Segments are produced in grid-cell coordinates, chained into polylines
//! and optionally smoothed, then mapped to geographic coordinates with the
//! field's half-cell registration (cell values sit at cell centers).

use overlay_common::{LatLng, ScalarField};

/// A point in grid-cell coordinates: `x` along columns, `y` along rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellPoint {
    pub x: f64,
    pub y: f64,
}

impl CellPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: CellPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// One crossing of the contour level through a grid cell edge pair.
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: CellPoint,
    pub end: CellPoint,
}

/// A connected isoline in grid-cell coordinates.
#[derive(Debug, Clone)]
pub struct Isoline {
    pub level: f64,
    pub points: Vec<CellPoint>,
    pub closed: bool,
}

impl Isoline {
    /// Project the isoline into geographic coordinates.
    pub fn latlng_points(&self, field: &ScalarField) -> Vec<LatLng> {
        self.points.iter().map(|&p| cell_to_latlng(field, p)).collect()
    }
}

/// Geographic position of a grid-cell coordinate.
///
/// Cell (0, 0)'s value sits half a step inside the field bounds, so column
/// `x` maps to `west - lon_step/2 + x * lon_step` and row `y` to
/// `north + lat_step/2 - y * lat_step`.
pub fn cell_to_latlng(field: &ScalarField, p: CellPoint) -> LatLng {
    LatLng::new(
        field.bounds.north + field.lat_step / 2.0 - p.y * field.lat_step,
        field.bounds.west - field.lon_step / 2.0 + p.x * field.lon_step,
    )
}

/// Evenly spaced contour levels covering `[min_value, max_value]`.
pub fn generate_levels(min_value: f64, max_value: f64, interval: f64) -> Vec<f64> {
    if interval <= 0.0 || max_value <= min_value {
        return Vec::new();
    }
    let start = (min_value / interval).ceil() * interval;
    let mut levels = Vec::new();
    let mut level = start;
    while level <= max_value {
        levels.push(level);
        level += interval;
    }
    levels
}

/// Marching squares over the field's grid for one contour level.
///
/// Cells touching a NaN corner are skipped rather than interpolated.
pub fn march_squares(field: &ScalarField, level: f64) -> Vec<Segment> {
    let cols = field.cols;
    let rows = field.rows;
    if cols < 2 || rows < 2 || field.values.len() != cols * rows {
        return Vec::new();
    }

    let mut segments = Vec::new();
    for y in 0..(rows - 1) {
        for x in 0..(cols - 1) {
            let tl = field.values[y * cols + x];
            let tr = field.values[y * cols + x + 1];
            let bl = field.values[(y + 1) * cols + x];
            let br = field.values[(y + 1) * cols + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(cell_segments(
                cell_index, x as f64, y as f64, tl, tr, br, bl, level,
            ));
        }
    }
    segments
}

/// Lookup the segment layout for one marching squares cell.
#[allow(clippy::too_many_arguments)]
fn cell_segments(
    cell_index: u8,
    x: f64,
    y: f64,
    tl: f64,
    tr: f64,
    br: f64,
    bl: f64,
    level: f64,
) -> Vec<Segment> {
    let top = interpolate_edge(x, y, x + 1.0, y, tl, tr, level);
    let right = interpolate_edge(x + 1.0, y, x + 1.0, y + 1.0, tr, br, level);
    let bottom = interpolate_edge(x, y + 1.0, x + 1.0, y + 1.0, bl, br, level);
    let left = interpolate_edge(x, y, x, y + 1.0, tl, bl, level);

    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![Segment { start: left, end: top }],
        2 | 13 => vec![Segment { start: top, end: right }],
        3 | 12 => vec![Segment { start: left, end: right }],
        4 | 11 => vec![Segment { start: right, end: bottom }],
        // Saddle: two independent crossings.
        5 => vec![
            Segment { start: left, end: top },
            Segment { start: right, end: bottom },
        ],
        6 | 9 => vec![Segment { start: top, end: bottom }],
        7 | 8 => vec![Segment { start: left, end: bottom }],
        10 => vec![
            Segment { start: top, end: right },
            Segment { start: left, end: bottom },
        ],
        _ => vec![],
    }
}

/// Where the level crosses an edge, by linear interpolation of the corner
/// values.
fn interpolate_edge(x1: f64, y1: f64, x2: f64, y2: f64, val1: f64, val2: f64, level: f64) -> CellPoint {
    if (val2 - val1).abs() < 1e-6 {
        return CellPoint::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }
    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    CellPoint::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Chain unordered segments into continuous polylines by endpoint matching.
pub fn connect_segments(segments: Vec<Segment>, level: f64) -> Vec<Isoline> {
    if segments.is_empty() {
        return Vec::new();
    }

    let epsilon = 0.001;
    let mut isolines = Vec::new();
    let mut used = vec![false; segments.len()];

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        let mut points = vec![segments[start_idx].start, segments[start_idx].end];
        used[start_idx] = true;

        let mut changed = true;
        while changed {
            changed = false;
            let current_end = points[points.len() - 1];

            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if seg.start.distance(current_end) < epsilon {
                    points.push(seg.end);
                    used[i] = true;
                    changed = true;
                    break;
                } else if seg.end.distance(current_end) < epsilon {
                    points.push(seg.start);
                    used[i] = true;
                    changed = true;
                    break;
                }
            }
        }

        let closed = points[0].distance(points[points.len() - 1]) < epsilon;
        if points.len() >= 2 {
            isolines.push(Isoline {
                level,
                points,
                closed,
            });
        }
    }
    isolines
}

/// Chaikin corner cutting. Open isolines keep their endpoints.
pub fn smooth_isoline(isoline: &Isoline, iterations: u32) -> Isoline {
    if iterations == 0 || isoline.points.len() < 3 {
        return isoline.clone();
    }

    let mut points = isoline.points.clone();
    for _ in 0..iterations {
        let mut new_points = Vec::with_capacity(points.len() * 2);
        for i in 0..points.len() {
            let p1 = points[i];
            let p2 = if isoline.closed {
                points[(i + 1) % points.len()]
            } else if i + 1 < points.len() {
                points[i + 1]
            } else {
                break;
            };
            new_points.push(CellPoint::new(
                0.75 * p1.x + 0.25 * p2.x,
                0.75 * p1.y + 0.25 * p2.y,
            ));
            new_points.push(CellPoint::new(
                0.25 * p1.x + 0.75 * p2.x,
                0.25 * p1.y + 0.75 * p2.y,
            ));
        }
        if !isoline.closed && !points.is_empty() {
            new_points.insert(0, points[0]);
            new_points.push(points[points.len() - 1]);
        }
        points = new_points;
    }

    Isoline {
        level: isoline.level,
        points,
        closed: isoline.closed,
    }
}

/// Extract, chain and smooth every requested level.
pub fn extract_isolines(field: &ScalarField, levels: &[f64], smoothing_passes: u32) -> Vec<Isoline> {
    let mut all = Vec::new();
    for &level in levels {
        let segments = march_squares(field, level);
        let mut isolines = connect_segments(segments, level);
        if smoothing_passes > 0 {
            for isoline in &mut isolines {
                *isoline = smooth_isoline(isoline, smoothing_passes);
            }
        }
        all.extend(isolines);
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use overlay_common::GeoBounds;

    fn field(values: Vec<f64>, cols: usize, rows: usize) -> ScalarField {
        ScalarField::new(
            values,
            cols,
            rows,
            1.0,
            1.0,
            GeoBounds::new(10.0, 10.0 - rows as f64, cols as f64, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn test_generate_levels() {
        assert_eq!(generate_levels(0.0, 20.0, 5.0), vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(generate_levels(2.0, 18.0, 5.0), vec![5.0, 10.0, 15.0]);
        assert!(generate_levels(5.0, 2.0, 1.0).is_empty());
        assert!(generate_levels(0.0, 10.0, 0.0).is_empty());
    }

    #[test]
    fn test_interpolate_edge_midway() {
        let p = interpolate_edge(0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 5.0);
        assert!((p.x - 0.5).abs() < 0.01);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_flat_field_has_no_contour() {
        let f = field(vec![5.0; 9], 3, 3);
        assert!(march_squares(&f, 5.0).is_empty());
    }

    #[test]
    fn test_peak_produces_closed_ring() {
        let f = field(
            vec![
                0.0, 0.0, 0.0, //
                0.0, 10.0, 0.0, //
                0.0, 0.0, 0.0,
            ],
            3,
            3,
        );
        let segments = march_squares(&f, 5.0);
        assert!(!segments.is_empty());
        let isolines = connect_segments(segments, 5.0);
        assert_eq!(isolines.len(), 1);
        assert!(isolines[0].closed);
        assert_eq!(isolines[0].level, 5.0);
    }

    #[test]
    fn test_nan_cells_are_skipped() {
        let f = field(
            vec![
                0.0, f64::NAN, 0.0, //
                0.0, 10.0, 0.0, //
                0.0, 0.0, 0.0,
            ],
            3,
            3,
        );
        let with_nan = march_squares(&f, 5.0).len();
        let f2 = field(
            vec![
                0.0, 0.0, 0.0, //
                0.0, 10.0, 0.0, //
                0.0, 0.0, 0.0,
            ],
            3,
            3,
        );
        let without = march_squares(&f2, 5.0).len();
        assert!(with_nan < without);
    }

    #[test]
    fn test_smoothing_preserves_open_endpoints() {
        let isoline = Isoline {
            level: 1.0,
            points: vec![
                CellPoint::new(0.0, 0.0),
                CellPoint::new(1.0, 1.0),
                CellPoint::new(2.0, 0.0),
            ],
            closed: false,
        };
        let smoothed = smooth_isoline(&isoline, 2);
        assert!(smoothed.points.len() > isoline.points.len());
        assert_eq!(smoothed.points[0], CellPoint::new(0.0, 0.0));
        assert_eq!(smoothed.points[smoothed.points.len() - 1], CellPoint::new(2.0, 0.0));
    }

    #[test]
    fn test_cell_to_latlng_half_cell_registration() {
        let f = field(vec![0.0; 9], 3, 3);
        // Cell (0, 0) sits half a step outside the NW corner.
        let p = cell_to_latlng(&f, CellPoint::new(0.0, 0.0));
        assert!((p.lat - 10.5).abs() < 1e-9);
        assert!((p.lng - (-0.5)).abs() < 1e-9);
        // One column east, one row south.
        let q = cell_to_latlng(&f, CellPoint::new(1.0, 1.0));
        assert!((q.lat - 9.5).abs() < 1e-9);
        assert!((q.lng - 0.5).abs() < 1e-9);
    }
}
