//! Integration tests for spatial decimation.

use overlay_common::{GeoPoint, LatLng, Located};
use overlay_layers::{decimate_grid, decimate_pairwise, DecimationMethod};
use rand::Rng;

fn random_points(n: usize) -> Vec<LatLng> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| LatLng::new(rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)))
        .collect()
}

// ============================================================================
// grid decimation
// ============================================================================

#[test]
fn test_grid_output_never_shares_a_cell() {
    let points = random_points(2000);
    let step = [0.5, 0.5];
    let out = decimate_grid(&points, step);
    assert!(out.len() <= points.len());

    // No two survivors fall into the same bucket cell.
    let x_min = points.iter().map(|p| p.lng).fold(f64::INFINITY, f64::min);
    let y_min = points.iter().map(|p| p.lat).fold(f64::INFINITY, f64::min);
    let mut seen = std::collections::HashSet::new();
    for p in &out {
        let i = ((p.lng - x_min) / step[0]) as i64;
        let j = ((p.lat - y_min) / step[1]) as i64;
        assert!(seen.insert((i, j)), "two survivors in cell ({i}, {j})");
    }
}

#[test]
fn test_grid_output_ordered_by_cell_not_input() {
    // Feed points in reverse geographic order; output comes back in cell
    // (row-major) order.
    let points = vec![
        LatLng::new(0.5, 9.5),
        LatLng::new(9.5, 9.5),
        LatLng::new(0.5, 0.5),
        LatLng::new(9.5, 0.5),
    ];
    let out = decimate_grid(&points, [1.0, 1.0]);
    assert_eq!(out.len(), 4);
    // Northernmost row first, west before east within a row.
    assert_eq!(out[0], LatLng::new(9.5, 0.5));
    assert_eq!(out[1], LatLng::new(9.5, 9.5));
    assert_eq!(out[2], LatLng::new(0.5, 0.5));
    assert_eq!(out[3], LatLng::new(0.5, 9.5));
}

#[test]
fn test_grid_respects_generic_point_types() {
    let points: Vec<GeoPoint> = (0..20)
        .map(|i| GeoPoint::with_value(0.1 * i as f64, 0.1 * i as f64, i as f64))
        .collect();
    let out = decimate_grid(&points, [0.5, 0.5]);
    assert!(!out.is_empty());
    for p in &out {
        assert!(p.value.is_some());
    }
}

// ============================================================================
// pairwise decimation
// ============================================================================

#[test]
fn test_pairwise_keeps_shadowed_neighbors() {
    // B and C each sit inside A's buffer; C also sits inside B's. B is
    // removed by A, and since removed points never become pivots, C is only
    // tested against A — which it escapes. Both A and C survive.
    let points = vec![
        LatLng::new(0.0, 0.0),  // A
        LatLng::new(0.0, 0.9),  // B, inside A's box
        LatLng::new(0.0, 1.5),  // C, outside A's box but inside B's
        LatLng::new(5.0, 5.0),  // padding to get past the <= 3 identity
        LatLng::new(-5.0, -5.0),
    ];
    let out = decimate_pairwise(&points, [1.0, 1.0]);
    assert!(out.contains(&LatLng::new(0.0, 0.0)));
    assert!(out.contains(&LatLng::new(0.0, 1.5)));
    assert!(!out.contains(&LatLng::new(0.0, 0.9)));
}

#[test]
fn test_pairwise_box_test_is_chebyshev_not_euclidean() {
    // Diagonal distance ~1.27 exceeds a Euclidean radius of 1.0 but both
    // axis deltas are 0.9, so the box test removes the neighbor.
    let points = vec![
        LatLng::new(0.0, 0.0),
        LatLng::new(0.9, 0.9),
        LatLng::new(5.0, 5.0),
        LatLng::new(-5.0, -5.0),
    ];
    let out = decimate_pairwise(&points, [1.0, 1.0]);
    assert_eq!(out.len(), 3);
    assert!(!out.contains(&LatLng::new(0.9, 0.9)));
}

#[test]
fn test_pairwise_survivors_keep_input_order() {
    let points = random_points(500);
    let out = decimate_pairwise(&points, [0.3, 0.3]);

    // Every survivor appears in the input, in the same relative order.
    let mut cursor = 0;
    for survivor in &out {
        let pos = points[cursor..]
            .iter()
            .position(|p| p == survivor)
            .expect("survivor missing from input");
        cursor += pos + 1;
    }
}

#[test]
fn test_methods_agree_on_identity_cases() {
    let few = random_points(3);
    for method in [DecimationMethod::Pairwise, DecimationMethod::Grid] {
        let out = method.apply(&few, [1.0, 1.0]);
        assert_eq!(out.len(), 3);
        assert!(out.iter().zip(&few).all(|(a, b)| a.latlng() == b.latlng()));
    }
}
