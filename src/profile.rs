//! Azimuthal path-length profile of the muon ring over the mirror aperture

use crate::geometry::intersect_circle;
use crate::math::circular_moving_average;

use lazy_static::lazy_static;
use ndarray::Array1;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex};

const GRID_CACHE_CAPACITY: usize = 1000;

lazy_static! {
    static ref GRID_CACHE: Mutex<HashMap<usize, Arc<Array1<f64>>>> = Mutex::new(HashMap::new());
}

/// Number of pixels of `pixel_diameter` that fit on the circumference of a
/// circle of `radius`.
pub fn pixels_on_ring(radius: f64, pixel_diameter: f64) -> usize {
    (2.0 * PI * radius / pixel_diameter).round() as usize
}

/// `n_points` angles evenly spaced over `[-π, π]`, memoized per point count.
///
/// The grid depends only on the sample count, which every optimizer iteration
/// of one fit shares, so the cache saves an allocation per objective
/// evaluation. The cache is emptied once it reaches capacity.
pub fn linspace_two_pi(n_points: usize) -> Arc<Array1<f64>> {
    let mut cache = GRID_CACHE.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(grid) = cache.get(&n_points) {
        return grid.clone();
    }
    if cache.len() >= GRID_CACHE_CAPACITY {
        cache.clear();
    }
    let grid = Arc::new(Array1::linspace(-PI, PI, n_points));
    cache.insert(n_points, grid.clone());
    grid
}

/// Path length through the mirror as a function of azimuth around the ring.
///
/// The ring circumference is sampled at `oversampling` times the pixel pitch
/// and smoothed back down with a wrap-around moving average of the same
/// window, approximating the finite angular acceptance of one pixel. Returned
/// angles are offset by `phi`, so interpolation queries must be made in the
/// same offset frame; together with the endpoint clamping of the interpolator
/// this keeps the profile periodic-safe.
pub fn create_profile(
    mirror_radius: f64,
    hole_radius: f64,
    impact_parameter: f64,
    ring_radius: f64,
    phi: f64,
    pixel_diameter: f64,
    oversampling: usize,
) -> (Array1<f64>, Array1<f64>) {
    let oversampling = oversampling.max(1);
    let pixels_on_circle = pixels_on_ring(ring_radius, pixel_diameter).max(1);
    let n_samples = pixels_on_circle * oversampling;

    let angles = &*linspace_two_pi(n_samples) + phi;
    let raw = angles.mapv(|a| intersect_circle(mirror_radius, impact_parameter, a, hole_radius));
    let smoothed = circular_moving_average(&raw, oversampling);

    (angles, smoothed)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::math::interp;

    use approx::assert_abs_diff_eq;

    #[test]
    fn base_grid_spans_two_pi() {
        let grid = linspace_two_pi(101);
        assert_eq!(grid.len(), 101);
        assert_abs_diff_eq!(grid[0], -PI, epsilon = 1e-12);
        assert_abs_diff_eq!(grid[100], PI, epsilon = 1e-12);
    }

    #[test]
    fn base_grid_is_memoized() {
        let first = linspace_two_pi(64);
        let second = linspace_two_pi(64);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn pixels_on_ring_counts_pitches() {
        let radius = 1.2_f64.to_radians();
        let n = pixels_on_ring(radius, 2e-3);
        assert_eq!(n, 66);
    }

    #[test]
    fn profile_has_oversampled_length() {
        let radius = 1.2_f64.to_radians();
        let pixel_diameter = 2e-3;
        let (angles, lengths) = create_profile(8.6, 0.3, 5.0, radius, 0.3, pixel_diameter, 3);
        let expected = pixels_on_ring(radius, pixel_diameter) * 3;
        assert_eq!(angles.len(), expected);
        assert_eq!(lengths.len(), expected);
    }

    #[test]
    fn profile_is_offset_by_phi() {
        let phi = 0.3;
        let (angles, _) = create_profile(8.6, 0.3, 5.0, 1.2_f64.to_radians(), phi, 2e-3, 3);
        assert_abs_diff_eq!(angles[0], -PI + phi, epsilon = 1e-12);
        assert_abs_diff_eq!(angles[angles.len() - 1], PI + phi, epsilon = 1e-12);
    }

    #[test]
    fn profile_is_periodic_within_sampling_tolerance() {
        let (angles, lengths) = create_profile(8.6, 0.3, 5.0, 1.2_f64.to_radians(), 0.3, 2e-3, 3);
        // the first and last grid angles are the same physical direction
        let head = interp(angles[0], &angles, &lengths);
        let tail = interp(angles[angles.len() - 1], &angles, &lengths);
        assert_abs_diff_eq!(head, tail, epsilon = 0.5);
    }

    #[test]
    fn profile_is_non_negative_for_inside_impact() {
        let (_, lengths) = create_profile(8.6, 0.0, 4.0, 1.2_f64.to_radians(), 0.0, 2e-3, 3);
        for &l in lengths.iter() {
            assert!(l >= 0.0);
            assert!(l.is_finite());
        }
    }
}
