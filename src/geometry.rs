//! Closed-form chord geometry of rays through an annular mirror

use crate::types::ArrayRef1;

use ndarray::{Array1, Zip};

/// Length of the chord cut from a circle of `radius` by a ray starting at a
/// point at fractional distance `rho = r / radius` from the center and running
/// along direction `phi`.
///
/// For `rho <= 1` the starting point lies inside the circle and the chord runs
/// from the point to the far edge; for `rho > 1` the point is outside and the
/// chord is the full crossing, or zero when the ray misses the circle.
/// Directions that miss the circle yield zero rather than NaN.
pub fn chord_length(radius: f64, rho: f64, phi: f64) -> f64 {
    let discriminant = 1.0 - rho.powi(2) * phi.sin().powi(2);
    if discriminant < 0.0 {
        return 0.0;
    }
    if rho <= 1.0 {
        radius * (discriminant.sqrt() + rho * phi.cos())
    } else {
        2.0 * radius * discriminant.sqrt()
    }
}

/// Vectorized [chord_length] over an array of ray directions.
pub fn chord_length_array(radius: f64, rho: f64, phi: &ArrayRef1<f64>) -> Array1<f64> {
    Zip::from(phi).map_collect(|&p| chord_length(radius, rho, p))
}

/// Path length along direction `angle` of a ray from an impact point at radial
/// distance `r`, through a mirror of `mirror_radius` with a concentric hole of
/// `hole_radius`.
///
/// The chord through the hole is subtracted from the mirror chord; a zero
/// `hole_radius` skips the subtraction entirely, which also avoids the
/// division by zero in the `r / hole_radius` fraction.
pub fn intersect_circle(mirror_radius: f64, r: f64, angle: f64, hole_radius: f64) -> f64 {
    let mirror_length = chord_length(mirror_radius, r / mirror_radius, angle);
    if hole_radius <= 0.0 {
        return mirror_length;
    }
    mirror_length - chord_length(hole_radius, r / hole_radius, angle)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::Array1;
    use std::f64::consts::PI;

    #[test]
    fn chord_from_center_is_radius() {
        let radius = 5.0;
        for i in 0..32 {
            let phi = -PI + 2.0 * PI * i as f64 / 32.0;
            assert_abs_diff_eq!(chord_length(radius, 0.0, phi), radius, epsilon = 1e-12);
        }
    }

    #[test]
    fn chord_from_boundary_along_diameter() {
        assert_abs_diff_eq!(chord_length(3.0, 1.0, 0.0), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn chord_is_never_negative_nor_nan() {
        for &rho in &[0.0, 0.3, 0.7, 1.0, 1.5, 3.0] {
            for i in 0..64 {
                let phi = -PI + 2.0 * PI * i as f64 / 64.0;
                let chord = chord_length(2.0, rho, phi);
                assert!(chord >= 0.0, "negative chord at rho={rho}, phi={phi}");
                assert!(chord.is_finite());
            }
        }
    }

    #[test]
    fn ray_missing_the_circle_gives_zero() {
        // point at twice the radius, looking sideways
        assert_abs_diff_eq!(chord_length(1.0, 2.0, PI / 2.0), 0.0);
    }

    #[test]
    fn array_form_matches_scalar() {
        let phis = Array1::linspace(-PI, PI, 33);
        let chords = chord_length_array(4.0, 0.6, &phis);
        for (&phi, &chord) in phis.iter().zip(chords.iter()) {
            assert_abs_diff_eq!(chord, chord_length(4.0, 0.6, phi), epsilon = 1e-12);
        }
    }

    #[test]
    fn intersect_without_hole_is_plain_chord() {
        let mirror_radius = 8.6;
        let r = 5.0;
        for i in 0..16 {
            let angle = -PI + 2.0 * PI * i as f64 / 16.0;
            assert_abs_diff_eq!(
                intersect_circle(mirror_radius, r, angle, 0.0),
                chord_length(mirror_radius, r / mirror_radius, angle),
                epsilon = 1e-12,
            );
        }
    }

    #[test]
    fn hole_reduces_path_length() {
        let plain = intersect_circle(8.6, 0.5, 0.1, 0.0);
        let holed = intersect_circle(8.6, 0.5, 0.1, 0.3);
        assert!(holed < plain);
        assert!(holed >= 0.0);
    }
}
