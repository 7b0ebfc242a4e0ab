//! Forward model: expected Cherenkov photoelectron image of a muon ring
//!
//! The model follows the HESS-style analytical description of muon ring
//! images: the amount of light collected along each azimuth is proportional
//! to the path length of the muon's Cherenkov cone across the (annular)
//! mirror, the radial spread of the ring is a Gaussian of width
//! `ring_width`, and the overall photon yield comes from the integrated
//! Cherenkov emission over the instrument's wavelength band.

use crate::math::{gauss_cdf, interp};
use crate::profile::create_profile;
use crate::types::ArrayRef1;

use ndarray::{Array1, Zip};
use serde::{Deserialize, Serialize};

/// Fine-structure constant (CODATA 2018).
pub const FINE_STRUCTURE_CONSTANT: f64 = 7.297_352_569_3e-3;

/// Ratio of the areas of the unit circle and a square of side length 2.
///
/// A rough closed-form correction for a round pixel footprint against the
/// curved ring strip it actually subtends.
pub const CIRCLE_SQUARE_AREA_RATIO: f64 = std::f64::consts::FRAC_PI_4;

/// Reflector disc with an optional concentric hole, lengths in meters.
///
/// A hole equal to or larger than the mirror is physically meaningless; the
/// model does not validate this.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MirrorGeometry {
    /// Radius of the mirror disc, m.
    pub mirror_radius: f64,
    /// Radius of the central hole, m; zero for an unbroken mirror.
    pub hole_radius: f64,
}

/// Parameters of one muon ring hypothesis.
///
/// `center_x`, `center_y` and `radius` come from an upstream ring-geometry
/// fit and stay fixed during the intensity fit; the remaining four are the
/// free parameters of the optimization.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RingParameters {
    /// Perpendicular distance of the muon track from the optical axis, m.
    pub impact_parameter: f64,
    /// Azimuth of the impact point on the mirror, rad.
    pub phi: f64,
    /// Ring center in the telescope-pointing frame, rad.
    pub center_x: f64,
    /// Ring center in the telescope-pointing frame, rad.
    pub center_y: f64,
    /// Ring radius, rad.
    pub radius: f64,
    /// Gaussian radial width of the ring, rad.
    pub ring_width: f64,
    /// Net optical throughput relative to the ideal model.
    pub optical_efficiency: f64,
}

/// Predicted photoelectron count per pixel for a muon ring hypothesis.
///
/// Pure function over plain numbers in fixed units: meters for the mirror,
/// impact parameter and wavelengths, radians for every angle. The prediction
/// does *not* include `optical_efficiency`; the objective applies it as a
/// uniform scale on the returned image.
#[allow(clippy::too_many_arguments)]
pub fn image_prediction(
    mirror: &MirrorGeometry,
    ring: &RingParameters,
    pixel_x: &ArrayRef1<f64>,
    pixel_y: &ArrayRef1<f64>,
    pixel_diameter: f64,
    oversampling: usize,
    min_lambda: f64,
    max_lambda: f64,
) -> Array1<f64> {
    let (profile_angles, profile) = create_profile(
        mirror.mirror_radius,
        mirror.hole_radius,
        ring.impact_parameter,
        ring.radius,
        ring.phi,
        pixel_diameter,
        oversampling,
    );

    // integrated Cherenkov emissivity over the wavelength band, times the
    // azimuthal width of one pixel as seen from the ring center
    let scale = FINE_STRUCTURE_CONSTANT * (min_lambda.recip() - max_lambda.recip())
        * (pixel_diameter / ring.radius)
        * (2.0 * ring.radius).sin()
        * CIRCLE_SQUARE_AREA_RATIO;

    let delta = pixel_diameter / 2.0;

    Zip::from(pixel_x).and(pixel_y).map_collect(|&px, &py| {
        let dx = px - ring.center_x;
        let dy = py - ring.center_y;
        let ang = dy.atan2(dx) + ring.phi;
        let radial_dist = (dx * dx + dy * dy).sqrt();
        // fraction of the radial Gaussian falling inside the pixel footprint
        let radial_weight = gauss_cdf(radial_dist + delta, ring.radius, ring.ring_width)
            - gauss_cdf(radial_dist - delta, ring.radius, ring.ring_width);
        interp(ang, &profile_angles, &profile) * radial_weight * scale
    })
}
