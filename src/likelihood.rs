//! Gaussian-approximation likelihood of an observed image given a prediction
//!
//! Per-pixel negative log-likelihood under the Gaussian approximation to the
//! Poisson signal distribution convolved with pedestal noise, following
//! de Naurois & Rolland (2009). Summed over pixels it is the objective
//! minimized by the fit engine.

use crate::types::ArrayRef1;

use ndarray::Zip;
use std::f64::consts::PI;

/// Guard added to the Gaussian term before the logarithm.
pub const LIKELIHOOD_EPSILON: f64 = 1e-16;

/// Negative log-likelihood of a single pixel.
///
/// The variance combines the pedestal noise with the Poisson fluctuation of
/// the *predicted* signal, broadened by the single-photoelectron resolution:
/// `variance = pedestal² + pred · (1 + spe_width²)`. The variance is floored
/// at machine epsilon so the `pedestal = pred = 0` corner stays finite.
pub fn pixel_likelihood(image: f64, pred: f64, spe_width: f64, pedestal: f64) -> f64 {
    let variance = (pedestal.powi(2) + pred * (1.0 + spe_width.powi(2))).max(f64::EPSILON);
    let norm = 1.0 / (2.0 * PI * variance).sqrt();
    let gauss = norm * (-(image - pred).powi(2) / (2.0 * variance)).exp();
    -2.0 * (gauss + LIKELIHOOD_EPSILON).ln()
}

/// Sum of [pixel_likelihood] over the whole image.
pub fn negative_log_likelihood(
    image: &ArrayRef1<f64>,
    pred: &ArrayRef1<f64>,
    spe_width: f64,
    pedestal: &ArrayRef1<f64>,
) -> f64 {
    Zip::from(image)
        .and(pred)
        .and(pedestal)
        .fold(0.0, |acc, &measured, &predicted, &ped| {
            acc + pixel_likelihood(measured, predicted, spe_width, ped)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn variance_uses_prediction_not_image() {
        // swapping image and prediction changes only the diff term if the
        // likelihood were symmetric; it must not be
        let forward = pixel_likelihood(5.0, 2.0, 0.5, 1.0);
        let swapped = pixel_likelihood(2.0, 5.0, 0.5, 1.0);
        assert!((forward - swapped).abs() > 1e-6);
    }

    #[test]
    fn likelihood_is_minimal_at_perfect_prediction() {
        let at_truth = pixel_likelihood(10.0, 10.0, 0.5, 1.0);
        assert!(at_truth < pixel_likelihood(10.0, 8.0, 0.5, 1.0));
        assert!(at_truth < pixel_likelihood(10.0, 12.0, 0.5, 1.0));
    }

    #[test]
    fn matches_closed_form() {
        let (image, pred, spe_width, pedestal) = (3.0, 2.0, 0.5, 1.5);
        let variance = pedestal * pedestal + pred * (1.0 + spe_width * spe_width);
        let gauss = (2.0 * PI * variance).sqrt().recip()
            * (-(image - pred) * (image - pred) / (2.0 * variance)).exp();
        let desired = -2.0 * (gauss + LIKELIHOOD_EPSILON).ln();
        assert_abs_diff_eq!(
            pixel_likelihood(image, pred, spe_width, pedestal),
            desired,
            epsilon = 1e-12,
        );
    }

    #[test]
    fn degenerate_zero_noise_zero_signal_is_finite() {
        let value = pixel_likelihood(0.0, 0.0, 0.0, 0.0);
        assert!(value.is_finite());
    }

    #[test]
    fn far_tail_is_capped_by_epsilon_guard() {
        // a hopeless prediction ends up at -2 ln(eps) instead of infinity
        let value = pixel_likelihood(1e6, 0.0, 0.5, 1.0);
        assert!(value.is_finite());
        assert!(value <= -2.0 * LIKELIHOOD_EPSILON.ln() + 1e-6);
    }

    #[test]
    fn sums_over_pixels() {
        let image = array![1.0, 2.0, 3.0];
        let pred = array![1.1, 1.9, 3.2];
        let pedestal = array![1.0, 1.0, 1.5];
        let total = negative_log_likelihood(&image, &pred, 0.5, &pedestal);
        let by_hand: f64 = image
            .iter()
            .zip(pred.iter())
            .zip(pedestal.iter())
            .map(|((&m, &p), &ped)| pixel_likelihood(m, p, 0.5, ped))
            .sum();
        assert_abs_diff_eq!(total, by_hand, epsilon = 1e-12);
    }
}
