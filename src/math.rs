//! Simple numeric helpers shared by the profile builder and the forward model

use crate::types::ArrayRef1;

use ndarray::Array1;
use std::f64::consts::SQRT_2;

/// Cumulative distribution function of a Gaussian with the given mean and
/// standard deviation.
///
/// `sigma` is floored at machine epsilon, so a vanishing width degrades to a
/// step function instead of a division by zero.
pub fn gauss_cdf(x: f64, mean: f64, sigma: f64) -> f64 {
    let sigma = sigma.max(f64::EPSILON);
    0.5 * (1.0 + libm::erf((x - mean) / (sigma * SQRT_2)))
}

/// Circular (wrap-around) moving average with the given window size.
///
/// The window is centered on each element the way a correlation with a boxcar
/// kernel is, with the shorter tail on the right for even window sizes.
pub fn circular_moving_average(x: &ArrayRef1<f64>, window: usize) -> Array1<f64> {
    let n = x.len();
    if n == 0 || window <= 1 {
        return x.to_owned();
    }
    let center = ((window - 1) / 2) as isize;
    Array1::from_shape_fn(n, |i| {
        let mut sum = 0.0;
        for j in 0..window as isize {
            let idx = (i as isize + j - center).rem_euclid(n as isize) as usize;
            sum += x[idx];
        }
        sum / window as f64
    })
}

/// Piecewise-linear interpolation over a grid sorted ascending in `xp`.
///
/// Queries outside the grid clamp to the nearest endpoint value, which is what
/// keeps ring pixels near the profile seam finite.
pub fn interp(x: f64, xp: &ArrayRef1<f64>, fp: &ArrayRef1<f64>) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    let n = xp.len();
    if n == 0 {
        return 0.0;
    }
    if x <= xp[0] {
        return fp[0];
    }
    if x >= xp[n - 1] {
        return fp[n - 1];
    }
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xp[mid] <= x {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let t = (x - xp[lo]) / (xp[hi] - xp[lo]);
    fp[lo] + t * (fp[hi] - fp[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn gauss_cdf_at_mean_is_half() {
        assert_abs_diff_eq!(gauss_cdf(1.2, 1.2, 0.3), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn gauss_cdf_tails() {
        assert_abs_diff_eq!(gauss_cdf(10.0, 0.0, 1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(gauss_cdf(-10.0, 0.0, 1.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn gauss_cdf_zero_sigma_is_step() {
        assert_abs_diff_eq!(gauss_cdf(1.0, 0.0, 0.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(gauss_cdf(-1.0, 0.0, 0.0), 0.0, epsilon = 1e-12);
        assert!(gauss_cdf(0.0, 0.0, 0.0).is_finite());
    }

    #[test]
    fn moving_average_of_constant_is_constant() {
        let x = Array1::from_elem(17, 3.5);
        let smoothed = circular_moving_average(&x, 3);
        for &v in smoothed.iter() {
            assert_abs_diff_eq!(v, 3.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn moving_average_wraps() {
        let x = array![1.0, 2.0, 3.0, 4.0];
        let smoothed = circular_moving_average(&x, 3);
        let desired = array![
            (4.0 + 1.0 + 2.0) / 3.0,
            (1.0 + 2.0 + 3.0) / 3.0,
            (2.0 + 3.0 + 4.0) / 3.0,
            (3.0 + 4.0 + 1.0) / 3.0,
        ];
        for (&a, &d) in smoothed.iter().zip(desired.iter()) {
            assert_abs_diff_eq!(a, d, epsilon = 1e-12);
        }
    }

    #[test]
    fn moving_average_window_one_is_identity() {
        let x = array![1.0, 5.0, 2.0];
        let smoothed = circular_moving_average(&x, 1);
        assert_eq!(smoothed, x);
    }

    #[test]
    fn interp_midpoint() {
        let xp = array![0.0, 1.0, 2.0];
        let fp = array![0.0, 10.0, 0.0];
        assert_abs_diff_eq!(interp(0.5, &xp, &fp), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp(1.5, &xp, &fp), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn interp_clamps_to_endpoints() {
        let xp = array![-1.0, 0.0, 1.0];
        let fp = array![2.0, 3.0, 4.0];
        assert_abs_diff_eq!(interp(-5.0, &xp, &fp), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(interp(5.0, &xp, &fp), 4.0, epsilon = 1e-12);
    }
}
