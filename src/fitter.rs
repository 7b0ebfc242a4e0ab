//! Fit engine: maximum-likelihood estimation of the muon ring intensity
//!
//! One fit call freezes the telescope-derived constants and the observed
//! image into an immutable [FitContext], builds the negative log-likelihood
//! objective on top of the forward model, and runs the bounded
//! derivative-free minimizer over the four free parameters
//! (`impact_parameter`, `phi`, `ring_width`, `optical_efficiency`). The ring
//! center and radius come from an upstream geometry fit and never move.

use crate::error::FitError;
use crate::likelihood::negative_log_likelihood;
use crate::minimizer::{MinimizerOptions, minimize_bounded};
use crate::model::{MirrorGeometry, RingParameters, image_prediction};
use crate::profile::pixels_on_ring;
use crate::telescope::{TelescopeConfig, TelescopeDescription};
use crate::types::ArrayRef1;

use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::PI;

/// Identifier of a telescope within the array.
pub type TelId = usize;

const N_PARAMETERS: usize = 7;

/// One entry of the fit parameter table.
///
/// The parameters are iterated in a fixed order — `impact_parameter`, `phi`,
/// `center_x`, `center_y`, `radius`, `ring_width`, `optical_efficiency` — so
/// repeated fits of the same image are bit-reproducible.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitParameter {
    pub name: &'static str,
    pub initial_value: f64,
    pub step_size: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub is_fixed: bool,
}

/// Outcome of a successful intensity fit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Impact parameter of the muon track, m.
    pub impact: f64,
    /// Impact point x coordinate, `impact · cos(phi)`, m.
    pub impact_x: f64,
    /// Impact point y coordinate, `impact · sin(phi)`, m.
    pub impact_y: f64,
    /// Gaussian ring width, degrees.
    pub width: f64,
    /// Net optical throughput relative to the ideal model.
    pub optical_efficiency: f64,
    /// Whether the minimizer met its stopping tolerances.
    pub converged: bool,
    /// Value of the −2·ln L objective at the minimum.
    pub fmin: f64,
}

/// Fit-level options shared by all telescopes.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct FitOptions {
    pub minimizer: MinimizerOptions,
    /// Return the last minimizer state instead of failing when the stopping
    /// tolerances were not met within the evaluation budget.
    pub accept_unconverged: bool,
}

impl FitOptions {
    #[inline]
    pub fn default_accept_unconverged() -> bool {
        false
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            minimizer: MinimizerOptions::default(),
            accept_unconverged: Self::default_accept_unconverged(),
        }
    }
}

/// A telescope registered with the fitter: instrument description plus the
/// per-telescope tunables.
#[derive(Clone, Debug)]
pub struct Telescope {
    pub description: TelescopeDescription,
    pub config: TelescopeConfig,
}

/// Everything one objective evaluation needs, frozen once per fit call.
struct FitContext {
    mirror: MirrorGeometry,
    pixel_x: Array1<f64>,
    pixel_y: Array1<f64>,
    pixel_diameter: f64,
    image: Array1<f64>,
    pedestal: Array1<f64>,
    spe_width: f64,
    min_lambda: f64,
    max_lambda: f64,
    oversampling: usize,
}

impl FitContext {
    fn objective(&self, ring: &RingParameters) -> f64 {
        let prediction = image_prediction(
            &self.mirror,
            ring,
            &self.pixel_x,
            &self.pixel_y,
            self.pixel_diameter,
            self.oversampling,
            self.min_lambda,
            self.max_lambda,
        ) * ring.optical_efficiency;
        negative_log_likelihood(&self.image, &prediction, self.spe_width, &self.pedestal)
    }
}

/// The parameter table of one fit call: initial guesses, step sizes, bounds
/// and fixed flags, in the canonical order.
fn fit_parameters(
    mirror_radius: f64,
    center_x: f64,
    center_y: f64,
    radius: f64,
    pixel_angular_radius: f64,
) -> [FitParameter; N_PARAMETERS] {
    [
        FitParameter {
            name: "impact_parameter",
            initial_value: mirror_radius / 2.0,
            step_size: 0.5,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            is_fixed: false,
        },
        FitParameter {
            name: "phi",
            initial_value: 0.0,
            step_size: 0.5_f64.to_radians(),
            lower_bound: -PI,
            upper_bound: PI,
            is_fixed: false,
        },
        FitParameter {
            name: "center_x",
            initial_value: center_x,
            step_size: 0.0,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            is_fixed: true,
        },
        FitParameter {
            name: "center_y",
            initial_value: center_y,
            step_size: 0.0,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            is_fixed: true,
        },
        FitParameter {
            name: "radius",
            initial_value: radius,
            step_size: 0.0,
            lower_bound: f64::NEG_INFINITY,
            upper_bound: f64::INFINITY,
            is_fixed: true,
        },
        FitParameter {
            name: "ring_width",
            initial_value: 3.0 * pixel_angular_radius,
            step_size: 1e-3 * radius,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            is_fixed: false,
        },
        FitParameter {
            name: "optical_efficiency",
            initial_value: 0.1,
            step_size: 0.05,
            lower_bound: 0.0,
            upper_bound: f64::INFINITY,
            is_fixed: false,
        },
    ]
}

/// Rebuild the full parameter set from the free-parameter values, taking
/// fixed parameters from their initial values.
fn assemble_ring(parameters: &[FitParameter; N_PARAMETERS], free: &[f64]) -> RingParameters {
    let mut values = [0.0; N_PARAMETERS];
    let mut free_iter = free.iter().copied();
    for (value, parameter) in values.iter_mut().zip(parameters.iter()) {
        *value = if parameter.is_fixed {
            parameter.initial_value
        } else {
            free_iter.next().unwrap_or(parameter.initial_value)
        };
    }
    RingParameters {
        impact_parameter: values[0],
        phi: values[1],
        center_x: values[2],
        center_y: values[3],
        radius: values[4],
        ring_width: values[5],
        optical_efficiency: values[6],
    }
}

/// HESS-style 2D maximum-likelihood fitter of muon ring images.
#[derive(Clone, Debug, Default)]
pub struct MuonIntensityFitter {
    telescopes: BTreeMap<TelId, Telescope>,
    options: FitOptions,
}

impl MuonIntensityFitter {
    pub fn new(options: FitOptions) -> Self {
        Self {
            telescopes: BTreeMap::new(),
            options,
        }
    }

    /// Register a telescope under `tel_id`, replacing any previous entry.
    pub fn add_telescope(
        &mut self,
        tel_id: TelId,
        description: TelescopeDescription,
        config: TelescopeConfig,
    ) {
        self.telescopes.insert(
            tel_id,
            Telescope {
                description,
                config,
            },
        );
    }

    pub fn telescope(&self, tel_id: TelId) -> Option<&Telescope> {
        self.telescopes.get(&tel_id)
    }

    /// Fit the muon ring intensity model to one image.
    ///
    /// `center_x`, `center_y` and `radius` are the angular ring estimates
    /// from an upstream geometry fit (rad) and are held fixed; `image` and
    /// `pedestal` are per-pixel arrays matching the telescope's pixel count.
    pub fn fit(
        &self,
        tel_id: TelId,
        center_x: f64,
        center_y: f64,
        radius: f64,
        image: &ArrayRef1<f64>,
        pedestal: &ArrayRef1<f64>,
    ) -> Result<FitResult, FitError> {
        let telescope = self
            .telescopes
            .get(&tel_id)
            .ok_or(FitError::UnknownTelescope(tel_id))?;

        let optics = &telescope.description.optics;
        if optics.num_mirrors != 1 {
            return Err(FitError::UnsupportedOptics {
                tel_id,
                num_mirrors: optics.num_mirrors,
            });
        }

        let n_pixels = telescope.description.n_pixels();
        if n_pixels == 0 {
            return Err(FitError::EmptyCamera { tel_id });
        }
        if image.len() != n_pixels {
            return Err(FitError::PixelCountMismatch {
                name: "image",
                actual: image.len(),
                expected: n_pixels,
            });
        }
        if pedestal.len() != n_pixels {
            return Err(FitError::PixelCountMismatch {
                name: "pedestal",
                actual: pedestal.len(),
                expected: n_pixels,
            });
        }

        let pixel_diameter = telescope.description.pixel_diameter();
        if radius.is_nan() || radius <= 0.0 || pixels_on_ring(radius, pixel_diameter) == 0 {
            return Err(FitError::EmptyProfile {
                radius,
                pixel_diameter,
            });
        }

        let (pixel_x, pixel_y) = telescope.description.pixel_positions();
        let config = &telescope.config;
        let context = FitContext {
            mirror: MirrorGeometry {
                mirror_radius: optics.mirror_radius(),
                hole_radius: config.hole_radius.into_inner(),
            },
            pixel_x,
            pixel_y,
            pixel_diameter,
            image: image.to_owned(),
            pedestal: pedestal.to_owned(),
            spe_width: config.spe_width.into_inner(),
            min_lambda: config.min_lambda.into_inner(),
            max_lambda: config.max_lambda.into_inner(),
            oversampling: config.oversampling as usize,
        };

        let parameters = fit_parameters(
            context.mirror.mirror_radius,
            center_x,
            center_y,
            radius,
            telescope.description.pixel_angular_radius(),
        );

        let mut initial = Vec::with_capacity(N_PARAMETERS);
        let mut steps = Vec::with_capacity(N_PARAMETERS);
        let mut lower = Vec::with_capacity(N_PARAMETERS);
        let mut upper = Vec::with_capacity(N_PARAMETERS);
        for parameter in parameters.iter().filter(|p| !p.is_fixed) {
            initial.push(parameter.initial_value);
            steps.push(parameter.step_size);
            lower.push(parameter.lower_bound);
            upper.push(parameter.upper_bound);
        }

        let objective = |free: &[f64]| context.objective(&assemble_ring(&parameters, free));
        let minimum = minimize_bounded(
            objective,
            &initial,
            &steps,
            &lower,
            &upper,
            &self.options.minimizer,
        );

        if !minimum.converged && !self.options.accept_unconverged {
            return Err(FitError::NotConverged {
                niterations: self.options.minimizer.niterations,
            });
        }

        let ring = assemble_ring(&parameters, &minimum.x);
        Ok(FitResult {
            impact: ring.impact_parameter,
            impact_x: ring.impact_parameter * ring.phi.cos(),
            impact_y: ring.impact_parameter * ring.phi.sin(),
            width: ring.ring_width.to_degrees(),
            optical_efficiency: ring.optical_efficiency,
            converged: minimum.converged,
            fmin: minimum.fmin,
        })
    }
}
