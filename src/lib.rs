#![doc = include_str!("../README.md")]

mod error;
pub use error::FitError;

pub mod geometry;
pub use geometry::{chord_length, chord_length_array, intersect_circle};

mod math;

pub mod profile;
pub use profile::{create_profile, linspace_two_pi, pixels_on_ring};

pub mod model;
pub use model::{
    CIRCLE_SQUARE_AREA_RATIO, FINE_STRUCTURE_CONSTANT, MirrorGeometry, RingParameters,
    image_prediction,
};

pub mod likelihood;
pub use likelihood::{LIKELIHOOD_EPSILON, negative_log_likelihood, pixel_likelihood};

mod minimizer;
pub use minimizer::{MinimizerOptions, MinimizerResult, minimize_bounded};

pub mod telescope;
pub use telescope::{
    CameraGeometry, OpticsClass, OpticsDescription, TelescopeConfig, TelescopeDescription,
};

pub mod fitter;
pub use fitter::{FitOptions, FitParameter, FitResult, MuonIntensityFitter, TelId, Telescope};

mod types;

pub use ndarray;
