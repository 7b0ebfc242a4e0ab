//! Telescope optics and camera descriptors consumed by the fitter
//!
//! These are the narrow interfaces to the instrument description: the fitter
//! needs the mirror area, the focal length, the pixel layout on the focal
//! plane and a handful of per-telescope tunables. Pixel angular positions in
//! the telescope-pointing frame are derived here with a small-angle
//! projection through the equivalent focal length.

use ndarray::{Array1, Zip};
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Optics of one telescope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpticsDescription {
    /// Total mirror area, m².
    pub mirror_area: f64,
    /// Equivalent focal length, m.
    pub equivalent_focal_length: f64,
    /// Number of mirrors in the optical path; the fit supports 1 only.
    pub num_mirrors: u32,
}

impl OpticsDescription {
    /// Radius of the disc with the same area as the mirror, m.
    pub fn mirror_radius(&self) -> f64 {
        (self.mirror_area / PI).sqrt()
    }
}

/// Camera pixel layout in the camera frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraGeometry {
    /// Pixel x positions on the focal plane, m.
    pub pix_x: Array1<f64>,
    /// Pixel y positions on the focal plane, m.
    pub pix_y: Array1<f64>,
    /// Pixel areas, m².
    pub pix_area: Array1<f64>,
    /// Rotation of the camera with respect to the telescope frame, rad.
    pub cam_rotation: f64,
}

/// Everything the fitter needs to know about one telescope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelescopeDescription {
    pub optics: OpticsDescription,
    pub camera: CameraGeometry,
}

impl TelescopeDescription {
    pub fn n_pixels(&self) -> usize {
        self.camera.pix_x.len()
    }

    /// Pixel angular positions in the telescope-pointing frame, rad.
    ///
    /// The camera rotation is removed and positions are projected through
    /// the equivalent focal length in the small-angle approximation.
    pub fn pixel_positions(&self) -> (Array1<f64>, Array1<f64>) {
        let focal_length = self.optics.equivalent_focal_length;
        let (sin_rot, cos_rot) = self.camera.cam_rotation.sin_cos();
        let lon = Zip::from(&self.camera.pix_x)
            .and(&self.camera.pix_y)
            .map_collect(|&x, &y| (x * cos_rot - y * sin_rot) / focal_length);
        let lat = Zip::from(&self.camera.pix_x)
            .and(&self.camera.pix_y)
            .map_collect(|&x, &y| (x * sin_rot + y * cos_rot) / focal_length);
        (lon, lat)
    }

    /// Angular radius of the circle with the same area as pixel 0, rad.
    ///
    /// Pixels are assumed uniform across the camera.
    pub fn pixel_angular_radius(&self) -> f64 {
        (self.camera.pix_area[0] / PI).sqrt() / self.optics.equivalent_focal_length
    }

    /// Equivalent circular angular diameter of pixel 0, rad.
    pub fn pixel_diameter(&self) -> f64 {
        2.0 * self.pixel_angular_radius()
    }
}

/// Named optics classes with known reflector hole radii.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum OpticsClass {
    Lst,
    Mst,
    Sst1M,
}

impl OpticsClass {
    /// Radius of the central hole of the reflector, m.
    pub fn hole_radius(self) -> f64 {
        match self {
            Self::Lst => 0.308,
            Self::Mst => 0.244,
            Self::Sst1M => 0.130,
        }
    }
}

/// Per-telescope tunables of the intensity fit.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct TelescopeConfig {
    /// Width of the single photoelectron distribution.
    pub spe_width: NotNan<f64>,
    /// Lower edge of the Cherenkov wavelength band, m.
    pub min_lambda: NotNan<f64>,
    /// Upper edge of the Cherenkov wavelength band, m.
    pub max_lambda: NotNan<f64>,
    /// Radius of the central hole of the reflector, m.
    pub hole_radius: NotNan<f64>,
    /// Oversampling factor of the azimuthal line integration.
    pub oversampling: u32,
}

impl TelescopeConfig {
    #[inline]
    pub fn default_spe_width() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_min_lambda() -> f64 {
        300e-9
    }

    #[inline]
    pub fn default_max_lambda() -> f64 {
        600e-9
    }

    #[inline]
    pub fn default_hole_radius() -> f64 {
        0.0
    }

    #[inline]
    pub fn default_oversampling() -> u32 {
        3
    }

    /// Defaults with the hole radius preset of the given optics class.
    pub fn for_optics_class(class: OpticsClass) -> Self {
        Self {
            hole_radius: NotNan::new(class.hole_radius()).expect("hole radius presets are finite"),
            ..Self::default()
        }
    }
}

impl Default for TelescopeConfig {
    fn default() -> Self {
        Self {
            spe_width: NotNan::new(Self::default_spe_width()).expect("default is finite"),
            min_lambda: NotNan::new(Self::default_min_lambda()).expect("default is finite"),
            max_lambda: NotNan::new(Self::default_max_lambda()).expect("default is finite"),
            hole_radius: NotNan::new(Self::default_hole_radius()).expect("default is finite"),
            oversampling: Self::default_oversampling(),
        }
    }
}
