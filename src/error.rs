/// Error returned from [crate::MuonIntensityFitter::fit]
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FitError {
    #[error("telescope {tel_id} has {num_mirrors} mirrors, only single-mirror optics are supported")]
    UnsupportedOptics { tel_id: usize, num_mirrors: u32 },

    #[error("no telescope registered under id {0}")]
    UnknownTelescope(usize),

    #[error("{name} has length {actual}, the camera has {expected} pixels")]
    PixelCountMismatch {
        name: &'static str,
        actual: usize,
        expected: usize,
    },

    #[error("telescope {tel_id} camera has no pixels")]
    EmptyCamera { tel_id: usize },

    #[error(
        "ring radius {radius} rad and pixel diameter {pixel_diameter} rad \
         leave no room for azimuthal profile samples"
    )]
    EmptyProfile { radius: f64, pixel_diameter: f64 },

    #[error("minimizer did not reach its tolerances within {niterations} evaluations")]
    NotConverged { niterations: u32 },
}
