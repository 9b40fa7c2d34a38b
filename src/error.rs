use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems. The process cannot produce trustworthy geometry after one of
/// these, so callers are expected to stop.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("image size must be non-zero, got {width}x{height}")]
    ImageSize { width: u32, height: u32 },
    #[error("intrinsic matrix K must have 9 elements, got {0}")]
    IntrinsicsShape(usize),
    #[error("intrinsic matrix K is not invertible")]
    SingularIntrinsics,
    #[error("projection matrix P must have 12 elements, got {0}")]
    ProjectionShape(usize),
    #[error("distortion model `{model}` does not accept {len} coefficients")]
    DistortionShape { model: String, len: usize },
    #[error("unsupported distortion model `{0}`")]
    UnknownDistortionModel(String),
    #[error("homography must have 9 elements, got {0}")]
    HomographyShape(usize),
    #[error("homography contains non-finite values")]
    NonFiniteHomography,
    #[error(
        "found no extrinsic calibration for robot `{robot}` (tried {} and {})",
        robot_path.display(),
        default_path.display()
    )]
    CalibrationMissing {
        robot: String,
        robot_path: PathBuf,
        default_path: PathBuf,
    },
    #[error("cannot read calibration file {}", path.display())]
    CalibrationRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("error in parsing calibration file {}", path.display())]
    CalibrationParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Per-point failures. These drop a single segment, never a frame.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProjectionError {
    #[error("ray ({x:.4}, {y:.4}) does not intersect the ground plane")]
    Unprojectable { x: f64, y: f64 },
    #[error("rectification of pixel ({x:.1}, {y:.1}) did not converge")]
    RectificationFailed { x: f64, y: f64 },
}

/// Projection was requested before the first camera info message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("waiting for camera info")]
pub struct NotReady;
