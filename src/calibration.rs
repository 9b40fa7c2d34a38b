use std::path::{Path, PathBuf};

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CALIBRATION_ROOT: &str = "/data/config/calibrations/camera_extrinsic/";
pub const DEFAULT_CALIBRATION_NAME: &str = "default";

/// Extrinsic calibration file contents. Only the homography is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtrinsicCalibration {
    /// Row-major 3x3, normalized image coordinates to ground coordinates.
    pub homography: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationSource {
    Robot,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadedCalibration {
    pub homography: na::Matrix3<f64>,
    pub source: CalibrationSource,
    pub path: PathBuf,
}

/// Resolves `<root>/<robot>.yaml`, falling back to `<root>/default.yaml`.
#[derive(Debug, Clone)]
pub struct CalibrationLoader {
    root: PathBuf,
}

impl Default for CalibrationLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CALIBRATION_ROOT)
    }
}

impl CalibrationLoader {
    pub fn new(root: impl Into<PathBuf>) -> CalibrationLoader {
        CalibrationLoader { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `robot` may be a namespace such as `/duckie01/`.
    pub fn robot_path(&self, robot: &str) -> PathBuf {
        self.root.join(format!("{}.yaml", robot.trim_matches('/')))
    }

    pub fn default_path(&self) -> PathBuf {
        self.root.join(format!("{}.yaml", DEFAULT_CALIBRATION_NAME))
    }

    pub fn resolve(&self, robot: &str) -> Result<(PathBuf, CalibrationSource), ConfigError> {
        let robot_path = self.robot_path(robot);
        if robot_path.is_file() {
            return Ok((robot_path, CalibrationSource::Robot));
        }
        let default_path = self.default_path();
        log::warn!(
            "Can't find calibration file: {}. Using default calibration instead.",
            robot_path.display()
        );
        if default_path.is_file() {
            Ok((default_path, CalibrationSource::Fallback))
        } else {
            log::error!("Found no calibration file for robot `{}`", robot);
            Err(ConfigError::CalibrationMissing {
                robot: robot.to_string(),
                robot_path,
                default_path,
            })
        }
    }

    pub fn load(&self, robot: &str) -> Result<LoadedCalibration, ConfigError> {
        let (path, source) = self.resolve(robot)?;
        let homography = load_homography(&path)?;
        log::info!("loaded extrinsic calibration from {}", path.display());
        Ok(LoadedCalibration {
            homography,
            source,
            path,
        })
    }
}

pub fn load_homography(path: &Path) -> Result<na::Matrix3<f64>, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::CalibrationRead {
        path: path.to_path_buf(),
        source,
    })?;
    let calibration: ExtrinsicCalibration =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::CalibrationParse {
            path: path.to_path_buf(),
            source,
        })?;
    homography_from_row_slice(&calibration.homography)
}

pub fn homography_from_row_slice(values: &[f64]) -> Result<na::Matrix3<f64>, ConfigError> {
    if values.len() != 9 {
        return Err(ConfigError::HomographyShape(values.len()));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::NonFiniteHomography);
    }
    Ok(na::Matrix3::from_row_slice(values))
}
