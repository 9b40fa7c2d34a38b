use nalgebra as na;

use super::distortion::{Distortion, UndistortConfig};
use super::rectifier::Rectifier;
use crate::error::ConfigError;
use crate::types::{CameraInfo, NormalizedImagePoint, Pixel};

/// Calibrated camera: intrinsics, lens distortion and the extrinsic ground homography.
///
/// Everything is fixed at construction. The model is shared read-only between frames.
#[derive(Debug)]
pub struct CameraModel {
    width: u32,
    height: u32,
    k: na::Matrix3<f64>,
    k_inv: na::Matrix3<f64>,
    p: na::Matrix3x4<f64>,
    h: na::Matrix3<f64>,
    rectifier: Rectifier,
}

impl CameraModel {
    /// `k` and `p` are row-major, 9 and 12 elements.
    pub fn new(
        width: u32,
        height: u32,
        k: &[f64],
        distortion: Distortion,
        p: &[f64],
        h: na::Matrix3<f64>,
    ) -> Result<CameraModel, ConfigError> {
        Self::with_undistort_config(width, height, k, distortion, p, h, UndistortConfig::default())
    }

    pub fn with_undistort_config(
        width: u32,
        height: u32,
        k: &[f64],
        distortion: Distortion,
        p: &[f64],
        h: na::Matrix3<f64>,
        undistort_config: UndistortConfig,
    ) -> Result<CameraModel, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::ImageSize { width, height });
        }
        if k.len() != 9 {
            return Err(ConfigError::IntrinsicsShape(k.len()));
        }
        if p.len() != 12 {
            return Err(ConfigError::ProjectionShape(p.len()));
        }
        if h.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFiniteHomography);
        }
        let k = na::Matrix3::from_row_slice(k);
        let k_inv = k.try_inverse().ok_or(ConfigError::SingularIntrinsics)?;
        let p = na::Matrix3x4::from_row_slice(p);
        let rectifier = Rectifier::new(k, k_inv, distortion, undistort_config, width, height);
        Ok(CameraModel {
            width,
            height,
            k,
            k_inv,
            p,
            h,
            rectifier,
        })
    }

    pub fn from_camera_info(info: &CameraInfo, h: na::Matrix3<f64>) -> Result<CameraModel, ConfigError> {
        let distortion = Distortion::from_camera_info(&info.distortion_model, &info.d)?;
        Self::new(info.width, info.height, &info.k, distortion, &info.p, h)
    }

    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn k(&self) -> &na::Matrix3<f64> {
        &self.k
    }
    pub fn p(&self) -> &na::Matrix3x4<f64> {
        &self.p
    }
    pub fn h(&self) -> &na::Matrix3<f64> {
        &self.h
    }
    pub fn distortion(&self) -> &Distortion {
        self.rectifier.distortion()
    }
    pub fn rectifier(&self) -> &Rectifier {
        &self.rectifier
    }

    pub fn rectify(&self, pixel: Pixel) -> Pixel {
        self.rectifier.rectify_pixel(pixel)
    }

    pub fn distort(&self, pixel: Pixel) -> Pixel {
        self.rectifier.distort_pixel(pixel)
    }

    /// Rectified pixel to the z = 1 plane.
    pub fn pixel_to_ray(&self, pixel: Pixel) -> NormalizedImagePoint {
        let v = self.k_inv * na::Vector3::new(pixel.x, pixel.y, 1.0);
        NormalizedImagePoint::new(v.x / v.z, v.y / v.z)
    }

    pub fn vector_to_pixel(&self, point: NormalizedImagePoint) -> Pixel {
        let v = self.k * point.homogeneous();
        Pixel::new(v.x / v.z, v.y / v.z)
    }

    /// Scales a coordinate given as a fraction of the image size into pixels.
    pub fn denormalize(&self, pixel: Pixel) -> Pixel {
        Pixel::new(pixel.x * self.width as f64, pixel.y * self.height as f64)
    }
}
