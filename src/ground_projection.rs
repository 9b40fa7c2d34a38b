use std::sync::Arc;

use nalgebra as na;

use crate::camera_model::CameraModel;
use crate::error::ProjectionError;
use crate::types::{GroundPoint, NormalizedImagePoint, Pixel};

/// Smallest homogeneous scale accepted before a ray counts as parallel to the ground.
const HORIZON_EPS: f64 = 1e-12;

/// Intersects camera rays with the ground plane through the extrinsic homography of the
/// shared [`CameraModel`].
///
/// The homography maps normalized image coordinates straight to ground coordinates, so
/// it already encodes the camera pose and the plane.
#[derive(Debug, Clone)]
pub struct GroundProjector {
    camera: Arc<CameraModel>,
    h_inv: Option<na::Matrix3<f64>>,
    /// Sign of the homogeneous scale for rays below the horizon.
    ground_side: f64,
}

impl GroundProjector {
    pub fn new(camera: Arc<CameraModel>) -> GroundProjector {
        let h_inv = camera.h().try_inverse();
        if h_inv.is_none() {
            log::warn!("homography is singular, ground to image projection is unavailable");
        }
        // the bottom-centre pixel always looks at the floor
        let bottom = camera.pixel_to_ray(Pixel::new(
            camera.width() as f64 / 2.0,
            camera.height() as f64,
        ));
        let w = (camera.h() * bottom.homogeneous()).z;
        let ground_side = if w.is_finite() && w.abs() >= HORIZON_EPS {
            w.signum()
        } else {
            log::warn!("bottom image row does not reach the ground, assuming positive scale");
            1.0
        };
        GroundProjector {
            camera,
            h_inv,
            ground_side,
        }
    }

    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    /// Rays at or above the horizon are [`ProjectionError::Unprojectable`]. Above the horizon
    /// the homography would mirror the point behind the camera.
    pub fn ray_to_ground(&self, ray: NormalizedImagePoint) -> Result<GroundPoint, ProjectionError> {
        let g = self.camera.h() * ray.homogeneous();
        let unprojectable = ProjectionError::Unprojectable { x: ray.x, y: ray.y };
        if !g.z.is_finite() || g.z * self.ground_side < HORIZON_EPS {
            return Err(unprojectable);
        }
        let point = GroundPoint::new(g.x / g.z, g.y / g.z);
        if point.x.is_finite() && point.y.is_finite() {
            Ok(point)
        } else {
            Err(unprojectable)
        }
    }

    /// Inverse of [`GroundProjector::ray_to_ground`]. `None` for a singular homography or a
    /// ground point that maps to infinity.
    pub fn ground_to_ray(&self, point: GroundPoint) -> Option<NormalizedImagePoint> {
        let v = self.h_inv? * na::Vector3::new(point.x, point.y, 1.0);
        if v.z.abs() < HORIZON_EPS {
            return None;
        }
        Some(NormalizedImagePoint::new(v.x / v.z, v.y / v.z))
    }

    /// Full chain from a raw image pixel.
    pub fn pixel_to_ground(&self, pixel: Pixel) -> Result<GroundPoint, ProjectionError> {
        let rectified = self.camera.rectify(pixel);
        if !rectified.is_finite() {
            return Err(ProjectionError::RectificationFailed {
                x: pixel.x,
                y: pixel.y,
            });
        }
        self.ray_to_ground(self.camera.pixel_to_ray(rectified))
    }

    /// Where a ground point appears in the raw image.
    pub fn ground_to_pixel(&self, point: GroundPoint) -> Option<Pixel> {
        let ray = self.ground_to_ray(point)?;
        let pixel = self.camera.distort(self.camera.vector_to_pixel(ray));
        pixel.is_finite().then_some(pixel)
    }
}
