#![allow(dead_code)]

use std::sync::Arc;

use ground_projection::camera_model::{CameraModel, Distortion};
use ground_projection::ground_projection::GroundProjector;
use ground_projection::types::CameraInfo;
use nalgebra as na;

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;
pub const F: f64 = 320.0;
pub const CX: f64 = 320.0;
pub const CY: f64 = 240.0;
pub const CAMERA_HEIGHT: f64 = 0.1;

pub fn k() -> Vec<f64> {
    vec![F, 0.0, CX, 0.0, F, CY, 0.0, 0.0, 1.0]
}

pub fn p() -> Vec<f64> {
    vec![F, 0.0, CX, 0.0, 0.0, F, CY, 0.0, 0.0, 0.0, 1.0, 0.0]
}

/// Camera looking straight ahead, `CAMERA_HEIGHT` above the floor. A ray (u, v, 1) hits the
/// ground at forward h / v, lateral -h u / v; the horizon is v = 0.
pub fn homography() -> na::Matrix3<f64> {
    let h = CAMERA_HEIGHT;
    na::Matrix3::new(0.0, 0.0, h, -h, 0.0, 0.0, 0.0, 1.0, 0.0)
}

pub fn camera_info(d: Vec<f64>) -> CameraInfo {
    CameraInfo {
        width: WIDTH,
        height: HEIGHT,
        distortion_model: "plumb_bob".to_string(),
        d,
        k: k(),
        p: p(),
    }
}

pub fn camera(distortion: Distortion) -> CameraModel {
    CameraModel::new(WIDTH, HEIGHT, &k(), distortion, &p(), homography()).expect("valid camera")
}

pub fn projector() -> GroundProjector {
    GroundProjector::new(Arc::new(camera(Distortion::none())))
}

pub fn plumb_bob() -> Distortion {
    Distortion::from_camera_info("plumb_bob", &[-0.2, 0.04, 0.001, -0.001, 0.0]).expect("plumb_bob")
}
