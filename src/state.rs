use std::sync::{Arc, OnceLock};

use nalgebra as na;

use crate::camera_model::{CameraModel, Distortion, UndistortConfig};
use crate::error::{ConfigError, NotReady};
use crate::ground_projection::GroundProjector;
use crate::types::CameraInfo;

/// Readiness of the projection chain.
#[derive(Debug, Clone, Copy)]
pub enum CalibrationState<'a> {
    AwaitingCalibration,
    Ready(&'a GroundProjector),
}

/// What a camera info message did to the latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchOutcome {
    /// The camera model was built from this message.
    Initialized,
    /// The model already existed; the message was ignored.
    AlreadyReady,
}

/// One-way switch from awaiting calibration to ready.
///
/// The camera model and ground projector are built from the first valid camera info and are
/// never rebuilt, so readers can hold `&GroundProjector` without locking.
#[derive(Debug)]
pub struct CalibrationLatch {
    homography: na::Matrix3<f64>,
    undistort_config: UndistortConfig,
    projector: OnceLock<GroundProjector>,
}

impl CalibrationLatch {
    pub fn new(homography: na::Matrix3<f64>) -> CalibrationLatch {
        Self::with_undistort_config(homography, UndistortConfig::default())
    }

    pub fn with_undistort_config(
        homography: na::Matrix3<f64>,
        undistort_config: UndistortConfig,
    ) -> CalibrationLatch {
        CalibrationLatch {
            homography,
            undistort_config,
            projector: OnceLock::new(),
        }
    }

    pub fn homography(&self) -> &na::Matrix3<f64> {
        &self.homography
    }

    /// A malformed first message is a configuration error. Once ready, every further message
    /// is ignored without being inspected.
    pub fn on_camera_info(&self, info: &CameraInfo) -> Result<LatchOutcome, ConfigError> {
        if self.projector.get().is_some() {
            log::trace!("camera model already initialized, ignoring camera info");
            return Ok(LatchOutcome::AlreadyReady);
        }
        let distortion = Distortion::from_camera_info(&info.distortion_model, &info.d)?;
        let camera = CameraModel::with_undistort_config(
            info.width,
            info.height,
            &info.k,
            distortion,
            &info.p,
            self.homography,
            self.undistort_config,
        )?;
        match self.projector.set(GroundProjector::new(Arc::new(camera))) {
            Ok(()) => {
                log::info!(
                    "camera model initialized ({}x{}, {})",
                    info.width,
                    info.height,
                    info.distortion_model
                );
                Ok(LatchOutcome::Initialized)
            }
            // another thread won the race; its model stays
            Err(_) => Ok(LatchOutcome::AlreadyReady),
        }
    }

    pub fn state(&self) -> CalibrationState<'_> {
        match self.projector.get() {
            Some(projector) => CalibrationState::Ready(projector),
            None => CalibrationState::AwaitingCalibration,
        }
    }

    pub fn projector(&self) -> Result<&GroundProjector, NotReady> {
        self.projector.get().ok_or(NotReady)
    }

    pub fn is_ready(&self) -> bool {
        self.projector.get().is_some()
    }
}
