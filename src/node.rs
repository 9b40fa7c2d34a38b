use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use image::RgbImage;
use nalgebra as na;

use crate::calibration::CalibrationLoader;
use crate::error::{ConfigError, NotReady};
use crate::pipeline::{DroppedSegment, PipelineConfig, project_segment_list};
use crate::state::{CalibrationLatch, CalibrationState, LatchOutcome};
use crate::types::{CameraInfo, GroundPoint, Pixel, SegmentList};
use crate::visualization::{DebugImageConfig, DebugVisualizer};

/// Result of one segment list.
#[derive(Debug, Clone)]
pub struct ProcessedFrame {
    pub segments: SegmentList<GroundPoint>,
    pub dropped: Vec<DroppedSegment>,
    /// Present only while someone holds a [`DebugSubscription`].
    pub debug_image: Option<RgbImage>,
}

/// Keeps debug rendering enabled while alive.
#[derive(Debug)]
pub struct DebugSubscription {
    consumers: Arc<AtomicUsize>,
}

impl Drop for DebugSubscription {
    fn drop(&mut self) {
        self.consumers.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Glue between the camera info feed, the segment feed and the projection pipeline.
///
/// Both callbacks take `&self` and may run on different threads.
#[derive(Debug)]
pub struct GroundProjectionNode {
    latch: CalibrationLatch,
    pipeline: PipelineConfig,
    visualizer: DebugVisualizer,
    debug_consumers: Arc<AtomicUsize>,
    first_processing_done: AtomicBool,
}

impl GroundProjectionNode {
    pub fn new(
        homography: na::Matrix3<f64>,
        pipeline: PipelineConfig,
        debug: DebugImageConfig,
    ) -> GroundProjectionNode {
        GroundProjectionNode {
            latch: CalibrationLatch::new(homography),
            pipeline,
            visualizer: DebugVisualizer::new(debug),
            debug_consumers: Arc::new(AtomicUsize::new(0)),
            first_processing_done: AtomicBool::new(false),
        }
    }

    /// Loads the robot's homography. Fails if neither the robot file nor the default exists.
    pub fn from_calibration(
        loader: &CalibrationLoader,
        robot: &str,
        pipeline: PipelineConfig,
        debug: DebugImageConfig,
    ) -> Result<GroundProjectionNode, ConfigError> {
        let calibration = loader.load(robot)?;
        Ok(Self::new(calibration.homography, pipeline, debug))
    }

    pub fn latch(&self) -> &CalibrationLatch {
        &self.latch
    }

    pub fn state(&self) -> CalibrationState<'_> {
        self.latch.state()
    }

    pub fn visualizer(&self) -> &DebugVisualizer {
        &self.visualizer
    }

    pub fn on_camera_info(&self, info: &CameraInfo) -> Result<LatchOutcome, ConfigError> {
        self.latch.on_camera_info(info)
    }

    pub fn subscribe_debug(&self) -> DebugSubscription {
        self.debug_consumers.fetch_add(1, Ordering::AcqRel);
        DebugSubscription {
            consumers: self.debug_consumers.clone(),
        }
    }

    pub fn debug_consumers(&self) -> usize {
        self.debug_consumers.load(Ordering::Acquire)
    }

    /// Projects one frame, or reports [`NotReady`] before the first camera info. The caller
    /// decides whether to hold or drop the frame.
    pub fn on_segment_list(&self, list: &SegmentList<Pixel>) -> Result<ProcessedFrame, NotReady> {
        let projector = match self.latch.projector() {
            Ok(projector) => projector,
            Err(not_ready) => {
                log::debug!("Waiting for a CameraInfo message");
                return Err(not_ready);
            }
        };
        let projected = project_segment_list(projector, list, &self.pipeline);

        if !self.first_processing_done.swap(true, Ordering::AcqRel) {
            log::info!("First projected segments published.");
        }

        let debug_image = (self.debug_consumers() > 0)
            .then(|| self.visualizer.render(&projected.segments));

        Ok(ProcessedFrame {
            segments: projected.segments,
            dropped: projected.dropped,
            debug_image,
        })
    }
}
