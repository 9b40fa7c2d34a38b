use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::ground_projection::GroundProjector;
use crate::types::{GroundPoint, Pixel, Segment, SegmentList};

/// Units of the incoming segment endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelUnits {
    /// Raw image pixels.
    #[default]
    Absolute,
    /// Fractions of the image width and height.
    Normalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub units: PixelUnits,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DroppedSegment {
    /// Position in the input list.
    pub index: usize,
    pub error: ProjectionError,
}

/// Ground segments of one frame plus the input segments that could not be projected.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedSegments {
    pub segments: SegmentList<GroundPoint>,
    pub dropped: Vec<DroppedSegment>,
}

/// Rectify, normalize and ground-project both endpoints, keeping the color.
pub fn project_segment(
    projector: &GroundProjector,
    segment: &Segment<Pixel>,
    units: PixelUnits,
) -> Result<Segment<GroundPoint>, ProjectionError> {
    let camera = projector.camera();
    let to_ground = |pixel: Pixel| {
        let pixel = match units {
            PixelUnits::Absolute => pixel,
            PixelUnits::Normalized => camera.denormalize(pixel),
        };
        projector.pixel_to_ground(pixel)
    };
    let p0 = to_ground(segment.points[0])?;
    let p1 = to_ground(segment.points[1])?;
    Ok(Segment::new(segment.color, p0, p1))
}

/// Projects a whole frame. Output keeps the input order with unprojectable segments left out.
pub fn project_segment_list(
    projector: &GroundProjector,
    list: &SegmentList<Pixel>,
    config: &PipelineConfig,
) -> ProjectedSegments {
    let results: Vec<_> = list
        .segments
        .par_iter()
        .map(|segment| project_segment(projector, segment, config.units))
        .collect();

    let mut segments = Vec::with_capacity(results.len());
    let mut dropped = Vec::new();
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(segment) => segments.push(segment),
            Err(error) => {
                log::debug!("dropping segment {} of frame {}: {}", index, list.header.seq, error);
                dropped.push(DroppedSegment { index, error });
            }
        }
    }
    ProjectedSegments {
        segments: SegmentList::new(list.header.clone(), segments),
        dropped,
    }
}
