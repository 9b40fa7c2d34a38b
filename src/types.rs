use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Position in the distorted (raw) image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub x: f64,
    pub y: f64,
}

impl Pixel {
    pub fn new(x: f64, y: f64) -> Pixel {
        Pixel { x, y }
    }
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Point on the z = 1 plane of the camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedImagePoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedImagePoint {
    pub fn new(x: f64, y: f64) -> NormalizedImagePoint {
        NormalizedImagePoint { x, y }
    }
    pub fn homogeneous(&self) -> na::Vector3<f64> {
        na::Vector3::new(self.x, self.y, 1.0)
    }
}

/// Point on the ground plane in the robot frame, meters. x points forward, y to the left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl GroundPoint {
    pub fn new(x: f64, y: f64) -> GroundPoint {
        GroundPoint { x, y, z: 0.0 }
    }
}

/// Color tag attached by the lane detector.
///
/// The wire format is the detector's `u8` code. Codes outside the known set are kept in
/// [`SegmentColor::Other`] so the tag survives projection unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum SegmentColor {
    White,
    Yellow,
    Red,
    Other(u8),
}

impl From<u8> for SegmentColor {
    fn from(code: u8) -> Self {
        match code {
            0 => SegmentColor::White,
            1 => SegmentColor::Yellow,
            2 => SegmentColor::Red,
            other => SegmentColor::Other(other),
        }
    }
}

impl From<SegmentColor> for u8 {
    fn from(color: SegmentColor) -> Self {
        match color {
            SegmentColor::White => 0,
            SegmentColor::Yellow => 1,
            SegmentColor::Red => 2,
            SegmentColor::Other(code) => code,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment<P> {
    pub color: SegmentColor,
    pub points: [P; 2],
}

impl<P> Segment<P> {
    pub fn new(color: SegmentColor, p0: P, p1: P) -> Segment<P> {
        Segment {
            color,
            points: [p0, p1],
        }
    }
}

impl Segment<Pixel> {
    /// Builds a segment from the detector's flat layout `[ax, ay, bx, by]`.
    pub fn from_flat(color: SegmentColor, xy: [f64; 4]) -> Segment<Pixel> {
        Segment::new(color, Pixel::new(xy[0], xy[1]), Pixel::new(xy[2], xy[3]))
    }
}

/// Segment as it arrives from the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    pub color: SegmentColor,
    pub pixels: [f64; 4],
}

impl From<RawSegment> for Segment<Pixel> {
    fn from(raw: RawSegment) -> Self {
        Segment::<Pixel>::from_flat(raw.color, raw.pixels)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub seq: u32,
    #[serde(default)]
    pub stamp_ns: i64,
    #[serde(default)]
    pub frame_id: String,
}

/// All segments detected in one frame, in detector order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentList<P> {
    pub header: Header,
    pub segments: Vec<Segment<P>>,
}

impl<P> SegmentList<P> {
    pub fn new(header: Header, segments: Vec<Segment<P>>) -> SegmentList<P> {
        SegmentList { header, segments }
    }
    pub fn len(&self) -> usize {
        self.segments.len()
    }
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Detector output on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegmentList {
    #[serde(default)]
    pub header: Header,
    pub segments: Vec<RawSegment>,
}

impl From<RawSegmentList> for SegmentList<Pixel> {
    fn from(raw: RawSegmentList) -> Self {
        SegmentList {
            header: raw.header,
            segments: raw.segments.into_iter().map(Segment::from).collect(),
        }
    }
}

/// Camera intrinsics message, laid out like ROS `sensor_msgs/CameraInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_distortion_model")]
    pub distortion_model: String,
    #[serde(default)]
    pub d: Vec<f64>,
    pub k: Vec<f64>,
    pub p: Vec<f64>,
}

fn default_distortion_model() -> String {
    "plumb_bob".to_string()
}
