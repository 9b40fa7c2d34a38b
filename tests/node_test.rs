mod common;

use common::*;
use ground_projection::NotReady;
use ground_projection::calibration::CalibrationLoader;
use ground_projection::node::GroundProjectionNode;
use ground_projection::pipeline::PipelineConfig;
use ground_projection::state::{CalibrationState, LatchOutcome};
use ground_projection::types::{Header, Pixel, Segment, SegmentColor, SegmentList};
use ground_projection::visualization::DebugImageConfig;
use rayon::prelude::*;

fn node() -> GroundProjectionNode {
    GroundProjectionNode::new(homography(), PipelineConfig::default(), DebugImageConfig::default())
}

fn frame(seq: u32) -> SegmentList<Pixel> {
    SegmentList::new(
        Header {
            seq,
            stamp_ns: seq as i64 * 33_000_000,
            frame_id: String::new(),
        },
        vec![
            Segment::new(SegmentColor::White, Pixel::new(100.0, 400.0), Pixel::new(200.0, 380.0)),
            Segment::new(SegmentColor::Yellow, Pixel::new(400.0, 460.0), Pixel::new(420.0, 440.0)),
        ],
    )
}

#[test]
fn test_not_ready_before_camera_info() {
    let node = node();
    assert!(matches!(node.state(), CalibrationState::AwaitingCalibration));
    assert_eq!(node.on_segment_list(&frame(0)).unwrap_err(), NotReady);

    assert_eq!(
        node.on_camera_info(&camera_info(vec![])).unwrap(),
        LatchOutcome::Initialized
    );
    let out = node.on_segment_list(&frame(1)).unwrap();
    assert_eq!(out.segments.len(), 2);
    assert_eq!(out.segments.header.seq, 1);
    assert!(out.dropped.is_empty());
}

#[test]
fn test_debug_image_only_with_consumer() {
    let node = node();
    node.on_camera_info(&camera_info(vec![])).unwrap();
    assert!(node.on_segment_list(&frame(0)).unwrap().debug_image.is_none());

    let subscription = node.subscribe_debug();
    assert_eq!(node.debug_consumers(), 1);
    let with_debug = node.on_segment_list(&frame(1)).unwrap();
    let image = with_debug.debug_image.as_ref().unwrap();
    assert_eq!(image.dimensions(), (400, 400));

    drop(subscription);
    assert_eq!(node.debug_consumers(), 0);
    let without = node.on_segment_list(&frame(2)).unwrap();
    assert!(without.debug_image.is_none());
    // debug rendering never changes the projected segments
    assert_eq!(with_debug.segments.segments, without.segments.segments);
}

#[test]
fn test_frames_in_parallel() {
    let node = node();
    node.on_camera_info(&camera_info(vec![-0.2, 0.04, 0.001, -0.001, 0.0]))
        .unwrap();
    let outputs: Vec<_> = (0..64u32)
        .into_par_iter()
        .map(|seq| node.on_segment_list(&frame(seq)).unwrap())
        .collect();
    for (seq, out) in outputs.iter().enumerate() {
        assert_eq!(out.segments.header.seq, seq as u32);
        assert_eq!(out.segments.segments, outputs[0].segments.segments);
    }
}

#[test]
fn test_from_calibration_without_files_fails() {
    let dir = tempfile::tempdir().unwrap();
    let loader = CalibrationLoader::new(dir.path());
    let result = GroundProjectionNode::from_calibration(
        &loader,
        "nobody",
        PipelineConfig::default(),
        DebugImageConfig::default(),
    );
    assert!(result.is_err());
}

#[test]
fn test_from_calibration_with_default() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("default.yaml"),
        "homography: [0.0, 0.0, 0.1, -0.1, 0.0, 0.0, 0.0, 1.0, 0.0]\n",
    )
    .unwrap();
    let loader = CalibrationLoader::new(dir.path());
    let node = GroundProjectionNode::from_calibration(
        &loader,
        "somebody",
        PipelineConfig::default(),
        DebugImageConfig::default(),
    )
    .unwrap();
    assert_eq!(node.latch().homography(), &homography());
}
