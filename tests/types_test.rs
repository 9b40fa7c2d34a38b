use ground_projection::types::{
    CameraInfo, GroundPoint, Pixel, RawSegmentList, Segment, SegmentColor, SegmentList,
};

#[test]
fn test_flat_endpoints_are_split_in_order() {
    let segment = Segment::<Pixel>::from_flat(SegmentColor::Red, [1.0, 2.0, 3.0, 4.0]);
    assert_eq!(segment.points[0], Pixel::new(1.0, 2.0));
    assert_eq!(segment.points[1], Pixel::new(3.0, 4.0));
    assert_eq!(segment.color, SegmentColor::Red);
}

#[test]
fn test_color_codes() {
    assert_eq!(SegmentColor::from(0), SegmentColor::White);
    assert_eq!(SegmentColor::from(1), SegmentColor::Yellow);
    assert_eq!(SegmentColor::from(2), SegmentColor::Red);
    assert_eq!(SegmentColor::from(17), SegmentColor::Other(17));
    assert_eq!(u8::from(SegmentColor::Other(17)), 17);
}

#[test]
fn test_segment_list_wire_format() {
    let json = r#"{
        "header": {"seq": 3, "stamp_ns": 99, "frame_id": "cam"},
        "segments": [
            {"color": 1, "pixels": [10.0, 20.0, 30.0, 40.0]},
            {"color": 5, "pixels": [0.0, 0.0, 1.0, 1.0]}
        ]
    }"#;
    let raw: RawSegmentList = serde_json::from_str(json).unwrap();
    let list = SegmentList::<Pixel>::from(raw);
    assert_eq!(list.header.seq, 3);
    assert_eq!(list.len(), 2);
    assert_eq!(list.segments[0].color, SegmentColor::Yellow);
    assert_eq!(list.segments[0].points[1], Pixel::new(30.0, 40.0));
    assert_eq!(list.segments[1].color, SegmentColor::Other(5));
}

#[test]
fn test_ground_segments_serialize_with_z() {
    let list = SegmentList::new(
        Default::default(),
        vec![Segment::new(
            SegmentColor::White,
            GroundPoint::new(0.1, -0.2),
            GroundPoint::new(0.3, 0.0),
        )],
    );
    let value = serde_json::to_value(&list).unwrap();
    assert_eq!(value["segments"][0]["color"], 0);
    assert_eq!(value["segments"][0]["points"][0]["z"], 0.0);
    assert_eq!(value["segments"][0]["points"][1]["x"], 0.3);
}

#[test]
fn test_camera_info_defaults() {
    let json = r#"{"width": 640, "height": 480,
        "k": [1, 0, 0, 0, 1, 0, 0, 0, 1],
        "p": [1, 0, 0, 0, 0, 1, 0, 0, 0, 0, 1, 0]}"#;
    let info: CameraInfo = serde_json::from_str(json).unwrap();
    assert_eq!(info.distortion_model, "plumb_bob");
    assert!(info.d.is_empty());
}
