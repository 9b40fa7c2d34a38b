use std::sync::Arc;

use ground_projection::mailbox::{FrameSlot, LatestSlot};
use ground_projection::visualization::encode_image;

#[test]
fn test_last_write_wins() {
    let slot = LatestSlot::new();
    assert!(slot.latest().is_none());
    assert_eq!(slot.store(1), None);
    assert_eq!(slot.store(2), Some(1));
    assert_eq!(slot.latest(), Some(2));
    assert_eq!(slot.latest(), Some(2));
    assert_eq!(slot.take(), Some(2));
    assert!(slot.is_empty());
}

#[test]
fn test_concurrent_readers_never_see_torn_values() {
    let slot = Arc::new(LatestSlot::new());
    slot.store(vec![0u32; 64]);
    std::thread::scope(|s| {
        let writer = slot.clone();
        s.spawn(move || {
            for i in 1..2000u32 {
                writer.store(vec![i; 64]);
            }
        });
        for _ in 0..4 {
            let reader = slot.clone();
            s.spawn(move || {
                let mut last = 0;
                for _ in 0..2000 {
                    let v = reader.latest().unwrap();
                    assert!(v.iter().all(|x| *x == v[0]));
                    // single writer, so values never go backwards
                    assert!(v[0] >= last);
                    last = v[0];
                }
            });
        }
    });
    assert_eq!(slot.latest().unwrap()[0], 1999);
}

fn png(value: u8) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 3, image::Rgb([value, value, value]));
    encode_image(&img, image::ImageFormat::Png).unwrap()
}

#[test]
fn test_frame_slot_keeps_previous_image_on_decode_failure() {
    let frames = FrameSlot::new();
    assert!(!frames.has_frame());
    assert!(frames.decode_latest().is_none());

    frames.store(png(10));
    let first = frames.decode_latest().unwrap();
    assert_eq!(first.to_rgb8().get_pixel(0, 0)[0], 10);

    frames.store(b"definitely not an image".to_vec());
    let still = frames.decode_latest().unwrap();
    assert!(Arc::ptr_eq(&first, &still));

    frames.store(png(20));
    let newer = frames.decode_latest().unwrap();
    assert_eq!(newer.to_rgb8().get_pixel(0, 0)[0], 20);
}

#[test]
fn test_frame_slot_without_any_good_frame() {
    let frames = FrameSlot::new();
    frames.store(vec![1, 2, 3]);
    assert!(frames.has_frame());
    assert!(frames.decode_latest().is_none());
}
