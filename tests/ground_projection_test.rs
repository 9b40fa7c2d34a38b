mod common;

use std::sync::Arc;

use common::*;
use ground_projection::ProjectionError;
use ground_projection::camera_model::{CameraModel, Distortion};
use ground_projection::ground_projection::GroundProjector;
use ground_projection::types::{GroundPoint, NormalizedImagePoint, Pixel};

#[test]
fn test_ray_parallel_to_ground_is_unprojectable() {
    let projector = projector();
    for u in [-1.0, 0.0, 0.3, 2.0] {
        let result = projector.ray_to_ground(NormalizedImagePoint::new(u, 0.0));
        assert!(
            matches!(result, Err(ProjectionError::Unprojectable { .. })),
            "u = {}: {:?}",
            u,
            result
        );
    }
}

#[test]
fn test_ray_below_horizon_hits_ground() {
    let projector = projector();
    let p = projector
        .ray_to_ground(NormalizedImagePoint::new(0.0, 0.5))
        .unwrap();
    assert!((p.x - 2.0 * CAMERA_HEIGHT).abs() < 1e-12);
    assert!(p.y.abs() < 1e-12);
    assert_eq!(p.z, 0.0);

    // right of the optical axis is negative lateral
    let p = projector
        .ray_to_ground(NormalizedImagePoint::new(0.5, 0.5))
        .unwrap();
    assert!((p.y + CAMERA_HEIGHT).abs() < 1e-12);
}

#[test]
fn test_pixel_to_ground_chain() {
    let projector = projector();
    let p = projector.pixel_to_ground(Pixel::new(480.0, 400.0)).unwrap();
    assert!((p.x - 0.2).abs() < 1e-9);
    assert!((p.y + 0.1).abs() < 1e-9);
}

#[test]
fn test_horizon_row_is_unprojectable() {
    let projector = projector();
    let result = projector.pixel_to_ground(Pixel::new(100.0, CY));
    assert!(matches!(result, Err(ProjectionError::Unprojectable { .. })));
}

#[test]
fn test_pixels_above_horizon_are_unprojectable() {
    let projector = projector();
    for pixel in [
        Pixel::new(320.0, 100.0),
        Pixel::new(0.0, 0.0),
        Pixel::new(639.0, CY - 1.0),
    ] {
        let result = projector.pixel_to_ground(pixel);
        assert!(
            matches!(result, Err(ProjectionError::Unprojectable { .. })),
            "{:?}: {:?}",
            pixel,
            result
        );
    }
    let result = projector.ray_to_ground(NormalizedImagePoint::new(0.0, -0.5));
    assert!(matches!(result, Err(ProjectionError::Unprojectable { .. })));
}

#[test]
fn test_horizon_side_follows_homography_scale() {
    // same geometry, homography scaled by -1
    let camera = CameraModel::new(WIDTH, HEIGHT, &k(), Distortion::none(), &p(), -homography())
        .unwrap();
    let projector = GroundProjector::new(Arc::new(camera));

    let p = projector
        .ray_to_ground(NormalizedImagePoint::new(0.0, 0.5))
        .unwrap();
    assert!((p.x - 2.0 * CAMERA_HEIGHT).abs() < 1e-12);
    assert!(projector
        .ray_to_ground(NormalizedImagePoint::new(0.0, -0.5))
        .is_err());
}

#[test]
fn test_non_finite_ray_is_unprojectable() {
    let projector = projector();
    let result = projector.ray_to_ground(NormalizedImagePoint::new(f64::NAN, 0.5));
    assert!(result.is_err());
}

#[test]
fn test_ground_to_pixel_inverts_pixel_to_ground() {
    let camera = Arc::new(camera(plumb_bob()));
    let projector = GroundProjector::new(camera);
    for pixel in [
        Pixel::new(320.0, 400.0),
        Pixel::new(50.0, 470.0),
        Pixel::new(610.0, 300.0),
    ] {
        let ground = projector.pixel_to_ground(pixel).unwrap();
        let back = projector.ground_to_pixel(ground).unwrap();
        assert!((back.x - pixel.x).abs() < 1e-6, "{:?} vs {:?}", back, pixel);
        assert!((back.y - pixel.y).abs() < 1e-6, "{:?} vs {:?}", back, pixel);
    }
}

#[test]
fn test_ground_to_ray_of_origin_is_at_infinity() {
    // the robot origin lies under the camera, which this homography cannot see
    let projector = projector();
    assert!(projector.ground_to_ray(GroundPoint::new(0.0, 0.0)).is_none());
}

#[test]
fn test_projector_shares_camera() {
    let camera = Arc::new(camera(plumb_bob()));
    let projector = GroundProjector::new(camera.clone());
    assert!(std::ptr::eq(projector.camera(), camera.as_ref()));
    assert_eq!(Arc::strong_count(&camera), 2);
}
