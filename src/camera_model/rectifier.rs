use std::sync::OnceLock;

use image::DynamicImage;
use nalgebra as na;
use rayon::prelude::*;

use super::distortion::{Distortion, UndistortConfig};
use crate::types::Pixel;

/// Lookup tables of a full-image rectification: for every rectified output pixel, the
/// position to sample in the raw image. `NaN` marks pixels without a source.
#[derive(Debug, Clone)]
pub struct UndistortMap {
    pub xmap: na::DMatrix<f32>,
    pub ymap: na::DMatrix<f32>,
}

/// Removes lens distortion, keeping the intrinsic matrix unchanged.
#[derive(Debug)]
pub struct Rectifier {
    k: na::Matrix3<f64>,
    k_inv: na::Matrix3<f64>,
    distortion: Distortion,
    config: UndistortConfig,
    width: u32,
    height: u32,
    map: OnceLock<UndistortMap>,
}

impl Rectifier {
    pub(crate) fn new(
        k: na::Matrix3<f64>,
        k_inv: na::Matrix3<f64>,
        distortion: Distortion,
        config: UndistortConfig,
        width: u32,
        height: u32,
    ) -> Rectifier {
        Rectifier {
            k,
            k_inv,
            distortion,
            config,
            width,
            height,
            map: OnceLock::new(),
        }
    }

    pub fn distortion(&self) -> &Distortion {
        &self.distortion
    }

    pub fn config(&self) -> &UndistortConfig {
        &self.config
    }

    /// Raw pixel to ideal pinhole pixel. Returns a `NaN` pixel when the inversion diverges,
    /// which only happens far outside the image.
    pub fn rectify_pixel(&self, pixel: Pixel) -> Pixel {
        if self.distortion.is_identity() {
            return pixel;
        }
        let xd = self.normalize(pixel);
        match self.distortion.undistort(xd, &self.config) {
            Some(xn) => self.denormalize(xn),
            None => Pixel::new(f64::NAN, f64::NAN),
        }
    }

    /// Ideal pinhole pixel to raw pixel.
    pub fn distort_pixel(&self, pixel: Pixel) -> Pixel {
        if self.distortion.is_identity() {
            return pixel;
        }
        let xn = self.normalize(pixel);
        self.denormalize(self.distortion.distort(xn))
    }

    fn normalize(&self, pixel: Pixel) -> [f64; 2] {
        let v = self.k_inv * na::Vector3::new(pixel.x, pixel.y, 1.0);
        [v.x / v.z, v.y / v.z]
    }

    fn denormalize(&self, xn: [f64; 2]) -> Pixel {
        let v = self.k * na::Vector3::new(xn[0], xn[1], 1.0);
        Pixel::new(v.x / v.z, v.y / v.z)
    }

    /// Per-pixel tables for [`Rectifier::rectify_image`], built on first use.
    pub fn undistort_map(&self) -> &UndistortMap {
        self.map.get_or_init(|| {
            log::debug!(
                "building {}x{} undistort map",
                self.width,
                self.height
            );
            init_undistort_map(self, self.width, self.height)
        })
    }

    pub fn rectify_image(&self, img: &DynamicImage) -> DynamicImage {
        let map = self.undistort_map();
        remap(img, &map.xmap, &map.ymap)
    }
}

fn init_undistort_map(rectifier: &Rectifier, width: u32, height: u32) -> UndistortMap {
    let (xvec, yvec): (Vec<f32>, Vec<f32>) = (0..height)
        .into_par_iter()
        .flat_map_iter(|y| {
            (0..width).map(move |x| {
                let src = rectifier.distort_pixel(Pixel::new(x as f64, y as f64));
                if src.is_finite() {
                    (src.x as f32, src.y as f32)
                } else {
                    (f32::NAN, f32::NAN)
                }
            })
        })
        .unzip();
    UndistortMap {
        xmap: na::DMatrix::from_row_slice(height as usize, width as usize, &xvec),
        ymap: na::DMatrix::from_row_slice(height as usize, width as usize, &yvec),
    }
}

fn sample(x: f32, y: f32, width: u32, height: u32) -> Option<(u32, u32)> {
    if x.is_nan() || y.is_nan() {
        return None;
    }
    let (x, y) = (x.round(), y.round());
    if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
        None
    } else {
        Some((x as u32, y as u32))
    }
}

/// Nearest-neighbour remap. Images that are neither gray nor RGB are converted to RGB first.
pub fn remap(src: &DynamicImage, map0: &na::DMatrix<f32>, map1: &na::DMatrix<f32>) -> DynamicImage {
    let (r, c) = map0.shape();
    match src {
        DynamicImage::ImageLuma8(img) => {
            let out_img = image::GrayImage::from_par_fn(c as u32, r as u32, |x, y| {
                let idx = (y as usize, x as usize);
                match sample(map0[idx], map1[idx], img.width(), img.height()) {
                    Some((sx, sy)) => *img.get_pixel(sx, sy),
                    None => image::Luma([0]),
                }
            });
            DynamicImage::ImageLuma8(out_img)
        }
        DynamicImage::ImageRgb8(img) => {
            let out_img = image::RgbImage::from_par_fn(c as u32, r as u32, |x, y| {
                let idx = (y as usize, x as usize);
                match sample(map0[idx], map1[idx], img.width(), img.height()) {
                    Some((sx, sy)) => *img.get_pixel(sx, sy),
                    None => image::Rgb([0, 0, 0]),
                }
            });
            DynamicImage::ImageRgb8(out_img)
        }
        other => {
            log::trace!("remap converts {:?} to rgb8", other.color());
            remap(&DynamicImage::ImageRgb8(other.to_rgb8()), map0, map1)
        }
    }
}
