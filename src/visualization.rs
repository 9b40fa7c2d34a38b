use std::io::Cursor;
use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use rerun::RecordingStream;
use serde::{Deserialize, Serialize};

use crate::types::{GroundPoint, Segment, SegmentColor, SegmentList};

const BACKGROUND: Rgb<u8> = Rgb([128, 128, 128]);
const GRID: Rgb<u8> = Rgb([0, 255, 255]);
const ROBOT: Rgb<u8> = Rgb([0, 0, 255]);
const FALLBACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Layout of the top-down debug image.
///
/// With the defaults the canvas covers 1 m x 1 m at 2.5 mm per pixel and the robot sits at
/// row 300, column 200.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebugImageConfig {
    pub size: u32,
    pub pixels_per_meter: f64,
    pub origin_row: i32,
    pub origin_col: i32,
    /// Segments with any endpoint coordinate beyond this many meters are not drawn.
    pub visible_radius: f64,
    pub grid_spacing: f64,
}

impl Default for DebugImageConfig {
    fn default() -> Self {
        Self {
            size: 400,
            pixels_per_meter: 400.0,
            origin_row: 300,
            origin_col: 200,
            visible_radius: 0.5,
            grid_spacing: 0.1,
        }
    }
}

impl DebugImageConfig {
    /// Ground point to `(col, row)` on the canvas. Forward is up, left is left.
    pub fn ground_to_image(&self, point: &GroundPoint) -> (i32, i32) {
        let col = (point.y * -self.pixels_per_meter) as i32 + self.origin_col;
        let row = (point.x * -self.pixels_per_meter) as i32 + self.origin_row;
        (col, row)
    }

    pub fn is_visible(&self, segment: &Segment<GroundPoint>) -> bool {
        segment
            .points
            .iter()
            .all(|p| p.x.abs() <= self.visible_radius && p.y.abs() <= self.visible_radius)
    }
}

pub fn display_color(color: SegmentColor) -> Rgb<u8> {
    match color {
        SegmentColor::White => Rgb([255, 255, 255]),
        SegmentColor::Yellow => Rgb([255, 255, 0]),
        SegmentColor::Red => Rgb([255, 0, 0]),
        _ => FALLBACK,
    }
}

/// Draws ground segments on top of a cached grid so the extrinsic calibration can be
/// checked by eye.
#[derive(Debug, Default)]
pub struct DebugVisualizer {
    config: DebugImageConfig,
    background: OnceLock<RgbImage>,
}

impl DebugVisualizer {
    pub fn new(config: DebugImageConfig) -> DebugVisualizer {
        DebugVisualizer {
            config,
            background: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &DebugImageConfig {
        &self.config
    }

    pub fn background(&self) -> &RgbImage {
        self.background.get_or_init(|| draw_background(&self.config))
    }

    pub fn render(&self, segments: &SegmentList<GroundPoint>) -> RgbImage {
        let mut image = self.background().clone();
        for segment in segments.segments.iter().filter(|s| self.config.is_visible(s)) {
            let (c0, r0) = self.config.ground_to_image(&segment.points[0]);
            let (c1, r1) = self.config.ground_to_image(&segment.points[1]);
            draw_line_segment_mut(
                &mut image,
                (c0 as f32, r0 as f32),
                (c1 as f32, r1 as f32),
                display_color(segment.color),
            );
        }
        image
    }
}

fn line(image: &mut RgbImage, from: (i32, i32), to: (i32, i32), color: Rgb<u8>) {
    draw_line_segment_mut(
        image,
        (from.0 as f32, from.1 as f32),
        (to.0 as f32, to.1 as f32),
        color,
    );
}

fn draw_background(config: &DebugImageConfig) -> RgbImage {
    let mut image = RgbImage::from_pixel(config.size, config.size, BACKGROUND);
    let size = config.size as i32;
    let (oc, or) = (config.origin_col, config.origin_row);
    let step = (config.grid_spacing * config.pixels_per_meter).round() as i32;

    if step > 0 {
        let n_lateral = ((oc.min(size - oc) - 1) / step).max(0);
        let n_forward = ((or - 1) / step).max(0);
        let (left, right) = (oc - n_lateral * step, oc + n_lateral * step);
        let top = or - n_forward * step;

        for k in -n_lateral..=n_lateral {
            let col = oc + k * step;
            line(&mut image, (col, top), (col, or), GRID);
        }
        for j in 0..=n_forward {
            let row = or - j * step;
            line(&mut image, (left, row), (right, row), GRID);
        }

        let spacing_cm = (config.grid_spacing * 100.0).round() as i32;
        for k in [-2i32, 0, 2].into_iter().filter(|k| k.abs() <= n_lateral) {
            let text = distance_label(k * spacing_cm, true);
            let x = oc + k * step - text_width(&text) / 2;
            draw_text(&mut image, &text, x, or + 5, GRID);
        }
        for j in [2, 0].into_iter().filter(|j| *j <= n_forward) {
            let text = distance_label(j * spacing_cm, false);
            draw_text(&mut image, &text, 2, or - j * step - GLYPH_H * GLYPH_SCALE / 2, GRID);
        }
    }

    let arm = if step > 0 { step / 2 } else { 20 };
    line(&mut image, (oc, or - arm), (oc, or), ROBOT);
    line(&mut image, (oc + arm, or - arm), (oc, or), ROBOT);
    line(&mut image, (oc - arm, or - arm), (oc, or), ROBOT);
    image
}

fn distance_label(cm: i32, signed: bool) -> String {
    if cm == 0 || !signed {
        format!("{}cm", cm)
    } else {
        format!("{:+}cm", cm)
    }
}

const GLYPH_W: i32 = 3;
const GLYPH_H: i32 = 5;
const GLYPH_SCALE: i32 = 2;
const GLYPH_ADVANCE: i32 = (GLYPH_W + 1) * GLYPH_SCALE;

/// 3x5 bitmaps, one byte per row, most significant of the low three bits is the left column.
fn glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        'c' => [0b000, 0b111, 0b100, 0b100, 0b111],
        'm' => [0b000, 0b110, 0b111, 0b101, 0b101],
        _ => [0; 5],
    }
}

fn text_width(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE - GLYPH_SCALE
}

fn draw_text(image: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let gx = x + i as i32 * GLYPH_ADVANCE;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..GLYPH_SCALE {
                    for dx in 0..GLYPH_SCALE {
                        let px = gx + col * GLYPH_SCALE + dx;
                        let py = y + row as i32 * GLYPH_SCALE + dy;
                        if px >= 0 && py >= 0 && px < image.width() as i32 && py < image.height() as i32 {
                            image.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}

/// Compressed payload of a debug image.
pub fn encode_image(img: &RgbImage, format: image::ImageFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

pub fn log_debug_image(
    recording: &RecordingStream,
    topic: &str,
    stamp_ns: i64,
    img: &RgbImage,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = encode_image(img, image::ImageFormat::Png)?;
    recording.set_time(
        "stable",
        rerun::TimeCell::from_timestamp_nanos_since_epoch(stamp_ns),
    );
    recording.log(
        format!("{}/image", topic),
        &rerun::EncodedImage::from_file_contents(bytes),
    )?;
    Ok(())
}

/// Logs the segments in ground coordinates, one strip per segment.
pub fn log_ground_segments(
    recording: &RecordingStream,
    topic: &str,
    segments: &SegmentList<GroundPoint>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (strips, colors): (Vec<_>, Vec<_>) = segments
        .segments
        .iter()
        .map(|s| {
            let strip: Vec<[f32; 2]> = s.points.iter().map(|p| [p.x as f32, p.y as f32]).collect();
            let Rgb([r, g, b]) = display_color(s.color);
            (strip, rerun::Color::from_rgb(r, g, b))
        })
        .unzip();
    recording.set_time(
        "stable",
        rerun::TimeCell::from_timestamp_nanos_since_epoch(segments.header.stamp_ns),
    );
    recording.log(
        format!("{}/segments", topic),
        &rerun::LineStrips2D::new(strips).with_colors(colors),
    )?;
    Ok(())
}
