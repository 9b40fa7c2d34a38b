use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, ValueEnum};
use glob::glob;
use ground_projection::calibration::{CalibrationLoader, DEFAULT_CALIBRATION_ROOT};
use ground_projection::io::{object_from_json, object_to_json};
use ground_projection::node::GroundProjectionNode;
use ground_projection::pipeline::{PipelineConfig, PixelUnits};
use ground_projection::types::{CameraInfo, Pixel, RawSegmentList, SegmentList};
use ground_projection::visualization::{
    DebugImageConfig, encode_image, log_debug_image, log_ground_segments,
};
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

#[derive(Clone, Copy, ValueEnum)]
enum Units {
    Absolute,
    Normalized,
}

#[derive(Parser)]
#[command(version, about, author)]
struct GroundProjectionCli {
    /// camera info json (width, height, distortion_model, d, k, p)
    #[arg(long)]
    camera_info: PathBuf,

    /// folder with one segment list json per frame
    #[arg(long)]
    segments: PathBuf,

    /// robot name, used to find <calibration-root>/<robot>.yaml
    #[arg(long)]
    robot: String,

    #[arg(long, default_value = DEFAULT_CALIBRATION_ROOT)]
    calibration_root: PathBuf,

    /// folder for the projected segment lists
    #[arg(short, long, default_value = "ground_segments")]
    output: PathBuf,

    /// units of the segment endpoints
    #[arg(long, value_enum, default_value = "absolute")]
    units: Units,

    /// write a top-down debug png next to every projected frame
    #[arg(long)]
    debug_images: bool,

    /// save a rerun recording with debug images and ground segments
    #[arg(long)]
    rerun: Option<PathBuf>,

    /// debug image scale in pixels per meter
    #[arg(long, default_value_t = 400.0)]
    debug_scale: f64,

    /// debug image visible radius in meters
    #[arg(long, default_value_t = 0.5)]
    visible_radius: f64,
}

fn segment_files(folder: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let pattern = format!("{}/*.json", folder.display());
    let mut paths: Vec<PathBuf> = glob(&pattern)?.filter_map(Result::ok).collect();
    paths.sort();
    Ok(paths)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = GroundProjectionCli::parse();

    let loader = CalibrationLoader::new(&cli.calibration_root);
    let pipeline = PipelineConfig {
        units: match cli.units {
            Units::Absolute => PixelUnits::Absolute,
            Units::Normalized => PixelUnits::Normalized,
        },
    };
    let debug = DebugImageConfig {
        pixels_per_meter: cli.debug_scale,
        visible_radius: cli.visible_radius,
        ..Default::default()
    };
    let node = match GroundProjectionNode::from_calibration(&loader, &cli.robot, pipeline, debug) {
        Ok(node) => node,
        Err(e) => {
            log::error!("{} ... aborting", e);
            return Err(e.into());
        }
    };

    let camera_info: CameraInfo = object_from_json(&cli.camera_info)?;
    node.on_camera_info(&camera_info)?;

    let recording = match &cli.rerun {
        Some(path) => Some(rerun::RecordingStreamBuilder::new("ground_projection").save(path)?),
        None => None,
    };
    let _debug_subscription =
        (cli.debug_images || recording.is_some()).then(|| node.subscribe_debug());

    std::fs::create_dir_all(&cli.output)?;
    let paths = segment_files(&cli.segments)?;
    log::info!("projecting {} frames", paths.len());

    let now = Instant::now();
    let frames: Vec<_> = paths
        .par_iter()
        .progress_count(paths.len() as u64)
        .filter_map(|path| {
            let raw: RawSegmentList = match object_from_json(path) {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    return None;
                }
            };
            let list = SegmentList::<Pixel>::from(raw);
            let frame = node.on_segment_list(&list).ok()?;
            Some((path.clone(), frame))
        })
        .collect();
    let duration_sec = now.elapsed().as_secs_f64();
    log::info!("projecting segments took {:.6} sec", duration_sec);

    let mut dropped = 0;
    for (path, frame) in &frames {
        dropped += frame.dropped.len();
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        object_to_json(&cli.output.join(format!("{}.json", stem)), &frame.segments)?;
        if let Some(img) = &frame.debug_image {
            if cli.debug_images {
                let png = encode_image(img, image::ImageFormat::Png)?;
                std::fs::write(cli.output.join(format!("{}.png", stem)), png)?;
            }
            if let Some(recording) = &recording {
                log_debug_image(recording, "/debug", frame.segments.header.stamp_ns, img)?;
            }
        }
        if let Some(recording) = &recording {
            log_ground_segments(recording, "/ground", &frame.segments)?;
        }
    }
    log::info!(
        "wrote {} frames to {}, {} segments dropped",
        frames.len(),
        cli.output.display(),
        dropped
    );
    Ok(())
}
