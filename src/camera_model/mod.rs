pub mod distortion;
pub mod pinhole;
pub mod rectifier;

pub use distortion::{Distortion, UndistortConfig};
pub use pinhole::CameraModel;
pub use rectifier::{Rectifier, UndistortMap};
