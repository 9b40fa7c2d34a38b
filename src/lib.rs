pub mod calibration;
pub mod camera_model;
pub mod error;
pub mod ground_projection;
pub mod io;
pub mod mailbox;
pub mod node;
pub mod pipeline;
pub mod state;
pub mod types;
pub mod visualization;

pub use error::{ConfigError, NotReady, ProjectionError};
pub use ground_projection::GroundProjector;
pub use node::GroundProjectionNode;
