//! Headless scene
//!
//! The scene is the single owner of cameras and their capture sinks. Only
//! code running on the scene thread may touch it.

pub mod camera;
pub mod context;
pub mod directory;
pub mod math;

pub use camera::{Camera, CaptureSink, PixelFormat};
pub use context::{DeferredAction, SceneContext};
pub use directory::{parse_real, CameraDirectory, DirectoryError};
pub use math::{Axis, Quat, Transform, Vec3};
