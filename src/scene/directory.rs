//! Camera directory
//!
//! Registry of the scene's named cameras. Names are unique under
//! case-insensitive comparison and keep the case they were created with.
//! The directory lives on the scene thread; nothing here is `Sync`-guarded.

use super::camera::Camera;
use super::math::{Axis, Vec3};

/// Error type for directory operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectoryError {
    /// A camera with the same name (ignoring case) exists
    #[error("Camera with name '{0}' already exists.")]
    AlreadyExists(String),
    /// No camera with that name
    #[error("Camera '{0}' not found.")]
    NotFound(String),
    /// Axis is not one of x, y, z
    #[error("Invalid axis. Use x, y or z.")]
    InvalidAxis(String),
    /// Angle is not a finite real number
    #[error("Invalid angle value.")]
    InvalidAngle(String),
}

/// Ordered set of cameras
#[derive(Debug, Default)]
pub struct CameraDirectory {
    cameras: Vec<Camera>,
}

impl CameraDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera names in creation order
    pub fn list(&self) -> Vec<String> {
        self.cameras.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Camera> {
        self.position(name).map(|i| &self.cameras[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Camera> {
        let index = self.position(name)?;
        Some(&mut self.cameras[index])
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Camera> {
        self.cameras.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    /// Register a new camera at `position`
    ///
    /// Fails without touching the directory if the name is taken.
    pub fn create(&mut self, name: &str, position: Vec3) -> Result<&mut Camera, DirectoryError> {
        if self.exists(name) {
            return Err(DirectoryError::AlreadyExists(name.to_string()));
        }

        self.cameras.push(Camera::new(name, position));

        tracing::info!(camera = name, position = %position, "Camera created");

        let last = self.cameras.len() - 1;
        Ok(&mut self.cameras[last])
    }

    /// Rotate a camera by `angle` degrees about a world axis, relative to its
    /// current orientation
    ///
    /// Checks run in order: camera lookup, axis, angle.
    pub fn rotate(&mut self, name: &str, axis: &str, angle: &str) -> Result<Axis, DirectoryError> {
        let index = self
            .position(name)
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))?;
        let axis = Axis::parse(axis).ok_or_else(|| DirectoryError::InvalidAxis(axis.to_string()))?;
        let degrees = parse_real(angle).ok_or_else(|| DirectoryError::InvalidAngle(angle.to_string()))?;

        self.cameras[index].transform.rotate_world(axis, degrees);

        tracing::debug!(camera = name, axis = %axis, degrees = degrees, "Camera rotated");

        Ok(axis)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.cameras.iter().position(|c| c.is_named(name))
    }
}

/// Parse a finite real number, tolerating surrounding whitespace
pub fn parse_real(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}
