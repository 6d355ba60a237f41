//! Cameras and their capture sinks

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::math::{Transform, Vec3};

static NEXT_SINK_ID: AtomicU64 = AtomicU64::new(1);

/// Pixel layout of a capture sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit BGRA, sRGB encoded
    Bgra8Srgb,
    /// 8-bit RGBA, sRGB encoded
    Rgba8Srgb,
}

/// Offscreen render target a camera renders into
///
/// The sink is a handle; frame production belongs to the render engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSink {
    /// Process-unique sink id
    pub id: u64,
    /// Name of the camera the sink is bound to
    pub camera: String,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl CaptureSink {
    pub(crate) fn new(camera: &str, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            id: NEXT_SINK_ID.fetch_add(1, Ordering::Relaxed),
            camera: camera.to_string(),
            width,
            height,
            format,
        }
    }

    /// Stream id used when the sink is attached as a media track
    pub fn stream_id(&self) -> String {
        self.camera.to_lowercase()
    }
}

impl fmt::Display for CaptureSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sink#{} {}x{} {:?} for {}",
            self.id, self.width, self.height, self.format, self.camera
        )
    }
}

/// A virtual camera in the scene
#[derive(Debug, Clone)]
pub struct Camera {
    name: String,
    pub transform: Transform,
    capture: Option<CaptureSink>,
}

impl Camera {
    pub fn new(name: impl Into<String>, position: Vec3) -> Self {
        Self {
            name: name.into(),
            transform: Transform::at(position),
            capture: None,
        }
    }

    /// Name as given at creation (case preserved)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    pub fn capture(&self) -> Option<&CaptureSink> {
        self.capture.as_ref()
    }

    /// Create a capture sink and make it the camera's render target
    ///
    /// An already bound sink is replaced and returned.
    pub fn bind_capture(
        &mut self,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> (CaptureSink, Option<CaptureSink>) {
        let sink = CaptureSink::new(&self.name, width, height, format);
        let previous = self.capture.replace(sink.clone());
        (sink, previous)
    }

    /// Detach the render target, returning it for release
    pub fn release_capture(&mut self) -> Option<CaptureSink> {
        self.capture.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_name_case() {
        let cam = Camera::new("MainCamera", Vec3::ZERO);

        assert_eq!(cam.name(), "MainCamera");
        assert!(cam.is_named("maincamera"));
        assert!(cam.is_named("MAINCAMERA"));
        assert!(!cam.is_named("MainCamera2"));
    }

    #[test]
    fn test_bind_capture() {
        let mut cam = Camera::new("Cam2", Vec3::new(1.0, 2.0, 3.0));
        assert!(cam.capture().is_none());

        let (sink, previous) = cam.bind_capture(1280, 720, PixelFormat::Bgra8Srgb);
        assert!(previous.is_none());
        assert_eq!(sink.camera, "Cam2");
        assert_eq!(sink.stream_id(), "cam2");
        assert_eq!(cam.capture(), Some(&sink));

        let (second, previous) = cam.bind_capture(640, 360, PixelFormat::Rgba8Srgb);
        assert_eq!(previous, Some(sink.clone()));
        assert_ne!(second.id, sink.id);

        assert_eq!(cam.release_capture(), Some(second));
        assert!(cam.capture().is_none());
    }
}
