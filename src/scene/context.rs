//! Scene-owned state
//!
//! [`SceneContext`] is everything the scene thread owns: the camera
//! directory and the publishing sessions. Other threads reach it only
//! through actions queued on the [`Dispatcher`](crate::dispatch::Dispatcher).

use std::collections::VecDeque;

use super::directory::{CameraDirectory, DirectoryError};
use super::math::Vec3;
use crate::session::SessionCoordinator;

/// Follow-up work queued from scene-thread code
pub type DeferredAction = Box<dyn FnOnce(&mut SceneContext)>;

/// State owned by the scene thread
pub struct SceneContext {
    directory: CameraDirectory,
    sessions: SessionCoordinator,
    deferred: VecDeque<DeferredAction>,
}

impl SceneContext {
    pub fn new(directory: CameraDirectory, sessions: SessionCoordinator) -> Self {
        Self {
            directory,
            sessions,
            deferred: VecDeque::new(),
        }
    }

    pub fn directory(&self) -> &CameraDirectory {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut CameraDirectory {
        &mut self.directory
    }

    pub fn sessions(&self) -> &SessionCoordinator {
        &self.sessions
    }

    /// Publish every camera present in the directory
    ///
    /// Called once when the scene starts.
    pub fn publish_all(&mut self) -> usize {
        if self.directory.is_empty() {
            tracing::error!("No cameras found, nothing to publish");
            return 0;
        }

        let mut started = 0;
        for camera in self.directory.iter_mut() {
            if self.sessions.publish(camera) {
                started += 1;
            }
        }
        started
    }

    /// Create a camera and start publishing it
    pub fn create_camera(&mut self, name: &str, position: Vec3) -> Result<(), DirectoryError> {
        let camera = self.directory.create(name, position)?;
        self.sessions.publish(camera);
        Ok(())
    }

    /// Queue `action` to run after the current one, within the same drain
    pub fn defer<F>(&mut self, action: F)
    where
        F: FnOnce(&mut SceneContext) + 'static,
    {
        self.deferred.push_back(Box::new(action));
    }

    /// Run deferred actions until none are left, FIFO
    pub(crate) fn run_deferred(&mut self) {
        while let Some(action) = self.deferred.pop_front() {
            action(self);
        }
    }

    /// Release every publishing session and capture sink
    pub(crate) async fn shutdown(&mut self) {
        self.deferred.clear();
        self.sessions.close_all().await;

        let mut released = 0usize;
        for camera in self.directory.iter_mut() {
            if camera.release_capture().is_some() {
                released += 1;
            }
        }

        tracing::info!(released = released, "Capture sinks released");
    }
}
