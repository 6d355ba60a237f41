//! Session coordinator
//!
//! Owns every camera's [`StreamSession`] and starts handshakes. Lives on the
//! scene thread and is handed to whatever creates cameras, so runtime-created
//! cameras enroll without any global registry.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tokio::task::JoinHandle;

use crate::client::WhipClient;
use crate::scene::Camera;
use crate::transport::MediaTransport;

use super::config::PublisherConfig;
use super::publisher::{Handshake, PeerSlot};
use super::state::{PublishState, StreamSession};

struct SessionEntry {
    session: Rc<RefCell<StreamSession>>,
    peer: PeerSlot,
    task: JoinHandle<()>,
}

/// Registry of publishing sessions, one per camera name (case-insensitive)
pub struct SessionCoordinator {
    config: PublisherConfig,
    transport: Rc<dyn MediaTransport>,
    client: WhipClient,
    sessions: HashMap<String, SessionEntry>,
    order: Vec<String>,
}

impl SessionCoordinator {
    pub fn new(config: PublisherConfig, transport: Rc<dyn MediaTransport>) -> Self {
        let client = WhipClient::new().with_retries(config.post_retries, config.retry_backoff);
        Self {
            config,
            transport,
            client,
            sessions: HashMap::new(),
            order: Vec::new(),
        }
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Start publishing a camera
    ///
    /// Binds a capture sink to the camera right away and spawns the rest of
    /// the handshake on the current `LocalSet`. A camera that already has a
    /// session is left alone; returns whether a session was started.
    pub fn publish(&mut self, camera: &mut Camera) -> bool {
        let key = camera.name().to_lowercase();

        if let Some(existing) = self.sessions.get(&key) {
            tracing::debug!(
                camera = camera.name(),
                state = %existing.session.borrow().state(),
                "Camera already has a publishing session"
            );
            return false;
        }

        let endpoint = self.config.endpoint_for(camera.name());
        let mut session = StreamSession::new(camera.name(), endpoint.clone());

        let (sink, previous) = camera.bind_capture(
            self.config.video_width,
            self.config.video_height,
            self.config.pixel_format,
        );
        if let Some(previous) = previous {
            tracing::debug!(camera = camera.name(), sink = %previous, "Replaced capture sink");
        }
        session.bind_capture(sink);

        let session = Rc::new(RefCell::new(session));
        let peer = PeerSlot::default();
        let handshake = Handshake::new(
            Rc::clone(&session),
            Rc::clone(&peer),
            Rc::clone(&self.transport),
            self.client.clone(),
            self.config.settle_delay,
        );
        let task = tokio::task::spawn_local(handshake.run());

        tracing::info!(camera = camera.name(), endpoint = %endpoint, "Publishing camera");

        self.order.push(key.clone());
        self.sessions.insert(key, SessionEntry { session, peer, task });
        true
    }

    /// Current state of a camera's session
    pub fn state(&self, camera: &str) -> Option<PublishState> {
        self.sessions
            .get(&camera.to_lowercase())
            .map(|entry| entry.session.borrow().state())
    }

    /// Snapshot of a camera's session
    pub fn session(&self, camera: &str) -> Option<StreamSession> {
        self.sessions
            .get(&camera.to_lowercase())
            .map(|entry| entry.session.borrow().clone())
    }

    /// Snapshots of all sessions in the order they were started
    pub fn sessions(&self) -> Vec<StreamSession> {
        self.order
            .iter()
            .filter_map(|key| self.sessions.get(key))
            .map(|entry| entry.session.borrow().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Stop every handshake and close every peer session
    ///
    /// Handshakes still in flight are aborted first, then each peer that
    /// was opened is closed, including ones left mid-handshake.
    pub async fn close_all(&mut self) {
        let mut closed = 0usize;

        for key in self.order.drain(..) {
            let Some(entry) = self.sessions.remove(&key) else {
                continue;
            };

            entry.task.abort();
            let camera = entry.session.borrow().camera.clone();

            match entry.task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(camera = %camera, "Handshake aborted");
                }
                Err(e) => {
                    tracing::warn!(camera = %camera, error = %e, "Handshake task failed");
                }
            }

            // The task is gone, so the slot is no longer locked
            let peer = entry.peer.lock().await.take();
            if let Some(mut peer) = peer {
                if let Err(e) = peer.close().await {
                    tracing::warn!(camera = %camera, error = %e, "Failed to close peer session");
                }
                closed += 1;
            }
        }

        tracing::info!(closed = closed, "Publishing sessions closed");
    }
}
