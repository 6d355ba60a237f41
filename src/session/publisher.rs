//! WHIP publishing handshake
//!
//! Drives one [`StreamSession`] from `CaptureBound` to `Active`. The
//! handshake runs as a task on the scene thread; every transport and
//! network call is an await point, so the scene keeps ticking while a
//! camera waits for its answer.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::client::{SignalingError, WhipClient};
use crate::scene::CaptureSink;
use crate::transport::{MediaTransport, PeerSession, SessionDescription, TransportError};

use super::state::StreamSession;

/// Error type for a failed handshake step
#[derive(Debug, Clone, thiserror::Error)]
pub enum PublishError {
    /// Session reached the handshake without a capture sink
    #[error("no capture sink bound")]
    NoCaptureSink,
    /// Media transport call failed
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Offer POST or answer failed
    #[error(transparent)]
    Signaling(#[from] SignalingError),
}

/// Peer session shared between a handshake and its owner
///
/// The handshake holds the lock while it drives the peer. Once the task has
/// finished or been aborted the owner can take the peer out and close it.
pub(crate) type PeerSlot = Rc<Mutex<Option<Box<dyn PeerSession>>>>;

/// One camera's handshake
pub(crate) struct Handshake {
    session: Rc<RefCell<StreamSession>>,
    peer: PeerSlot,
    transport: Rc<dyn MediaTransport>,
    client: WhipClient,
    settle_delay: Duration,
}

impl Handshake {
    pub(crate) fn new(
        session: Rc<RefCell<StreamSession>>,
        peer: PeerSlot,
        transport: Rc<dyn MediaTransport>,
        client: WhipClient,
        settle_delay: Duration,
    ) -> Self {
        Self {
            session,
            peer,
            transport,
            client,
            settle_delay,
        }
    }

    /// Run the handshake to a terminal state
    ///
    /// A peer session that was opened stays in the slot whether or not the
    /// handshake succeeded, so teardown can release it.
    pub(crate) async fn run(self) {
        if let Err(e) = self.drive().await {
            let mut session = self.session.borrow_mut();
            let camera = session.camera.clone();
            let endpoint = session.endpoint.clone();
            if let Some(failure) = session.fail(e.to_string()) {
                tracing::error!(
                    camera = %camera,
                    stage = %failure.stage,
                    endpoint = %endpoint,
                    error = %failure.message,
                    "Publishing failed"
                );
            }
        }
    }

    async fn drive(&self) -> Result<(), PublishError> {
        let (sink, endpoint) = self.snapshot()?;

        tokio::time::sleep(self.settle_delay).await;

        let mut slot = self.peer.lock().await;
        let peer = slot.insert(self.transport.create_peer_session().await?);
        peer.attach_track(&sink).await?;

        let offer = peer.create_offer().await?;
        self.session.borrow_mut().offer_created();

        peer.set_local_description(offer.clone()).await?;
        self.session.borrow_mut().local_description_set();

        self.session.borrow_mut().awaiting_answer();
        let answer = self.client.post_offer(&endpoint, &offer.sdp).await?;

        peer.set_remote_description(SessionDescription::answer(answer)).await?;

        let mut session = self.session.borrow_mut();
        if session.activate() {
            tracing::info!(camera = %session.camera, endpoint = %endpoint, "Stream started");
        }

        Ok(())
    }

    fn snapshot(&self) -> Result<(CaptureSink, String), PublishError> {
        let session = self.session.borrow();
        let sink = session.sink.clone().ok_or(PublishError::NoCaptureSink)?;
        Ok((sink, session.endpoint.clone()))
    }
}
