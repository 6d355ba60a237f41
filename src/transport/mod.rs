//! Media transport seam
//!
//! The publisher drives the transport only through these operations:
//! create a peer session, attach a capture sink as a track, create the
//! local offer, and apply the local and remote descriptions.
//!
//! Peer sessions live on the scene thread, so the traits are `?Send`.

mod rtc;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::scene::CaptureSink;

pub use rtc::WebRtcTransport;

/// SDP message role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpType {
    Offer,
    Answer,
}

/// Session description exchanged during signaling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    pub kind: SdpType,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpType::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Error type for transport operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Peer session could not be created or has failed
    #[error("peer session error: {0}")]
    Session(String),
    /// Sink could not be attached as a track
    #[error("track attach failed: {0}")]
    Track(String),
    /// Offer generation failed
    #[error("offer creation failed: {0}")]
    Offer(String),
    /// Local or remote description was rejected
    #[error("description rejected: {0}")]
    Description(String),
}

/// Factory for peer sessions
#[async_trait(?Send)]
pub trait MediaTransport {
    /// Open a new, empty peer session
    async fn create_peer_session(&self) -> Result<Box<dyn PeerSession>, TransportError>;
}

/// One publishing peer session
#[async_trait(?Send)]
pub trait PeerSession {
    /// Add the sink's output as an outgoing video track
    async fn attach_track(&mut self, sink: &CaptureSink) -> Result<(), TransportError>;

    async fn create_offer(&mut self) -> Result<SessionDescription, TransportError>;

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError>;

    /// Tear the session down and release its track
    async fn close(&mut self) -> Result<(), TransportError>;
}
