//! `webrtc` crate backed transport

use std::sync::Arc;

use async_trait::async_trait;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_H264};
use webrtc::api::{APIBuilder, API};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

use super::{MediaTransport, PeerSession, SdpType, SessionDescription, TransportError};
use crate::scene::CaptureSink;

/// Peer sessions built on a shared `webrtc` API instance
pub struct WebRtcTransport {
    api: API,
    ice_servers: Vec<String>,
}

impl WebRtcTransport {
    /// Create a transport with the default codecs and interceptors
    pub fn new() -> Result<Self, TransportError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| TransportError::Session(e.to_string()))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| TransportError::Session(e.to_string()))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self {
            api,
            ice_servers: Vec::new(),
        })
    }

    /// Set STUN/TURN server URLs used by new sessions
    pub fn ice_servers(mut self, urls: Vec<String>) -> Self {
        self.ice_servers = urls;
        self
    }

    fn configuration(&self) -> RTCConfiguration {
        if self.ice_servers.is_empty() {
            return RTCConfiguration::default();
        }

        RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: self.ice_servers.clone(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

#[async_trait(?Send)]
impl MediaTransport for WebRtcTransport {
    async fn create_peer_session(&self) -> Result<Box<dyn PeerSession>, TransportError> {
        let pc = self
            .api
            .new_peer_connection(self.configuration())
            .await
            .map_err(|e| TransportError::Session(e.to_string()))?;

        Ok(Box::new(WebRtcPeer {
            pc: Arc::new(pc),
            track: None,
        }))
    }
}

struct WebRtcPeer {
    pc: Arc<RTCPeerConnection>,
    track: Option<Arc<TrackLocalStaticSample>>,
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription, TransportError> {
    let result = match description.kind {
        SdpType::Offer => RTCSessionDescription::offer(description.sdp),
        SdpType::Answer => RTCSessionDescription::answer(description.sdp),
    };
    result.map_err(|e| TransportError::Description(e.to_string()))
}

#[async_trait(?Send)]
impl PeerSession for WebRtcPeer {
    async fn attach_track(&mut self, sink: &CaptureSink) -> Result<(), TransportError> {
        let stream_id = sink.stream_id();
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_H264.to_owned(),
                ..Default::default()
            },
            format!("{}-video", stream_id),
            stream_id.clone(),
        ));

        let rtp_sender = self
            .pc
            .add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .map_err(|e| TransportError::Track(e.to_string()))?;

        // RTCP has to be read for interceptors (NACK, reports) to run
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtp_sender.read(&mut buf).await.is_ok() {}
        });

        let stream = stream_id.clone();
        self.pc
            .on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
                tracing::info!(stream = %stream, state = %state, "Peer connection state changed");
                Box::pin(async {})
            }));

        tracing::debug!(stream = %stream_id, sink = %sink, "Track attached");

        self.track = Some(track);
        Ok(())
    }

    async fn create_offer(&mut self) -> Result<SessionDescription, TransportError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| TransportError::Offer(e.to_string()))?;

        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        let description = to_rtc(description)?;
        self.pc
            .set_local_description(description)
            .await
            .map_err(|e| TransportError::Description(e.to_string()))
    }

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), TransportError> {
        let description = to_rtc(description)?;
        self.pc
            .set_remote_description(description)
            .await
            .map_err(|e| TransportError::Description(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.track = None;
        self.pc
            .close()
            .await
            .map_err(|e| TransportError::Session(e.to_string()))
    }
}
