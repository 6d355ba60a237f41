//! Ingest signaling client
//!
//! Provides the client side of the WHIP offer/answer exchange used to
//! publish camera streams to a media ingest server.

pub mod whip;

pub use whip::{SignalingError, WhipClient, SDP_CONTENT_TYPE};
