//! Stream publishing
//!
//! One [`StreamSession`] per camera, driven through the WHIP offer/answer
//! handshake by a task on the scene thread. The [`SessionCoordinator`] owns
//! all sessions and is the single entry point for publishing a camera.

pub mod config;
pub mod coordinator;
pub mod publisher;
pub mod state;

pub use config::{PublisherConfig, DEFAULT_INGEST_BASE, INGEST_BASE_ENV};
pub use coordinator::SessionCoordinator;
pub use publisher::PublishError;
pub use state::{PublishFailure, PublishState, StreamSession};
