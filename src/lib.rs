//! Remote camera control and WHIP publishing for a headless scene.
//!
//! An HTTP control listener accepts requests on tokio worker threads and
//! forwards them to a single scene thread, which owns every camera and runs
//! each camera's WHIP publishing handshake.
//!
//! # Example
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use scenecast::dispatch::{SceneConfig, SceneThread};
//! use scenecast::scene::{CameraDirectory, SceneContext, Vec3};
//! use scenecast::server::{ControlRouter, ControlServer, ServerConfig};
//! use scenecast::session::{PublisherConfig, SessionCoordinator};
//! use scenecast::transport::WebRtcTransport;
//!
//! #[tokio::main]
//! async fn main() -> scenecast::Result<()> {
//!     let scene = SceneThread::spawn(SceneConfig::default(), || {
//!         let mut directory = CameraDirectory::new();
//!         let _ = directory.create("MainCamera", Vec3::ZERO);
//!         let transport = WebRtcTransport::new()?;
//!         Ok(SceneContext::new(
//!             directory,
//!             SessionCoordinator::new(PublisherConfig::default(), Rc::new(transport)),
//!         ))
//!     })?;
//!
//!     let server = ControlServer::new(
//!         ServerConfig::default(),
//!         ControlRouter::with_default_routes(),
//!         scene.dispatcher(),
//!     );
//!     server
//!         .run_until(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await?;
//!
//!     scene.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dispatch;
pub mod error;
pub mod scene;
pub mod server;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

pub use dispatch::{DispatchError, Dispatcher, SceneConfig, SceneThread};
pub use error::{Error, Result};
pub use scene::{CameraDirectory, SceneContext};
pub use server::{ControlRouter, ControlServer, ServerConfig};
pub use session::{PublishState, PublisherConfig, SessionCoordinator};
