//! HTTP control plane
//!
//! Parses control requests, forwards them to the scene thread and turns the
//! handler's text into a response.

pub mod config;
pub mod listener;
pub mod request;
pub mod router;

pub use config::ServerConfig;
pub use listener::ControlServer;
pub use request::ControlRequest;
pub use router::{ControlResponse, ControlRouter, Handler, NOT_FOUND_TEXT, WELCOME_TEXT};
