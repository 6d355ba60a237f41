//! Stream session state machine
//!
//! Tracks one camera's publishing session from capture binding to an
//! active WHIP stream.
//!
//! ```text
//! Idle -> CaptureBound -> OfferCreated -> LocalDescriptionSet -> AwaitingAnswer -> Active
//!   \________________\_______________\____________________\__________________\-> Failed
//! ```
//!
//! `Active` and `Failed` are terminal. A failed session is never retried.

use std::fmt;
use std::time::{Duration, Instant};

use crate::scene::CaptureSink;

/// Publishing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublishState {
    /// Session created, no capture sink yet
    Idle,
    /// Capture sink bound to the camera
    CaptureBound,
    /// Peer session open, local offer produced
    OfferCreated,
    /// Offer applied as the local description
    LocalDescriptionSet,
    /// Offer posted to the ingest endpoint, waiting for the answer
    AwaitingAnswer,
    /// Remote answer applied, stream is live
    Active,
    /// A step failed
    Failed,
}

impl PublishState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PublishState::Active | PublishState::Failed)
    }
}

impl fmt::Display for PublishState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PublishState::Idle => "idle",
            PublishState::CaptureBound => "capture-bound",
            PublishState::OfferCreated => "offer-created",
            PublishState::LocalDescriptionSet => "local-description-set",
            PublishState::AwaitingAnswer => "awaiting-answer",
            PublishState::Active => "active",
            PublishState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a session failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishFailure {
    /// State whose exit step failed
    pub stage: PublishState,
    pub message: String,
}

impl fmt::Display for PublishFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Publishing session of one camera
#[derive(Debug, Clone)]
pub struct StreamSession {
    /// Camera name as created
    pub camera: String,

    /// Lower-cased camera name used on the wire
    pub stream_name: String,

    /// WHIP endpoint the offer goes to
    pub endpoint: String,

    /// Bound capture sink
    pub sink: Option<CaptureSink>,

    state: PublishState,

    last_error: Option<PublishFailure>,

    created_at: Instant,

    activated_at: Option<Instant>,
}

impl StreamSession {
    pub fn new(camera: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let camera = camera.into();
        Self {
            stream_name: camera.to_lowercase(),
            camera,
            endpoint: endpoint.into(),
            sink: None,
            state: PublishState::Idle,
            last_error: None,
            created_at: Instant::now(),
            activated_at: None,
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    pub fn last_error(&self) -> Option<&PublishFailure> {
        self.last_error.as_ref()
    }

    /// Time from creation to activation, if the session went live
    pub fn startup_time(&self) -> Option<Duration> {
        self.activated_at.map(|t| t.duration_since(self.created_at))
    }

    fn advance(&mut self, from: PublishState, to: PublishState) -> bool {
        if self.state != from {
            return false;
        }
        tracing::debug!(camera = %self.camera, from = %from, to = %to, "Session state changed");
        self.state = to;
        true
    }

    /// Idle -> CaptureBound
    pub fn bind_capture(&mut self, sink: CaptureSink) -> bool {
        if self.state != PublishState::Idle {
            return false;
        }
        self.sink = Some(sink);
        self.advance(PublishState::Idle, PublishState::CaptureBound)
    }

    /// CaptureBound -> OfferCreated
    pub fn offer_created(&mut self) -> bool {
        self.advance(PublishState::CaptureBound, PublishState::OfferCreated)
    }

    /// OfferCreated -> LocalDescriptionSet
    pub fn local_description_set(&mut self) -> bool {
        self.advance(PublishState::OfferCreated, PublishState::LocalDescriptionSet)
    }

    /// LocalDescriptionSet -> AwaitingAnswer
    pub fn awaiting_answer(&mut self) -> bool {
        self.advance(PublishState::LocalDescriptionSet, PublishState::AwaitingAnswer)
    }

    /// AwaitingAnswer -> Active
    pub fn activate(&mut self) -> bool {
        if self.advance(PublishState::AwaitingAnswer, PublishState::Active) {
            self.activated_at = Some(Instant::now());
            true
        } else {
            false
        }
    }

    /// Any non-terminal state -> Failed
    ///
    /// Returns the recorded failure, or `None` if the session was already
    /// terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> Option<&PublishFailure> {
        if self.state.is_terminal() {
            return None;
        }
        self.last_error = Some(PublishFailure {
            stage: self.state,
            message: message.into(),
        });
        self.state = PublishState::Failed;
        self.last_error.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.state == PublishState::Active
    }

    pub fn is_failed(&self) -> bool {
        self.state == PublishState::Failed
    }
}
