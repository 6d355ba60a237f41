//! Cross-thread dispatch onto the scene thread
//!
//! The scene thread is the only owner of [`SceneContext`]. Any other thread
//! that wants to read or change scene state sends a [`PendingAction`] and
//! waits for its completion signal:
//!
//! ```text
//!   request task ──┐
//!   request task ──┼──► mpsc (unbounded, FIFO) ──► scene thread: drain per tick
//!   request task ──┘                                   │
//!        ▲                                              │ action(&mut SceneContext)
//!        └────────────── oneshot completion ◄───────────┘
//! ```
//!
//! Waiting is bounded: a caller that does not hear back within the
//! dispatcher's timeout gets [`DispatchError::Timeout`]. The action itself
//! is not cancelled; if it runs later its result is discarded.

mod scene_thread;

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::scene::SceneContext;

pub use scene_thread::{SceneConfig, SceneThread};

/// Default bound on how long a caller waits for its action
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Deferred unit of work for the scene thread
pub type PendingAction = Box<dyn FnOnce(&mut SceneContext) + Send>;

pub(crate) enum SceneMessage {
    Action(PendingAction),
    Shutdown,
}

/// Error type for dispatched actions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Scene thread did not run the action in time
    #[error("scene did not respond within {0:?}")]
    Timeout(Duration),
    /// Scene thread is gone, or dropped the action without running it
    #[error("scene is not running")]
    Closed,
}

/// Producer handle for the scene thread's queue
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<SceneMessage>,
    timeout: Duration,
}

impl std::fmt::Debug for SceneMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneMessage::Action(_) => f.write_str("Action"),
            SceneMessage::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl Dispatcher {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SceneMessage>) -> Self {
        Self {
            tx,
            timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// Set how long [`execute`](Self::execute) waits for completion
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Queue an action without waiting for it
    pub fn enqueue(&self, action: PendingAction) -> Result<(), DispatchError> {
        self.tx
            .send(SceneMessage::Action(action))
            .map_err(|_| DispatchError::Closed)
    }

    /// Run `f` on the scene thread and wait for its result
    pub async fn execute<F, R>(&self, f: F) -> Result<R, DispatchError>
    where
        F: FnOnce(&mut SceneContext) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel();

        self.enqueue(Box::new(move |ctx: &mut SceneContext| {
            // Receiver may have timed out already
            let _ = done_tx.send(f(ctx));
        }))?;

        match tokio::time::timeout(self.timeout, done_rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(DispatchError::Closed),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Scene action timed out");
                Err(DispatchError::Timeout(self.timeout))
            }
        }
    }

    /// Whether the scene thread still accepts actions
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
