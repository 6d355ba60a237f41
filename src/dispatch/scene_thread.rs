//! Scene thread
//!
//! Runs a single-threaded tokio runtime with a `LocalSet` on a dedicated OS
//! thread. Once per tick it drains the action queue; handshake tasks run on
//! the same `LocalSet` between ticks.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::LocalSet;
use tokio::time::MissedTickBehavior;

use super::{Dispatcher, SceneMessage};
use crate::error::{Error, Result};
use crate::scene::SceneContext;

/// Scene thread options
#[derive(Debug, Clone)]
pub struct SceneConfig {
    /// Interval between queue drains
    pub tick: Duration,

    /// Publish the initial cameras when the thread starts
    pub publish_on_start: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(16),
            publish_on_start: true,
        }
    }
}

impl SceneConfig {
    /// Set the tick interval
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Do not publish initial cameras on start
    pub fn no_initial_publish(mut self) -> Self {
        self.publish_on_start = false;
        self
    }
}

/// Handle to the running scene thread
pub struct SceneThread {
    dispatcher: Dispatcher,
    done: Option<oneshot::Receiver<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl SceneThread {
    /// Start the scene thread
    ///
    /// `setup` runs on the new thread and builds the scene state there, so
    /// the state never has to be `Send`. Blocks the calling thread until
    /// setup has finished; call it before serving requests.
    pub fn spawn<S>(config: SceneConfig, setup: S) -> Result<Self>
    where
        S: FnOnce() -> Result<SceneContext> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::sync_channel::<std::result::Result<(), String>>(1);
        let (done_tx, done_rx) = oneshot::channel();

        let handle = thread::Builder::new()
            .name("scene".into())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };

                let local = LocalSet::new();
                local.block_on(&runtime, async move {
                    let ctx = match setup() {
                        Ok(ctx) => ctx,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e.to_string()));
                            return;
                        }
                    };
                    let _ = ready_tx.send(Ok(()));

                    run_scene(ctx, rx, config).await;
                });

                let _ = done_tx.send(());
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = handle.join();
                return Err(Error::SceneStartup(e));
            }
            Err(_) => {
                let _ = handle.join();
                return Err(Error::SceneStartup("scene thread exited during setup".into()));
            }
        }

        tracing::info!("Scene thread started");

        Ok(Self {
            dispatcher: Dispatcher::new(tx),
            done: Some(done_rx),
            handle: Some(handle),
        })
    }

    /// Producer handle for queuing actions
    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    /// Stop the scene thread
    ///
    /// Actions queued before this call still run; later ones are dropped.
    /// Publishing sessions and capture sinks are released before the thread
    /// exits.
    pub async fn shutdown(mut self) {
        let _ = self.dispatcher.tx.send(SceneMessage::Shutdown);

        if let Some(done) = self.done.take() {
            let _ = done.await;
        }
        if let Some(handle) = self.handle.take() {
            match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => tracing::error!("Scene thread panicked"),
                Err(e) => tracing::error!(error = %e, "Failed to join scene thread"),
            }
        }

        tracing::info!("Scene thread stopped");
    }
}

impl Drop for SceneThread {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.dispatcher.tx.send(SceneMessage::Shutdown);
        }
    }
}

async fn run_scene(
    mut ctx: SceneContext,
    mut rx: mpsc::UnboundedReceiver<SceneMessage>,
    config: SceneConfig,
) {
    if config.publish_on_start {
        let started = ctx.publish_all();
        tracing::info!(sessions = started, "Initial cameras published");
    }

    let mut ticker = tokio::time::interval(config.tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    'scene: loop {
        ticker.tick().await;

        loop {
            match rx.try_recv() {
                Ok(SceneMessage::Action(action)) => run_action(&mut ctx, action),
                Ok(SceneMessage::Shutdown) => {
                    tracing::debug!("Scene shutdown requested");
                    break 'scene;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => break 'scene,
            }
        }
    }

    rx.close();
    let mut dropped = 0usize;
    while rx.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        tracing::warn!(dropped = dropped, "Discarded actions queued after shutdown");
    }

    ctx.shutdown().await;
}

fn run_action(ctx: &mut SceneContext, action: super::PendingAction) {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        action(ctx);
        ctx.run_deferred();
    }));

    if result.is_err() {
        tracing::error!("Scene action panicked");
    }
}
