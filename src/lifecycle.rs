//! Signal-driven save and shutdown.
//!
//! OS signals are turned into a stream of [`LifecycleSignal`]s. The
//! [`Coordinator`] consumes that stream on an ordinary task, so no work runs
//! inside the signal handler itself.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::engine::DiscoveryEngine;
use crate::error::Result;
use crate::persist::PersistenceWriter;

/// A request from the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    /// Save, stop the engine and exit. Carries the signal name.
    Terminate(&'static str),
    /// Save and keep running.
    HangUp,
}

/// Where the coordinator is in the process lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Serving lookups.
    Running,
    /// Writing state files.
    Saving,
    /// Waiting for the engine to stop.
    Stopping,
    /// Done; the process may exit.
    Exited,
}

/// SIGTERM and SIGINT as [`LifecycleSignal::Terminate`], SIGHUP as
/// [`LifecycleSignal::HangUp`].
#[cfg(unix)]
pub fn os_signals() -> std::io::Result<impl Stream<Item = LifecycleSignal> + Send + Unpin> {
    use tokio::signal::unix::{signal, SignalKind};
    use tokio_stream::wrappers::SignalStream;

    let term = SignalStream::new(signal(SignalKind::terminate())?)
        .map(|_| LifecycleSignal::Terminate("SIGTERM"))
        .boxed();
    let int = SignalStream::new(signal(SignalKind::interrupt())?)
        .map(|_| LifecycleSignal::Terminate("SIGINT"))
        .boxed();
    let hup = SignalStream::new(signal(SignalKind::hangup())?)
        .map(|_| LifecycleSignal::HangUp)
        .boxed();

    Ok(futures_util::stream::select_all([term, int, hup]))
}

/// Ctrl-C as [`LifecycleSignal::Terminate`].
#[cfg(not(unix))]
pub fn os_signals() -> std::io::Result<impl Stream<Item = LifecycleSignal> + Send + Unpin> {
    Ok(futures_util::stream::unfold((), |_| async {
        tokio::signal::ctrl_c().await.ok()?;
        Some((LifecycleSignal::Terminate("ctrl-c"), ()))
    })
    .boxed())
}

/// Reacts to lifecycle signals by saving state and stopping the engine.
pub struct Coordinator<E: ?Sized> {
    engine: Arc<E>,
    writer: PersistenceWriter<E>,
    shutdown: CancellationToken,
    state: LifecycleState,
}

impl<E: DiscoveryEngine + ?Sized> Coordinator<E> {
    /// Create a coordinator. `shutdown` is cancelled once termination begins.
    pub fn new(engine: Arc<E>, writer: PersistenceWriter<E>, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            writer,
            shutdown,
            state: LifecycleState::Running,
        }
    }

    /// Handle signals until the first termination request.
    ///
    /// Returns after the engine has stopped. Signals arriving after the
    /// first termination are never read. If the stream ends, that counts as
    /// a termination. The error of a failed final save is returned, but
    /// only after the engine has been stopped.
    pub async fn run<S>(mut self, mut signals: S) -> Result<()>
    where
        S: Stream<Item = LifecycleSignal> + Unpin,
    {
        while let Some(signal) = signals.next().await {
            match signal {
                LifecycleSignal::HangUp => {
                    info!("Received SIGHUP, saving state");
                    self.transition(LifecycleState::Saving);
                    if let Err(e) = self.writer.save().await {
                        error!(error = %e, "Failed to save state on SIGHUP");
                    }
                    self.transition(LifecycleState::Running);
                }
                LifecycleSignal::Terminate(name) => {
                    info!(signal = name, "Received termination signal");
                    return self.terminate().await;
                }
            }
        }

        warn!("Signal stream closed, shutting down");
        self.terminate().await
    }

    async fn terminate(mut self) -> Result<()> {
        self.transition(LifecycleState::Saving);
        let saved = self.writer.save().await;

        self.transition(LifecycleState::Stopping);
        self.shutdown.cancel();
        self.engine.stop().await;
        self.transition(LifecycleState::Exited);

        saved.map(|_| ()).inspect_err(|e| {
            error!(error = %e, "Discovery state was not saved before shutdown");
        })
    }

    fn transition(&mut self, next: LifecycleState) {
        debug!(from = ?self.state, to = ?next, "Lifecycle transition");
        self.state = next;
    }
}
