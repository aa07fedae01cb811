//! Shutdown control for the measurement loop.
//!
//! A `ShutdownTrigger` is tripped once (by a signal listener or a caller);
//! every `Shutdown` clone observes it. Sleeps and the in-flight tool call race
//! against `Shutdown::wait` so an interrupt ends the loop promptly.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Sending half: trip it to ask the loop to stop.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half, handed to the scheduler.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/shutdown pair.
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl Shutdown {
    /// A shutdown that never trips (dropped trigger is treated as "no signal").
    pub fn never() -> Self {
        let (_, shutdown) = channel();
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the trigger fires. Pends forever if the trigger was dropped untripped.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleep for `duration` unless shutdown fires first.
    /// Returns `true` if the full duration elapsed, `false` if interrupted.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.wait() => false,
        }
    }
}

/// Trip `trigger` on SIGINT or SIGTERM (Ctrl+C on non-unix).
pub fn listen_for_signals(trigger: ShutdownTrigger) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(i), Ok(t)) => (i, t),
        _ => {
            tracing::warn!("could not install SIGINT/SIGTERM handlers; falling back to Ctrl+C");
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
            tracing::info!("received Ctrl+C");
            return;
        }
    };
    tokio::select! {
        _ = sigint.recv() => tracing::info!("received SIGINT"),
        _ = sigterm.recv() => tracing::info!("received SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("could not install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("received Ctrl+C");
}
