//! Daemon-wide stop flag and OS signal hookup

use std::io;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Latching stop flag shared by watch loops and supervisors
///
/// Clones observe the same flag. Once set it stays set, so a task that starts
/// waiting after [`ShutdownSignal::trigger`] returns immediately.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Create an unset flag
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Set the flag and wake every waiter
    pub fn trigger(&self) {
        if !self.flag.send_replace(true) {
            info!("Shutdown requested");
        }
    }

    /// Whether the flag is set
    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolve once the flag is set
    pub async fn wait(&self) {
        let mut rx = self.flag.subscribe();
        // the sender lives in `self`, so this cannot observe a closed channel
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Sets a [`ShutdownSignal`] on SIGINT or SIGTERM (Ctrl+C off unix)
#[derive(Debug)]
pub struct SignalHandler {
    signal: ShutdownSignal,
}

impl SignalHandler {
    /// Bind to `signal`
    pub fn new(signal: ShutdownSignal) -> Self {
        Self { signal }
    }

    /// Wait for a stop signal, then trigger shutdown
    ///
    /// If the handlers cannot be installed the error is logged and shutdown
    /// is left to other triggers.
    pub async fn run(self) {
        match stop_requested().await {
            Ok(name) => {
                info!(signal = name, "Received stop signal");
                self.signal.trigger();
            }
            Err(e) => error!(error = %e, "Failed to install signal handlers"),
        }
    }
}

#[cfg(unix)]
async fn stop_requested() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = int.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn stop_requested() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
