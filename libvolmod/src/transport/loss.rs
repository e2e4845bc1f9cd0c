//! Reaction to losing an established driver connection.
//!
//! A sidecar that keeps talking to a restarted driver over a redialed channel
//! may act on stale state, so the default is to terminate and let the
//! supervisor restart the process. Embedders pick their own policy by passing
//! a different [`ConnectionLossHandler`].

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, warn};

/// Decides what happens after the driver connection was lost.
pub trait ConnectionLossHandler: Send + Sync {
    /// Called once, on the first redial after a successful dial.
    ///
    /// Returning `true` lets the channel reconnect; `false` makes every
    /// further dial fail.
    fn on_connection_loss(&self, endpoint: &str) -> bool;
}

impl<F> ConnectionLossHandler for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn on_connection_loss(&self, endpoint: &str) -> bool {
        self(endpoint)
    }
}

/// Terminates the process with exit status 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitOnConnectionLoss;

impl ConnectionLossHandler for ExitOnConnectionLoss {
    fn on_connection_loss(&self, endpoint: &str) -> bool {
        error!(%endpoint, "lost connection to CSI driver, exiting");
        std::process::exit(1)
    }
}

/// Logs the loss and keeps reconnecting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconnectOnConnectionLoss;

impl ConnectionLossHandler for ReconnectOnConnectionLoss {
    fn on_connection_loss(&self, endpoint: &str) -> bool {
        warn!(%endpoint, "lost connection to CSI driver, reconnecting");
        true
    }
}

#[derive(Debug, Default)]
struct DialState {
    connected: bool,
    lost: bool,
    reconnect: bool,
}

/// Dial bookkeeping shared by every dial of one channel.
pub(crate) struct DialGuard {
    endpoint: String,
    handler: Arc<dyn ConnectionLossHandler>,
    state: Mutex<DialState>,
}

impl DialGuard {
    pub(crate) fn new(endpoint: impl Into<String>, handler: Arc<dyn ConnectionLossHandler>) -> Self {
        Self {
            endpoint: endpoint.into(),
            handler,
            state: Mutex::new(DialState {
                reconnect: true,
                ..DialState::default()
            }),
        }
    }

    /// Called before each dial. A dial after a successful one means the
    /// connection was lost.
    pub(crate) fn before_dial(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.connected && !state.lost {
            error!(endpoint = %self.endpoint, "lost connection to CSI driver");
            state.lost = true;
            state.reconnect = self.handler.on_connection_loss(&self.endpoint);
        }
        if !state.reconnect {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "connection lost, reconnecting disabled",
            ));
        }
        Ok(())
    }

    /// Called after a dial succeeded.
    pub(crate) fn dialed(&self) {
        self.state.lock().connected = true;
    }
}
