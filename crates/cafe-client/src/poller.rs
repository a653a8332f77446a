//! # Order Poller
//!
//! Re-fetches a dashboard's orders on a fixed interval until stopped.
//!
//! ## Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           OrderPoller::run                              │
//! │                                                                         │
//! │   tick ──► lock dashboard ──► refresh()                                 │
//! │                                   │                                     │
//! │              ┌────────────────────┼──────────────────────┐              │
//! │              ▼                    ▼                      ▼              │
//! │             Ok              other error             Unauthorized        │
//! │         (wait tick)     (warn, wait tick)      (exit: LoggedOut)        │
//! │                                                                         │
//! │   handle.shutdown() ──────────────────────────► (exit: Shutdown)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first tick fires immediately, so a freshly spawned poller loads the
//! dashboard right away. Missed ticks are delayed, never bunched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::api::StaffBackend;
use crate::dashboard::Dashboard;

/// Why the poll loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    /// [`PollerHandle::shutdown`] was called, or every handle was dropped.
    Shutdown,
    /// The session was rejected; the dashboard is logged out.
    LoggedOut,
}

pub struct OrderPoller<B> {
    dashboard: Arc<Mutex<Dashboard<B>>>,
    interval: Duration,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Stops a running [`OrderPoller`].
#[derive(Clone)]
pub struct PollerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl PollerHandle {
    /// Asks the loop to stop. Returns false if it already has.
    pub async fn shutdown(&self) -> bool {
        self.shutdown_tx.send(()).await.is_ok()
    }
}

impl<B: StaffBackend> OrderPoller<B> {
    pub fn new(dashboard: Arc<Mutex<Dashboard<B>>>, interval: Duration) -> (Self, PollerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let poller = OrderPoller {
            dashboard,
            interval,
            shutdown_rx,
        };

        (poller, PollerHandle { shutdown_tx })
    }

    pub async fn run(mut self) -> PollerExit {
        info!(interval_ms = self.interval.as_millis() as u64, "Order poller starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        let exit = loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Some(exit) = self.poll().await {
                        break exit;
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Order poller shutting down");
                    break PollerExit::Shutdown;
                }
            }
        };

        info!(?exit, "Order poller stopped");
        exit
    }

    async fn poll(&self) -> Option<PollerExit> {
        let mut dashboard = self.dashboard.lock().await;

        if dashboard.is_logged_out() {
            return Some(PollerExit::LoggedOut);
        }

        match dashboard.refresh().await {
            Ok(()) => {
                debug!(orders = dashboard.orders().len(), "Orders refreshed");
                None
            }
            Err(e) if e.is_unauthorized() => {
                warn!("Session expired while polling");
                Some(PollerExit::LoggedOut)
            }
            Err(e) => {
                warn!(error = %e, "Order refresh failed, retrying next tick");
                None
            }
        }
    }
}
