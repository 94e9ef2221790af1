//! Liveness polling of the mutation service.
//!
//! Purely diagnostic: the monitor publishes a [`ServerStatus`] on a watch
//! channel and never touches the session or the query cache.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, warn};

use super::client::MutatorApi;

/// Failures in a row before polling errors are logged at `error` level.
const ESCALATE_AFTER: u32 = 5;

/// Last observed liveness of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerStatus {
    /// No probe has completed yet.
    Checking,
    /// Last probe got a 2xx reply with this body.
    Alive(String),
    /// Last probe failed for this reason.
    Dead(String),
}

impl ServerStatus {
    pub fn is_alive(&self) -> bool {
        matches!(self, ServerStatus::Alive(_))
    }
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStatus::Checking    => write!(f, "Backend: Checking..."),
            ServerStatus::Alive(body) => write!(f, "Backend: {body}"),
            ServerStatus::Dead(why)   => write!(f, "Backend: Error: {why}"),
        }
    }
}

/// Polls `GET /health` at a fixed interval.
pub struct HealthMonitor<A> {
    api: Arc<A>,
    interval: Duration,
    tx: watch::Sender<ServerStatus>,
}

impl<A: MutatorApi> HealthMonitor<A> {
    pub fn new(api: Arc<A>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(ServerStatus::Checking);
        Self { api, interval, tx }
    }

    /// Receiver that sees every status change.
    pub fn subscribe(&self) -> watch::Receiver<ServerStatus> {
        self.tx.subscribe()
    }

    /// Probe once and publish the result.
    pub async fn check_once(&self) -> ServerStatus {
        let status = match self.api.health().await {
            Ok(body) => ServerStatus::Alive(body.trim().to_string()),
            Err(e) => ServerStatus::Dead(e.to_string()),
        };
        self.tx.send_replace(status.clone());
        status
    }

    /// Run the polling loop until every receiver has been dropped.
    ///
    /// Failed probes are soft errors: the loop logs them and tries again on
    /// the next tick.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut consecutive_failures: u32 = 0;

        loop {
            ticker.tick().await;
            if self.tx.is_closed() {
                debug!("no health subscribers left, stopping monitor");
                return;
            }

            match self.check_once().await {
                ServerStatus::Dead(reason) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    if consecutive_failures >= ESCALATE_AFTER {
                        error!(
                            error = %reason,
                            consecutive_failures,
                            "health check failed repeatedly, will retry next tick"
                        );
                    } else {
                        warn!(error = %reason, "health check failed, will retry next tick");
                    }
                }
                _ => consecutive_failures = 0,
            }
        }
    }
}
