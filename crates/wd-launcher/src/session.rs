//! WebDriver session management
//!
//! Wraps one remote session: connect to the grid, point the browser at the
//! runner page, optionally keep the session alive with pseudo activity,
//! and quit on close. Session negotiation and the wire protocol belong to
//! the WebDriver client; nothing here speaks the protocol directly.

use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::LauncherConfig;
use crate::error::{Error, Result};

/// An open session on a remote WebDriver grid
pub struct GridSession {
    client: Client,
    keep_alive: Option<KeepAliveHandle>,
}

/// Handle for the pseudo-activity task
struct KeepAliveHandle {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl KeepAliveHandle {
    async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
    }
}

impl GridSession {
    /// Open a session on the grid and navigate it to the runner page.
    ///
    /// When `pseudo_activity_interval` is configured, a keep-alive task is
    /// spawned that polls the session at that period so the grid does not
    /// reclaim it for inactivity.
    pub async fn open(config: &LauncherConfig, page_url: &str) -> Result<Self> {
        let hub_url = config.grid.hub_url();
        let caps = config.browser.to_capabilities();

        debug!(hub = %hub_url, "opening WebDriver session");

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&hub_url)
            .await
            .map_err(|e| {
                Error::SessionStart(format!("failed to connect to {}: {}", hub_url, e))
            })?;

        if let Err(e) = client.goto(page_url).await {
            let navigation = Error::Navigation(format!("failed to open {}: {}", page_url, e));
            // don't leave an orphaned session on the grid
            if let Err(close_err) = client.close().await {
                warn!("failed to close session after navigation error: {}", close_err);
            }
            return Err(navigation);
        }

        let keep_alive = config
            .keep_alive_period()
            .map(|period| spawn_keep_alive(client.clone(), period));

        Ok(Self { client, keep_alive })
    }

    /// Close the session. Stops the keep-alive task first, then quits the
    /// remote browser.
    pub async fn close(self) -> Result<()> {
        if let Some(keep_alive) = self.keep_alive {
            keep_alive.stop().await;
        }

        debug!("quitting WebDriver session");
        self.client
            .close()
            .await
            .map_err(|e| Error::SessionClose(e.to_string()))
    }
}

/// Spawn the pseudo-activity task.
///
/// Each tick issues a current-URL fetch, which counts as session activity
/// on the grid. Fetch errors are logged and do not stop the loop; the grid
/// reclaiming the session mid-run surfaces through the runner itself.
fn spawn_keep_alive(client: Client, period: Duration) -> KeepAliveHandle {
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // the first tick fires immediately; skip it so activity starts one
        // period after navigation
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("imitating activity");
                    if let Err(e) = client.current_url().await {
                        warn!("keep-alive request failed: {}", e);
                    }
                }
                _ = shutdown_rx.recv() => {
                    debug!("keep-alive task stopped");
                    break;
                }
            }
        }
    });

    KeepAliveHandle { shutdown_tx, handle }
}
