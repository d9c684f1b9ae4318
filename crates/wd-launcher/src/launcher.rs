//! Host-runner lifecycle adapter
//!
//! The host test runner drives launchers through a small contract: give me
//! a display name, start against the page I serve, and tear down when I
//! say so. `WebDriverLauncher` implements that contract on top of a remote
//! grid session.

use async_trait::async_trait;
use tracing::{debug, error, info};
use url::Url;

use crate::config::LauncherConfig;
use crate::error::{Error, Result};
use crate::session::GridSession;

/// Query parameter the host page turns into a
/// `<meta http-equiv="X-UA-Compatible" ...>` tag
const X_UA_COMPATIBLE: &str = "x-ua-compatible";

/// Lifecycle contract expected by the host test runner
#[async_trait]
pub trait Launcher {
    /// Display name shown by the runner
    fn name(&self) -> &str;

    /// Begin a browser session pointed at the runner-served page
    async fn start(&mut self, url: &str) -> Result<()>;

    /// Tear the session down. Must resolve once teardown completes and be
    /// safe to call when no session was ever opened.
    async fn kill(&mut self) -> Result<()>;
}

/// Launches a remote browser through a WebDriver-compatible grid
pub struct WebDriverLauncher {
    config: LauncherConfig,
    name: String,
    session: Option<GridSession>,
}

impl WebDriverLauncher {
    /// Create a launcher from a validated configuration
    pub fn new(config: LauncherConfig) -> Result<Self> {
        config.validate()?;
        let name = format!("{} via WebDriver", config.browser.browser_name);
        Ok(Self {
            config,
            name,
            session: None,
        })
    }
}

#[async_trait]
impl Launcher for WebDriverLauncher {
    fn name(&self) -> &str {
        &self.name
    }

    /// Open the grid session and navigate it to `url`.
    ///
    /// A failure to open the session is logged and leaves the launcher
    /// with nothing to tear down; the runner's lifecycle contract is not
    /// violated and a later `kill` resolves cleanly.
    async fn start(&mut self, url: &str) -> Result<()> {
        info!("connecting to {}", self.name);

        let page_url = match merge_compat_directive(url, &self.config) {
            Ok(page_url) => page_url,
            Err(e) => {
                error!("error starting {}: {}", self.name, e);
                return Ok(());
            }
        };

        match GridSession::open(&self.config, &page_url).await {
            Ok(session) => {
                self.session = Some(session);
            }
            Err(e) => {
                error!("error starting {}: {}", self.name, e);
            }
        }

        Ok(())
    }

    async fn kill(&mut self) -> Result<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        debug!("killing {}", self.name);
        session.close().await?;
        info!("killed {}", self.name);
        Ok(())
    }
}

/// Merge the configured compatibility directive into the page URL's query
/// string. Other query parameters are preserved; an existing directive is
/// replaced. Without a directive the URL passes through unchanged.
pub fn merge_compat_directive(url: &str, config: &LauncherConfig) -> Result<String> {
    let Some(directive) = config.x_ua_compatible.as_deref() else {
        return Ok(url.to_string());
    };

    let mut parsed =
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))?;

    let others: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| key != X_UA_COMPATIBLE)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut pairs = parsed.query_pairs_mut();
        pairs.clear();
        for (key, value) in &others {
            pairs.append_pair(key, value);
        }
        pairs.append_pair(X_UA_COMPATIBLE, directive);
    }

    Ok(parsed.into())
}
