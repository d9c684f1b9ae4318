//! wd-launcher: WebDriver grid launcher for browser test runners
//!
//! Opens a remote browser session on a WebDriver-compatible grid (for
//! example a Selenium hub), points it at the page served by the host test
//! runner, optionally keeps the session alive with periodic pseudo
//! activity, and tears it down when the runner asks.
//!
//! Session negotiation, capability matching and the wire protocol all
//! live in the WebDriver client and the grid itself; this crate is the
//! configuration and lifecycle glue between them and the runner.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wd_launcher::{Launcher, LauncherConfig, WebDriverLauncher};
//!
//! let config = LauncherConfig::builder()
//!     .browser_name("chrome")
//!     .grid("selenium.internal", 4444)
//!     .pseudo_activity_interval(30_000)
//!     .build()?;
//!
//! let mut launcher = WebDriverLauncher::new(config)?;
//! launcher.start("http://localhost:9876/?id=42").await?;
//! // ... the runner drives the suite ...
//! launcher.kill().await?;
//! ```

pub mod config;
pub mod error;
pub mod launcher;
pub mod session;

pub use config::{BrowserSpec, GridConfig, LauncherConfig, LauncherConfigBuilder};
pub use error::{Error, Result};
pub use launcher::{Launcher, WebDriverLauncher, merge_compat_directive};
pub use session::GridSession;
