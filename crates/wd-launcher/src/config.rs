//! Launcher configuration
//!
//! Configuration is read either programmatically through the builder or
//! from a TOML file. Inside a file, `${VAR_NAME}` strings are expanded
//! from the environment before parsing.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Remote grid endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    /// Grid hostname
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Grid port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: default_port(),
        }
    }
}

impl GridConfig {
    /// URL the WebDriver client connects to. The `/wd/hub` path is what
    /// Selenium-style grids serve the session API under; the trailing
    /// slash keeps the client joining session paths under it.
    pub fn hub_url(&self) -> String {
        format!("http://{}:{}/wd/hub/", self.hostname, self.port)
    }
}

fn default_hostname() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4444
}

/// Requested browser capabilities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserSpec {
    /// Browser to request from the grid (required)
    #[serde(rename = "browserName", default)]
    pub browser_name: String,

    /// Platform to request
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Browser version, empty means any
    #[serde(default)]
    pub version: String,

    /// Test name reported to the grid
    #[serde(rename = "testName", default = "default_test_name")]
    pub test_name: String,

    /// Tags reported to the grid
    #[serde(default)]
    pub tags: Vec<String>,

    /// Vendor options (e.g. `goog:chromeOptions`) merged verbatim into
    /// the outgoing capabilities
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl BrowserSpec {
    /// Build the capability object sent to the grid.
    ///
    /// Vendor pass-through entries win on key collision, so a config can
    /// override any of the named fields.
    pub fn to_capabilities(&self) -> serde_json::Map<String, Value> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "browserName".to_string(),
            Value::String(self.browser_name.clone()),
        );
        caps.insert("platform".to_string(), Value::String(self.platform.clone()));
        caps.insert("version".to_string(), Value::String(self.version.clone()));
        caps.insert(
            "testName".to_string(),
            Value::String(self.test_name.clone()),
        );
        caps.insert(
            "tags".to_string(),
            Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
        );

        for (key, value) in &self.extra {
            caps.insert(key.clone(), value.clone());
        }

        caps
    }
}

fn default_platform() -> String {
    "ANY".to_string()
}

fn default_test_name() -> String {
    "wd-launcher".to_string()
}

/// Main configuration for wd-launcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Remote grid endpoint
    #[serde(default)]
    pub grid: GridConfig,

    /// Requested browser capabilities
    #[serde(default)]
    pub browser: BrowserSpec,

    /// Keep-alive period in milliseconds. Unset (or zero) disables the
    /// pseudo-activity timer.
    #[serde(default)]
    pub pseudo_activity_interval: Option<u64>,

    /// Compatibility directive the host page renders as a
    /// `<meta http-equiv="X-UA-Compatible" ...>` tag
    #[serde(rename = "x-ua-compatible", default)]
    pub x_ua_compatible: Option<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            browser: BrowserSpec {
                platform: default_platform(),
                test_name: default_test_name(),
                ..BrowserSpec::default()
            },
            pseudo_activity_interval: None,
            x_ua_compatible: None,
        }
    }
}

impl LauncherConfig {
    /// Create a new configuration builder
    pub fn builder() -> LauncherConfigBuilder {
        LauncherConfigBuilder::default()
    }

    /// Check required fields
    pub fn validate(&self) -> Result<()> {
        if self.browser.browser_name.trim().is_empty() {
            return Err(Error::MissingBrowserName);
        }
        Ok(())
    }

    /// Parse configuration from a TOML string.
    ///
    /// `${VAR_NAME}` strings are expanded from the environment first;
    /// missing variables expand to the empty string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: Self = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Keep-alive period as a `Duration`, `None` when disabled
    pub fn keep_alive_period(&self) -> Option<Duration> {
        self.pseudo_activity_interval
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}

/// Expand `${VAR_NAME}` strings from the environment.
fn expand_env_vars(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();

            let mut var_name = String::new();
            while let Some(&next) = chars.peek() {
                if next == '}' {
                    chars.next();
                    break;
                }
                var_name.push(next);
                chars.next();
            }

            if let Ok(value) = std::env::var(&var_name) {
                result.push_str(&value);
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Builder for LauncherConfig
#[derive(Default)]
pub struct LauncherConfigBuilder {
    config: LauncherConfig,
}

impl LauncherConfigBuilder {
    pub fn browser_name(mut self, name: impl Into<String>) -> Self {
        self.config.browser.browser_name = name.into();
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.config.browser.platform = platform.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.browser.version = version.into();
        self
    }

    pub fn test_name(mut self, name: impl Into<String>) -> Self {
        self.config.browser.test_name = name.into();
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.config.browser.tags.push(tag.into());
        self
    }

    /// Add a vendor capability passed through to the grid verbatim
    pub fn capability(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.browser.extra.insert(key.into(), value);
        self
    }

    pub fn grid(mut self, hostname: impl Into<String>, port: u16) -> Self {
        self.config.grid.hostname = hostname.into();
        self.config.grid.port = port;
        self
    }

    pub fn pseudo_activity_interval(mut self, millis: u64) -> Self {
        self.config.pseudo_activity_interval = Some(millis);
        self
    }

    pub fn x_ua_compatible(mut self, directive: impl Into<String>) -> Self {
        self.config.x_ua_compatible = Some(directive.into());
        self
    }

    pub fn build(self) -> Result<LauncherConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grid_config_default() {
        let grid = GridConfig::default();
        assert_eq!(grid.hostname, "127.0.0.1");
        assert_eq!(grid.port, 4444);
        assert_eq!(grid.hub_url(), "http://127.0.0.1:4444/wd/hub/");
    }

    #[test]
    fn test_launcher_config_default() {
        let config = LauncherConfig::default();
        assert_eq!(config.browser.platform, "ANY");
        assert_eq!(config.browser.test_name, "wd-launcher");
        assert!(config.browser.version.is_empty());
        assert!(config.browser.tags.is_empty());
        assert!(config.pseudo_activity_interval.is_none());
        assert!(config.x_ua_compatible.is_none());
    }

    #[test]
    fn test_validate_rejects_missing_browser_name() {
        let config = LauncherConfig::default();
        assert!(matches!(
            config.validate(),
            Err(Error::MissingBrowserName)
        ));

        let config = LauncherConfig::builder().browser_name("  ").build();
        assert!(matches!(config, Err(Error::MissingBrowserName)));
    }

    #[test]
    fn test_builder() {
        let config = LauncherConfig::builder()
            .browser_name("firefox")
            .platform("LINUX")
            .version("128")
            .test_name("smoke suite")
            .tag("nightly")
            .grid("grid.internal", 4445)
            .pseudo_activity_interval(30_000)
            .x_ua_compatible("IE=EmulateIE9")
            .build()
            .unwrap();

        assert_eq!(config.browser.browser_name, "firefox");
        assert_eq!(config.browser.platform, "LINUX");
        assert_eq!(config.grid.hub_url(), "http://grid.internal:4445/wd/hub/");
        assert_eq!(config.keep_alive_period(), Some(Duration::from_millis(30_000)));
        assert_eq!(config.x_ua_compatible.as_deref(), Some("IE=EmulateIE9"));
    }

    #[test]
    fn test_from_toml_str() {
        let config = LauncherConfig::from_toml_str(
            r#"
            pseudo_activity_interval = 10000
            "x-ua-compatible" = "IE=EmulateIE9"

            [grid]
            hostname = "localhost"
            port = 4444

            [browser]
            browserName = "internet explorer"
            version = "9"
            tags = ["legacy"]

            [browser."se:ieOptions"]
            ignoreZoomSetting = true
            "#,
        )
        .unwrap();

        assert_eq!(config.browser.browser_name, "internet explorer");
        assert_eq!(config.browser.version, "9");
        assert_eq!(config.browser.tags, vec!["legacy".to_string()]);
        assert_eq!(config.pseudo_activity_interval, Some(10_000));
        assert_eq!(config.x_ua_compatible.as_deref(), Some("IE=EmulateIE9"));
        assert_eq!(
            config.browser.extra.get("se:ieOptions"),
            Some(&json!({ "ignoreZoomSetting": true }))
        );
    }

    #[test]
    fn test_from_toml_str_rejects_missing_browser_name() {
        let result = LauncherConfig::from_toml_str(
            r#"
            [grid]
            hostname = "localhost"
            "#,
        );
        assert!(matches!(result, Err(Error::MissingBrowserName)));
    }

    #[test]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("WD_LAUNCHER_TEST_HOST", "grid.example.com");
        }

        let config = LauncherConfig::from_toml_str(
            r#"
            [grid]
            hostname = "${WD_LAUNCHER_TEST_HOST}"

            [browser]
            browserName = "chrome${WD_LAUNCHER_TEST_UNSET_VAR}"
            "#,
        )
        .unwrap();

        assert_eq!(config.grid.hostname, "grid.example.com");
        // missing variables expand to the empty string
        assert_eq!(config.browser.browser_name, "chrome");
    }

    #[test]
    fn test_to_capabilities() {
        let config = LauncherConfig::builder()
            .browser_name("chrome")
            .tag("ci")
            .capability("goog:chromeOptions", json!({ "args": ["--headless"] }))
            .pseudo_activity_interval(5_000)
            .build()
            .unwrap();

        let caps = config.browser.to_capabilities();
        assert_eq!(caps.get("browserName"), Some(&json!("chrome")));
        assert_eq!(caps.get("platform"), Some(&json!("ANY")));
        assert_eq!(caps.get("testName"), Some(&json!("wd-launcher")));
        assert_eq!(caps.get("tags"), Some(&json!(["ci"])));
        assert_eq!(
            caps.get("goog:chromeOptions"),
            Some(&json!({ "args": ["--headless"] }))
        );

        // launcher-only settings never leak into capabilities
        assert!(!caps.contains_key("pseudo_activity_interval"));
        assert!(!caps.contains_key("x-ua-compatible"));
        assert!(!caps.contains_key("grid"));
    }

    #[test]
    fn test_capability_pass_through_wins_on_collision() {
        let config = LauncherConfig::builder()
            .browser_name("chrome")
            .capability("platform", json!("WINDOWS"))
            .build()
            .unwrap();

        let caps = config.browser.to_capabilities();
        assert_eq!(caps.get("platform"), Some(&json!("WINDOWS")));
    }

    #[test]
    fn test_keep_alive_period_zero_is_disabled() {
        let config = LauncherConfig::builder()
            .browser_name("chrome")
            .pseudo_activity_interval(0)
            .build()
            .unwrap();
        assert!(config.keep_alive_period().is_none());
    }
}
