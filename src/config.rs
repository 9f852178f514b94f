//! Viewer configuration: defaults, TOML file, command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::connection::{socket_url, ConnectionConfig, DEFAULT_RECONNECT_DELAY};
use crate::error::{LiveViewError, Result};
use crate::layout::LayoutVersion;

pub const DEFAULT_PAGE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// Page origin of the webserver; the socket URL is derived from it.
    pub url: String,
    pub layout: LayoutVersion,
    pub reconnect_ms: u64,
    pub snapshot: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PAGE_URL.to_string(),
            layout: LayoutVersion::default(),
            reconnect_ms: DEFAULT_RECONNECT_DELAY.as_millis() as u64,
            snapshot: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then the `--config` file if any, then explicit flags.
    pub fn resolve(args: &Args) -> Result<Self> {
        let base = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        let config = base.merge(args);
        config.validate()?;
        Ok(config)
    }

    /// A zero reconnect delay would redial in a tight loop.
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_ms == 0 {
            return Err(LiveViewError::InvalidConfig(
                "reconnect_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Overlay the flags that were actually given.
    pub fn merge(mut self, args: &Args) -> Self {
        if let Some(url) = &args.url {
            self.url.clone_from(url);
        }
        if let Some(layout) = args.layout {
            self.layout = layout;
        }
        if let Some(ms) = args.reconnect_ms {
            self.reconnect_ms = ms;
        }
        if let Some(path) = &args.snapshot {
            self.snapshot = Some(path.clone());
        }
        self
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_ms)
    }

    pub fn connection(&self) -> Result<ConnectionConfig> {
        Ok(ConnectionConfig::new(socket_url(&self.url)?).reconnect_delay(self.reconnect_delay()))
    }
}
