//! SSR host configuration parsed from environment variables.
//!
//! SYSTEM CONTEXT
//! ==============
//! The host only owns its listen address. Everything the portal itself needs
//! (default locale, paths, Firebase project) is `PortalConfig`, read from the
//! same environment so the shell and the rendered app agree.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use portal::config::{ConfigError, PortalConfig};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid PORT: {0}")]
    InvalidPort(String),

    #[error(transparent)]
    Portal(#[from] ConfigError),

    #[error("leptos configuration: {0}")]
    Leptos(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub bind_addr: String,
    pub port: u16,
    pub portal: PortalConfig,
}

impl HostConfig {
    /// Build host config from process environment variables.
    ///
    /// # Errors
    ///
    /// See [`HostConfig::from_lookup`].
    pub fn from_env() -> Result<Self, HostError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build host config from any key lookup.
    ///
    /// - `BIND_ADDR`: default `0.0.0.0`
    /// - `PORT`: default 3000
    /// - `PORTAL_*`: see [`PortalConfig::from_lookup`]
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is not a valid port number or the portal
    /// config is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HostError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| HostError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned()),
            port,
            portal: PortalConfig::from_lookup(&lookup)?,
        })
    }

    #[must_use]
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
