//! Server configuration
//!
//! Defaults, optionally overlaid by a YAML file named in `HOMESPUN_CONFIG`,
//! then by individual `HOMESPUN_*` environment variables.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;

use crate::handlers::{BasicHandler, FileHandler, RequestHandler};
use crate::http::connection::ConnectionSettings;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub handler: HandlerConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub total_timeout_ms: u64,
    pub transfer_timeout_ms: u64,
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerKind {
    Basic,
    Files,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub kind: HandlerKind,
    /// Directory served by the file handler
    pub root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            handler: HandlerConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let settings = ConnectionSettings::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            total_timeout_ms: settings.total_timeout.as_millis() as u64,
            transfer_timeout_ms: settings.transfer_timeout.as_millis() as u64,
            max_header_bytes: settings.max_header_bytes,
            max_body_bytes: settings.max_body_bytes,
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            kind: HandlerKind::Basic,
            root: PathBuf::from("."),
        }
    }
}

impl ServerConfig {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            total_timeout: Duration::from_millis(self.total_timeout_ms),
            transfer_timeout: Duration::from_millis(self.transfer_timeout_ms),
            max_header_bytes: self.max_header_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl HandlerConfig {
    pub fn build(&self) -> Arc<dyn RequestHandler> {
        match self.kind {
            HandlerKind::Basic => Arc::new(BasicHandler),
            HandlerKind::Files => Arc::new(FileHandler::new(self.root.clone())),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Loads configuration using `var` to look up environment variables.
    pub fn load_from<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match var("HOMESPUN_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(host) = var("HOMESPUN_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = var("HOMESPUN_PORT") {
            cfg.server.port = port
                .parse()
                .with_context(|| format!("HOMESPUN_PORT is not a port number: {:?}", port))?;
        }
        if let Some(kind) = var("HOMESPUN_HANDLER") {
            cfg.handler.kind = match kind.to_ascii_lowercase().as_str() {
                "basic" => HandlerKind::Basic,
                "files" => HandlerKind::Files,
                other => bail!("unknown handler {:?}, expected `basic` or `files`", other),
            };
        }
        if let Some(root) = var("HOMESPUN_ROOT") {
            cfg.handler.root = PathBuf::from(root);
        }
        if let Some(level) = var("HOMESPUN_LOG") {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let server = &self.server;

        if server.host.is_empty() {
            bail!("server.host must not be empty");
        }
        if server.total_timeout_ms == 0 || server.transfer_timeout_ms == 0 {
            bail!("timeouts must be greater than zero");
        }
        if server.transfer_timeout_ms > server.total_timeout_ms {
            bail!(
                "transfer timeout ({} ms) exceeds total timeout ({} ms)",
                server.transfer_timeout_ms,
                server.total_timeout_ms
            );
        }
        if server.max_header_bytes == 0 {
            bail!("server.max_header_bytes must be greater than zero");
        }

        Ok(())
    }
}
