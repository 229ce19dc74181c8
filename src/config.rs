use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "DASHSERVE_DATA_DIR";
pub const PORT_ENV: &str = "DASHSERVE_PORT";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub assets: Option<Assets>,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}
fn default_bind_addr() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5174 }

impl Default for Server {
    fn default() -> Self {
        Self { bind_addr: default_bind_addr(), port: default_port() }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Data {
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    #[serde(default = "default_mount")]
    pub mount: String,
}
fn default_root_dir() -> PathBuf { PathBuf::from("data") }
fn default_mount() -> String { "/data".to_string() }

impl Default for Data {
    fn default() -> Self {
        Self { root_dir: default_root_dir(), mount: default_mount() }
    }
}

/// Built dashboard assets served when a request is not for the data mount.
#[derive(Debug, Deserialize, Clone)]
pub struct Assets { pub dir: PathBuf }

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Logging {
    #[serde(default)]
    pub format: LogFormat,
    /// Per-request diagnostics (decoded and resolved paths). Off unless asked for.
    #[serde(default)]
    pub log_requests: bool,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() { Self::load(path) } else { Ok(Self::default()) }
    }

    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(std::env::var(DATA_DIR_ENV).ok(), std::env::var(PORT_ENV).ok())
    }

    pub fn apply_overrides(&mut self, data_dir: Option<String>, port: Option<String>) -> anyhow::Result<()> {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            self.data.root_dir = PathBuf::from(dir);
        }
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("{PORT_ENV} is not a valid port: {e}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.data.root_dir.is_dir() {
            anyhow::bail!("root_dir does not exist or is not a directory: {}", self.data.root_dir.display());
        }
        if !self.data.mount.starts_with('/') { anyhow::bail!("mount must start with '/'"); }
        if self.data.mount.ends_with('/') { anyhow::bail!("mount must not end with '/' or be '/' itself"); }
        if self.server.port == 0 { anyhow::bail!("port must be > 0"); }
        if let Some(assets) = &self.assets {
            if !assets.dir.is_dir() {
                anyhow::bail!("assets dir does not exist or is not a directory: {}", assets.dir.display());
            }
        }
        Ok(())
    }
}

pub fn canonical_root(root: &Path) -> anyhow::Result<PathBuf> {
    let c = dunce::canonicalize(root)?;
    Ok(c)
}
