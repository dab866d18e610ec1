use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

const CATALOG_FILE: &str = "catalog.db";
const CREDENTIALS_FILE: &str = "admin.db";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Catalog database file. Defaults to `catalog.db` under `data_dir`.
    pub catalog_path: Option<PathBuf>,
    /// Administrator database file. Defaults to `admin.db` under `data_dir`.
    pub credentials_path: Option<PathBuf>,
    pub session_ttl_minutes: i64,
}

/// Settings read from a TOML file. Anything left out keeps its current
/// value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub data_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
    pub session_ttl_minutes: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(CATALOG_FILE))
    }

    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(CREDENTIALS_FILE))
    }

    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes)
    }

    /// Overlays values from a config file onto this config.
    pub fn merge(&mut self, file: FileConfig) -> Result<()> {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(data_dir) = file.data_dir {
            self.data_dir = data_dir;
        }
        if file.catalog_path.is_some() {
            self.catalog_path = file.catalog_path;
        }
        if file.credentials_path.is_some() {
            self.credentials_path = file.credentials_path;
        }
        if let Some(minutes) = file.session_ttl_minutes {
            if minutes <= 0 {
                return Err(Error::Config(
                    "session_ttl_minutes must be positive".to_string(),
                ));
            }
            self.session_ttl_minutes = minutes;
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            catalog_path: None,
            credentials_path: None,
            session_ttl_minutes: 12 * 60,
        }
    }
}
