//! Process configuration: a TOML file plus CLI overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Static self-description of this service, returned through the `orb` sentinel.
#[derive(Debug, Clone, Deserialize)]
pub struct OrbDescription {
    pub author: String,
    pub description: String,
    pub provenance: String,
    pub version: String,
}

impl Default for OrbDescription {
    fn default() -> Self {
        Self {
            author: "orbql".to_string(),
            description: "a SPARQL service layer backed by registered procedures".to_string(),
            provenance: "orbql-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn default_bind_port() -> u16 {
    8765
}

/// The procedure groups to register at startup, each resolved against a fixed table
/// of `register` functions compiled into `orbql-procedures`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegistryManifest {
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub allow_remote_access: bool,
    #[serde(default)]
    pub ip_whitelist: Vec<String>,
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default)]
    pub registry_manifest: RegistryManifest,
    #[serde(default)]
    pub orb_description: OrbDescription,
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

fn default_log_directory() -> PathBuf {
    PathBuf::from("./orbql-logs")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            debug: false,
            allow_remote_access: false,
            ip_whitelist: Vec::new(),
            log_directory: default_log_directory(),
            registry_manifest: RegistryManifest::default(),
            orb_description: OrbDescription::default(),
            bind_port: default_bind_port(),
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn is_allowed(&self, remote_ip: &str) -> bool {
        self.ip_whitelist.is_empty() || self.ip_whitelist.iter().any(|ip| ip == remote_ip)
    }

    pub fn bind_address(&self) -> String {
        let host = if self.allow_remote_access { "0.0.0.0" } else { "127.0.0.1" };
        format!("{host}:{}", self.bind_port)
    }
}
