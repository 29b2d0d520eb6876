use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::localization::LocalizationConfig;
use crate::update::{Connectivity, UpdateConfig};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub update: UpdateConfig,
    #[serde(default)]
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub localization: LocalizationConfig,
    #[serde(default)]
    pub build_info: Option<BuildInfoConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8080
}

/// Connectivity reported before anyone changes it at runtime
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectivityConfig {
    #[serde(default = "default_connectivity")]
    pub initial: Connectivity,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            initial: default_connectivity(),
        }
    }
}

fn default_connectivity() -> Connectivity {
    Connectivity::Unrestricted
}

/// Location of the build metadata file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildInfoConfig {
    pub path: PathBuf,
}
