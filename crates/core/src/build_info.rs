//! Build metadata shipped alongside the client.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildInfoError {
    #[error("Failed to read build info: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse build info: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Target platform of an application package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Standalone,
    Ios,
    Android,
}

/// Version and download locations of the current build.
///
/// Accepts both snake_case and the PascalCase keys written by the build
/// pipeline (`GameVersion`, `CheckVersionUrl`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    #[serde(alias = "GameVersion")]
    pub game_version: String,
    #[serde(alias = "InternalGameVersion")]
    pub internal_game_version: u32,
    #[serde(alias = "CheckVersionUrl")]
    pub check_version_url: String,
    #[serde(alias = "StandaloneAppUrl")]
    pub standalone_app_url: String,
    #[serde(alias = "IosAppUrl")]
    pub ios_app_url: String,
    #[serde(alias = "AndroidAppUrl")]
    pub android_app_url: String,
}

impl BuildInfo {
    pub fn from_json(json: &str) -> Result<Self, BuildInfoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, BuildInfoError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Where users of `platform` download a new application package.
    pub fn app_url(&self, platform: Platform) -> &str {
        match platform {
            Platform::Standalone => &self.standalone_app_url,
            Platform::Ios => &self.ios_app_url,
            Platform::Android => &self.android_app_url,
        }
    }
}
