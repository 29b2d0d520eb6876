//! Localized string lookup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::update::config::{
    default_cancel_key, default_confirm_key, default_message_key, default_title_key,
};

/// Resolves localization keys to display strings.
pub trait Localizer: Send + Sync {
    /// Look up `key`. Unknown keys resolve to the key itself.
    fn get_string(&self, key: &str) -> String;
}

/// Localization configuration: overrides merged over built-in strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizationConfig {
    #[serde(default)]
    pub strings: HashMap<String, String>,
}

/// In-memory string table.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: HashMap<String, String>,
}

impl StringTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// English strings for the metered-network dialog.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.insert(default_title_key(), "Update Resources");
        table.insert(
            default_message_key(),
            "You are connected through a carrier data network. Updating resources may use a lot of mobile data. Continue?",
        );
        table.insert(default_confirm_key(), "Update");
        table.insert(default_cancel_key(), "Quit");
        table
    }

    /// Built-in strings overridden by configured ones.
    pub fn from_config(config: &LocalizationConfig) -> Self {
        let mut table = Self::with_defaults();
        for (key, value) in &config.strings {
            table.insert(key.clone(), value.clone());
        }
        table
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Localizer for StringTable {
    fn get_string(&self, key: &str) -> String {
        match self.strings.get(key) {
            Some(value) => value.clone(),
            None => {
                warn!("Missing localized string for key '{}'", key);
                key.to_string()
            }
        }
    }
}
