//! Per-resource transfer bookkeeping.

use serde::{Deserialize, Serialize};

/// Transfer record for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    /// Bytes transferred so far, or the final compressed length once succeeded.
    pub length: u64,
    pub succeeded: bool,
}

impl ResourceEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            length: 0,
            succeeded: false,
        }
    }
}

/// Result of [`ResourceTracker::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new entry was created.
    Created,
    /// An entry already existed and its length was reset.
    Restarted,
}

/// Insertion-ordered set of resource entries keyed by name.
///
/// Lookups scan linearly; sessions track tens to low hundreds of items.
#[derive(Debug, Clone, Default)]
pub struct ResourceTracker {
    entries: Vec<ResourceEntry>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Begin tracking `name`, or reset it if it is already tracked.
    pub fn start(&mut self, name: &str) -> StartOutcome {
        match self.position(name) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.length = 0;
                entry.succeeded = false;
                StartOutcome::Restarted
            }
            None => {
                self.entries.push(ResourceEntry::new(name));
                StartOutcome::Created
            }
        }
    }

    /// Set the transferred length. Returns false if `name` is not tracked.
    pub fn update_length(&mut self, name: &str, length: u64) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.entries[idx].length = length;
                true
            }
            None => false,
        }
    }

    /// Record the final length of a finished resource.
    ///
    /// Returns false if `name` is not tracked.
    pub fn mark_success(&mut self, name: &str, final_length: u64) -> bool {
        match self.position(name) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.length = final_length;
                entry.succeeded = true;
                true
            }
            None => false,
        }
    }

    /// Stop tracking `name`.
    pub fn remove(&mut self, name: &str) -> Option<ResourceEntry> {
        self.position(name).map(|idx| self.entries.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the lengths of all tracked entries, saturating at `u64::MAX`.
    pub fn transferred_bytes(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.length))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
