//! Data models for the metadata store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single master wallet record. Created once per deployment, mutated by
/// every successful save or backup, never deleted during normal operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletInfo {
    /// Primary blob location of the encrypted wallet file
    pub location: String,
    /// Prefix under which timestamped backups are written
    pub backups_directory: String,
    pub last_save_at: DateTime<Utc>,
    pub last_backup_at: DateTime<Utc>,
}

impl WalletInfo {
    pub fn new(location: String, backups_directory: String) -> Self {
        let now = Utc::now();
        Self {
            location,
            backups_directory,
            last_save_at: now,
            last_backup_at: now,
        }
    }
}

/// Per-subaccount record. The lifecycle core only enumerates these, it never
/// mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubWalletInfo {
    pub address: String,
    pub claimed: bool,
    pub created_at: DateTime<Utc>,
}
