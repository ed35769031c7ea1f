//! Metadata store client
//!
//! Holds the single [`WalletInfo`] document plus the sub-wallet collection.
//! The document store is an external collaborator; the trait is the contract
//! the lifecycle core relies on, including read-after-write consistency on
//! the single wallet-info document. A file-backed implementation ships here
//! for local deployments and tests.

use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

use super::models::{SubWalletInfo, WalletInfo};
use crate::error::StorageError;

#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch the master wallet record; `Ok(None)` when it was never created.
    async fn get_wallet_info(&self) -> Result<Option<WalletInfo>, StorageError>;

    /// Create the master wallet record. Fails with
    /// [`StorageError::AlreadyExists`] if one exists, leaving it untouched.
    async fn create_wallet_info(&self, info: &WalletInfo) -> Result<(), StorageError>;

    /// Overwrite the master wallet record.
    async fn update_wallet_info(&self, info: &WalletInfo) -> Result<(), StorageError>;

    /// Enumerate sub-wallet records, optionally filtered by the claimed flag.
    async fn list_sub_wallets(
        &self,
        claimed: Option<bool>,
    ) -> Result<Vec<SubWalletInfo>, StorageError>;
}

const WALLET_INFO_DOC: &str = "wallet-info.json";
const SUB_WALLETS_DOC: &str = "sub-wallets.json";

/// JSON documents under a base directory.
#[derive(Clone)]
pub struct FileMetadataStore {
    base_path: PathBuf,
}

impl FileMetadataStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn info_path(&self) -> PathBuf {
        self.base_path.join(WALLET_INFO_DOC)
    }

    fn sub_wallets_path(&self) -> PathBuf {
        self.base_path.join(SUB_WALLETS_DOC)
    }
}

#[async_trait]
impl MetadataStore for FileMetadataStore {
    async fn get_wallet_info(&self) -> Result<Option<WalletInfo>, StorageError> {
        let path = self.info_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        let info = serde_json::from_str(&contents)?;
        Ok(Some(info))
    }

    async fn create_wallet_info(&self, info: &WalletInfo) -> Result<(), StorageError> {
        let path = self.info_path();
        if path.exists() {
            return Err(StorageError::AlreadyExists(path.display().to_string()));
        }
        fs::create_dir_all(&self.base_path)?;
        let json = serde_json::to_string_pretty(info)?;
        fs::write(path, json)?;
        Ok(())
    }

    async fn update_wallet_info(&self, info: &WalletInfo) -> Result<(), StorageError> {
        let path = self.info_path();
        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }
        let json = serde_json::to_string_pretty(info)?;
        fs::write(path, json)?;
        Ok(())
    }

    async fn list_sub_wallets(
        &self,
        claimed: Option<bool>,
    ) -> Result<Vec<SubWalletInfo>, StorageError> {
        let path = self.sub_wallets_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path)?;
        let mut records: Vec<SubWalletInfo> = serde_json::from_str(&contents)?;
        if let Some(flag) = claimed {
            records.retain(|r| r.claimed == flag);
        }
        Ok(records)
    }
}
