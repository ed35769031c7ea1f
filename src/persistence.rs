//! Persistence facade
//!
//! Dual-location persistence for the master wallet: the primary blob store
//! holds the encrypted wallet file, timestamped backups go under the backups
//! prefix, and every save is mirrored into the remote delegate's storage
//! project. Only the primary write gates the metadata timestamp update; the
//! mirror and backups are best-effort.

use chrono::{DateTime, Utc};
use std::io::Write;
use std::sync::Arc;

use crate::config::ServiceSecrets;
use crate::engine::WalletEngine;
use crate::error::ServiceError;
use crate::storage::{BlobStore, MetadataStore, MirrorStoreFactory, SubWalletInfo, WalletInfo};

/// Where mirrored saves go, and how to authenticate to get there.
pub struct MirrorTarget {
    /// Location (in primary storage) of the service-account credential blob
    pub credential_location: String,
    /// Destination of the wallet copy inside the mirror project
    pub wallet_location: String,
    pub factory: Arc<dyn MirrorStoreFactory>,
}

pub struct WalletPersistence {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    mirror: Option<MirrorTarget>,
    wallet_password: String,
}

impl WalletPersistence {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        mirror: Option<MirrorTarget>,
        secrets: &ServiceSecrets,
    ) -> Self {
        Self {
            metadata,
            blobs,
            mirror,
            wallet_password: secrets.wallet_password.clone(),
        }
    }

    /// Fetch the master wallet record, mapping absence to the
    /// `master-wallet-info` failure.
    pub async fn wallet_info_required(&self) -> Result<WalletInfo, ServiceError> {
        self.metadata
            .get_wallet_info()
            .await?
            .ok_or_else(|| ServiceError::MasterWalletInfo("record has not been created".into()))
    }

    /// Fetch the encrypted wallet blob at its recorded location, mapping
    /// absence to the `master-wallet-file` failure. A blob that is present
    /// but not valid UTF-8 is a decode failure, reported distinctly.
    pub async fn fetch_master_blob(&self, info: &WalletInfo) -> Result<String, ServiceError> {
        let bytes = self
            .blobs
            .get(&info.location)
            .await?
            .ok_or_else(|| ServiceError::MasterWalletFile(info.location.clone()))?;
        String::from_utf8(bytes).map_err(|e| {
            ServiceError::MasterWalletFile(format!("blob at {} is corrupt: {}", info.location, e))
        })
    }

    /// Probe for a persisted wallet. `Ok(None)` when the metadata record or
    /// the blob is absent; store and decode failures are errors.
    pub async fn load(&self) -> Result<Option<(WalletInfo, String)>, ServiceError> {
        let Some(info) = self.metadata.get_wallet_info().await? else {
            return Ok(None);
        };
        let Some(bytes) = self.blobs.get(&info.location).await? else {
            return Ok(None);
        };
        let blob = String::from_utf8(bytes).map_err(|e| {
            ServiceError::MasterWalletFile(format!("blob at {} is corrupt: {}", info.location, e))
        })?;
        Ok(Some((info, blob)))
    }

    /// Create the master wallet record. Fails if one already exists, without
    /// touching it.
    pub async fn create_wallet_info(&self, info: &WalletInfo) -> Result<(), ServiceError> {
        self.metadata.create_wallet_info(info).await.map_err(|e| {
            ServiceError::MasterWalletInfo(format!("record creation refused: {}", e))
        })
    }

    /// Serialize the wallet and write it to the primary location and the
    /// mirror concurrently. Mirror failure is logged and swallowed; primary
    /// success gates the `last_save_at` update, whose new value is returned.
    pub async fn save(&self, handle: &Arc<dyn WalletEngine>) -> Result<DateTime<Utc>, ServiceError> {
        let mut info = self.wallet_info_required().await?;
        let encoded = handle.serialize_encrypted(&self.wallet_password).await?;

        let primary = self.blobs.put(&info.location, encoded.as_bytes());
        let mirror = self.mirror_save(&encoded);
        let (primary_result, mirror_result) = futures::join!(primary, mirror);

        if let Err(e) = mirror_result {
            log::warn!("Mirror save failed, primary save unaffected: {}", e);
        }
        primary_result?;

        info.last_save_at = Utc::now();
        self.metadata.update_wallet_info(&info).await?;
        log::info!(
            "Master wallet saved to {} at {}",
            info.location,
            info.last_save_at
        );
        Ok(info.last_save_at)
    }

    /// Write a timestamped copy of the wallet under the backups prefix and
    /// bump `last_backup_at`. Best-effort: every failure is logged and
    /// swallowed so a broken backup never aborts the caller's workflow.
    pub async fn backup(&self, handle: &Arc<dyn WalletEngine>) {
        if let Err(e) = self.try_backup(handle).await {
            log::error!("Wallet backup failed: {}", e);
        }
    }

    async fn try_backup(&self, handle: &Arc<dyn WalletEngine>) -> Result<(), ServiceError> {
        let mut info = self.wallet_info_required().await?;
        let encoded = handle.serialize_encrypted(&self.wallet_password).await?;

        let name = format!(
            "{}/{}",
            info.backups_directory.trim_end_matches('/'),
            Utc::now().format("%Y-%m-%dT%H-%M-%SZ")
        );
        self.blobs.put(&name, encoded.as_bytes()).await?;

        info.last_backup_at = Utc::now();
        self.metadata.update_wallet_info(&info).await?;
        log::info!("Wallet backup written to {}", name);
        Ok(())
    }

    /// Read-only sub-wallet enumeration, optionally filtered by the claimed
    /// flag.
    pub async fn list_sub_wallets(
        &self,
        claimed: Option<bool>,
    ) -> Result<Vec<SubWalletInfo>, ServiceError> {
        Ok(self.metadata.list_sub_wallets(claimed).await?)
    }

    /// Mirror the encoded wallet into the delegate's storage project. The
    /// service-account credential is fetched from primary storage and staged
    /// to a temporary file that is removed on every exit path.
    async fn mirror_save(&self, encoded: &str) -> Result<(), ServiceError> {
        let Some(target) = &self.mirror else {
            return Ok(());
        };

        let credential = self
            .blobs
            .get(&target.credential_location)
            .await?
            .ok_or_else(|| {
                ServiceError::Internal(format!(
                    "mirror credential blob missing at {}",
                    target.credential_location
                ))
            })?;

        // NamedTempFile deletes itself when dropped, whichever way this
        // function exits.
        let mut staged = tempfile::NamedTempFile::new()
            .map_err(|e| ServiceError::Internal(format!("credential staging failed: {}", e)))?;
        staged
            .write_all(&credential)
            .map_err(|e| ServiceError::Internal(format!("credential staging failed: {}", e)))?;
        staged
            .flush()
            .map_err(|e| ServiceError::Internal(format!("credential staging failed: {}", e)))?;

        let store = target.factory.connect(staged.path()).await?;
        store.put(&target.wallet_location, encoded.as_bytes()).await?;
        log::debug!("Wallet mirrored to {}", target.wallet_location);
        Ok(())
    }
}
