//! Wallet instance registry & restart engine
//!
//! Process-wide owner of the single active wallet instance. Every access
//! request re-evaluates the restart policy; the whole
//! read-current / decide / build / swap / stop-old sequence runs under one
//! mutex so concurrent callers can never both install a replacement.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::{ServiceConfig, ServiceSecrets};
use crate::engine::{WalletEngine, WalletEngineFactory};
use crate::error::ServiceError;
use crate::persistence::WalletPersistence;
use crate::storage::WalletInfo;
use crate::sync::{wait_for_sync, NodeHealthSink};

/// Maximum lifetime of a wallet instance. Bounds memory growth and forces a
/// periodic resync from the persisted blob.
pub const MAX_INSTANCE_AGE: Duration = Duration::from_secs(10 * 60);

/// Blocks re-scanned on every reload, covering near-tip forks and blocks
/// missed while the previous instance was winding down.
pub const DEFAULT_REWIND_DISTANCE: u64 = 40;

/// How long a freshly created wallet is given to perform its initial sync
/// before it is persisted for the first time.
pub const INITIAL_SYNC_GRACE: Duration = Duration::from_secs(20);

struct ActiveInstance {
    handle: Arc<dyn WalletEngine>,
    daemon_host: String,
    daemon_port: u16,
    started_at: Instant,
    /// `last_save_at` observed when this instance was loaded. A newer value
    /// in the metadata record means another process saved a fresher blob.
    loaded_save_at: DateTime<Utc>,
}

pub struct WalletRegistry {
    active: Mutex<Option<ActiveInstance>>,
    factory: Arc<dyn WalletEngineFactory>,
    persistence: Arc<WalletPersistence>,
    node_health: Arc<dyn NodeHealthSink>,
    wallet_password: String,
    wallet_location: String,
    wallet_backups_directory: String,
}

impl WalletRegistry {
    pub fn new(
        factory: Arc<dyn WalletEngineFactory>,
        persistence: Arc<WalletPersistence>,
        node_health: Arc<dyn NodeHealthSink>,
        secrets: &ServiceSecrets,
    ) -> Self {
        Self {
            active: Mutex::new(None),
            factory,
            persistence,
            node_health,
            wallet_password: secrets.wallet_password.clone(),
            wallet_location: secrets.wallet_location.clone(),
            wallet_backups_directory: secrets.wallet_backups_directory.clone(),
        }
    }

    /// Resolve the active wallet instance, restarting it first when the
    /// restart policy demands it.
    ///
    /// Returns a borrowed handle: valid until the registry installs a
    /// replacement, at which point in-flight reads on it still complete but
    /// new work must re-acquire. Fails closed; the caller retries the whole
    /// acquisition.
    pub async fn acquire(
        &self,
        config: &ServiceConfig,
        force_restart: bool,
        rewind_distance: u64,
    ) -> Result<Arc<dyn WalletEngine>, ServiceError> {
        if config.service_halted {
            return Err(ServiceError::ServiceHalted);
        }

        let mut slot = self.active.lock().await;

        let info = self.persistence.wallet_info_required().await?;

        if let Some(current) = slot.as_ref() {
            if !force_restart && !Self::restart_required(current, config, &info) {
                return Ok(current.handle.clone());
            }
        } else {
            log::info!("No active wallet instance, loading one");
        }
        if force_restart {
            log::info!("Wallet restart forced by caller");
        }

        let blob = self.persistence.fetch_master_blob(&info).await?;
        let handle = self
            .factory
            .open(
                &blob,
                &self.wallet_password,
                &config.daemon_host,
                config.daemon_port,
            )
            .await?;

        if rewind_distance > 0 {
            let status = handle.sync_status().await;
            let to_height = status.wallet_height.saturating_sub(rewind_distance);
            handle.rewind(to_height).await?;
            log::info!(
                "Rewound new wallet instance from {} to {}",
                status.wallet_height,
                to_height
            );
        }

        // Install the replacement before stopping its predecessor so there is
        // never a window with zero active instances.
        let previous = slot.replace(ActiveInstance {
            handle: handle.clone(),
            daemon_host: config.daemon_host.clone(),
            daemon_port: config.daemon_port,
            started_at: Instant::now(),
            loaded_save_at: info.last_save_at,
        });

        if let Some(previous) = previous {
            log::info!(
                "Stopping superseded wallet instance (was bound to {}:{})",
                previous.daemon_host,
                previous.daemon_port
            );
            previous.handle.stop().await;
        }

        Ok(handle)
    }

    /// [`acquire`](Self::acquire) and block until the instance is synced. A
    /// sync failure discards the active instance so the next acquisition
    /// starts clean instead of retrying against a poisoned handle.
    pub async fn acquire_synced(
        &self,
        config: &ServiceConfig,
        force_restart: bool,
        rewind_distance: u64,
    ) -> Result<Arc<dyn WalletEngine>, ServiceError> {
        let handle = self.acquire(config, force_restart, rewind_distance).await?;

        if wait_for_sync(
            &handle,
            config.wait_for_sync_timeout,
            self.node_health.as_ref(),
        )
        .await
        {
            return Ok(handle);
        }

        self.discard_active().await;
        Err(ServiceError::MasterWalletSyncFailed)
    }

    /// Stop and drop the active instance, if any.
    pub async fn discard_active(&self) {
        let mut slot = self.active.lock().await;
        if let Some(previous) = slot.take() {
            log::warn!("Discarding active wallet instance");
            previous.handle.stop().await;
        }
    }

    /// One-time master wallet creation.
    ///
    /// Creates the metadata record (refusing if one exists), creates a fresh
    /// wallet bound to the configured daemon, gives it a fixed grace period
    /// for initial sync, persists it, and installs it as the active instance.
    /// Returns the mnemonic seed phrase. This is the only path that surfaces
    /// secret recovery material; it is handed to the caller exactly once.
    pub async fn create_master_wallet(
        &self,
        config: &ServiceConfig,
    ) -> Result<String, ServiceError> {
        if config.service_halted {
            return Err(ServiceError::ServiceHalted);
        }

        let mut slot = self.active.lock().await;

        let info = WalletInfo::new(
            self.wallet_location.clone(),
            self.wallet_backups_directory.clone(),
        );
        self.persistence.create_wallet_info(&info).await?;

        let new_wallet = self
            .factory
            .create(
                &self.wallet_password,
                &config.daemon_host,
                config.daemon_port,
            )
            .await?;

        log::info!(
            "Master wallet created, allowing {:?} for initial sync",
            INITIAL_SYNC_GRACE
        );
        tokio::time::sleep(INITIAL_SYNC_GRACE).await;

        let saved_at = self.persistence.save(&new_wallet.engine).await?;

        let previous = slot.replace(ActiveInstance {
            handle: new_wallet.engine,
            daemon_host: config.daemon_host.clone(),
            daemon_port: config.daemon_port,
            started_at: Instant::now(),
            loaded_save_at: saved_at,
        });
        if let Some(previous) = previous {
            previous.handle.stop().await;
        }

        Ok(new_wallet.mnemonic)
    }

    fn restart_required(
        current: &ActiveInstance,
        config: &ServiceConfig,
        info: &WalletInfo,
    ) -> bool {
        if current.daemon_host != config.daemon_host || current.daemon_port != config.daemon_port {
            log::info!(
                "Wallet restart required: daemon changed {}:{} -> {}:{}",
                current.daemon_host,
                current.daemon_port,
                config.daemon_host,
                config.daemon_port
            );
            return true;
        }

        let age = current.started_at.elapsed();
        if age >= MAX_INSTANCE_AGE {
            log::info!("Wallet restart required: instance is {:?} old", age);
            return true;
        }

        if current.loaded_save_at != info.last_save_at {
            log::info!(
                "Wallet restart required: newer save exists ({} -> {})",
                current.loaded_save_at,
                info.last_save_at
            );
            return true;
        }

        false
    }
}
