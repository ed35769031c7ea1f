//! Wallet engine seam
//!
//! The wallet engine (chain sync, key management, encryption of the wallet
//! blob) is an external collaborator. The lifecycle core only depends on the
//! capability set below.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ServiceError;

/// A wallet is considered caught up when it trails the network by at most
/// this many blocks.
pub const SYNC_THRESHOLD_BLOCKS: u64 = 2;

/// Snapshot of the wallet's position relative to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSyncInfo {
    pub wallet_height: u64,
    pub network_height: u64,
}

impl WalletSyncInfo {
    pub fn height_delta(&self) -> u64 {
        self.network_height.saturating_sub(self.wallet_height)
    }

    pub fn is_synced(&self) -> bool {
        self.height_delta() <= SYNC_THRESHOLD_BLOCKS
    }
}

/// Live wallet handle.
///
/// Handles are shared: the registry owns the active instance and callers hold
/// borrowed `Arc` clones. `stop` only closes the daemon connection and event
/// emission; read operations on outstanding clones stay valid.
#[async_trait]
pub trait WalletEngine: Send + Sync {
    /// Daemon peer this instance was bound to at load time
    fn daemon_host(&self) -> &str;
    fn daemon_port(&self) -> u16;

    async fn sync_status(&self) -> WalletSyncInfo;

    /// Resolves the first time the engine reports itself caught up with the
    /// network. May pend indefinitely against a stalled peer, so callers race
    /// it with a timeout.
    async fn synced(&self);

    /// Re-scan from `to_height`, reprocessing already-seen blocks.
    async fn rewind(&self, to_height: u64) -> Result<(), ServiceError>;

    /// Serialize the wallet to its encrypted transportable form.
    async fn serialize_encrypted(&self, password: &str) -> Result<String, ServiceError>;

    /// Close the daemon connection and detach event emission. Idempotent from
    /// the engine's point of view; the registry still guarantees it is called
    /// at most once per superseded instance.
    async fn stop(&self);
}

impl std::fmt::Debug for dyn WalletEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletEngine")
            .field("daemon_host", &self.daemon_host())
            .field("daemon_port", &self.daemon_port())
            .finish()
    }
}

/// Constructs wallet engine instances. Implemented by the wallet backend
/// integration; the file decode failure path must be distinguishable from
/// blob absence (the factory never sees an absent blob).
#[async_trait]
pub trait WalletEngineFactory: Send + Sync {
    /// Open an existing wallet from its encrypted serialized form, bound to
    /// the given daemon peer.
    async fn open(
        &self,
        blob: &str,
        password: &str,
        daemon_host: &str,
        daemon_port: u16,
    ) -> Result<Arc<dyn WalletEngine>, ServiceError>;

    /// Create a brand-new wallet bound to the given daemon peer.
    async fn create(
        &self,
        password: &str,
        daemon_host: &str,
        daemon_port: u16,
    ) -> Result<NewWallet, ServiceError>;
}

/// Result of creating a fresh wallet. The mnemonic is the one-time recovery
/// credential; it is handed to the caller and never logged or stored.
pub struct NewWallet {
    pub engine: Arc<dyn WalletEngine>,
    pub mnemonic: String,
}
