//! Sync wait coordinator
//!
//! Blocks a caller until the wallet is caught up with the network, racing the
//! engine's synced event against a timeout. First resolution wins; the losing
//! branch is dropped by the `select!` and cannot fire afterwards.

use std::sync::Arc;
use std::time::Duration;

use crate::engine::WalletEngine;

/// If the wallet processed fewer than this many blocks during a timed-out
/// wait, the daemon peer is presumed stalled.
pub const STALL_THRESHOLD_BLOCKS: u64 = 2;

/// Receives peer-quality signals from the sync coordinator. The surrounding
/// system decides what dropping or deprioritizing a daemon actually means.
pub trait NodeHealthSink: Send + Sync {
    fn node_stalled(&self, daemon_host: &str, daemon_port: u16);
}

/// Sink for callers that do not track peer health.
pub struct NullNodeHealth;

impl NodeHealthSink for NullNodeHealth {
    fn node_stalled(&self, _daemon_host: &str, _daemon_port: u16) {}
}

/// Wait until `handle` reports itself synced, up to `timeout`.
///
/// Returns immediately when the height delta is already within the synced
/// threshold. On the timeout path the delta is re-measured to decide the
/// result, and a stalled daemon is reported to `node_health` before returning
/// not-synced. The event path never reports staleness.
pub async fn wait_for_sync(
    handle: &Arc<dyn WalletEngine>,
    timeout: Duration,
    node_health: &dyn NodeHealthSink,
) -> bool {
    let before = handle.sync_status().await;
    if before.is_synced() {
        return true;
    }

    log::info!(
        "Waiting for wallet sync: {} blocks behind, timeout {:?}",
        before.height_delta(),
        timeout
    );

    tokio::select! {
        _ = handle.synced() => {
            log::info!("Wallet reported synced");
            true
        }
        _ = tokio::time::sleep(timeout) => {
            let after = handle.sync_status().await;
            let processed = after.wallet_height.saturating_sub(before.wallet_height);
            let synced = after.is_synced();

            if !synced && processed < STALL_THRESHOLD_BLOCKS {
                log::warn!(
                    "Daemon {}:{} fed only {} blocks during the sync wait, reporting it stalled",
                    handle.daemon_host(),
                    handle.daemon_port(),
                    processed
                );
                node_health.node_stalled(handle.daemon_host(), handle.daemon_port());
            }

            if !synced {
                log::warn!(
                    "Sync wait timed out {} blocks behind",
                    after.height_delta()
                );
            }
            synced
        }
    }
}
