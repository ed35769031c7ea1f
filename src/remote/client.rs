//! Remote delegate wallet proxy
//!
//! Thin authenticated RPCs against the independently hosted wallet used for
//! outbound transaction construction. Remote failures are wrapped and
//! surfaced verbatim; nothing here retries, since a duplicated submission is
//! worse than a reported failure. Transport timeouts are the HTTP client's
//! concern and are not re-bounded here.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::types::{
    PrepareTransactionRequest, PreparedTransaction, RewindRequest, SendRequest, SendResult,
    StartRequest, WalletStatus,
};
use crate::config::ServiceConfig;
use crate::error::ServiceError;

/// The remote wallet is restarted once it has been up this long. Longer than
/// the local instance bound because a remote restart is far more expensive.
pub const REMOTE_MAX_UPTIME: Duration = Duration::from_secs(4 * 60 * 60);

pub struct RemoteWallet {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteWallet {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn status(&self, token: &str) -> Result<WalletStatus, ServiceError> {
        let response = self
            .http
            .get(format!("{}/status", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ServiceError::Remote(format!("status request failed: {}", e)))?;
        Self::decode(response).await
    }

    /// Ensure the remote wallet is running against the desired daemon.
    ///
    /// A start is issued when the remote is unstarted, bound to a different
    /// daemon, or past its maximum uptime; otherwise this is a no-op.
    /// Returns whether the remote is ready for transaction calls.
    pub async fn warmup(&self, token: &str, config: &ServiceConfig) -> Result<bool, ServiceError> {
        let status = self.status(token).await?;

        let needs_start = !status.started
            || status.daemon_host != config.daemon_host
            || status.uptime() >= REMOTE_MAX_UPTIME;

        if !needs_start {
            log::debug!(
                "Remote wallet ready (daemon {}, up {:?})",
                status.daemon_host,
                status.uptime()
            );
            return Ok(true);
        }

        log::info!(
            "Starting remote wallet against {}:{} (started={}, uptime {:?})",
            config.daemon_host,
            config.daemon_port,
            status.started,
            status.uptime()
        );
        self.start(token, config).await?;
        Ok(true)
    }

    pub async fn start(&self, token: &str, config: &ServiceConfig) -> Result<(), ServiceError> {
        self.post_expect_ok(
            token,
            "start",
            &StartRequest {
                daemon_host: config.daemon_host.clone(),
                daemon_port: config.daemon_port,
            },
        )
        .await
    }

    pub async fn prepare_transaction(
        &self,
        token: &str,
        request: &PrepareTransactionRequest,
    ) -> Result<PreparedTransaction, ServiceError> {
        self.post(token, "prepare_transaction", request).await
    }

    pub async fn send_prepared(
        &self,
        token: &str,
        prepared_tx_hash: &str,
    ) -> Result<SendResult, ServiceError> {
        self.post(
            token,
            "send",
            &SendRequest {
                prepared_tx_hash: prepared_tx_hash.to_string(),
            },
        )
        .await
    }

    /// Instruct the remote wallet to reprocess the last `distance` blocks,
    /// for the same fork-safety reason the local instance rewinds on load.
    pub async fn rewind(&self, token: &str, distance: u64) -> Result<(), ServiceError> {
        self.post_expect_ok(token, "rewind", &RewindRequest { distance })
            .await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> Result<T, ServiceError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Remote(format!("{} request failed: {}", path, e)))?;
        Self::decode(response).await
    }

    async fn post_expect_ok<B: Serialize>(
        &self,
        token: &str,
        path: &str,
        body: &B,
    ) -> Result<(), ServiceError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::Remote(format!("{} request failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::Remote(format!(
                "{} returned {}: {}",
                path, status, detail
            )));
        }
        Ok(())
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ServiceError::Remote(format!(
                "remote wallet returned {}: {}",
                status, detail
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::Remote(format!("malformed response: {}", e)))
    }
}
