// Remote delegate wallet API request/response types

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub started: bool,
    #[serde(default)]
    pub daemon_host: String,
    /// Milliseconds since the remote wallet was started
    #[serde(default)]
    pub uptime: u64,
}

impl WalletStatus {
    pub fn uptime(&self) -> Duration {
        Duration::from_millis(self.uptime)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub daemon_host: String,
    pub daemon_port: u16,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareTransactionRequest {
    pub sub_wallet: String,
    pub sender_id: String,
    pub send_address: String,
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedTransaction {
    pub prepared_tx_hash: String,
    pub fee: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub prepared_tx_hash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub tx_hash: String,
}

#[derive(Debug, Serialize)]
pub struct RewindRequest {
    pub distance: u64,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let request = PrepareTransactionRequest {
            sub_wallet: "sw".into(),
            sender_id: "app-1".into(),
            send_address: "TRTLaddr".into(),
            amount: 1200,
            payment_id: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("subWallet").is_some());
        assert!(value.get("sendAddress").is_some());
        assert!(value.get("paymentId").is_none());

        let status: WalletStatus = serde_json::from_str(
            r#"{"started": true, "daemonHost": "node.example", "uptime": 5000}"#,
        )
        .unwrap();
        assert!(status.started);
        assert_eq!(status.uptime(), Duration::from_secs(5));
    }
}
