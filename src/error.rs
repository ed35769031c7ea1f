use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Master wallet info unavailable: {0}")]
    MasterWalletInfo(String),

    #[error("Master wallet file unavailable: {0}")]
    MasterWalletFile(String),

    #[error("Master wallet failed to sync within the allowed time")]
    MasterWalletSyncFailed,

    #[error("Service is halted")]
    ServiceHalted,

    #[error("Wallet engine error: {0}")]
    Engine(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Token exchange failed: {0}")]
    Token(String),

    #[error("Remote wallet error: {0}")]
    Remote(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable error code surfaced to request handlers, so operators can tell
    /// a storage outage from a peer desync from an administrative halt.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::MasterWalletInfo(_) => "master-wallet-info",
            ServiceError::MasterWalletFile(_) => "master-wallet-file",
            ServiceError::MasterWalletSyncFailed => "master-wallet-sync-failed",
            ServiceError::ServiceHalted => "service-halted",
            _ => "unknown-error",
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::MasterWalletSyncFailed => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::ServiceHalted => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Remote(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
