pub mod client;
pub mod token;
pub mod types;

pub use client::{RemoteWallet, REMOTE_MAX_UPTIME};
pub use token::TokenProvider;
pub use types::{
    PrepareTransactionRequest, PreparedTransaction, SendResult, WalletStatus,
};
