//! wallet-service: shared service wallet lifecycle management
//!
//! Many concurrent request handlers need a synced, usable wallet handle, but
//! only one underlying wallet instance may be active at a time. This crate
//! owns that instance: it decides on every access whether the held instance
//! is still valid, rotates it when it is not, races chain synchronization
//! against a timeout, persists the encrypted wallet blob to primary and
//! backup locations, and drives the remote delegate wallet's warm-up
//! protocol.
//!
//! # Architecture
//!
//! - **Registry & restart engine** ([`registry`]): mutex-guarded owner of the
//!   single active instance; evaluates the restart policy and serializes
//!   swaps.
//! - **Sync wait coordinator** ([`sync`]): races the engine's synced event
//!   against a timeout, reporting stalled daemons.
//! - **Persistence facade** ([`persistence`]): dual-location saves, timestamped
//!   backups, mirror writes into the delegate's storage project.
//! - **Remote proxy & token provider** ([`remote`]): bearer-authenticated RPCs
//!   against the delegate wallet, fed by a signed-assertion token exchange.
//!
//! The wallet engine itself, the metadata store, and the blob backends are
//! external collaborators behind the traits in [`engine`] and [`storage`].

pub mod config;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod registry;
pub mod remote;
pub mod storage;
pub mod sync;

pub use config::{ServiceConfig, ServiceSecrets};
pub use engine::{NewWallet, WalletEngine, WalletEngineFactory, WalletSyncInfo};
pub use error::{ServiceError, StorageError};
pub use persistence::{MirrorTarget, WalletPersistence};
pub use registry::{WalletRegistry, DEFAULT_REWIND_DISTANCE, MAX_INSTANCE_AGE};
pub use remote::{RemoteWallet, TokenProvider};
pub use sync::{wait_for_sync, NodeHealthSink, NullNodeHealth};
