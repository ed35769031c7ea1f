/// Common test utilities for wallet lifecycle integration tests
///
/// Provides a mock wallet engine (heights, synced event, stop counting), a
/// factory that records every instance it hands out, a recording node-health
/// sink, and a tempdir-backed environment wiring the file stores, the
/// persistence facade, and the registry together.
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Notify;

use wallet_service::config::{ServiceConfig, ServiceSecrets};
use wallet_service::engine::{NewWallet, WalletEngine, WalletEngineFactory, WalletSyncInfo};
use wallet_service::error::ServiceError;
use wallet_service::persistence::WalletPersistence;
use wallet_service::registry::WalletRegistry;
use wallet_service::storage::{FileBlobStore, FileMetadataStore, WalletInfo};
use wallet_service::sync::NodeHealthSink;

pub const TEST_BLOB: &str = "ENCRYPTED-WALLET-V1";
pub const TEST_MNEMONIC: &str =
    "legal winner thank year wave sausage worth useful legal winner thank yellow";

pub struct MockEngine {
    daemon_host: String,
    daemon_port: u16,
    wallet_height: AtomicU64,
    network_height: AtomicU64,
    pub stop_count: AtomicUsize,
    pub rewound_to: AtomicU64,
    synced_flag: AtomicBool,
    synced_notify: Notify,
    serialized: String,
}

impl MockEngine {
    pub fn new(daemon_host: &str, daemon_port: u16, serialized: &str) -> Arc<Self> {
        Arc::new(Self {
            daemon_host: daemon_host.to_string(),
            daemon_port,
            wallet_height: AtomicU64::new(100),
            network_height: AtomicU64::new(100),
            stop_count: AtomicUsize::new(0),
            rewound_to: AtomicU64::new(u64::MAX),
            synced_flag: AtomicBool::new(false),
            synced_notify: Notify::new(),
            serialized: serialized.to_string(),
        })
    }

    pub fn set_heights(&self, wallet_height: u64, network_height: u64) {
        self.wallet_height.store(wallet_height, Ordering::SeqCst);
        self.network_height.store(network_height, Ordering::SeqCst);
    }

    /// Fire the engine's synced event.
    pub fn mark_synced(&self) {
        self.synced_flag.store(true, Ordering::SeqCst);
        self.synced_notify.notify_waiters();
    }

    pub fn stops(&self) -> usize {
        self.stop_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletEngine for MockEngine {
    fn daemon_host(&self) -> &str {
        &self.daemon_host
    }

    fn daemon_port(&self) -> u16 {
        self.daemon_port
    }

    async fn sync_status(&self) -> WalletSyncInfo {
        WalletSyncInfo {
            wallet_height: self.wallet_height.load(Ordering::SeqCst),
            network_height: self.network_height.load(Ordering::SeqCst),
        }
    }

    async fn synced(&self) {
        loop {
            let notified = self.synced_notify.notified();
            if self.synced_flag.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    async fn rewind(&self, to_height: u64) -> Result<(), ServiceError> {
        self.rewound_to.store(to_height, Ordering::SeqCst);
        Ok(())
    }

    async fn serialize_encrypted(&self, _password: &str) -> Result<String, ServiceError> {
        Ok(self.serialized.clone())
    }

    async fn stop(&self) {
        self.stop_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Factory that records every engine it hands out so tests can assert on
/// stop counts and instance identity afterwards.
pub struct MockFactory {
    pub open_count: AtomicUsize,
    pub engines: Mutex<Vec<Arc<MockEngine>>>,
    /// Heights given to newly opened engines; equal heights mean instances
    /// come up already synced.
    default_heights: Mutex<(u64, u64)>,
}

impl Default for MockFactory {
    fn default() -> Self {
        Self {
            open_count: AtomicUsize::new(0),
            engines: Mutex::new(Vec::new()),
            default_heights: Mutex::new((100, 100)),
        }
    }
}

impl MockFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_default_heights(&self, wallet_height: u64, network_height: u64) {
        *self.default_heights.lock().unwrap() = (wallet_height, network_height);
    }

    pub fn opened(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn engine(&self, index: usize) -> Arc<MockEngine> {
        self.engines.lock().unwrap()[index].clone()
    }

    fn register(&self, engine: Arc<MockEngine>) -> Arc<MockEngine> {
        let (wallet_height, network_height) = *self.default_heights.lock().unwrap();
        engine.set_heights(wallet_height, network_height);
        self.engines.lock().unwrap().push(engine.clone());
        engine
    }
}

#[async_trait]
impl WalletEngineFactory for MockFactory {
    async fn open(
        &self,
        blob: &str,
        _password: &str,
        daemon_host: &str,
        daemon_port: u16,
    ) -> Result<Arc<dyn WalletEngine>, ServiceError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        let engine = self.register(MockEngine::new(daemon_host, daemon_port, blob));
        Ok(engine)
    }

    async fn create(
        &self,
        _password: &str,
        daemon_host: &str,
        daemon_port: u16,
    ) -> Result<NewWallet, ServiceError> {
        let engine = self.register(MockEngine::new(daemon_host, daemon_port, TEST_BLOB));
        Ok(NewWallet {
            engine,
            mnemonic: TEST_MNEMONIC.to_string(),
        })
    }
}

#[derive(Default)]
pub struct RecordingNodeHealth {
    pub stalled: Mutex<Vec<(String, u16)>>,
}

impl RecordingNodeHealth {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn stalled_nodes(&self) -> Vec<(String, u16)> {
        self.stalled.lock().unwrap().clone()
    }
}

impl NodeHealthSink for RecordingNodeHealth {
    fn node_stalled(&self, daemon_host: &str, daemon_port: u16) {
        self.stalled
            .lock()
            .unwrap()
            .push((daemon_host.to_string(), daemon_port));
    }
}

pub fn test_secrets() -> ServiceSecrets {
    ServiceSecrets {
        wallet_password: "hunter2".to_string(),
        wallet_location: "master-wallet.bin".to_string(),
        wallet_backups_directory: "wallet-backups".to_string(),
        mirror_credential_location: String::new(),
        mirror_wallet_location: String::new(),
        token_signing_key: String::new(),
        token_issuer: String::new(),
        token_url: String::new(),
        remote_wallet_url: String::new(),
        remote_wallet_audience: String::new(),
    }
}

/// Test environment with automatic cleanup via the temp directory.
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub metadata: Arc<FileMetadataStore>,
    pub blobs: Arc<FileBlobStore>,
    pub persistence: Arc<WalletPersistence>,
    pub factory: Arc<MockFactory>,
    pub node_health: Arc<RecordingNodeHealth>,
    pub registry: Arc<WalletRegistry>,
}

impl TestEnvironment {
    pub fn new() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();

        let temp_dir = TempDir::new()?;
        let metadata = Arc::new(FileMetadataStore::new(temp_dir.path().join("metadata")));
        let blobs = Arc::new(FileBlobStore::new(temp_dir.path().join("blobs")));
        let secrets = test_secrets();

        let persistence = Arc::new(WalletPersistence::new(
            metadata.clone(),
            blobs.clone(),
            None,
            &secrets,
        ));
        let factory = MockFactory::new();
        let node_health = RecordingNodeHealth::new();
        let registry = Arc::new(WalletRegistry::new(
            factory.clone(),
            persistence.clone(),
            node_health.clone(),
            &secrets,
        ));

        Ok(Self {
            temp_dir,
            metadata,
            blobs,
            persistence,
            factory,
            node_health,
            registry,
        })
    }

    pub fn config(&self) -> ServiceConfig {
        ServiceConfig {
            daemon_host: "127.0.0.1".to_string(),
            daemon_port: 11898,
            wait_for_sync_timeout: Duration::from_millis(200),
            service_halted: false,
        }
    }

    /// Seed a persisted wallet (metadata record + primary blob) without going
    /// through the creation path.
    pub async fn seed_wallet(&self) -> anyhow::Result<()> {
        use wallet_service::storage::MetadataStore;

        let info = WalletInfo::new(
            "master-wallet.bin".to_string(),
            "wallet-backups".to_string(),
        );
        self.metadata.create_wallet_info(&info).await?;

        use wallet_service::storage::BlobStore;
        self.blobs
            .put("master-wallet.bin", TEST_BLOB.as_bytes())
            .await?;
        Ok(())
    }
}
