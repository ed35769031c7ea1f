/// Service configuration from environment variables
///
/// The lifecycle core treats both structs as read-only: they are loaded once
/// by the hosting process and passed in by reference.
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    /// Daemon peer the wallet should be bound to
    pub daemon_host: String,
    pub daemon_port: u16,
    /// How long a caller is willing to block waiting for chain sync
    pub wait_for_sync_timeout: Duration,
    /// Administrative halt flag; no wallet is served while set
    pub service_halted: bool,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `DAEMON_HOST`: daemon peer host (default "127.0.0.1")
    /// - `DAEMON_PORT`: daemon peer port (default 11898)
    /// - `WAIT_FOR_SYNC_TIMEOUT_MS`: sync wait budget in milliseconds (default 20000)
    /// - `SERVICE_HALTED`: "true"/"1" to refuse all wallet access
    pub fn from_env() -> Self {
        let daemon_host = env::var("DAEMON_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let daemon_port = env::var("DAEMON_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(11898);

        let wait_for_sync_timeout = env::var("WAIT_FOR_SYNC_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_millis(20_000));

        let service_halted = matches!(
            env::var("SERVICE_HALTED").as_deref(),
            Ok("true") | Ok("1")
        );

        log::info!("Daemon peer: {}:{}", daemon_host, daemon_port);
        if service_halted {
            log::warn!("SERVICE_HALTED is set, wallet access will be refused");
        }

        Self {
            daemon_host,
            daemon_port,
            wait_for_sync_timeout,
            service_halted,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            daemon_host: "127.0.0.1".to_string(),
            daemon_port: 11898,
            wait_for_sync_timeout: Duration::from_millis(20_000),
            service_halted: false,
        }
    }
}

/// Credentials and storage identifiers, supplied by the hosting process.
///
/// Kept separate from [`ServiceConfig`] so the non-secret half can be logged
/// and cloned freely.
#[derive(Clone, Debug)]
pub struct ServiceSecrets {
    /// Shared secret the wallet engine uses to encrypt its serialized form
    pub wallet_password: String,
    /// Primary blob location for the encrypted wallet file
    pub wallet_location: String,
    /// Prefix under which timestamped backups are written
    pub wallet_backups_directory: String,
    /// Location (in primary storage) of the service-account credential blob
    /// used to authenticate to the mirror project; empty disables mirroring
    pub mirror_credential_location: String,
    /// Destination of the mirrored wallet blob inside the mirror project
    pub mirror_wallet_location: String,
    /// Hex-encoded secp256k1 key used to sign token assertions
    pub token_signing_key: String,
    /// Issuer identity placed in the token assertion
    pub token_issuer: String,
    /// OAuth-style token endpoint the assertion is exchanged against
    pub token_url: String,
    /// Base URL of the remote delegate wallet API
    pub remote_wallet_url: String,
    /// Audience the issued token is scoped to
    pub remote_wallet_audience: String,
}

impl ServiceSecrets {
    /// Load secrets from environment variables. Missing keys default to empty
    /// strings and are reported once at startup; the components that need
    /// them fail on first use instead.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            env::var(name).unwrap_or_else(|_| {
                log::warn!("{} is not set", name);
                String::new()
            })
        };

        Self {
            wallet_password: var("WALLET_PASSWORD"),
            wallet_location: env::var("WALLET_LOCATION")
                .unwrap_or_else(|_| "master-wallet.bin".to_string()),
            wallet_backups_directory: env::var("WALLET_BACKUPS_DIR")
                .unwrap_or_else(|_| "wallet-backups".to_string()),
            mirror_credential_location: env::var("MIRROR_CREDENTIAL_LOCATION")
                .unwrap_or_default(),
            mirror_wallet_location: env::var("MIRROR_WALLET_LOCATION").unwrap_or_default(),
            token_signing_key: var("TOKEN_SIGNING_KEY"),
            token_issuer: var("TOKEN_ISSUER"),
            token_url: var("TOKEN_URL"),
            remote_wallet_url: var("REMOTE_WALLET_URL"),
            remote_wallet_audience: var("REMOTE_WALLET_AUDIENCE"),
        }
    }
}
