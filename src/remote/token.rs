//! Bearer token provider for the remote delegate wallet
//!
//! Exchanges a signed assertion for a short-lived access token scoped to the
//! delegate's audience. The assertion is a compact JWT signed with the
//! configured secp256k1 key. Tokens are cached until shortly before expiry;
//! a failed exchange is terminal for the dependent call.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secp256k1::{Message as Secp256k1Message, Secp256k1, SecretKey};
use serde_json::json;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::types::TokenResponse;
use crate::config::ServiceSecrets;
use crate::error::ServiceError;

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime requested from the token endpoint
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh a cached token this long before it actually expires
const EXPIRY_SLACK_SECS: i64 = 60;

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

pub struct TokenProvider {
    http: reqwest::Client,
    signing_key: SecretKey,
    issuer: String,
    token_url: String,
    audience: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(secrets: &ServiceSecrets) -> Result<Self, ServiceError> {
        let key_bytes = hex::decode(&secrets.token_signing_key)
            .map_err(|e| ServiceError::Token(format!("signing key is not hex: {}", e)))?;
        let signing_key = SecretKey::from_slice(&key_bytes)
            .map_err(|e| ServiceError::Token(format!("invalid signing key: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            signing_key,
            issuer: secrets.token_issuer.clone(),
            token_url: secrets.token_url.clone(),
            audience: secrets.remote_wallet_audience.clone(),
            cached: Mutex::new(None),
        })
    }

    /// Obtain a bearer token for the delegate wallet's audience, reusing the
    /// cached one while it is still comfortably valid.
    pub async fn get_token(&self) -> Result<String, ServiceError> {
        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.expires_at - Utc::now() > ChronoDuration::seconds(EXPIRY_SLACK_SECS) {
                return Ok(entry.token.clone());
            }
        }

        let assertion = self.signed_assertion()?;
        let response = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ServiceError::Token(format!("token endpoint unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(ServiceError::Token(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Token(format!("malformed token response: {}", e)))?;

        let token = body.access_token.clone();
        *cached = Some(CachedToken {
            token: body.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(body.expires_in as i64),
        });
        log::debug!("Issued delegate wallet token, valid {}s", body.expires_in);
        Ok(token)
    }

    /// Build the compact signed assertion: base64url header and claims, a
    /// SHA-256 digest of the signing input, signed with secp256k1.
    fn signed_assertion(&self) -> Result<String, ServiceError> {
        let now = Utc::now().timestamp();

        let header = json!({ "alg": "ES256K", "typ": "JWT" });
        let claims = json!({
            "iss": self.issuer,
            "sub": self.issuer,
            "aud": self.token_url,
            "target_audience": self.audience,
            "iat": now,
            "exp": now + ASSERTION_LIFETIME_SECS,
        });

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header.to_string()),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );

        let digest: [u8; 32] = Sha256::digest(signing_input.as_bytes()).into();
        let secp = Secp256k1::new();
        let message = Secp256k1Message::from_digest(digest);
        let signature = secp.sign_ecdsa(&message, &self.signing_key);

        Ok(format!(
            "{}.{}",
            signing_input,
            URL_SAFE_NO_PAD.encode(signature.serialize_compact())
        ))
    }
}
