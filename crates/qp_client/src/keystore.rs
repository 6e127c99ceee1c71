//! Key retrieval against the issuance service.
//!
//! Two independent lookups, each its own round trip: the public key for any
//! uid, and the private key for the LOCAL uid only (the service enforces
//! authorization; this client never requests another user's private key).
//! Lookups are never batched, so a partial failure — public key resolves,
//! private key lookup fails — is an observable, distinguishable state.
//!
//! Failures are never cached: a transient outage must not be remembered as
//! "user has no key".

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use qp_crypto::{KeyPair, PublicKey, SecretKey};
use qp_proto::api::{ErrorResponse, UserProfile};

use crate::error::KeyLookupError;

#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn public_key(&self, uid: &str) -> Result<PublicKey, KeyLookupError>;

    /// Local uid only by convention; see module docs.
    async fn secret_key(&self, uid: &str) -> Result<SecretKey, KeyLookupError>;
}

// ── HTTP client ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct KeyServiceConfig {
    pub base_url: String,
}

impl KeyServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn from_env() -> Result<Self, KeyLookupError> {
        let base_url = std::env::var("QUIETPOST_API_BASE_URL")
            .map_err(|_| KeyLookupError::Network("QUIETPOST_API_BASE_URL missing".into()))?;
        Ok(Self { base_url })
    }
}

/// Resolves keys via `GET {base}/auth/publickey/{uid}` and
/// `GET {base}/auth/privatekey/{uid}`; both endpoints return bare hex
/// string bodies.
#[derive(Clone)]
pub struct HttpKeyStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpKeyStore {
    pub fn new(config: &KeyServiceConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("quietpost-client/0.1")
            .build()
            .expect("reqwest client");
        Self {
            client,
            base_url: config.base_url.clone(),
        }
    }

    async fn fetch_hex(&self, path: &str, uid: &str) -> Result<String, KeyLookupError> {
        let url = format!("{}/{}/{}", self.base_url, path, uid);
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| KeyLookupError::Network(e.to_string()))?;

        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(KeyLookupError::NotFound(uid.to_string()));
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(KeyLookupError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        res.text()
            .await
            .map_err(|e| KeyLookupError::Network(e.to_string()))
    }

    /// Display-only lookup; not part of the crypto core's correctness.
    pub async fn fetch_profile(&self, uid: &str) -> Result<UserProfile, KeyLookupError> {
        let url = format!("{}/users/{}", self.base_url, uid);
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| KeyLookupError::Network(e.to_string()))?;

        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(KeyLookupError::NotFound(uid.to_string()));
        }
        if !status.is_success() {
            return Err(KeyLookupError::Upstream {
                status: status.as_u16(),
                message: res.text().await.unwrap_or_default(),
            });
        }

        res.json::<UserProfile>()
            .await
            .map_err(|e| KeyLookupError::Network(e.to_string()))
    }
}

#[async_trait]
impl KeyStore for HttpKeyStore {
    async fn public_key(&self, uid: &str) -> Result<PublicKey, KeyLookupError> {
        let hex_body = self.fetch_hex("auth/publickey", uid).await?;
        Ok(PublicKey::from_hex(&hex_body)?)
    }

    async fn secret_key(&self, uid: &str) -> Result<SecretKey, KeyLookupError> {
        let hex_body = self.fetch_hex("auth/privatekey", uid).await?;
        Ok(SecretKey::from_hex(&hex_body)?)
    }
}

// ── In-memory store (tests + local demo) ─────────────────────────────────────

/// Keypairs held in memory, keyed by uid. Stands in for the issuance
/// service where no network is available.
#[derive(Default)]
pub struct MemoryKeyStore {
    pairs: Mutex<HashMap<String, KeyPair>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uid: impl Into<String>, pair: KeyPair) {
        self.pairs.lock().insert(uid.into(), pair);
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn public_key(&self, uid: &str) -> Result<PublicKey, KeyLookupError> {
        self.pairs
            .lock()
            .get(uid)
            .map(|p| p.public.clone())
            .ok_or_else(|| KeyLookupError::NotFound(uid.to_string()))
    }

    async fn secret_key(&self, uid: &str) -> Result<SecretKey, KeyLookupError> {
        self.pairs
            .lock()
            .get(uid)
            .map(|p| p.secret.clone())
            .ok_or_else(|| KeyLookupError::NotFound(uid.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_resolves_both_halves() {
        let store = MemoryKeyStore::new();
        let pair = KeyPair::generate();
        store.insert("alice", pair.clone());

        let public = store.public_key("alice").await.unwrap();
        let secret = store.secret_key("alice").await.unwrap();
        assert_eq!(public, pair.public);
        assert_eq!(secret.as_bytes(), pair.secret.as_bytes());
    }

    #[tokio::test]
    async fn unknown_uid_is_not_found() {
        let store = MemoryKeyStore::new();
        assert!(matches!(
            store.public_key("ghost").await.unwrap_err(),
            KeyLookupError::NotFound(uid) if uid == "ghost"
        ));
    }

    #[test]
    fn hex_body_with_whitespace_parses() {
        // Service bodies may carry a trailing newline; the key newtypes trim.
        let pair = KeyPair::generate();
        let body = format!("{}\n", pair.public.to_hex());
        assert_eq!(PublicKey::from_hex(&body).unwrap(), pair.public);
    }
}
