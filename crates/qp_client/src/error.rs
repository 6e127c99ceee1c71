//! Error taxonomy.
//!
//! Four distinguishable failure classes, mirroring what the user should be
//! told: fix your input (`ValidationError`), the key service let us down
//! (`KeyLookupError`), the ciphertext did not open (`CryptoError`, from
//! qp_crypto), or the relay link broke (`TransportError`).

use thiserror::Error;

/// Empty required field — user-correctable, surfaced inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("local uid must not be empty")]
    EmptyLocalUid,

    #[error("peer uid must not be empty")]
    EmptyPeerUid,
}

/// Key service failure. A transient outage is distinguishable from an
/// unknown uid so callers never treat "unreachable" as "user has no key".
#[derive(Debug, Error)]
pub enum KeyLookupError {
    #[error("no key registered for uid `{0}`")]
    NotFound(String),

    #[error("key service error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("key service unreachable: {0}")]
    Network(String),

    #[error("key service returned malformed key material: {0}")]
    BadKeyMaterial(#[from] qp_crypto::CryptoError),
}

/// Relay transport failure. Never fatal; a disconnect triggers re-join
/// via [`crate::SessionController::reconnect`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("malformed relay frame: {0}")]
    Malformed(String),

    #[error("transport is not connected")]
    Disconnected,

    #[error("room join failed: {0}")]
    Join(String),

    #[error("publish failed: {0}")]
    Publish(String),
}

/// Umbrella error for session operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    KeyLookup(#[from] KeyLookupError),

    #[error(transparent)]
    Crypto(#[from] qp_crypto::CryptoError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
