//! qp_crypto — Quietpost sealed-box primitives
//!
//! # Design principles
//! - NO custom crypto; the sealed-box construction comes from the audited
//!   RustCrypto `crypto_box` crate (libsodium `crypto_box_seal` compatible).
//! - Zeroize all secret material on drop.
//! - Keys cross the service boundary hex-encoded; ciphertext crosses the
//!   relay boundary base64-encoded (standard alphabet, padded).
//!
//! # Module layout
//! - `keys`   — X25519 key material newtypes + hex boundary codecs
//! - `sealed` — anonymous-sender sealed box seal/open
//! - `error`  — unified error type

pub mod error;
pub mod keys;
pub mod sealed;

pub use error::CryptoError;
pub use keys::{KeyPair, PublicKey, SecretKey, KEY_LEN};
