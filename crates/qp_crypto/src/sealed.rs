//! Anonymous-sender sealed boxes
//!
//! Wire format (libsodium `crypto_box_seal` compatible):
//!   [ ephemeral X25519 public key (32 bytes) | XSalsa20-Poly1305 box ]
//! base64-encoded with the standard padded alphabet. The originator's
//! identity is not recoverable from the ciphertext; only the recipient's
//! keypair is needed to open it.
//!
//! Sender attribution therefore comes exclusively from the transport-level
//! envelope, which is NOT authenticated by this ciphertext.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Sealed-box overhead: 32-byte ephemeral public key + 16-byte Poly1305 tag.
pub const SEAL_OVERHEAD: usize = 48;

/// Seal `plaintext` to the recipient's public key. Returns base64 ciphertext.
pub fn seal(plaintext: &str, recipient: &PublicKey) -> Result<String, CryptoError> {
    let pk = crypto_box::PublicKey::from(*recipient.as_bytes());
    let boxed = pk
        .seal(&mut OsRng, plaintext.as_bytes())
        .map_err(|_| CryptoError::Seal)?;
    Ok(STANDARD.encode(boxed))
}

/// Open a base64 sealed box with the recipient's keypair.
///
/// Fails with `CryptoError::Open` when the ciphertext is truncated, was
/// sealed to a different key, or has been tampered with. Never returns
/// incorrect plaintext on a key mismatch.
pub fn open(ciphertext_b64: &str, recipient: &KeyPair) -> Result<String, CryptoError> {
    let data = STANDARD.decode(ciphertext_b64)?;
    if data.len() < SEAL_OVERHEAD {
        return Err(CryptoError::Open);
    }

    let sk = crypto_box::SecretKey::from(*recipient.secret.as_bytes());
    // A keypair whose halves do not match can never authenticate the box.
    if sk.public_key().as_bytes() != recipient.public.as_bytes() {
        return Err(CryptoError::Open);
    }

    let plaintext = sk.unseal(&data).map_err(|_| CryptoError::Open)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::PlaintextEncoding)
}
