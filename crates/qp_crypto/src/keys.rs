//! Key material newtypes
//!
//! Each user has one X25519 `KeyPair`. The key-issuance service stores both
//! halves and hands them out hex-encoded; these newtypes own the decode and
//! the length checks so the rest of the codebase never touches raw strings.
//!
//! A `SecretKey` must never leave the owning client. It is zeroized on drop
//! and deliberately has no `Display`/`Serialize` impls.

use rand::rngs::OsRng;
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

/// X25519 key width in bytes.
pub const KEY_LEN: usize = 32;

/// 32-byte X25519 public key, hex-encoded at the service boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey([u8; KEY_LEN]);

impl PublicKey {
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s.trim())?;
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CryptoError::InvalidKey(format!("public key must be {KEY_LEN} bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl From<[u8; KEY_LEN]> for PublicKey {
    fn from(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }
}

/// 32-byte X25519 secret key. Drop clears memory via ZeroizeOnDrop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s.trim())?;
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
            CryptoError::InvalidKey(format!("secret key must be {KEY_LEN} bytes, got {}", b.len()))
        })?;
        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> PublicKey {
        let sk = crypto_box::SecretKey::from(self.0);
        PublicKey(*sk.public_key().as_bytes())
    }
}

// Redacted — secret bytes must never reach logs.
impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

/// A user's X25519 keypair. Immutable for the lifetime of a session;
/// key rotation is a new `KeyPair`, never an in-place mutation.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub secret: SecretKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        let secret = crypto_box::SecretKey::generate(&mut OsRng);
        let public = PublicKey(*secret.public_key().as_bytes());
        Self {
            public,
            secret: SecretKey(secret.to_bytes()),
        }
    }

    pub fn from_hex(public_hex: &str, secret_hex: &str) -> Result<Self, CryptoError> {
        Ok(Self {
            public: PublicKey::from_hex(public_hex)?,
            secret: SecretKey::from_hex(secret_hex)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_hex(&pair.public.to_hex(), &pair.secret.to_hex()).unwrap();
        assert_eq!(restored.public, pair.public);
        assert_eq!(restored.secret.as_bytes(), pair.secret.as_bytes());
    }

    #[test]
    fn generated_halves_match() {
        let pair = KeyPair::generate();
        assert_eq!(pair.secret.public_key(), pair.public);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = PublicKey::from_hex("aabb").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
    }

    #[test]
    fn rejects_non_hex() {
        assert!(matches!(
            PublicKey::from_hex("zz").unwrap_err(),
            CryptoError::HexDecode(_)
        ));
    }

    #[test]
    fn secret_debug_is_redacted() {
        let pair = KeyPair::generate();
        assert_eq!(format!("{:?}", pair.secret), "SecretKey(..)");
    }
}
