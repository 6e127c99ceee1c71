use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("sealed box encryption failed")]
    Seal,

    #[error("sealed box open failed (not sealed to this keypair, or corrupted)")]
    Open,

    #[error("decrypted payload is not valid UTF-8")]
    PlaintextEncoding,

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
