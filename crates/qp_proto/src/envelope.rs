//! Message envelope — what the relay sees.
//!
//! The relay only reads `receiverUid` to route into the matching room.
//! `message` is a base64 sealed box bound to the receiver's public key at
//! encryption time; `senderUid` is transport-level attribution and is NOT
//! authenticated by the ciphertext.
//!
//! Field names are camelCase on the wire for compatibility with the
//! deployed relay protocol.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    #[error("envelope field `{0}` is empty")]
    EmptyField(&'static str),
}

/// On-wire envelope — sent to and received from the relay, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Sender's user id (unauthenticated attribution).
    pub sender_uid: String,

    /// Recipient's user id — the room this envelope is routed to.
    pub receiver_uid: String,

    /// Base64 (standard, padded) sealed-box ciphertext.
    pub message: String,
}

impl Envelope {
    pub fn new(
        sender_uid: impl Into<String>,
        receiver_uid: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sender_uid: sender_uid.into(),
            receiver_uid: receiver_uid.into(),
            message: message.into(),
        }
    }

    /// Parse and validate a raw relay frame.
    ///
    /// Every inbound frame goes through here before any key lookup or
    /// decryption; a record with missing or empty fields never reaches the
    /// crypto layer.
    pub fn parse(frame: &str) -> Result<Self, EnvelopeError> {
        let envelope: Envelope = serde_json::from_str(frame)?;
        envelope.validate()?;
        Ok(envelope)
    }

    pub fn validate(&self) -> Result<(), EnvelopeError> {
        if self.sender_uid.is_empty() {
            return Err(EnvelopeError::EmptyField("senderUid"));
        }
        if self.receiver_uid.is_empty() {
            return Err(EnvelopeError::EmptyField("receiverUid"));
        }
        if self.message.is_empty() {
            return Err(EnvelopeError::EmptyField("message"));
        }
        Ok(())
    }

    /// Serialise for the relay.
    pub fn to_frame(&self) -> Result<String, EnvelopeError> {
        Ok(serde_json::to_string(self)?)
    }
}
