//! qp_proto — Wire types and serialisation for Quietpost
//!
//! Everything the relay sees is JSON. The relay is a dumb router: it reads
//! `receiverUid` for room delivery and nothing else; the `message` payload
//! is opaque ciphertext.
//!
//! # Modules
//! - `envelope` — the relay-level message record + strict boundary parsing
//! - `api`      — key-service / profile-service response bodies

pub mod api;
pub mod envelope;

pub use envelope::{Envelope, EnvelopeError};
