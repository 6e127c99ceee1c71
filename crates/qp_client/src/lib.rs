//! qp_client — Quietpost session layer
//!
//! Owns everything between the relay transport and the rendered chat:
//! key lookups against the issuance service, the per-session decrypt
//! pipeline, seal-on-send, and the append-only transcript.
//!
//! # Modules
//! - `keystore`   — `KeyStore` trait, HTTP client, in-memory test/demo store
//! - `transport`  — `Transport` trait + in-memory relay hub
//! - `session`    — `SessionController` state machine and pipelines
//! - `transcript` — ordered, append-only conversation log
//! - `error`      — error taxonomy
//!
//! # Error philosophy
//! Nothing in this crate terminates the process. Inbound failures drop the
//! offending message, emit a [`session::SessionNotice`], and leave the
//! session running; outbound failures are returned to the caller.

pub mod error;
pub mod keystore;
pub mod session;
pub mod transcript;
pub mod transport;

pub use error::{ClientError, KeyLookupError, TransportError, ValidationError};
pub use keystore::{HttpKeyStore, KeyServiceConfig, KeyStore, MemoryKeyStore};
pub use session::{SessionConfig, SessionController, SessionNotice, SessionState};
pub use transcript::{Transcript, TranscriptEntry};
pub use transport::{MemoryRelay, Transport};
