//! Session controller
//!
//! One `SessionController` per running client. It owns the local uid, the
//! room membership on the relay, the inbound decrypt pipeline, and the
//! transcript.
//!
//! # State machine
//! `Disconnected → Connected → RoomJoined → Active`
//! - `connect()` performs the transport handshake and joins the room named
//!   after the local uid.
//! - Re-entering the same uid is a no-op; changing the uid leaves the old
//!   room (and kills its pipeline) before joining the new one.
//! - First message sent or received moves the session to `Active`.
//! - Transport close from either side returns to `Disconnected`;
//!   `reconnect()` re-issues the handshake and the room join.
//!
//! # Inbound pipeline
//! Envelopes are handled one at a time on a single task, in arrival order:
//! parse/validate → addressing filter → own-keypair lookups → sealed-box
//! open → transcript append. Because the pipeline is sequential, transcript
//! ordering needs no sequence tokens; a slow key lookup for envelope E1
//! cannot be overtaken by E2.
//!
//! Teardown (uid change, disconnect, drop) aborts the pipeline task, and a
//! generation counter guards the transcript so a lookup that completes
//! after teardown is discarded instead of being applied to a newer session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use qp_crypto::{sealed, KeyPair};
use qp_proto::Envelope;

use crate::error::{ClientError, TransportError, ValidationError};
use crate::keystore::KeyStore;
use crate::transcript::{Transcript, TranscriptEntry};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    RoomJoined,
    Active,
}

/// Recoverable failure surfaced to the caller. The offending message is
/// dropped; the session keeps running.
#[derive(Debug, Clone)]
pub enum SessionNotice {
    MalformedFrame { detail: String },
    KeyLookupFailed { sender_uid: String, detail: String },
    DecryptFailed { sender_uid: String, detail: String },
    PublishFailed { detail: String },
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub local_uid: String,
    pub peer_uid: String,
}

struct Shared {
    transcript: Mutex<Transcript>,
    state: Mutex<SessionState>,
    /// Bumped on every room change/teardown; pipelines carry the value they
    /// were spawned with and discard results once it moves on.
    generation: AtomicU64,
    notices: mpsc::UnboundedSender<SessionNotice>,
}

impl Shared {
    fn mark_active(&self) {
        let mut state = self.state.lock();
        if *state == SessionState::RoomJoined {
            *state = SessionState::Active;
        }
    }
}

pub struct SessionController {
    transport: Arc<dyn Transport>,
    keystore: Arc<dyn KeyStore>,
    shared: Arc<Shared>,
    local_uid: String,
    peer_uid: String,
    pipeline: Option<JoinHandle<()>>,
    notice_rx: Option<mpsc::UnboundedReceiver<SessionNotice>>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("local_uid", &self.local_uid)
            .field("peer_uid", &self.peer_uid)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Handshake with the transport and join the room named after
    /// `config.local_uid`.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        keystore: Arc<dyn KeyStore>,
        config: SessionConfig,
    ) -> Result<Self, ClientError> {
        if config.local_uid.is_empty() {
            return Err(ValidationError::EmptyLocalUid.into());
        }

        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            transcript: Mutex::new(Transcript::new()),
            state: Mutex::new(SessionState::Disconnected),
            generation: AtomicU64::new(0),
            notices: notice_tx,
        });

        let mut controller = Self {
            transport,
            keystore,
            shared,
            local_uid: config.local_uid,
            peer_uid: config.peer_uid,
            pipeline: None,
            notice_rx: Some(notice_rx),
        };

        controller.transport.connect().await?;
        *controller.shared.state.lock() = SessionState::Connected;
        controller.join_current_room().await?;
        Ok(controller)
    }

    async fn join_current_room(&mut self) -> Result<(), ClientError> {
        let rx = self.transport.join_room(&self.local_uid).await?;
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.pipeline = Some(tokio::spawn(run_pipeline(
            rx,
            self.shared.clone(),
            self.keystore.clone(),
            self.local_uid.clone(),
            generation,
        )));
        *self.shared.state.lock() = SessionState::RoomJoined;
        info!(target: "quietpost", event = "room_joined", local_uid = %self.local_uid);
        Ok(())
    }

    /// Abort the pipeline and leave the current room. In-flight key lookups
    /// for this room are abandoned; any that still complete are discarded
    /// by the generation check.
    async fn part_room(&mut self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.pipeline.take() {
            handle.abort();
        }
        if !self.local_uid.is_empty() {
            let _ = self.transport.leave_room(&self.local_uid).await;
            info!(target: "quietpost", event = "room_left", local_uid = %self.local_uid);
        }
    }

    /// Change the local uid. Same non-empty uid while joined: no-op.
    /// Empty uid: session reset — leave the room, stay connected.
    /// New uid: leave the old room before joining the new one.
    pub async fn set_local_uid(&mut self, uid: &str) -> Result<(), ClientError> {
        if uid == self.local_uid && self.pipeline.is_some() {
            return Ok(());
        }

        self.part_room().await;
        self.local_uid = uid.to_string();
        if self.local_uid.is_empty() {
            *self.shared.state.lock() = SessionState::Connected;
            return Ok(());
        }
        self.join_current_room().await
    }

    pub fn set_peer_uid(&mut self, uid: &str) {
        self.peer_uid = uid.to_string();
    }

    /// Seal `plaintext` to the peer's public key and publish it to the
    /// peer's room.
    ///
    /// The local plaintext echo is appended as soon as the seal succeeds —
    /// before the publish, which is fire-and-forget. A key lookup or seal
    /// failure aborts the send and appends nothing.
    pub async fn send(&self, plaintext: &str) -> Result<(), ClientError> {
        if plaintext.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        if self.local_uid.is_empty() {
            return Err(ValidationError::EmptyLocalUid.into());
        }
        if self.peer_uid.is_empty() {
            return Err(ValidationError::EmptyPeerUid.into());
        }

        let peer_key = self.keystore.public_key(&self.peer_uid).await?;
        let ciphertext = sealed::seal(plaintext, &peer_key)?;
        let envelope = Envelope::new(&self.local_uid, &self.peer_uid, ciphertext);
        let frame = envelope
            .to_frame()
            .map_err(|e| TransportError::Malformed(e.to_string()))?;

        self.shared.transcript.lock().append(TranscriptEntry {
            sender_uid: self.local_uid.clone(),
            receiver_uid: self.peer_uid.clone(),
            plaintext: plaintext.to_string(),
            timestamp: Utc::now(),
        });
        self.shared.mark_active();

        match self.transport.publish(&self.peer_uid, frame).await {
            Ok(()) => {
                info!(target: "quietpost", event = "send_ok", peer_uid = %self.peer_uid);
            }
            Err(e) => {
                // Fire-and-forget: no queueing, no retry. The echo stays.
                warn!(target: "quietpost", event = "send_publish_failed", peer_uid = %self.peer_uid, error = %e);
                let _ = self
                    .shared
                    .notices
                    .send(SessionNotice::PublishFailed { detail: e.to_string() });
            }
        }
        Ok(())
    }

    /// Tear the session down. Pending lookups are abandoned.
    pub async fn disconnect(&mut self) {
        self.part_room().await;
        *self.shared.state.lock() = SessionState::Disconnected;
    }

    /// Re-issue the transport handshake and the room join.
    /// Nothing sent while disconnected was queued; there is no replay.
    pub async fn reconnect(&mut self) -> Result<(), ClientError> {
        self.transport.connect().await?;
        *self.shared.state.lock() = SessionState::Connected;
        if self.local_uid.is_empty() {
            return Ok(());
        }
        if let Some(handle) = self.pipeline.take() {
            handle.abort();
        }
        self.join_current_room().await
    }

    pub fn state(&self) -> SessionState {
        *self.shared.state.lock()
    }

    pub fn local_uid(&self) -> &str {
        &self.local_uid
    }

    pub fn peer_uid(&self) -> &str {
        &self.peer_uid
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.shared.transcript.lock().snapshot()
    }

    /// Hand the notice stream to the caller (UI, logs). Callable once.
    pub fn take_notices(&mut self) -> Option<mpsc::UnboundedReceiver<SessionNotice>> {
        self.notice_rx.take()
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(handle) = self.pipeline.take() {
            handle.abort();
        }
    }
}

// ── Inbound pipeline ─────────────────────────────────────────────────────────

async fn run_pipeline(
    mut rx: mpsc::UnboundedReceiver<String>,
    shared: Arc<Shared>,
    keystore: Arc<dyn KeyStore>,
    local_uid: String,
    generation: u64,
) {
    while let Some(frame) = rx.recv().await {
        if shared.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        handle_frame(&frame, &shared, keystore.as_ref(), &local_uid, generation).await;
    }

    // Inbound stream ended: the transport dropped us.
    if shared.generation.load(Ordering::SeqCst) == generation {
        *shared.state.lock() = SessionState::Disconnected;
        info!(target: "quietpost", event = "transport_closed", local_uid = %local_uid);
    }
}

async fn handle_frame(
    frame: &str,
    shared: &Shared,
    keystore: &dyn KeyStore,
    local_uid: &str,
    generation: u64,
) {
    let envelope = match Envelope::parse(frame) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(target: "quietpost", event = "malformed_frame", error = %e);
            let _ = shared
                .notices
                .send(SessionNotice::MalformedFrame { detail: e.to_string() });
            return;
        }
    };

    // Not addressed to this session — silent discard, not an error.
    if envelope.receiver_uid != local_uid {
        debug!(
            target: "quietpost",
            event = "discarded_foreign",
            receiver_uid = %envelope.receiver_uid,
        );
        return;
    }

    // Sealed boxes need only the recipient's own keypair. Two independent
    // lookups, awaited in order; a partial failure drops the message.
    let public = match keystore.public_key(local_uid).await {
        Ok(key) => key,
        Err(e) => {
            warn!(target: "quietpost", event = "public_key_lookup_failed", sender_uid = %envelope.sender_uid, error = %e);
            let _ = shared.notices.send(SessionNotice::KeyLookupFailed {
                sender_uid: envelope.sender_uid,
                detail: e.to_string(),
            });
            return;
        }
    };
    let secret = match keystore.secret_key(local_uid).await {
        Ok(key) => key,
        Err(e) => {
            warn!(target: "quietpost", event = "secret_key_lookup_failed", sender_uid = %envelope.sender_uid, error = %e);
            let _ = shared.notices.send(SessionNotice::KeyLookupFailed {
                sender_uid: envelope.sender_uid,
                detail: e.to_string(),
            });
            return;
        }
    };
    let keys = KeyPair { public, secret };

    let plaintext = match sealed::open(&envelope.message, &keys) {
        Ok(plaintext) => plaintext,
        Err(e) => {
            warn!(target: "quietpost", event = "decrypt_failed", sender_uid = %envelope.sender_uid, error = %e);
            let _ = shared.notices.send(SessionNotice::DecryptFailed {
                sender_uid: envelope.sender_uid,
                detail: e.to_string(),
            });
            return;
        }
    };

    // The session may have moved to a different uid while we awaited.
    if shared.generation.load(Ordering::SeqCst) != generation {
        return;
    }

    shared.transcript.lock().append(TranscriptEntry {
        sender_uid: envelope.sender_uid.clone(),
        receiver_uid: envelope.receiver_uid,
        plaintext,
        timestamp: Utc::now(),
    });
    shared.mark_active();
    info!(target: "quietpost", event = "message_appended", sender_uid = %envelope.sender_uid);
}
