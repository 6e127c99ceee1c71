//! Relay transport abstraction.
//!
//! The relay is a given publish/subscribe primitive: rooms keyed by user id,
//! frames delivered verbatim to every room member. Connection establishment
//! and authentication live behind `connect()`; this crate only layers the
//! messaging protocol on top.
//!
//! Frames are raw JSON strings end to end. Schema validation happens in the
//! session layer, so a misbehaving relay peer cannot push undefined fields
//! into the decrypt pipeline.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

use crate::error::TransportError;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish (or re-establish) the underlying connection.
    async fn connect(&self) -> Result<(), TransportError>;

    /// Join a room and receive every frame published to it. Dropping the
    /// receiver leaves the room from the relay's point of view.
    async fn join_room(&self, room: &str)
        -> Result<mpsc::UnboundedReceiver<String>, TransportError>;

    /// Prune this client's dead membership in `room`.
    async fn leave_room(&self, room: &str) -> Result<(), TransportError>;

    /// Fire-and-forget publish to a room. No delivery confirmation.
    async fn publish(&self, room: &str, frame: String) -> Result<(), TransportError>;
}

// ── In-memory relay hub ──────────────────────────────────────────────────────

/// Room fan-out hub backed by unbounded channels. Serves the tests and the
/// loopback demo; the production transport is an external collaborator
/// implementing the same trait.
#[derive(Default)]
pub struct MemoryRelay {
    rooms: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>,
    closed: AtomicBool,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate relay loss: every member's inbound stream ends, and further
    /// operations fail until `connect()` is called again.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.rooms.lock().clear();
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(TransportError::Disconnected)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Transport for MemoryRelay {
    async fn connect(&self) -> Result<(), TransportError> {
        self.closed.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn join_room(
        &self,
        room: &str,
    ) -> Result<mpsc::UnboundedReceiver<String>, TransportError> {
        self.ensure_open()
            .map_err(|_| TransportError::Join("relay closed".into()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.rooms.lock().entry(room.to_string()).or_default().push(tx);
        Ok(rx)
    }

    async fn leave_room(&self, room: &str) -> Result<(), TransportError> {
        let mut rooms = self.rooms.lock();
        if let Some(members) = rooms.get_mut(room) {
            members.retain(|tx| !tx.is_closed());
            if members.is_empty() {
                rooms.remove(room);
            }
        }
        Ok(())
    }

    async fn publish(&self, room: &str, frame: String) -> Result<(), TransportError> {
        self.ensure_open()
            .map_err(|_| TransportError::Publish("relay closed".into()))?;
        let mut rooms = self.rooms.lock();
        if let Some(members) = rooms.get_mut(room) {
            members.retain(|tx| tx.send(frame.clone()).is_ok());
            if members.is_empty() {
                rooms.remove(room);
            }
        }
        // A room with no members swallows the frame — relay semantics,
        // not an error.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_room_members() {
        let relay = MemoryRelay::new();
        relay.connect().await.unwrap();
        let mut rx = relay.join_room("alice").await.unwrap();

        relay.publish("alice", "frame-1".into()).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), "frame-1");
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let relay = MemoryRelay::new();
        relay.connect().await.unwrap();
        let mut alice_rx = relay.join_room("alice").await.unwrap();
        let _bob_rx = relay.join_room("bob").await.unwrap();

        relay.publish("bob", "for bob".into()).await.unwrap();
        relay.publish("alice", "for alice".into()).await.unwrap();
        assert_eq!(alice_rx.recv().await.unwrap(), "for alice");
        assert!(alice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_to_empty_room_is_dropped_not_error() {
        let relay = MemoryRelay::new();
        relay.connect().await.unwrap();
        relay.publish("nobody", "lost".into()).await.unwrap();
    }

    #[tokio::test]
    async fn dropped_receiver_stops_delivery() {
        let relay = MemoryRelay::new();
        relay.connect().await.unwrap();
        let rx = relay.join_room("alice").await.unwrap();
        drop(rx);
        relay.leave_room("alice").await.unwrap();

        // New member still works; the dead membership is gone.
        let mut rx2 = relay.join_room("alice").await.unwrap();
        relay.publish("alice", "fresh".into()).await.unwrap();
        assert_eq!(rx2.recv().await.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn close_ends_streams_and_fails_publish() {
        let relay = MemoryRelay::new();
        relay.connect().await.unwrap();
        let mut rx = relay.join_room("alice").await.unwrap();

        relay.close();
        assert!(rx.recv().await.is_none());
        assert!(matches!(
            relay.publish("alice", "x".into()).await.unwrap_err(),
            TransportError::Publish(_)
        ));

        // Reconnect restores service.
        relay.connect().await.unwrap();
        let mut rx2 = relay.join_room("alice").await.unwrap();
        relay.publish("alice", "back".into()).await.unwrap();
        assert_eq!(rx2.recv().await.unwrap(), "back");
    }
}
