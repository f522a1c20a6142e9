//! Message bridge between the sync engine and the embedding application.

pub mod message;

use tokio::sync::mpsc;
use tokio::sync::Mutex;

use tether_core::errors::{BridgeError, TetherResult};

pub use message::BridgeMessage;

/// One side of a bidirectional message channel.
///
/// The engine holds one endpoint, the application the other. Outbound
/// notifications never block a sync pass: [`BridgeEndpoint::publish`]
/// drops the message if the peer's buffer is full and keeps going.
pub struct BridgeEndpoint {
    tx: mpsc::Sender<BridgeMessage>,
    rx: Mutex<mpsc::Receiver<BridgeMessage>>,
}

impl BridgeEndpoint {
    /// Build a connected pair of endpoints with `capacity` buffered
    /// messages in each direction.
    pub fn pair(capacity: usize) -> (BridgeEndpoint, BridgeEndpoint) {
        let (to_b, from_a) = mpsc::channel(capacity);
        let (to_a, from_b) = mpsc::channel(capacity);
        (
            BridgeEndpoint {
                tx: to_b,
                rx: Mutex::new(from_b),
            },
            BridgeEndpoint {
                tx: to_a,
                rx: Mutex::new(from_a),
            },
        )
    }

    /// Send a message, waiting for buffer space if the peer is slow.
    pub async fn send(&self, msg: BridgeMessage) -> TetherResult<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| BridgeError::Closed.into())
    }

    /// Fire-and-forget send. Peer gone or buffer full only warns.
    pub fn publish(&self, msg: BridgeMessage) {
        if let Err(e) = self.tx.try_send(msg) {
            tracing::warn!("bridge: dropped outbound message: {e}");
        }
    }

    /// Receive the next message. `None` means the peer endpoint dropped.
    pub async fn recv(&self) -> Option<BridgeMessage> {
        self.rx.lock().await.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn messages_cross_in_both_directions() {
        let (engine, app) = BridgeEndpoint::pair(4);

        engine.send(BridgeMessage::OutboxQueued).await.unwrap();
        assert_eq!(app.recv().await, Some(BridgeMessage::OutboxQueued));

        app.send(BridgeMessage::SyncNow).await.unwrap();
        assert_eq!(engine.recv().await, Some(BridgeMessage::SyncNow));
    }

    #[tokio::test]
    async fn publish_never_blocks_on_a_full_buffer() {
        let (engine, _app) = BridgeEndpoint::pair(1);
        engine.publish(BridgeMessage::OutboxQueued);
        // Buffer is full now; the second publish must drop, not hang.
        engine.publish(BridgeMessage::OutboxQueued);
    }

    #[tokio::test]
    async fn send_fails_once_the_peer_is_gone() {
        let (engine, app) = BridgeEndpoint::pair(1);
        drop(app);
        let err = engine.send(BridgeMessage::OutboxQueued).await.unwrap_err();
        assert!(err.to_string().contains("closed"));
    }

    #[tokio::test]
    async fn recv_returns_none_after_peer_drop() {
        let (engine, app) = BridgeEndpoint::pair(1);
        drop(engine);
        assert_eq!(app.recv().await, None);
    }
}
