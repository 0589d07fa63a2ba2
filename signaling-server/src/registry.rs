use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use log::{error, info};
use tokio::sync::{mpsc, RwLock};

/// Identifier assigned to a peer for the lifetime of its connection.
pub type ClientId = usize;

/// Live set of connected peers, keyed by [`ClientId`].
///
/// Owned by the server instance and shared with every connection handler;
/// cloning is cheap and refers to the same underlying set. Broadcasting
/// iterates a snapshot taken under the read lock, so peers that disconnect
/// mid-broadcast cannot invalidate the iteration.
#[derive(Debug, Clone)]
pub struct Registry {
    connections: Arc<RwLock<HashMap<ClientId, mpsc::UnboundedSender<Message>>>>,
    next_id: Arc<AtomicUsize>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Registers a new peer's outbound channel and returns its id.
    pub async fn register(&self, tx: mpsc::UnboundedSender<Message>) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.connections.write().await.insert(id, tx);
        id
    }

    /// Removes a peer from the live set. Safe to call more than once.
    pub async fn remove(&self, id: ClientId) {
        self.connections.write().await.remove(&id);
    }

    /// Forwards `message` to every registered peer except `sender`.
    ///
    /// Fire-and-forget: a failure to reach one destination is logged and the
    /// remaining destinations still receive the message.
    pub async fn broadcast_except(&self, sender: ClientId, message: Message) {
        let recipients: Vec<(ClientId, mpsc::UnboundedSender<Message>)> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(id, _)| **id != sender)
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        for (id, tx) in recipients {
            if tx.send(message.clone()).is_err() {
                error!("failed to forward message to client {}, skipping", id);
            }
        }
    }

    /// Number of currently registered peers.
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Whether no peer is currently registered.
    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Drops every registered peer, e.g. when the server shuts down.
    pub async fn clear(&self) {
        let count = {
            let mut connections = self.connections.write().await;
            let count = connections.len();
            connections.clear();
            count
        };
        if count > 0 {
            info!("cleared {} registered client(s)", count);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_skips_the_sender() {
        let registry = Registry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.register(tx_a).await;
        let _b = registry.register(tx_b).await;

        registry
            .broadcast_except(a, Message::Text("hello".to_owned()))
            .await;

        assert!(rx_a.try_recv().is_err());
        assert!(matches!(rx_b.try_recv(), Ok(Message::Text(text)) if text == "hello"));
    }

    #[tokio::test]
    async fn broadcast_reaches_all_other_peers() {
        let registry = Registry::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        let a = registry.register(tx_a).await;
        let _b = registry.register(tx_b).await;
        let _c = registry.register(tx_c).await;

        registry
            .broadcast_except(a, Message::Text("offer".to_owned()))
            .await;

        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_ok());
    }

    #[tokio::test]
    async fn dead_receiver_does_not_abort_the_broadcast() {
        let registry = Registry::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        let (tx_c, mut rx_c) = mpsc::unbounded_channel();
        let a = registry.register(tx_a).await;
        let _b = registry.register(tx_b).await;
        let _c = registry.register(tx_c).await;

        // b's receive side is gone, as after an abrupt disconnect
        drop(rx_b);

        registry
            .broadcast_except(a, Message::Text("offer".to_owned()))
            .await;

        assert!(matches!(rx_c.try_recv(), Ok(Message::Text(text)) if text == "offer"));
    }

    #[tokio::test]
    async fn removed_peer_no_longer_receives() {
        let registry = Registry::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.register(tx_a).await;
        let b = registry.register(tx_b).await;

        registry.remove(b).await;
        registry.remove(b).await; // idempotent
        registry
            .broadcast_except(a, Message::Text("offer".to_owned()))
            .await;

        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn clear_empties_the_registry() {
        let registry = Registry::new();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        registry.register(tx_a).await;
        assert!(!registry.is_empty().await);

        registry.clear().await;
        assert!(registry.is_empty().await);
    }
}
