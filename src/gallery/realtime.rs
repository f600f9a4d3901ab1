// src/gallery/realtime.rs — Fan-out of new artworks to gallery screens

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::store::Artwork;

/// Artworks replayed to a screen that connects mid-festival.
const RECENT_ON_CONNECT: usize = 5;
const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    Connected,
    Recent { artworks: Vec<Artwork> },
    NewArtwork { artwork: Artwork },
    Ping,
}

/// What a new subscriber gets: the greeting events, then the live receiver.
pub struct Subscription {
    pub initial: Vec<RealtimeEvent>,
    pub receiver: broadcast::Receiver<RealtimeEvent>,
}

pub struct RealtimeHub {
    tx: broadcast::Sender<RealtimeEvent>,
    recent: Mutex<VecDeque<Artwork>>,
    buffer: usize,
}

impl RealtimeHub {
    pub fn new(buffer: usize) -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            recent: Mutex::new(VecDeque::new()),
            buffer: buffer.max(1),
        }
    }

    /// Remember the artwork and push it to every connected screen.
    /// Returns the number of screens that received it.
    pub fn publish(&self, artwork: Artwork) -> usize {
        if let Ok(mut recent) = self.recent.lock() {
            recent.push_front(artwork.clone());
            recent.truncate(self.buffer);
        }
        let clients = self
            .tx
            .send(RealtimeEvent::NewArtwork { artwork })
            .unwrap_or(0);
        tracing::debug!(clients, "Broadcast new artwork");
        clients
    }

    pub fn ping(&self) {
        let _ = self.tx.send(RealtimeEvent::Ping);
    }

    pub fn subscribe(&self) -> Subscription {
        let receiver = self.tx.subscribe();
        let mut initial = vec![RealtimeEvent::Connected];
        let recent = self.recent(RECENT_ON_CONNECT);
        if !recent.is_empty() {
            initial.push(RealtimeEvent::Recent { artworks: recent });
        }
        Subscription { initial, receiver }
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> Vec<Artwork> {
        self.recent
            .lock()
            .map(|r| r.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
