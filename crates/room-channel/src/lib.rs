//! In-process rooms with named pub/sub channels.
//!
//! A [`Hub`] owns every room. Each connection joins a room through
//! [`Hub::join`] and gets its own [`Room`] handle; channels opened from that
//! handle broadcast [`Envelope`]s to every subscriber of the same room
//! channel, the sender included.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Per-channel buffer. Slow subscribers past this many messages lag.
const CHANNEL_CAPACITY: usize = 256;

/// Errors that can occur while using a room.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Connection {connection} has not joined room '{room}'")]
    NotJoined { room: String, connection: String },

    #[error("Channel name must not be empty")]
    EmptyChannelName,
}

pub type Result<T> = std::result::Result<T, ChannelError>;

/// A message as delivered to channel subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Connection id of the sender.
    pub from: String,
    pub room: String,
    pub channel: String,
    pub sent_at: DateTime<Utc>,
    pub value: serde_json::Value,
}

#[derive(Debug)]
struct RoomShared {
    name: String,
    channels: Mutex<HashMap<String, broadcast::Sender<Envelope>>>,
}

impl RoomShared {
    fn sender(&self, channel: &str) -> broadcast::Sender<Envelope> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

/// Registry of rooms shared by every connection in the process.
#[derive(Debug, Clone, Default)]
pub struct Hub {
    rooms: Arc<Mutex<HashMap<String, Arc<RoomShared>>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join `room` as a fresh connection.
    pub fn join(&self, room: &str) -> Room {
        let shared = {
            let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
            rooms
                .entry(room.to_string())
                .or_insert_with(|| {
                    Arc::new(RoomShared {
                        name: room.to_string(),
                        channels: Mutex::new(HashMap::new()),
                    })
                })
                .clone()
        };
        let connection = uuid::Uuid::new_v4().to_string();
        tracing::debug!(room = %room, connection = %connection, "Joined room");

        Room {
            connection,
            shared,
            joined: Arc::new(AtomicBool::new(true)),
        }
    }
}

/// One connection's membership in a room.
#[derive(Debug, Clone)]
pub struct Room {
    connection: String,
    shared: Arc<RoomShared>,
    joined: Arc<AtomicBool>,
}

impl Room {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Unique id of the connection that joined.
    pub fn connection(&self) -> &str {
        &self.connection
    }

    pub fn is_joined(&self) -> bool {
        self.joined.load(Ordering::Acquire)
    }

    /// Leave the room. Channels opened earlier stop accepting messages.
    pub fn leave(&self) {
        if self.joined.swap(false, Ordering::AcqRel) {
            tracing::debug!(room = %self.name(), connection = %self.connection, "Left room");
        }
    }

    /// Open a named channel in this room.
    pub fn channel(&self, name: &str) -> Result<Channel> {
        if !self.is_joined() {
            return Err(self.not_joined());
        }
        if name.is_empty() {
            return Err(ChannelError::EmptyChannelName);
        }
        Ok(Channel {
            name: name.to_string(),
            room: self.clone(),
            tx: self.shared.sender(name),
        })
    }

    fn not_joined(&self) -> ChannelError {
        ChannelError::NotJoined {
            room: self.name().to_string(),
            connection: self.connection.clone(),
        }
    }
}

/// A named channel within a room.
#[derive(Debug, Clone)]
pub struct Channel {
    name: String,
    room: Room,
    tx: broadcast::Sender<Envelope>,
}

impl Channel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Broadcast `value` to every subscriber. Returns how many subscribers
    /// the message was handed to.
    pub fn message(&self, value: serde_json::Value) -> Result<usize> {
        if !self.room.is_joined() {
            return Err(self.room.not_joined());
        }
        let envelope = Envelope {
            from: self.room.connection.clone(),
            room: self.room.name().to_string(),
            channel: self.name.clone(),
            sent_at: Utc::now(),
            value,
        };
        // No subscribers is not an error; the message is just dropped.
        let delivered = self.tx.send(envelope).unwrap_or(0);
        tracing::trace!(room = %self.room.name(), channel = %self.name, delivered, "Channel message sent");
        Ok(delivered)
    }

    /// Receive every message sent on this channel from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}
