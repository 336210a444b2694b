//! Room-backed notifications widget.
//!
//! Wires room channels to a running display controller: subscribed rooms feed
//! the controller's intake, and [`Notifications::publish`] sends to every
//! other subscriber of a room.


use room_channel::{Envelope, Room};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use toast_queue::runtime;
use toast_queue::{
    ControllerHandle, DisplayController, MemoryTree, NotificationKind, NotificationPayload,
    ViewHost,
};

use crate::config::{ConfigError, NotificationsOptions};
use crate::error::{NotificationsError, Result};

/// Room channel every widget instance listens and publishes on.
pub const NOTIFICATION_CHANNEL: &str = "goinstant-widgets-notifications";

/// What to publish, and where.
#[derive(Debug, Clone)]
pub struct PublishOptions {
    pub room: Room,
    pub message: String,
    pub kind: NotificationKind,
    /// Also show the notification on this widget.
    pub display_to_self: bool,
}

impl PublishOptions {
    pub fn new(room: &Room, message: impl Into<String>) -> Self {
        Self {
            room: room.clone(),
            message: message.into(),
            kind: NotificationKind::default(),
            display_to_self: false,
        }
    }

    pub fn kind(mut self, kind: NotificationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn display_to_self(mut self, display: bool) -> Self {
        self.display_to_self = display;
        self
    }
}

struct Subscription {
    room: String,
    token: CancellationToken,
}

pub struct Notifications<H: ViewHost> {
    handle: ControllerHandle<H>,
    task: Option<JoinHandle<DisplayController<H>>>,
    subscriptions: Vec<Subscription>,
    shutdown: CancellationToken,
}

impl Notifications<MemoryTree> {
    /// Widget rendering into a fresh in-memory surface.
    pub fn with_memory_surface(options: NotificationsOptions) -> Result<Self> {
        Self::new(MemoryTree::new(), options)
    }
}

impl<H: ViewHost + Send + 'static> Notifications<H> {
    /// Build the controller and start its event loop on the current tokio
    /// runtime.
    pub fn new(host: H, options: NotificationsOptions) -> Result<Self> {
        if options.container.is_some_and(|node| !host.is_element(node)) {
            return Err(ConfigError::Container.into());
        }

        let controller = DisplayController::new(host, options.controller_options());
        let (handle, task) = runtime::spawn(controller);
        tracing::info!(
            max_displayed = options.max_displayed,
            display_timer_ms = options.display_timer,
            position = %options.position,
            "Notifications widget initialized"
        );

        Ok(Self {
            handle,
            task: Some(task),
            subscriptions: Vec::new(),
            shutdown: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> &ControllerHandle<H> {
        &self.handle
    }

    pub fn is_destroyed(&self) -> bool {
        self.task.is_none()
    }

    /// Names of the rooms currently forwarding into the controller.
    pub fn subscribed_rooms(&self) -> Vec<String> {
        self.subscriptions
            .iter()
            .filter(|s| !s.token.is_cancelled())
            .map(|s| s.room.clone())
            .collect()
    }

    /// Start forwarding notifications from `rooms`.
    ///
    /// Rooms already subscribed (by name) are skipped. If any new room has
    /// been left, nothing is subscribed.
    pub fn subscribe(&mut self, rooms: &[Room]) -> Result<()> {
        if rooms.is_empty() {
            return Err(NotificationsError::NoRooms);
        }
        // Forwarders of rooms that were left have stopped on their own.
        self.subscriptions.retain(|s| !s.token.is_cancelled());

        let mut fresh: Vec<&Room> = Vec::new();
        for room in rooms {
            let known = self.subscriptions.iter().any(|s| s.room == room.name())
                || fresh.iter().any(|r| r.name() == room.name());
            if !known {
                fresh.push(room);
            }
        }

        let channels = fresh
            .iter()
            .map(|room| room.channel(NOTIFICATION_CHANNEL))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(NotificationsError::SubscribeNotJoined)?;

        for channel in channels {
            let room = channel.room();
            let token = self.shutdown.child_token();
            tokio::spawn(forward(
                room.clone(),
                channel.subscribe(),
                self.handle.clone(),
                token.clone(),
            ));
            tracing::info!(room = %room.name(), "Subscribed to notifications");
            self.subscriptions.push(Subscription {
                room: room.name().to_string(),
                token,
            });
        }
        Ok(())
    }

    /// Stop forwarding from every subscribed room.
    pub fn unsubscribe(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.token.cancel();
            tracing::info!(room = %subscription.room, "Unsubscribed from notifications");
        }
    }

    /// Send a notification to the other subscribers of `options.room`.
    ///
    /// Returns how many subscribers it was handed to.
    pub fn publish(&self, options: PublishOptions) -> Result<usize> {
        if options.message.is_empty() {
            return Err(NotificationsError::MissingMessage);
        }

        let channel = options
            .room
            .channel(NOTIFICATION_CHANNEL)
            .map_err(NotificationsError::PublishNotJoined)?;
        let value = json!({
            "type": options.kind.as_str(),
            "message": options.message,
        });
        let delivered = channel
            .message(value)
            .map_err(NotificationsError::PublishNotJoined)?;
        tracing::debug!(
            room = %options.room.name(),
            kind = %options.kind,
            delivered,
            "Notification published"
        );

        if options.display_to_self {
            self.handle
                .intake(NotificationPayload::new(options.kind, options.message));
        }
        Ok(delivered)
    }

    /// Tear down the controller and stop every forwarder.
    ///
    /// Returns the torn-down controller on the first call and `None` after.
    pub async fn destroy(&mut self) -> Option<DisplayController<H>> {
        let task = self.task.take()?;

        self.handle.destroy().await;
        self.unsubscribe();
        self.shutdown.cancel();

        match task.await {
            Ok(controller) => {
                tracing::info!("Notifications widget destroyed");
                Some(controller)
            }
            Err(e) => {
                tracing::error!("Notification event loop failed: {e}");
                None
            }
        }
    }
}

impl<H: ViewHost> Drop for Notifications<H> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Feed one room channel into the controller until cancelled or the room
/// is left.
async fn forward<H: ViewHost + Send + 'static>(
    room: Room,
    mut rx: broadcast::Receiver<Envelope>,
    handle: ControllerHandle<H>,
    token: CancellationToken,
) {
    loop {
        let received = tokio::select! {
            _ = token.cancelled() => break,
            received = rx.recv() => received,
        };

        if !room.is_joined() {
            tracing::info!(room = %room.name(), "Room left; notification forwarder closing");
            token.cancel();
            break;
        }

        match received {
            Ok(envelope) if envelope.from == room.connection() => {}
            Ok(envelope) => {
                let from = envelope.from;
                match serde_json::from_value::<NotificationPayload>(envelope.value) {
                    Ok(payload) => handle.intake(payload),
                    Err(e) => {
                        tracing::warn!(room = %room.name(), from = %from, "Dropping undecodable notification: {e}");
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(room = %room.name(), skipped, "Notification forwarder lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    tracing::debug!(room = %room.name(), "Notification forwarder stopped");
}
