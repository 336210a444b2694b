use room_channel::ChannelError;

use crate::config::ConfigError;

/// Errors surfaced by the notifications widget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("A room or rooms must be passed")]
    NoRooms,

    #[error("You must have joined the room['s] before you can subscribe: {0}")]
    SubscribeNotJoined(#[source] ChannelError),

    #[error("You must have joined the room before you can publish to it: {0}")]
    PublishNotJoined(#[source] ChannelError),

    #[error("options.message must be passed")]
    MissingMessage,

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

pub type Result<T> = std::result::Result<T, NotificationsError>;
