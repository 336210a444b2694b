//! Room-backed toast notifications.
//!
//! [`Notifications`] listens on room channels and shows incoming
//! notifications through a [`toast_queue`] display controller.

pub mod config;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod shutdown;

pub use config::{ConfigError, NotificationsOptions};
pub use error::NotificationsError;
pub use notifications::{NOTIFICATION_CHANNEL, Notifications, PublishOptions};
