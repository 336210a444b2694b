//! Toast notification queue.
//!
//! Admits notifications in arrival order, keeps at most `max_displayed` of
//! them on screen, and removes each one after its display time. Hovering an
//! item holds its timer; leaving it charges the elapsed time and restarts the
//! timer for whatever is left.
//!
//! The display tree is abstracted behind [`ViewHost`]; [`MemoryTree`] is the
//! in-process implementation. [`runtime::spawn`] drives a
//! [`DisplayController`] from a single tokio task.

pub mod controller;
pub mod host;
pub mod item;
pub mod runtime;
pub mod timer;
pub mod types;

// Re-exports for convenience
pub use controller::{ControllerOptions, ControllerSnapshot, DisplayController};
pub use host::{MemoryTree, NodeId, ViewHost};
pub use runtime::ControllerHandle;
pub use types::{EntryId, NotificationKind, NotificationPayload, Position};

/// Class shared by every generated container.
pub const CONTAINER_CLASS: &str = "gi-notify-container";
/// Class that opts a generated container out of host page styles.
pub const OVERRIDE_CLASS: &str = "gi-override";
/// Root class of a notification view; also prefixes the per-type class.
pub const ITEM_CLASS: &str = "gi-notify";
pub const MESSAGE_CLASS: &str = "gi-notify-message";
pub const CLOSE_CLASS: &str = "gi-notify-close";
