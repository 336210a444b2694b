//! Widget configuration: defaults, validation, loading from an options
//! object or the environment.

pub mod defaults;
pub mod options;
pub mod validation;

pub use options::NotificationsOptions;

/// Rejected configuration. Messages are shown to whoever supplied the
/// options, so they name the offending option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("options must be an object")]
    NotAnObject,

    #[error("options.maxDisplayed must be an integer")]
    MaxDisplayed,

    #[error("options.displayTimer must be an integer")]
    DisplayTimer,

    #[error("options.container must be an element")]
    Container,

    #[error("options.position must be one of the following positions: {allowed}")]
    Position { allowed: String },

    #[error("Invalid option passed: {}", .0.join(", "))]
    UnknownOptions(Vec<String>),

    #[error("{key}: {reason}")]
    Env { key: String, reason: String },
}

impl ConfigError {
    pub fn position() -> Self {
        Self::Position {
            allowed: validation::position_list(),
        }
    }
}
