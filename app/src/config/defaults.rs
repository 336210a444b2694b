//! Option definitions with their default values.

use std::collections::HashMap;
use std::sync::LazyLock;

use toast_queue::controller::{DEFAULT_DISPLAY_TIMER, DEFAULT_MAX_DISPLAYED};

/// A single recognised widget option.
#[derive(Debug, Clone)]
pub struct OptionDef {
    /// Key as accepted in an options object.
    pub key: &'static str,
    /// Environment variable that overrides it, if any.
    pub env: Option<&'static str>,
    pub default: String,
    pub description: &'static str,
}

pub const MAX_DISPLAYED_KEY: &str = "maxDisplayed";
pub const DISPLAY_TIMER_KEY: &str = "displayTimer";
pub const POSITION_KEY: &str = "position";
pub const CONTAINER_KEY: &str = "container";

pub const ENV_MAX_DISPLAYED: &str = "NOTIFY_MAX_DISPLAYED";
pub const ENV_DISPLAY_TIMER_MS: &str = "NOTIFY_DISPLAY_TIMER_MS";
pub const ENV_POSITION: &str = "NOTIFY_POSITION";

/// Every recognised option, in the order they are documented.
pub static OPTION_DEFS: LazyLock<Vec<OptionDef>> = LazyLock::new(|| {
    vec![
        OptionDef {
            key: MAX_DISPLAYED_KEY,
            env: Some(ENV_MAX_DISPLAYED),
            default: DEFAULT_MAX_DISPLAYED.to_string(),
            description: "Maximum notifications on screen at once",
        },
        OptionDef {
            key: DISPLAY_TIMER_KEY,
            env: Some(ENV_DISPLAY_TIMER_MS),
            default: DEFAULT_DISPLAY_TIMER.as_millis().to_string(),
            description: "Milliseconds a notification stays visible",
        },
        OptionDef {
            key: POSITION_KEY,
            env: Some(ENV_POSITION),
            default: "top".into(),
            description: "Anchor of the generated container",
        },
        OptionDef {
            key: CONTAINER_KEY,
            env: None,
            default: String::new(),
            description: "Existing display node to render into",
        },
    ]
});

static DEFS_BY_KEY: LazyLock<HashMap<&'static str, &'static OptionDef>> =
    LazyLock::new(|| OPTION_DEFS.iter().map(|def| (def.key, def)).collect());

/// Look up an option definition by key.
pub fn get_def(key: &str) -> Option<&'static OptionDef> {
    DEFS_BY_KEY.get(key).copied()
}

pub fn is_known_key(key: &str) -> bool {
    get_def(key).is_some()
}
