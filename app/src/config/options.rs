//! Widget options loaded from an options object or environment overrides.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use toast_queue::{ControllerOptions, NodeId, Position};

use super::defaults::{
    OPTION_DEFS, CONTAINER_KEY, DISPLAY_TIMER_KEY, ENV_DISPLAY_TIMER_MS, ENV_MAX_DISPLAYED,
    ENV_POSITION, MAX_DISPLAYED_KEY, POSITION_KEY,
};
use super::validation::{validate_env_setting, validate_options};
use super::ConfigError;

/// Validated widget options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsOptions {
    pub max_displayed: usize,
    /// Visible time per notification, in milliseconds.
    pub display_timer: u64,
    pub position: Position,
    pub container: Option<NodeId>,
}

impl Default for NotificationsOptions {
    fn default() -> Self {
        let defaults = ControllerOptions::default();
        Self {
            max_displayed: defaults.max_displayed,
            display_timer: duration_millis(defaults.display_timer),
            position: defaults.position,
            container: None,
        }
    }
}

impl NotificationsOptions {
    /// Build options from a JSON options object, filling in defaults for
    /// anything missing.
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        validate_options(value)?;

        let mut options = Self::default();
        let Some(map) = value.as_object() else {
            return Ok(options);
        };

        if let Some(n) = map.get(MAX_DISPLAYED_KEY).and_then(Value::as_u64) {
            options.max_displayed = usize::try_from(n).map_err(|_| ConfigError::MaxDisplayed)?;
        }
        if let Some(ms) = map.get(DISPLAY_TIMER_KEY).and_then(Value::as_u64) {
            options.display_timer = ms;
        }
        if let Some(position) = map.get(POSITION_KEY).and_then(Value::as_str) {
            options.position = position.parse().map_err(|_| ConfigError::position())?;
        }
        if let Some(node) = map.get(CONTAINER_KEY).and_then(Value::as_u64) {
            options.container = Some(NodeId(node));
        }
        Ok(options)
    }

    /// Load options from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        load_dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup` on top of the defaults. Empty values
    /// are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut options = Self::default();

        for def in OPTION_DEFS.iter() {
            let Some(env_key) = def.env else {
                continue;
            };
            let Some(raw) = lookup(env_key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let raw = raw.trim();
            validate_env_setting(env_key, raw).map_err(|reason| ConfigError::Env {
                key: env_key.to_string(),
                reason,
            })?;

            match env_key {
                ENV_MAX_DISPLAYED => options.max_displayed = parse_env(env_key, raw)?,
                ENV_DISPLAY_TIMER_MS => options.display_timer = parse_env(env_key, raw)?,
                ENV_POSITION => options.position = parse_env(env_key, raw)?,
                _ => {}
            }
            tracing::debug!(option = def.key, value = raw, "Option overridden from environment");
        }

        Ok(options)
    }

    pub fn display_timer(&self) -> Duration {
        Duration::from_millis(self.display_timer)
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            max_displayed: self.max_displayed,
            display_timer: self.display_timer(),
            position: self.position,
            container: self.container,
        }
    }
}

/// Load .env from the first candidate path that exists.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::debug!("No .env file found, using system environment variables");
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Env {
        key: key.to_string(),
        reason: "could not be parsed".into(),
    })
}
