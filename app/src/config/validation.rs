//! Option value validation.

use serde_json::Value;
use toast_queue::Position;

use super::defaults::{
    is_known_key, CONTAINER_KEY, DISPLAY_TIMER_KEY, ENV_DISPLAY_TIMER_MS, ENV_MAX_DISPLAYED,
    ENV_POSITION, MAX_DISPLAYED_KEY, POSITION_KEY,
};
use super::ConfigError;

const MAX_DISPLAYED_LIMIT: i64 = 100;
const DISPLAY_TIMER_LIMIT_MS: i64 = 3_600_000;

/// Validate an options object before it is turned into settings.
///
/// Checks run in a fixed order and the first failure wins, so a caller
/// always sees one message at a time. `null` counts as "no options".
pub fn validate_options(value: &Value) -> Result<(), ConfigError> {
    let map = match value {
        Value::Null => return Ok(()),
        Value::Object(map) => map,
        _ => return Err(ConfigError::NotAnObject),
    };

    if map.get(MAX_DISPLAYED_KEY).is_some_and(|v| !is_positive_integer(v)) {
        return Err(ConfigError::MaxDisplayed);
    }
    if map.get(DISPLAY_TIMER_KEY).is_some_and(|v| !is_positive_integer(v)) {
        return Err(ConfigError::DisplayTimer);
    }
    if map
        .get(CONTAINER_KEY)
        .is_some_and(|v| !v.is_null() && v.as_u64().is_none())
    {
        return Err(ConfigError::Container);
    }
    if map
        .get(POSITION_KEY)
        .is_some_and(|v| v.as_str().and_then(|s| s.parse::<Position>().ok()).is_none())
    {
        return Err(ConfigError::position());
    }

    let mut unknown: Vec<String> = map.keys().filter(|k| !is_known_key(k)).cloned().collect();
    unknown.sort();
    if !unknown.is_empty() {
        return Err(ConfigError::UnknownOptions(unknown));
    }
    Ok(())
}

/// Validate an environment override. Returns `Ok(())` if valid, or an error
/// message.
pub fn validate_env_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        ENV_MAX_DISPLAYED => validate_int_range(value, 1, MAX_DISPLAYED_LIMIT)?,
        ENV_DISPLAY_TIMER_MS => validate_int_range(value, 1, DISPLAY_TIMER_LIMIT_MS)?,
        ENV_POSITION => {
            if value.parse::<Position>().is_err() {
                return Err(format!("must be one of: {}", position_list()));
            }
        }
        _ => {}
    }
    Ok(())
}

/// Accepted positions joined for messages, e.g. `top, top-right, ...`.
pub fn position_list() -> String {
    Position::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_positive_integer(value: &Value) -> bool {
    value.as_u64().is_some_and(|n| n > 0)
}

fn validate_int_range(value: &str, min: i64, max: i64) -> Result<(), String> {
    let v: i64 = value.trim().parse().map_err(|_| "must be an integer")?;
    if v < min || v > max {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(value: Value) -> String {
        validate_options(&value).unwrap_err().to_string()
    }

    #[test]
    fn missing_or_empty_options_are_fine() {
        assert!(validate_options(&Value::Null).is_ok());
        assert!(validate_options(&json!({})).is_ok());
        assert!(validate_options(&json!({
            "maxDisplayed": 5,
            "displayTimer": 1500,
            "position": "bottom-left",
            "container": 4
        }))
        .is_ok());
    }

    #[test]
    fn non_object_options_are_rejected() {
        assert_eq!(message(json!("bar")), "options must be an object");
        assert_eq!(message(json!([1, 2])), "options must be an object");
    }

    #[test]
    fn bad_values_report_their_option() {
        assert_eq!(
            message(json!({"maxDisplayed": "bar"})),
            "options.maxDisplayed must be an integer"
        );
        assert_eq!(
            message(json!({"maxDisplayed": 0})),
            "options.maxDisplayed must be an integer"
        );
        assert_eq!(
            message(json!({"displayTimer": "bar"})),
            "options.displayTimer must be an integer"
        );
        assert_eq!(
            message(json!({"displayTimer": 2.5})),
            "options.displayTimer must be an integer"
        );
        assert_eq!(
            message(json!({"container": "bar"})),
            "options.container must be an element"
        );
        assert_eq!(
            message(json!({"position": "bar"})),
            "options.position must be one of the following positions: top, top-right, top-left, bottom, bottom-right, bottom-left"
        );
    }

    #[test]
    fn unknown_keys_are_listed() {
        assert_eq!(message(json!({"foo": "bar"})), "Invalid option passed: foo");
        assert_eq!(
            message(json!({"foo": 1, "baz": 2, "position": "top"})),
            "Invalid option passed: baz, foo"
        );
    }

    #[test]
    fn value_errors_win_over_unknown_keys() {
        assert_eq!(
            message(json!({"foo": 1, "maxDisplayed": "x"})),
            "options.maxDisplayed must be an integer"
        );
    }

    #[test]
    fn env_settings() {
        assert!(validate_env_setting(ENV_MAX_DISPLAYED, "4").is_ok());
        assert!(validate_env_setting(ENV_MAX_DISPLAYED, "0").is_err());
        assert!(validate_env_setting(ENV_MAX_DISPLAYED, "many").is_err());
        assert!(validate_env_setting(ENV_DISPLAY_TIMER_MS, " 250 ").is_ok());
        assert!(validate_env_setting(ENV_DISPLAY_TIMER_MS, "-5").is_err());
        assert!(validate_env_setting(ENV_POSITION, "top-left").is_ok());
        assert_eq!(
            validate_env_setting(ENV_POSITION, "centre"),
            Err("must be one of: top, top-right, top-left, bottom, bottom-right, bottom-left".into())
        );
        assert!(validate_env_setting("UNRELATED", "anything").is_ok());
    }
}
