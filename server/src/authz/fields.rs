//! Argument lookups on raw mutation arguments.
//!
//! A field is present when its key exists, even if the value is `null`; only
//! omitted keys are absent. Restricted-field checks rely on this.

use agora_common::ArgumentPath;
use serde_json::Value;
use uuid::Uuid;

/// Value at `path`, if every segment's key exists.
#[must_use]
pub fn lookup<'a>(args: &'a Value, path: &ArgumentPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(args, |value, segment| value.as_object()?.get(segment))
}

#[must_use]
pub fn is_present(args: &Value, path: &ArgumentPath) -> bool {
    lookup(args, path).is_some()
}

/// String at `path`; `None` when absent, `null` or not a string.
#[must_use]
pub fn string_at<'a>(args: &'a Value, path: &ArgumentPath) -> Option<&'a str> {
    lookup(args, path).and_then(Value::as_str)
}

/// UUID at `path`; `None` when absent, `null` or malformed.
#[must_use]
pub fn uuid_at(args: &Value, path: &ArgumentPath) -> Option<Uuid> {
    string_at(args, path).and_then(|s| Uuid::parse_str(s).ok())
}
