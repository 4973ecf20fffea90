//! Input validation.
//!
//! Collects every violation before anything is looked up: malformed or
//! missing resource ids, shape errors, and field constraints. Paths are
//! camelCase and rooted at `input`.

use std::collections::{BTreeMap, BTreeSet};

use agora_common::{ArgumentPath, Issue};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use super::Operation;
use crate::authz::fields;

/// Struct-level validation errors are filed under this key.
const SCHEMA_KEY: &str = "__all__";

/// Param naming the field a struct-level error belongs to.
pub const FIELD_PARAM: &str = "field";

/// Upper bound on shape repairs for one input.
const MAX_REPAIRS: usize = 64;

/// Validate the arguments of `operation`, returning every issue sorted by path.
///
/// Reference issues win over input issues reported at the same path.
pub(super) fn validate_arguments(
    operation: &Operation,
    args: &Value,
    validator: fn(&Value) -> Result<(), Vec<Issue>>,
) -> Vec<Issue> {
    let mut issues = reference_issues(operation, args);
    let taken: BTreeSet<ArgumentPath> = issues.iter().map(|i| i.argument_path.clone()).collect();
    if let Err(more) = validator(args) {
        issues.extend(more.into_iter().filter(|i| !taken.contains(&i.argument_path)));
    }
    issues.sort_by(|a, b| a.argument_path.cmp(&b.argument_path));
    issues
}

fn reference_issues(operation: &Operation, args: &Value) -> Vec<Issue> {
    operation
        .all_references()
        .filter_map(|reference| {
            match fields::lookup(args, &reference.path) {
                None | Some(Value::Null) if reference.required => {
                    Some(Issue::with_message(reference.path.clone(), "Required"))
                }
                None | Some(Value::Null) => None,
                Some(Value::String(s)) if Uuid::parse_str(s).is_ok() => None,
                Some(_) => Some(Issue::with_message(reference.path.clone(), "Invalid uuid")),
            }
        })
        .collect()
}

/// Deserialize `args.input` as `T` and run its validators.
///
/// A field that fails to deserialize is reported at its own path and then
/// replaced by a stand-in value, so the remaining fields are still checked.
pub fn validate_input<T: DeserializeOwned + Validate>(args: &Value) -> Result<(), Vec<Issue>> {
    let root = ArgumentPath::new(["input"]);
    let Some(input) = fields::lookup(args, &root) else {
        return Err(vec![Issue::with_message(root, "Required")]);
    };

    let (parsed, mut issues) = deserialize_all::<T>(&root, input);
    if let Some(parsed) = parsed {
        if let Err(errors) = parsed.validate() {
            let shape: BTreeSet<ArgumentPath> =
                issues.iter().map(|i| i.argument_path.clone()).collect();
            let mut constraints = Vec::new();
            collect(&root, &errors, &mut constraints);
            issues.extend(
                constraints
                    .into_iter()
                    .filter(|i| !shape.contains(&i.argument_path)),
            );
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        issues.sort_by(|a, b| a.argument_path.cmp(&b.argument_path));
        Err(issues)
    }
}

/// Values tried, in order, in place of a field that failed to deserialize.
fn stand_ins() -> [Value; 8] {
    [
        Value::Null,
        json!(0),
        json!(""),
        json!(false),
        json!(Uuid::nil()),
        json!("1970-01-01T00:00:00Z"),
        json!([]),
        json!({}),
    ]
}

fn deserialize_all<T: DeserializeOwned>(
    root: &ArgumentPath,
    input: &Value,
) -> (Option<T>, Vec<Issue>) {
    let mut input = input.clone();
    let mut issues = Vec::new();
    let mut attempts: BTreeMap<Vec<String>, usize> = BTreeMap::new();
    let stand_ins = stand_ins();

    for _ in 0..MAX_REPAIRS {
        let result: Result<T, _> = serde_path_to_error::deserialize(&input);
        let error = match result {
            Ok(parsed) => return (Some(parsed), issues),
            Err(error) => error,
        };

        let message = error.inner().to_string();
        let Some(mut segments) = segments(error.path()) else {
            issues.push(Issue::with_message(root.clone(), message));
            return (None, issues);
        };
        let missing = missing_field(&message);
        if let Some(field) = missing {
            segments.push(field.to_string());
        }

        let attempt = attempts.entry(segments.clone()).or_insert(0);
        if *attempt == 0 {
            let path = segments.iter().fold(root.clone(), |path, s| path.child(s));
            let message = if missing.is_some() { "Required".to_string() } else { message };
            issues.push(Issue::with_message(path, message));
        }
        if segments.is_empty() || *attempt >= stand_ins.len() {
            return (None, issues);
        }
        let replacement = stand_ins[*attempt].clone();
        *attempt += 1;
        if !replace_at(&mut input, &segments, replacement) {
            return (None, issues);
        }
    }
    (None, issues)
}

/// Field-relative path of a deserialization error, if every step is known.
fn segments(path: &serde_path_to_error::Path) -> Option<Vec<String>> {
    path.iter()
        .map(|segment| match segment {
            serde_path_to_error::Segment::Map { key } => Some(key.clone()),
            serde_path_to_error::Segment::Seq { index } => Some(index.to_string()),
            _ => None,
        })
        .collect()
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
}

fn replace_at(value: &mut Value, segments: &[String], replacement: Value) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return false;
    };
    let mut current = value;
    for segment in parents {
        current = match current {
            Value::Object(map) => match map.get_mut(segment) {
                Some(next) => next,
                None => return false,
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                Some(next) => next,
                None => return false,
            },
            _ => return false,
        };
    }
    match current {
        Value::Object(map) => {
            map.insert(last.clone(), replacement);
            true
        }
        Value::Array(items) => match last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            Some(slot) => {
                *slot = replacement;
                true
            }
            None => false,
        },
        _ => false,
    }
}

/// `end_at` must fall after `start_at` when both are given.
pub fn check_window(
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start_at, end_at) {
        (Some(start), Some(end)) if end <= start => {
            let mut error = ValidationError::new("window")
                .with_message("Must be greater than the value of startAt.".into());
            error.add_param(FIELD_PARAM.into(), &"endAt");
            Err(error)
        }
        _ => Ok(()),
    }
}

fn collect(prefix: &ArgumentPath, errors: &ValidationErrors, out: &mut Vec<Issue>) {
    for (field, kind) in errors.errors() {
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let path = if &**field == SCHEMA_KEY {
                        match error.params.get(FIELD_PARAM).and_then(Value::as_str) {
                            Some(name) => prefix.child(name),
                            None => prefix.clone(),
                        }
                    } else {
                        prefix.child(&camel_case(field))
                    };
                    out.push(Issue::with_message(path, message(error)));
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                collect(&prefix.child(&camel_case(field)), nested, out);
            }
            ValidationErrorsKind::List(items) => {
                let base = prefix.child(&camel_case(field));
                for (index, nested) in items {
                    collect(&base.child(&index.to_string()), nested, out);
                }
            }
        }
    }
}

fn message(error: &validator::ValidationError) -> String {
    error
        .message
        .as_ref()
        .map_or_else(|| error.code.to_string(), |m| m.to_string())
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
