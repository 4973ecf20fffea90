//! Domain state checks.
//!
//! Run after every referenced resource is known to exist and before any role
//! is resolved. Each failed check yields issues with a human-readable reason;
//! all checks run so every violation is reported together.

use agora_common::{ArgumentPath, Issue};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use crate::auth::Principal;
use crate::authz::existence::ExistenceReport;
use crate::authz::fields;
use crate::authz::graph::{Resource, ResourceKind, WindowState};
use crate::authz::store::{ResourceStore, StoreResult};

pub const NAME_NOT_AVAILABLE: &str = "This name is not available.";

/// Where a uniqueness scope comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "camelCase")]
pub enum ScopeSource {
    /// The referenced resource is the scope (creating inside it).
    Resource(ArgumentPath),
    /// The referenced resource's parent is the scope (updating it).
    ParentOf(ArgumentPath),
}

/// Where a uniqueness key comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "camelCase")]
pub enum KeySource {
    /// The acting principal's id.
    Principal,
    /// A user id carried by an argument.
    Argument(ArgumentPath),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "check", rename_all = "camelCase")]
pub enum StateCheck {
    /// `name` is not already used by another `kind` in the scope.
    #[serde(rename_all = "camelCase")]
    UniqueName {
        kind: ResourceKind,
        scope: ScopeSource,
        name: ArgumentPath,
    },
    /// `member` holds no membership on `scope` yet.
    #[serde(rename_all = "camelCase")]
    NotMember {
        scope: ArgumentPath,
        member: ArgumentPath,
    },
    /// At most one `kind` per key inside `scope` (votes, pledges).
    #[serde(rename_all = "camelCase")]
    UniqueKey {
        kind: ResourceKind,
        scope: ArgumentPath,
        key: KeySource,
        message: &'static str,
    },
    /// The referenced resource's active window contains now.
    #[serde(rename_all = "camelCase")]
    ActiveWindow {
        resource: ArgumentPath,
        label: &'static str,
    },
    /// The referenced resource, when given, sits directly under `scope`.
    #[serde(rename_all = "camelCase")]
    SameParent {
        resource: ArgumentPath,
        scope: ScopeSource,
        message: &'static str,
    },
}

/// What a check may consult besides the store.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub principal: &'a Principal,
    pub args: &'a Value,
    pub report: &'a ExistenceReport,
    pub now: DateTime<Utc>,
}

impl StateCheck {
    /// Evaluate this check, returning its issues.
    pub async fn run<S: ResourceStore>(
        &self,
        store: &S,
        cx: &CheckContext<'_>,
    ) -> StoreResult<Vec<Issue>> {
        match self {
            Self::UniqueName { kind, scope, name } => {
                let Some(value) = fields::string_at(cx.args, name) else {
                    return Ok(Vec::new());
                };
                let (scope_id, own_id) = match scope {
                    ScopeSource::Resource(path) => (cx.report.get(path).map(|r| r.id), None),
                    ScopeSource::ParentOf(path) => {
                        let resource = cx.report.get(path);
                        (
                            resource.and_then(|r| r.parent()).map(|p| p.id),
                            resource.map(|r| r.id),
                        )
                    }
                };
                let Some(scope_id) = scope_id else {
                    return Ok(Vec::new());
                };

                let existing = store.find_by_unique_key(*kind, scope_id, value).await?;
                Ok(match existing {
                    Some(found) if Some(found.id) != own_id => {
                        vec![Issue::with_message(name.clone(), NAME_NOT_AVAILABLE)]
                    }
                    _ => Vec::new(),
                })
            }

            Self::NotMember { scope, member } => {
                let (Some(scope_resource), Some(member_resource)) =
                    (cx.report.get(scope), cx.report.get(member))
                else {
                    return Ok(Vec::new());
                };
                let existing = store
                    .find_membership(member_resource.id, scope_resource.link())
                    .await?;
                Ok(match existing {
                    Some(_) => {
                        let (on_scope, on_member) = already_member(scope_resource.kind);
                        vec![
                            Issue::with_message(scope.clone(), on_scope),
                            Issue::with_message(member.clone(), on_member),
                        ]
                    }
                    None => Vec::new(),
                })
            }

            Self::UniqueKey {
                kind,
                scope,
                key,
                message,
            } => {
                let Some(scope_resource) = cx.report.get(scope) else {
                    return Ok(Vec::new());
                };
                let key = match key {
                    KeySource::Principal => Some(cx.principal.id),
                    KeySource::Argument(path) => fields::uuid_at(cx.args, path),
                };
                let Some(key) = key else {
                    return Ok(Vec::new());
                };

                let existing = store
                    .find_by_unique_key(*kind, scope_resource.id, &key.to_string())
                    .await?;
                Ok(existing
                    .map(|_| vec![Issue::with_message(scope.clone(), *message)])
                    .unwrap_or_default())
            }

            Self::ActiveWindow { resource, label } => {
                let window = cx.report.get(resource).and_then(|r| r.window);
                Ok(match window.map(|w| w.state_at(cx.now)) {
                    Some(WindowState::NotStarted) => vec![Issue::with_message(
                        resource.clone(),
                        format!("This {label} has not started yet."),
                    )],
                    Some(WindowState::Ended) => vec![Issue::with_message(
                        resource.clone(),
                        format!("This {label} has ended."),
                    )],
                    Some(WindowState::Open) | None => Vec::new(),
                })
            }

            Self::SameParent {
                resource,
                scope,
                message,
            } => {
                let parent = match scope {
                    ScopeSource::Resource(path) => cx.report.get(path).map(Resource::link),
                    ScopeSource::ParentOf(path) => cx.report.get(path).and_then(Resource::parent),
                };
                let (Some(child), Some(parent)) = (cx.report.get(resource), parent) else {
                    return Ok(Vec::new());
                };
                Ok(if child.parent() == Some(parent) {
                    Vec::new()
                } else {
                    vec![Issue::with_message(resource.clone(), *message)]
                })
            }
        }
    }
}

/// Reasons reported on the scope and member paths of an existing membership.
fn already_member(kind: ResourceKind) -> (String, String) {
    match kind {
        ResourceKind::Tag => (
            "This tag is already assigned to the user.".to_string(),
            "This user already has the associated tag.".to_string(),
        ),
        kind => (
            format!("This {kind} already has the associated member."),
            format!("This user already has the membership of the associated {kind}."),
        ),
    }
}

/// Run every check concurrently and gather all their issues.
#[tracing::instrument(skip_all, fields(checks = checks.len()))]
pub async fn run_all<S: ResourceStore>(
    store: &S,
    checks: &[StateCheck],
    cx: &CheckContext<'_>,
) -> StoreResult<Vec<Issue>> {
    let results = join_all(checks.iter().map(|check| check.run(store, cx))).await;

    let mut issues = Vec::new();
    for result in results {
        issues.extend(result?);
    }
    Ok(issues)
}
